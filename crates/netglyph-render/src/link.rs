//! Link bus rendering: path emission with style flips, tips, branch dots
//! and selection highlights.

use std::collections::BTreeMap;

use kurbo::{Point, Vec2};
use netglyph_core::display::{BranchMode, DisplayOptions};
use netglyph_core::geometry::LinkSegment;
use netglyph_core::model::{Layout, LinkBus, LinkQuery, LinkSegmentId};
use netglyph_core::style::ResolvedDrawStyle;
use netglyph_core::tree::{DrawOrder, DrawTree, DrawTreeError, ResolvedTree, SegIdx, TreeLink};

use crate::sink::{
    BoundsShape, Composite, DrawLayer, Paint, PathOp, Primitive, RenderResult, ShapeSink,
    StrokeStyle,
};
use crate::tips::{TipPlacement, evidence_glyph, tip_primitive};

/// Opacity used for ghosted buses.
pub const GHOST_OPACITY: f32 = 0.35;

/// Extra width of a selection highlight over the link it covers.
pub const SELECTION_WIDTH_PAD: f64 = 4.0;

/// Branch dot radius per unit of link thickness.
pub const BRANCH_DOT_RADIUS_PER_THICKNESS: f64 = 1.2;

/// Per-call rendering switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
    /// Draw everything dimmed, ignoring link colors.
    pub ghosted: bool,
    /// Leave out the legs that attach links to nodes.
    pub skip_drops: bool,
}

/// Tracks the polyline being accumulated and flushes it when the style or
/// layer changes.
#[derive(Debug, Default)]
struct FlipStatus {
    current: Option<(ResolvedDrawStyle, DrawLayer)>,
    ops: Vec<PathOp>,
    last: Option<Point>,
}

impl FlipStatus {
    fn flush(&mut self, sink: &mut dyn ShapeSink) {
        let ops = std::mem::take(&mut self.ops);
        self.last = None;
        let Some((style, layer)) = self.current else {
            return;
        };
        if ops.iter().any(|op| matches!(op, PathOp::LineTo(_))) {
            sink.draw(
                layer,
                Primitive::Path {
                    ops,
                    color: style.color,
                    stroke: StrokeStyle::from(&style),
                },
            );
        }
    }

    /// Append one segment; `new_drop` marks the first segment of a link's walk.
    fn add(
        &mut self,
        sink: &mut dyn ShapeSink,
        style: ResolvedDrawStyle,
        layer: DrawLayer,
        geometry: &LinkSegment,
        new_drop: bool,
        skip_leg: bool,
    ) {
        let same = self.current == Some((style, layer));
        if !same {
            self.flush(sink);
            self.current = Some((style, layer));
        }
        let connected = same && !new_drop && self.last == Some(geometry.start);
        if !connected {
            self.ops.push(PathOp::MoveTo(geometry.start));
        }
        self.ops.push(if skip_leg {
            PathOp::MoveTo(geometry.end)
        } else {
            PathOp::LineTo(geometry.end)
        });
        self.last = Some(geometry.end);
    }
}

/// Renders link buses into a [`ShapeSink`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkRenderer {
    render: RenderOptions,
}

impl LinkRenderer {
    pub fn new(render: RenderOptions) -> Self {
        Self { render }
    }

    pub fn render_options(&self) -> RenderOptions {
        self.render
    }

    /// Render every bus in the layout, in layout order.
    pub fn render_layout(
        &self,
        layout: &Layout,
        query: &dyn LinkQuery,
        options: &DisplayOptions,
        sink: &mut dyn ShapeSink,
    ) -> RenderResult<()> {
        for bus in &layout.buses {
            self.render_bus(bus, query, layout, options, sink)?;
        }
        Ok(())
    }

    /// Build, resolve, order and emit one bus.
    pub fn render_bus(
        &self,
        bus: &LinkBus,
        query: &dyn LinkQuery,
        layout: &Layout,
        options: &DisplayOptions,
        sink: &mut dyn ShapeSink,
    ) -> RenderResult<()> {
        let tree = DrawTree::build(bus, query, options)?;
        if tree.is_empty() {
            log::debug!("bus {}: every link filtered, nothing to draw", bus.id);
            return Ok(());
        }
        let ctx = tree.resolve_context(options, self.render.ghosted);
        let resolved = tree.resolve_draw_styles(&ctx)?;
        let order = tree.order_for_drawing(&resolved)?;

        sink.push_group(&bus.id);
        if self.render.ghosted {
            sink.set_composite(Composite::Faded(GHOST_OPACITY));
        }
        let mut emitter = Emitter {
            tree: &tree,
            resolved: &resolved,
            order: &order,
            bus,
            layout,
            options,
            render: self.render,
            flip: FlipStatus::default(),
            highlights: BTreeMap::new(),
        };
        emitter.emit(sink)?;
        if self.render.ghosted {
            sink.set_composite(Composite::SourceOver);
        }
        sink.pop_group();
        Ok(())
    }
}

struct Emitter<'a> {
    tree: &'a DrawTree,
    resolved: &'a ResolvedTree,
    order: &'a DrawOrder,
    bus: &'a LinkBus,
    layout: &'a Layout,
    options: &'a DisplayOptions,
    render: RenderOptions,
    flip: FlipStatus,
    /// Selected segments keyed by highlight width in thousandths.
    highlights: BTreeMap<i64, Vec<PathOp>>,
}

impl Emitter<'_> {
    fn emit(&mut self, sink: &mut dyn ShapeSink) -> RenderResult<()> {
        let (tree, order) = (self.tree, self.order);
        for link_id in order.order() {
            let Some(link) = tree.link(link_id) else {
                continue;
            };
            // Walk collects entry-to-root; paint root-to-entry.
            let mut walk = order.segments_for(tree, link_id);
            walk.reverse();
            let first = walk.first().copied();
            for idx in walk {
                self.emit_segment(sink, idx, Some(idx) == first)?;
            }
            self.emit_tip(sink, link)?;
        }
        self.flip.flush(sink);

        let selection = self.options.selection_color;
        for (width, ops) in std::mem::take(&mut self.highlights) {
            sink.draw(
                DrawLayer::Selection,
                Primitive::Path {
                    ops,
                    color: selection,
                    stroke: StrokeStyle::solid(width as f64 / 1000.0),
                },
            );
        }
        Ok(())
    }

    fn emit_segment(
        &mut self,
        sink: &mut dyn ShapeSink,
        idx: SegIdx,
        new_drop: bool,
    ) -> RenderResult<()> {
        let segment = self.tree.segment(idx);
        let geometry = segment
            .geometry
            .ok_or_else(|| DrawTreeError::MissingGeometry(segment.id.clone()))?;
        let style = *self.resolved.style(idx);
        let layer = DrawLayer::for_link(segment.active && !self.render.ghosted);
        let skip_leg = self.render.skip_drops && segment.id.is_drop();
        self.flip
            .add(sink, style, layer, &geometry, new_drop, skip_leg);

        if !skip_leg {
            sink.bounds(BoundsShape::Polyline {
                points: vec![geometry.start, geometry.end],
                width: style.thickness,
            });
        }

        if segment.selected && !skip_leg {
            let width = style.thickness + SELECTION_WIDTH_PAD;
            let key = (width * 1000.0).round() as i64;
            let ops = self.highlights.entry(key).or_default();
            ops.push(PathOp::MoveTo(geometry.start));
            ops.push(PathOp::LineTo(geometry.end));
        }

        if segment.is_active_branch() && !segment.id.is_terminal() {
            self.emit_branch_dot(sink, geometry.end, &style);
        }
        Ok(())
    }

    fn emit_branch_dot(&self, sink: &mut dyn ShapeSink, at: Point, style: &ResolvedDrawStyle) {
        let paint = match self.options.branch_mode {
            BranchMode::None => return,
            BranchMode::Filled => Paint::filled(style.color),
            BranchMode::Outlined => {
                Paint::filled(style.color).with_outline(self.options.inactive_gray, 1.0)
            }
        };
        let r = style.thickness * BRANCH_DOT_RADIUS_PER_THICKNESS;
        sink.draw(
            DrawLayer::Tips,
            Primitive::Ellipse {
                center: at,
                radii: Vec2::new(r, r),
                paint,
            },
        );
    }

    fn emit_tip(&self, sink: &mut dyn ShapeSink, link: &TreeLink) -> RenderResult<()> {
        if self.render.skip_drops {
            return Ok(());
        }
        let segment = self.tree.segment(link.entry);
        if !matches!(segment.id, LinkSegmentId::EndDrop(_) | LinkSegmentId::Direct(_)) {
            return Ok(());
        }
        let geometry = segment
            .geometry
            .ok_or_else(|| DrawTreeError::MissingGeometry(segment.id.clone()))?;
        let style = self.resolved.style(link.entry);

        let pad_arrival = match self.bus.end_drop(&link.id) {
            Some(drop) if geometry.is_degenerate() => match self.layout.node(&drop.target) {
                Some(node) => Some(
                    node.family
                        .pads()
                        .arrival_direction(&node.geometry(), drop.pad)?,
                ),
                None => {
                    log::debug!("link {}: target {} has no layout", link.id, drop.target);
                    None
                }
            },
            _ => None,
        };
        let Some(placement) = TipPlacement::for_drop(&geometry, pad_arrival) else {
            log::debug!("link {}: no arrival direction, tip skipped", link.id);
            return Ok(());
        };

        if let Some(tip) = tip_primitive(
            link.state.sign,
            &placement,
            style,
            self.options.extra_foot_size,
        ) {
            sink.draw(DrawLayer::Tips, tip);
        }
        if self.options.evidence_glyphs && link.state.evidence > 0 {
            sink.draw(
                DrawLayer::Tips,
                evidence_glyph(link.state.sign, &placement, style, link.state.evidence),
            );
        }
        Ok(())
    }
}
