//! Node glyph rendering and hit-testing.

use kurbo::{Point, Vec2};
use netglyph_core::display::DisplayOptions;
use netglyph_core::model::{Layout, NodeProperties};
use netglyph_core::pads::{Intersection, PadGeometry, ShapeFamily};
use netglyph_core::style::Rgba;

use crate::sink::{BoundsShape, DrawLayer, Paint, Primitive, RenderResult, ShapeSink};

/// Radius of the pad markers drawn when pads are shown.
pub const PAD_MARKER_RADIUS: f64 = 1.5;

/// Gap between a glyph and its selection halo.
pub const HALO_MARGIN: f64 = 3.0;

pub const OUTLINE_WIDTH: f64 = 1.0;

/// Renders node glyphs into a [`ShapeSink`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeRenderer;

impl NodeRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render a node by id, skipping ids the layout has no record for.
    pub fn render_id(
        &self,
        layout: &Layout,
        id: &str,
        options: &DisplayOptions,
        selected: bool,
        sink: &mut dyn ShapeSink,
    ) -> RenderResult<()> {
        match layout.node(id) {
            Some(node) => self.render(node, options, selected, sink),
            None => {
                log::debug!("node {id}: no layout record, skipped");
                Ok(())
            }
        }
    }

    /// Render one node: body, pads, label, selection halo and export bounds.
    pub fn render(
        &self,
        node: &NodeProperties,
        options: &DisplayOptions,
        selected: bool,
        sink: &mut dyn ShapeSink,
    ) -> RenderResult<()> {
        let pads = node.family.pads();
        let geometry = node.geometry();

        sink.push_group(&node.id);
        sink.push_transform(node.orientation.transform(node.origin));
        sink.draw(DrawLayer::Glyphs, body_primitive(node));
        if options.show_pads {
            self.draw_pads(node, pads, sink)?;
        }
        sink.pop_transform();

        if let Some(rect) = pads.label_bounds(&geometry) {
            sink.draw(
                DrawLayer::Glyphs,
                Primitive::Label {
                    text: node.name.clone().unwrap_or_else(|| node.id.clone()),
                    rect,
                    color: Rgba::black(),
                },
            );
            sink.bounds(BoundsShape::Rect { rect });
        }

        let world = pads.world_bounds(&geometry);
        if selected {
            let halo = world.inflate(HALO_MARGIN, HALO_MARGIN);
            sink.draw(
                DrawLayer::Selection,
                Primitive::RoundedRect {
                    rect: halo,
                    radius: HALO_MARGIN,
                    paint: Paint::outlined(options.selection_color, 2.0),
                },
            );
        }
        sink.bounds(BoundsShape::Rect { rect: world });
        sink.pop_group();
        Ok(())
    }

    /// Render every node in the layout in id order.
    pub fn render_layout(
        &self,
        layout: &Layout,
        options: &DisplayOptions,
        is_selected: impl Fn(&str) -> bool,
        sink: &mut dyn ShapeSink,
    ) -> RenderResult<()> {
        for node in layout.nodes.values() {
            self.render(node, options, is_selected(node.id.as_str()), sink)?;
        }
        Ok(())
    }

    fn draw_pads(
        &self,
        node: &NodeProperties,
        pads: &dyn PadGeometry,
        sink: &mut dyn ShapeSink,
    ) -> RenderResult<()> {
        let marker = |center: Point, paint: Paint| Primitive::Ellipse {
            center,
            radii: Vec2::new(PAD_MARKER_RADIUS, PAD_MARKER_RADIUS),
            paint,
        };
        for pad in pads.all_landing_pads(&node.geometry()) {
            let offset = pads.local_landing_offset(pad)?;
            sink.draw(
                DrawLayer::Glyphs,
                marker(offset.to_point(), Paint::outlined(Rgba::black(), OUTLINE_WIDTH)),
            );
        }
        let extra_length = pads.extra_length(node.extra_pads);
        for pad in 0..pads.launch_pad_count() {
            let offset = pads.fixed_launch_offset(pad, extra_length)?;
            sink.draw(DrawLayer::Glyphs, marker(offset.to_point(), Paint::filled(Rgba::black())));
        }
        Ok(())
    }

    /// Hit-test a node by id; `None` for misses and unknown ids.
    pub fn hit_node(&self, layout: &Layout, id: &str, point: Point) -> Option<Intersection> {
        let node = layout.node(id)?;
        node.family.pads().intersects(&node.geometry(), point)
    }
}

/// The glyph body in the node's local frame.
fn body_primitive(node: &NodeProperties) -> Primitive {
    let pads = node.family.pads();
    let body = pads.body_bounds(pads.extra_length(node.extra_pads));
    match node.family {
        ShapeFamily::Inline(_) => Primitive::Polygon {
            points: rect_points(body),
            paint: Paint::filled(node.fill.unwrap_or_else(Rgba::black)),
        },
        ShapeFamily::Box(_) => Primitive::Polygon {
            points: rect_points(body),
            paint: Paint::filled(node.fill.unwrap_or_else(Rgba::white))
                .with_outline(Rgba::black(), OUTLINE_WIDTH),
        },
        ShapeFamily::Tablet(tablet) => Primitive::RoundedRect {
            rect: body,
            radius: tablet.height / 2.0,
            paint: Paint::filled(node.fill.unwrap_or_else(Rgba::white))
                .with_outline(Rgba::black(), OUTLINE_WIDTH),
        },
    }
}

fn rect_points(rect: kurbo::Rect) -> Vec<Point> {
    vec![
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ]
}
