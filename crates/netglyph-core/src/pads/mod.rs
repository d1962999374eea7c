//! Pad geometry: where links attach to node glyphs, and hit-testing.
//!
//! Every shape family works in a local frame with the reading axis running
//! left to right (orientation `Right`), the origin at the glyph center and y
//! pointing down. Pad 0 is the primary landing pad at the far left. Negative
//! pad numbers are extra pads: odd ones on the top edge, even ones on the
//! bottom, marching rightward as their magnitude grows.

mod boxed;
mod family;
mod inline;
mod tablet;

pub use boxed::BoxShape;
pub use family::ShapeFamily;
pub use inline::InlineShape;
pub use tablet::TabletShape;

use std::cmp::Ordering;
use std::collections::BTreeSet;

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::Orientation;
use crate::model::LinkSign;

/// Radius within which a point counts as touching a pad.
pub const PAD_HIT_RADIUS: f64 = 4.0;

/// Outward shift applied to negative links so inhibitor bars clear the glyph.
pub const NEGATIVE_LANDING_TWEAK: f64 = 2.0;

/// Gap between a glyph and its label.
pub const LABEL_GAP: f64 = 4.0;

/// Pad geometry errors.
#[derive(Debug, Error)]
pub enum PadError {
    #[error("Invalid orientation code: {0}")]
    InvalidOrientation(i32),
    #[error("Pad {pad} is out of range for {family} nodes")]
    PadOutOfRange { pad: i32, family: &'static str },
    #[error("No free pad within {limit} candidates")]
    NoFreePad { limit: usize },
}

/// Result type for pad operations.
pub type PadResult<T> = Result<T, PadError>;

/// Size of a node's label as measured by the text layout helper.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelMetrics {
    pub width: f64,
    pub height: f64,
}

/// The placement of one node, as the pad engine sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeGeometry {
    pub origin: Point,
    pub orientation: Orientation,
    /// Number of extra pads in use (pads -1 ..= -extra_pads).
    pub extra_pads: u32,
    pub label: Option<LabelMetrics>,
}

impl NodeGeometry {
    pub fn at(origin: Point) -> Self {
        Self {
            origin,
            orientation: Orientation::Right,
            extra_pads: 0,
            label: None,
        }
    }

    /// Convert a world point into the node's local frame.
    pub fn to_local(&self, point: Point) -> Vec2 {
        self.orientation.unrotate(point - self.origin)
    }

    /// Convert a local offset into a world point.
    pub fn to_world(&self, local: Vec2) -> Point {
        self.origin + self.orientation.rotate(local)
    }
}

/// Edge of the glyph a pad sits on, in the local frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PadSide {
    Top,
    Bottom,
    Left,
    Right,
}

impl PadSide {
    /// Unit vector pointing away from the glyph.
    pub fn outward(self) -> Vec2 {
        match self {
            PadSide::Top => Vec2::new(0.0, -1.0),
            PadSide::Bottom => Vec2::new(0.0, 1.0),
            PadSide::Left => Vec2::new(-1.0, 0.0),
            PadSide::Right => Vec2::new(1.0, 0.0),
        }
    }
}

/// Launch (outbound) or landing (inbound) pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PadKind {
    Launch,
    Landing,
}

/// A pad near a hit-test point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PadHit {
    pub pad: i32,
    pub kind: PadKind,
    pub distance: f64,
}

/// What a hit test touched.
#[derive(Debug, Clone, PartialEq)]
pub enum Intersection {
    /// Glyph body or extra-pad region.
    Glyph,
    Label,
    /// Pads ranked nearest first.
    Pads(Vec<PadHit>),
}

/// Where to begin looking for a free top pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TopPadStrategy {
    #[default]
    StartFromLeft,
    BuildFromCenter,
}

/// Pad layout of one shape family.
///
/// Implementors supply local-frame constants; the provided methods build the
/// shared contract (orientation, extra pads, ordering, hit-testing) on top.
pub trait PadGeometry {
    /// Family name for diagnostics.
    fn family_name(&self) -> &'static str;

    /// Fixed landing pads are `0..landing_pad_count()`.
    fn landing_pad_count(&self) -> i32;

    /// Fixed launch pads are `0..launch_pad_count()`.
    fn launch_pad_count(&self) -> i32 {
        1
    }

    /// Distance between neighbouring pads.
    fn pad_spacing(&self) -> f64;

    /// Local offset of a fixed landing pad.
    fn fixed_landing_offset(&self, pad: i32) -> PadResult<Vec2>;

    /// Side a fixed landing pad sits on.
    fn fixed_landing_side(&self, pad: i32) -> PadResult<PadSide>;

    /// Local offset of a fixed launch pad, given the body extension.
    fn fixed_launch_offset(&self, pad: i32, extra_length: f64) -> PadResult<Vec2>;

    /// Fixed pads on the top edge, left to right.
    fn top_pads(&self) -> Vec<i32>;

    /// X coordinate of the rightmost fixed top pad; extra pads continue from here.
    fn extra_band_start(&self) -> f64;

    /// Half the glyph height at the pad edges.
    fn half_height(&self) -> f64;

    /// Body extension needed to host `extra_pads` extra pads.
    fn extra_length(&self, extra_pads: u32) -> f64;

    /// Local body bounds with the given extension.
    fn body_bounds(&self, extra_length: f64) -> Rect;

    /// Whether a local point is inside the glyph body.
    fn body_contains(&self, local: Vec2, extra_length: f64) -> bool {
        self.body_bounds(extra_length).contains(local.to_point())
    }

    /// Region covering extra pads that fall outside the body, if any.
    fn extra_pad_expansion(&self, extra_pads: u32) -> Option<Rect> {
        let _ = extra_pads;
        None
    }

    /// Local offset of any landing pad, extra pads included.
    fn local_landing_offset(&self, pad: i32) -> PadResult<Vec2> {
        if pad >= 0 {
            return self.fixed_landing_offset(pad);
        }
        let n = pad.unsigned_abs();
        let step = n.div_ceil(2) as f64;
        let x = self.extra_band_start() + step * self.pad_spacing();
        let y = if n % 2 == 1 {
            -self.half_height()
        } else {
            self.half_height()
        };
        Ok(Vec2::new(x, y))
    }

    /// Side of any landing pad, extra pads included.
    fn landing_side(&self, pad: i32) -> PadResult<PadSide> {
        if pad >= 0 {
            return self.fixed_landing_side(pad);
        }
        Ok(if pad.unsigned_abs() % 2 == 1 {
            PadSide::Top
        } else {
            PadSide::Bottom
        })
    }

    /// Offset from the node origin to a landing pad.
    fn landing_pad_offset(&self, node: &NodeGeometry, pad: i32, sign: LinkSign) -> PadResult<Vec2> {
        let mut local = self.local_landing_offset(pad)?;
        if sign == LinkSign::Negative {
            local += self.landing_side(pad)?.outward() * NEGATIVE_LANDING_TWEAK;
        }
        Ok(node.orientation.rotate(local))
    }

    /// Offset from the node origin to a launch pad.
    fn launch_pad_offset(&self, node: &NodeGeometry, pad: i32) -> PadResult<Vec2> {
        let local = self.fixed_launch_offset(pad, self.extra_length(node.extra_pads))?;
        Ok(node.orientation.rotate(local))
    }

    /// Direction a link travels as it arrives on a landing pad.
    fn arrival_direction(&self, node: &NodeGeometry, pad: i32) -> PadResult<Vec2> {
        let inward = -self.landing_side(pad)?.outward();
        Ok(node.orientation.rotate(inward))
    }

    /// Left-to-right reading order over landing pads.
    ///
    /// Pad 0 sorts first; then by horizontal position, top before bottom,
    /// smaller magnitude, and finally pad number.
    fn compare_pads(&self, a: i32, b: i32) -> PadResult<Ordering> {
        let key = |pad: i32| -> PadResult<(bool, f64, PadSide, u32, i32)> {
            let offset = self.local_landing_offset(pad)?;
            Ok((pad != 0, offset.x, self.landing_side(pad)?, pad.unsigned_abs(), pad))
        };
        let (ka, kb) = (key(a)?, key(b)?);
        Ok(ka
            .0
            .cmp(&kb.0)
            .then(ka.1.total_cmp(&kb.1))
            .then(ka.2.cmp(&kb.2))
            .then(ka.3.cmp(&kb.3))
            .then(ka.4.cmp(&kb.4)))
    }

    /// Every landing pad the node currently has, in reading order.
    fn all_landing_pads(&self, node: &NodeGeometry) -> Vec<i32> {
        let mut pads: Vec<i32> = (0..self.landing_pad_count())
            .chain((1..=node.extra_pads as i32).map(|n| -n))
            .collect();
        pads.sort_by(|a, b| self.compare_pads(*a, *b).unwrap_or(Ordering::Equal));
        pads
    }

    /// Pads closest to `pad`, nearest first, excluding `pad` itself.
    fn nearby_pads(&self, node: &NodeGeometry, pad: i32, limit: usize) -> PadResult<Vec<i32>> {
        let center = self.local_landing_offset(pad)?;
        let mut others: Vec<(f64, i32)> = Vec::new();
        for other in self.all_landing_pads(node) {
            if other != pad {
                let d = (self.local_landing_offset(other)? - center).hypot();
                others.push((d, other));
            }
        }
        others.sort_by(|a, b| {
            a.0.total_cmp(&b.0)
                .then_with(|| self.compare_pads(a.1, b.1).unwrap_or(Ordering::Equal))
        });
        Ok(others.into_iter().take(limit).map(|(_, p)| p).collect())
    }

    /// First free pad on the top edge.
    ///
    /// Fixed top pads are tried in strategy order, then top-side extra pads
    /// (-1, -3, ...). At most one extra pad beyond those the node declares is
    /// offered, so corrupted usage state fails instead of looping.
    fn best_top_pad(
        &self,
        node: &NodeGeometry,
        used: &BTreeSet<i32>,
        strategy: TopPadStrategy,
    ) -> PadResult<i32> {
        let fixed = self.top_pads();
        let mut candidates: Vec<i32> = match strategy {
            TopPadStrategy::StartFromLeft => fixed.clone(),
            TopPadStrategy::BuildFromCenter => center_out(&fixed),
        };
        let extra_top = node.extra_pads.div_ceil(2) + 1;
        candidates.extend((0..extra_top as i32).map(|k| -(2 * k + 1)));
        let limit = candidates.len();
        candidates
            .into_iter()
            .find(|p| !used.contains(p))
            .ok_or_else(|| {
                log::warn!("{}: no free top pad among {} candidates", self.family_name(), limit);
                PadError::NoFreePad { limit }
            })
    }

    /// Local bounds of glyph plus any extra-pad region.
    fn local_bounds(&self, extra_pads: u32) -> Rect {
        let body = self.body_bounds(self.extra_length(extra_pads));
        match self.extra_pad_expansion(extra_pads) {
            Some(expansion) => body.union(expansion),
            None => body,
        }
    }

    /// Placement-independent bounds anchored at the origin.
    ///
    /// `top_pad_override` asks for room for that many top pads, growing the
    /// glyph with extra pads when the fixed ones do not suffice.
    fn bounds_for_layout(
        &self,
        orientation: Orientation,
        label: Option<LabelMetrics>,
        top_pad_override: Option<u32>,
    ) -> Rect {
        let fixed_top = self.top_pads().len() as u32;
        let extra = top_pad_override
            .map(|wanted| wanted.saturating_sub(fixed_top) * 2)
            .unwrap_or(0);
        let body = orientation.rotate_rect(self.local_bounds(extra));
        match label {
            Some(metrics) => body.union(label_rect(body, metrics)),
            None => body,
        }
    }

    /// World bounds of glyph and extra-pad region.
    fn world_bounds(&self, node: &NodeGeometry) -> Rect {
        node.orientation
            .rotate_rect(self.local_bounds(node.extra_pads))
            + node.origin.to_vec2()
    }

    /// World bounds of the label, if the node has one.
    fn label_bounds(&self, node: &NodeGeometry) -> Option<Rect> {
        let metrics = node.label?;
        let body = node
            .orientation
            .rotate_rect(self.local_bounds(node.extra_pads));
        Some(label_rect(body, metrics) + node.origin.to_vec2())
    }

    /// Hit-test a world point against pads, glyph and label.
    fn intersects(&self, node: &NodeGeometry, point: Point) -> Option<Intersection> {
        let reach = self.world_bounds(node).inflate(PAD_HIT_RADIUS, PAD_HIT_RADIUS);
        let label = self.label_bounds(node);
        let in_label = label.is_some_and(|r| r.contains(point));
        if !reach.contains(point) && !in_label {
            return None;
        }

        let local = node.to_local(point);
        let mut hits: Vec<PadHit> = Vec::new();
        for pad in self.all_landing_pads(node) {
            if let Ok(offset) = self.local_landing_offset(pad) {
                let distance = (local - offset).hypot();
                if distance <= PAD_HIT_RADIUS {
                    hits.push(PadHit {
                        pad,
                        kind: PadKind::Landing,
                        distance,
                    });
                }
            }
        }
        let extra_length = self.extra_length(node.extra_pads);
        for pad in 0..self.launch_pad_count() {
            if let Ok(offset) = self.fixed_launch_offset(pad, extra_length) {
                let distance = (local - offset).hypot();
                if distance <= PAD_HIT_RADIUS {
                    hits.push(PadHit {
                        pad,
                        kind: PadKind::Launch,
                        distance,
                    });
                }
            }
        }
        if !hits.is_empty() {
            hits.sort_by(|a, b| {
                a.distance
                    .total_cmp(&b.distance)
                    .then(a.kind.cmp(&b.kind))
                    .then_with(|| self.compare_pads(a.pad, b.pad).unwrap_or(Ordering::Equal))
            });
            return Some(Intersection::Pads(hits));
        }

        if self.body_contains(local, extra_length) {
            return Some(Intersection::Glyph);
        }
        if self
            .extra_pad_expansion(node.extra_pads)
            .is_some_and(|r| r.contains(local.to_point()))
        {
            return Some(Intersection::Glyph);
        }
        if in_label {
            return Some(Intersection::Label);
        }
        None
    }

    /// Hit-test a world rectangle against glyph and label bounds.
    fn intersects_rect(&self, node: &NodeGeometry, rect: Rect) -> Option<Intersection> {
        if rects_overlap(rect, self.world_bounds(node)) {
            return Some(Intersection::Glyph);
        }
        if self
            .label_bounds(node)
            .is_some_and(|l| rects_overlap(rect, l))
        {
            return Some(Intersection::Label);
        }
        None
    }
}

/// Closed-edge overlap, so zero-width and zero-height rectangles still hit.
fn rects_overlap(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

/// Label box centered under a body rectangle.
fn label_rect(body: Rect, metrics: LabelMetrics) -> Rect {
    let cx = (body.x0 + body.x1) / 2.0;
    let top = body.y1 + LABEL_GAP;
    Rect::new(
        cx - metrics.width / 2.0,
        top,
        cx + metrics.width / 2.0,
        top + metrics.height,
    )
}

/// Reorder left-to-right pads to start at the middle and fan outward.
fn center_out(pads: &[i32]) -> Vec<i32> {
    if pads.is_empty() {
        return Vec::new();
    }
    let mid = (pads.len() - 1) / 2;
    let mut out = vec![pads[mid]];
    for step in 1..pads.len() {
        if mid + step < pads.len() {
            out.push(pads[mid + step]);
        }
        if step <= mid {
            out.push(pads[mid - step]);
        }
    }
    out
}
