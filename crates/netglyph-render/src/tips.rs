//! Link tips (arrowheads and inhibitor bars) and evidence glyphs.

use kurbo::{Point, Vec2};
use netglyph_core::geometry::LinkSegment;
use netglyph_core::model::LinkSign;
use netglyph_core::style::{ResolvedDrawStyle, Rgba};

use crate::sink::{Paint, PathOp, Primitive, StrokeStyle};

/// Arrowhead length per unit of link thickness.
pub const ARROW_LENGTH_PER_THICKNESS: f64 = 3.0;
pub const MIN_ARROW_LENGTH: f64 = 8.0;
/// Arrowhead half-width as a fraction of its length.
pub const ARROW_HALF_WIDTH_RATIO: f64 = 0.6;
/// Inhibitor bar length per unit of link thickness.
pub const BAR_LENGTH_PER_THICKNESS: f64 = 4.0;
pub const MIN_BAR_LENGTH: f64 = 10.0;
/// Half-diagonal of an evidence diamond at level 1.
pub const EVIDENCE_GLYPH_SIZE: f64 = 4.0;
/// Gap between a tip and the evidence diamond behind it.
pub const EVIDENCE_GAP: f64 = 2.0;

/// Where a tip sits and which way the link is travelling when it gets there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TipPlacement {
    pub point: Point,
    /// Unit vector along the direction of travel.
    pub direction: Vec2,
}

impl TipPlacement {
    /// Placement at the foot of a drop.
    ///
    /// A degenerate drop has no direction of its own; the landing pad's
    /// arrival direction is used instead. Returns `None` when neither is known.
    pub fn for_drop(drop: &LinkSegment, pad_arrival: Option<Vec2>) -> Option<Self> {
        let direction = drop.run().or_else(|| pad_arrival.and_then(normalized))?;
        Some(Self {
            point: drop.end,
            direction,
        })
    }

    fn perpendicular(&self) -> Vec2 {
        Vec2::new(-self.direction.y, self.direction.x)
    }
}

fn normalized(v: Vec2) -> Option<Vec2> {
    let len = v.hypot();
    (len > f64::EPSILON).then(|| v / len)
}

pub fn arrow_length(thickness: f64) -> f64 {
    (thickness * ARROW_LENGTH_PER_THICKNESS).max(MIN_ARROW_LENGTH)
}

pub fn bar_length(thickness: f64, extra_foot_size: f64) -> f64 {
    (thickness * BAR_LENGTH_PER_THICKNESS).max(MIN_BAR_LENGTH) + extra_foot_size
}

/// How far back from the landing point a tip reaches.
pub fn tip_depth(sign: LinkSign, thickness: f64) -> f64 {
    match sign {
        LinkSign::Positive => arrow_length(thickness),
        LinkSign::Negative => thickness / 2.0,
        LinkSign::Neutral => 0.0,
    }
}

/// The tip for a link of the given sign, `None` for neutral links.
pub fn tip_primitive(
    sign: LinkSign,
    placement: &TipPlacement,
    style: &ResolvedDrawStyle,
    extra_foot_size: f64,
) -> Option<Primitive> {
    match sign {
        LinkSign::Positive => {
            let length = arrow_length(style.thickness);
            let half_width = length * ARROW_HALF_WIDTH_RATIO;
            let base = placement.point - placement.direction * length;
            let perp = placement.perpendicular();
            Some(Primitive::Polygon {
                points: vec![
                    placement.point,
                    base + perp * half_width,
                    base - perp * half_width,
                ],
                paint: Paint::filled(style.color),
            })
        }
        LinkSign::Negative => {
            let half = bar_length(style.thickness, extra_foot_size) / 2.0;
            let perp = placement.perpendicular();
            Some(Primitive::Path {
                ops: vec![
                    PathOp::MoveTo(placement.point - perp * half),
                    PathOp::LineTo(placement.point + perp * half),
                ],
                color: style.color,
                stroke: StrokeStyle::solid(style.thickness),
            })
        }
        LinkSign::Neutral => None,
    }
}

/// Diamond marking a link's evidence level, set just behind its tip.
pub fn evidence_glyph(
    sign: LinkSign,
    placement: &TipPlacement,
    style: &ResolvedDrawStyle,
    level: u8,
) -> Primitive {
    let size = EVIDENCE_GLYPH_SIZE + f64::from(level.saturating_sub(1));
    let back = tip_depth(sign, style.thickness) + EVIDENCE_GAP + size;
    let center = placement.point - placement.direction * back;
    let along = placement.direction * size;
    let across = placement.perpendicular() * size;
    Primitive::Polygon {
        points: vec![
            center + along,
            center + across,
            center - along,
            center - across,
        ],
        paint: Paint::filled(Rgba::white()).with_outline(style.color, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netglyph_core::style::LinePattern;

    fn style(thickness: f64) -> ResolvedDrawStyle {
        ResolvedDrawStyle::new(Rgba::black(), thickness, LinePattern::Solid)
    }

    fn rightward() -> TipPlacement {
        TipPlacement {
            point: Point::new(100.0, 50.0),
            direction: Vec2::new(1.0, 0.0),
        }
    }

    #[test]
    fn test_arrowhead_points_along_travel() {
        let prim = tip_primitive(LinkSign::Positive, &rightward(), &style(3.0), 0.0).unwrap();
        let Primitive::Polygon { points, paint } = prim else {
            panic!("expected polygon");
        };
        assert_eq!(points[0], Point::new(100.0, 50.0));
        // Length is 9 for thickness 3; half-width 5.4.
        assert!((points[1].x - 91.0).abs() < 1e-9);
        assert!(((points[1].y - points[2].y).abs() - 10.8).abs() < 1e-9);
        assert_eq!(paint.fill, Some(Rgba::black()));
    }

    #[test]
    fn test_inhibitor_bar_is_perpendicular_and_widened() {
        let prim = tip_primitive(LinkSign::Negative, &rightward(), &style(3.0), 4.0).unwrap();
        let Primitive::Path { ops, stroke, .. } = prim else {
            panic!("expected path");
        };
        let (PathOp::MoveTo(a), PathOp::LineTo(b)) = (ops[0], ops[1]) else {
            panic!("expected move then line");
        };
        assert!((a.x - b.x).abs() < 1e-9);
        // max(12, 10) + 4
        assert!(((b.y - a.y).abs() - 16.0).abs() < 1e-9);
        assert!((stroke.width - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_neutral_has_no_tip() {
        assert!(tip_primitive(LinkSign::Neutral, &rightward(), &style(3.0), 0.0).is_none());
        assert_eq!(tip_depth(LinkSign::Neutral, 3.0), 0.0);
    }

    #[test]
    fn test_degenerate_drop_falls_back_to_pad_direction() {
        let drop = LinkSegment::new(Point::new(5.0, 5.0), Point::new(5.0, 5.0));
        assert!(TipPlacement::for_drop(&drop, None).is_none());
        let placement = TipPlacement::for_drop(&drop, Some(Vec2::new(0.0, 2.0))).unwrap();
        assert_eq!(placement.direction, Vec2::new(0.0, 1.0));
        assert_eq!(placement.point, Point::new(5.0, 5.0));

        let drop = LinkSegment::new(Point::new(0.0, 0.0), Point::new(0.0, -10.0));
        let placement = TipPlacement::for_drop(&drop, Some(Vec2::new(1.0, 0.0))).unwrap();
        assert_eq!(placement.direction, Vec2::new(0.0, -1.0));
    }

    #[test]
    fn test_evidence_diamond_sits_behind_tip() {
        let prim = evidence_glyph(LinkSign::Positive, &rightward(), &style(3.0), 1);
        let Primitive::Polygon { points, .. } = prim else {
            panic!("expected polygon");
        };
        let front = points[0].x;
        // Arrow reaches back to x = 91; the diamond must start behind it.
        assert!(front <= 91.0 - EVIDENCE_GAP + 1e-9);
        let bigger = evidence_glyph(LinkSign::Positive, &rightward(), &style(3.0), 3);
        let Primitive::Polygon { points: big, .. } = bigger else {
            panic!("expected polygon");
        };
        assert!((big[1].y - big[3].y).abs() > (points[1].y - points[3].y).abs());
    }
}
