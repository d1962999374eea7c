//! Shape sink abstraction.

use kurbo::{Affine, BezPath, Ellipse, Point, Rect, Shape, Vec2};
use netglyph_core::pads::PadError;
use netglyph_core::style::{LinePattern, ResolvedDrawStyle, Rgba};
use netglyph_core::tree::DrawTreeError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Render errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Draw tree error: {0}")]
    Tree(#[from] DrawTreeError),
    #[error("Pad geometry error: {0}")]
    Pad(#[from] PadError),
    #[error("Export failed: {0}")]
    Export(String),
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Paint layers, back to front.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DrawLayer {
    Inactive,
    Active,
    Tips,
    Glyphs,
    Selection,
}

impl DrawLayer {
    /// All layers in paint order.
    pub const ALL: [DrawLayer; 5] = [
        DrawLayer::Inactive,
        DrawLayer::Active,
        DrawLayer::Tips,
        DrawLayer::Glyphs,
        DrawLayer::Selection,
    ];

    /// Layer for link geometry of the given activity.
    pub fn for_link(active: bool) -> Self {
        if active {
            DrawLayer::Active
        } else {
            DrawLayer::Inactive
        }
    }
}

/// Stroke parameters for a path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub width: f64,
    pub pattern: LinePattern,
}

impl StrokeStyle {
    pub fn solid(width: f64) -> Self {
        Self {
            width,
            pattern: LinePattern::Solid,
        }
    }

    /// Dash lengths for this stroke (empty = solid).
    pub fn dashes(&self) -> Vec<f64> {
        self.pattern.dashes(self.width)
    }
}

impl From<&ResolvedDrawStyle> for StrokeStyle {
    fn from(style: &ResolvedDrawStyle) -> Self {
        Self {
            width: style.thickness,
            pattern: style.pattern,
        }
    }
}

/// One path operation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathOp {
    MoveTo(Point),
    LineTo(Point),
}

/// A fill with an optional outline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Paint {
    pub fill: Option<Rgba>,
    pub outline: Option<(Rgba, f64)>,
}

impl Paint {
    pub fn filled(color: Rgba) -> Self {
        Self {
            fill: Some(color),
            outline: None,
        }
    }

    pub fn outlined(color: Rgba, width: f64) -> Self {
        Self {
            fill: None,
            outline: Some((color, width)),
        }
    }

    pub fn with_outline(mut self, color: Rgba, width: f64) -> Self {
        self.outline = Some((color, width));
        self
    }
}

/// A drawing primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Primitive {
    /// Stroked polyline made of one or more subpaths.
    Path {
        ops: Vec<PathOp>,
        color: Rgba,
        stroke: StrokeStyle,
    },
    /// Closed polygon.
    Polygon { points: Vec<Point>, paint: Paint },
    /// Ellipse (dots, halos).
    Ellipse {
        center: Point,
        radii: Vec2,
        paint: Paint,
    },
    /// Rounded rectangle (tablet bodies).
    RoundedRect {
        rect: Rect,
        radius: f64,
        paint: Paint,
    },
    /// Label placeholder; text layout happens downstream.
    Label {
        text: String,
        rect: Rect,
        color: Rgba,
    },
}

impl Primitive {
    /// Geometry of the primitive as a bezier path.
    pub fn to_path(&self) -> BezPath {
        match self {
            Primitive::Path { ops, .. } => {
                let mut path = BezPath::new();
                for op in ops {
                    match *op {
                        PathOp::MoveTo(p) => path.move_to(p),
                        PathOp::LineTo(p) => path.line_to(p),
                    }
                }
                path
            }
            Primitive::Polygon { points, .. } => {
                let mut path = BezPath::new();
                if let Some((first, rest)) = points.split_first() {
                    path.move_to(*first);
                    for p in rest {
                        path.line_to(*p);
                    }
                    path.close_path();
                }
                path
            }
            Primitive::Ellipse { center, radii, .. } => {
                Ellipse::new(*center, *radii, 0.0).to_path(0.1)
            }
            Primitive::RoundedRect { rect, radius, .. } => {
                kurbo::RoundedRect::from_rect(*rect, *radius).to_path(0.1)
            }
            Primitive::Label { rect, .. } => rect.to_path(0.1),
        }
    }
}

/// Compositing mode for subsequent draws.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Composite {
    #[default]
    SourceOver,
    /// Draw at reduced opacity.
    Faded(f32),
}

/// Shapes recorded only for export hit regions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoundsShape {
    Rect { rect: Rect },
    Polyline { points: Vec<Point>, width: f64 },
}

/// Receiver of draw commands for one render pass.
///
/// Commands arrive in a strict caller-determined sequence; implementations
/// must preserve it.
pub trait ShapeSink {
    /// Open a named group (one link bus or node).
    fn push_group(&mut self, id: &str);

    fn pop_group(&mut self);

    fn draw(&mut self, layer: DrawLayer, primitive: Primitive);

    /// Record an export-only bounds shape for the current group.
    fn bounds(&mut self, shape: BoundsShape);

    fn push_transform(&mut self, transform: Affine);

    fn pop_transform(&mut self);

    fn set_composite(&mut self, composite: Composite);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_order() {
        let mut layers = DrawLayer::ALL.to_vec();
        layers.reverse();
        layers.sort();
        assert_eq!(layers, DrawLayer::ALL.to_vec());
        assert!(DrawLayer::for_link(false) < DrawLayer::for_link(true));
    }

    #[test]
    fn test_path_with_two_subpaths() {
        let prim = Primitive::Path {
            ops: vec![
                PathOp::MoveTo(Point::new(0.0, 0.0)),
                PathOp::LineTo(Point::new(10.0, 0.0)),
                PathOp::MoveTo(Point::new(0.0, 5.0)),
                PathOp::LineTo(Point::new(10.0, 5.0)),
            ],
            color: Rgba::black(),
            stroke: StrokeStyle::solid(3.0),
        };
        let path = prim.to_path();
        assert_eq!(path.elements().len(), 4);
        let bbox = path.bounding_box();
        assert!((bbox.height() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_polygon_is_closed() {
        let prim = Primitive::Polygon {
            points: vec![
                Point::new(0.0, 0.0),
                Point::new(4.0, 0.0),
                Point::new(2.0, 3.0),
            ],
            paint: Paint::filled(Rgba::black()),
        };
        let path = prim.to_path();
        assert_eq!(path.elements().len(), 4);
        assert!((path.area().abs() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_stroke_from_resolved_style() {
        let style = ResolvedDrawStyle::new(Rgba::black(), 4.0, LinePattern::Dashed);
        let stroke = StrokeStyle::from(&style);
        assert_eq!(stroke.dashes(), vec![12.0, 8.0]);
    }
}
