//! Geometry primitives shared by links and node glyphs.

use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

use crate::pads::PadError;

/// Segments shorter than this are treated as degenerate.
pub const DEGENERATE_LENGTH: f64 = 1.0e-6;

/// An immutable start/end pair owned by the layout.
///
/// Links run from the source (`start`) toward the targets (`end`), so for a
/// drop the `end` point sits on the target node's landing pad.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkSegment {
    pub start: Point,
    pub end: Point,
}

impl LinkSegment {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Length of the segment.
    pub fn length(&self) -> f64 {
        (self.end - self.start).hypot()
    }

    /// Whether the segment collapses to a point.
    pub fn is_degenerate(&self) -> bool {
        self.length() < DEGENERATE_LENGTH
    }

    /// Unit vector from start to end, `None` for a degenerate segment.
    pub fn run(&self) -> Option<Vec2> {
        let delta = self.end - self.start;
        let len = delta.hypot();
        if len < DEGENERATE_LENGTH {
            None
        } else {
            Some(delta / len)
        }
    }

    /// The run rotated a quarter turn clockwise (screen space, y down).
    pub fn normal(&self) -> Option<Vec2> {
        self.run().map(|r| Vec2::new(-r.y, r.x))
    }
}

/// Node orientation in quarter turns, clockwise in screen space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Right,
    Down,
    Left,
    Up,
}

impl Orientation {
    /// Decode an integer orientation code (0..=3).
    pub fn from_code(code: i32) -> Result<Self, PadError> {
        match code {
            0 => Ok(Orientation::Right),
            1 => Ok(Orientation::Down),
            2 => Ok(Orientation::Left),
            3 => Ok(Orientation::Up),
            other => Err(PadError::InvalidOrientation(other)),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Orientation::Right => 0,
            Orientation::Down => 1,
            Orientation::Left => 2,
            Orientation::Up => 3,
        }
    }

    /// Rotate a vector from the node's local frame into this orientation.
    ///
    /// Exact in all four cases so repeated renders stay bit-identical.
    pub fn rotate(self, v: Vec2) -> Vec2 {
        match self {
            Orientation::Right => v,
            Orientation::Down => Vec2::new(-v.y, v.x),
            Orientation::Left => Vec2::new(-v.x, -v.y),
            Orientation::Up => Vec2::new(v.y, -v.x),
        }
    }

    /// Inverse of [`Orientation::rotate`].
    pub fn unrotate(self, v: Vec2) -> Vec2 {
        match self {
            Orientation::Right => v,
            Orientation::Down => Vec2::new(v.y, -v.x),
            Orientation::Left => Vec2::new(-v.x, -v.y),
            Orientation::Up => Vec2::new(-v.y, v.x),
        }
    }

    /// Rotate an origin-anchored rectangle.
    pub fn rotate_rect(self, rect: Rect) -> Rect {
        let a = self.rotate(Vec2::new(rect.x0, rect.y0));
        let b = self.rotate(Vec2::new(rect.x1, rect.y1));
        Rect::from_points(a.to_point(), b.to_point())
    }

    /// Whether the node's reading axis runs vertically.
    pub fn is_vertical(self) -> bool {
        matches!(self, Orientation::Down | Orientation::Up)
    }

    /// Transform placing a local-frame glyph at `origin`.
    pub fn transform(self, origin: Point) -> Affine {
        let rot = match self {
            Orientation::Right => Affine::IDENTITY,
            Orientation::Down => Affine::new([0.0, 1.0, -1.0, 0.0, 0.0, 0.0]),
            Orientation::Left => Affine::new([-1.0, 0.0, 0.0, -1.0, 0.0, 0.0]),
            Orientation::Up => Affine::new([0.0, -1.0, 1.0, 0.0, 0.0, 0.0]),
        };
        Affine::translate(origin.to_vec2()) * rot
    }
}
