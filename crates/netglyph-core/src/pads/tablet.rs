//! Rounded "tablet" glyphs used for complexes and boxed text.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

use super::{PadError, PadGeometry, PadResult, PadSide};

/// A stadium: a straight section capped by two half circles.
///
/// Pad 0 is the left apex. Top pads run left to right along the straight
/// section; bottom pads continue clockwise, so they run right to left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TabletShape {
    pub top_pads: u32,
    pub pad_spacing: f64,
    pub height: f64,
}

impl Default for TabletShape {
    fn default() -> Self {
        Self {
            top_pads: 3,
            pad_spacing: 10.0,
            height: 16.0,
        }
    }
}

impl TabletShape {
    fn radius(&self) -> f64 {
        self.height / 2.0
    }

    /// Length of the straight section before any extension.
    pub fn straight_width(&self) -> f64 {
        (self.top_pads + 1) as f64 * self.pad_spacing
    }

    fn out_of_range(pad: i32) -> PadError {
        PadError::PadOutOfRange {
            pad,
            family: "tablet",
        }
    }

    fn column(&self, pad: i32) -> PadResult<(u32, PadSide)> {
        let n = self.top_pads as i32;
        match pad {
            p if (1..=n).contains(&p) => Ok((p as u32, PadSide::Top)),
            p if (n + 1..=2 * n).contains(&p) => Ok(((2 * n + 1 - p) as u32, PadSide::Bottom)),
            other => Err(Self::out_of_range(other)),
        }
    }
}

impl PadGeometry for TabletShape {
    fn family_name(&self) -> &'static str {
        "tablet"
    }

    fn landing_pad_count(&self) -> i32 {
        2 * self.top_pads as i32 + 1
    }

    fn pad_spacing(&self) -> f64 {
        self.pad_spacing
    }

    fn fixed_landing_offset(&self, pad: i32) -> PadResult<Vec2> {
        let half_straight = self.straight_width() / 2.0;
        if pad == 0 {
            return Ok(Vec2::new(-half_straight - self.radius(), 0.0));
        }
        let (col, side) = self.column(pad)?;
        let x = -half_straight + col as f64 * self.pad_spacing;
        let y = match side {
            PadSide::Top => -self.radius(),
            _ => self.radius(),
        };
        Ok(Vec2::new(x, y))
    }

    fn fixed_landing_side(&self, pad: i32) -> PadResult<PadSide> {
        if pad == 0 {
            return Ok(PadSide::Left);
        }
        self.column(pad).map(|(_, side)| side)
    }

    fn fixed_launch_offset(&self, pad: i32, extra_length: f64) -> PadResult<Vec2> {
        match pad {
            0 => Ok(Vec2::new(
                self.straight_width() / 2.0 + self.radius() + extra_length,
                0.0,
            )),
            other => Err(Self::out_of_range(other)),
        }
    }

    fn top_pads(&self) -> Vec<i32> {
        (1..=self.top_pads as i32).collect()
    }

    fn extra_band_start(&self) -> f64 {
        -self.straight_width() / 2.0 + self.top_pads as f64 * self.pad_spacing
    }

    fn half_height(&self) -> f64 {
        self.radius()
    }

    fn extra_length(&self, extra_pads: u32) -> f64 {
        extra_pads.div_ceil(2) as f64 * self.pad_spacing
    }

    fn body_bounds(&self, extra_length: f64) -> Rect {
        let half_straight = self.straight_width() / 2.0;
        let r = self.radius();
        Rect::new(-half_straight - r, -r, half_straight + r + extra_length, r)
    }

    fn body_contains(&self, local: Vec2, extra_length: f64) -> bool {
        let r = self.radius();
        let left = -self.straight_width() / 2.0;
        let right = self.straight_width() / 2.0 + extra_length;
        if local.y.abs() > r {
            return false;
        }
        if (left..=right).contains(&local.x) {
            return true;
        }
        let p = local.to_point();
        p.distance(Point::new(left, 0.0)) <= r || p.distance(Point::new(right, 0.0)) <= r
    }
}
