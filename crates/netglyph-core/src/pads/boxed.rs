//! Rectangular glyphs: gene boxes and plain rectangles.

use kurbo::{Rect, Vec2};
use serde::{Deserialize, Serialize};

use super::{PadError, PadGeometry, PadResult, PadSide};

/// A box with evenly spaced pads along its top and bottom edges.
///
/// Landing pad 0 is the middle of the left edge. Pads `1..=top_pads` run
/// left to right along the top, the next `top_pads` left to right along the
/// bottom. The launch pad is the middle of the right edge, which moves
/// outward as extra pads lengthen the box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxShape {
    pub top_pads: u32,
    pub pad_spacing: f64,
    pub height: f64,
}

impl Default for BoxShape {
    fn default() -> Self {
        Self {
            top_pads: 4,
            pad_spacing: 10.0,
            height: 20.0,
        }
    }
}

impl BoxShape {
    /// Width before any extra-pad extension.
    pub fn base_width(&self) -> f64 {
        (self.top_pads + 1) as f64 * self.pad_spacing
    }

    fn out_of_range(pad: i32) -> PadError {
        PadError::PadOutOfRange { pad, family: "box" }
    }

    /// Position along the edge (1-based from the left) for a top or bottom pad.
    fn column(&self, pad: i32) -> PadResult<(u32, PadSide)> {
        let n = self.top_pads as i32;
        match pad {
            p if (1..=n).contains(&p) => Ok((p as u32, PadSide::Top)),
            p if (n + 1..=2 * n).contains(&p) => Ok(((p - n) as u32, PadSide::Bottom)),
            other => Err(Self::out_of_range(other)),
        }
    }
}

impl PadGeometry for BoxShape {
    fn family_name(&self) -> &'static str {
        "box"
    }

    fn landing_pad_count(&self) -> i32 {
        2 * self.top_pads as i32 + 1
    }

    fn pad_spacing(&self) -> f64 {
        self.pad_spacing
    }

    fn fixed_landing_offset(&self, pad: i32) -> PadResult<Vec2> {
        let half_w = self.base_width() / 2.0;
        if pad == 0 {
            return Ok(Vec2::new(-half_w, 0.0));
        }
        let (col, side) = self.column(pad)?;
        let x = -half_w + col as f64 * self.pad_spacing;
        let y = match side {
            PadSide::Top => -self.height / 2.0,
            _ => self.height / 2.0,
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
            0 => Ok(Vec2::new(self.base_width() / 2.0 + extra_length, 0.0)),
            other => Err(Self::out_of_range(other)),
        }
    }

    fn top_pads(&self) -> Vec<i32> {
        (1..=self.top_pads as i32).collect()
    }

    fn extra_band_start(&self) -> f64 {
        -self.base_width() / 2.0 + self.top_pads as f64 * self.pad_spacing
    }

    fn half_height(&self) -> f64 {
        self.height / 2.0
    }

    fn extra_length(&self, extra_pads: u32) -> f64 {
        extra_pads.div_ceil(2) as f64 * self.pad_spacing
    }

    fn body_bounds(&self, extra_length: f64) -> Rect {
        let half_w = self.base_width() / 2.0;
        Rect::new(
            -half_w,
            -self.height / 2.0,
            half_w + extra_length,
            self.height / 2.0,
        )
    }
}
