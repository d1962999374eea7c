//! Inline nodes: slashes, intercell markers and bare text nodes.

use kurbo::{Rect, Vec2};
use serde::{Deserialize, Serialize};

use super::{PAD_HIT_RADIUS, PadError, PadGeometry, PadResult, PadSide};

/// A short bar set inline with the links passing through it.
///
/// Landing pads: 0 at the left end, 1 on top, 2 underneath. Extra pads
/// spill to the right of center outside the bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InlineShape {
    pub length: f64,
    pub width: f64,
    pub pad_spacing: f64,
}

impl Default for InlineShape {
    fn default() -> Self {
        Self {
            length: 20.0,
            width: 6.0,
            pad_spacing: 8.0,
        }
    }
}

impl InlineShape {
    fn out_of_range(pad: i32) -> PadError {
        PadError::PadOutOfRange {
            pad,
            family: "inline",
        }
    }
}

impl PadGeometry for InlineShape {
    fn family_name(&self) -> &'static str {
        "inline"
    }

    fn landing_pad_count(&self) -> i32 {
        3
    }

    fn pad_spacing(&self) -> f64 {
        self.pad_spacing
    }

    fn fixed_landing_offset(&self, pad: i32) -> PadResult<Vec2> {
        match pad {
            0 => Ok(Vec2::new(-self.length / 2.0, 0.0)),
            1 => Ok(Vec2::new(0.0, -self.width / 2.0)),
            2 => Ok(Vec2::new(0.0, self.width / 2.0)),
            other => Err(Self::out_of_range(other)),
        }
    }

    fn fixed_landing_side(&self, pad: i32) -> PadResult<PadSide> {
        match pad {
            0 => Ok(PadSide::Left),
            1 => Ok(PadSide::Top),
            2 => Ok(PadSide::Bottom),
            other => Err(Self::out_of_range(other)),
        }
    }

    fn fixed_launch_offset(&self, pad: i32, _extra_length: f64) -> PadResult<Vec2> {
        match pad {
            0 => Ok(Vec2::new(self.length / 2.0, 0.0)),
            other => Err(Self::out_of_range(other)),
        }
    }

    fn top_pads(&self) -> Vec<i32> {
        vec![1]
    }

    fn extra_band_start(&self) -> f64 {
        0.0
    }

    fn half_height(&self) -> f64 {
        self.width / 2.0
    }

    fn extra_length(&self, _extra_pads: u32) -> f64 {
        0.0
    }

    fn body_bounds(&self, _extra_length: f64) -> Rect {
        Rect::new(
            -self.length / 2.0,
            -self.width / 2.0,
            self.length / 2.0,
            self.width / 2.0,
        )
    }

    fn extra_pad_expansion(&self, extra_pads: u32) -> Option<Rect> {
        if extra_pads == 0 {
            return None;
        }
        let reach = extra_pads.div_ceil(2) as f64 * self.pad_spacing;
        Some(Rect::new(
            0.0,
            -self.width / 2.0 - PAD_HIT_RADIUS,
            reach + PAD_HIT_RADIUS,
            self.width / 2.0 + PAD_HIT_RADIUS,
        ))
    }
}
