//! Shape family dispatch.

use kurbo::{BezPath, RoundedRect, Shape};
use serde::{Deserialize, Serialize};

use super::{BoxShape, InlineShape, PadGeometry, TabletShape};

/// Enum wrapper for all node families (for serialization).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeFamily {
    Inline(InlineShape),
    Box(BoxShape),
    Tablet(TabletShape),
}

impl Default for ShapeFamily {
    fn default() -> Self {
        ShapeFamily::Box(BoxShape::default())
    }
}

impl ShapeFamily {
    pub fn inline() -> Self {
        ShapeFamily::Inline(InlineShape::default())
    }

    pub fn boxed() -> Self {
        ShapeFamily::Box(BoxShape::default())
    }

    pub fn tablet() -> Self {
        ShapeFamily::Tablet(TabletShape::default())
    }

    /// The pad engine for this family.
    pub fn pads(&self) -> &dyn PadGeometry {
        match self {
            ShapeFamily::Inline(s) => s,
            ShapeFamily::Box(s) => s,
            ShapeFamily::Tablet(s) => s,
        }
    }

    /// Glyph outline in the local frame.
    pub fn outline(&self, extra_pads: u32) -> BezPath {
        let pads = self.pads();
        let body = pads.body_bounds(pads.extra_length(extra_pads));
        match self {
            ShapeFamily::Inline(_) | ShapeFamily::Box(_) => body.to_path(0.1),
            ShapeFamily::Tablet(t) => {
                RoundedRect::from_rect(body, t.height / 2.0).to_path(0.1)
            }
        }
    }
}
