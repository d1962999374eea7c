//! One node of a draw tree.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::LinkSegment;
use crate::model::{LinkId, LinkSegmentId};
use crate::style::{PerLinkDrawStyle, SuggestedDrawStyle};

/// Index of a segment inside its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegIdx(pub usize);

/// A per-link style contributed to a segment.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkContribution {
    pub link: LinkId,
    pub style: PerLinkDrawStyle,
    /// Derived from the link's evidence level rather than set on the link.
    pub evidence: bool,
}

/// A segment of the draw tree with its accumulated per-link state.
#[derive(Debug, Clone)]
pub struct DrawTreeSegment {
    pub id: LinkSegmentId,
    /// `None` only in thickness-only queries built without a layout.
    pub geometry: Option<LinkSegment>,
    /// Per-segment override from the layout.
    pub suggested: Option<SuggestedDrawStyle>,
    pub contributions: Vec<LinkContribution>,
    /// Activity level per link passing through.
    pub activity: BTreeMap<LinkId, f64>,
    /// Next segment toward the root.
    pub parent: Option<SegIdx>,
    pub active: bool,
    pub selected: bool,
    /// Number of link paths running through this segment.
    pub path_count: usize,
    pub children: usize,
    pub active_children: usize,
}

impl DrawTreeSegment {
    pub fn new(
        id: LinkSegmentId,
        geometry: Option<LinkSegment>,
        suggested: Option<SuggestedDrawStyle>,
    ) -> Self {
        Self {
            id,
            geometry,
            suggested,
            contributions: Vec::new(),
            activity: BTreeMap::new(),
            parent: None,
            active: false,
            selected: false,
            path_count: 0,
            children: 0,
            active_children: 0,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Whether a branch-point glyph belongs at this segment's far end.
    pub fn is_active_branch(&self) -> bool {
        self.active_children >= 2
    }

    /// Whether any per-link input affects the resolved style.
    pub fn has_link_input(&self) -> bool {
        !self.contributions.is_empty() || !self.activity.is_empty()
    }
}
