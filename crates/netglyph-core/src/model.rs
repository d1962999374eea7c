//! Model and layout records consumed by the renderers.
//!
//! These are the narrow views of the network model the drawing core needs:
//! link-bus topology with segment geometry, per-link display state and
//! per-node placement.

use std::collections::{BTreeMap, HashMap};

use kurbo::Point;
use serde::{Deserialize, Serialize};

use crate::geometry::{LinkSegment, Orientation};
use crate::pads::{LabelMetrics, NodeGeometry, ShapeFamily};
use crate::style::{PerLinkDrawStyle, Rgba, SuggestedDrawStyle};
use crate::tree::DrawTreeError;

/// Identifier of a link (one source-to-target connection).
pub type LinkId = String;

/// Identifier of an interior bus segment.
pub type SegmentId = String;

/// Identifier of a node.
pub type NodeId = String;

/// The role a segment plays inside a link bus.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LinkSegmentId {
    /// A link drawn straight from source pad to target pad.
    Direct(LinkId),
    /// The drop leaving the source node.
    RootDrop,
    /// The drop landing on the target of the given link.
    EndDrop(LinkId),
    /// A shared interior segment.
    Segment(SegmentId),
}

impl LinkSegmentId {
    /// Whether this segment touches a node.
    pub fn is_drop(&self) -> bool {
        !matches!(self, LinkSegmentId::Segment(_))
    }

    /// Whether this segment lands on a target node.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LinkSegmentId::Direct(_) | LinkSegmentId::EndDrop(_))
    }

    /// The link a terminal segment belongs to.
    pub fn link(&self) -> Option<&str> {
        match self {
            LinkSegmentId::Direct(link) | LinkSegmentId::EndDrop(link) => Some(link),
            _ => None,
        }
    }
}

impl std::fmt::Display for LinkSegmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkSegmentId::Direct(link) => write!(f, "direct:{link}"),
            LinkSegmentId::RootDrop => write!(f, "root"),
            LinkSegmentId::EndDrop(link) => write!(f, "drop:{link}"),
            LinkSegmentId::Segment(seg) => write!(f, "seg:{seg}"),
        }
    }
}

/// Sign of influence a link carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LinkSign {
    #[default]
    Positive,
    Negative,
    Neutral,
}

/// The drop leaving the source node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootDrop {
    pub geometry: LinkSegment,
    #[serde(default)]
    pub style: Option<SuggestedDrawStyle>,
}

/// An interior segment shared by one or more links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusSegment {
    pub id: SegmentId,
    /// Next segment toward the source; `None` attaches to the root drop.
    #[serde(default)]
    pub parent: Option<SegmentId>,
    pub geometry: LinkSegment,
    #[serde(default)]
    pub style: Option<SuggestedDrawStyle>,
}

/// The drop landing on one link's target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndDrop {
    pub link: LinkId,
    pub target: NodeId,
    /// Landing pad on the target.
    #[serde(default)]
    pub pad: i32,
    /// Segment this drop hangs off; `None` hangs off the root drop.
    #[serde(default)]
    pub attach: Option<SegmentId>,
    pub geometry: LinkSegment,
    #[serde(default)]
    pub style: Option<SuggestedDrawStyle>,
}

/// A tree of links sharing one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkBus {
    pub id: String,
    pub source: NodeId,
    /// Tree-wide default style.
    #[serde(default)]
    pub style: SuggestedDrawStyle,
    /// Absent for a direct (single, unbranched) link.
    #[serde(default)]
    pub root_drop: Option<RootDrop>,
    #[serde(default)]
    pub segments: Vec<BusSegment>,
    pub end_drops: Vec<EndDrop>,
    /// Links between net modules rather than genes.
    #[serde(default)]
    pub module_link: bool,
}

impl LinkBus {
    /// Create a bus with a root drop and no branches yet.
    pub fn new(id: impl Into<String>, source: impl Into<NodeId>, root: LinkSegment) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            style: SuggestedDrawStyle::default(),
            root_drop: Some(RootDrop {
                geometry: root,
                style: None,
            }),
            segments: Vec::new(),
            end_drops: Vec::new(),
            module_link: false,
        }
    }

    /// Create a direct link with no shared geometry.
    pub fn direct(
        id: impl Into<String>,
        source: impl Into<NodeId>,
        link: impl Into<LinkId>,
        target: impl Into<NodeId>,
        geometry: LinkSegment,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            style: SuggestedDrawStyle::default(),
            root_drop: None,
            segments: Vec::new(),
            end_drops: vec![EndDrop {
                link: link.into(),
                target: target.into(),
                pad: 0,
                attach: None,
                geometry,
                style: None,
            }],
            module_link: false,
        }
    }

    pub fn with_style(mut self, style: SuggestedDrawStyle) -> Self {
        self.style = style;
        self
    }

    /// Add an interior segment.
    pub fn add_segment(
        &mut self,
        id: impl Into<SegmentId>,
        parent: Option<&str>,
        geometry: LinkSegment,
    ) -> &mut BusSegment {
        self.segments.push(BusSegment {
            id: id.into(),
            parent: parent.map(str::to_string),
            geometry,
            style: None,
        });
        let last = self.segments.len() - 1;
        &mut self.segments[last]
    }

    /// Add an end drop for a link.
    pub fn add_end_drop(
        &mut self,
        link: impl Into<LinkId>,
        target: impl Into<NodeId>,
        attach: Option<&str>,
        geometry: LinkSegment,
    ) -> &mut EndDrop {
        self.end_drops.push(EndDrop {
            link: link.into(),
            target: target.into(),
            pad: 0,
            attach: attach.map(str::to_string),
            geometry,
            style: None,
        });
        let last = self.end_drops.len() - 1;
        &mut self.end_drops[last]
    }

    pub fn is_direct(&self) -> bool {
        self.root_drop.is_none()
    }

    pub fn segment(&self, id: &str) -> Option<&BusSegment> {
        self.segments.iter().find(|s| s.id == id)
    }

    pub fn end_drop(&self, link: &str) -> Option<&EndDrop> {
        self.end_drops.iter().find(|d| d.link == link)
    }

    /// Segment IDs from an end drop back to the root, end drop first.
    pub fn segment_ids_to_root(&self, drop: &EndDrop) -> Result<Vec<LinkSegmentId>, DrawTreeError> {
        if self.is_direct() {
            return Ok(vec![LinkSegmentId::Direct(drop.link.clone())]);
        }
        let mut chain = vec![LinkSegmentId::EndDrop(drop.link.clone())];
        let mut current = drop.attach.clone();
        while let Some(id) = current {
            // A chain longer than the segment list must revisit a segment.
            if chain.len() > self.segments.len() {
                return Err(DrawTreeError::BrokenChain {
                    bus: self.id.clone(),
                    segment: id,
                });
            }
            let Some(seg) = self.segment(&id) else {
                return Err(DrawTreeError::BrokenChain {
                    bus: self.id.clone(),
                    segment: id,
                });
            };
            chain.push(LinkSegmentId::Segment(id));
            current = seg.parent.clone();
        }
        chain.push(LinkSegmentId::RootDrop);
        Ok(chain)
    }

    /// Geometry for a segment role, if the bus has it.
    pub fn geometry(&self, id: &LinkSegmentId) -> Option<LinkSegment> {
        match id {
            LinkSegmentId::Direct(link) | LinkSegmentId::EndDrop(link) => {
                self.end_drop(link).map(|d| d.geometry)
            }
            LinkSegmentId::RootDrop => self.root_drop.as_ref().map(|r| r.geometry),
            LinkSegmentId::Segment(seg) => self.segment(seg).map(|s| s.geometry),
        }
    }

    /// Per-segment style override, if any.
    pub fn suggested_style(&self, id: &LinkSegmentId) -> Option<SuggestedDrawStyle> {
        match id {
            LinkSegmentId::Direct(link) | LinkSegmentId::EndDrop(link) => {
                self.end_drop(link).and_then(|d| d.style)
            }
            LinkSegmentId::RootDrop => self.root_drop.as_ref().and_then(|r| r.style),
            LinkSegmentId::Segment(seg) => self.segment(seg).and_then(|s| s.style),
        }
    }
}

/// Per-link display state under the current overlay and instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkState {
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub sign: LinkSign,
    /// Evidence level; 0 means none recorded.
    #[serde(default)]
    pub evidence: u8,
    #[serde(default)]
    pub style: Option<PerLinkDrawStyle>,
    /// Activity level in [0, 1]; `None` means fully active.
    #[serde(default)]
    pub activity: Option<f64>,
}

fn default_true() -> bool {
    true
}

impl Default for LinkState {
    fn default() -> Self {
        Self {
            active: true,
            selected: false,
            sign: LinkSign::Positive,
            evidence: 0,
            style: None,
            activity: None,
        }
    }
}

impl LinkState {
    pub fn inactive() -> Self {
        Self {
            active: false,
            ..Self::default()
        }
    }

    pub fn with_style(mut self, style: PerLinkDrawStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn with_activity(mut self, level: f64) -> Self {
        self.activity = Some(level);
        self
    }

    pub fn with_sign(mut self, sign: LinkSign) -> Self {
        self.sign = sign;
        self
    }

    pub fn selected(mut self) -> Self {
        self.selected = true;
        self
    }
}

/// Source of per-link display state.
///
/// `None` means the link is filtered out of the current view and is not drawn.
pub trait LinkQuery {
    fn link_state(&self, link: &str) -> Option<LinkState>;
}

impl LinkQuery for HashMap<LinkId, LinkState> {
    fn link_state(&self, link: &str) -> Option<LinkState> {
        self.get(link).cloned()
    }
}

impl LinkQuery for BTreeMap<LinkId, LinkState> {
    fn link_state(&self, link: &str) -> Option<LinkState> {
        self.get(link).cloned()
    }
}

/// Placement and appearance of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeProperties {
    pub id: NodeId,
    pub family: ShapeFamily,
    pub origin: Point,
    #[serde(default)]
    pub orientation: Orientation,
    /// Number of extra (negative-numbered) pads allocated.
    #[serde(default)]
    pub extra_pads: u32,
    #[serde(default)]
    pub label: Option<LabelMetrics>,
    #[serde(default)]
    pub fill: Option<Rgba>,
    #[serde(default)]
    pub name: Option<String>,
}

impl NodeProperties {
    pub fn new(id: impl Into<NodeId>, family: ShapeFamily, origin: Point) -> Self {
        Self {
            id: id.into(),
            family,
            origin,
            orientation: Orientation::Right,
            extra_pads: 0,
            label: None,
            fill: None,
            name: None,
        }
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_extra_pads(mut self, extra_pads: u32) -> Self {
        self.extra_pads = extra_pads;
        self
    }

    pub fn with_label(mut self, name: impl Into<String>, metrics: LabelMetrics) -> Self {
        self.name = Some(name.into());
        self.label = Some(metrics);
        self
    }

    /// The placement view the pad engine works from.
    pub fn geometry(&self) -> NodeGeometry {
        NodeGeometry {
            origin: self.origin,
            orientation: self.orientation,
            extra_pads: self.extra_pads,
            label: self.label,
        }
    }
}

/// Node placements plus link buses for one model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default)]
    pub nodes: BTreeMap<NodeId, NodeProperties>,
    #[serde(default)]
    pub buses: Vec<LinkBus>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, props: NodeProperties) {
        self.nodes.insert(props.id.clone(), props);
    }

    /// Node record, `None` for partial layouts.
    pub fn node(&self, id: &str) -> Option<&NodeProperties> {
        self.nodes.get(id)
    }
}
