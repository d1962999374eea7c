//! NetGlyph Core Library
//!
//! Platform-agnostic data structures and logic for drawing network diagrams:
//! the per-bus draw tree, link style resolution, draw ordering and the pad
//! geometry of node glyphs.

pub mod display;
pub mod geometry;
pub mod model;
pub mod pads;
pub mod style;
pub mod tree;

pub use display::{BranchMode, ConfigError, DisplayOptions};
pub use geometry::{LinkSegment, Orientation};
pub use model::{
    BusSegment, EndDrop, Layout, LinkBus, LinkId, LinkQuery, LinkSegmentId, LinkSign, LinkState,
    NodeId, NodeProperties, RootDrop, SegmentId,
};
pub use pads::{
    BoxShape, InlineShape, Intersection, LabelMetrics, NodeGeometry, PadError, PadGeometry,
    PadHit, PadKind, PadSide, ShapeFamily, TabletShape, TopPadStrategy,
};
pub use style::{
    ActivityDrawChange, Extent, LinePattern, PerLinkDrawStyle, ResolvedDrawStyle, Rgba,
    SuggestedDrawStyle,
};
pub use tree::{DrawOrder, DrawTree, DrawTreeError, ResolveContext, ResolvedTree, SegIdx};
