//! NetGlyph Render Library
//!
//! Turns a layout into an ordered stream of draw commands. Link buses go
//! through the draw tree (build, resolve, order) and are emitted as
//! style-coalesced polylines with tips and branch dots; nodes are emitted as
//! glyph bodies with optional pad markers. Commands land in a [`ShapeSink`],
//! normally the [`CommandCache`], which can be exported as JSON or replayed
//! onto a [`Canvas`].

mod cache;
mod link;
mod node;
mod sink;
pub mod tips;

pub use cache::{CacheEntry, Canvas, CommandCache};
pub use link::{LinkRenderer, RenderOptions};
pub use node::NodeRenderer;
pub use sink::{
    BoundsShape, Composite, DrawLayer, Paint, PathOp, Primitive, RenderError, RenderResult,
    ShapeSink, StrokeStyle,
};
