//! Recorded draw command stream, exportable as JSON and replayable.

use kurbo::{Affine, BezPath, Rect};
use peniko::Color;
use serde::{Deserialize, Serialize};

use crate::sink::{
    BoundsShape, Composite, DrawLayer, Paint, Primitive, RenderError, RenderResult, ShapeSink,
};

/// One recorded sink call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CacheEntry {
    PushGroup { id: String },
    PopGroup,
    Draw { layer: DrawLayer, primitive: Primitive },
    Bounds { shape: BoundsShape },
    PushTransform { transform: Affine },
    PopTransform,
    SetComposite { composite: Composite },
}

/// Drawing backend that a command cache can be replayed onto.
pub trait Canvas {
    fn stroke(&mut self, path: &BezPath, color: Color, width: f64, dashes: &[f64], transform: Affine);

    fn fill(&mut self, path: &BezPath, color: Color, transform: Affine);

    /// Draw label text inside `rect`.
    fn text(&mut self, text: &str, rect: Rect, color: Color, transform: Affine);

    fn set_composite(&mut self, composite: Composite) {
        let _ = composite;
    }
}

/// A [`ShapeSink`] that records every call in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandCache {
    entries: Vec<CacheEntry>,
}

impl CommandCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[CacheEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Draw commands in recording order.
    pub fn draws(&self) -> impl Iterator<Item = (DrawLayer, &Primitive)> {
        self.entries.iter().filter_map(|e| match e {
            CacheEntry::Draw { layer, primitive } => Some((*layer, primitive)),
            _ => None,
        })
    }

    /// Export bounds shapes paired with the group that recorded them.
    pub fn bounds_shapes(&self) -> Vec<(Option<&str>, &BoundsShape)> {
        let mut groups: Vec<&str> = Vec::new();
        let mut out = Vec::new();
        for entry in &self.entries {
            match entry {
                CacheEntry::PushGroup { id } => groups.push(id.as_str()),
                CacheEntry::PopGroup => {
                    groups.pop();
                }
                CacheEntry::Bounds { shape } => out.push((groups.last().copied(), shape)),
                _ => {}
            }
        }
        out
    }

    /// Serialize the command stream for the web export.
    pub fn export_json(&self) -> RenderResult<String> {
        serde_json::to_string(self).map_err(|e| RenderError::Export(e.to_string()))
    }

    pub fn from_json(json: &str) -> RenderResult<Self> {
        serde_json::from_str(json).map_err(|e| RenderError::Export(e.to_string()))
    }

    /// Paint the recorded commands onto a canvas, one layer at a time.
    ///
    /// Groups do not affect painting. Transforms and composite mode are
    /// replayed per layer pass so each draw sees the state it was recorded
    /// under.
    pub fn replay(&self, canvas: &mut impl Canvas) {
        let mut applied = Composite::SourceOver;
        for layer in DrawLayer::ALL {
            let mut transforms = vec![Affine::IDENTITY];
            let mut composite = Composite::SourceOver;
            for entry in &self.entries {
                match entry {
                    CacheEntry::PushTransform { transform } => {
                        let top = transforms.last().copied().unwrap_or(Affine::IDENTITY);
                        transforms.push(top * *transform);
                    }
                    CacheEntry::PopTransform => {
                        if transforms.len() > 1 {
                            transforms.pop();
                        }
                    }
                    CacheEntry::SetComposite { composite: c } => composite = *c,
                    CacheEntry::Draw {
                        layer: l,
                        primitive,
                    } if *l == layer => {
                        if composite != applied {
                            canvas.set_composite(composite);
                            applied = composite;
                        }
                        let transform = transforms.last().copied().unwrap_or(Affine::IDENTITY);
                        paint_primitive(canvas, primitive, transform);
                    }
                    _ => {}
                }
            }
        }
    }
}

fn paint_primitive(canvas: &mut impl Canvas, primitive: &Primitive, transform: Affine) {
    match primitive {
        Primitive::Path { color, stroke, .. } => {
            let path = primitive.to_path();
            canvas.stroke(&path, (*color).into(), stroke.width, &stroke.dashes(), transform);
        }
        Primitive::Polygon { paint, .. }
        | Primitive::Ellipse { paint, .. }
        | Primitive::RoundedRect { paint, .. } => {
            paint_shape(canvas, &primitive.to_path(), paint, transform);
        }
        Primitive::Label { text, rect, color } => {
            canvas.text(text, *rect, (*color).into(), transform);
        }
    }
}

fn paint_shape(canvas: &mut impl Canvas, path: &BezPath, paint: &Paint, transform: Affine) {
    if let Some(fill) = paint.fill {
        canvas.fill(path, fill.into(), transform);
    }
    if let Some((color, width)) = paint.outline {
        canvas.stroke(path, color.into(), width, &[], transform);
    }
}

impl ShapeSink for CommandCache {
    fn push_group(&mut self, id: &str) {
        self.entries.push(CacheEntry::PushGroup { id: id.to_string() });
    }

    fn pop_group(&mut self) {
        self.entries.push(CacheEntry::PopGroup);
    }

    fn draw(&mut self, layer: DrawLayer, primitive: Primitive) {
        self.entries.push(CacheEntry::Draw { layer, primitive });
    }

    fn bounds(&mut self, shape: BoundsShape) {
        self.entries.push(CacheEntry::Bounds { shape });
    }

    fn push_transform(&mut self, transform: Affine) {
        self.entries.push(CacheEntry::PushTransform { transform });
    }

    fn pop_transform(&mut self) {
        self.entries.push(CacheEntry::PopTransform);
    }

    fn set_composite(&mut self, composite: Composite) {
        self.entries.push(CacheEntry::SetComposite { composite });
    }
}
