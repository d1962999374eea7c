//! Global display toggles consulted while building and drawing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::style::{ActivityDrawChange, Extent, PerLinkDrawStyle, Rgba, SuggestedDrawStyle};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse display options: {0}")]
    Parse(String),
}

/// How bus branch points are marked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BranchMode {
    None,
    #[default]
    Filled,
    /// Filled dot with a thin outline in the inactive gray.
    Outlined,
}

impl BranchMode {
    /// Cycle to the next branch mode.
    pub fn next(self) -> Self {
        match self {
            BranchMode::None => BranchMode::Filled,
            BranchMode::Filled => BranchMode::Outlined,
            BranchMode::Outlined => BranchMode::None,
        }
    }
}

/// Display policy for link and node rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    /// What link activity levels modulate.
    pub activity_draw_change: ActivityDrawChange,
    /// Branch point glyph style.
    pub branch_mode: BranchMode,
    /// Draw evidence glyphs next to link tips.
    pub evidence_glyphs: bool,
    /// Style overrides keyed by evidence level.
    pub evidence_styles: BTreeMap<u8, PerLinkDrawStyle>,
    /// Color for inactive and ghosted elements.
    pub inactive_gray: Rgba,
    /// Extra width added to inhibitor bars.
    pub extra_foot_size: f64,
    /// Selection highlight color.
    pub selection_color: Rgba,
    /// Draw pad markers on node glyphs.
    pub show_pads: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            activity_draw_change: ActivityDrawChange::default(),
            branch_mode: BranchMode::default(),
            evidence_glyphs: true,
            evidence_styles: BTreeMap::new(),
            inactive_gray: Rgba::rgb(180, 180, 180),
            extra_foot_size: 0.0,
            selection_color: Rgba::rgb(59, 130, 246),
            show_pads: false,
        }
    }
}

impl DisplayOptions {
    /// Parse options from JSON; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Register a style override for an evidence level.
    pub fn with_evidence_style(mut self, level: u8, style: SuggestedDrawStyle) -> Self {
        self.evidence_styles
            .insert(level, PerLinkDrawStyle::new(style, Extent::BackToSource));
        self
    }

    /// The override registered for an evidence level, if any.
    pub fn evidence_style(&self, level: u8) -> Option<&PerLinkDrawStyle> {
        if level == 0 {
            return None;
        }
        self.evidence_styles.get(&level)
    }
}
