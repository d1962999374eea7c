//! Draw styles: suggested (partially specified) and resolved (concrete).

use peniko::Color;
use serde::{Deserialize, Serialize};

/// Default link thickness for gene-to-gene links.
pub const DEFAULT_LINK_THICKNESS: f64 = 3.0;

/// Default link thickness for net module links.
pub const DEFAULT_MODULE_LINK_THICKNESS: f64 = 4.0;

/// Thickness never drops below this after activity modulation.
pub const MIN_THICKNESS: f64 = 1.0;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const fn black() -> Self {
        Self::rgb(0, 0, 0)
    }

    pub const fn white() -> Self {
        Self::rgb(255, 255, 255)
    }

    /// Componentwise mean, truncated toward zero.
    pub fn average(colors: &[Rgba]) -> Option<Rgba> {
        if colors.is_empty() {
            return None;
        }
        let n = colors.len() as u32;
        let sum = colors.iter().fold([0u32; 4], |acc, c| {
            [
                acc[0] + c.r as u32,
                acc[1] + c.g as u32,
                acc[2] + c.b as u32,
                acc[3] + c.a as u32,
            ]
        });
        Some(Rgba::new(
            (sum[0] / n) as u8,
            (sum[1] / n) as u8,
            (sum[2] / n) as u8,
            (sum[3] / n) as u8,
        ))
    }

    /// Linear blend toward `other`; `t = 0` keeps `self`, `t = 1` gives `other`.
    pub fn blend(self, other: Rgba, t: f64) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| -> u8 { (a as f64 + (b as f64 - a as f64) * t).round() as u8 };
        Rgba::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }
}

impl From<Color> for Rgba {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<Rgba> for Color {
    fn from(color: Rgba) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Line pattern; lower values are more solid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum LinePattern {
    #[default]
    Solid = 0,
    Dashed = 1,
    Dotted = 2,
}

impl LinePattern {
    /// Dash lengths for a stroke of the given thickness (empty = solid).
    pub fn dashes(self, thickness: f64) -> Vec<f64> {
        match self {
            LinePattern::Solid => Vec::new(),
            LinePattern::Dashed => vec![thickness * 3.0, thickness * 2.0],
            LinePattern::Dotted => vec![thickness, thickness * 1.5],
        }
    }
}

/// A style whose fields may be left unspecified.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SuggestedDrawStyle {
    #[serde(default)]
    pub color: Option<Rgba>,
    #[serde(default)]
    pub thickness: Option<f64>,
    #[serde(default)]
    pub pattern: Option<LinePattern>,
}

impl SuggestedDrawStyle {
    pub fn new(color: Option<Rgba>, thickness: Option<f64>, pattern: Option<LinePattern>) -> Self {
        Self {
            color,
            thickness,
            pattern,
        }
    }

    pub fn with_color(mut self, color: Rgba) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_thickness(mut self, thickness: f64) -> Self {
        self.thickness = Some(thickness);
        self
    }

    pub fn with_pattern(mut self, pattern: LinePattern) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Overwrite every field `other` specifies, leaving the rest alone.
    pub fn master_update(&mut self, other: &SuggestedDrawStyle) {
        if other.color.is_some() {
            self.color = other.color;
        }
        if other.thickness.is_some() {
            self.thickness = other.thickness;
        }
        if other.pattern.is_some() {
            self.pattern = other.pattern;
        }
    }

    /// Whether nothing is specified.
    pub fn is_empty(&self) -> bool {
        self.color.is_none() && self.thickness.is_none() && self.pattern.is_none()
    }

    /// Bind every unspecified field to a default.
    pub fn resolve(&self, default_thickness: f64) -> ResolvedDrawStyle {
        ResolvedDrawStyle {
            color: self.color.unwrap_or_else(Rgba::black),
            thickness: self.thickness.unwrap_or(default_thickness),
            pattern: self.pattern.unwrap_or_default(),
        }
    }
}

/// A fully bound style used to emit one draw command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedDrawStyle {
    pub color: Rgba,
    pub thickness: f64,
    pub pattern: LinePattern,
}

impl ResolvedDrawStyle {
    pub fn new(color: Rgba, thickness: f64, pattern: LinePattern) -> Self {
        Self {
            color,
            thickness,
            pattern,
        }
    }

    /// Same color and pattern, thickness ignored.
    pub fn same_color(&self, other: &ResolvedDrawStyle) -> bool {
        self.color == other.color
    }
}

impl Default for ResolvedDrawStyle {
    fn default() -> Self {
        Self::new(Rgba::black(), DEFAULT_LINK_THICKNESS, LinePattern::Solid)
    }
}

/// How far a per-link style reaches along segments shared with other links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Extent {
    /// Only segments the styled links have to themselves.
    #[default]
    Unique,
    /// Shared segments too, provided every link through them agrees.
    SharedCongruent,
    /// Every segment back to the source.
    BackToSource,
}

/// A style override attached to a single link.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerLinkDrawStyle {
    pub style: SuggestedDrawStyle,
    #[serde(default)]
    pub extent: Extent,
}

impl PerLinkDrawStyle {
    pub fn new(style: SuggestedDrawStyle, extent: Extent) -> Self {
        Self { style, extent }
    }
}

/// Which visual property link activity modulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActivityDrawChange {
    None,
    #[default]
    Color,
    Thickness,
    Both,
}

impl ActivityDrawChange {
    pub fn changes_color(self) -> bool {
        matches!(self, ActivityDrawChange::Color | ActivityDrawChange::Both)
    }

    pub fn changes_thickness(self) -> bool {
        matches!(self, ActivityDrawChange::Thickness | ActivityDrawChange::Both)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_truncates() {
        let avg = Rgba::average(&[
            Rgba::rgb(255, 0, 0),
            Rgba::rgb(0, 255, 0),
            Rgba::rgb(0, 0, 100),
        ])
        .unwrap();
        assert_eq!(avg, Rgba::rgb(85, 85, 33));
        assert!(Rgba::average(&[]).is_none());
    }

    #[test]
    fn test_blend_endpoints() {
        let a = Rgba::rgb(0, 0, 0);
        let b = Rgba::rgb(200, 100, 50);
        assert_eq!(a.blend(b, 0.0), a);
        assert_eq!(a.blend(b, 1.0), b);
        assert_eq!(a.blend(b, 0.5), Rgba::rgb(100, 50, 25));
    }

    #[test]
    fn test_master_update_only_specified_fields() {
        let mut base = SuggestedDrawStyle::default()
            .with_color(Rgba::black())
            .with_thickness(3.0);
        base.master_update(&SuggestedDrawStyle::default().with_thickness(6.0));
        assert_eq!(base.color, Some(Rgba::black()));
        assert_eq!(base.thickness, Some(6.0));
        assert_eq!(base.pattern, None);
    }

    #[test]
    fn test_resolve_fills_defaults() {
        let resolved = SuggestedDrawStyle::default().resolve(DEFAULT_LINK_THICKNESS);
        assert_eq!(resolved, ResolvedDrawStyle::default());
    }

    #[test]
    fn test_pattern_ordering_most_solid_first() {
        assert!(LinePattern::Solid < LinePattern::Dashed);
        assert!(LinePattern::Dashed < LinePattern::Dotted);
        assert!(LinePattern::Solid.dashes(2.0).is_empty());
    }

    #[test]
    fn test_color_conversion() {
        let c = Rgba::new(10, 20, 30, 40);
        let pc: Color = c.into();
        assert_eq!(Rgba::from(pc), c);
    }
}
