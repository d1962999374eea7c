//! Per-segment draw style resolution.
//!
//! A segment's style is the tree default, overlaid by whichever per-link
//! contributions survive their extent rules, overlaid by the segment's own
//! override, then modulated by link activity. Everything here is a pure
//! function of the segment and the [`ResolveContext`].

use std::collections::BTreeSet;

use crate::style::{
    ActivityDrawChange, DEFAULT_LINK_THICKNESS, DEFAULT_MODULE_LINK_THICKNESS, Extent,
    MIN_THICKNESS, ResolvedDrawStyle, Rgba, SuggestedDrawStyle,
};

use super::segment::{DrawTreeSegment, LinkContribution};

/// Tree-wide inputs to style resolution.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext {
    pub tree_style: SuggestedDrawStyle,
    pub ghosted: bool,
    pub activity_change: ActivityDrawChange,
    pub module_link: bool,
    pub inactive_gray: Rgba,
}

impl ResolveContext {
    pub fn default_thickness(&self) -> f64 {
        if self.module_link {
            DEFAULT_MODULE_LINK_THICKNESS
        } else {
            DEFAULT_LINK_THICKNESS
        }
    }
}

/// Contributions that survive their extent rules on a segment.
///
/// Explicit link styles take precedence; evidence-derived ones are only
/// consulted when no explicit contribution survives.
pub fn surviving_contributions(
    contributions: &[LinkContribution],
    path_count: usize,
) -> Vec<&LinkContribution> {
    let (explicit, evidence): (Vec<_>, Vec<_>) =
        contributions.iter().partition(|c| !c.evidence);
    let survivors = survivors_of(&explicit, path_count);
    if !survivors.is_empty() {
        return survivors;
    }
    survivors_of(&evidence, path_count)
}

fn survivors_of<'a>(group: &[&'a LinkContribution], path_count: usize) -> Vec<&'a LinkContribution> {
    let styled: BTreeSet<&str> = group.iter().map(|c| c.link.as_str()).collect();
    let every_path_styled = styled.len() >= path_count;

    let shared: Vec<&LinkContribution> = group
        .iter()
        .copied()
        .filter(|c| c.extent() == Extent::SharedCongruent)
        .collect();
    let shared_congruents_equal = shared
        .windows(2)
        .all(|w| w[0].style.style == w[1].style.style);
    let shared_survive = !shared.is_empty()
        && shared_congruents_equal
        && shared.len() >= path_count;
    if !shared.is_empty() && !shared_survive {
        log::trace!(
            "discarding {} shared-congruent styles (equal: {}, paths: {})",
            shared.len(),
            shared_congruents_equal,
            path_count
        );
    }

    let unique_survive = path_count <= 1 || every_path_styled;

    group
        .iter()
        .copied()
        .filter(|c| match c.extent() {
            Extent::Unique => unique_survive,
            Extent::SharedCongruent => shared_survive,
            Extent::BackToSource => true,
        })
        .collect()
}

impl LinkContribution {
    fn extent(&self) -> Extent {
        self.style.extent
    }
}

/// Merge surviving contributions: thickest wins, most solid pattern wins,
/// contending colors are averaged.
pub fn merge_contributions(survivors: &[&LinkContribution], color_matters: bool) -> SuggestedDrawStyle {
    let mut merged = SuggestedDrawStyle::default();
    for c in survivors {
        let style = &c.style.style;
        if let Some(t) = style.thickness {
            merged.thickness = Some(merged.thickness.map_or(t, |m: f64| m.max(t)));
        }
        if let Some(p) = style.pattern {
            merged.pattern = Some(merged.pattern.map_or(p, |m| m.min(p)));
        }
    }
    if color_matters {
        let colors: Vec<Rgba> = survivors.iter().filter_map(|c| c.style.style.color).collect();
        merged.color = match colors.first() {
            Some(first) if colors.iter().all(|c| c == first) => Some(*first),
            _ => Rgba::average(&colors),
        };
    }
    merged
}

/// The activity level to apply, if any.
///
/// Applies only when some link is below full activity and every path through
/// the segment reports a level; the most active link wins.
pub fn activity_level(segment: &DrawTreeSegment) -> Option<f64> {
    if segment.activity.is_empty() || segment.activity.len() < segment.path_count {
        return None;
    }
    if !segment.activity.values().any(|&level| level < 1.0) {
        return None;
    }
    segment
        .activity
        .values()
        .copied()
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
        .map(|v| v.clamp(0.0, 1.0))
}

/// Resolve the style for one segment.
pub fn resolve_draw_style(segment: &DrawTreeSegment, ctx: &ResolveContext) -> ResolvedDrawStyle {
    let color_matters = segment.active && !ctx.ghosted;
    let mut style = ctx.tree_style;

    if !segment.contributions.is_empty() {
        let survivors = surviving_contributions(&segment.contributions, segment.path_count);
        style.master_update(&merge_contributions(&survivors, color_matters));
    }
    if let Some(own) = &segment.suggested {
        style.master_update(own);
    }

    let mut resolved = style.resolve(ctx.default_thickness());
    if !color_matters {
        resolved.color = ctx.inactive_gray;
    }

    if !ctx.module_link {
        if let Some(level) = activity_level(segment) {
            if ctx.activity_change.changes_color() && color_matters {
                resolved.color = ctx.inactive_gray.blend(resolved.color, level);
            }
            if ctx.activity_change.changes_thickness() {
                resolved.thickness = (resolved.thickness * level).max(MIN_THICKNESS);
            }
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LinkSegmentId;
    use crate::style::{LinePattern, PerLinkDrawStyle};

    fn ctx() -> ResolveContext {
        ResolveContext {
            tree_style: SuggestedDrawStyle::default()
                .with_color(Rgba::black())
                .with_thickness(3.0),
            ghosted: false,
            activity_change: ActivityDrawChange::Both,
            module_link: false,
            inactive_gray: Rgba::rgb(180, 180, 180),
        }
    }

    fn segment(path_count: usize) -> DrawTreeSegment {
        let mut seg = DrawTreeSegment::new(LinkSegmentId::Segment("s".into()), None, None);
        seg.path_count = path_count;
        seg.active = true;
        seg
    }

    fn contribution(link: &str, style: SuggestedDrawStyle, extent: Extent) -> LinkContribution {
        LinkContribution {
            link: link.into(),
            style: PerLinkDrawStyle::new(style, extent),
            evidence: false,
        }
    }

    #[test]
    fn test_no_contributions_uses_tree_default() {
        let resolved = resolve_draw_style(&segment(1), &ctx());
        assert_eq!(resolved, ResolvedDrawStyle::new(Rgba::black(), 3.0, LinePattern::Solid));
    }

    #[test]
    fn test_inactive_segment_is_gray() {
        let mut seg = segment(1);
        seg.active = false;
        let resolved = resolve_draw_style(&seg, &ctx());
        assert_eq!(resolved.color, Rgba::rgb(180, 180, 180));
        assert!((resolved.thickness - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ghosted_segment_is_gray() {
        let mut c = ctx();
        c.ghosted = true;
        assert_eq!(resolve_draw_style(&segment(1), &c).color, c.inactive_gray);
    }

    #[test]
    fn test_unique_discarded_on_partly_styled_shared_segment() {
        let mut seg = segment(2);
        seg.contributions.push(contribution(
            "L1",
            SuggestedDrawStyle::default().with_thickness(8.0),
            Extent::Unique,
        ));
        let resolved = resolve_draw_style(&seg, &ctx());
        assert!((resolved.thickness - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unique_color_averaged_when_every_path_styled() {
        let mut seg = segment(3);
        for (link, color) in [
            ("L1", Rgba::rgb(255, 0, 0)),
            ("L2", Rgba::rgb(0, 255, 0)),
            ("L3", Rgba::rgb(0, 0, 100)),
        ] {
            seg.contributions.push(contribution(
                link,
                SuggestedDrawStyle::default().with_color(color),
                Extent::Unique,
            ));
        }
        let resolved = resolve_draw_style(&seg, &ctx());
        assert_eq!(resolved.color, Rgba::rgb(85, 85, 33));
    }

    #[test]
    fn test_shared_congruent_conflict_falls_back() {
        let mut seg = segment(2);
        seg.contributions.push(contribution(
            "L1",
            SuggestedDrawStyle::default().with_thickness(6.0),
            Extent::SharedCongruent,
        ));
        seg.contributions.push(contribution(
            "L2",
            SuggestedDrawStyle::default().with_thickness(9.0),
            Extent::SharedCongruent,
        ));
        let resolved = resolve_draw_style(&seg, &ctx());
        assert!((resolved.thickness - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shared_congruent_agreement_survives() {
        let mut seg = segment(2);
        for link in ["L1", "L2"] {
            seg.contributions.push(contribution(
                link,
                SuggestedDrawStyle::default().with_thickness(6.0),
                Extent::SharedCongruent,
            ));
        }
        let resolved = resolve_draw_style(&seg, &ctx());
        assert!((resolved.thickness - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shared_congruent_needs_every_path() {
        let mut seg = segment(3);
        for link in ["L1", "L2"] {
            seg.contributions.push(contribution(
                link,
                SuggestedDrawStyle::default().with_thickness(6.0),
                Extent::SharedCongruent,
            ));
        }
        let resolved = resolve_draw_style(&seg, &ctx());
        assert!((resolved.thickness - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_back_to_source_max_thickness_and_most_solid() {
        let mut seg = segment(3);
        seg.contributions.push(contribution(
            "L1",
            SuggestedDrawStyle::default()
                .with_thickness(5.0)
                .with_pattern(LinePattern::Dotted),
            Extent::BackToSource,
        ));
        seg.contributions.push(contribution(
            "L2",
            SuggestedDrawStyle::default()
                .with_thickness(7.0)
                .with_pattern(LinePattern::Dashed),
            Extent::BackToSource,
        ));
        let resolved = resolve_draw_style(&seg, &ctx());
        assert!((resolved.thickness - 7.0).abs() < f64::EPSILON);
        assert_eq!(resolved.pattern, LinePattern::Dashed);
    }

    #[test]
    fn test_segment_override_wins() {
        let mut seg = segment(1);
        seg.contributions.push(contribution(
            "L1",
            SuggestedDrawStyle::default().with_thickness(5.0),
            Extent::Unique,
        ));
        seg.suggested = Some(SuggestedDrawStyle::default().with_thickness(2.0));
        let resolved = resolve_draw_style(&seg, &ctx());
        assert!((resolved.thickness - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_evidence_contribution_yields_to_explicit() {
        let mut seg = segment(1);
        seg.contributions.push(LinkContribution {
            link: "L1".into(),
            style: PerLinkDrawStyle::new(
                SuggestedDrawStyle::default().with_thickness(9.0),
                Extent::BackToSource,
            ),
            evidence: true,
        });
        seg.contributions.push(contribution(
            "L1",
            SuggestedDrawStyle::default().with_thickness(4.0),
            Extent::Unique,
        ));
        let resolved = resolve_draw_style(&seg, &ctx());
        assert!((resolved.thickness - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_activity_uses_max_level() {
        let mut seg = segment(2);
        seg.activity.insert("L1".into(), 0.25);
        seg.activity.insert("L2".into(), 0.5);
        let resolved = resolve_draw_style(&seg, &ctx());
        assert!((resolved.thickness - 1.5).abs() < 1e-9);
        assert_eq!(resolved.color, Rgba::rgb(90, 90, 90));
    }

    #[test]
    fn test_activity_draw_change_modes() {
        let mut seg = segment(1);
        seg.activity.insert("L1".into(), 0.5);
        let half_gray = Rgba::rgb(90, 90, 90);
        for (mode, color, thickness) in [
            (ActivityDrawChange::None, Rgba::black(), 4.0),
            (ActivityDrawChange::Color, half_gray, 4.0),
            (ActivityDrawChange::Thickness, Rgba::black(), 2.0),
            (ActivityDrawChange::Both, half_gray, 2.0),
        ] {
            let mut c = ctx();
            c.tree_style = c.tree_style.with_thickness(4.0);
            c.activity_change = mode;
            let resolved = resolve_draw_style(&seg, &c);
            assert_eq!(resolved.color, color, "{mode:?}");
            assert!((resolved.thickness - thickness).abs() < 1e-9, "{mode:?}");
        }
    }

    #[test]
    fn test_activity_ignored_when_not_every_path_reports() {
        let mut seg = segment(2);
        seg.activity.insert("L1".into(), 0.25);
        assert!(activity_level(&seg).is_none());
        let resolved = resolve_draw_style(&seg, &ctx());
        assert!((resolved.thickness - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_activity_skipped_for_module_links() {
        let mut seg = segment(1);
        seg.activity.insert("L1".into(), 0.0);
        let mut c = ctx();
        c.module_link = true;
        let resolved = resolve_draw_style(&seg, &c);
        assert!((resolved.thickness - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let mut seg = segment(2);
        seg.contributions.push(contribution(
            "L1",
            SuggestedDrawStyle::default().with_color(Rgba::rgb(10, 20, 30)),
            Extent::BackToSource,
        ));
        seg.activity.insert("L1".into(), 0.7);
        seg.activity.insert("L2".into(), 1.0);
        assert_eq!(resolve_draw_style(&seg, &ctx()), resolve_draw_style(&seg, &ctx()));
    }
}
