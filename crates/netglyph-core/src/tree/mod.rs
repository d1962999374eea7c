//! Draw trees: the shared segment graph of one link bus for one render pass.
//!
//! A tree is built from the bus topology and per-link display state, then
//! resolved (one immutable style per segment) and ordered (which link draws
//! which segment, and in what sequence). It is discarded after the pass.

mod order;
mod resolve;
mod segment;

pub use order::DrawOrder;
pub use resolve::{
    ResolveContext, activity_level, merge_contributions, resolve_draw_style,
    surviving_contributions,
};
pub use segment::{DrawTreeSegment, LinkContribution, SegIdx};

use std::collections::HashMap;

use thiserror::Error;

use crate::display::DisplayOptions;
use crate::model::{LinkBus, LinkId, LinkQuery, LinkSegmentId, LinkState};
use crate::style::{ResolvedDrawStyle, SuggestedDrawStyle};

/// Internal consistency failures while building or walking a draw tree.
#[derive(Debug, Error)]
pub enum DrawTreeError {
    #[error("No geometry for segment {0}")]
    MissingGeometry(LinkSegmentId),
    #[error("Bus {bus} has no root segment")]
    NoRoot { bus: String },
    #[error("Bus {bus} has more than one root segment")]
    MultipleRoots { bus: String },
    #[error("Bus {bus} has a broken parent chain at segment {segment}")]
    BrokenChain { bus: String, segment: String },
    #[error("Leaf segment {0} is not the entry of any link")]
    OrphanLeaf(LinkSegmentId),
}

/// A link drawn by the tree, with the state it was built from.
#[derive(Debug, Clone)]
pub struct TreeLink {
    pub id: LinkId,
    /// Segment nearest the target.
    pub entry: SegIdx,
    pub state: LinkState,
}

/// The shared segment graph for one link bus.
#[derive(Debug, Clone)]
pub struct DrawTree {
    bus_id: String,
    tree_style: SuggestedDrawStyle,
    module_link: bool,
    segments: Vec<DrawTreeSegment>,
    index: HashMap<LinkSegmentId, SegIdx>,
    links: Vec<TreeLink>,
}

/// Styles and top-down child lists produced by [`DrawTree::resolve_draw_styles`].
#[derive(Debug, Clone)]
pub struct ResolvedTree {
    pub root: SegIdx,
    pub styles: Vec<ResolvedDrawStyle>,
    pub children: Vec<Vec<SegIdx>>,
}

impl ResolvedTree {
    pub fn style(&self, idx: SegIdx) -> &ResolvedDrawStyle {
        &self.styles[idx.0]
    }

    pub fn children(&self, idx: SegIdx) -> &[SegIdx] {
        &self.children[idx.0]
    }
}

impl DrawTree {
    /// Build the tree for a bus.
    ///
    /// Links the query reports as `None` are filtered from the view and skipped.
    pub fn build(
        bus: &LinkBus,
        query: &dyn LinkQuery,
        options: &DisplayOptions,
    ) -> Result<Self, DrawTreeError> {
        let mut tree = DrawTree {
            bus_id: bus.id.clone(),
            tree_style: bus.style,
            module_link: bus.module_link,
            segments: Vec::new(),
            index: HashMap::new(),
            links: Vec::new(),
        };

        for drop in &bus.end_drops {
            let Some(state) = query.link_state(&drop.link) else {
                log::debug!("bus {}: link {} filtered from view", bus.id, drop.link);
                continue;
            };
            let chain = bus.segment_ids_to_root(drop)?;
            let contribution = Self::contribution_for(&drop.link, &state, options);

            let mut prev: Option<SegIdx> = None;
            for id in &chain {
                let idx = match tree.index.get(id) {
                    Some(idx) => *idx,
                    None => {
                        let geometry = bus
                            .geometry(id)
                            .ok_or_else(|| DrawTreeError::MissingGeometry(id.clone()))?;
                        tree.insert(DrawTreeSegment::new(
                            id.clone(),
                            Some(geometry),
                            bus.suggested_style(id),
                        ))
                    }
                };

                if let Some(p) = prev {
                    // First writer wins: a later link through the same segment
                    // must not relink it.
                    if tree.segments[p.0].parent.is_none() && p != idx {
                        tree.segments[p.0].parent = Some(idx);
                        tree.segments[idx.0].children += 1;
                    }
                } else {
                    tree.links.push(TreeLink {
                        id: drop.link.clone(),
                        entry: idx,
                        state: state.clone(),
                    });
                }

                let seg = &mut tree.segments[idx.0];
                seg.path_count += 1;
                seg.active |= state.active;
                seg.selected |= state.selected;
                if let Some(c) = &contribution {
                    seg.contributions.push(c.clone());
                }
                if let Some(level) = state.activity {
                    seg.activity.insert(drop.link.clone(), level);
                }
                prev = Some(idx);
            }
        }

        tree.count_active_children();
        log::trace!(
            "bus {}: built draw tree with {} segments for {} links",
            tree.bus_id,
            tree.segments.len(),
            tree.links.len()
        );
        Ok(tree)
    }

    fn contribution_for(
        link: &str,
        state: &LinkState,
        options: &DisplayOptions,
    ) -> Option<LinkContribution> {
        if let Some(style) = state.style {
            return Some(LinkContribution {
                link: link.to_string(),
                style,
                evidence: false,
            });
        }
        options
            .evidence_style(state.evidence)
            .map(|style| LinkContribution {
                link: link.to_string(),
                style: *style,
                evidence: true,
            })
    }

    fn insert(&mut self, segment: DrawTreeSegment) -> SegIdx {
        let idx = SegIdx(self.segments.len());
        self.index.insert(segment.id.clone(), idx);
        self.segments.push(segment);
        idx
    }

    fn count_active_children(&mut self) {
        let increments: Vec<SegIdx> = self
            .segments
            .iter()
            .filter(|s| s.active)
            .filter_map(|s| s.parent)
            .collect();
        for parent in increments {
            self.segments[parent.0].active_children += 1;
        }
    }

    pub fn bus_id(&self) -> &str {
        &self.bus_id
    }

    pub fn is_module_link(&self) -> bool {
        self.module_link
    }

    pub fn tree_style(&self) -> SuggestedDrawStyle {
        self.tree_style
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn segment(&self, idx: SegIdx) -> &DrawTreeSegment {
        &self.segments[idx.0]
    }

    pub fn segments(&self) -> &[DrawTreeSegment] {
        &self.segments
    }

    /// Lookup by segment role.
    pub fn find(&self, id: &LinkSegmentId) -> Option<SegIdx> {
        self.index.get(id).copied()
    }

    pub fn links(&self) -> &[TreeLink] {
        &self.links
    }

    pub fn link(&self, id: &str) -> Option<&TreeLink> {
        self.links.iter().find(|l| l.id == id)
    }

    /// Entry segment of a link.
    pub fn start_segment(&self, link: &str) -> Option<SegIdx> {
        self.link(link).map(|l| l.entry)
    }

    /// Resolution inputs for this tree under the given display policy.
    pub fn resolve_context(&self, options: &DisplayOptions, ghosted: bool) -> ResolveContext {
        ResolveContext {
            tree_style: self.tree_style,
            ghosted,
            activity_change: options.activity_draw_change,
            module_link: self.module_link,
            inactive_gray: options.inactive_gray,
        }
    }

    /// Resolve every segment's style exactly once and build child lists.
    pub fn resolve_draw_styles(&self, ctx: &ResolveContext) -> Result<ResolvedTree, DrawTreeError> {
        let n = self.segments.len();
        let mut styles: Vec<Option<ResolvedDrawStyle>> = vec![None; n];
        let mut children: Vec<Vec<SegIdx>> = vec![Vec::new(); n];
        let mut root: Option<SegIdx> = None;

        for link in &self.links {
            let mut current = link.entry;
            let mut steps = 0;
            loop {
                if styles[current.0].is_some() {
                    break;
                }
                styles[current.0] = Some(resolve_draw_style(&self.segments[current.0], ctx));
                match self.segments[current.0].parent {
                    Some(parent) => {
                        children[parent.0].push(current);
                        current = parent;
                    }
                    None => {
                        if root.is_some_and(|r| r != current) {
                            return Err(DrawTreeError::MultipleRoots {
                                bus: self.bus_id.clone(),
                            });
                        }
                        root = Some(current);
                        break;
                    }
                }
                steps += 1;
                if steps > n {
                    return Err(DrawTreeError::BrokenChain {
                        bus: self.bus_id.clone(),
                        segment: self.segments[current.0].id.to_string(),
                    });
                }
            }
        }

        let root = root.ok_or_else(|| DrawTreeError::NoRoot {
            bus: self.bus_id.clone(),
        })?;
        let styles = styles
            .into_iter()
            .enumerate()
            .map(|(i, s)| {
                s.ok_or_else(|| DrawTreeError::BrokenChain {
                    bus: self.bus_id.clone(),
                    segment: self.segments[i].id.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ResolvedTree {
            root,
            styles,
            children,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::geometry::LinkSegment;
    use crate::style::{ActivityDrawChange, Extent, PerLinkDrawStyle, Rgba};
    use kurbo::Point;
    use std::collections::BTreeMap;

    pub(crate) fn seg(x0: f64, y0: f64, x1: f64, y1: f64) -> LinkSegment {
        LinkSegment::new(Point::new(x0, y0), Point::new(x1, y1))
    }

    pub(crate) fn ctx(bus: &LinkBus) -> ResolveContext {
        ResolveContext {
            tree_style: bus.style,
            ghosted: false,
            activity_change: ActivityDrawChange::Color,
            module_link: bus.module_link,
            inactive_gray: Rgba::rgb(180, 180, 180),
        }
    }

    /// Root drop, a trunk segment, then two drops hanging off the trunk.
    pub(crate) fn fan_out() -> LinkBus {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut bus = LinkBus::new("bus", "src", seg(0.0, 0.0, 10.0, 0.0)).with_style(
            SuggestedDrawStyle::default()
                .with_color(Rgba::black())
                .with_thickness(3.0),
        );
        bus.add_segment("trunk", None, seg(10.0, 0.0, 50.0, 0.0));
        bus.add_end_drop("L1", "t1", Some("trunk"), seg(50.0, 0.0, 50.0, -20.0));
        bus.add_end_drop("L2", "t2", Some("trunk"), seg(50.0, 0.0, 50.0, 20.0));
        bus
    }

    fn states(entries: &[(&str, LinkState)]) -> BTreeMap<LinkId, LinkState> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_simple_link_tree() {
        let mut bus = LinkBus::new("bus", "src", seg(0.0, 0.0, 10.0, 0.0));
        bus.add_end_drop("L1", "t1", None, seg(10.0, 0.0, 20.0, 0.0));
        let query = states(&[("L1", LinkState::default())]);
        let tree = DrawTree::build(&bus, &query, &DisplayOptions::default()).unwrap();
        assert_eq!(tree.segments().len(), 2);
        let root = tree.find(&LinkSegmentId::RootDrop).unwrap();
        let drop = tree.start_segment("L1").unwrap();
        assert_eq!(tree.segment(drop).parent, Some(root));
        assert!(tree.segment(root).is_root());
        assert!(tree.segments().iter().all(|s| s.path_count == 1));
        assert!(!tree.segments().iter().any(|s| s.is_active_branch()));
    }

    #[test]
    fn test_path_counts_and_single_root() {
        let bus = fan_out();
        let query = states(&[("L1", LinkState::default()), ("L2", LinkState::default())]);
        let tree = DrawTree::build(&bus, &query, &DisplayOptions::default()).unwrap();
        let trunk = tree.find(&LinkSegmentId::Segment("trunk".into())).unwrap();
        let root = tree.find(&LinkSegmentId::RootDrop).unwrap();
        assert_eq!(tree.segment(trunk).path_count, 2);
        assert_eq!(tree.segment(root).path_count, 2);
        assert_eq!(tree.segment(trunk).children, 2);
        assert_eq!(tree.segment(trunk).active_children, 2);
        assert!(tree.segment(trunk).is_active_branch());

        let roots: Vec<_> = tree.segments().iter().filter(|s| s.is_root()).collect();
        assert_eq!(roots.len(), 1);
        for start in 0..tree.segments().len() {
            let mut current = SegIdx(start);
            let mut steps = 0;
            while let Some(p) = tree.segment(current).parent {
                current = p;
                steps += 1;
                assert!(steps <= tree.segments().len());
            }
            assert_eq!(current, root);
        }
    }

    #[test]
    fn test_inactive_child_not_counted() {
        let bus = fan_out();
        let query = states(&[("L1", LinkState::default()), ("L2", LinkState::inactive())]);
        let tree = DrawTree::build(&bus, &query, &DisplayOptions::default()).unwrap();
        let trunk = tree.find(&LinkSegmentId::Segment("trunk".into())).unwrap();
        assert_eq!(tree.segment(trunk).children, 2);
        assert_eq!(tree.segment(trunk).active_children, 1);
        assert!(!tree.segment(trunk).is_active_branch());
    }

    #[test]
    fn test_filtered_link_skipped() {
        let bus = fan_out();
        let query = states(&[("L1", LinkState::default())]);
        let tree = DrawTree::build(&bus, &query, &DisplayOptions::default()).unwrap();
        assert!(tree.link("L2").is_none());
        assert!(tree.find(&LinkSegmentId::EndDrop("L2".into())).is_none());
        let trunk = tree.find(&LinkSegmentId::Segment("trunk".into())).unwrap();
        assert_eq!(tree.segment(trunk).path_count, 1);
    }

    #[test]
    fn test_direct_bus_with_two_links_has_two_roots() {
        let mut bus = fan_out();
        bus.root_drop = None;
        bus.segments.clear();
        let query = states(&[("L1", LinkState::default()), ("L2", LinkState::default())]);
        let tree = DrawTree::build(&bus, &query, &DisplayOptions::default()).unwrap();
        assert!(matches!(
            tree.resolve_draw_styles(&ctx(&bus)),
            Err(DrawTreeError::MultipleRoots { .. })
        ));
    }

    #[test]
    fn test_empty_tree_has_no_root() {
        let bus = fan_out();
        let query: BTreeMap<LinkId, LinkState> = BTreeMap::new();
        let tree = DrawTree::build(&bus, &query, &DisplayOptions::default()).unwrap();
        assert!(tree.is_empty());
        assert!(matches!(
            tree.resolve_draw_styles(&ctx(&bus)),
            Err(DrawTreeError::NoRoot { .. })
        ));
    }

    #[test]
    fn test_resolve_builds_children_in_link_order() {
        let bus = fan_out();
        let query = states(&[("L1", LinkState::default()), ("L2", LinkState::default())]);
        let tree = DrawTree::build(&bus, &query, &DisplayOptions::default()).unwrap();
        let resolved = tree.resolve_draw_styles(&ctx(&bus)).unwrap();
        let trunk = tree.find(&LinkSegmentId::Segment("trunk".into())).unwrap();
        assert_eq!(resolved.root, tree.find(&LinkSegmentId::RootDrop).unwrap());
        assert_eq!(
            resolved.children(trunk),
            &[tree.start_segment("L1").unwrap(), tree.start_segment("L2").unwrap()]
        );
        assert_eq!(resolved.children(resolved.root), &[trunk]);
        assert!((resolved.style(trunk).thickness - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_evidence_style_contributed() {
        let bus = fan_out();
        let options = DisplayOptions::default()
            .with_evidence_style(3, SuggestedDrawStyle::default().with_thickness(6.0));
        let state = LinkState {
            evidence: 3,
            ..LinkState::default()
        };
        let query = states(&[("L1", state)]);
        let tree = DrawTree::build(&bus, &query, &options).unwrap();
        let drop = tree.start_segment("L1").unwrap();
        assert_eq!(tree.segment(drop).contributions.len(), 1);
        assert!(tree.segment(drop).contributions[0].evidence);
        let resolved = tree.resolve_draw_styles(&ctx(&bus)).unwrap();
        assert!((resolved.style(resolved.root).thickness - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_congruent_conflict_on_shared_trunk() {
        let bus = fan_out();
        let query = states(&[
            (
                "L1",
                LinkState::default().with_style(PerLinkDrawStyle::new(
                    SuggestedDrawStyle::default().with_thickness(5.0),
                    Extent::SharedCongruent,
                )),
            ),
            (
                "L2",
                LinkState::default().with_style(PerLinkDrawStyle::new(
                    SuggestedDrawStyle::default().with_thickness(8.0),
                    Extent::SharedCongruent,
                )),
            ),
        ]);
        let tree = DrawTree::build(&bus, &query, &DisplayOptions::default()).unwrap();
        let resolved = tree.resolve_draw_styles(&ctx(&bus)).unwrap();
        let trunk = tree.find(&LinkSegmentId::Segment("trunk".into())).unwrap();
        assert!((resolved.style(trunk).thickness - 3.0).abs() < f64::EPSILON);
        let l2 = tree.start_segment("L2").unwrap();
        assert!((resolved.style(l2).thickness - 8.0).abs() < f64::EPSILON);
    }
}
