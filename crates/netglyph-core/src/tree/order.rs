//! Draw order scheduling.
//!
//! Each segment is drawn by exactly one link. At a branch point the child
//! whose style best matches the trunk is recursed first and claims the
//! trunk, so the trunk and that child come out as one unbroken stroke.

use std::collections::HashMap;

use crate::model::LinkId;
use crate::style::ResolvedDrawStyle;

use super::{DrawTree, DrawTreeError, ResolvedTree, SegIdx};

/// Sort key for children relative to their parent's style; lower recurses first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum BucketKey {
    Exact,
    ColorMatch,
    /// Negated thickness in thousandths, so thicker children sort first.
    Thickness(i64),
}

impl BucketKey {
    fn relative_to(parent: &ResolvedDrawStyle, child: &ResolvedDrawStyle) -> Self {
        if parent == child {
            BucketKey::Exact
        } else if parent.same_color(child) {
            BucketKey::ColorMatch
        } else {
            BucketKey::Thickness(-(child.thickness * 1000.0).round() as i64)
        }
    }
}

/// Which link draws each segment, and the order links are emitted in.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawOrder {
    order: Vec<LinkId>,
    drawer: Vec<Option<usize>>,
    link_ids: Vec<LinkId>,
}

impl DrawOrder {
    /// Links in emission order: inactive links first, then active ones, each
    /// group ending with the link that claimed the trunk.
    pub fn order(&self) -> &[LinkId] {
        &self.order
    }

    /// The link that draws a segment.
    pub fn drawer(&self, idx: SegIdx) -> Option<&str> {
        self.drawer
            .get(idx.0)
            .copied()
            .flatten()
            .map(|l| self.link_ids[l].as_str())
    }

    /// Segments a link draws, from its entry toward the root.
    pub fn segments_for(&self, tree: &DrawTree, link: &str) -> Vec<SegIdx> {
        let mut out = Vec::new();
        let Some(mut current) = tree.start_segment(link) else {
            return out;
        };
        loop {
            if self.drawer(current) != Some(link) {
                break;
            }
            out.push(current);
            match tree.segment(current).parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
        out
    }
}

struct Scheduler<'a> {
    tree: &'a DrawTree,
    resolved: &'a ResolvedTree,
    entries: HashMap<SegIdx, usize>,
    drawer: Vec<Option<usize>>,
    active: Vec<usize>,
    inactive: Vec<usize>,
}

impl Scheduler<'_> {
    fn assign(&mut self, node: SegIdx) -> Result<usize, DrawTreeError> {
        let (tree, resolved) = (self.tree, self.resolved);
        let children = resolved.children(node);
        if children.is_empty() {
            let link = *self
                .entries
                .get(&node)
                .ok_or_else(|| DrawTreeError::OrphanLeaf(tree.segment(node).id.clone()))?;
            if tree.links()[link].state.active {
                self.active.push(link);
            } else {
                self.inactive.push(link);
            }
            self.drawer[node.0] = Some(link);
            return Ok(link);
        }

        let parent_style = resolved.style(node);
        let mut sorted: Vec<SegIdx> = children.to_vec();
        // Stable: ties keep insertion (link) order.
        sorted.sort_by_key(|c| BucketKey::relative_to(parent_style, resolved.style(*c)));

        let mut first: Option<usize> = None;
        for child in sorted {
            let link = self.assign(child)?;
            first.get_or_insert(link);
        }
        let link = first.ok_or_else(|| DrawTreeError::OrphanLeaf(tree.segment(node).id.clone()))?;
        self.drawer[node.0] = Some(link);
        Ok(link)
    }
}

impl DrawTree {
    /// Decide which link draws each segment and the order links are emitted in.
    pub fn order_for_drawing(&self, resolved: &ResolvedTree) -> Result<DrawOrder, DrawTreeError> {
        let entries = self
            .links()
            .iter()
            .enumerate()
            .map(|(i, l)| (l.entry, i))
            .collect();
        let mut scheduler = Scheduler {
            tree: self,
            resolved,
            entries,
            drawer: vec![None; self.segments().len()],
            active: Vec::new(),
            inactive: Vec::new(),
        };
        scheduler.assign(resolved.root)?;

        let link_ids: Vec<LinkId> = self.links().iter().map(|l| l.id.clone()).collect();
        // Recursion lists the trunk owner first; it is emitted last so it lands on top.
        let order = scheduler
            .inactive
            .iter()
            .rev()
            .chain(scheduler.active.iter().rev())
            .map(|&l| link_ids[l].clone())
            .collect();
        Ok(DrawOrder {
            order,
            drawer: scheduler.drawer,
            link_ids,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DisplayOptions;
    use crate::model::{LinkBus, LinkSegmentId, LinkState};
    use crate::style::{Extent, PerLinkDrawStyle, Rgba, SuggestedDrawStyle};
    use crate::tree::tests::{ctx, fan_out, seg};
    use std::collections::BTreeMap;

    fn order_of(bus: &LinkBus, query: &BTreeMap<LinkId, LinkState>) -> (DrawTree, DrawOrder) {
        let tree = DrawTree::build(bus, query, &DisplayOptions::default()).unwrap();
        let resolved = tree.resolve_draw_styles(&ctx(bus)).unwrap();
        let order = tree.order_for_drawing(&resolved).unwrap();
        (tree, order)
    }

    fn query(entries: Vec<(&str, LinkState)>) -> BTreeMap<LinkId, LinkState> {
        entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn test_first_link_claims_trunk_on_tie() {
        let bus = fan_out();
        let q = query(vec![("L1", LinkState::default()), ("L2", LinkState::default())]);
        let (tree, order) = order_of(&bus, &q);
        let trunk = tree.find(&LinkSegmentId::Segment("trunk".into())).unwrap();
        assert_eq!(order.drawer(trunk), Some("L1"));
        assert_eq!(order.drawer(tree.find(&LinkSegmentId::RootDrop).unwrap()), Some("L1"));
        // Trunk owner goes last.
        assert_eq!(order.order(), &["L2".to_string(), "L1".to_string()]);
        assert_eq!(order.segments_for(&tree, "L1").len(), 3);
        assert_eq!(order.segments_for(&tree, "L2").len(), 1);
    }

    #[test]
    fn test_inactive_link_ordered_before_active() {
        let bus = fan_out();
        let q = query(vec![("L1", LinkState::default()), ("L2", LinkState::inactive())]);
        let (_, order) = order_of(&bus, &q);
        assert_eq!(order.order(), &["L2".to_string(), "L1".to_string()]);

        let q = query(vec![("L1", LinkState::inactive()), ("L2", LinkState::default())]);
        let (tree, order) = order_of(&bus, &q);
        assert_eq!(order.order(), &["L1".to_string(), "L2".to_string()]);
        let trunk = tree.find(&LinkSegmentId::Segment("trunk".into())).unwrap();
        // L2 matches the active trunk's color; gray L1 does not.
        assert_eq!(order.drawer(trunk), Some("L2"));
    }

    #[test]
    fn test_exact_match_beats_thicker_child() {
        let bus = fan_out();
        let q = query(vec![
            (
                "L1",
                LinkState::default().with_style(PerLinkDrawStyle::new(
                    SuggestedDrawStyle::default()
                        .with_thickness(9.0)
                        .with_color(Rgba::rgb(200, 0, 0)),
                    Extent::Unique,
                )),
            ),
            ("L2", LinkState::default()),
        ]);
        let (tree, order) = order_of(&bus, &q);
        let trunk = tree.find(&LinkSegmentId::Segment("trunk".into())).unwrap();
        assert_eq!(order.drawer(trunk), Some("L2"));
        assert_eq!(order.order(), &["L1".to_string(), "L2".to_string()]);
    }

    #[test]
    fn test_thicker_child_claims_when_no_match() {
        let mut bus = fan_out();
        bus.segments[0].style = Some(
            SuggestedDrawStyle::default()
                .with_color(Rgba::rgb(0, 150, 0))
                .with_thickness(2.0),
        );
        bus.add_end_drop("L3", "t3", Some("trunk"), seg(50.0, 0.0, 70.0, 0.0));
        let styled = |t: f64, color: Rgba| {
            LinkState::default().with_style(PerLinkDrawStyle::new(
                SuggestedDrawStyle::default().with_thickness(t).with_color(color),
                Extent::Unique,
            ))
        };
        let q = query(vec![
            ("L1", styled(4.0, Rgba::rgb(200, 0, 0))),
            ("L2", styled(7.0, Rgba::rgb(0, 0, 200))),
            ("L3", styled(5.0, Rgba::rgb(200, 120, 0))),
        ]);
        let (tree, order) = order_of(&bus, &q);
        let trunk = tree.find(&LinkSegmentId::Segment("trunk".into())).unwrap();
        assert_eq!(order.drawer(trunk), Some("L2"));
        assert_eq!(
            order.order(),
            &["L1".to_string(), "L3".to_string(), "L2".to_string()]
        );
    }

    #[test]
    fn test_every_segment_has_one_drawer() {
        let bus = fan_out();
        let q = query(vec![("L1", LinkState::default()), ("L2", LinkState::default())]);
        let (tree, order) = order_of(&bus, &q);
        let mut drawn: Vec<SegIdx> = order
            .order()
            .iter()
            .flat_map(|l| order.segments_for(&tree, l))
            .collect();
        drawn.sort();
        drawn.dedup();
        assert_eq!(drawn.len(), tree.segments().len());
    }

    #[test]
    fn test_order_is_deterministic() {
        let bus = fan_out();
        let q = query(vec![("L1", LinkState::default()), ("L2", LinkState::inactive())]);
        let (_, a) = order_of(&bus, &q);
        let (_, b) = order_of(&bus, &q);
        assert_eq!(a, b);
    }
}
