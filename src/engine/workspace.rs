//! Derivation stacks and the rewrite core.
//!
//! Two stacks hold the accessible history of a derivation: the main stream
//! and one sub-stream. Only one is active at a time. Constituents are pushed
//! as they are built and only leave through Transfer.
//!
//! A [`Rewrite`] is the one way the checker and labeler change structure that
//! is already built. Node and feature-list rewrites patch a single arena id;
//! feature rewrites walk every leaf reachable from the working roots and the
//! active stack, so copies created by movement stay in step.

use super::feature::Feature;
use super::forest::{Constituent, Forest, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stream {
    #[default]
    Main,
    Sub,
}

#[derive(Debug, Default, Clone)]
pub struct Workspace {
    main: Vec<NodeId>,
    sub: Vec<NodeId>,
    stream: Stream,
}

impl Workspace {
    pub fn new() -> Self {
        Workspace::default()
    }

    pub fn reset(&mut self) {
        *self = Workspace::default();
    }

    pub fn stream(&self) -> Stream {
        self.stream
    }

    pub fn is_main(&self) -> bool {
        self.stream == Stream::Main
    }

    pub fn start_sub_stream(&mut self) {
        self.sub.clear();
        self.stream = Stream::Sub;
    }

    pub fn end_sub_stream(&mut self) {
        self.sub.clear();
        self.stream = Stream::Main;
    }

    fn active_mut(&mut self) -> &mut Vec<NodeId> {
        match self.stream {
            Stream::Main => &mut self.main,
            Stream::Sub => &mut self.sub,
        }
    }

    /// The active stack, bottom first.
    pub fn active(&self) -> &[NodeId] {
        match self.stream {
            Stream::Main => &self.main,
            Stream::Sub => &self.sub,
        }
    }

    /// Push onto the active stack unless already there.
    pub fn push(&mut self, id: NodeId) {
        let stack = self.active_mut();
        if !stack.contains(&id) {
            stack.push(id);
        }
    }

    pub fn push_main(&mut self, id: NodeId) {
        if !self.main.contains(&id) {
            self.main.push(id);
        }
    }

    /// Snapshot of the active stack, top first.
    pub fn top_down(&self) -> Vec<NodeId> {
        self.active().iter().rev().copied().collect()
    }

    /// Drop everything below `id` on the active stack.
    pub fn cut_below(&mut self, id: NodeId) {
        let stack = self.active_mut();
        if let Some(pos) = stack.iter().position(|&s| s == id) {
            stack.drain(..pos);
        }
    }

    pub fn clear_active(&mut self) {
        self.active_mut().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.active().is_empty()
    }
}

/// One structural update.
#[derive(Debug, Clone, PartialEq)]
pub enum Rewrite {
    /// Replace the node stored at `id`.
    Node { id: NodeId, node: Constituent },
    /// Replace a leaf's whole feature list.
    FeatureList { leaf: NodeId, features: Vec<Feature> },
    /// Replace every occurrence of `old`; `None` deletes it.
    Feature { old: Feature, new: Option<Feature> },
    /// Substitute `pattern` inside feature names; `None` deletes the
    /// substring, and a feature whose name becomes empty is dropped.
    FeatureName { pattern: String, replacement: Option<String> },
}

impl Rewrite {
    /// Apply to `forest`. `leaves` is the reach of the working roots plus
    /// the active stack; only the feature-level forms use it.
    pub fn apply(self, forest: &mut Forest, leaves: &[NodeId]) {
        match self {
            Rewrite::Node { id, node } => forest.patch(id, node),
            Rewrite::FeatureList { leaf, features } => forest.set_features(leaf, features),
            Rewrite::Feature { old, new } => {
                if new.as_ref() == Some(&old) {
                    return;
                }
                for &leaf in leaves {
                    let current = forest.features(leaf);
                    if !current.contains(&old) {
                        continue;
                    }
                    let mut updated = Vec::with_capacity(current.len());
                    for feature in current {
                        if *feature != old {
                            updated.push(feature.clone());
                            continue;
                        }
                        if let Some(new) = &new {
                            if !current.contains(new) && !updated.contains(new) {
                                updated.push(new.clone());
                            }
                        }
                    }
                    forest.set_features(leaf, updated);
                }
            }
            Rewrite::FeatureName { pattern, replacement } => {
                let replacement = replacement.unwrap_or_default();
                for &leaf in leaves {
                    let current = forest.features(leaf);
                    if !current.iter().any(|f| f.name.contains(&pattern)) {
                        continue;
                    }
                    let updated = current
                        .iter()
                        .filter_map(|f| {
                            if !f.name.contains(&pattern) {
                                return Some(f.clone());
                            }
                            let name = f.name.replace(&pattern, &replacement);
                            (!name.is_empty()).then(|| Feature::new(f.polarity, name, f.value.clone(), f.index))
                        })
                        .collect();
                    forest.set_features(leaf, updated);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::feature::{FeatureSet, parse_all};

    #[test]
    fn push_is_idempotent_and_streams_are_separate() {
        let mut forest = Forest::new();
        let a = forest.leaf("a", Vec::new());
        let b = forest.leaf("b", Vec::new());
        let mut ws = Workspace::new();
        ws.push(a);
        ws.push(a);
        assert_eq!(ws.active().len(), 1);

        ws.start_sub_stream();
        assert!(ws.is_empty());
        ws.push(b);
        assert_eq!(ws.top_down(), vec![b]);
        ws.push_main(b);
        ws.end_sub_stream();
        assert_eq!(ws.top_down(), vec![b, a]);
    }

    #[test]
    fn cut_below_keeps_the_upper_part() {
        let mut forest = Forest::new();
        let ids: Vec<NodeId> = (0..4).map(|i| forest.leaf(&i.to_string(), Vec::new())).collect();
        let mut ws = Workspace::new();
        ids.iter().for_each(|&id| ws.push(id));
        ws.cut_below(ids[2]);
        assert_eq!(ws.active(), &ids[2..]);
    }

    #[test]
    fn feature_rewrite_reaches_every_copy() {
        let mut forest = Forest::new();
        let v_star = forest.leaf("v*", parse_all(&["uPerson4", "Head"]));
        let v = forest.leaf("v", parse_all(&["Root2", "uPerson4"]));
        let vp = forest.branch("v", v, v_star);
        let leaves = forest.reachable_leaves([vp]);

        let old = Feature::parse("uPerson4");
        let new = Feature::parse("iPerson2");
        Rewrite::Feature { old: old.clone(), new: Some(new) }.apply(&mut forest, &leaves);

        for leaf in forest.reachable_leaves([vp]) {
            assert!(!forest.features(leaf).contains(&old));
            assert!(forest.features(leaf).has("iPerson"));
        }
    }

    #[test]
    fn feature_rewrite_to_none_deletes() {
        let mut forest = Forest::new();
        let c = forest.leaf("C", parse_all(&["Case:Nom5", "Head"]));
        Rewrite::Feature { old: Feature::parse("Case:Nom5"), new: None }.apply(&mut forest, &[c]);
        assert_eq!(forest.features(c), parse_all(&["Head"]).as_slice());
    }

    #[test]
    fn rewrite_never_duplicates() {
        let mut forest = Forest::new();
        let n = forest.leaf("n", parse_all(&["uCase1", "uCase3"]));
        Rewrite::Feature { old: Feature::parse("uCase1"), new: Some(Feature::parse("uCase3")) }
            .apply(&mut forest, &[n]);
        assert_eq!(forest.features(n), parse_all(&["uCase3"]).as_slice());
    }

    #[test]
    fn name_rewrite_strips_substrings() {
        let mut forest = Forest::new();
        let c = forest.leaf("C", parse_all(&["Delete", "iC", "uPerson5"]));
        Rewrite::FeatureName { pattern: "Delete".into(), replacement: None }.apply(&mut forest, &[c]);
        assert!(!forest.features(c).has("Delete"));
        assert_eq!(forest.features(c).len(), 2);
    }
}
