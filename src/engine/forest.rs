//! Constituent arena.
//!
//! Every constituent lives in one `Vec` and is addressed by a [`NodeId`].
//! Movement shares structure: two parents may point at the same id, and a
//! patch to that id is seen from both.
//!
//! ```text
//!        Q                 ids:  #7 Q  -> (#6, #5)
//!       / \                      #5 C_Q -> (#4, #3)
//!   which  C_Q                   #3 ... -> ... #2 which (Copy)
//!          / \                   #6 which (copy of #2, no Copy)
//!        C_Q  ...which...
//! ```

use super::event::Tree;
use super::feature::{Feature, FeatureSet};
use crate::Language;
use std::collections::HashSet;

/// Label of a branch that has not been labeled (yet).
pub const UNLABELED: &str = "_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constituent {
    Leaf { label: String, features: Vec<Feature> },
    Branch { label: String, left: NodeId, right: NodeId },
}

impl Constituent {
    pub fn label(&self) -> &str {
        match self {
            Constituent::Leaf { label, .. } | Constituent::Branch { label, .. } => label,
        }
    }

    pub fn with_label(&self, new_label: &str) -> Constituent {
        match self {
            Constituent::Leaf { features, .. } => {
                Constituent::Leaf { label: new_label.to_string(), features: features.clone() }
            }
            Constituent::Branch { left, right, .. } => {
                Constituent::Branch { label: new_label.to_string(), left: *left, right: *right }
            }
        }
    }
}

/// Labels that name features shared by both children rather than a child.
pub fn is_shared_label(label: &str) -> bool {
    matches!(label, "Q" | "Top" | "Per") || label.starts_with("Phi")
}

#[derive(Debug, Default, Clone)]
pub struct Forest {
    nodes: Vec<Constituent>,
}

impl Forest {
    pub fn new() -> Self {
        Forest { nodes: Vec::new() }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    fn alloc(&mut self, node: Constituent) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn leaf(&mut self, label: &str, features: Vec<Feature>) -> NodeId {
        self.alloc(Constituent::Leaf { label: label.to_string(), features })
    }

    pub fn branch(&mut self, label: &str, left: NodeId, right: NodeId) -> NodeId {
        self.alloc(Constituent::Branch { label: label.to_string(), left, right })
    }

    pub fn get(&self, id: NodeId) -> &Constituent {
        &self.nodes[id.index()]
    }

    pub fn label(&self, id: NodeId) -> &str {
        self.get(id).label()
    }

    pub fn is_unlabeled(&self, id: NodeId) -> bool {
        self.label(id) == UNLABELED
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        matches!(self.get(id), Constituent::Leaf { .. })
    }

    pub fn children(&self, id: NodeId) -> Option<(NodeId, NodeId)> {
        match self.get(id) {
            Constituent::Branch { left, right, .. } => Some((*left, *right)),
            Constituent::Leaf { .. } => None,
        }
    }

    /// A leaf's own features; empty for branches.
    pub fn features(&self, id: NodeId) -> &[Feature] {
        match self.get(id) {
            Constituent::Leaf { features, .. } => features,
            Constituent::Branch { .. } => &[],
        }
    }

    /// Replace the node stored at `id`. Every parent pointing at `id` sees it.
    pub fn patch(&mut self, id: NodeId, node: Constituent) {
        self.nodes[id.index()] = node;
    }

    pub fn set_label(&mut self, id: NodeId, label: &str) {
        let node = self.get(id).with_label(label);
        self.patch(id, node);
    }

    pub fn set_features(&mut self, leaf: NodeId, new_features: Vec<Feature>) {
        match &mut self.nodes[leaf.index()] {
            Constituent::Leaf { features, .. } => *features = new_features,
            Constituent::Branch { label, .. } => panic!("cannot set features on branch `{label}`"),
        }
    }

    /// Copy a whole subtree into fresh ids.
    pub fn deep_copy(&mut self, id: NodeId) -> NodeId {
        match self.get(id).clone() {
            leaf @ Constituent::Leaf { .. } => self.alloc(leaf),
            Constituent::Branch { label, left, right } => {
                let left = self.deep_copy(left);
                let right = self.deep_copy(right);
                self.branch(&label, left, right)
            }
        }
    }

    pub fn contains(&self, ancestor: NodeId, target: NodeId) -> bool {
        if ancestor == target {
            return true;
        }
        match self.children(ancestor) {
            Some((left, right)) => self.contains(left, target) || self.contains(right, target),
            None => false,
        }
    }

    /// Leaves reachable from `roots`, each once, in first-visit order.
    pub fn reachable_leaves(&self, roots: impl IntoIterator<Item = NodeId>) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let mut leaves = Vec::new();
        let mut pending: Vec<NodeId> = roots.into_iter().collect();
        pending.reverse();
        while let Some(id) = pending.pop() {
            if !seen.insert(id) {
                continue;
            }
            match self.get(id) {
                Constituent::Leaf { .. } => leaves.push(id),
                Constituent::Branch { left, right, .. } => {
                    pending.push(*right);
                    pending.push(*left);
                }
            }
        }
        leaves
    }

    /// Child that stands in for an unlabeled branch: the left one in
    /// head-initial order, the right one in head-final order.
    pub fn default_head_child(&self, id: NodeId, language: Language) -> Option<NodeId> {
        let (left, right) = self.children(id)?;
        Some(match language {
            Language::HeadInitial => left,
            Language::HeadFinal => right,
        })
    }

    /// Child whose label matches the branch label, if any.
    fn projecting_child(&self, id: NodeId) -> Option<NodeId> {
        let (left, right) = self.children(id)?;
        let label = self.label(id);
        if self.label(left) == label {
            Some(left)
        } else if self.label(right) == label {
            Some(right)
        } else {
            None
        }
    }

    /// Leaf reached by following the projection down from `id`.
    pub fn head_leaf(&self, id: NodeId, language: Language) -> NodeId {
        let mut current = id;
        loop {
            if self.is_leaf(current) {
                return current;
            }
            current = match self.projecting_child(current) {
                Some(child) => child,
                None if self.is_unlabeled(current) || is_shared_label(self.label(current)) => {
                    self.default_head_child(current, language).unwrap_or(current)
                }
                None => panic!("no head found for `{}`", self.label(current)),
            };
        }
    }

    /// Features visible at the top of `id`'s projection. Shared labels see
    /// what both children have in common.
    pub fn head_features(&self, id: NodeId, language: Language) -> Vec<Feature> {
        match self.get(id) {
            Constituent::Leaf { features, .. } => features.clone(),
            Constituent::Branch { label, left, right } => {
                if let Some(child) = self.projecting_child(id) {
                    return self.head_features(child, language);
                }
                if is_shared_label(label) {
                    let shared =
                        self.head_features(*left, language).shared_with(&self.head_features(*right, language));
                    if !shared.is_empty() {
                        return shared;
                    }
                } else if label != UNLABELED {
                    panic!("no head found for `{label}`");
                }
                match self.default_head_child(id, language) {
                    Some(child) => self.head_features(child, language),
                    None => Vec::new(),
                }
            }
        }
    }

    /// Non-head child of the projection rooted at `id`: the sister of the
    /// head leaf at the bottom of the projection line.
    pub fn complement(&self, id: NodeId, language: Language) -> Option<NodeId> {
        let (left, right) = self.children(id)?;
        let label = self.label(id);
        let left_projects = self.label(left) == label;
        let right_projects = self.label(right) == label;
        match (left_projects, right_projects) {
            (true, _) if self.is_leaf(left) => Some(right),
            (_, true) if self.is_leaf(right) => Some(left),
            (true, _) => self.complement(left, language),
            (_, true) => self.complement(right, language),
            _ => Some(match language {
                Language::HeadInitial => right,
                Language::HeadFinal => left,
            }),
        }
    }

    /// Relabel `id` and every node below it on its projection line.
    pub fn relabel_projection(&mut self, id: NodeId, new_label: &str) {
        let next = self.projecting_child(id);
        self.set_label(id, new_label);
        if let Some(child) = next {
            self.relabel_projection(child, new_label);
        }
    }

    /// Owned snapshot of the subtree at `id`.
    pub fn snapshot(&self, id: NodeId) -> Tree {
        match self.get(id) {
            Constituent::Leaf { label, features } => Tree::Leaf { label: label.clone(), features: features.clone() },
            Constituent::Branch { label, left, right } => Tree::Branch {
                label: label.clone(),
                left: Box::new(self.snapshot(*left)),
                right: Box::new(self.snapshot(*right)),
            },
        }
    }
}
