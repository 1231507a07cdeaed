//! Labeling.
//!
//! A merge is labeled on the spot only when one side is an unprojected head
//! or the other side is an adjunct. Everything else starts out as `_` and is
//! revisited after every merge: once checking has valued the right features,
//! a moved copy, a strengthened root or a shared phi set can name the branch.

use super::event::{Event, LabelKind, MergeKind};
use super::feature::{Feature, FeatureSet};
use super::forest::{Constituent, NodeId};
use super::lexicon::is_adjunct_label;
use super::workspace::Rewrite;
use super::Engine;
use crate::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LabelReason {
    Head,
    Adjunct,
}

/// Outcome of `determine_label`: `giver` projects over `other`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LabelChoice {
    pub giver: NodeId,
    pub other: NodeId,
    pub reason: LabelReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FoundLabel {
    pub label: String,
    pub kind: LabelKind,
}

impl Engine {
    pub(crate) fn determine_label(&self, x: NodeId, y: NodeId) -> Option<LabelChoice> {
        if self.head_features(x).has("Head") && !self.head_features(y).has("Head") {
            return Some(LabelChoice { giver: x, other: y, reason: LabelReason::Head });
        }
        if is_adjunct_label(self.forest.label(y)) {
            return Some(LabelChoice { giver: x, other: y, reason: LabelReason::Adjunct });
        }
        None
    }

    /// Label what can be labeled on the stack, then let a freshly labeled
    /// `merged` probe for a goal it still needs.
    pub(crate) fn label_unlabeled(&mut self, merged: NodeId) -> NodeId {
        let was_unlabeled = self.forest.is_unlabeled(merged);
        self.relabel_stack(merged);
        if was_unlabeled && !self.forest.is_unlabeled(merged) {
            return self.feature_check_merge(merged);
        }
        merged
    }

    /// Run the labeling function over every unlabeled branch on the active
    /// stack, bottom first, and over `merged` itself.
    pub(crate) fn relabel_stack(&mut self, merged: NodeId) {
        let mut candidates = self.workspace.active().to_vec();
        if !candidates.contains(&merged) {
            candidates.push(merged);
        }
        for id in candidates {
            if !self.forest.is_unlabeled(id) {
                continue;
            }
            let Some((left, right)) = self.forest.children(id) else {
                continue;
            };
            let Some(found) = self.labeling_function(left, right) else {
                continue;
            };
            trace!("[label] {:?} -> {} ({:?})", id, found.label, found.kind);
            let node = Constituent::Branch { label: found.label.clone(), left, right };
            self.rewrite(&[], Rewrite::Node { id, node });
            self.emit(Event::Label { kind: found.kind, label: found.label, tree: None });
        }
    }

    fn found(&self, id: NodeId, kind: LabelKind) -> Option<FoundLabel> {
        if self.forest.is_unlabeled(id) {
            return None;
        }
        Some(FoundLabel { label: self.forest.label(id).to_string(), kind })
    }

    /// Name the set `{a, b}` from what its children carry.
    pub(crate) fn labeling_function(&self, a: NodeId, b: NodeId) -> Option<FoundLabel> {
        if self.forest.is_unlabeled(a) && self.forest.is_unlabeled(b) {
            return None;
        }
        let fa = self.head_features(a);
        let fb = self.head_features(b);
        if fa.is_empty() || fb.is_empty() {
            return None;
        }

        // Movement: the copy left behind does not label.
        let root_present = fa.has("Root") || fb.has("Root");
        match (fa.has("Copy"), fb.has("Copy")) {
            (true, false) if !root_present || fb.has_full_phi() => return self.found(b, LabelKind::Move),
            (false, true) if !root_present || fa.has_full_phi() => return self.found(a, LabelKind::Move),
            _ => {}
        }

        for (id, features) in [(a, &fa), (b, &fb)] {
            if !features.has("Root") {
                continue;
            }
            if features.has_full_phi() || features.iter().any(Feature::is_erg) {
                // Head-final sets are named from the right, where heads sit.
                let giver = match self.language {
                    Language::HeadInitial => id,
                    Language::HeadFinal => b,
                };
                return self.found(giver, LabelKind::Strengthened);
            }
            if features.has("iPerson") {
                panic!("Only Person: `{}` has Root and iPerson without full phi", self.forest.label(id));
            }
        }

        let shared = fa.shared_with(&fb);
        if shared.has_full_phi() {
            return match self.language {
                Language::HeadInitial => {
                    let index = shared.find("iPerson").map_or(0, |f| f.index);
                    Some(FoundLabel { label: format!("Phi{index}"), kind: LabelKind::SharedFeats })
                }
                Language::HeadFinal => self.found(b, LabelKind::Strengthened),
            };
        }
        if shared.has("iPerson") {
            return Some(FoundLabel { label: "Per".to_string(), kind: LabelKind::SharedFeats });
        }
        None
    }

    /// A node that just got its label but still carries unvalued features
    /// merges once more with a labeled goal from the stack.
    fn feature_check_merge(&mut self, merged: NodeId) -> NodeId {
        if self.in_feature_check {
            return merged;
        }
        let probes: Vec<Feature> = self
            .head_features(merged)
            .into_iter()
            .filter(|f| f.is_uninterpretable() && !f.is_case() && f.name != "Scp")
            .collect();
        if probes.is_empty() {
            return merged;
        }

        let goal = self.workspace.top_down().into_iter().find(|&candidate| {
            if self.forest.contains(merged, candidate) || self.forest.is_unlabeled(candidate) {
                return false;
            }
            let features = self.head_features(candidate);
            features.has_uninterpretable()
                && probes.iter().any(|p| features.iter().any(|f| f.satisfies(&p.goal())))
        });
        let Some(goal) = goal else {
            return merged;
        };

        trace!("[label:feature-check] {} + {}", self.forest.label(merged), self.forest.label(goal));
        self.in_feature_check = true;
        self.log_merge(MergeKind::FeatureCheck, merged, goal);
        let result = self.merge(merged, goal);
        self.in_feature_check = false;
        result
    }
}
