//! Merge and remerge.
//!
//! `merge(x, y)` is the one structure-building step. `x` is the newly
//! selected item (or the main spine when a sub-stream comes back), `y` the
//! structure built so far. After the new branch exists, two kinds of
//! remerge for labeling may follow: a set nobody labeled raises a phi-bearing
//! phrase out of its complement, and a checked wh- or topic phrase is put on
//! top. A phase head then sends its complement to Transfer.

use super::checker::Remerge;
use super::event::{Event, LabelKind, MergeKind};
use super::feature::{Feature, FeatureSet};
use super::forest::{NodeId, UNLABELED};
use super::labeler::LabelReason;
use super::lexicon::{is_adjunct_label, is_determiner, is_phase_head, is_theta_assigner};
use super::Engine;
use crate::Language;

impl Engine {
    /// Log and perform the merge of a freshly selected item onto the spine.
    pub(crate) fn external_merge(&mut self, x: NodeId, y: NodeId) -> NodeId {
        self.log_merge(MergeKind::External, x, y);
        self.merge(x, y)
    }

    pub(crate) fn merge(&mut self, x: NodeId, y: NodeId) -> NodeId {
        let external = self.head_features(x).has("MergeF");
        trace!(
            "[merge] x={} y={} external={external} stream={:?}",
            self.forest.label(x),
            self.forest.label(y),
            self.workspace.stream()
        );
        self.workspace.push(x);
        self.workspace.push(y);

        self.inherit(x, y);
        let remerge = self.check(x, y);

        let mut merged = match self.determine_label(x, y) {
            Some(choice) => {
                if choice.reason == LabelReason::Head {
                    self.strip_head_feature(choice.giver, "Head");
                }
                let label = self.forest.label(choice.giver).to_string();
                let (left, right) = self.order_children(choice.giver, choice.other);
                let merged = self.forest.branch(&label, left, right);
                self.counters.merges += 1;
                self.workspace.push(merged);
                if choice.reason == LabelReason::Head {
                    let tree = Some(self.snapshot(merged));
                    self.emit(Event::Label { kind: LabelKind::Head, label, tree });
                }
                merged
            }
            None => {
                let (left, right) = self.unlabeled_order(x, y, external);
                let merged = self.forest.branch(UNLABELED, left, right);
                self.counters.merges += 1;
                self.workspace.push(merged);
                self.emit(Event::Label { kind: LabelKind::None, label: UNLABELED.to_string(), tree: None });
                self.unlabeled_move(merged)
            }
        };

        if let Some(remerge) = remerge {
            merged = self.remerge_back(merged, remerge);
        }
        merged = self.label_unlabeled(merged);

        if is_phase_head(self.forest.label(merged)) {
            merged = self.transfer(merged);
        }
        merged
    }

    /// Child order for a labeled branch: the head side follows the language.
    pub(crate) fn order_children(&self, head: NodeId, other: NodeId) -> (NodeId, NodeId) {
        match self.language {
            Language::HeadInitial => (head, other),
            Language::HeadFinal => (other, head),
        }
    }

    /// Child order for a branch nobody labeled.
    fn unlabeled_order(&self, x: NodeId, y: NodeId, external: bool) -> (NodeId, NodeId) {
        let x_label = self.forest.label(x);
        let y_label = self.forest.label(y);
        let head_initial = self.language == Language::HeadInitial;

        let x_first = if is_adjunct_label(x_label) {
            false
        } else if is_phase_head(x_label) {
            head_initial
        } else if head_initial
            && x_label.contains('v')
            && (is_determiner(y_label) || y_label.starts_with('D') || y_label.starts_with('Q'))
        {
            false
        } else {
            external == head_initial
        };

        if x_first { (x, y) } else { (y, x) }
    }

    /// Raise a phi-bearing phrase out of the complement of a fresh unlabeled
    /// set. The lower occurrence keeps `Copy`, so once the other side of its
    /// set is valued the set is labeled by movement.
    fn unlabeled_move(&mut self, merged: NodeId) -> NodeId {
        if !self.workspace.is_main() || self.in_feature_check {
            return merged;
        }
        let Some(locus) = self.movement_locus(merged) else {
            return merged;
        };

        let copy = self.forest.deep_copy(locus);
        // The raised copy is a phrase now; it no longer projects.
        self.strip_head_feature(copy, "Head");
        self.strip_head_feature(copy, "MergeF");
        self.mark_head(locus, "Copy");
        self.log_merge(MergeKind::ForLabeling, copy, merged);

        let remerged = self.forest.branch(UNLABELED, copy, merged);
        self.counters.merges += 1;
        self.workspace.push(copy);
        self.workspace.push(remerged);
        trace!("[merge:unlabeled-move] {} out of {:?}", self.forest.label(copy), merged);
        self.emit(Event::Label { kind: LabelKind::None, label: UNLABELED.to_string(), tree: None });
        remerged
    }

    /// The phrase an unlabeled `{head, complement}` raises, if any.
    fn movement_locus(&self, merged: NodeId) -> Option<NodeId> {
        let (head, complement) = self.forest.children(merged)?;
        if self.specifier_pending && is_theta_assigner(self.forest.label(head)) {
            return None;
        }
        // A head-initial set whose left side is already a DP has its phi.
        if self.language == Language::HeadInitial && is_phrasal(&self.head_features(head)) {
            return None;
        }

        let (locus, nominal) = if self.forest.is_unlabeled(complement) {
            let (left, _) = self.forest.children(complement)?;
            (left, self.head_features(left).has_all(&["iN", "uPerson"]))
        } else if self.forest.label(complement).starts_with("Phi") {
            let (left, _) = self.forest.children(complement)?;
            (left, false)
        } else {
            (complement, self.head_features(complement).has("iN"))
        };

        let features = self.head_features(locus);
        (!features.has("Copy") && (nominal || is_phrasal(&features))).then_some(locus)
    }

    /// Put the checked wh- or topic copy on top of `merged` and label the
    /// result by the feature they share.
    pub(crate) fn remerge_back(&mut self, merged: NodeId, remerge: Remerge) -> NodeId {
        let shared = self.head_features(merged).shared_with(&self.head_features(remerge.copy));
        let label = if shared.has("iQ") {
            "Q"
        } else if shared.has("iTop") {
            "Top"
        } else {
            panic!(
                "remerge of `{}` onto `{}` shares no Q or Top feature: [{}]",
                self.forest.label(remerge.copy),
                self.forest.label(merged),
                shared.render()
            )
        };

        self.mark_head(remerge.source, "Copy");
        self.log_merge(MergeKind::ForLabeling, merged, remerge.copy);
        let remerged = self.forest.branch(label, remerge.copy, merged);
        self.counters.merges += 1;
        self.workspace.push(remerge.copy);
        self.workspace.push(remerged);
        trace!("[merge:remerge] label={label} copy={}", self.forest.label(remerge.copy));

        let tree = Some(self.snapshot(remerged));
        self.emit(Event::Label { kind: LabelKind::SharedFeats, label: label.to_string(), tree });
        remerged
    }
}

/// A determiner or wh- phrase that already carries its phi.
fn is_phrasal(features: &[Feature]) -> bool {
    features.has_all(&["iD", "iPerson"]) || features.has_all(&["iQ", "iPerson"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::event::Tree;
    use crate::engine::feature::parse_all;

    #[test]
    fn head_initial_puts_the_head_first() {
        let mut engine = Engine::new(Language::HeadInitial);
        let n = engine.fetch("n");
        let v = engine.fetch("v");
        // A light verb merged with a noun: no head wins yet.
        assert!(engine.determine_label(v, n).is_none());
        assert_eq!(engine.unlabeled_order(v, n, true), (v, n));
    }

    #[test]
    fn unlabeled_set_raises_its_noun() {
        let mut engine = Engine::new(Language::HeadInitial);
        let n = engine.fetch("n");
        let v = engine.fetch("v");
        let merged = engine.external_merge(v, n);
        assert!(engine.forest.is_unlabeled(merged));
        assert_eq!(engine.counters.merges, 2);

        let (raised, lower) = engine.forest.children(merged).expect("remerged set");
        assert_eq!(engine.forest.children(lower), Some((v, n)));
        assert_eq!(engine.forest.label(raised), "n");
        assert!(engine.forest.features(n).has("Copy"));
        assert!(!engine.forest.features(raised).has("Copy"));
        assert!(!engine.forest.features(raised).has("Head"));
        assert!(engine.forest.features(raised).has("iN"));

        let tags: Vec<String> = engine.log.iter().map(|e| e.record().to_string()).collect();
        assert_eq!(
            tags,
            [
                "('Merge', 'merge v + n')",
                "('Label(None)', '_')",
                "('Merge', 'merge (for labeling) n + _')",
                "('Label(None)', '_')",
            ]
        );
    }

    #[test]
    fn no_unlabeled_move_on_the_sub_stream() {
        let mut engine = Engine::new(Language::HeadInitial);
        engine.workspace.start_sub_stream();
        let n = engine.fetch("n");
        let v = engine.fetch("v");
        let merged = engine.external_merge(v, n);
        assert_eq!(engine.forest.children(merged), Some((v, n)));
        assert!(!engine.forest.features(n).has("Copy"));
    }

    #[test]
    fn incoming_specifier_blocks_the_move() {
        let mut engine = Engine::new(Language::HeadInitial);
        engine.specifier_pending = true;
        let n = engine.fetch("n");
        let v = engine.fetch("v");
        let merged = engine.external_merge(v, n);
        assert_eq!(engine.forest.children(merged), Some((v, n)));
        assert_eq!(engine.counters.merges, 1);
    }

    #[test]
    fn moved_copy_labels_once_its_sister_is_valued() {
        let mut engine = Engine::new(Language::HeadInitial);
        let v = engine.forest.leaf("v", parse_all(&["Root2", "iv", "iPerson1", "iNumber1", "iGender1"]));
        let n = engine.forest.leaf("n", parse_all(&["iPerson1", "iNumber1", "iGender1", "iN", "Copy"]));
        let found = engine.labeling_function(v, n).expect("labeled by movement");
        assert_eq!(found.label, "v");
        assert_eq!(found.kind, LabelKind::Move);
    }

    #[test]
    fn phrase_on_the_left_keeps_the_set_in_place() {
        let mut engine = Engine::new(Language::HeadInitial);
        let dp = engine.forest.leaf("D", parse_all(&["iD", "iPerson1", "iNumber1", "iGender1"]));
        let n = engine.forest.leaf("n", parse_all(&["iN", "uCase2"]));
        let set = engine.forest.branch(UNLABELED, dp, n);
        assert_eq!(engine.movement_locus(set), None);

        let v = engine.forest.leaf("v", parse_all(&["Root3"]));
        let set = engine.forest.branch(UNLABELED, v, n);
        assert_eq!(engine.movement_locus(set), Some(n));
    }

    #[test]
    fn head_final_puts_the_head_last() {
        let mut engine = Engine::new(Language::HeadFinal);
        let n = engine.fetch("n");
        let v = engine.fetch("v");
        let merged = engine.external_merge(v, n);
        assert_eq!(engine.forest.children(merged), Some((n, v)));

        let object = engine.fetch("n");
        let projected = engine.external_merge(object, merged);
        assert_eq!(engine.forest.label(projected), "n");
        assert_eq!(engine.forest.children(projected), Some((merged, object)));
    }

    #[test]
    fn head_label_strips_the_head_marker() {
        let mut engine = Engine::new(Language::HeadInitial);
        let n = engine.fetch("n");
        let v = engine.fetch("v");
        let vp = engine.external_merge(v, n);
        let object = engine.fetch("n");
        let merged = engine.external_merge(object, vp);
        assert_eq!(engine.forest.label(merged), "n");
        assert!(!engine.forest.features(object).has("Head"));
        let labeled = engine.log.iter().any(|e| {
            matches!(e, Event::Label { kind: LabelKind::Head, tree: Some(Tree::Branch { .. }), .. })
        });
        assert!(labeled);
    }

    #[test]
    fn adjunct_sits_on_the_right() {
        let mut engine = Engine::new(Language::HeadInitial);
        let root = engine.fetch("root");
        let adjunct = engine.fetch("in");
        let (left, right) = engine.unlabeled_order(adjunct, root, true);
        assert_eq!((left, right), (root, adjunct));
    }

    #[test]
    fn verb_follows_a_determiner_phrase() {
        let mut engine = Engine::new(Language::HeadInitial);
        let v = engine.fetch("v");
        let d = engine.fetch("D");
        assert_eq!(engine.unlabeled_order(v, d, true), (d, v));
    }
}
