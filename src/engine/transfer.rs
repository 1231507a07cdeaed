//! Phase transfer.
//!
//! When a phase head projects, its complement is spelled out. Three cases:
//!
//! - `v*` over a Root (head-initial, main stream): the phase is *dephased*.
//!   `v*` takes the root's name, the root's complement goes, and the root
//!   itself stays accessible at the edge.
//! - A head with `Delete` (null C): C disappears and its complement is
//!   promoted in its place.
//! - Anything else: a constituent that still needs a feature may first be
//!   remerged as the phase's specifier, then the complement goes and the
//!   stack is reset.

use super::event::{Event, LabelKind, MergeKind};
use super::feature::FeatureSet;
use super::forest::NodeId;
use super::workspace::Rewrite;
use super::Engine;
use crate::Language;

impl Engine {
    pub(crate) fn transfer(&mut self, merged: NodeId) -> NodeId {
        if self.transferred.contains(&merged) {
            trace!("[transfer] {} already transferred", self.forest.label(merged));
            return merged;
        }

        let dephase_v = self.forest.label(merged) == "v*"
            && self.language == Language::HeadInitial
            && self.workspace.is_main();
        if dephase_v {
            if let Some(root) = self.nearest_root_bearer(merged) {
                return self.dephase_v(merged, root);
            }
        }

        let (result, complement, specifier) = if self.head_features(merged).has("Delete") {
            let promoted = self.dephase_deleted_c(merged);
            (promoted, self.forest.complement(promoted, self.language), None)
        } else {
            let (result, specifier) = self.last_resort_remerge(merged);
            (result, self.forest.complement(result, self.language), specifier)
        };

        let payload = complement.map(|id| self.snapshot(id));
        trace!("[transfer] phase={} complement={:?}", self.forest.label(result), complement);
        self.emit(Event::Transfer(payload));

        self.transferred.insert(merged);
        self.transferred.insert(result);
        self.workspace.clear_active();
        if let Some(specifier) = specifier {
            self.workspace.push(specifier);
        }
        if !self.workspace.is_main() {
            self.workspace.push_main(result);
        }
        result
    }

    fn nearest_root_bearer(&self, merged: NodeId) -> Option<NodeId> {
        self.workspace
            .top_down()
            .into_iter()
            .find(|&id| id != merged && self.head_features(id).has("Root"))
    }

    fn dephase_v(&mut self, merged: NodeId, root: NodeId) -> NodeId {
        let root_leaf = self.head_leaf(root);
        let label = format!("{}+v*", self.forest.label(root_leaf));
        let complement = self.forest.complement(root, self.language);

        self.forest.relabel_projection(merged, &label);
        self.workspace.cut_below(root);
        self.transferred.insert(merged);
        trace!("[transfer:dephase-v] {label}");

        let tree = self.snapshot(merged);
        self.emit(Event::DephaseV(tree));
        let payload = complement.map(|id| self.snapshot(id));
        self.emit(Event::Transfer(payload));
        merged
    }

    /// Drop a null C and promote what it headed.
    fn dephase_deleted_c(&mut self, merged: NodeId) -> NodeId {
        let Some((left, right)) = self.forest.children(merged) else {
            return merged;
        };
        let label = self.forest.label(merged);
        let (head_child, other) = if self.forest.label(left) == label { (left, right) } else { (right, left) };

        let promoted = if self.forest.is_leaf(head_child) {
            other
        } else {
            let complement = self.forest.complement(head_child, self.language).unwrap_or(other);
            let complement_label = self.forest.label(complement).to_string();
            let (left, right) = self.order_children(complement, other);
            self.forest.branch(&complement_label, left, right)
        };

        self.rewrite(&[promoted], Rewrite::FeatureName { pattern: "Delete".to_string(), replacement: None });
        trace!("[transfer:dephase-c] promoted={}", self.forest.label(promoted));
        let tree = self.snapshot(promoted);
        self.emit(Event::DephaseDeleteC(tree));
        promoted
    }

    /// Remerge a constituent that still carries an unvalued feature as the
    /// phase's specifier. Main stream only.
    fn last_resort_remerge(&mut self, merged: NodeId) -> (NodeId, Option<NodeId>) {
        if !self.workspace.is_main() {
            return (merged, None);
        }
        let label = self.forest.label(merged).to_string();
        let phase_features = self.head_features(merged);

        let candidate = self.workspace.top_down().into_iter().find(|&id| {
            let candidate_label = self.forest.label(id);
            id != merged
                && !self.forest.is_unlabeled(id)
                && candidate_label != label
                && !candidate_label.starts_with("Phi")
                && self.forest.contains(merged, id)
                && self
                    .head_features(id)
                    .iter()
                    .any(|f| f.is_uninterpretable() && f.name.starts_with(|c: char| c.is_ascii_uppercase()))
        });
        let Some(candidate) = candidate else {
            return (merged, None);
        };

        if let Some(complement) = self.forest.complement(candidate, self.language) {
            if !self.head_features(complement).shared_with(&phase_features).is_empty() {
                trace!("[transfer:last-resort] blocked by {}", self.forest.label(complement));
                return (merged, None);
            }
        }

        let copy = self.forest.deep_copy(candidate);
        self.mark_head(candidate, "Copy");
        self.log_merge(MergeKind::DueToUf, copy, merged);
        let remerged = self.forest.branch(&label, copy, merged);
        self.counters.merges += 1;

        let tree = Some(self.snapshot(remerged));
        self.emit(Event::Label { kind: LabelKind::Head, label, tree });
        (remerged, Some(copy))
    }
}
