//! Feature inheritance and checking.
//!
//! Runs between pushing `x`, `y` and building their branch:
//!
//! ```text
//! inherit   phase head (or a phi-rich x/y) ──PassFs──> Root-bearing heads below
//! check     every probe of x walks the stack top-down:
//!             uF   -> first labeled top with iF (top must still be active)
//!             Case -> nearest uCase inside y
//!             uPhi -> phi of the first top with iPerson
//!             uQ / uTop -> also pick a remerge copy
//! ```

use super::event::Event;
use super::feature::{Feature, FeatureSet};
use super::forest::NodeId;
use super::lexicon::is_phase_head;
use super::workspace::Rewrite;
use super::Engine;
use crate::Language;
use std::collections::{HashSet, VecDeque};

/// A checked wh- or topic phrase waiting to be remerged on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Remerge {
    /// The constituent in its base position; it keeps `Copy`.
    pub source: NodeId,
    /// Fresh deep copy that becomes the specifier.
    pub copy: NodeId,
}

impl Engine {
    fn choose_inheritor(&self, x: NodeId, y: NodeId) -> Option<(NodeId, Vec<Feature>)> {
        for candidate in [x, y] {
            let features = self.head_features(candidate);
            let phi_like: Vec<Feature> = features.iter().filter(|f| f.is_phi_like()).cloned().collect();
            let qualifies = phi_like.len() >= 3
                || is_phase_head(self.forest.label(candidate))
                || features.iter().any(Feature::is_erg);
            if qualifies {
                return (!phi_like.is_empty()).then_some((candidate, phi_like));
            }
        }
        None
    }

    /// An `n` that has not projected yet.
    fn is_nominal_boundary(&self, id: NodeId) -> bool {
        self.forest.is_leaf(id) && self.forest.label(id) == "n" && self.forest.features(id).has("Head")
    }

    fn pass_target_label(&self, id: NodeId) -> String {
        let label = self.forest.label(id);
        let Some((left, right)) = self.forest.children(id).filter(|_| self.forest.is_unlabeled(id)) else {
            return label.to_string();
        };
        let order = match self.language {
            Language::HeadInitial => [left, right],
            Language::HeadFinal => [right, left],
        };
        match order.into_iter().find(|&child| !self.forest.is_unlabeled(child)) {
            Some(child) => self.forest.label(child).to_string(),
            None => panic!("can't find a label for the feature-passing target under `{label}`"),
        }
    }

    /// Pass the inheritor's phi-like features down to Root-bearing heads.
    pub(crate) fn inherit(&mut self, x: NodeId, y: NodeId) -> bool {
        let Some((inheritor, passing)) = self.choose_inheritor(x, y) else {
            return false;
        };
        let from = self.forest.label(inheritor).to_string();
        let mut served = HashSet::new();
        let mut passed = false;

        for current in self.workspace.top_down() {
            if current == inheritor {
                continue;
            }
            if self.is_nominal_boundary(current) {
                break;
            }
            let leaf = self.head_leaf(current);
            if served.contains(&leaf) {
                continue;
            }
            let head = self.head_features(current);
            if !head.has("Root") || head.has("Person") || head.has("iD") || head.has("iN") {
                continue;
            }

            let mut features = self.forest.features(leaf).to_vec();
            for feature in &passing {
                if !features.contains(feature) {
                    features.push(feature.clone());
                }
            }
            self.rewrite(&[], Rewrite::FeatureList { leaf, features });
            served.insert(leaf);

            let to = self.pass_target_label(current);
            trace!("[inherit] {from} -> {to} [{}]", passing.render());
            self.emit(Event::PassFeatures { from: from.clone(), to });
            self.emit(Event::FeaturesPassed(passing.clone()));
            self.counters.inheritances += 1;
            passed = true;
        }
        passed
    }

    fn rewrite_roots(x: NodeId, y: NodeId, remerge: Option<Remerge>) -> Vec<NodeId> {
        let mut roots = vec![x, y];
        roots.extend(remerge.map(|r| r.copy));
        roots
    }

    /// Check x's probes against the stack. Returns the remerge candidate
    /// picked by a uQ or uTop probe.
    pub(crate) fn check(&mut self, x: NodeId, y: NodeId) -> Option<Remerge> {
        if self.workspace.is_empty() {
            return None;
        }
        self.strip_head_feature(x, "MergeF");

        let x_features = self.head_features(x);
        let full_uphi = x_features.has_full_uphi();
        let mut probes: Vec<Feature> = x_features
            .iter()
            .filter(|f| f.is_uninterpretable() || (f.is_case() && full_uphi) || (f.name == "Scp" && f.is_interpretable()))
            .cloned()
            .collect();
        if probes.is_empty() {
            return None;
        }
        probes.sort_by_key(ToString::to_string);
        probes.reverse();
        let interpretables: Vec<Feature> = probes.iter().filter(|f| f.is_interpretable()).cloned().collect();

        let mut checked = Vec::new();
        let mut remerge = None;
        for probe in &probes {
            trace!("[check] probe={probe}");
            self.probe(x, y, probe, &interpretables, &mut remerge, &mut checked);
        }

        if !checked.is_empty() {
            self.counters.checks += checked.len() as u32;
            self.emit(Event::CheckedFeatures(checked));
        }
        remerge
    }

    fn probe(
        &mut self,
        x: NodeId,
        y: NodeId,
        probe: &Feature,
        interpretables: &[Feature],
        remerge: &mut Option<Remerge>,
        checked: &mut Vec<Feature>,
    ) {
        let goal = probe.goal();
        let scope_probe = probe.is_uninterpretable() && matches!(probe.name.as_str(), "Q" | "Top");

        for top in self.workspace.top_down() {
            if top == x || self.forest.label(top).starts_with("Phi") {
                continue;
            }
            let roots = Self::rewrite_roots(x, y, *remerge);
            let mut top_features = self.head_features(top);
            let mut active = scope_probe;

            if probe.is_uninterpretable() {
                let unvalued: Vec<Feature> = top_features.iter().filter(|f| f.is_uninterpretable()).cloned().collect();
                active |= !unvalued.is_empty();
                for stale in unvalued.into_iter().filter(|f| f.name == probe.name && f != probe) {
                    self.rewrite(&roots, Rewrite::Feature { old: stale, new: Some(probe.clone()) });
                    self.emit(Event::Unification(probe.clone()));
                }
                top_features = self.head_features(top);
            }

            if top_features.iter().any(|f| f.satisfies(&goal)) {
                if !active || self.forest.is_unlabeled(top) {
                    continue;
                }
                if scope_probe {
                    let mut valued = false;
                    for unvalued in top_features.iter().filter(|f| f.is_uninterpretable()) {
                        if let Some(value) = interpretables.iter().find(|i| i.name == unvalued.name) {
                            self.rewrite(&roots, Rewrite::Feature { old: unvalued.clone(), new: Some(value.clone()) });
                            checked.push(unvalued.clone());
                            valued = true;
                        }
                    }
                    if valued && probe.name == "Top" {
                        self.mark_topic(top);
                    }
                    let copy = self.forest.deep_copy(top);
                    self.strip_head_feature(copy, "Copy");
                    *remerge = Some(Remerge { source: top, copy });
                    top_features = self.head_features(top);
                }
                if let Some(found) = top_features.iter().find(|f| f.satisfies(&goal)).cloned() {
                    let roots = Self::rewrite_roots(x, y, *remerge);
                    self.rewrite(&roots, Rewrite::Feature { old: probe.clone(), new: Some(found) });
                }
                checked.push(probe.clone());
                return;
            }

            if probe.is_valued_case() {
                checked.push(probe.clone());
                self.assign_case(y, probe, &roots);
                return;
            }

            if probe.is_uninterpretable() && probe.name == "Phi" && top_features.has("iPerson") {
                self.phi_passing(x, &top_features);
                return;
            }
        }
    }

    /// A checked topic is spelled with the `-wa` particle: the topic's whole
    /// projection is renamed.
    fn mark_topic(&mut self, top: NodeId) {
        let label = self.forest.label(self.head_leaf(top)).to_string();
        if label.ends_with("-wa") {
            return;
        }
        let marked = format!("{label}-wa");
        trace!("[check:topic] {label} -> {marked}");
        self.forest.relabel_projection(top, &marked);
    }

    /// Move a case value from its assigner to the nearest `uCase` in `y`.
    fn assign_case(&mut self, y: NodeId, case: &Feature, roots: &[NodeId]) {
        self.rewrite(roots, Rewrite::Feature { old: case.clone(), new: None });
        if let Some(target) = self.nearest_unvalued_case(y) {
            trace!("[check:case] {target} -> {case}");
            self.rewrite(roots, Rewrite::Feature { old: target, new: Some(case.clone()) });
        }
    }

    fn nearest_unvalued_case(&self, y: NodeId) -> Option<Feature> {
        let mut queue = VecDeque::from([y]);
        while let Some(id) = queue.pop_front() {
            match self.forest.children(id) {
                None => {
                    let found = self.forest.features(id).iter().find(|f| f.is_case() && f.is_uninterpretable());
                    if let Some(found) = found {
                        return Some(found.clone());
                    }
                }
                Some((left, right)) => match self.language {
                    Language::HeadInitial => queue.extend([left, right]),
                    Language::HeadFinal => queue.extend([right, left]),
                },
            }
        }
        None
    }

    /// Replace x's `uPhi` with the goal's phi features and its `uCase`.
    fn phi_passing(&mut self, x: NodeId, goal: &[Feature]) {
        let leaf = self.head_leaf(x);
        let mut features: Vec<Feature> = self
            .forest
            .features(leaf)
            .iter()
            .filter(|f| !(f.is_uninterpretable() && f.name == "Phi"))
            .cloned()
            .collect();
        for feature in goal {
            let takes = (feature.is_phi() && feature.is_interpretable()) || (feature.is_case() && feature.is_uninterpretable());
            if takes && !features.contains(feature) {
                features.push(feature.clone());
            }
        }
        self.rewrite(&[], Rewrite::FeatureList { leaf, features });
        self.emit(Event::PhiPassing);
        self.counters.inheritances += 1;
    }
}
