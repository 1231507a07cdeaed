//! Engine state and the derivation driver.
//!
//! `run` walks the target list from right to left. The first item becomes the
//! selected root; every later item is merged onto it. A bracketed sub-list is
//! derived on the sub-stream first and then merged onto the main spine as one
//! constituent.

use super::event::{CrashKind, Event, MergeKind, Tree};
use super::feature::{Feature, FeatureSet};
use super::forest::{Forest, NodeId, is_shared_label};
use super::lexicon::{Lexicon, is_determiner};
use super::metrics::{Counters, RunMetrics};
use super::workspace::{Rewrite, Workspace};
use crate::input::InputError;
use crate::{Language, Target};
use std::collections::HashSet;
use std::time::Instant;

/// How a derivation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing was merged: empty input or a single item.
    Empty,
    /// The final tree was transferred.
    Transferred,
    Crashed(CrashKind),
}

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub events: Vec<Event>,
    /// Snapshot of the main-stream root, if any item was consumed.
    pub root: Option<Tree>,
    pub outcome: Outcome,
    pub metrics: RunMetrics,
}

/// Selected root per stream.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Selected {
    pub main: Option<NodeId>,
    pub sub: Option<NodeId>,
}

/// One derivation engine. Reusable: every `run` starts from a clean state.
#[derive(Debug)]
pub struct Engine {
    pub(crate) language: Language,
    pub(crate) forest: Forest,
    pub(crate) lexicon: Lexicon,
    pub(crate) workspace: Workspace,
    pub(crate) selected: Selected,
    pub(crate) counters: Counters,
    pub(crate) log: Vec<Event>,
    /// Phase nodes already sent to Transfer.
    pub(crate) transferred: HashSet<NodeId>,
    /// Set while a feature-check merge is running; it never nests.
    pub(crate) in_feature_check: bool,
    /// The next target is a determiner phrase built on a sub-stream. It will
    /// fill the specifier, so a theta assigner's set does not raise a noun.
    pub(crate) specifier_pending: bool,
}

impl Engine {
    pub fn new(language: Language) -> Self {
        Engine {
            language,
            forest: Forest::new(),
            lexicon: Lexicon::new(),
            workspace: Workspace::new(),
            selected: Selected::default(),
            counters: Counters::default(),
            log: Vec::new(),
            transferred: HashSet::new(),
            in_feature_check: false,
            specifier_pending: false,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    fn reset(&mut self) {
        self.forest.clear();
        self.lexicon.reset();
        self.workspace.reset();
        self.selected = Selected::default();
        self.counters = Counters::default();
        self.log.clear();
        self.transferred.clear();
        self.in_feature_check = false;
        self.specifier_pending = false;
    }

    /// Derive `targets` and return the full log.
    ///
    /// Sub-streams nest one level; deeper nesting is rejected before anything
    /// is merged.
    pub fn run(&mut self, targets: &[Target]) -> Result<RunOutput, InputError> {
        if targets.iter().any(|t| t.depth() > 1) {
            return Err(InputError::NestedStream { line: 0 });
        }
        let started = Instant::now();
        self.reset();
        trace!("[run] language={} targets={}", self.language, crate::render_targets(targets));

        for (index, target) in targets.iter().enumerate().rev() {
            self.specifier_pending = index.checked_sub(1).is_some_and(|next| opens_determiner_phrase(&targets[next]));
            match target {
                Target::Item(key) => self.consume(key),
                Target::Stream(items) => self.consume_stream(items),
            }
        }
        self.specifier_pending = false;

        let outcome = self.finish();
        let counters = self.counters;
        self.log.extend(counters.events());

        let root = self.selected.main.map(|id| self.forest.snapshot(id));
        let events = std::mem::take(&mut self.log);
        let metrics = RunMetrics {
            total: started.elapsed(),
            counters,
            nodes: self.forest.len(),
            events: events.len(),
        };
        trace!("[run] outcome={outcome:?} events={} nodes={}", metrics.events, metrics.nodes);
        Ok(RunOutput { events, root, outcome, metrics })
    }

    pub(crate) fn fetch(&mut self, key: &str) -> NodeId {
        self.lexicon.fetch(key, &mut self.forest)
    }

    fn selected_root(&self) -> Option<NodeId> {
        if self.workspace.is_main() { self.selected.main } else { self.selected.sub }
    }

    fn set_selected_root(&mut self, id: NodeId) {
        if self.workspace.is_main() {
            self.selected.main = Some(id);
        } else {
            self.selected.sub = Some(id);
        }
    }

    fn consume(&mut self, key: &str) {
        let item = self.fetch(key);
        let next = match self.selected_root() {
            None => item,
            Some(spine) => self.external_merge(item, spine),
        };
        self.set_selected_root(next);
    }

    fn consume_stream(&mut self, items: &[Target]) {
        self.emit(Event::SubStream);
        self.workspace.start_sub_stream();
        self.selected.sub = None;

        for target in items.iter().rev() {
            match target {
                Target::Item(key) => self.consume(key),
                Target::Stream(_) => unreachable!("nested sub-streams are rejected by `run`"),
            }
        }

        let sub_root = self.selected.sub.take();
        self.workspace.end_sub_stream();
        self.emit(Event::MainStream);

        let Some(sub_root) = sub_root else {
            return;
        };
        let next = match self.selected.main {
            None => {
                self.workspace.push_main(sub_root);
                sub_root
            }
            Some(spine) => {
                self.log_merge(MergeKind::External, spine, sub_root);
                self.merge(spine, sub_root)
            }
        };
        self.selected.main = Some(next);
    }

    fn finish(&mut self) -> Outcome {
        let Some(root) = self.selected.main else {
            return Outcome::Empty;
        };
        if self.counters.merges == 0 {
            return Outcome::Empty;
        }

        if self.forest.is_unlabeled(root) {
            self.relabel_stack(root);
        }
        let tree = self.snapshot(root);
        if self.forest.is_unlabeled(root) {
            self.emit(Event::Crash { kind: CrashKind::Unlabeled, tree });
            return Outcome::Crashed(CrashKind::Unlabeled);
        }
        if self.carries_unchecked(root) {
            self.emit(Event::Crash { kind: CrashKind::UncheckedFeature, tree });
            return Outcome::Crashed(CrashKind::UncheckedFeature);
        }
        self.emit(Event::Transfer(Some(tree)));
        Outcome::Transferred
    }

    /// Whether a head `id` is built from still has an uninterpretable. A set
    /// labeled by shared features only reports what both sides agree on, so
    /// each side is asked separately.
    fn carries_unchecked(&self, id: NodeId) -> bool {
        match self.forest.children(id) {
            Some((left, right)) if is_shared_label(self.forest.label(id)) => {
                self.carries_unchecked(left) || self.carries_unchecked(right)
            }
            _ => self.head_features(id).has_uninterpretable(),
        }
    }

    // --- Shared helpers --------------------------------------------------------

    pub(crate) fn emit(&mut self, event: Event) {
        trace!("[event] {}", event.record());
        self.log.push(event);
    }

    pub(crate) fn log_merge(&mut self, kind: MergeKind, left: NodeId, right: NodeId) {
        let left = self.forest.label(left).to_string();
        let right = self.forest.label(right).to_string();
        self.emit(Event::Merge { kind, left, right });
    }

    pub(crate) fn head_features(&self, id: NodeId) -> Vec<Feature> {
        self.forest.head_features(id, self.language)
    }

    pub(crate) fn head_leaf(&self, id: NodeId) -> NodeId {
        self.forest.head_leaf(id, self.language)
    }

    pub(crate) fn snapshot(&self, id: NodeId) -> Tree {
        self.forest.snapshot(id)
    }

    /// Apply a rewrite. Feature-level rewrites reach every leaf under `roots`
    /// and under the active stack.
    pub(crate) fn rewrite(&mut self, roots: &[NodeId], rewrite: Rewrite) {
        let leaves = match &rewrite {
            Rewrite::Feature { .. } | Rewrite::FeatureName { .. } => self
                .forest
                .reachable_leaves(roots.iter().copied().chain(self.workspace.active().iter().copied())),
            Rewrite::Node { .. } | Rewrite::FeatureList { .. } => Vec::new(),
        };
        rewrite.apply(&mut self.forest, &leaves);
    }

    /// Rewrite the head leaf of `id` to its features minus `name`.
    pub(crate) fn strip_head_feature(&mut self, id: NodeId, name: &str) {
        let leaf = self.head_leaf(id);
        let current = self.forest.features(leaf);
        if !current.iter().any(|f| f.name == name) {
            return;
        }
        let features = current.iter().filter(|f| f.name != name).cloned().collect();
        self.rewrite(&[], Rewrite::FeatureList { leaf, features });
    }

    /// Add a plain marker feature to the head leaf of `id`.
    pub(crate) fn mark_head(&mut self, id: NodeId, name: &str) {
        let leaf = self.head_leaf(id);
        let mut features = self.forest.features(leaf).to_vec();
        if features.iter().any(|f| f.name == name) {
            return;
        }
        features.push(Feature::parse(name));
        self.rewrite(&[], Rewrite::FeatureList { leaf, features });
    }
}

/// A sub-stream that starts with a determiner or an expletive.
fn opens_determiner_phrase(target: &Target) -> bool {
    match target {
        Target::Stream(items) => {
            matches!(items.first(), Some(Target::Item(key)) if is_determiner(key) || key == "n_Expl")
        }
        Target::Item(_) => false,
    }
}
