//! Typed derivation log.
//!
//! The engine appends [`Event`]s while it works; nothing else leaves a
//! derivation. Rendering is a separate pass: [`Event::record`] turns an event
//! into the flat `(tag, payload)` / `(tag, arg, payload)` string tuples that
//! downstream consumers read.
//!
//! Trees inside events are owned [`Tree`] snapshots taken at emission time, so
//! later rewrites of the arena do not change what an old event says.

use super::feature::{Feature, FeatureSet};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tree {
    Leaf { label: String, features: Vec<Feature> },
    Branch { label: String, left: Box<Tree>, right: Box<Tree> },
}

impl Tree {
    pub fn label(&self) -> &str {
        match self {
            Tree::Leaf { label, .. } | Tree::Branch { label, .. } => label,
        }
    }

    /// Leaves in left-to-right order.
    pub fn leaves(&self) -> Vec<&Tree> {
        let mut out = Vec::new();
        self.walk(&mut |t| {
            if matches!(t, Tree::Leaf { .. }) {
                out.push(t);
            }
        });
        out
    }

    /// Branches in pre-order.
    pub fn branches(&self) -> Vec<&Tree> {
        let mut out = Vec::new();
        self.walk(&mut |t| {
            if matches!(t, Tree::Branch { .. }) {
                out.push(t);
            }
        });
        out
    }

    fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Tree)) {
        visit(self);
        if let Tree::Branch { left, right, .. } = self {
            left.walk(visit);
            right.walk(visit);
        }
    }

    pub fn features(&self) -> &[Feature] {
        match self {
            Tree::Leaf { features, .. } => features,
            Tree::Branch { .. } => &[],
        }
    }

    /// Bracketed rendering with leaf features: `[v* v*{iPerson2} n{iN}]`.
    pub fn full(&self) -> String {
        match self {
            Tree::Leaf { label, features } => format!("{label}{{{}}}", features.render()),
            Tree::Branch { label, left, right } => format!("[{label} {} {}]", left.full(), right.full()),
        }
    }
}

/// Featureless bracketed rendering: `[v* v* [n n [v v n]]]`.
impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tree::Leaf { label, .. } => f.write_str(label),
            Tree::Branch { label, left, right } => write!(f, "[{label} {left} {right}]"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeKind {
    External,
    ForLabeling,
    FeatureCheck,
    DueToUf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Head,
    SharedFeats,
    Move,
    Strengthened,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrashKind {
    Unlabeled,
    UncheckedFeature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    Merges,
    Inheritances,
    Checks,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Header written before a derivation read from an input file.
    Sentence { number: u32, text: String, target: String },
    Merge { kind: MergeKind, left: String, right: String },
    Label { kind: LabelKind, label: String, tree: Option<Tree> },
    PassFeatures { from: String, to: String },
    FeaturesPassed(Vec<Feature>),
    CheckedFeatures(Vec<Feature>),
    Unification(Feature),
    PhiPassing,
    Transfer(Option<Tree>),
    DephaseV(Tree),
    DephaseDeleteC(Tree),
    SubStream,
    MainStream,
    Crash { kind: CrashKind, tree: Tree },
    Counter { counter: CounterKind, value: u32 },
}

/// String form of one log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub tag: String,
    pub arg: Option<String>,
    pub payload: String,
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.arg {
            Some(arg) => write!(f, "('{}', '{}', '{}')", self.tag, arg, self.payload),
            None => write!(f, "('{}', '{}')", self.tag, self.payload),
        }
    }
}

fn feature_list(features: &[Feature]) -> String {
    format!("[{}]", features.render())
}

fn optional_tree(tree: &Option<Tree>) -> String {
    tree.as_ref().map_or_else(|| "None".to_string(), ToString::to_string)
}

impl Event {
    pub fn tag(&self) -> String {
        match self {
            Event::Sentence { number, .. } => number.to_string(),
            Event::Merge { .. } => "Merge".into(),
            Event::Label { kind, .. } => match kind {
                LabelKind::Head => "Label(Head)".into(),
                LabelKind::SharedFeats => "Label(SharedFeats)".into(),
                LabelKind::Move => "Label(Move)".into(),
                LabelKind::Strengthened => "Label(Strengthened)".into(),
                LabelKind::None => "Label(None)".into(),
            },
            Event::PassFeatures { .. } => "PassFs".into(),
            Event::FeaturesPassed(_) => "FeaturesPassed".into(),
            Event::CheckedFeatures(_) => "CheckedFeatures".into(),
            Event::Unification(_) => "Unification".into(),
            Event::PhiPassing => "PhiPassing".into(),
            Event::Transfer(_) => "Transfer".into(),
            Event::DephaseV(_) => "Dephase v".into(),
            Event::DephaseDeleteC(_) => "Dephase(DeleteC)".into(),
            Event::SubStream => "SubStream".into(),
            Event::MainStream => "MainStream".into(),
            Event::Crash { kind: CrashKind::Unlabeled, .. } => "Crash(Unlabeled)".into(),
            Event::Crash { kind: CrashKind::UncheckedFeature, .. } => "Crash(Unchecked Feature)".into(),
            Event::Counter { counter, .. } => match counter {
                CounterKind::Merges => "MRGOperations".into(),
                CounterKind::Inheritances => "FTInheritanceOp".into(),
                CounterKind::Checks => "FTCheckOp".into(),
            },
        }
    }

    pub fn record(&self) -> Record {
        let tag = self.tag();
        let (arg, payload) = match self {
            Event::Sentence { text, target, .. } => (Some(text.clone()), target.clone()),
            Event::Merge { kind, left, right } => {
                let payload = match kind {
                    MergeKind::External => format!("merge {left} + {right}"),
                    MergeKind::ForLabeling => format!("merge (for labeling) {left} + {right}"),
                    MergeKind::FeatureCheck => format!("merge (Feature Check) {left} + {right}"),
                    MergeKind::DueToUf => format!("merge (due to uF) {left} + {right}"),
                };
                (None, payload)
            }
            Event::Label { label, tree, .. } => {
                (None, tree.as_ref().map_or_else(|| label.clone(), ToString::to_string))
            }
            Event::PassFeatures { from, to } => (None, format!("Pass Features {from} to {to}")),
            Event::FeaturesPassed(features) | Event::CheckedFeatures(features) => (None, feature_list(features)),
            Event::Unification(feature) => (None, feature.to_string()),
            Event::PhiPassing => (None, String::new()),
            Event::Transfer(tree) => (None, optional_tree(tree)),
            Event::DephaseV(tree) | Event::DephaseDeleteC(tree) | Event::Crash { tree, .. } => {
                (None, tree.to_string())
            }
            Event::SubStream | Event::MainStream => (None, String::new()),
            Event::Counter { value, .. } => (None, value.to_string()),
        };
        Record { tag, arg, payload }
    }

    pub fn is_crash(&self) -> bool {
        matches!(self, Event::Crash { .. })
    }

    pub fn is_counter(&self) -> bool {
        matches!(self, Event::Counter { .. })
    }
}
