//! Lexicon and feature counters.
//!
//! The lexicon maps a lexical key to a feature template. Fetching an item
//! copies the template and stamps every *counted* feature with a fresh index,
//! so that two `n`s in one derivation never share `uCase`:
//!
//! ```text
//! fetch("n")  -> n{iPerson1, iNumber1, iGender1, MergeF, uCase1, iTheta, Head, iN}
//! fetch("v")  -> v{MergeF, Root2, iv}
//! fetch("n")  -> n{iPerson2, iNumber2, iGender2, MergeF, uCase3, iTheta, Head, iN}
//! ```
//!
//! Phi features share one counter; every other counted feature shares the
//! other. Each counter moves at most once per fetch.

use super::feature::Feature;
use super::forest::{Forest, NodeId};
use once_cell::sync::Lazy;
use std::collections::HashMap;

const ROOT_KEY: &str = "root";

static LEXICON: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    HashMap::from([
        ("v*", &["uPerson", "uNumber", "uGender", "MergeF", "Head", "Case:Acc"][..]),
        ("C", &["uPerson", "uNumber", "uGender", "MergeF", "Head", "Case:Nom"][..]),
        ("P_in", &["uPerson", "uNumber", "uGender", "MergeF", "Head", "Case:Dat"][..]),
        ("that", &["uPerson", "uNumber", "uGender", "MergeF", "Head", "iC", "Case:Nom"][..]),
        ("C_Q", &["uPerson", "uNumber", "uGender", "MergeF", "Head", "Case:Nom", "uQ", "iScp", "iC"][..]),
        ("C_Top", &["uPerson", "uNumber", "uGender", "MergeF", "Head", "Case:Nom", "uTop", "iScp", "iC"][..]),
        ("C_Null", &["uPerson", "uNumber", "uGender", "MergeF", "Head", "Case:Nom", "Delete", "iC"][..]),
        ("v", &["MergeF", "Root", "iv"][..]),
        ("v_be", &["MergeF", "iv", "Root"][..]),
        ("vUnerg", &["MergeF", "iv", "Root"][..]),
        ("v~", &["MergeF", "ThetaAgr"][..]),
        (
            "n_Top",
            &["iPerson:", "iNumber:", "iGender:", "MergeF", "uCase", "iTheta", "Head", "iN", "iD", "iTop", "uScp"][..],
        ),
        ("n", &["iPerson:", "iNumber:", "iGender:", "MergeF", "uCase", "iTheta", "Head", "iN"][..]),
        ("n_Expl", &["uPerson", "uNumber", "uGender", "MergeF", "Head", "iN"][..]),
        ("there", &["MergeF", "ThetaAgr"][..]),
        ("the", &["MergeF", "Head", "uPhi", "iD"][..]),
        ("a", &["MergeF", "Head", "uPhi", "iD"][..]),
        ("D", &["MergeF", "Head", "uPhi", "iD"][..]),
        ("Q", &["MergeF", "Head", "uPhi", "iQ", "uScp"][..]),
        ("which", &["MergeF", "Head", "uPhi", "iQ", "uScp"][..]),
        (ROOT_KEY, &["MergeF", "Root"][..]),
    ])
});

/// Features that get a fresh index from the general counter.
pub const COUNTED_FEATURES: &[&str] =
    &["uPerson", "uNumber", "uGender", "Case:Nom", "Case:Acc", "Case:Dat", "Root", "uCase", "iTop", "uScp", "iQ"];

/// Features that get a fresh index from the phi counter.
pub const COUNTED_PHI_FEATURES: &[&str] = &["iPerson:", "iNumber:", "iGender:"];

/// Heads whose merge closes a phase.
pub const PHASE_HEADS: &[&str] = &["v*", "C", "C_Q", "that", "C_Null", "C_Top", "in"];

/// Labels that adjoin rather than project.
pub const ADJUNCT_LABELS: &[&str] = &["P_in", "in"];

pub const DET_HEADS: &[&str] = &["the", "a", "D"];

/// Heads that assign a theta role to the phrase merged next to them.
pub const THETA_ASSIGNERS: &[&str] = &["v*", "vUnerg", "v", "v_be"];

pub fn is_phase_head(label: &str) -> bool {
    PHASE_HEADS.contains(&label)
}

pub fn is_adjunct_label(label: &str) -> bool {
    ADJUNCT_LABELS.contains(&label)
}

pub fn is_determiner(label: &str) -> bool {
    DET_HEADS.contains(&label)
}

pub fn is_theta_assigner(label: &str) -> bool {
    THETA_ASSIGNERS.contains(&label)
}

/// Display name of a lexical key.
pub fn display_label(key: &str) -> &str {
    match key {
        "C_Null" => "C",
        "n_Expl" => "n",
        other => other,
    }
}

/// Template for `key`; unknown keys behave like `root`.
pub fn template(key: &str) -> &'static [&'static str] {
    LEXICON.get(key).or_else(|| LEXICON.get(ROOT_KEY)).copied().unwrap_or(&[])
}

/// The two feature counters. One per engine, reset with it.
#[derive(Debug, Default, Clone)]
pub struct Lexicon {
    phi_counter: u32,
    feature_counter: u32,
}

impl Lexicon {
    pub fn new() -> Self {
        Lexicon::default()
    }

    pub fn reset(&mut self) {
        *self = Lexicon::default();
    }

    pub fn counters(&self) -> (u32, u32) {
        (self.phi_counter, self.feature_counter)
    }

    /// Build a fresh leaf for `key` in `forest`.
    pub fn fetch(&mut self, key: &str, forest: &mut Forest) -> NodeId {
        let texts = template(key);
        let counts = |set: &[&str]| texts.iter().any(|t| set.contains(t));

        if counts(COUNTED_FEATURES) {
            self.feature_counter += 1;
        }
        if counts(COUNTED_PHI_FEATURES) {
            self.phi_counter += 1;
        }

        let features = texts
            .iter()
            .map(|text| {
                let feature = Feature::parse(text);
                if COUNTED_FEATURES.contains(text) {
                    feature.with_index(self.feature_counter)
                } else if COUNTED_PHI_FEATURES.contains(text) {
                    feature.with_index(self.phi_counter)
                } else {
                    feature
                }
            })
            .collect();

        let label = display_label(key);
        trace!("[lexicon:fetch] key={key:?} label={label:?} counters={:?}", self.counters());
        forest.leaf(label, features)
    }
}
