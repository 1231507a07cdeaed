//! Features: the atomic attributes carried by leaves.
//!
//! A feature is written the way the lexicon writes it:
//!
//! ```text
//!   u Person            -> uninterpretable, unvalued
//!   i Person :          -> interpretable, empty value
//!   Case : Nom 3        -> plain, valued, index 3
//!   ^ ^^^^^^ ^^^ ^
//!   | name   |   index (trailing digits, 0 = none)
//!   polarity value
//! ```
//!
//! Polarity and family are decoded once, when the feature is built, so the
//! checker never has to look at prefixes again.

use bitflags::bitflags;
use std::fmt;

/// Interpretable (`i…`), uninterpretable (`u…`) or neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polarity {
    Interpretable,
    Uninterpretable,
    Plain,
}

bitflags! {
    /// Coarse feature families, derived from the feature name.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FeatureClass: u8 {
        const PHI        = 1 << 0;
        const CASE       = 1 << 1;
        const SCOPE      = 1 << 2;
        const STRUCTURAL = 1 << 3;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Feature {
    pub polarity: Polarity,
    pub name: String,
    pub value: Option<String>,
    /// Counter index; `0` means the feature was never counted.
    pub index: u32,
    class: FeatureClass,
}

fn classify(name: &str) -> FeatureClass {
    match name {
        "Person" | "Number" | "Gender" | "Phi" => FeatureClass::PHI,
        "Case" => FeatureClass::CASE,
        "Q" | "Top" | "Scp" => FeatureClass::SCOPE,
        "Head" | "MergeF" | "Copy" | "Root" | "Delete" | "ThetaAgr" => FeatureClass::STRUCTURAL,
        _ => FeatureClass::empty(),
    }
}

impl Feature {
    pub fn new(polarity: Polarity, name: impl Into<String>, value: Option<String>, index: u32) -> Self {
        let name = name.into();
        let class = classify(&name);
        Feature { polarity, name, value, index, class }
    }

    /// Parse the lexicon notation (`uPerson`, `iPerson:`, `Case:Acc3`, `Head`).
    pub fn parse(text: &str) -> Self {
        let (polarity, rest) = if let Some(rest) = text.strip_prefix('u') {
            (Polarity::Uninterpretable, rest)
        } else if let Some(rest) = text.strip_prefix('i') {
            (Polarity::Interpretable, rest)
        } else {
            (Polarity::Plain, text)
        };

        let body = rest.trim_end_matches(|c: char| c.is_ascii_digit());
        let index = rest[body.len()..].parse().unwrap_or(0);

        let (name, value) = match body.split_once(':') {
            Some((name, "")) => (name, None),
            Some((name, value)) => (name, Some(value.to_string())),
            None => (body, None),
        };

        Feature::new(polarity, name, value, index)
    }

    pub fn with_index(mut self, index: u32) -> Self {
        self.index = index;
        self
    }

    pub fn class(&self) -> FeatureClass {
        self.class
    }

    pub fn is_uninterpretable(&self) -> bool {
        self.polarity == Polarity::Uninterpretable
    }

    pub fn is_interpretable(&self) -> bool {
        self.polarity == Polarity::Interpretable
    }

    pub fn is_phi(&self) -> bool {
        self.class.contains(FeatureClass::PHI)
    }

    pub fn is_case(&self) -> bool {
        self.class.contains(FeatureClass::CASE)
    }

    /// `Case:Nom`, `Case:Acc`, ...: a case value waiting to be assigned.
    pub fn is_valued_case(&self) -> bool {
        self.is_case() && self.value.is_some()
    }

    pub fn is_scope(&self) -> bool {
        self.class.contains(FeatureClass::SCOPE)
    }

    pub fn is_structural(&self) -> bool {
        self.class.contains(FeatureClass::STRUCTURAL)
    }

    pub fn is_erg(&self) -> bool {
        self.name == "UErg"
    }

    /// Phi-like features decide who inherits: unvalued person, number or
    /// gender, a case value, or an ergative marker.
    pub fn is_phi_like(&self) -> bool {
        (self.is_uninterpretable() && matches!(self.name.as_str(), "Person" | "Number" | "Gender"))
            || self.is_valued_case()
            || self.is_erg()
    }

    /// The same feature with the opposite polarity. Plain features stay plain.
    pub fn polarity_flip(&self) -> Feature {
        let polarity = match self.polarity {
            Polarity::Interpretable => Polarity::Uninterpretable,
            Polarity::Uninterpretable => Polarity::Interpretable,
            Polarity::Plain => Polarity::Plain,
        };
        Feature::new(polarity, self.name.clone(), self.value.clone(), 0)
    }

    /// The interpretable counterpart a probe looks for.
    pub fn goal(&self) -> Feature {
        Feature::new(Polarity::Interpretable, self.name.clone(), self.value.clone(), 0)
    }

    /// True when `self` satisfies `pattern`: same name, plus whatever polarity
    /// and value the pattern pins down. The pattern's index is ignored.
    pub fn satisfies(&self, pattern: &Feature) -> bool {
        self.name == pattern.name
            && (pattern.polarity == Polarity::Plain || self.polarity == pattern.polarity)
            && pattern.value.as_ref().is_none_or(|v| self.value.as_ref() == Some(v))
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.polarity {
            Polarity::Interpretable => f.write_str("i")?,
            Polarity::Uninterpretable => f.write_str("u")?,
            Polarity::Plain => {}
        }
        f.write_str(&self.name)?;
        if let Some(value) = &self.value {
            write!(f, ":{value}")?;
        }
        if self.index != 0 {
            write!(f, "{}", self.index)?;
        }
        Ok(())
    }
}

/// Queries over a leaf's feature list. Patterns use lexicon notation and are
/// matched with [`Feature::satisfies`].
pub trait FeatureSet {
    fn find(&self, pattern: &str) -> Option<&Feature>;
    fn has(&self, pattern: &str) -> bool {
        self.find(pattern).is_some()
    }
    fn has_all(&self, patterns: &[&str]) -> bool {
        patterns.iter().all(|p| self.has(p))
    }
    /// Interpretable person, number and gender.
    fn has_full_phi(&self) -> bool {
        self.has_all(&["iPerson", "iNumber", "iGender"])
    }
    /// Unvalued person, number and gender.
    fn has_full_uphi(&self) -> bool {
        self.has_all(&["uPerson", "uNumber", "uGender"])
    }
    fn has_uninterpretable(&self) -> bool;
    fn shared_with(&self, other: &[Feature]) -> Vec<Feature>;
    fn render(&self) -> String;
}

impl FeatureSet for [Feature] {
    fn find(&self, pattern: &str) -> Option<&Feature> {
        let pattern = Feature::parse(pattern);
        self.iter().find(|f| f.satisfies(&pattern))
    }

    fn has_uninterpretable(&self) -> bool {
        self.iter().any(Feature::is_uninterpretable)
    }

    fn shared_with(&self, other: &[Feature]) -> Vec<Feature> {
        self.iter().filter(|f| other.contains(f)).cloned().collect()
    }

    fn render(&self) -> String {
        self.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
    }
}

/// Parse a whole template, keeping its order.
pub fn parse_all(texts: &[&str]) -> Vec<Feature> {
    texts.iter().map(|t| Feature::parse(t)).collect()
}
