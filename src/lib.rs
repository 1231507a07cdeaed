#[macro_use]
mod macros;
mod api;
mod engine;
mod input;

pub use api::{Derivation, Options, derive, derive_text, derive_with};
pub use engine::{
    CounterKind, Counters, CrashKind, Engine, Event, Feature, FeatureClass, FeatureSet, LabelKind, MergeKind, Outcome,
    Polarity, Record, RunMetrics, RunOutput, Tree,
};
pub use input::{Example, InputError, parse_examples, parse_target_list};

use std::fmt;

// --- Core types ---------------------------------------------------------------

/// Word-order parameter. The two modes differ only in where heads go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    /// English: heads precede their complements.
    #[default]
    HeadInitial,
    /// Japanese: heads follow their complements.
    HeadFinal,
}

impl Language {
    /// Accepts `english`/`head-initial` and `japanese`/`head-final`, any case.
    pub fn from_name(name: &str) -> Option<Language> {
        match name.to_ascii_lowercase().as_str() {
            "english" | "head-initial" | "headinitial" => Some(Language::HeadInitial),
            "japanese" | "head-final" | "headfinal" => Some(Language::HeadFinal),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Language::HeadInitial => "English",
            Language::HeadFinal => "Japanese",
        })
    }
}

/// One entry of a target list: a lexical key or a bracketed sub-stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Item(String),
    Stream(Vec<Target>),
}

impl Target {
    /// A flat target list.
    pub fn items(keys: &[&str]) -> Vec<Target> {
        keys.iter().map(|&k| Target::from(k)).collect()
    }

    /// Nesting depth: `0` for an item, `1` for a flat sub-stream.
    pub fn depth(&self) -> usize {
        match self {
            Target::Item(_) => 0,
            Target::Stream(items) => 1 + items.iter().map(Target::depth).max().unwrap_or(0),
        }
    }
}

impl From<&str> for Target {
    fn from(key: &str) -> Self {
        Target::Item(key.to_string())
    }
}

/// Normalized list form: `'C'` for an item, `[...]` for a sub-stream.
impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Item(key) => write!(f, "'{key}'"),
            Target::Stream(items) => write!(f, "{}", render_targets(items)),
        }
    }
}

/// Render a whole target list: `['C', ['v*', 'n'], 'n']`.
pub fn render_targets(targets: &[Target]) -> String {
    let parts: Vec<String> = targets.iter().map(ToString::to_string).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_names() {
        assert_eq!(Language::from_name("Japanese"), Some(Language::HeadFinal));
        assert_eq!(Language::from_name("head-initial"), Some(Language::HeadInitial));
        assert_eq!(Language::from_name("klingon"), None);
        assert_eq!(Language::default().to_string(), "English");
    }

    #[test]
    fn targets_render_and_measure() {
        let targets = vec![Target::from("C"), Target::Stream(Target::items(&["v*", "n"])), Target::from("n")];
        assert_eq!(render_targets(&targets), "['C', ['v*', 'n'], 'n']");
        assert_eq!(targets.iter().map(Target::depth).max(), Some(1));
        assert_eq!(Target::Stream(vec![Target::Stream(Vec::new())]).depth(), 2);
    }
}
