use crate::engine::{Counters, Engine, Event, Outcome, Record, RunOutput, Tree};
use crate::input::{InputError, parse_examples};
use crate::{Language, Target, render_targets};
use std::time::Duration;

/// Options that affect a derivation run.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Starting language. Example files may switch it.
    pub language: Language,
    /// First sentence number to derive (inclusive). Batch input only.
    pub start: Option<u32>,
    /// Last sentence number to derive (inclusive). Batch input only.
    pub finish: Option<u32>,
}

impl Options {
    fn in_range(&self, number: u32) -> bool {
        self.start.is_none_or(|s| number >= s) && self.finish.is_none_or(|f| number <= f)
    }
}

/// Result of one derivation.
#[derive(Debug, Clone)]
pub struct Derivation {
    /// Sentence number, when the derivation came from an example file.
    pub number: Option<u32>,
    pub sentence: Option<String>,
    pub language: Language,
    /// The full log, counters last. Batch derivations start with a
    /// `Sentence` header.
    pub events: Vec<Event>,
    /// Final main-stream root.
    pub root: Option<Tree>,
    pub outcome: Outcome,
    pub counters: Counters,
    /// Wall time spent in the engine.
    pub elapsed: Duration,
}

impl Derivation {
    fn from_run(language: Language, run: RunOutput) -> Self {
        Derivation {
            number: None,
            sentence: None,
            language,
            events: run.events,
            root: run.root,
            outcome: run.outcome,
            counters: run.metrics.counters,
            elapsed: run.metrics.total,
        }
    }

    /// The log as string tuples.
    pub fn records(&self) -> Vec<Record> {
        self.events.iter().map(Event::record).collect()
    }

    /// Whether the log ends the derivation with a crash.
    pub fn crashed(&self) -> bool {
        self.events.iter().any(Event::is_crash)
    }
}

/// Derive `targets` in English mode.
///
/// # Example
/// ```
/// use popderive::{Outcome, Target, derive};
///
/// let out = derive(&Target::items(&["v*", "n", "v", "n"])).unwrap();
/// assert_eq!(out.outcome, Outcome::Transferred);
/// ```
pub fn derive(targets: &[Target]) -> Result<Derivation, InputError> {
    derive_with(targets, &Options::default())
}

/// Derive `targets` with explicit options. The sentence range is ignored.
pub fn derive_with(targets: &[Target], options: &Options) -> Result<Derivation, InputError> {
    let run = Engine::new(options.language).run(targets)?;
    Ok(Derivation::from_run(options.language, run))
}

/// Derive every numbered example in `text` that falls in the options' range.
pub fn derive_text(text: &str, options: &Options) -> Result<Vec<Derivation>, InputError> {
    let examples = parse_examples(text, options.language)?;
    let mut derivations = Vec::new();

    for example in examples.into_iter().filter(|e| options.in_range(e.number)) {
        let run = Engine::new(example.language).run(&example.targets)?;
        let mut derivation = Derivation::from_run(example.language, run);
        let header = Event::Sentence {
            number: example.number,
            text: example.sentence.clone(),
            target: render_targets(&example.targets),
        };
        derivation.events.insert(0, header);
        derivation.number = Some(example.number);
        derivation.sentence = Some(example.sentence);
        derivations.push(derivation);
    }
    Ok(derivations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CrashKind;

    const EXAMPLES: &str = "\
1 John saw Mary ['v*', 'n', 'v', 'n']
2 what did John see ['C_Q', 'v*', 'which', 'v', 'n']
Japanese
3 John-ga Mary-o mita ['C', 'v*', 'n', 'v', 'n']
";

    #[test]
    fn derive_reports_outcome_and_counters() {
        let out = derive(&Target::items(&["v*", "n", "v", "n"])).unwrap();
        assert_eq!(out.outcome, Outcome::Transferred);
        assert_eq!(out.counters, Counters { merges: 4, inheritances: 1, checks: 4 });
        assert_eq!(out.language, Language::HeadInitial);
        assert!(out.number.is_none());
        assert!(!out.crashed());
    }

    #[test]
    fn derive_rejects_deep_nesting() {
        let deep = vec![Target::Stream(vec![Target::Stream(Target::items(&["n"]))])];
        assert_eq!(derive(&deep).unwrap_err(), InputError::NestedStream { line: 0 });
    }

    #[test]
    fn batch_derivations_start_with_a_header() {
        let out = derive_text(EXAMPLES, &Options::default()).unwrap();
        assert_eq!(out.len(), 3);

        let first = out[0].records();
        assert_eq!(first[0].to_string(), "('1', 'John saw Mary', '['v*', 'n', 'v', 'n']')");
        assert_eq!(out[1].root.as_ref().map(Tree::label), Some("Q"));

        assert_eq!(out[2].language, Language::HeadFinal);
        assert_eq!(out[2].outcome, Outcome::Crashed(CrashKind::UncheckedFeature));
        assert!(out[2].crashed());
    }

    #[test]
    fn crashed_agrees_with_the_outcome() {
        for keys in [&["v*", "n", "v", "n"][..], &["v*", "root"], &["C_Q", "v*", "which", "v", "n"], &["n"]] {
            let out = derive(&Target::items(keys)).unwrap();
            assert_eq!(out.crashed(), matches!(out.outcome, Outcome::Crashed(_)), "{keys:?}");
        }
    }

    #[test]
    fn range_filter_is_inclusive() {
        let options = Options { start: Some(2), finish: Some(3), ..Options::default() };
        let numbers: Vec<Option<u32>> = derive_text(EXAMPLES, &options).unwrap().iter().map(|d| d.number).collect();
        assert_eq!(numbers, vec![Some(2), Some(3)]);

        let options = Options { finish: Some(1), ..Options::default() };
        assert_eq!(derive_text(EXAMPLES, &options).unwrap().len(), 1);
    }

    #[test]
    fn starting_language_comes_from_options() {
        let options = Options { language: Language::HeadFinal, ..Options::default() };
        let out = derive_text("1 x ['v*', 'root']", &options).unwrap();
        assert_eq!(out[0].language, Language::HeadFinal);
        assert!(out[0].events.iter().all(|e| !matches!(e, Event::DephaseV(_))));
    }
}
