//! Derivation counters and run timing.
//!
//! The three operation counters are part of the event log: every derivation
//! ends with `MRGOperations`, `FTInheritanceOp` and `FTCheckOp`. Timing is
//! not; it is reported next to the log by callers that want it.
//!
//! ## Design notes
//!
//! - Counters are per-engine and reset at the start of every `run`.
//! - `RunMetrics::total` is wall time and is never written to the log, so two
//!   runs of the same input still produce identical logs.

use super::event::{CounterKind, Event};
use std::time::Duration;

// --- Counters ----------------------------------------------------------------

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counters {
    /// Branches built (external merge, remerge, last-resort remerge).
    pub merges: u32,
    /// Feature passing from a phase head, plus uPhi valuation.
    pub inheritances: u32,
    /// Features checked against a goal or assigned as case.
    pub checks: u32,
}

impl Counters {
    /// The closing counter events, in log order.
    pub fn events(&self) -> [Event; 3] {
        [
            Event::Counter { counter: CounterKind::Merges, value: self.merges },
            Event::Counter { counter: CounterKind::Inheritances, value: self.inheritances },
            Event::Counter { counter: CounterKind::Checks, value: self.checks },
        ]
    }
}

// --- Metrics -----------------------------------------------------------------

#[derive(Debug, Default, Clone)]
pub struct RunMetrics {
    /// Total elapsed time for [`Engine::run`](super::Engine::run).
    pub total: Duration,
    /// Counter totals at the end of the run.
    pub counters: Counters,
    /// Number of arena nodes allocated.
    pub nodes: usize,
    /// Number of events logged, counters included.
    pub events: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_events_keep_order() {
        let counters = Counters { merges: 3, inheritances: 1, checks: 4 };
        let tags: Vec<String> = counters.events().iter().map(|e| e.record().to_string()).collect();
        assert_eq!(tags, vec!["('MRGOperations', '3')", "('FTInheritanceOp', '1')", "('FTCheckOp', '4')"]);
    }
}
