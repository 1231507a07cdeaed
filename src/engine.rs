//! Derivation engine.
//!
//! The engine builds one labeled binary tree from an ordered list of lexical
//! keys. It is split into focused submodules under `src/engine/`, all working
//! on a single [`Engine`] value that owns the arena, the stacks, the counters
//! and the event log.
//!
//! ## How the parts work together
//!
//! ```text
//! targets (right to left)
//!   │
//!   ├─ Lexicon::fetch ─────────────── fresh leaf, counted features stamped
//!   │   (lexicon.rs)
//!   v
//! Engine::merge (merger.rs)
//!   1. push x, y                      (workspace.rs)
//!   2. inherit + check                (checker.rs)
//!        - phase head passes phi to a Root below it
//!        - probes value against goals on the stack
//!        - uQ / uTop pick a remerge candidate
//!   3. determine_label / order        (labeler.rs, merger.rs)
//!   4. remerge for labeling (Q, Top,  (merger.rs)
//!      or an unlabeled set's noun)
//!   5. label unlabeled stack entries  (labeler.rs)
//!   6. phase head? -> transfer        (transfer.rs)
//!   v
//! Engine::finish (driver.rs) ── Transfer | Crash(..), then the counters
//! ```
//!
//! ## Responsibilities by module
//!
//! - `feature.rs`: parsed features with polarity, family flags and index.
//! - `forest.rs`: the constituent arena, head projection, snapshots.
//! - `lexicon.rs`: static lexicon, label sets and the two feature counters.
//! - `workspace.rs`: main and sub-stream stacks; the `Rewrite` operations.
//! - `checker.rs`: inheritance, probe/goal matching, unification, case.
//! - `labeler.rs`: head labeling and labeling of unlabeled sets.
//! - `merger.rs`: merge itself, child order, remerge for labeling.
//! - `transfer.rs`: phase transfer, dephasing, last-resort remerge.
//! - `driver.rs`: `Engine` state and `run`.
//! - `event.rs`: typed log events and their string rendering.
//! - `metrics.rs`: operation counters and run timing.
//!
//! ## Public surface
//!
//! - [`Engine`] and [`RunOutput`]
//! - [`Event`], [`Record`], [`Tree`] for reading the log
//! - [`Feature`] for inspecting leaves
//!
//! ## Debugging
//!
//! Set `POP_DEBUG_DERIVE=1` to print merge, check, labeling and transfer
//! traces to stderr.

use once_cell::sync::Lazy;

#[path = "engine/checker.rs"]
mod checker;
#[path = "engine/driver.rs"]
mod driver;
#[path = "engine/event.rs"]
mod event;
#[path = "engine/feature.rs"]
mod feature;
#[path = "engine/forest.rs"]
mod forest;
#[path = "engine/labeler.rs"]
mod labeler;
#[path = "engine/lexicon.rs"]
mod lexicon;
#[path = "engine/merger.rs"]
mod merger;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/transfer.rs"]
mod transfer;
#[path = "engine/workspace.rs"]
mod workspace;

#[cfg(test)]
#[path = "engine/tests.rs"]
mod tests;

pub use driver::{Engine, Outcome, RunOutput};
pub use event::{CounterKind, CrashKind, Event, LabelKind, MergeKind, Record, Tree};
pub use feature::{Feature, FeatureClass, FeatureSet, Polarity};
pub use metrics::{Counters, RunMetrics};

static DEBUG: Lazy<bool> = Lazy::new(|| std::env::var_os("POP_DEBUG_DERIVE").is_some());

pub(crate) fn debug_enabled() -> bool {
    *DEBUG
}
