use super::forest::NodeId;
use super::*;
use crate::{Language, Target};

fn run(language: Language, keys: &[&str]) -> RunOutput {
    Engine::new(language).run(&Target::items(keys)).expect("flat target list")
}

fn tags(out: &RunOutput) -> Vec<String> {
    out.events.iter().map(Event::tag).collect()
}

fn records(out: &RunOutput) -> Vec<String> {
    out.events.iter().map(|e| e.record().to_string()).collect()
}

fn last_before_counters(out: &RunOutput) -> &Event {
    out.events.iter().rev().find(|e| !e.is_counter()).expect("a non-counter event")
}

#[test]
fn transitive_clause_log() {
    let out = run(Language::HeadInitial, &["v*", "n", "v", "n"]);
    assert_eq!(
        tags(&out),
        vec![
            "Merge",
            "Label(None)",
            "Merge",
            "Label(None)",
            "Merge",
            "Unification",
            "Label(Head)",
            "Merge",
            "PassFs",
            "FeaturesPassed",
            "CheckedFeatures",
            "Label(Head)",
            "Label(Move)",
            "Label(Strengthened)",
            "Dephase v",
            "Transfer",
            "Transfer",
            "MRGOperations",
            "FTInheritanceOp",
            "FTCheckOp",
        ]
    );

    let records = records(&out);
    assert_eq!(records[0], "('Merge', 'merge v + n')");
    assert_eq!(records[2], "('Merge', 'merge (for labeling) n + _')");
    assert_eq!(records[4], "('Merge', 'merge n + _')");
    assert_eq!(records[8], "('PassFs', 'Pass Features v* to v')");
    assert_eq!(records[10], "('CheckedFeatures', '[uPerson4, uNumber4, uGender4, Case:Acc4]')");
    assert_eq!(records[12], "('Label(Move)', 'v')");
    assert_eq!(records[14], "('Dephase v', '[v+v* v+v* [n n [v n [v v n]]]]')");
    assert_eq!(records[15], "('Transfer', 'n')");
    assert_eq!(&records[17..], ["('MRGOperations', '4')", "('FTInheritanceOp', '1')", "('FTCheckOp', '4')"]);
    assert_eq!(out.outcome, Outcome::Transferred);

    // The object left a copy behind; only the raised one is pronounced.
    let root = out.root.expect("root");
    let copies: Vec<&Tree> = root.leaves().into_iter().filter(|l| l.features().has("Copy")).collect();
    assert_eq!(copies.len(), 1);
    assert_eq!(copies[0].label(), "n");
}

#[test]
fn unlabeled_sets_are_labeled_by_movement() {
    let inputs: [&[&str]; 4] = [
        &["v*", "n", "v", "n"],
        &["C", "v*", "n", "v", "n"],
        &["C_Q", "v*", "which", "v", "n"],
        &["C", "v*", "the", "n", "v", "n"],
    ];
    for keys in inputs {
        let out = run(Language::HeadInitial, keys);
        assert!(
            out.events.iter().any(|e| matches!(e, Event::Merge { kind: MergeKind::ForLabeling, left, .. } if left == "n")),
            "{keys:?}"
        );
        assert!(
            out.events.iter().any(|e| matches!(e, Event::Label { kind: LabelKind::Move, label, .. } if label == "v")),
            "{keys:?}"
        );
    }

    // Both nominals are inside the v* phase and valued accusative, so C
    // finds no active goal for its phi.
    let out = run(Language::HeadInitial, &["C", "v*", "n", "v", "n"]);
    assert_eq!(out.outcome, Outcome::Crashed(CrashKind::UncheckedFeature));
    assert_eq!(out.root.map(|r| r.label().to_string()).as_deref(), Some("C"));
}

#[test]
fn determiner_phrase_on_deck_blocks_the_move() {
    let targets = vec![
        Target::from("v*"),
        Target::Stream(Target::items(&["the", "n"])),
        Target::from("v"),
        Target::from("n"),
    ];
    let out = Engine::new(Language::HeadInitial).run(&targets).unwrap();
    assert!(out.events.iter().all(|e| !matches!(e, Event::Merge { kind: MergeKind::ForLabeling, .. })));
    assert!(out.events.iter().all(|e| !matches!(e, Event::Label { kind: LabelKind::Move, .. })));
    assert_eq!(out.outcome, Outcome::Transferred);
    assert_eq!(out.root.map(|r| r.label().to_string()).as_deref(), Some("v+v*"));
}

#[test]
fn wh_object_remerges_for_labeling() {
    let out = run(Language::HeadInitial, &["C_Q", "v*", "which", "v", "n"]);
    assert!(out.events.contains(&Event::PhiPassing));
    assert!(
        out.events
            .iter()
            .any(|e| matches!(e, Event::Merge { kind: MergeKind::ForLabeling, left, right } if left == "C_Q" && right == "which"))
    );
    assert!(
        out.events
            .iter()
            .any(|e| matches!(e, Event::Label { kind: LabelKind::SharedFeats, label, .. } if label == "Q"))
    );

    let root = out.root.expect("root");
    assert_eq!(root.label(), "Q");
    let which: Vec<&Tree> = root.leaves().into_iter().filter(|l| l.label() == "which").collect();
    assert_eq!(which.len(), 2);
    let pronounced = which.iter().filter(|l| !l.features().has("Copy")).count();
    assert_eq!(pronounced, 1);
}

#[test]
fn shared_label_root_still_reports_the_phase_head() {
    // Q only shows what the wh- phrase and C_Q agree on; C_Q's own phi
    // probes found no active goal.
    let out = run(Language::HeadInitial, &["C_Q", "v*", "which", "v", "n"]);
    assert_eq!(out.outcome, Outcome::Crashed(CrashKind::UncheckedFeature));
    assert_eq!(last_before_counters(&out).tag(), "Crash(Unchecked Feature)");
    assert!(out.events.iter().all(|e| !matches!(e, Event::Transfer(Some(t)) if t.label() == "Q")));

    let root = out.root.expect("root");
    let c = root.leaves().into_iter().find(|l| l.label() == "C_Q").expect("C_Q leaf");
    assert!(c.features().has_all(&["uPerson", "uNumber", "uGender"]));
    assert!(c.features().has("iQ"));
}

#[test]
fn topic_is_marked_and_remerged() {
    let out = run(Language::HeadInitial, &["C_Top", "v*", "n_Top", "v", "n"]);
    assert!(
        out.events
            .iter()
            .any(|e| matches!(e, Event::Label { kind: LabelKind::SharedFeats, label, .. } if label == "Top"))
    );
    assert!(out.events.contains(&Event::Merge {
        kind: MergeKind::ForLabeling,
        left: "C_Top".into(),
        right: "n_Top-wa".into(),
    }));

    let root = out.root.expect("root");
    assert_eq!(root.label(), "Top");
    let topics: Vec<&Tree> = root.leaves().into_iter().filter(|l| l.label() == "n_Top-wa").collect();
    assert_eq!(topics.len(), 2);
    assert_eq!(topics.iter().filter(|l| l.features().has("Copy")).count(), 1);
    assert!(topics.iter().all(|l| l.features().has("iScp") && !l.features().has("uScp")));
    assert!(root.leaves().iter().all(|l| l.label() != "n_Top"));
    assert_eq!(out.outcome, Outcome::Crashed(CrashKind::UncheckedFeature));
}

#[test]
fn null_complementizer_dephases() {
    let out = run(Language::HeadInitial, &["C_Null", "v*", "n", "v_be", "n"]);
    assert!(out.events.iter().any(|e| matches!(e, Event::DephaseDeleteC(_))));
    assert!(matches!(last_before_counters(&out), Event::Transfer(Some(_))));
    let root = out.root.expect("root");
    assert_eq!(root.label(), "v_be+v*");
    assert!(root.leaves().iter().all(|l| !l.features().has("Delete")));
}

#[test]
fn head_final_puts_non_heads_left() {
    let out = run(Language::HeadFinal, &["C", "v*", "n", "v", "n"]);
    let root = out.root.expect("root");
    assert_eq!(root.to_string(), "[C [v* [n [v n v] n] v*] C]");
    for branch in root.branches() {
        if let Tree::Branch { label, left, right } = branch {
            assert_eq!(right.label(), label, "head of {branch} is not on the right");
            assert_ne!(left.label(), label);
        }
    }
    assert!(out.events.iter().all(|e| !matches!(e, Event::DephaseV(_))));
    assert_eq!(out.outcome, Outcome::Crashed(CrashKind::UncheckedFeature));
}

#[test]
fn bare_root_dephases_and_crashes() {
    let out = run(Language::HeadInitial, &["v*", "root"]);
    assert!(out.events.iter().any(|e| matches!(e, Event::PassFeatures { from, .. } if from == "v*")));
    assert!(
        out.events
            .iter()
            .any(|e| matches!(e, Event::CheckedFeatures(fs) if fs.iter().any(|f| f.name == "Case")))
    );
    assert!(out.events.iter().any(|e| matches!(e, Event::DephaseV(_))));
    assert_eq!(last_before_counters(&out).tag(), "Crash(Unchecked Feature)");
    assert_eq!(out.root.map(|r| r.label().to_string()).as_deref(), Some("root+v*"));
}

#[test]
fn sub_stream_is_built_first() {
    let targets = vec![
        Target::from("C"),
        Target::Stream(Target::items(&["v*", "n", "v", "n"])),
        Target::from("n"),
    ];
    let out = Engine::new(Language::HeadInitial).run(&targets).unwrap();
    assert_eq!(out.events[0], Event::SubStream);

    let sub_end = out.events.iter().position(|e| *e == Event::MainStream).expect("main stream");
    // Inside the sub-stream v* transfers but does not dephase.
    let inside = &out.events[..sub_end];
    assert!(inside.iter().any(|e| matches!(e, Event::Transfer(_))));
    assert!(inside.iter().all(|e| !matches!(e, Event::DephaseV(_))));

    assert_eq!(
        out.events[sub_end + 1],
        Event::Merge { kind: MergeKind::External, left: "n".into(), right: "v*".into() }
    );
    assert_eq!(out.outcome, Outcome::Transferred);
    assert_eq!(out.root.map(|r| r.label().to_string()).as_deref(), Some("C"));
}

#[test]
fn empty_and_single_inputs() {
    let empty = run(Language::HeadInitial, &[]);
    assert_eq!(records(&empty), ["('MRGOperations', '0')", "('FTInheritanceOp', '0')", "('FTCheckOp', '0')"]);

    let single = run(Language::HeadFinal, &["v*"]);
    assert_eq!(tags(&single), ["MRGOperations", "FTInheritanceOp", "FTCheckOp"]);
}

#[test]
fn unknown_keys_act_as_roots() {
    let out = run(Language::HeadInitial, &["v*", "walk"]);
    assert_eq!(out.root.map(|r| r.label().to_string()).as_deref(), Some("walk+v*"));
}

#[test]
fn runs_are_deterministic() {
    let inputs: [&[&str]; 3] =
        [&["v*", "n", "v", "n"], &["C_Q", "v*", "which", "v", "n"], &["C", "v*", "n", "v", "n"]];
    for keys in inputs {
        let first = run(Language::HeadInitial, keys);
        let second = run(Language::HeadInitial, keys);
        assert_eq!(first.events, second.events, "{keys:?}");
        assert_eq!(first.root, second.root);
    }
}

#[test]
fn stack_shrinks_only_on_transfer() {
    let mut engine = Engine::new(Language::HeadInitial);
    let mut spine = engine.fetch("n");
    for key in ["v", "n", "v*"] {
        let before: Vec<NodeId> = engine.workspace.active().to_vec();
        let logged = engine.log.len();
        let item = engine.fetch(key);
        spine = engine.external_merge(item, spine);
        let transferred = engine.log[logged..].iter().any(|e| matches!(e, Event::Transfer(_)));
        if !transferred {
            assert!(before.iter().all(|id| engine.workspace.active().contains(id)), "{key}");
        }
    }
    assert_eq!(engine.forest.label(spine), "v+v*");
}

#[test]
fn counters_match_the_log() {
    let out = run(Language::HeadInitial, &["C_Q", "v*", "which", "v", "n"]);
    let passes = out.events.iter().filter(|e| matches!(e, Event::PassFeatures { .. } | Event::PhiPassing)).count();
    let checked: usize = out
        .events
        .iter()
        .map(|e| match e {
            Event::CheckedFeatures(fs) => fs.len(),
            _ => 0,
        })
        .sum();
    assert_eq!(out.metrics.counters.inheritances as usize, passes);
    assert_eq!(out.metrics.counters.checks as usize, checked);
    assert_eq!(out.metrics.events, out.events.len());
}
