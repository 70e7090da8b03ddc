// End-to-end label planning scenarios over rule documents.
use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;

use labelbot_rules::{
    parse_rules, plan, Action, CheckStatus, Condition, FactField, Orchestrator, PullRequestFact,
    Rule, RuleRegistry, RuleSet,
};

const DCO_RULES: &str = r#"
pull_request_rules:
  - name: dco-fail
    conditions:
      - -status-success=DCO
    actions:
      label:
        remove: [dco-passed]
        add: [needs-dco]
  - name: dco-pass
    conditions:
      - status-success=DCO
    actions:
      label:
        remove: [needs-dco]
        add: [dco-passed]
"#;

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|item| item.to_string()).collect()
}

fn dco_rules() -> RuleSet {
    RuleSet::new(parse_rules(DCO_RULES).expect("dco rules"))
}

#[test]
fn dco_failure_requests_signoff() {
    let fact = PullRequestFact::builder("master")
        .check("DCO", CheckStatus::Failure)
        .labels(["dco-passed", "kind/feature"])
        .build();

    let plan = plan(&dco_rules(), &fact);

    assert_eq!(plan.to_add, set(&["needs-dco"]));
    assert_eq!(plan.to_remove, set(&["dco-passed"]));
}

#[test]
fn dco_failure_without_stale_label_only_adds() {
    let fact = PullRequestFact::builder("master")
        .check("DCO", CheckStatus::Failure)
        .build();

    let plan = plan(&dco_rules(), &fact);

    assert_eq!(plan.to_add, set(&["needs-dco"]));
    assert!(plan.to_remove.is_empty());
}

#[test]
fn dco_success_marks_pass() {
    let fact = PullRequestFact::builder("master")
        .check("DCO", CheckStatus::Success)
        .labels(["needs-dco"])
        .build();

    let plan = plan(&dco_rules(), &fact);

    assert_eq!(plan.to_add, set(&["dco-passed"]));
    assert_eq!(plan.to_remove, set(&["needs-dco"]));
}

#[test]
fn unreported_check_counts_as_not_passed() {
    let fact = PullRequestFact::builder("master").build();
    let plan = plan(&dco_rules(), &fact);
    assert_eq!(plan.to_add, set(&["needs-dco"]));
}

#[test]
fn branch_conditions_select_rules() {
    let rules = RuleSet::new(
        parse_rules(
            r#"
- name: release
  conditions: ['base~=2\.\d']
  actions: {label: {add: [release]}}
- name: master
  conditions: [base=master]
  actions: {label: {add: [master]}}
"#,
        )
        .expect("branch rules"),
    );

    let release = plan(&rules, &PullRequestFact::builder("2.3").build());
    assert_eq!(release.to_add, set(&["release"]));

    let master = plan(&rules, &PullRequestFact::builder("master").build());
    assert_eq!(master.to_add, set(&["master"]));

    let other = plan(&rules, &PullRequestFact::builder("3.0").build());
    assert!(other.is_empty());
}

#[test]
fn later_rule_wins_conflicting_label() {
    let rules = RuleSet::new(vec![
        Rule::new("adds", Condition::and(vec![]), vec![Action::add("contested")]),
        Rule::new(
            "removes",
            Condition::equals(FactField::Base, "master"),
            vec![Action::remove("contested")],
        ),
    ]);
    let present = PullRequestFact::builder("master").label("contested").build();
    let plan_present = plan(&rules, &present);
    assert_eq!(plan_present.to_remove, set(&["contested"]));
    assert!(plan_present.to_add.is_empty());

    let reversed = RuleSet::new(rules.rules().iter().rev().cloned().collect());
    let absent = PullRequestFact::builder("master").build();
    let plan_absent = plan(&reversed, &absent);
    assert_eq!(plan_absent.to_add, set(&["contested"]));
    assert!(plan_absent.to_remove.is_empty());
}

#[test]
fn plans_never_overlap() {
    let rules = RuleSet::new(vec![
        Rule::new(
            "a",
            Condition::and(vec![]),
            vec![Action::add("x"), Action::remove("y"), Action::add("z")],
        ),
        Rule::new(
            "b",
            Condition::status_success("ci"),
            vec![Action::add("y"), Action::remove("x")],
        ),
        Rule::new(
            "c",
            Condition::has_label("z"),
            vec![Action::remove("z"), Action::add("x")],
        ),
    ]);
    let statuses = [None, Some(CheckStatus::Success), Some(CheckStatus::Failure)];
    let label_sets: [&[&str]; 4] = [&[], &["x"], &["y", "z"], &["x", "y", "z"]];

    for status in statuses {
        for labels in label_sets {
            let mut builder = PullRequestFact::builder("master").labels(labels.iter().copied());
            if let Some(status) = status {
                builder = builder.check("ci", status);
            }
            let plan = plan(&rules, &builder.build());
            assert!(plan.is_disjoint(), "{plan:?}");
        }
    }
}

#[test]
fn evaluation_during_reload_sees_whole_rule_sets() {
    let registry = RuleRegistry::new(dco_rules());
    let orchestrator = Arc::new(Orchestrator::new(registry.clone()));
    let fact = Arc::new(
        PullRequestFact::builder("master")
            .check("DCO", CheckStatus::Success)
            .build(),
    );

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let orchestrator = Arc::clone(&orchestrator);
            let fact = Arc::clone(&fact);
            thread::spawn(move || {
                for _ in 0..200 {
                    let outcome = orchestrator.evaluate(&fact);
                    assert!(
                        outcome.matched_rules.is_empty()
                            || outcome.matched_rules == vec!["dco-pass".to_string()]
                    );
                }
            })
        })
        .collect();

    for round in 0..50 {
        if round % 2 == 0 {
            registry.replace(RuleSet::default());
        } else {
            registry.replace(dco_rules());
        }
    }

    for reader in readers {
        reader.join().expect("reader thread");
    }
}

#[test]
fn bundled_rule_document_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../.github/labelbot.yml");
    let registry = RuleRegistry::from_path(path).expect("bundled rules");
    assert_eq!(registry.info().rule_count, 3);

    let fact = PullRequestFact::builder("2.2")
        .check("DCO", CheckStatus::Success)
        .check("Code Checker", CheckStatus::Success)
        .check("Build and test", CheckStatus::Success)
        .labels(["needs-dco", "ci-failed"])
        .build();
    let outcome = Orchestrator::new(registry).evaluate(&fact);

    assert_eq!(outcome.plan.to_add, set(&["ci-passed", "dco-passed"]));
    assert_eq!(outcome.plan.to_remove, set(&["ci-failed", "needs-dco"]));
}
