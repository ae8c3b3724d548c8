// tests/context_inheritance.rs

mod common;

use std::sync::Arc;

use asr_runner::types::{ErrorPolicy, ExecMode};
use asr_runner_test_utils::builders::{TaskBuilder, WorkflowBuilder};
use asr_runner_test_utils::fake_runner::FakeRunner;

use common::{options, run_recorded};

#[tokio::test]
async fn children_see_their_parents_result_and_siblings_are_isolated() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().display().to_string();
    let runner = Arc::new(FakeRunner::new());

    let workflow = WorkflowBuilder::new("ctx")
        .with_task(
            TaskBuilder::new("A", "a {target} {result} [{parent_result}]")
                .result("a.txt")
                .child(
                    TaskBuilder::new("Mid", "mid [{parent_result}] [{result}]")
                        .child(TaskBuilder::new("Leaf", "leaf [{parent_result}]").build())
                        .build(),
                )
                .child(
                    TaskBuilder::new("B", "b [{parent_result}] {result}")
                        .result("nested/b.txt")
                        .build(),
                )
                .build(),
        )
        .with_task(TaskBuilder::new("C", "c [{parent_result}] {outdir}").build())
        .build();

    let (outcome, _sink) = run_recorded(
        runner.clone(),
        &workflow,
        tmp.path(),
        options(ErrorPolicy::Abort, ExecMode::Execute),
    )
    .await;
    outcome.unwrap();

    let a = format!("{out}/a.txt");
    let b = format!("{out}/nested/b.txt");
    assert_eq!(
        runner.executed(),
        vec![
            format!("a example.com {a} []"),
            format!("mid [{a}] []"),
            // A result-less task passes its inherited result on.
            format!("leaf [{a}]"),
            format!("b [{a}] {b}"),
            format!("c [] {out}"),
        ]
    );
    assert!(tmp.path().join("nested").is_dir());
}
