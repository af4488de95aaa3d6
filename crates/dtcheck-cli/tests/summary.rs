//! Integration tests for the run summary.

use std::time::Duration;

use dtcheck_cli::summary::{failure_details, summary_table};
use dtcheck_model::TableName;
use dtcheck_runner::{
    ExpectationFailure, RunReport, SpecOutcome, SpecRun, StepStats,
};

fn run(name: &str, outcome: SpecOutcome, rows: usize) -> SpecRun {
    SpecRun {
        name: name.to_string(),
        outcome,
        stats: StepStats {
            tables_truncated: 2,
            sources_loaded: 1,
            rows_inserted: rows,
            targets_extracted: 1,
        },
        duration: Duration::from_millis(12),
    }
}

fn report() -> RunReport {
    RunReport {
        runs: vec![
            run("specs/orders.yml", SpecOutcome::Passed, 3),
            run(
                "specs/refunds.yml",
                SpecOutcome::ExpectationsFailed {
                    failures: vec![ExpectationFailure::RowCount {
                        table: TableName::new("refunds").unwrap(),
                        expected: 2,
                        actual: 0,
                    }],
                },
                4,
            ),
            run(
                "specs/customers.yml",
                SpecOutcome::TransformFailed {
                    reason: "`dbt run` exited with exit status: 1".to_string(),
                },
                0,
            ),
        ],
        stopped_early: false,
    }
}

#[test]
fn table_lists_every_spec_and_totals() {
    let rendered = summary_table(&report()).to_string();

    for expected in [
        "specs/orders.yml",
        "specs/refunds.yml",
        "specs/customers.yml",
        "passed",
        "transform failed",
        "TOTAL",
        "1/3 passed",
        "12 ms",
        "36 ms",
    ] {
        assert!(rendered.contains(expected), "missing {expected:?} in\n{rendered}");
    }
}

#[test]
fn failure_details_name_spec_and_reason() {
    assert_eq!(
        failure_details(&report()),
        vec![
            "specs/refunds.yml: refunds: expected 2 rows, found 0".to_string(),
            "specs/customers.yml: transformation failed: `dbt run` exited with exit status: 1"
                .to_string(),
        ]
    );
}

#[test]
fn passing_run_has_no_failure_details() {
    let report = RunReport {
        runs: vec![run("specs/orders.yml", SpecOutcome::Passed, 3)],
        stopped_early: false,
    };
    assert!(failure_details(&report).is_empty());
}
