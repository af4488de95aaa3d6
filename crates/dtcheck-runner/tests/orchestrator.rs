//! End-to-end runs against an in-memory DuckDB warehouse.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use dtcheck_model::{ActualSet, NULL_TOKEN, TableName};
use dtcheck_runner::{
    ExpectationFailure, LiteralSource, LiteralSpecification, LiteralTarget, RunError, RunOptions,
    Runner, SpecError, SpecOutcome, Specification, TransformOutcome, Transformer,
};
use dtcheck_warehouse::{DuckDbWarehouse, WarehouseError};

const DDL: &str = "
CREATE TABLE analytics.raw_orders (id INTEGER, amount DECIMAL(10,2));
CREATE TABLE analytics.orders (id DECIMAL(38,0), amount DOUBLE);
";

const DOUBLE_AMOUNTS: &str =
    "INSERT INTO analytics.orders SELECT id, amount * 2 FROM analytics.raw_orders";

/// Stands in for the pipeline by running SQL on the same warehouse.
struct SqlTransformer<'a> {
    warehouse: &'a DuckDbWarehouse,
    sql: &'static str,
    calls: Cell<usize>,
}

impl<'a> SqlTransformer<'a> {
    fn new(warehouse: &'a DuckDbWarehouse, sql: &'static str) -> Self {
        Self {
            warehouse,
            sql,
            calls: Cell::new(0),
        }
    }
}

impl Transformer for SqlTransformer<'_> {
    fn run(&self) -> TransformOutcome {
        self.calls.set(self.calls.get() + 1);
        match self.warehouse.execute_batch(self.sql) {
            Ok(()) => TransformOutcome::Succeeded,
            Err(err) => TransformOutcome::Failed {
                reason: err.to_string(),
            },
        }
    }
}

/// Runs the next statement batch on each call, so the schema can change between runs.
struct StagedTransformer<'a> {
    warehouse: &'a DuckDbWarehouse,
    stages: Vec<&'static str>,
    calls: Cell<usize>,
}

impl Transformer for StagedTransformer<'_> {
    fn run(&self) -> TransformOutcome {
        let call = self.calls.get();
        self.calls.set(call + 1);
        let Some(sql) = self.stages.get(call) else {
            return TransformOutcome::Failed {
                reason: format!("no stage for call {call}"),
            };
        };
        match self.warehouse.execute_batch(sql) {
            Ok(()) => TransformOutcome::Succeeded,
            Err(err) => TransformOutcome::Failed {
                reason: err.to_string(),
            },
        }
    }
}

struct FailingTransformer;

impl Transformer for FailingTransformer {
    fn run(&self) -> TransformOutcome {
        TransformOutcome::Failed {
            reason: "model orders failed".to_string(),
        }
    }
}

/// Records which collaborator hooks the runner called.
struct RecordingSpec {
    inner: LiteralSpecification,
    events: RefCell<Vec<&'static str>>,
}

impl RecordingSpec {
    fn new(yaml: &str) -> Self {
        Self {
            inner: LiteralSpecification::from_yaml_str("recording.yaml", yaml).unwrap(),
            events: RefCell::new(Vec::new()),
        }
    }
}

impl Specification for RecordingSpec {
    type Source = LiteralSource;
    type Target = LiteralTarget;

    fn sources(&self) -> &BTreeMap<TableName, LiteralSource> {
        self.inner.sources()
    }

    fn targets(&self) -> &BTreeMap<TableName, LiteralTarget> {
        self.inner.targets()
    }

    fn generate_sources(&mut self) -> Result<(), SpecError> {
        self.events.borrow_mut().push("generate");
        self.inner.generate_sources()
    }

    fn load_actuals(&mut self, actuals: ActualSet) {
        self.events.borrow_mut().push("load_actuals");
        self.inner.load_actuals(actuals);
    }

    fn assert_expectations(&self) -> Result<(), Vec<ExpectationFailure>> {
        self.events.borrow_mut().push("assert");
        self.inner.assert_expectations()
    }
}

fn warehouse() -> DuckDbWarehouse {
    let warehouse = DuckDbWarehouse::in_memory("analytics").unwrap();
    warehouse.execute_batch(DDL).unwrap();
    warehouse
}

fn literal(name: &str, yaml: &str) -> Result<(String, LiteralSpecification), SpecError> {
    LiteralSpecification::from_yaml_str(name, yaml).map(|spec| (name.to_string(), spec))
}

const FIRST: &str = "
sources:
  raw_orders:
    - { id: 1, amount: '10.50' }
    - { id: 2, amount: null }
targets:
  orders:
    - { id: 1, amount: '21.0000' }
    - { id: 2 }
";

const SECOND: &str = "
sources:
  raw_orders:
    - { id: 3, amount: '1.25' }
targets:
  orders:
    - { id: 3, amount: '2.5000' }
";

#[test]
fn runs_stages_in_order_and_passes() {
    let warehouse = warehouse();
    let transformer = SqlTransformer::new(&warehouse, DOUBLE_AMOUNTS);
    let runner = Runner::new(&warehouse, &transformer);
    let mut spec = RecordingSpec::new(FIRST);

    let run = runner.run_spec("first.yaml", &mut spec).unwrap();

    assert_eq!(run.outcome, SpecOutcome::Passed);
    assert_eq!(run.stats.tables_truncated, 2);
    assert_eq!(run.stats.sources_loaded, 1);
    assert_eq!(run.stats.rows_inserted, 2);
    assert_eq!(run.stats.targets_extracted, 1);
    assert_eq!(transformer.calls.get(), 1);
    assert_eq!(
        *spec.events.borrow(),
        vec!["generate", "load_actuals", "assert"]
    );
    let orders = &spec.inner.actuals().unwrap()[&TableName::new("orders").unwrap()];
    assert_eq!(orders.columns, vec!["id", "amount"]);
    assert!(orders.records.iter().any(|record| record["amount"] == NULL_TOKEN));
}

#[test]
fn transform_failure_skips_extract_and_compare() {
    let warehouse = warehouse();
    let runner = Runner::new(&warehouse, &FailingTransformer);
    let mut spec = RecordingSpec::new(FIRST);

    let err = runner.run_spec("first.yaml", &mut spec).unwrap_err();

    assert!(matches!(err, RunError::TransformFailed { reason } if reason == "model orders failed"));
    assert_eq!(*spec.events.borrow(), vec!["generate"]);
}

#[test]
fn specifications_sharing_a_table_are_isolated() {
    let warehouse = warehouse();
    let transformer = SqlTransformer::new(&warehouse, DOUBLE_AMOUNTS);
    let runner = Runner::new(&warehouse, &transformer);

    let report = runner
        .run_all(vec![literal("first.yaml", FIRST), literal("second.yaml", SECOND)])
        .unwrap();

    assert_eq!(report.runs.len(), 2);
    assert!(report.all_passed(), "{:?}", report.runs);
    assert_eq!(transformer.calls.get(), 2);
}

#[test]
fn empty_sources_are_skipped() {
    let warehouse = warehouse();
    let transformer = SqlTransformer::new(&warehouse, DOUBLE_AMOUNTS);
    let runner = Runner::new(&warehouse, &transformer);
    let mut spec = LiteralSpecification::from_yaml_str(
        "empty.yaml",
        "sources: { raw_orders: [], not_created: [] }\ntargets: { orders: [] }\n",
    )
    .unwrap();

    let run = runner.run_spec("empty.yaml", &mut spec).unwrap();

    assert_eq!(run.outcome, SpecOutcome::Passed);
    assert_eq!(run.stats.sources_loaded, 0);
    assert_eq!(run.stats.rows_inserted, 0);
}

#[test]
fn missing_source_table_aborts() {
    let warehouse = warehouse();
    let transformer = SqlTransformer::new(&warehouse, DOUBLE_AMOUNTS);
    let runner = Runner::new(&warehouse, &transformer);
    let mut spec = LiteralSpecification::from_yaml_str(
        "missing.yaml",
        "sources: { customers: [{ id: 1 }] }\ntargets: { orders: [] }\n",
    )
    .unwrap();

    let err = runner.run_spec("missing.yaml", &mut spec).unwrap_err();

    assert!(matches!(
        err,
        RunError::Warehouse(WarehouseError::TableNotFound { table, .. }) if table == "customers"
    ));
    assert_eq!(transformer.calls.get(), 0);
}

#[test]
fn missing_target_table_fails_after_transform() {
    let warehouse = warehouse();
    let transformer = SqlTransformer::new(&warehouse, DOUBLE_AMOUNTS);
    let runner = Runner::new(&warehouse, &transformer);
    let mut spec = LiteralSpecification::from_yaml_str(
        "unbuilt.yaml",
        "sources: { raw_orders: [{ id: 1 }] }\ntargets: { order_totals: [{ id: 1 }] }\n",
    )
    .unwrap();

    let err = runner.run_spec("unbuilt.yaml", &mut spec).unwrap_err();

    assert_eq!(transformer.calls.get(), 1);
    assert!(matches!(
        err,
        RunError::Warehouse(WarehouseError::TableNotFound { table, .. }) if table == "order_totals"
    ));
    assert!(spec.actuals().is_none());
}

#[test]
fn schema_changes_between_specifications_are_picked_up() {
    let warehouse = warehouse();
    let transformer = StagedTransformer {
        warehouse: &warehouse,
        stages: vec![
            "INSERT INTO analytics.orders SELECT id, amount * 2 FROM analytics.raw_orders;
             ALTER TABLE analytics.raw_orders ADD COLUMN channel VARCHAR;",
            "ALTER TABLE analytics.orders ADD COLUMN note VARCHAR;
             INSERT INTO analytics.orders SELECT id, amount * 2, channel FROM analytics.raw_orders;",
        ],
        calls: Cell::new(0),
    };
    let dir = tempfile::tempdir().unwrap();
    let runner = Runner::new(&warehouse, &transformer).with_options(RunOptions {
        dump_dir: Some(dir.path().to_path_buf()),
        ..RunOptions::default()
    });
    let widened = "
sources:
  raw_orders:
    - { id: 3, amount: '1.25', channel: web }
targets:
  orders:
    - { id: 3, amount: '2.5000', note: web }
";

    let report = runner
        .run_all(vec![literal("first.yaml", FIRST), literal("widened.yaml", widened)])
        .unwrap();

    assert_eq!(report.passed(), 2);
    let text = std::fs::read_to_string(dir.path().join("widened.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
        json["orders"]["columns"],
        serde_json::json!(["id", "amount", "note"])
    );
    assert_eq!(json["orders"]["records"][0]["note"], "web");
}

#[test]
fn failures_are_recorded_and_the_run_continues() {
    let warehouse = warehouse();
    let transformer = SqlTransformer::new(&warehouse, DOUBLE_AMOUNTS);
    let runner = Runner::new(&warehouse, &transformer);
    let wrong = SECOND.replace("2.5000", "9.0000");

    let report = runner
        .run_all(vec![literal("wrong.yaml", &wrong), literal("second.yaml", SECOND)])
        .unwrap();

    assert_eq!(report.passed(), 1);
    assert!(matches!(
        &report.runs[0].outcome,
        SpecOutcome::ExpectationsFailed { failures } if failures.len() == 1
    ));
    assert!(!report.stopped_early);
}

#[test]
fn fail_fast_stops_after_first_failure() {
    let warehouse = warehouse();
    let runner = Runner::new(&warehouse, &FailingTransformer).with_options(RunOptions {
        fail_fast: true,
        ..RunOptions::default()
    });

    let report = runner
        .run_all(vec![literal("first.yaml", FIRST), literal("second.yaml", SECOND)])
        .unwrap();

    assert_eq!(report.runs.len(), 1);
    assert!(report.stopped_early);
    assert!(matches!(
        report.runs[0].outcome,
        SpecOutcome::TransformFailed { .. }
    ));
}

#[test]
fn spec_load_errors_abort_the_run() {
    let warehouse = warehouse();
    let transformer = SqlTransformer::new(&warehouse, DOUBLE_AMOUNTS);
    let runner = Runner::new(&warehouse, &transformer);

    let err = runner
        .run_all(vec![literal("broken.yaml", "targets: [")])
        .unwrap_err();

    assert!(matches!(err, RunError::Spec(SpecError::Parse { .. })));
}

#[test]
fn dumps_actuals_as_json() {
    let warehouse = warehouse();
    let transformer = SqlTransformer::new(&warehouse, DOUBLE_AMOUNTS);
    let dir = tempfile::tempdir().unwrap();
    let runner = Runner::new(&warehouse, &transformer).with_options(RunOptions {
        dump_dir: Some(dir.path().join("actuals")),
        ..RunOptions::default()
    });
    let mut spec = LiteralSpecification::from_yaml_str("specs/second.yaml", SECOND).unwrap();

    runner.run_spec("specs/second.yaml", &mut spec).unwrap();

    let text = std::fs::read_to_string(dir.path().join("actuals/second.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["orders"]["records"][0]["amount"], "2.5000");
    assert_eq!(json["orders"]["records"][0]["id"], "3");
}
