use anyhow::{Context, Result, anyhow, bail};
use tracing::info;

use dtcheck_cli::config::{DEFAULT_CONFIG_FILE, HarnessConfig};
use dtcheck_cli::logging::log_data_enabled;
use dtcheck_model::TableName;
use dtcheck_normalize::normalize_table;
use dtcheck_runner::{
    CommandTransformer, LiteralSpecification, RunOptions, RunReport, Runner,
};
use dtcheck_warehouse::{DuckDbWarehouse, Warehouse};

use crate::cli::{NormalizeArgs, RunArgs};

pub fn run_specs(args: &RunArgs) -> Result<RunReport> {
    let config = HarnessConfig::discover(args.config.as_deref())?;
    let spec_paths = if args.specs.is_empty() {
        config.specs.clone()
    } else {
        args.specs.clone()
    };
    if spec_paths.is_empty() {
        bail!(
            "no specifications given; pass SPEC paths or list them under `specs` in {DEFAULT_CONFIG_FILE}"
        );
    }
    info!(spec_count = spec_paths.len(), "starting run");

    let warehouse = DuckDbWarehouse::open(&config.warehouse).context("open warehouse")?;
    let transformer = CommandTransformer::new(config.transform.clone());
    let runner = Runner::new(&warehouse, &transformer).with_options(RunOptions {
        fail_fast: args.fail_fast,
        dump_dir: args.dump_actuals.clone(),
        log_data: log_data_enabled(),
    });

    // Specifications load lazily, one per run step.
    let specs = spec_paths.iter().map(|path| {
        LiteralSpecification::from_path(path).map(|spec| (path.display().to_string(), spec))
    });
    runner.run_all(specs).context("run specifications")
}

pub fn run_normalize(args: &NormalizeArgs) -> Result<()> {
    let config = HarnessConfig::discover(args.config.as_deref())?;
    let table = TableName::new(args.table.as_str())?;
    let warehouse = DuckDbWarehouse::open(&config.warehouse).context("open warehouse")?;
    let schema = warehouse
        .describe_table(&table)?
        .ok_or_else(|| anyhow!("table {table} not found in schema {}", warehouse.schema_name()))?;
    let frame = warehouse
        .read_table(&schema)
        .with_context(|| format!("extract {table}"))?;
    let canonical = normalize_table(&frame, &schema.columns)?;
    println!("{}", serde_json::to_string_pretty(&canonical)?);
    Ok(())
}
