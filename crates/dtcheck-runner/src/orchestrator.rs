//! Run orchestration: clean, load, transform, extract, compare.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, error, info, info_span, trace, warn};

use dtcheck_model::{ActualSet, TableName, TableSchema};
use dtcheck_normalize::normalize_table;
use dtcheck_warehouse::{Warehouse, WarehouseError};

use crate::error::{Result, RunError, SpecError};
use crate::report::{RunReport, SpecOutcome, SpecRun, StepStats};
use crate::spec::{SourceFixture, Specification};
use crate::transform::{TransformOutcome, Transformer};

/// Placeholder logged instead of fixture values unless `log_data` is set.
pub const REDACTED_VALUE: &str = "[REDACTED]";

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Stop after the first specification that does not pass.
    pub fail_fast: bool,
    /// Write each specification's canonical actuals here as JSON.
    pub dump_dir: Option<PathBuf>,
    /// Log fixture rows at trace level.
    pub log_data: bool,
}

/// Drives specifications through the warehouse and the transformation.
///
/// Both collaborators are borrowed for the whole run; specifications are
/// processed strictly one after another.
pub struct Runner<'a, W: Warehouse + ?Sized, T: Transformer + ?Sized> {
    warehouse: &'a W,
    transformer: &'a T,
    options: RunOptions,
}

impl<'a, W: Warehouse + ?Sized, T: Transformer + ?Sized> Runner<'a, W, T> {
    pub fn new(warehouse: &'a W, transformer: &'a T) -> Self {
        Self {
            warehouse,
            transformer,
            options: RunOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Run every specification in order.
    ///
    /// Transformation failures and unmet expectations are recorded and the
    /// run moves on, unless `fail_fast` is set. Any other error aborts.
    pub fn run_all<I, S>(&self, specs: I) -> Result<RunReport>
    where
        I: IntoIterator<Item = Result<(String, S), SpecError>>,
        S: Specification,
    {
        let run_start = Instant::now();
        let mut report = RunReport::default();
        for entry in specs {
            let (name, mut spec) = entry?;
            let start = Instant::now();
            let mut stats = StepStats::default();
            let outcome = match self.execute(&name, &mut spec, &mut stats) {
                Ok(outcome) => outcome,
                Err(RunError::TransformFailed { reason }) => SpecOutcome::TransformFailed { reason },
                Err(err) => return Err(err),
            };
            let passed = outcome.is_pass();
            report.runs.push(SpecRun {
                name,
                outcome,
                stats,
                duration: start.elapsed(),
            });
            if !passed && self.options.fail_fast {
                warn!("fail-fast set; skipping remaining specifications");
                report.stopped_early = true;
                break;
            }
        }
        info!(
            spec_count = report.runs.len(),
            passed = report.passed(),
            failed = report.failed(),
            duration_ms = run_start.elapsed().as_millis(),
            "run complete"
        );
        Ok(report)
    }

    /// Run one specification through all stages.
    ///
    /// A failed transformation is returned as [`RunError::TransformFailed`];
    /// unmet expectations come back as a completed run.
    pub fn run_spec<S: Specification>(&self, name: &str, spec: &mut S) -> Result<SpecRun> {
        let start = Instant::now();
        let mut stats = StepStats::default();
        let outcome = self.execute(name, spec, &mut stats)?;
        Ok(SpecRun {
            name: name.to_string(),
            outcome,
            stats,
            duration: start.elapsed(),
        })
    }

    fn execute<S: Specification>(
        &self,
        name: &str,
        spec: &mut S,
        stats: &mut StepStats,
    ) -> Result<SpecOutcome> {
        let spec_span = info_span!("spec", spec = %name);
        let _spec_guard = spec_span.enter();
        info!("running specification");

        spec.generate_sources()?;
        self.clean(spec, stats)?;
        self.load(spec, stats)?;
        self.transform()?;
        let actuals = self.extract(spec, stats)?;
        if let Some(dir) = &self.options.dump_dir {
            dump_actuals(dir, name, &actuals)?;
        }
        Ok(self.compare(spec, actuals))
    }

    fn clean<S: Specification>(&self, spec: &S, stats: &mut StepStats) -> Result<()> {
        let tables: BTreeSet<TableName> = spec
            .sources()
            .keys()
            .chain(spec.targets().keys())
            .cloned()
            .collect();
        let _guard = info_span!("clean", table_count = tables.len()).entered();
        let start = Instant::now();
        let summary = self.warehouse.truncate_tables(&tables)?;
        stats.tables_truncated = summary.truncated.len();
        info!(
            truncated = summary.truncated.len(),
            missing = summary.missing.len(),
            duration_ms = start.elapsed().as_millis(),
            "tables cleaned"
        );
        Ok(())
    }

    fn load<S: Specification>(&self, spec: &S, stats: &mut StepStats) -> Result<()> {
        let _guard = info_span!("load").entered();
        let start = Instant::now();
        for (table, source) in spec.sources() {
            let rows = source.serialize();
            if rows.is_empty() {
                debug!(table = %table, "no fixture rows; skipping source");
                continue;
            }
            let schema = self.require_table(table)?;
            if self.options.log_data {
                trace!(table = %table, rows = ?rows, "fixture rows");
            } else {
                trace!(table = %table, rows = REDACTED_VALUE, "fixture rows");
            }
            let inserted = self.warehouse.insert_rows(&schema, &rows)?;
            info!(table = %table, row_count = inserted, "inserted input data into source table");
            stats.sources_loaded += 1;
            stats.rows_inserted += inserted;
        }
        info!(
            sources_loaded = stats.sources_loaded,
            rows_inserted = stats.rows_inserted,
            duration_ms = start.elapsed().as_millis(),
            "load complete"
        );
        Ok(())
    }

    fn transform(&self) -> Result<()> {
        let _guard = info_span!("transform").entered();
        let start = Instant::now();
        match self.transformer.run() {
            TransformOutcome::Succeeded => {
                info!(
                    duration_ms = start.elapsed().as_millis(),
                    "transformation complete"
                );
                Ok(())
            }
            TransformOutcome::Failed { reason } => {
                error!(%reason, "transformation failed");
                Err(RunError::TransformFailed { reason })
            }
        }
    }

    fn extract<S: Specification>(
        &self,
        spec: &S,
        stats: &mut StepStats,
    ) -> Result<ActualSet> {
        let _guard = info_span!("extract").entered();
        let start = Instant::now();
        let mut actuals = ActualSet::new();
        for table in spec.targets().keys() {
            let schema = self.require_table(table)?;
            let frame = self.warehouse.read_table(&schema)?;
            let canonical = normalize_table(&frame, &schema.columns)?;
            debug!(table = %table, row_count = canonical.row_count(), "extracted target table");
            actuals.insert(table.clone(), canonical);
        }
        stats.targets_extracted = actuals.len();
        info!(
            target_count = actuals.len(),
            duration_ms = start.elapsed().as_millis(),
            "extract complete"
        );
        Ok(actuals)
    }

    fn compare<S: Specification>(&self, spec: &mut S, actuals: ActualSet) -> SpecOutcome {
        let _guard = info_span!("compare").entered();
        spec.load_actuals(actuals);
        match spec.assert_expectations() {
            Ok(()) => {
                info!("expectations met");
                SpecOutcome::Passed
            }
            Err(failures) => {
                for failure in &failures {
                    warn!(table = %failure.table(), "{failure}");
                }
                SpecOutcome::ExpectationsFailed { failures }
            }
        }
    }

    fn require_table(&self, table: &TableName) -> Result<TableSchema> {
        self.warehouse.describe_table(table)?.ok_or_else(|| {
            RunError::Warehouse(WarehouseError::TableNotFound {
                schema: self.warehouse.schema_name().to_string(),
                table: table.to_string(),
            })
        })
    }
}

/// Write `actuals` to `<dir>/<spec stem>.json`.
fn dump_actuals(dir: &Path, name: &str, actuals: &ActualSet) -> Result<()> {
    let stem = Path::new(name)
        .file_stem()
        .map_or_else(|| name.to_string(), |stem| stem.to_string_lossy().into_owned());
    let path = dir.join(format!("{stem}.json"));
    let json = serde_json::to_string_pretty(actuals)?;
    fs::create_dir_all(dir)
        .and_then(|()| fs::write(&path, json))
        .map_err(|source| RunError::Dump {
            path: path.clone(),
            source,
        })?;
    debug!(path = %path.display(), "wrote actuals");
    Ok(())
}
