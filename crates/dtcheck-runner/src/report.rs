use std::time::Duration;

use crate::spec::ExpectationFailure;

/// How a single specification ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecOutcome {
    Passed,
    TransformFailed { reason: String },
    ExpectationsFailed { failures: Vec<ExpectationFailure> },
}

impl SpecOutcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Passed)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::TransformFailed { .. } => "transform failed",
            Self::ExpectationsFailed { .. } => "failed",
        }
    }
}

/// Per-stage counters for one specification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    pub tables_truncated: usize,
    pub sources_loaded: usize,
    pub rows_inserted: usize,
    pub targets_extracted: usize,
}

#[derive(Debug, Clone)]
pub struct SpecRun {
    pub name: String,
    pub outcome: SpecOutcome,
    pub stats: StepStats,
    pub duration: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub runs: Vec<SpecRun>,
    /// Set when `fail_fast` skipped the remaining specifications.
    pub stopped_early: bool,
}

impl RunReport {
    pub fn passed(&self) -> usize {
        self.runs.iter().filter(|run| run.outcome.is_pass()).count()
    }

    pub fn failed(&self) -> usize {
        self.runs.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }
}
