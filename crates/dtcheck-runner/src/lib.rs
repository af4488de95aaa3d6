//! Test run orchestration for the dtcheck harness.
//!
//! Each specification runs through six stages in strict order:
//! 1. **Generate**: the specification materializes its fixture rows
//! 2. **Clean**: truncate every source and target table
//! 3. **Load**: insert fixture rows into source tables
//! 4. **Transform**: run the external transformation pipeline
//! 5. **Extract**: read target tables back and normalize them
//! 6. **Compare**: hand the results to the specification's assertions
//!
//! Specifications run one at a time; the next clean never starts before the
//! previous specification has finished or aborted.

pub mod error;
pub mod literal;
pub mod orchestrator;
pub mod report;
pub mod spec;
pub mod transform;

pub use error::{Result, RunError, SpecError};
pub use literal::{LiteralSource, LiteralSpecification, LiteralTarget};
pub use orchestrator::{REDACTED_VALUE, RunOptions, Runner};
pub use report::{RunReport, SpecOutcome, SpecRun, StepStats};
pub use spec::{ExpectationFailure, SourceFixture, Specification};
pub use transform::{CommandTransformer, TransformConfig, TransformOutcome, Transformer};
