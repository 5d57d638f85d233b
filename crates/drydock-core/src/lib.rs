//! Drydock core - CI pipeline orchestration
//!
//! Sequences one build request at a time:
//! clone → check → notify → persist → clean up.
//!
//! - Executes git and the syntax checker through the [`CommandRunner`]
//!   seam, with explicit timeouts on every external call
//! - Converts expected workspace/checker failures into boolean results
//! - Catches store and notifier faults and reflects them in the build
//!   report instead of crashing

pub mod checker;
pub mod exec;
pub mod fakes;
pub mod pipeline;
pub mod workspace;

// Re-export key types
pub use checker::{CheckOutcome, SyntaxChecker, SYNTAX_ERROR_MARKER};
pub use exec::{CommandRunner, ExecOutput, SystemRunner};
pub use pipeline::{BuildRequest, Pipeline, PipelineReport};
pub use workspace::WorkspaceManager;
