//! Document-processing pipeline built on the resource endpoints and polling loops.

mod options;
mod orchestrator;
mod validate;

pub use options::{BatchOptions, WorkflowOptions};
pub use orchestrator::DocumentWorkflow;
pub use validate::validate_documents;
