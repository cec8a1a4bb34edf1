//! Typed operations over the Nebuia API.

mod client;
mod configurations;
mod documents;
mod jobs;
mod records;
pub mod types;

pub use client::{NebuiaApi, NebuiaClient};
pub use documents::is_pdf;
pub use types::{
    CONFIGURATION_REQUIRED_FIELDS, Document, DocumentStatus, EmbeddingStatus, Entity, JobQuery,
    Page, ProcessingJob, Record, RecordFilter, RecordStatus, RecordSummary, VerificationResult,
};
