#![deny(missing_docs)]

//! Client-side orchestration for the Nebuia document-processing API.
//!
//! The crate creates records, uploads PDF documents, waits for the embeddings pipeline,
//! verifies document types and finally triggers and waits for a processing job.

/// Environment-driven configuration management.
pub mod config;
/// Typed error taxonomy shared by every layer.
pub mod error;
/// Structured logging and tracing setup.
pub mod logging;
/// Workflow activity counters.
pub mod metrics;
/// Generic wait loops for embedding and record status.
pub mod polling;
/// Typed wrappers over the remote API capabilities.
pub mod resources;
/// Extraction of entity structures from completed records.
pub mod shaping;
/// HTTP transport and the curl diagnostic side-channel.
pub mod transport;
/// End-to-end document-processing pipeline.
pub mod workflow;

pub use error::{ApiBody, NebuiaError, Result};
