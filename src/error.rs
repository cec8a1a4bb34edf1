//! Error taxonomy for transport, endpoints and polling.

use reqwest::StatusCode;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, NebuiaError>;

/// Errors returned while talking to the Nebuia API or waiting on its entities.
#[derive(Debug, Error)]
pub enum NebuiaError {
    /// Local input was rejected before any network call.
    #[error("Validation failed: {0}")]
    Validation(String),
    /// HTTP layer failed before receiving a response.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Remote returned a non-2xx status.
    #[error("API Error ({status}): {message}")]
    Api {
        /// HTTP status returned by the service.
        status: StatusCode,
        /// Short description derived from the status line.
        message: String,
        /// Body captured from the failing response.
        body: ApiBody,
    },
    /// Successful response whose body was not the expected JSON.
    #[error("Failed to decode response: {0}")]
    Decode(String),
    /// Polling budget exhausted before a terminal status was observed.
    #[error("Timeout exceeded for {entity} after {seconds} seconds")]
    Timeout {
        /// Identifier of the entity being waited on.
        entity: String,
        /// Budget that elapsed, in whole seconds.
        seconds: u64,
    },
    /// Remote entity reached its failure sentinel.
    #[error("Record processing failed: {0}")]
    RemoteProcessing(String),
    /// Polling was cancelled by the caller.
    #[error("Operation cancelled")]
    Cancelled,
    /// Base URL failed to parse.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// Local file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NebuiaError {
    /// HTTP status of an API failure, if this error carries one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Body of a failing response, kept as JSON when it parses.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiBody {
    /// Body parsed as JSON.
    Json(Value),
    /// Raw body text.
    Text(String),
}

impl ApiBody {
    /// Classify a raw response body.
    pub fn from_text(text: String) -> Self {
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(text),
        }
    }
}

impl fmt::Display for ApiBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}
