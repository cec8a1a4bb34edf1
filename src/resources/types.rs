//! Typed payloads exchanged with the Nebuia API.

use crate::error::{NebuiaError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Fields every configuration payload must carry.
pub const CONFIGURATION_REQUIRED_FIELDS: [&str; 6] = [
    "title",
    "subtitle",
    "description",
    "endpoint",
    "icon",
    "documents",
];

/// Server-owned lifecycle of a record.
///
/// Statuses the client does not know are kept verbatim in [`RecordStatus::Other`]; a missing or
/// `null` status decodes as [`RecordStatus::Unknown`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RecordStatus {
    /// Waiting for documents or a job.
    Waiting,
    /// A processing job is running.
    Processing,
    /// Terminal success.
    Complete,
    /// Terminal failure.
    Error,
    /// Missing status.
    #[default]
    Unknown,
    /// Status string the client does not recognise.
    Other(String),
}

impl RecordStatus {
    /// Wire representation of the status.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Waiting => "waiting",
            Self::Processing => "processing",
            Self::Complete => "complete",
            Self::Error => "error",
            Self::Unknown => "unknown",
            Self::Other(raw) => raw,
        }
    }

    fn from_wire(raw: String) -> Self {
        match raw.as_str() {
            "waiting" => Self::Waiting,
            "processing" => Self::Processing,
            "complete" => Self::Complete,
            "error" => Self::Error,
            "unknown" | "" => Self::Unknown,
            _ => Self::Other(raw),
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RecordStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RecordStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(Option::<String>::deserialize(deserializer)?
            .map(Self::from_wire)
            .unwrap_or_default())
    }
}

/// Embedding pipeline status of one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingStatus {
    /// Still being ingested.
    Pending,
    /// Ingestion finished.
    Complete,
    /// Ingestion failed.
    Error,
    /// Missing or unrecognised status.
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for EmbeddingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Pending => "pending",
            Self::Complete => "complete",
            Self::Error => "error",
            Self::Unknown => "unknown",
        };
        f.write_str(text)
    }
}

/// Response of the embeddings distributor status endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentStatus {
    /// Current embedding status.
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: EmbeddingStatus,
}

/// One extracted entity; only `structure` is interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Extracted fields, including the display-only `name_to_show`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<Map<String, Value>>,
    /// Remaining entity fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One uploaded file attached to a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Identifier assigned on upload.
    #[serde(default)]
    pub document_id: Option<String>,
    /// Caller-chosen type key, unique within a record.
    #[serde(default)]
    pub document_type: Option<String>,
    /// Embedding status when the payload includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_status: Option<EmbeddingStatus>,
    /// Extracted entities, populated once embedding completes.
    #[serde(default, deserialize_with = "null_as_default")]
    pub entities: Vec<Entity>,
    /// Remaining document fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Snapshot of a record as returned by the service, optionally augmented by the workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Server-assigned identifier.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Configuration the record was created for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration_ref: Option<String>,
    /// Current lifecycle status.
    #[serde(default)]
    pub status: RecordStatus,
    /// Documents attached so far; `None` when the payload carried no `documents` key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<Document>>,
    /// Failure description, present when `status` is `error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Type verification outcome per document type, added by the workflow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_results: Option<BTreeMap<String, VerificationResult>>,
    /// Document types whose upload failed, added by the workflow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_uploads: Option<Vec<String>>,
    /// Remaining record fields (`created_at`, `is_processing`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    /// Identifier of the document uploaded under `document_type`, if listed.
    pub fn document_id_for(&self, document_type: &str) -> Option<&str> {
        self.documents
            .as_deref()
            .unwrap_or_default()
            .iter()
            .find(|document| document.document_type.as_deref() == Some(document_type))
            .and_then(|document| document.document_id.as_deref())
    }

    /// Whether the service reports a running job.
    pub fn is_processing(&self) -> bool {
        self.extra
            .get("is_processing")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Document currently being processed, if reported.
    pub fn current_document_id(&self) -> Option<&str> {
        self.extra.get("current_document_id").and_then(Value::as_str)
    }

    /// String field from the untyped remainder of the payload.
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }
}

/// Outcome of checking one document's declared type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Whether the declared type matched.
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: bool,
    /// Human-readable reasons, present on failure.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub points: Vec<String>,
    /// Type the service inferred, present on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_document_found: Option<String>,
    /// Local description when the verification call itself failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerificationResult {
    /// Failing result recorded for a verification call that errored.
    pub fn errored(error: impl fmt::Display) -> Self {
        Self {
            status: false,
            error: Some(error.to_string()),
            ..Self::default()
        }
    }
}

/// Acknowledgement of a processing job request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingJob {
    /// Identifier of the created job.
    #[serde(default)]
    pub job_id: Option<String>,
    /// Initial job status.
    #[serde(default)]
    pub status: Option<String>,
    /// Message returned by the service.
    #[serde(default)]
    pub message: Option<String>,
}

/// Pagination parameters for list operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// One-based page number.
    pub page: u32,
    /// Items per page.
    pub page_size: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 50,
        }
    }
}

/// Optional filters for listing records.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    /// Record status (`waiting`, `complete`, ...).
    pub status: Option<String>,
    /// Configuration reference.
    pub configuration_ref: Option<String>,
    /// Created after this ISO date.
    pub date_from: Option<String>,
    /// Created before this ISO date.
    pub date_to: Option<String>,
}

/// Filters for the job metrics endpoint.
#[derive(Debug, Clone, Default)]
pub struct JobQuery {
    /// Include per-job details.
    pub detailed: bool,
    /// Job status.
    pub status: Option<String>,
    /// Jobs after this ISO date.
    pub date_from: Option<String>,
    /// Jobs before this ISO date.
    pub date_to: Option<String>,
}

/// Record details combined with its document list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordSummary {
    /// Full record snapshot.
    pub record: Record,
    /// Documents reported by the document list endpoint.
    pub documents: Vec<Value>,
    /// Number of entries in `documents`.
    pub total_documents: usize,
    /// Record status.
    pub status: RecordStatus,
    /// Configuration reference.
    pub configuration_ref: Option<String>,
    /// Creation timestamp as reported.
    pub created_at: Option<String>,
    /// Completion timestamp as reported.
    pub completed_at: Option<String>,
}

/// Decode a JSON payload into a typed response.
pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|err| NebuiaError::Decode(err.to_string()))
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
