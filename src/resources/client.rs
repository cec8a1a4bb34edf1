use crate::config::Config;
use crate::error::Result;
use crate::resources::types::{DocumentStatus, ProcessingJob, Record, VerificationResult};
use crate::transport::{CommandLog, Transport};
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Typed client over every remote capability of the Nebuia API.
///
/// Operations live in per-resource modules (`records`, `documents`, `configurations`, `jobs`);
/// this type only owns the transport and the upload timeout.
pub struct NebuiaClient {
    pub(crate) transport: Transport,
    pub(crate) upload_timeout: Duration,
}

/// Remote operations the document workflow depends on.
#[async_trait]
pub trait NebuiaApi: Send + Sync {
    /// Create a record for a configuration.
    async fn create_record(&self, configuration_ref: &str) -> Result<Record>;

    /// Fetch the current snapshot of a record.
    async fn get_record_details(&self, record_id: &str) -> Result<Record>;

    /// Upload one PDF under a document type.
    async fn upload_document(
        &self,
        record_id: &str,
        file_path: &Path,
        document_type: &str,
    ) -> Result<Value>;

    /// Embedding status of one document, served by the embeddings origin.
    async fn get_document_status(&self, document_id: &str) -> Result<DocumentStatus>;

    /// Check a document's declared type against the service's classification.
    async fn verify_document_type(
        &self,
        record_id: &str,
        document_type_id: &str,
    ) -> Result<VerificationResult>;

    /// Trigger the processing job for a record.
    async fn create_processing_job(&self, record_id: &str) -> Result<ProcessingJob>;
}

impl NebuiaClient {
    /// Build a client from configuration, constructing the curl sink it describes.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_command_log(config, Arc::new(CommandLog::new(&config.curl_log)))
    }

    /// Build a client that reports into an existing curl sink.
    pub fn with_command_log(config: &Config, command_log: Arc<CommandLog>) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(config, command_log)?,
            upload_timeout: config.upload_timeout,
        })
    }

    /// Client identifier used in API paths.
    pub fn client_id(&self) -> &str {
        self.transport.client_id()
    }

    pub(crate) fn client_path(&self, suffix: &str) -> String {
        format!("/clients/{}/{}", self.client_id(), suffix.trim_start_matches('/'))
    }
}

#[async_trait]
impl NebuiaApi for NebuiaClient {
    async fn create_record(&self, configuration_ref: &str) -> Result<Record> {
        NebuiaClient::create_record(self, configuration_ref).await
    }

    async fn get_record_details(&self, record_id: &str) -> Result<Record> {
        NebuiaClient::get_record_details(self, record_id).await
    }

    async fn upload_document(
        &self,
        record_id: &str,
        file_path: &Path,
        document_type: &str,
    ) -> Result<Value> {
        NebuiaClient::upload_document(self, record_id, file_path, document_type).await
    }

    async fn get_document_status(&self, document_id: &str) -> Result<DocumentStatus> {
        NebuiaClient::get_document_status(self, document_id).await
    }

    async fn verify_document_type(
        &self,
        record_id: &str,
        document_type_id: &str,
    ) -> Result<VerificationResult> {
        NebuiaClient::verify_document_type(self, record_id, document_type_id).await
    }

    async fn create_processing_job(&self, record_id: &str) -> Result<ProcessingJob> {
        NebuiaClient::create_processing_job(self, record_id).await
    }
}
