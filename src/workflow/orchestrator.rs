//! Record creation, upload, embedding wait, type verification and job processing.

use crate::error::{NebuiaError, Result};
use crate::metrics::{MetricsSnapshot, WorkflowMetrics};
use crate::polling::{
    Cancellation, LoggingObserver, StatusObserver, wait_for_all_terminal,
    wait_for_entity_terminal,
};
use crate::resources::{NebuiaApi, Record, VerificationResult};
use crate::workflow::options::{BatchOptions, WorkflowOptions};
use crate::workflow::validate::validate_documents;
use futures_util::future::join_all;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Drives one document-processing run end to end.
///
/// The workflow never returns an error: every failure is logged and the run yields either the
/// best-known record snapshot or `None`. Share one instance across runs so metrics accumulate.
pub struct DocumentWorkflow {
    api: Arc<dyn NebuiaApi>,
    options: WorkflowOptions,
    metrics: Arc<WorkflowMetrics>,
    observer: Arc<dyn StatusObserver<Record>>,
    cancel: Cancellation,
}

struct UploadedRecord {
    record_id: String,
    document_ids: BTreeMap<String, String>,
    failed: Vec<String>,
}

impl DocumentWorkflow {
    /// Build a workflow with default options and a logging status observer.
    pub fn new(api: Arc<dyn NebuiaApi>) -> Self {
        Self {
            api,
            options: WorkflowOptions::default(),
            metrics: Arc::new(WorkflowMetrics::new()),
            observer: Arc::new(LoggingObserver),
            cancel: Cancellation::never(),
        }
    }

    /// Replace the run options.
    pub fn with_options(mut self, options: WorkflowOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the observer notified while waiting for completion.
    pub fn with_observer(mut self, observer: Arc<dyn StatusObserver<Record>>) -> Self {
        self.observer = observer;
        self
    }

    /// Report into an existing metrics accumulator.
    pub fn with_metrics(mut self, metrics: Arc<WorkflowMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Stop every wait loop when `cancel` fires.
    pub fn with_cancellation(mut self, cancel: Cancellation) -> Self {
        self.cancel = cancel;
        self
    }

    /// Options in effect.
    pub fn options(&self) -> &WorkflowOptions {
        &self.options
    }

    /// Current counters.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Create a record, upload `documents`, verify their types and process the record.
    ///
    /// Returns `None` when no document is valid, no upload succeeded or an unexpected error
    /// ended the run. When embedding does not finish in time the plain record is returned
    /// without verification.
    pub async fn process_documents(
        &self,
        configuration_ref: &str,
        documents: &BTreeMap<String, PathBuf>,
    ) -> Option<Record> {
        match self.run(configuration_ref, documents).await {
            Ok(record) => record,
            Err(error) => {
                tracing::error!(configuration_ref, error = %error, "Document workflow failed");
                None
            }
        }
    }

    /// Run several document sets against one configuration, keeping input order.
    pub async fn process_batch(
        &self,
        configuration_ref: &str,
        document_maps: &[BTreeMap<String, PathBuf>],
        options: BatchOptions,
    ) -> Vec<Option<Record>> {
        tracing::info!(
            configuration_ref,
            runs = document_maps.len(),
            concurrency = options.concurrency,
            "Processing batch"
        );
        if options.concurrency <= 1 {
            let mut results = Vec::with_capacity(document_maps.len());
            for documents in document_maps {
                results.push(self.process_documents(configuration_ref, documents).await);
            }
            return results;
        }

        let semaphore = Semaphore::new(options.concurrency);
        let semaphore = &semaphore;
        let runs = document_maps
            .iter()
            .enumerate()
            .map(|(index, documents)| async move {
                let _permit = semaphore.acquire().await.ok()?;
                tracing::debug!(batch_index = index, "Batch run started");
                self.process_documents(configuration_ref, documents).await
            });
        join_all(runs).await
    }

    async fn run(
        &self,
        configuration_ref: &str,
        documents: &BTreeMap<String, PathBuf>,
    ) -> Result<Option<Record>> {
        let valid = validate_documents(documents);
        if valid.is_empty() {
            tracing::error!(configuration_ref, "No valid documents found, aborting");
            return Ok(None);
        }

        let Some(uploaded) = self.create_and_upload(configuration_ref, &valid).await? else {
            return Ok(None);
        };
        let record_id = uploaded.record_id.as_str();
        let failed_uploads = (!uploaded.failed.is_empty()).then(|| uploaded.failed.clone());

        if !self.wait_for_embedding(&uploaded.document_ids).await? {
            tracing::warn!(record_id, "Embedding did not finish, returning record unverified");
            let mut record = self.api.get_record_details(record_id).await?;
            record.failed_uploads = failed_uploads;
            return Ok(Some(record));
        }

        let (verification_results, passed) = self
            .verify_all_documents(record_id, &uploaded.document_ids)
            .await;
        let mut record = self.api.get_record_details(record_id).await?;
        record.verification_results = Some(verification_results);
        record.failed_uploads = failed_uploads;

        if !passed {
            tracing::warn!(record_id, "Document type verification failed, job not created");
            return Ok(Some(record));
        }
        if !self.options.auto_process {
            tracing::info!(record_id, "Auto-processing disabled, job not created");
            return Ok(Some(record));
        }
        self.process_record(record_id, record).await.map(Some)
    }

    async fn create_and_upload(
        &self,
        configuration_ref: &str,
        documents: &BTreeMap<String, PathBuf>,
    ) -> Result<Option<UploadedRecord>> {
        tracing::info!(configuration_ref, "Creating record");
        let record = self.api.create_record(configuration_ref).await?;
        if record.id.is_empty() {
            tracing::error!(configuration_ref, "Record response carried no id");
            return Ok(None);
        }
        self.metrics.record_created();
        let record_id = record.id;
        tracing::info!(record_id = %record_id, "Record created");

        let mut document_ids = BTreeMap::new();
        let mut failed = Vec::new();
        for (document_type, path) in documents {
            match self.upload_one(&record_id, document_type, path).await {
                Ok(document_id) => {
                    tracing::info!(record_id = %record_id, document_type, document_id = %document_id, "Document uploaded");
                    self.metrics.record_upload(true);
                    document_ids.insert(document_type.clone(), document_id);
                }
                Err(error) => {
                    tracing::error!(record_id = %record_id, document_type, error = %error, "Failed to upload document");
                    self.metrics.record_upload(false);
                    failed.push(document_type.clone());
                }
            }
        }

        if document_ids.is_empty() {
            tracing::error!(record_id = %record_id, "No documents were uploaded");
            return Ok(None);
        }
        Ok(Some(UploadedRecord {
            record_id,
            document_ids,
            failed,
        }))
    }

    async fn upload_one(&self, record_id: &str, document_type: &str, path: &Path) -> Result<String> {
        self.api
            .upload_document(record_id, path, document_type)
            .await?;
        let record = self.api.get_record_details(record_id).await?;
        record
            .document_id_for(document_type)
            .map(str::to_string)
            .ok_or_else(|| {
                NebuiaError::Decode(format!(
                    "uploaded document {document_type} is not listed on record {record_id}"
                ))
            })
    }

    async fn wait_for_embedding(&self, document_ids: &BTreeMap<String, String>) -> Result<bool> {
        tracing::info!(documents = document_ids.len(), "Waiting for embeddings");
        let api = &self.api;
        wait_for_all_terminal(
            document_ids,
            |document_id| async move {
                api.get_document_status(&document_id)
                    .await
                    .map(|document| document.status)
            },
            self.options.embedding_poll(),
            &self.cancel,
        )
        .await
    }

    async fn verify_all_documents(
        &self,
        record_id: &str,
        document_ids: &BTreeMap<String, String>,
    ) -> (BTreeMap<String, VerificationResult>, bool) {
        let mut results = BTreeMap::new();
        let mut passed = true;
        for (document_type, document_id) in document_ids {
            tracing::info!(record_id, document_type, document_id, "Verifying document type");
            let result = match self.api.verify_document_type(record_id, document_id).await {
                Ok(result) => result,
                Err(error) => {
                    tracing::error!(record_id, document_type, error = %error, "Error verifying document type");
                    VerificationResult::errored(error)
                }
            };
            if result.status {
                tracing::info!(record_id, document_type, "Document type verified");
            } else {
                tracing::warn!(
                    record_id,
                    document_type,
                    type_found = ?result.type_document_found,
                    points = ?result.points,
                    "Document type verification failed"
                );
                passed = false;
            }
            self.metrics.record_verification(result.status);
            results.insert(document_type.clone(), result);
        }
        (results, passed)
    }

    /// Create the job and optionally wait; job and wait failures fall back to a fresh snapshot.
    async fn process_record(&self, record_id: &str, verified: Record) -> Result<Record> {
        tracing::info!(record_id, "All document types verified, creating processing job");
        match self.api.create_processing_job(record_id).await {
            Ok(job) => {
                self.metrics.record_job();
                tracing::info!(
                    record_id,
                    job_id = ?job.job_id,
                    status = ?job.status,
                    message = ?job.message,
                    "Processing job created"
                );
                if self.options.wait_for_completion {
                    match self.wait_for_completion(record_id).await {
                        Ok(completed) => return Ok(carry_annotations(&verified, completed)),
                        Err(NebuiaError::Cancelled) => return Err(NebuiaError::Cancelled),
                        Err(error) => {
                            tracing::error!(record_id, error = %error, "Record did not complete")
                        }
                    }
                }
            }
            Err(error) => {
                tracing::error!(record_id, error = %error, "Failed to create processing job")
            }
        }

        match self.api.get_record_details(record_id).await {
            Ok(latest) => Ok(carry_annotations(&verified, latest)),
            Err(error) => {
                tracing::warn!(record_id, error = %error, "Could not refresh record, returning last snapshot");
                Ok(verified)
            }
        }
    }

    async fn wait_for_completion(&self, record_id: &str) -> Result<Record> {
        let settings = self.options.completion_poll();
        tracing::info!(
            record_id,
            timeout_secs = settings.timeout.as_secs(),
            "Waiting for record completion"
        );
        let observer: &dyn StatusObserver<Record> = self.observer.as_ref();
        wait_for_entity_terminal(
            record_id,
            || self.api.get_record_details(record_id),
            settings,
            Some(observer),
            &self.cancel,
        )
        .await
    }
}

fn carry_annotations(from: &Record, mut into: Record) -> Record {
    into.verification_results = from.verification_results.clone();
    into.failed_uploads = from.failed_uploads.clone();
    into
}
