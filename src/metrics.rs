use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing workflow activity.
#[derive(Default)]
pub struct WorkflowMetrics {
    records_created: AtomicU64,
    documents_uploaded: AtomicU64,
    upload_failures: AtomicU64,
    verifications_passed: AtomicU64,
    verifications_failed: AtomicU64,
    jobs_created: AtomicU64,
}

impl WorkflowMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly created record.
    pub fn record_created(&self) {
        self.records_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of one document upload.
    pub fn record_upload(&self, succeeded: bool) {
        let counter = if succeeded {
            &self.documents_uploaded
        } else {
            &self.upload_failures
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of one type verification.
    pub fn record_verification(&self, passed: bool) {
        let counter = if passed {
            &self.verifications_passed
        } else {
            &self.verifications_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a processing job that was created.
    pub fn record_job(&self) {
        self.jobs_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_created: self.records_created.load(Ordering::Relaxed),
            documents_uploaded: self.documents_uploaded.load(Ordering::Relaxed),
            upload_failures: self.upload_failures.load(Ordering::Relaxed),
            verifications_passed: self.verifications_passed.load(Ordering::Relaxed),
            verifications_failed: self.verifications_failed.load(Ordering::Relaxed),
            jobs_created: self.jobs_created.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of workflow counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Records created since startup.
    pub records_created: u64,
    /// Documents uploaded successfully.
    pub documents_uploaded: u64,
    /// Uploads that failed and were dropped from the run.
    pub upload_failures: u64,
    /// Type verifications that passed.
    pub verifications_passed: u64,
    /// Type verifications that failed or errored.
    pub verifications_failed: u64,
    /// Processing jobs created.
    pub jobs_created: u64,
}
