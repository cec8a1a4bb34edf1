use crate::resources::{EmbeddingStatus, Record, RecordStatus};
use std::fmt::Display;
use std::time::Duration;

/// Status values that can end a wait loop.
pub trait PollStatus: Display {
    /// Terminal success sentinel (`complete`).
    fn is_success(&self) -> bool;
    /// Terminal failure sentinel (`error`).
    fn is_failure(&self) -> bool;
}

impl PollStatus for RecordStatus {
    fn is_success(&self) -> bool {
        matches!(self, Self::Complete)
    }

    fn is_failure(&self) -> bool {
        matches!(self, Self::Error)
    }
}

impl PollStatus for EmbeddingStatus {
    fn is_success(&self) -> bool {
        matches!(self, Self::Complete)
    }

    fn is_failure(&self) -> bool {
        matches!(self, Self::Error)
    }
}

/// Entity fetched repeatedly until it reaches a terminal status.
pub trait PolledEntity {
    /// Status type carried by the entity.
    type Status: PollStatus;

    /// Current status of this snapshot.
    fn status(&self) -> Self::Status;

    /// Message reported when the entity failed.
    fn failure_message(&self) -> String;
}

impl PolledEntity for Record {
    type Status = RecordStatus;

    fn status(&self) -> RecordStatus {
        self.status.clone()
    }

    fn failure_message(&self) -> String {
        self.error_message
            .clone()
            .unwrap_or_else(|| "Unknown error".to_string())
    }
}

/// Receives every snapshot observed by [`crate::polling::wait_for_entity_terminal`].
pub trait StatusObserver<T>: Send + Sync {
    /// Called on every poll, including when the status did not change.
    fn on_update(&self, status: &str, elapsed: Duration, snapshot: &T);
}

impl<T, F> StatusObserver<T> for F
where
    F: Fn(&str, Duration, &T) + Send + Sync,
{
    fn on_update(&self, status: &str, elapsed: Duration, snapshot: &T) {
        self(status, elapsed, snapshot)
    }
}

/// Default observer: logs record status, job activity and the document in progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl StatusObserver<Record> for LoggingObserver {
    fn on_update(&self, status: &str, elapsed: Duration, snapshot: &Record) {
        let seconds = elapsed.as_secs();
        tracing::info!(
            record_id = %snapshot.id,
            status,
            jobs_running = snapshot.is_processing(),
            elapsed = %format!("{}m {}s", seconds / 60, seconds % 60),
            "Record status update"
        );
        if let Some(document_id) = snapshot.current_document_id() {
            tracing::info!(record_id = %snapshot.id, document_id, "Currently processing document");
        }
    }
}
