use crate::error::{NebuiaError, Result};
use crate::polling::cancellation::Cancellation;
use crate::polling::observer::{PollStatus, PolledEntity, StatusObserver};
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Interval between checks and the total wall-clock budget of a wait loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Delay between two rounds of checks.
    pub interval: Duration,
    /// Budget after which the loop gives up.
    pub timeout: Duration,
}

impl PollSettings {
    /// Build settings from an interval and a timeout.
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

async fn pause(interval: Duration, cancel: &Cancellation) -> Result<()> {
    tokio::select! {
        _ = tokio::time::sleep(interval) => Ok(()),
        _ = cancel.cancelled() => Err(NebuiaError::Cancelled),
    }
}

/// Wait until every tracked item reports the terminal success status.
///
/// `items` maps a label (the document type) to the id passed to `check`. Each round checks every
/// pending item, dropping those that completed; a failed check keeps the item pending. Returns
/// `Ok(true)` once nothing is pending and `Ok(false)` when the budget runs out first.
pub async fn wait_for_all_terminal<S, F, Fut>(
    items: &BTreeMap<String, String>,
    mut check: F,
    settings: PollSettings,
    cancel: &Cancellation,
) -> Result<bool>
where
    S: PollStatus,
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<S>>,
{
    let start = Instant::now();
    let mut pending: Vec<(&str, &str)> = items
        .iter()
        .map(|(label, id)| (label.as_str(), id.as_str()))
        .collect();

    loop {
        if cancel.is_cancelled() {
            return Err(NebuiaError::Cancelled);
        }

        let mut still_pending = Vec::with_capacity(pending.len());
        for (label, id) in pending {
            match check(id.to_string()).await {
                Ok(status) if status.is_success() => {
                    tracing::debug!(label, id, "Item reached terminal status");
                }
                Ok(status) => {
                    tracing::debug!(label, id, %status, "Item still pending");
                    still_pending.push((label, id));
                }
                Err(error) => {
                    tracing::warn!(label, id, error = %error, "Status check failed");
                    still_pending.push((label, id));
                }
            }
        }
        pending = still_pending;

        if pending.is_empty() {
            tracing::info!(items = items.len(), "All items reached terminal status");
            return Ok(true);
        }

        tracing::info!(pending = pending.len(), "Waiting for items to finish");
        pause(settings.interval, cancel).await?;

        if start.elapsed() >= settings.timeout {
            tracing::warn!(
                pending = pending.len(),
                timeout_secs = settings.timeout.as_secs(),
                "Timed out waiting for items"
            );
            return Ok(false);
        }
    }
}

/// Re-fetch one entity until it completes, fails or the budget runs out.
///
/// The first fetch happens immediately. Every snapshot is passed to `observer`; without one the
/// status is logged. Fetch errors end the loop.
pub async fn wait_for_entity_terminal<T, F, Fut>(
    id: &str,
    mut fetch: F,
    settings: PollSettings,
    observer: Option<&dyn StatusObserver<T>>,
    cancel: &Cancellation,
) -> Result<T>
where
    T: PolledEntity,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let start = Instant::now();

    while start.elapsed() < settings.timeout {
        if cancel.is_cancelled() {
            return Err(NebuiaError::Cancelled);
        }

        let snapshot = fetch().await?;
        let status = snapshot.status();
        let elapsed = start.elapsed();
        let label = status.to_string();
        match observer {
            Some(observer) => observer.on_update(&label, elapsed, &snapshot),
            None => tracing::info!(id, status = %label, elapsed_secs = elapsed.as_secs(), "Status update"),
        }

        if status.is_success() {
            tracing::info!(id, elapsed_secs = elapsed.as_secs(), "Completed");
            return Ok(snapshot);
        }
        if status.is_failure() {
            let message = snapshot.failure_message();
            tracing::error!(id, error = %message, "Processing failed");
            return Err(NebuiaError::RemoteProcessing(message));
        }

        pause(settings.interval, cancel).await?;
    }

    tracing::error!(id, timeout_secs = settings.timeout.as_secs(), "Timed out waiting for completion");
    Err(NebuiaError::Timeout {
        entity: id.to_string(),
        seconds: settings.timeout.as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{EmbeddingStatus, Record, RecordStatus};
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    fn record(status: RecordStatus) -> Record {
        Record {
            id: "rec-1".into(),
            status,
            ..Record::default()
        }
    }

    fn scripted(statuses: Vec<Record>) -> Mutex<VecDeque<Record>> {
        Mutex::new(statuses.into())
    }

    fn settings(interval: u64, timeout: u64) -> PollSettings {
        PollSettings::new(Duration::from_secs(interval), Duration::from_secs(timeout))
    }

    #[tokio::test(start_paused = true)]
    async fn entity_returns_completed_snapshot() {
        let script = scripted(vec![
            record(RecordStatus::Waiting),
            record(RecordStatus::Processing),
            record(RecordStatus::Complete),
        ]);
        let seen = Mutex::new(Vec::new());
        let observer = |status: &str, _: Duration, _: &Record| {
            seen.lock().expect("lock").push(status.to_string());
        };
        let start = Instant::now();

        let result = wait_for_entity_terminal(
            "rec-1",
            || {
                let next = script.lock().expect("lock").pop_front();
                async move { next.ok_or_else(|| NebuiaError::Validation("exhausted".into())) }
            },
            settings(1, 10),
            Some(&observer),
            &Cancellation::never(),
        )
        .await
        .expect("complete");

        assert_eq!(result.status, RecordStatus::Complete);
        assert!(start.elapsed() >= Duration::from_secs(2));
        assert_eq!(
            *seen.lock().expect("lock"),
            vec!["waiting", "processing", "complete"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn entity_error_surfaces_message() {
        let mut failed = record(RecordStatus::Error);
        failed.error_message = Some("OCR crashed".into());
        let script = scripted(vec![record(RecordStatus::Waiting), failed]);

        let error = wait_for_entity_terminal(
            "rec-1",
            || {
                let next = script.lock().expect("lock").pop_front();
                async move { next.ok_or_else(|| NebuiaError::Validation("exhausted".into())) }
            },
            settings(1, 10),
            None,
            &Cancellation::never(),
        )
        .await
        .expect_err("failed");

        assert!(matches!(error, NebuiaError::RemoteProcessing(ref message) if message == "OCR crashed"));
    }

    #[tokio::test(start_paused = true)]
    async fn entity_times_out() {
        let calls = Mutex::new(0u32);
        let error = wait_for_entity_terminal(
            "rec-1",
            || {
                *calls.lock().expect("lock") += 1;
                async { Ok::<_, NebuiaError>(record(RecordStatus::Processing)) }
            },
            settings(1, 3),
            None,
            &Cancellation::never(),
        )
        .await
        .expect_err("timeout");

        match error {
            NebuiaError::Timeout { entity, seconds } => {
                assert_eq!(entity, "rec-1");
                assert_eq!(seconds, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(*calls.lock().expect("lock"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn entity_fetch_errors_propagate() {
        let error = wait_for_entity_terminal::<Record, _, _>(
            "rec-1",
            || async { Err(NebuiaError::Decode("truncated body".into())) },
            settings(1, 10),
            None,
            &Cancellation::never(),
        )
        .await
        .expect_err("network");
        assert!(matches!(error, NebuiaError::Decode(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn entity_wait_stops_on_cancel() {
        let (handle, token) = Cancellation::new();
        let calls = Mutex::new(0u32);
        let error = wait_for_entity_terminal(
            "rec-1",
            || {
                let mut calls = calls.lock().expect("lock");
                *calls += 1;
                if *calls == 2 {
                    handle.cancel();
                }
                async { Ok::<_, NebuiaError>(record(RecordStatus::Processing)) }
            },
            settings(1, 60),
            None,
            &token,
        )
        .await
        .expect_err("cancelled");

        assert!(matches!(error, NebuiaError::Cancelled));
        assert_eq!(*calls.lock().expect("lock"), 2);
    }

    fn documents() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("deed".to_string(), "doc-a".to_string()),
            ("id_card".to_string(), "doc-b".to_string()),
        ])
    }

    #[tokio::test(start_paused = true)]
    async fn all_items_complete_after_retries() {
        let calls: Mutex<HashMap<String, u32>> = Mutex::new(HashMap::new());
        let complete = wait_for_all_terminal(
            &documents(),
            |id| {
                let count = {
                    let mut calls = calls.lock().expect("lock");
                    let entry = calls.entry(id.clone()).or_default();
                    *entry += 1;
                    *entry
                };
                async move {
                    match (id.as_str(), count) {
                        ("doc-a", _) => Ok(EmbeddingStatus::Complete),
                        (_, 1) => Err(NebuiaError::Decode("blip".into())),
                        (_, 2) => Ok(EmbeddingStatus::Pending),
                        _ => Ok(EmbeddingStatus::Complete),
                    }
                }
            },
            settings(2, 30),
            &Cancellation::never(),
        )
        .await
        .expect("wait");

        assert!(complete);
        let calls = calls.lock().expect("lock");
        assert_eq!(calls["doc-a"], 1);
        assert_eq!(calls["doc-b"], 3);
    }

    #[tokio::test(start_paused = true)]
    async fn all_items_checked_before_first_sleep() {
        let calls = Mutex::new(Vec::new());
        let start = Instant::now();
        let complete = wait_for_all_terminal(
            &documents(),
            |id| {
                calls.lock().expect("lock").push((id, start.elapsed()));
                async { Ok::<_, NebuiaError>(EmbeddingStatus::Pending) }
            },
            settings(5, 5),
            &Cancellation::never(),
        )
        .await
        .expect("wait");

        assert!(!complete);
        let calls = calls.lock().expect("lock");
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|(_, at)| *at == Duration::ZERO));
    }

    #[tokio::test(start_paused = true)]
    async fn errored_embeddings_stay_pending() {
        let complete = wait_for_all_terminal(
            &documents(),
            |_| async { Ok::<_, NebuiaError>(EmbeddingStatus::Error) },
            settings(1, 3),
            &Cancellation::never(),
        )
        .await
        .expect("wait");
        assert!(!complete);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_item_set_is_complete() {
        let complete = wait_for_all_terminal(
            &BTreeMap::new(),
            |_| async { Ok::<_, NebuiaError>(EmbeddingStatus::Pending) },
            settings(1, 3),
            &Cancellation::never(),
        )
        .await
        .expect("wait");
        assert!(complete);
    }

    #[tokio::test(start_paused = true)]
    async fn all_items_wait_stops_on_cancel() {
        let (handle, token) = Cancellation::new();
        handle.cancel();
        let error = wait_for_all_terminal(
            &documents(),
            |_| async { Ok::<_, NebuiaError>(EmbeddingStatus::Pending) },
            settings(1, 30),
            &token,
        )
        .await
        .expect_err("cancelled");
        assert!(matches!(error, NebuiaError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn observer_receives_raw_unrecognised_status() {
        let script = scripted(vec![
            record(RecordStatus::Other("queued_for_review".into())),
            record(RecordStatus::Complete),
        ]);
        let seen = Mutex::new(Vec::new());
        let observer = |status: &str, _: Duration, _: &Record| {
            seen.lock().expect("lock").push(status.to_string());
        };

        wait_for_entity_terminal(
            "rec-1",
            || {
                let next = script.lock().expect("lock").pop_front();
                async move { next.ok_or_else(|| NebuiaError::Validation("exhausted".into())) }
            },
            settings(1, 10),
            Some(&observer),
            &Cancellation::never(),
        )
        .await
        .expect("complete");

        assert_eq!(*seen.lock().expect("lock"), vec!["queued_for_review", "complete"]);
    }
}
