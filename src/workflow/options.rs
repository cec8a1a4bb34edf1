use crate::polling::PollSettings;
use std::time::Duration;

/// Tunables for one document-processing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowOptions {
    /// Wait for the record to finish after the job is created.
    pub wait_for_completion: bool,
    /// Budget for the completion wait.
    pub completion_timeout: Duration,
    /// Interval between record fetches while waiting for completion.
    pub completion_interval: Duration,
    /// Create the processing job when every verification passed.
    pub auto_process: bool,
    /// Interval between embedding status checks.
    pub status_check_interval: Duration,
    /// Budget for the embedding wait.
    pub status_check_timeout: Duration,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            wait_for_completion: true,
            completion_timeout: Duration::from_secs(300),
            completion_interval: Duration::from_secs(10),
            auto_process: true,
            status_check_interval: Duration::from_secs(5),
            status_check_timeout: Duration::from_secs(180),
        }
    }
}

impl WorkflowOptions {
    pub(crate) fn embedding_poll(&self) -> PollSettings {
        PollSettings::new(self.status_check_interval, self.status_check_timeout)
    }

    pub(crate) fn completion_poll(&self) -> PollSettings {
        PollSettings::new(self.completion_interval, self.completion_timeout)
    }
}

/// Settings for [`crate::workflow::DocumentWorkflow::process_batch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Maximum runs in flight; `0` and `1` run sequentially.
    pub concurrency: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self { concurrency: 1 }
    }
}
