//! Generic wait loops used by the workflow.
//!
//! Both loops run inline on the caller's task: the first check happens immediately, sleeps use
//! the tokio clock and a [`Cancellation`] handle can interrupt them at any point.

mod cancellation;
mod loops;
mod observer;

pub use cancellation::{CancelHandle, Cancellation};
pub use loops::{PollSettings, wait_for_all_terminal, wait_for_entity_terminal};
pub use observer::{LoggingObserver, PollStatus, PolledEntity, StatusObserver};
