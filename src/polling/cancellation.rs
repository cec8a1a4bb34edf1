use tokio::sync::watch;

/// Receiving side of a cancellation signal, cheap to clone into every loop.
#[derive(Clone, Debug, Default)]
pub struct Cancellation {
    receiver: Option<watch::Receiver<bool>>,
}

/// Sending side of a cancellation signal.
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl Cancellation {
    /// Create a linked handle and token.
    pub fn new() -> (CancelHandle, Self) {
        let (sender, receiver) = watch::channel(false);
        (
            CancelHandle { sender },
            Self {
                receiver: Some(receiver),
            },
        )
    }

    /// Token that is never cancelled.
    pub fn never() -> Self {
        Self { receiver: None }
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.receiver
            .as_ref()
            .is_some_and(|receiver| *receiver.borrow())
    }

    /// Resolve once cancellation is requested; pends forever otherwise.
    pub async fn cancelled(&self) {
        if let Some(receiver) = &self.receiver {
            let mut receiver = receiver.clone();
            if receiver.wait_for(|cancelled| *cancelled).await.is_ok() {
                return;
            }
        }
        std::future::pending::<()>().await;
    }
}

impl CancelHandle {
    /// Signal every linked token.
    pub fn cancel(&self) {
        let _ = self.sender.send(true);
    }
}
