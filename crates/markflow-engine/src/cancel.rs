//! Cooperative cancellation of a pipeline run.
//!
//! A run checks its [`CancelSignal`] between plugin stages. A transform that
//! is already running is never interrupted.

use std::sync::Arc;

use tokio::sync::watch;

/// Rule id of the message a cancelled run leaves on its file.
pub const CANCELLED_RULE: &str = "cancelled";

/// Message source used for diagnostics raised by the pipeline itself.
pub const PIPELINE_SOURCE: &str = "markflow";

/// Receiving half, handed to [`Processor::process_with_cancel`](crate::Processor::process_with_cancel).
#[derive(Debug, Clone)]
pub struct CancelSignal {
    receiver: watch::Receiver<bool>,
}

/// Sending half. Cloning it gives another handle to the same signal.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    sender: Arc<watch::Sender<bool>>,
}

/// Create a connected handle and signal.
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (sender, receiver) = watch::channel(false);
    (
        CancelHandle {
            sender: Arc::new(sender),
        },
        CancelSignal { receiver },
    )
}

impl CancelHandle {
    /// Ask every run holding a matching signal to stop at its next stage boundary.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            receiver: self.sender.subscribe(),
        }
    }
}

impl CancelSignal {
    /// A signal nothing can raise.
    pub fn never() -> Self {
        let (_, receiver) = watch::channel(false);
        Self { receiver }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }
}
