//! Single-slot handoff of the final result from the polling task to the caller.
//!
//! The sender is consumed by [`ResultSender::deliver`], so at most one value can ever
//! be written. Dropping the sender without delivering closes the channel empty, which
//! is how aborted and cancelled runs end.

use std::fmt;
use tokio::sync::oneshot;

/// Notice delivered when the deadline passes before the operation finishes.
pub const TIMEOUT_NOTICE: &str = "transcription interrupted by timeout";

/// Value handed to the caller at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Transcript(String),
    TimedOut,
}

impl fmt::Display for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delivery::Transcript(text) => f.write_str(text),
            Delivery::TimedOut => f.write_str(TIMEOUT_NOTICE),
        }
    }
}

pub struct ResultSender(oneshot::Sender<Delivery>);

pub struct ResultReceiver(Option<oneshot::Receiver<Delivery>>);

/// Create a connected sender/receiver pair.
pub fn channel() -> (ResultSender, ResultReceiver) {
    let (tx, rx) = oneshot::channel();
    (ResultSender(tx), ResultReceiver(Some(rx)))
}

impl ResultSender {
    /// Write the one and only value and close the channel.
    ///
    /// Never blocks. A receiver that is already gone is not an error for the producer.
    pub fn deliver(self, delivery: Delivery) {
        if self.0.send(delivery).is_err() {
            log::debug!("Result receiver dropped before delivery");
        }
    }
}

impl ResultReceiver {
    /// Wait for the value; `None` when the channel closed without one.
    ///
    /// Cancel-safe: dropping the future before it completes keeps the channel open.
    /// Once a value or the close has been observed, later calls return `None`.
    pub async fn recv(&mut self) -> Option<Delivery> {
        let rx = self.0.as_mut()?;
        let delivery = rx.await.ok();
        self.0 = None;
        delivery
    }
}
