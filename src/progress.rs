//! Progress channel between the worker and the presentation thread
//!
//! Single producer, single consumer, unbounded and FIFO. Sending never blocks;
//! the consumer drains whatever is queued on each poll and tolerates an empty
//! channel.

use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::models::CollectionResult;

/// One message from the worker.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    /// Human-readable status line
    Status(String),
    /// Login failed or was abandoned; the run is over and nothing will be exported
    AuthenticationFailed(String),
    /// Final (possibly partial) result of the run
    Completed(CollectionResult),
}

pub fn channel() -> (ProgressSink, ProgressStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ProgressSink { tx }, ProgressStream { rx })
}

/// Producer side, held by the worker.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    tx: UnboundedSender<Progress>,
}

impl ProgressSink {
    /// Sends a status line and mirrors it to the debug log.
    pub fn status(&self, message: impl Into<String>) {
        let message = message.into();
        debug!("{}", message);
        self.push(Progress::Status(message));
    }

    pub fn push(&self, progress: Progress) {
        // A closed receiver means nobody is watching; the run still finishes.
        let _ = self.tx.send(progress);
    }
}

/// Messages available at one poll.
#[derive(Debug, Default)]
pub struct Drained {
    pub messages: Vec<Progress>,
    /// The worker dropped its sink; no further messages will arrive
    pub closed: bool,
}

/// Consumer side, held by the presentation thread.
#[derive(Debug)]
pub struct ProgressStream {
    rx: UnboundedReceiver<Progress>,
}

impl ProgressStream {
    pub fn try_next(&mut self) -> Result<Option<Progress>, TryRecvError> {
        match self.rx.try_recv() {
            Ok(progress) => Ok(Some(progress)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Takes every queued message without waiting.
    pub fn drain(&mut self) -> Drained {
        let mut drained = Drained::default();
        loop {
            match self.try_next() {
                Ok(Some(progress)) => drained.messages.push(progress),
                Ok(None) => break,
                Err(_) => {
                    drained.closed = true;
                    break;
                }
            }
        }
        drained
    }
}
