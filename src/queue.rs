//! Submission queue.
//!
//! A bounded in-memory channel between intake and the single judge worker.
//! Sends never block: when the queue is full the submission is rejected and
//! the caller reports the overload.

use thiserror::Error;
use tokio::sync::mpsc;

/// Queue capacity. 50 users times the 100-submission lifetime cap, so a
/// well-behaved contest can never fill it.
pub const QUEUE_CAPACITY: usize = 5000;

#[derive(Debug, Error)]
pub enum EnqueueError {
    #[error("submission queue is full")]
    Full,
    #[error("judge worker is gone")]
    Closed,
}

/// Producer half handed to intake. Cheap to clone.
#[derive(Clone)]
pub struct QueueSender(mpsc::Sender<i64>);

impl QueueSender {
    /// Hand a submission id to the worker without blocking.
    pub fn enqueue(&self, submission_id: i64) -> Result<(), EnqueueError> {
        self.0.try_send(submission_id).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => EnqueueError::Full,
            mpsc::error::TrySendError::Closed(_) => EnqueueError::Closed,
        })
    }
}

/// Create the queue pair with the standard capacity.
pub fn submission_queue() -> (QueueSender, mpsc::Receiver<i64>) {
    with_capacity(QUEUE_CAPACITY)
}

/// Create a queue with an explicit capacity.
pub fn with_capacity(capacity: usize) -> (QueueSender, mpsc::Receiver<i64>) {
    let (tx, rx) = mpsc::channel(capacity);
    (QueueSender(tx), rx)
}
