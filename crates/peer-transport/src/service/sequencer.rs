//! # Transaction Admission Sequencer
//!
//! A single worker task drains a queue of jobs one at a time, so no two
//! admissions ever interleave their reads and writes of ledger state.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

use crate::domain::SequenceError;

type Job = BoxFuture<'static, ()>;

/// Strict-order task queue.
#[derive(Clone)]
pub struct Sequencer {
    jobs: mpsc::Sender<Job>,
}

impl Sequencer {
    /// Start the worker. Must be called within a Tokio runtime.
    pub fn spawn(capacity: usize) -> Self {
        let (jobs, mut queue) = mpsc::channel::<Job>(capacity.max(1));
        tokio::spawn(async move {
            while let Some(job) = queue.recv().await {
                // A panicking job drops its reply; later jobs still run.
                if AssertUnwindSafe(job).catch_unwind().await.is_err() {
                    error!("Sequenced task panicked");
                }
            }
            debug!("Sequencer stopped");
        });
        Self { jobs }
    }

    /// Run `task` after every previously added task has completed.
    pub async fn add<F, T>(&self, task: F) -> Result<T, SequenceError>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply, outcome) = oneshot::channel();
        let job: Job = Box::pin(async move {
            let _ = reply.send(task.await);
        });

        self.jobs
            .send(job)
            .await
            .map_err(|_| SequenceError::Closed)?;
        outcome.await.map_err(|_| SequenceError::Dropped)
    }
}
