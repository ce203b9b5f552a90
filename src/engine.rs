#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Bounded worker pool for independent grading units.
//!
//! Units are queued with their input index. Each worker pops units until the
//! queue is empty and writes every result into the slot of its index, so the
//! output order always matches the input order. A worker whose unit fails
//! stores the error and stops pulling work; the remaining workers finish what
//! they are doing and drain the queue. Once every worker has returned, the
//! first error found in index order is returned and all results are dropped.

use std::{
    any::Any,
    collections::VecDeque,
    future::Future,
    panic::AssertUnwindSafe,
    sync::{Arc, Mutex, OnceLock},
};

use anyhow::{Result, anyhow};
use futures::FutureExt;
use tokio::task::JoinSet;

/// Runs grading units on a bounded pool of tokio tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradingEngine {
    /// Maximum number of units in flight.
    workers: usize,
}

impl Default for GradingEngine {
    fn default() -> Self {
        Self::new(Self::default_workers())
    }
}

/// Pending units, shared by all workers.
type WorkQueue<U> = Mutex<VecDeque<(usize, U)>>;

/// Extracts something printable from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Pops the next unit, tolerating a poisoned lock.
fn next_unit<U>(queue: &WorkQueue<U>) -> Option<(usize, U)> {
    match queue.lock() {
        Ok(mut pending) => pending.pop_front(),
        Err(poisoned) => poisoned.into_inner().pop_front(),
    }
}

impl GradingEngine {
    /// An engine running at most `workers` units at once (at least one).
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Twice the number of logical CPUs, since most units spend their time
    /// waiting on a tester subprocess.
    pub fn default_workers() -> usize {
        2 * num_cpus::get()
    }

    /// Configured pool size.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Grades every unit with `grade_unit(index, unit)` and returns the results
    /// in input order, or the first error in input order if any unit failed.
    /// A panicking unit counts as a failed unit.
    pub async fn run<U, T, F, Fut>(&self, units: Vec<U>, grade_unit: F) -> Result<Vec<T>>
    where
        U: Send + 'static,
        T: Send + Sync + 'static,
        F: Fn(usize, U) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let len = units.len();
        if len == 0 {
            return Ok(Vec::new());
        }

        let queue: Arc<WorkQueue<U>> = Arc::new(Mutex::new(units.into_iter().enumerate().collect()));
        let slots: Arc<Vec<OnceLock<Result<T>>>> =
            Arc::new((0..len).map(|_| OnceLock::new()).collect());
        let grade_unit = Arc::new(grade_unit);

        let mut pool = JoinSet::new();
        for worker in 0..self.workers.min(len) {
            let queue = Arc::clone(&queue);
            let slots = Arc::clone(&slots);
            let grade_unit = Arc::clone(&grade_unit);

            pool.spawn(async move {
                while let Some((index, unit)) = next_unit(&queue) {
                    tracing::debug!(worker, index, "grading unit");
                    let outcome = AssertUnwindSafe(grade_unit(index, unit))
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|payload| {
                            Err(anyhow!(
                                "grading unit {index} panicked: {}",
                                panic_message(payload.as_ref())
                            ))
                        });

                    let failed = outcome.is_err();
                    // Each index is popped exactly once, so the slot is empty.
                    let _ = slots[index].set(outcome);
                    if failed {
                        tracing::debug!(worker, index, "unit failed, worker stops pulling work");
                        break;
                    }
                }
            });
        }

        let mut cancelled = None;
        while let Some(joined) = pool.join_next().await {
            if let Err(err) = joined {
                cancelled.get_or_insert(err);
            }
        }
        if let Some(err) = cancelled {
            return Err(anyhow!("a grading worker did not finish: {err}"));
        }

        let slots = Arc::try_unwrap(slots)
            .map_err(|_| anyhow!("grading workers still hold the result slots"))?;

        // Units are popped in index order, so any never-run slot comes after
        // the failure that stopped its worker.
        let mut results = Vec::with_capacity(len);
        for (index, slot) in slots.into_iter().enumerate() {
            match slot.into_inner() {
                Some(Ok(value)) => results.push(value),
                Some(Err(err)) => {
                    tracing::error!(index, "grading unit failed, discarding the whole batch: {err}");
                    return Err(err);
                }
                None => return Err(anyhow!("grading unit {index} was never graded")),
            }
        }

        Ok(results)
    }
}
