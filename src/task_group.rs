//! Fork/join helper for per-item fan-out.
//!
//! Tasks run independently; `join_all` waits for every one of them and
//! returns results in completion order. A task that panics, or yields `None`,
//! is dropped from the results without cancelling its siblings.

use std::future::Future;
use tokio::task::JoinSet;
use tracing::warn;

pub struct TaskGroup<T> {
    name: &'static str,
    set: JoinSet<Option<T>>,
}

impl<T: Send + 'static> TaskGroup<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            set: JoinSet::new(),
        }
    }

    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = Option<T>> + Send + 'static,
    {
        self.set.spawn(task);
    }

    pub async fn join_all(mut self) -> Vec<T> {
        let mut results = Vec::with_capacity(self.set.len());
        while let Some(joined) = self.set.join_next().await {
            match joined {
                Ok(Some(value)) => results.push(value),
                Ok(None) => {}
                Err(err) => warn!(group = self.name, ?err, "task failed"),
            }
        }
        results
    }
}
