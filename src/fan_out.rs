//! One-task-per-item concurrency with first-error-wins collection.

use std::future::Future;
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::UpstreamError;

/// Spawn one task per item running `work`, then collect every result.
///
/// Fan-out width equals the number of items. Each worker owns a sender clone,
/// so the channel closes once the last worker has reported. The first error
/// read off the channel is returned immediately; workers still in flight are
/// not cancelled and run until their own request finishes, with their output
/// dropped. Results arrive in completion order.
pub async fn fan_out<I, F, Fut, T>(items: I, work: F) -> Result<Vec<T>, UpstreamError>
where
    I: IntoIterator,
    F: Fn(I::Item) -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>> + Send + 'static,
    T: Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut expected = 0usize;

    for item in items {
        let tx = tx.clone();
        let task = work(item);
        tokio::spawn(async move {
            // The receiver is gone once a sibling failed; nothing to report to.
            let _ = tx.send(task.await);
        });
        expected += 1;
    }
    drop(tx);

    let mut results = Vec::with_capacity(expected);
    while let Some(result) = rx.recv().await {
        results.push(result?);
    }

    if results.len() != expected {
        warn!(
            "Fan-out lost {} of {} workers",
            expected - results.len(),
            expected
        );
        return Err(UpstreamError::WorkerLost {
            expected,
            received: results.len(),
        });
    }
    Ok(results)
}
