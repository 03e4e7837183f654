use crate::domain::error::{MonitoringError, MonitoringResult};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Race `operation` against `cancel`. Dropping the losing future aborts any
/// in-flight HTTP request it owns.
pub async fn run_cancellable<F, T>(cancel: &CancellationToken, operation: F) -> MonitoringResult<T>
where
    F: Future<Output = MonitoringResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(MonitoringError::Cancelled),
        result = operation => result,
    }
}
