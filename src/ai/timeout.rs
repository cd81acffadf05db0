use super::error::{ChatError, ChatResult};
use std::future::Future;
use std::time::Duration;

/// Race `operation` against `limit`.
///
/// Whichever side loses is dropped: the timer never outlives the call, and an
/// operation that misses the deadline is abandoned locally without any abort
/// being sent upstream. Failures that arrive before the deadline propagate
/// unchanged.
pub async fn with_timeout<F, T>(operation: F, limit: Duration) -> ChatResult<T>
where
    F: Future<Output = ChatResult<T>>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(limit_ms = limit.as_millis() as u64, "model response timed out");
            Err(ChatError::Timeout)
        }
    }
}
