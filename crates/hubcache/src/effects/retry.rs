use std::future::Future;

use tracing::warn;

use crate::data::RetryPolicy;
use crate::error::{Error, Result};

/// Run `attempt` until it succeeds, fails terminally, or `policy` runs out.
///
/// `attempt` receives the 1-based attempt number. A non-retryable error is
/// returned as is after the attempt that produced it; running out wraps the
/// last error in [`Error::RetriesExhausted`].
pub async fn with_retries<T, F, Fut>(
    policy: RetryPolicy,
    provider: &'static str,
    mut attempt: F,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut number = 1;
    loop {
        let error = match attempt(number).await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };
        if !error.is_retryable() {
            return Err(error);
        }
        if number >= max_attempts {
            return Err(Error::RetriesExhausted {
                provider,
                attempts: number,
                source: Box::new(error),
            });
        }

        let delay = policy.delay_after(number);
        warn!(provider, attempt = number, max_attempts, ?delay, error = %error, "attempt failed, retrying");
        tokio::time::sleep(delay).await;
        number += 1;
    }
}
