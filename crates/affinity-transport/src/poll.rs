//! Bounded-timeout poll over a non-blocking `fetch`.

use std::time::Duration;

use tokio::time::{sleep, Instant};

use affinity_core::errors::AffinityResult;
use affinity_core::traits::{IMessageConsumer, LogRecord};

/// Fetch until records arrive or `timeout` elapses, sleeping `interval`
/// between attempts. Returns an empty batch on timeout.
pub async fn poll<C>(
    consumer: &mut C,
    max_records: usize,
    timeout: Duration,
    interval: Duration,
) -> AffinityResult<Vec<LogRecord>>
where
    C: IMessageConsumer + ?Sized,
{
    let deadline = Instant::now() + timeout;
    loop {
        let records = consumer.fetch(max_records)?;
        if !records.is_empty() {
            return Ok(records);
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(records);
        }
        sleep(interval.min(deadline - now)).await;
    }
}
