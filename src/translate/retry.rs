use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

pub(crate) const MAX_RETRIES: usize = 3;
pub(crate) const BASE_DELAY: Duration = Duration::from_secs(1);
const MAX_DELAY: Duration = Duration::from_secs(15);

pub(crate) fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

pub(crate) fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get("retry-after")?.to_str().ok()?.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    None
}

pub(crate) async fn wait_with_backoff(
    attempt: usize,
    delay: Duration,
    retry_after: Option<Duration>,
) -> Duration {
    let mut wait = delay;
    if let Some(retry_after) = retry_after
        && retry_after > wait
    {
        wait = retry_after;
    }
    warn!(
        "translation endpoint busy; retrying in {:.1}s (attempt {}/{})",
        wait.as_secs_f32(),
        attempt,
        MAX_RETRIES
    );
    sleep(wait).await;
    next_delay(delay)
}

pub(crate) fn next_delay(current: Duration) -> Duration {
    let next_secs = current
        .as_secs()
        .saturating_mul(2)
        .max(BASE_DELAY.as_secs());
    let next = Duration::from_secs(next_secs);
    if next > MAX_DELAY { MAX_DELAY } else { next }
}
