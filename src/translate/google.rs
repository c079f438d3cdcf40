use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use std::time::Duration;

use super::retry::{BASE_DELAY, MAX_RETRIES, is_transient, retry_after, wait_with_backoff};
use super::{BackendFuture, TranslationBackend};

const DEFAULT_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Client for the free Google Translate web endpoint. It needs no API
/// key but rate limits aggressively, so busy responses are retried with
/// backoff before a string is given up on.
#[derive(Debug, Clone)]
pub struct GoogleTranslate {
    client: reqwest::Client,
    endpoint: String,
}

impl GoogleTranslate {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint(),
        }
    }

    async fn fetch(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String> {
        let mut attempt = 0usize;
        let mut delay = BASE_DELAY;
        loop {
            attempt += 1;
            let response = self
                .client
                .get(&self.endpoint)
                .query(&[
                    ("client", "gtx"),
                    ("dt", "t"),
                    ("sl", source_lang),
                    ("tl", target_lang),
                    ("q", text),
                ])
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await
                .context("translation request failed")?;

            let status = response.status();
            let retry_after = retry_after(response.headers());
            if status.is_success() {
                let payload: Value = response
                    .json()
                    .await
                    .context("translation response was not valid json")?;
                return extract_translation(&payload)
                    .ok_or_else(|| anyhow!("translation response had no text segments"));
            }
            if is_transient(status) && attempt < MAX_RETRIES {
                delay = wait_with_backoff(attempt, delay, retry_after).await;
                continue;
            }
            return Err(anyhow!("translation endpoint returned {}", status));
        }
    }
}

impl Default for GoogleTranslate {
    fn default() -> Self {
        Self::new()
    }
}

impl TranslationBackend for GoogleTranslate {
    fn translate<'a>(
        &'a self,
        text: &'a str,
        source_lang: &'a str,
        target_lang: &'a str,
    ) -> BackendFuture<'a> {
        Box::pin(async move { self.fetch(text, source_lang, target_lang).await })
    }
}

fn endpoint() -> String {
    std::env::var("GOOGLE_TRANSLATE_BASE_URL").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string())
}

/// The gtx payload is a bare array whose first element lists sentence
/// segments, each `[translated, source, ...]`. Concatenating the first
/// field of every segment yields the full translation.
fn extract_translation(payload: &Value) -> Option<String> {
    let segments = payload.get(0)?.as_array()?;
    let mut out = String::new();
    for segment in segments {
        if let Some(text) = segment.get(0).and_then(Value::as_str) {
            out.push_str(text);
        }
    }
    let trimmed = out.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn concatenates_sentence_segments() {
        let payload = json!([
            [
                ["\u{0928}\u{092e}\u{0938}\u{094d}\u{0924}\u{0947} ", "Hello ", null],
                ["\u{0926}\u{0941}\u{0928}\u{093f}\u{092f}\u{093e}", "world", null]
            ],
            null,
            "en"
        ]);
        assert_eq!(
            extract_translation(&payload).as_deref(),
            Some("\u{0928}\u{092e}\u{0938}\u{094d}\u{0924}\u{0947} \u{0926}\u{0941}\u{0928}\u{093f}\u{092f}\u{093e}")
        );
    }

    #[test]
    fn skips_segments_without_text() {
        let payload = json!([[["ok", "ok", null], [null, "skipped"]], null]);
        assert_eq!(extract_translation(&payload).as_deref(), Some("ok"));
    }

    #[test]
    fn rejects_malformed_payloads() {
        assert_eq!(extract_translation(&json!([])), None);
        assert_eq!(extract_translation(&json!([[]])), None);
        assert_eq!(extract_translation(&json!({"error": 1})), None);
        assert_eq!(extract_translation(&json!([[["   ", "x"]]])), None);
    }
}
