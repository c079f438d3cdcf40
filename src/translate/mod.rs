use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use anyhow::Result;
use tracing::warn;

mod google;
mod retry;

pub use google::GoogleTranslate;

pub type BackendFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;
pub type BackendBatchFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send + 'a>>;

/// A machine translation service. Implementations translate one string at
/// a time; `translate_batch` exists so a service with a cheaper bulk call
/// can override it, and its contract is all-or-nothing with exactly one
/// output per input.
pub trait TranslationBackend: Send + Sync {
    fn translate<'a>(
        &'a self,
        text: &'a str,
        source_lang: &'a str,
        target_lang: &'a str,
    ) -> BackendFuture<'a>;

    fn translate_batch<'a>(
        &'a self,
        texts: &'a [String],
        source_lang: &'a str,
        target_lang: &'a str,
    ) -> BackendBatchFuture<'a> {
        Box::pin(async move {
            let mut translated = Vec::with_capacity(texts.len());
            for text in texts {
                translated.push(self.translate(text, source_lang, target_lang).await?);
            }
            Ok(translated)
        })
    }
}

/// Caching front-end over a [`TranslationBackend`]. Trivial strings are
/// passed through untranslated, repeats are served from the cache, and a
/// failed batch degrades to per-string calls where each failure yields an
/// empty string instead of aborting the page.
pub struct TextTranslator<B> {
    backend: B,
    source_lang: String,
    target_lang: String,
    cache: Mutex<HashMap<String, String>>,
}

impl<B: TranslationBackend> TextTranslator<B> {
    pub fn new(backend: B, source_lang: &str, target_lang: &str) -> Self {
        Self {
            backend,
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Translates a page worth of strings, of which one output per input.
    /// An empty output marks a string whose translation failed; callers
    /// leave those regions untouched.
    pub async fn translate_batch(&self, texts: &[String]) -> Vec<String> {
        let mut outputs: Vec<Option<String>> = vec![None; texts.len()];

        for (index, text) in texts.iter().enumerate() {
            let trimmed = text.trim();
            if should_skip(trimmed) {
                outputs[index] = Some(trimmed.to_string());
            }
        }

        if let Ok(cache) = self.cache.lock() {
            for (index, text) in texts.iter().enumerate() {
                if outputs[index].is_none() {
                    if let Some(hit) = cache.get(text.trim()) {
                        outputs[index] = Some(hit.clone());
                    }
                }
            }
        }

        let pending: Vec<(usize, String)> = texts
            .iter()
            .enumerate()
            .filter(|(index, _)| outputs[*index].is_none())
            .map(|(index, text)| (index, text.trim().to_string()))
            .collect();

        if !pending.is_empty() {
            let pending_texts: Vec<String> =
                pending.iter().map(|(_, text)| text.clone()).collect();
            let results = match self
                .backend
                .translate_batch(&pending_texts, &self.source_lang, &self.target_lang)
                .await
            {
                Ok(results) if results.len() == pending.len() => results,
                Ok(results) => {
                    warn!(
                        "batch translation returned {} results for {} strings, retrying one by one",
                        results.len(),
                        pending.len()
                    );
                    self.translate_individually(&pending_texts).await
                }
                Err(err) => {
                    warn!("batch translation failed ({}), retrying one by one", err);
                    self.translate_individually(&pending_texts).await
                }
            };

            if let Ok(mut cache) = self.cache.lock() {
                for ((_, source), result) in pending.iter().zip(&results) {
                    if !result.is_empty() {
                        cache.insert(source.clone(), result.clone());
                    }
                }
            }
            for ((index, _), result) in pending.into_iter().zip(results) {
                outputs[index] = Some(result);
            }
        }

        outputs
            .into_iter()
            .map(|output| output.unwrap_or_default())
            .collect()
    }

    async fn translate_individually(&self, texts: &[String]) -> Vec<String> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            match self
                .backend
                .translate(text, &self.source_lang, &self.target_lang)
                .await
            {
                Ok(translated) => results.push(translated),
                Err(err) => {
                    warn!("failed to translate '{}' ({}), leaving region untouched", text, err);
                    results.push(String::new());
                }
            }
        }
        results
    }
}

/// Strings not worth a translation round trip: single characters and bare
/// numbers read the same in any language.
fn should_skip(trimmed: &str) -> bool {
    trimmed.chars().count() < 2 || trimmed.chars().all(char::is_numeric)
}
