//! 离线翻译后端
//!
//! 不访问网络，按预设行为生成译文，用于测试和本地调试：
//!
//! - [`MockBehavior::Prefix`]: 给每段文本加前缀
//! - [`MockBehavior::Mapping`]: 按映射表翻译，未命中的原样返回
//! - [`MockBehavior::Failing`]: 每次调用都失败
//! - [`MockBehavior::Truncated`]: 少返回一条译文
//!
//! HTML 分块模式下只改写分块中的可见文本，标签保持不变。

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{BackendMode, BatchLimits, TranslationBackend};
use crate::parsers::html::lexer::tokenize;
use crate::translation::config::constants;
use crate::translation::error::{BackendError, BackendErrorCause};

/// 离线后端行为
#[derive(Debug, Clone)]
pub enum MockBehavior {
    Prefix(String),
    Mapping(HashMap<String, String>),
    Failing(BackendErrorCause),
    Truncated,
}

/// 离线后端
#[derive(Debug)]
pub struct MockBackend {
    behavior: MockBehavior,
    identifier: String,
    mode: BackendMode,
    limits: BatchLimits,
    delays: Vec<Duration>,
    call_count: AtomicUsize,
    received: Mutex<Vec<Vec<String>>>,
}

impl MockBackend {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            identifier: "mock".to_string(),
            mode: BackendMode::NodeText,
            limits: BatchLimits::new(constants::MOCK_MAX_UNITS, constants::MOCK_MAX_CHARS),
            delays: Vec::new(),
            call_count: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
        }
    }

    /// 前缀翻译
    pub fn prefixing(prefix: &str) -> Self {
        Self::new(MockBehavior::Prefix(prefix.to_string()))
    }

    /// 映射表翻译，键按去除首尾空白后匹配
    pub fn mapping<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = pairs
            .into_iter()
            .map(|(k, v)| (k.into().trim().to_string(), v.into()))
            .collect();
        Self::new(MockBehavior::Mapping(map))
    }

    /// 总是失败
    pub fn failing(cause: BackendErrorCause) -> Self {
        Self::new(MockBehavior::Failing(cause))
    }

    pub fn with_identifier(mut self, identifier: &str) -> Self {
        self.identifier = identifier.to_string();
        self
    }

    pub fn with_mode(mut self, mode: BackendMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_limits(mut self, limits: BatchLimits) -> Self {
        self.limits = limits;
        self
    }

    /// 第 k 次调用先等待 `delays[k]`
    pub fn with_delays(mut self, delays: Vec<Duration>) -> Self {
        self.delays = delays;
        self
    }

    /// 已发生的调用次数
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// 每次调用收到的单元
    pub fn received_batches(&self) -> Vec<Vec<String>> {
        self.received
            .lock()
            .map(|batches| batches.clone())
            .unwrap_or_default()
    }

    fn translate_text(&self, text: &str) -> String {
        match &self.behavior {
            MockBehavior::Prefix(prefix) => format!("{}{}", prefix, text),
            MockBehavior::Mapping(map) => map
                .get(text.trim())
                .cloned()
                .unwrap_or_else(|| text.to_string()),
            MockBehavior::Failing(_) | MockBehavior::Truncated => text.to_string(),
        }
    }

    /// 只翻译分块中的可见文本，保留两侧空白
    fn translate_chunk(&self, chunk: &str) -> String {
        tokenize(chunk)
            .iter()
            .map(|token| {
                if !token.has_visible_text() {
                    return token.text.to_string();
                }
                let text = token.text;
                let start = text.len() - text.trim_start().len();
                let end = text.trim_end().len();
                format!(
                    "{}{}{}",
                    &text[..start],
                    self.translate_text(&text[start..end]).trim(),
                    &text[end..]
                )
            })
            .collect()
    }
}

#[async_trait]
impl TranslationBackend for MockBackend {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn mode(&self) -> BackendMode {
        self.mode
    }

    fn limits(&self) -> BatchLimits {
        self.limits
    }

    async fn translate(
        &self,
        texts: &[String],
        _source_lang: &str,
        _target_lang: &str,
    ) -> Result<Vec<String>, BackendError> {
        let call = self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut received) = self.received.lock() {
            received.push(texts.to_vec());
        }

        if let Some(delay) = self.delays.get(call) {
            tokio::time::sleep(*delay).await;
        }

        match &self.behavior {
            MockBehavior::Failing(cause) => {
                return Err(BackendError::new(&self.identifier, *cause, "模拟失败"));
            }
            MockBehavior::Truncated => {
                return Ok(texts.iter().skip(1).cloned().collect());
            }
            _ => {}
        }

        let translations = texts
            .iter()
            .map(|text| match self.mode {
                BackendMode::NodeText => self.translate_text(text),
                BackendMode::HtmlChunk => self.translate_chunk(text),
            })
            .collect();

        Ok(translations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[tokio::test]
    async fn test_prefix_backend() {
        let backend = MockBackend::prefixing("T:");
        let result = backend.translate(&units(&["a", "b"]), "en", "fr").await.unwrap();

        assert_eq!(result, vec!["T:a", "T:b"]);
        assert_eq!(backend.call_count(), 1);
        assert_eq!(backend.received_batches(), vec![units(&["a", "b"])]);
    }

    #[tokio::test]
    async fn test_mapping_passes_unknown_text_through() {
        let backend = MockBackend::mapping([("Hello", "Bonjour")]);
        let result = backend.translate(&units(&["Hello", "Other"]), "en", "fr").await.unwrap();

        assert_eq!(result, vec!["Bonjour", "Other"]);
    }

    #[tokio::test]
    async fn test_chunk_mode_keeps_tags() {
        let backend = MockBackend::mapping([("Hello", "Bonjour"), ("world", "monde")])
            .with_mode(BackendMode::HtmlChunk);
        let result = backend
            .translate(&units(&["<p>Hello <a href=\"/x\">world</a>.</p>"]), "en", "fr")
            .await
            .unwrap();

        assert_eq!(result, vec!["<p>Bonjour <a href=\"/x\">monde</a>.</p>"]);
    }

    #[tokio::test]
    async fn test_failing_and_truncated() {
        let backend = MockBackend::failing(BackendErrorCause::RateLimited);
        let err = backend.translate(&units(&["a"]), "en", "fr").await.unwrap_err();
        assert_eq!(err.cause, BackendErrorCause::RateLimited);

        let backend = MockBackend::new(MockBehavior::Truncated);
        let result = backend.translate(&units(&["a", "b"]), "en", "fr").await.unwrap();
        assert_eq!(result.len(), 1);
    }
}
