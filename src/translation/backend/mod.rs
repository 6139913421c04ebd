//! 翻译后端
//!
//! 定义翻译后端抽象 [`TranslationBackend`]，以及内置的几种实现：
//!
//! - [`OpenAiBackend`]: Chat Completions 接口，按 HTML 分块翻译
//! - [`DeepLBackend`]: DeepL 接口，按文本节点批量翻译
//! - [`GoogleBackend`]: Google Translate v2 接口，按 HTML 分块批量翻译
//! - [`MockBackend`]: 离线后端，用于测试和本地调试
//!
//! 后端只负责"一批文本进，一批译文出"，不关心缓存和 DOM。

pub mod deepl;
pub mod google;
pub mod mock;
pub mod openai;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::translation::config::{constants, TranslationConfig};
use crate::translation::error::{BackendError, BackendErrorCause, TranslationError, TranslationResult};

pub use deepl::DeepLBackend;
pub use google::GoogleBackend;
pub use mock::{MockBackend, MockBehavior};
pub use openai::OpenAiBackend;

/// 后端期望的翻译单元形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    /// 每个单元是一段纯文本，译文按节点回填
    NodeText,
    /// 每个单元是一段 HTML，译文按顺序拼接
    HtmlChunk,
}

/// 单次请求的批次限制
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    pub max_units_per_batch: usize,
    pub max_chars_per_batch: usize,
}

impl BatchLimits {
    pub fn new(max_units_per_batch: usize, max_chars_per_batch: usize) -> Self {
        Self {
            max_units_per_batch: max_units_per_batch.max(1),
            max_chars_per_batch: max_chars_per_batch.max(1),
        }
    }
}

/// 翻译后端抽象
///
/// 实现必须保证返回的译文数量与输入一致且顺序对应，
/// 否则管道会把结果视为 [`BackendErrorCause::MalformedResponse`]。
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// 后端标识，记录在缓存和结果中
    fn identifier(&self) -> &str;

    fn mode(&self) -> BackendMode;

    fn limits(&self) -> BatchLimits;

    /// 翻译一批文本
    ///
    /// # 参数
    /// * `texts` - 待翻译单元，数量和字符数不超过 [`limits`](Self::limits)
    /// * `source_lang` - 源语言代码
    /// * `target_lang` - 目标语言代码
    ///
    /// # 返回值
    /// 与 `texts` 一一对应的译文
    async fn translate(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Vec<String>, BackendError>;
}

/// 内置后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    OpenAi,
    DeepL,
    Google,
    Mock,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::OpenAi => "openai",
            BackendKind::DeepL => "deepl",
            BackendKind::Google => "google",
            BackendKind::Mock => "mock",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, BackendKind::Mock)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(BackendKind::OpenAi),
            "deepl" => Ok(BackendKind::DeepL),
            "google" => Ok(BackendKind::Google),
            "mock" => Ok(BackendKind::Mock),
            other => Err(format!(
                "未知的翻译后端 '{}'，可选值: openai, deepl, google, mock",
                other
            )),
        }
    }
}

/// 按配置构建的后端
pub enum ConfiguredBackend {
    OpenAi(OpenAiBackend),
    DeepL(DeepLBackend),
    Google(GoogleBackend),
    Mock(MockBackend),
}

impl ConfiguredBackend {
    /// 根据配置创建后端
    pub fn from_config(config: &TranslationConfig) -> TranslationResult<Self> {
        let api_key = || {
            config
                .api_key
                .clone()
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| TranslationError::ConfigError(format!("后端 {} 需要 API 密钥", config.backend)))
        };

        let backend = match config.backend {
            BackendKind::OpenAi => ConfiguredBackend::OpenAi(OpenAiBackend::new(config, api_key()?)?),
            BackendKind::DeepL => ConfiguredBackend::DeepL(DeepLBackend::new(config, api_key()?)?),
            BackendKind::Google => ConfiguredBackend::Google(GoogleBackend::new(config, api_key()?)?),
            BackendKind::Mock => {
                let defaults = MockBackend::prefixing(constants::MOCK_PREFIX);
                let limits = config.batch_limits(defaults.limits());
                ConfiguredBackend::Mock(defaults.with_limits(limits))
            }
        };

        tracing::info!("使用翻译后端: {} ({})", config.backend, backend.identifier());
        Ok(backend)
    }

    fn inner(&self) -> &dyn TranslationBackend {
        match self {
            ConfiguredBackend::OpenAi(backend) => backend,
            ConfiguredBackend::DeepL(backend) => backend,
            ConfiguredBackend::Google(backend) => backend,
            ConfiguredBackend::Mock(backend) => backend,
        }
    }
}

#[async_trait]
impl TranslationBackend for ConfiguredBackend {
    fn identifier(&self) -> &str {
        self.inner().identifier()
    }

    fn mode(&self) -> BackendMode {
        self.inner().mode()
    }

    fn limits(&self) -> BatchLimits {
        self.inner().limits()
    }

    async fn translate(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Vec<String>, BackendError> {
        self.inner().translate(texts, source_lang, target_lang).await
    }
}

/// 构建带超时的 HTTP 客户端
pub(crate) fn http_client(config: &TranslationConfig) -> TranslationResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .map_err(|e| TranslationError::ConfigError(format!("创建HTTP客户端失败: {}", e)))
}

/// 把非成功的 HTTP 状态映射为后端错误
pub(crate) fn classify_status(backend: &str, status: reqwest::StatusCode, body: &str) -> BackendError {
    let cause = match status.as_u16() {
        429 => BackendErrorCause::RateLimited,
        401 | 403 => BackendErrorCause::Auth,
        402 | 456 => BackendErrorCause::QuotaExceeded,
        408 | 504 => BackendErrorCause::Timeout,
        code => BackendErrorCause::Provider(code),
    };

    let snippet: String = body.chars().take(200).collect();
    BackendError::new(backend, cause, format!("HTTP {}: {}", status, snippet))
}

/// 把传输层错误映射为后端错误
pub(crate) fn classify_transport(backend: &str, error: reqwest::Error) -> BackendError {
    let cause = if error.is_timeout() {
        BackendErrorCause::Timeout
    } else if error.is_decode() {
        BackendErrorCause::MalformedResponse
    } else {
        BackendErrorCause::Network
    };

    BackendError::new(backend, cause, error.to_string())
}

/// 检查译文数量
pub(crate) fn ensure_count(backend: &str, expected: usize, translations: Vec<String>) -> Result<Vec<String>, BackendError> {
    if translations.len() != expected {
        return Err(BackendError::malformed(
            backend,
            format!("期望 {} 条译文，实际返回 {} 条", expected, translations.len()),
        ));
    }
    Ok(translations)
}
