//! 翻译模块统一错误处理
//!
//! 提供结构化错误类型和错误处理机制。错误分为三层：
//!
//! - [`BackendError`]: 翻译后端调用失败，携带供应商相关的原因
//! - [`StoreError`]: 持久化存储失败（唯一键冲突单独区分）
//! - [`TranslationError`]: 管道对外暴露的统一错误类型

use std::fmt;

use thiserror::Error;

use crate::translation::storage::CacheKey;

/// 翻译后端失败原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendErrorCause {
    /// 请求过于频繁（HTTP 429）
    RateLimited,
    /// 请求超时
    Timeout,
    /// 认证失败（HTTP 401/403）
    Auth,
    /// 配额耗尽（HTTP 402/456）
    QuotaExceeded,
    /// 响应无法解析或数量不匹配
    MalformedResponse,
    /// 连接失败等传输层错误
    Network,
    /// 其他供应商状态码
    Provider(u16),
}

impl BackendErrorCause {
    /// 是否属于暂时性错误
    ///
    /// 暂时性错误适合由调用方退避后重试；核心管道本身从不静默重试，
    /// 以免产生重复计费的翻译调用。
    pub fn is_transient(&self) -> bool {
        match self {
            BackendErrorCause::RateLimited
            | BackendErrorCause::Timeout
            | BackendErrorCause::Network => true,
            BackendErrorCause::Provider(status) => *status >= 500,
            BackendErrorCause::Auth
            | BackendErrorCause::QuotaExceeded
            | BackendErrorCause::MalformedResponse => false,
        }
    }
}

impl fmt::Display for BackendErrorCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendErrorCause::RateLimited => write!(f, "速率限制"),
            BackendErrorCause::Timeout => write!(f, "超时"),
            BackendErrorCause::Auth => write!(f, "认证失败"),
            BackendErrorCause::QuotaExceeded => write!(f, "配额耗尽"),
            BackendErrorCause::MalformedResponse => write!(f, "响应格式错误"),
            BackendErrorCause::Network => write!(f, "网络错误"),
            BackendErrorCause::Provider(status) => write!(f, "供应商错误 HTTP {}", status),
        }
    }
}

/// 翻译后端错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("翻译后端 {backend} 失败 ({cause}): {message}")]
pub struct BackendError {
    pub backend: String,
    pub cause: BackendErrorCause,
    pub message: String,
}

impl BackendError {
    pub fn new(backend: impl Into<String>, cause: BackendErrorCause, message: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            cause,
            message: message.into(),
        }
    }

    /// 创建响应格式错误
    pub fn malformed(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(backend, BackendErrorCause::MalformedResponse, message)
    }

    pub fn is_transient(&self) -> bool {
        self.cause.is_transient()
    }
}

/// 存储错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// 同一缓存键已存在记录（并发写入竞争）
    #[error("缓存键已存在: {0}")]
    UniqueViolation(CacheKey),

    /// 底层存储故障
    #[error("存储后端错误: {0}")]
    Backend(String),
}

/// 翻译错误类型
#[derive(Error, Debug, Clone)]
pub enum TranslationError {
    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// HTML无法解析
    #[error("解析错误 [{document}]: {message}")]
    ParseError { document: String, message: String },

    /// 翻译后端错误
    #[error("{0}")]
    Backend(#[from] BackendError),

    /// 缓存查询或写入失败
    #[error("{0}")]
    StoreError(#[from] StoreError),

    /// 译文回填失败
    #[error("译文回填错误: {0}")]
    ReassemblyError(String),

    /// 输入验证错误
    #[error("输入无效: {0}")]
    InvalidInput(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    SerializationError(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl TranslationError {
    /// 检查错误是否可由调用方重试
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslationError::Backend(e) => e.is_transient(),
            TranslationError::StoreError(StoreError::Backend(_)) => true,
            TranslationError::StoreError(StoreError::UniqueViolation(_)) => false,
            TranslationError::ConfigError(_) => false,
            TranslationError::ParseError { .. } => false,
            TranslationError::ReassemblyError(_) => false,
            TranslationError::InvalidInput(_) => false,
            TranslationError::SerializationError(_) => false,
            TranslationError::InternalError(_) => false,
        }
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TranslationError::ConfigError(_) => ErrorSeverity::Critical,
            TranslationError::ParseError { .. } => ErrorSeverity::Info,
            TranslationError::InvalidInput(_) => ErrorSeverity::Info,
            TranslationError::Backend(e) if e.is_transient() => ErrorSeverity::Warning,
            TranslationError::Backend(_) => ErrorSeverity::Error,
            TranslationError::StoreError(StoreError::UniqueViolation(_)) => ErrorSeverity::Warning,
            TranslationError::StoreError(StoreError::Backend(_)) => ErrorSeverity::Error,
            TranslationError::ReassemblyError(_) => ErrorSeverity::Error,
            TranslationError::SerializationError(_) => ErrorSeverity::Error,
            TranslationError::InternalError(_) => ErrorSeverity::Critical,
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            TranslationError::ConfigError(_) => ErrorCategory::Configuration,
            TranslationError::ParseError { .. } => ErrorCategory::Parsing,
            TranslationError::Backend(e) => match e.cause {
                BackendErrorCause::RateLimited => ErrorCategory::RateLimit,
                BackendErrorCause::Timeout => ErrorCategory::Timeout,
                BackendErrorCause::Network => ErrorCategory::Network,
                _ => ErrorCategory::Service,
            },
            TranslationError::StoreError(_) => ErrorCategory::Storage,
            TranslationError::ReassemblyError(_) => ErrorCategory::Processing,
            TranslationError::InvalidInput(_) => ErrorCategory::Input,
            TranslationError::SerializationError(_) => ErrorCategory::Serialization,
            TranslationError::InternalError(_) => ErrorCategory::Internal,
        }
    }

    /// 创建带上下文的错误
    pub fn with_context<T: fmt::Display>(mut self, context: T) -> Self {
        match &mut self {
            TranslationError::ConfigError(msg)
            | TranslationError::ReassemblyError(msg)
            | TranslationError::InvalidInput(msg)
            | TranslationError::SerializationError(msg)
            | TranslationError::InternalError(msg) => {
                *msg = format!("{} (上下文: {})", msg, context);
            }
            TranslationError::ParseError { message, .. } => {
                *message = format!("{} (上下文: {})", message, context);
            }
            TranslationError::Backend(e) => {
                e.message = format!("{} (上下文: {})", e.message, context);
            }
            TranslationError::StoreError(StoreError::Backend(msg)) => {
                *msg = format!("{} (上下文: {})", msg, context);
            }
            TranslationError::StoreError(StoreError::UniqueViolation(_)) => {}
        }

        self
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    Network,
    RateLimit,
    Timeout,
    Input,
    Parsing,
    Service,
    Storage,
    Processing,
    Serialization,
    Internal,
}

impl From<serde_json::Error> for TranslationError {
    fn from(error: serde_json::Error) -> Self {
        TranslationError::SerializationError(format!("JSON序列化错误: {}", error))
    }
}

/// 错误结果类型别名
pub type TranslationResult<T> = Result<T, TranslationError>;

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 按严重程度记录错误并原样返回
    pub fn log_error<T>(error: TranslationError) -> TranslationResult<T> {
        match error.severity() {
            ErrorSeverity::Info => tracing::info!("翻译信息: {}", error),
            ErrorSeverity::Warning => tracing::warn!("翻译警告: {}", error),
            ErrorSeverity::Error => tracing::error!("翻译错误: {}", error),
            ErrorSeverity::Critical => tracing::error!("翻译严重错误: {}", error),
        }

        Err(error)
    }

    /// 创建配置错误
    pub fn config_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::ConfigError(msg.to_string())
    }

    /// 创建输入验证错误
    pub fn validation_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::InvalidInput(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_cause_transience() {
        assert!(BackendErrorCause::RateLimited.is_transient());
        assert!(BackendErrorCause::Timeout.is_transient());
        assert!(BackendErrorCause::Network.is_transient());
        assert!(BackendErrorCause::Provider(503).is_transient());

        assert!(!BackendErrorCause::Provider(400).is_transient());
        assert!(!BackendErrorCause::Auth.is_transient());
        assert!(!BackendErrorCause::QuotaExceeded.is_transient());
        assert!(!BackendErrorCause::MalformedResponse.is_transient());
    }

    #[test]
    fn test_backend_error_converts_into_translation_error() {
        let error: TranslationError =
            BackendError::new("deepl_translate", BackendErrorCause::Auth, "bad key").into();

        assert!(!error.is_retryable());
        assert_eq!(error.severity(), ErrorSeverity::Error);
        assert_eq!(error.category(), ErrorCategory::Service);
        assert!(error.to_string().contains("deepl_translate"));
    }

    #[test]
    fn test_store_backend_error_is_retryable() {
        let error: TranslationError = StoreError::Backend("disk full".to_string()).into();
        assert!(error.is_retryable());
        assert_eq!(error.category(), ErrorCategory::Storage);
    }

    #[test]
    fn test_with_context_appends_to_message() {
        let error = TranslationError::InvalidInput("articleId 为空".to_string()).with_context("请求 42");
        assert!(error.to_string().contains("上下文: 请求 42"));

        let backend = TranslationError::from(BackendError::malformed("mock", "长度不匹配"))
            .with_context("批次 3");
        match backend {
            TranslationError::Backend(e) => assert!(e.message.contains("批次 3")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_log_error_returns_err() {
        let result: TranslationResult<()> =
            helpers::log_error(helpers::config_error("缺少 API 密钥"));
        assert!(matches!(result, Err(TranslationError::ConfigError(_))));
    }
}
