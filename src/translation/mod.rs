//! 翻译模块
//!
//! 提供文章 HTML 翻译与缓存的完整功能，采用清晰的模块化架构：
//! - **core**: 缓存旁路翻译服务和批次调度引擎
//! - **pipeline**: 处理管道（规范化、收集、批次、回填、后处理）
//! - **backend**: 翻译后端抽象与实现
//! - **storage**: 翻译记录持久化
//! - **config**: 配置管理
//! - **error**: 错误处理
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use article_translator::translation::{create_service, ConfigManager, TranslationRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::new()?;
//! let service = create_service(manager.get_config())?;
//!
//! let request = TranslationRequest::new("42", "en", "fr", "<p>Hello</p>", "2024-05-01T10:00:00Z");
//! let outcome = service.translate(request).await?;
//! println!("{}", outcome.translated_html);
//! # Ok(())
//! # }
//! ```

// ============================================================================
// 子模块声明
// ============================================================================

/// 翻译后端模块 - 后端抽象及 OpenAI / DeepL / Google / 离线实现
pub mod backend;

/// 配置管理模块 - 配置文件、环境变量覆盖与常量
pub mod config;

/// 核心模块 - 翻译服务与批次调度
pub mod core;

/// 错误处理模块 - 统一的错误类型和处理机制
pub mod error;

/// 处理管道模块
///
/// 负责从 HTML 中收集可翻译片段、规划批次、回填译文和后处理
pub mod pipeline;

/// 存储模块 - 翻译记录的查询与插入
pub mod storage;

// ============================================================================
// 核心API导出
// ============================================================================

pub use self::core::{
    ServiceStats, ServiceStatsSnapshot, TranslationOutcome, TranslationRequest, TranslationService,
    TranslationSource,
};

pub use config::{constants, ConfigManager, TranslationConfig};

pub use error::{
    BackendError, BackendErrorCause, ErrorCategory, ErrorSeverity, StoreError, TranslationError,
    TranslationResult,
};

pub use backend::{
    BackendKind, BackendMode, BatchLimits, ConfiguredBackend, MockBackend, MockBehavior,
    TranslationBackend,
};

pub use storage::{
    CacheKey, ConfiguredStore, MemoryStore, RecordId, RedbStore, StoredTranslation,
    TranslationRecord, TranslationStore,
};

// ============================================================================
// 便利函数
// ============================================================================

/// 按配置创建的翻译服务
pub type ConfiguredService = TranslationService<ConfiguredBackend, ConfiguredStore>;

/// 根据配置创建翻译服务
///
/// 后端由 `backend` 字段选择，`store_path` 为空时使用内存存储。
///
/// # 参数
///
/// * `config` - 已验证的翻译配置
pub fn create_service(config: &TranslationConfig) -> TranslationResult<ConfiguredService> {
    let backend = ConfiguredBackend::from_config(config)?;
    let store = ConfiguredStore::open(config.store_path.as_deref())?;
    TranslationService::new(backend, store, config.max_concurrent_batches)
}
