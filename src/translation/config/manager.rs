//! 配置管理器
//!
//! 提供统一的配置接口，优先级：环境变量 > 配置文件 > 默认值

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::translation::backend::{BackendKind, BatchLimits};
use crate::translation::error::{TranslationError, TranslationResult};

/// 翻译配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslationConfig {
    // 后端配置
    pub backend: BackendKind,
    pub source_lang: String,
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub request_timeout_secs: u64,

    // 批次配置（未设置时使用后端默认值）
    pub max_units_per_batch: Option<usize>,
    pub max_chars_per_batch: Option<usize>,
    pub max_concurrent_batches: usize,

    // 存储配置（未设置时使用内存存储）
    pub store_path: Option<String>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::OpenAi,
            source_lang: constants::DEFAULT_SOURCE_LANG.to_string(),
            api_url: None,
            api_key: None,
            model: constants::DEFAULT_OPENAI_MODEL.to_string(),
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT_SECS,
            max_units_per_batch: None,
            max_chars_per_batch: None,
            max_concurrent_batches: constants::DEFAULT_MAX_CONCURRENT_BATCHES,
            store_path: None,
        }
    }
}

impl TranslationConfig {
    /// 创建指定后端的默认配置
    pub fn for_backend(backend: BackendKind) -> Self {
        Self {
            backend,
            ..Self::default()
        }
    }

    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        if self.max_concurrent_batches == 0 {
            return Err(TranslationError::ConfigError("最大并发批次数不能为0".to_string()));
        }

        if self.request_timeout_secs == 0 {
            return Err(TranslationError::ConfigError("请求超时必须大于0".to_string()));
        }

        if self.max_units_per_batch == Some(0) {
            return Err(TranslationError::ConfigError("每批最大单元数不能为0".to_string()));
        }

        if self.max_chars_per_batch == Some(0) {
            return Err(TranslationError::ConfigError("每批最大字符数不能为0".to_string()));
        }

        if self.source_lang.trim().is_empty() {
            return Err(TranslationError::ConfigError("源语言不能为空".to_string()));
        }

        if let Some(api_url) = &self.api_url {
            let parsed = url::Url::parse(api_url)
                .map_err(|e| TranslationError::ConfigError(format!("API URL 无效 '{}': {}", api_url, e)))?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(TranslationError::ConfigError(format!(
                    "API URL 必须使用 http 或 https: {}",
                    api_url
                )));
            }
        }

        if self.backend.requires_api_key()
            && self.api_key.as_deref().map_or(true, |key| key.trim().is_empty())
        {
            return Err(TranslationError::ConfigError(format!(
                "后端 {} 需要 API 密钥",
                self.backend
            )));
        }

        Ok(())
    }

    /// 应用环境变量覆盖
    ///
    /// 只有已设置的变量才会覆盖；无法解析的值记录警告后忽略。
    pub fn apply_env_overrides(&mut self) {
        use crate::env::{storage, translation, EnvResult, EnvVar};

        fn take<T>(value: Option<EnvResult<T>>) -> Option<T> {
            match value? {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("忽略无效的环境变量: {}", e);
                    None
                }
            }
        }

        if let Some(backend) = take(translation::Backend::lookup()) {
            self.backend = backend;
        }

        if let Some(source_lang) = take(translation::SourceLang::lookup()) {
            self.source_lang = source_lang;
        }

        if let Some(api_url) = take(translation::ApiUrl::lookup()) {
            tracing::info!("环境变量覆盖 API URL: {}", api_url);
            self.api_url = Some(api_url);
        }

        if let Some(api_key) = take(translation::ApiKey::lookup()) {
            self.api_key = Some(api_key);
        }

        if let Some(model) = take(translation::Model::lookup()) {
            self.model = model;
        }

        if let Some(timeout) = take(translation::RequestTimeout::lookup()) {
            self.request_timeout_secs = timeout.as_secs();
        }

        if let Some(max_concurrent) = take(translation::MaxConcurrentBatches::lookup()) {
            self.max_concurrent_batches = max_concurrent;
        }

        if let Some(units) = take(translation::MaxUnitsPerBatch::lookup()) {
            self.max_units_per_batch = Some(units);
        }

        if let Some(chars) = take(translation::MaxCharsPerBatch::lookup()) {
            self.max_chars_per_batch = Some(chars);
        }

        if let Some(path) = take(storage::StorePath::lookup()) {
            self.store_path = Some(path);
        }
    }

    /// 请求超时
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// 在后端默认限制上应用配置覆盖
    pub fn batch_limits(&self, defaults: BatchLimits) -> BatchLimits {
        BatchLimits {
            max_units_per_batch: self.max_units_per_batch.unwrap_or(defaults.max_units_per_batch),
            max_chars_per_batch: self.max_chars_per_batch.unwrap_or(defaults.max_chars_per_batch),
        }
    }
}

/// 配置管理器
pub struct ConfigManager {
    config: TranslationConfig,
}

impl ConfigManager {
    /// 从默认搜索路径加载配置
    pub fn new() -> TranslationResult<Self> {
        Self::load_with(None, |_| {})
    }

    /// 从指定文件加载配置
    pub fn from_file(path: &str) -> TranslationResult<Self> {
        Self::load_with(Some(path), |_| {})
    }

    /// 使用现成配置（仍会应用环境变量覆盖）
    pub fn with_config(config: TranslationConfig) -> TranslationResult<Self> {
        Self::finish(config)
    }

    /// 加载配置，并在验证前应用调用方的覆盖（如命令行参数）
    ///
    /// `path` 为空时按默认搜索路径查找配置文件。
    pub fn load_with<F>(path: Option<&str>, overrides: F) -> TranslationResult<Self>
    where
        F: FnOnce(&mut TranslationConfig),
    {
        Self::load_dotenv();
        let mut config = match path {
            Some(path) => Self::load_from_file(&shellexpand::tilde(path))?,
            None => Self::load_config()?,
        };
        config.apply_env_overrides();
        overrides(&mut config);
        config.validate()?;
        Ok(Self { config })
    }

    fn finish(mut config: TranslationConfig) -> TranslationResult<Self> {
        config.apply_env_overrides();
        config.validate()?;
        Ok(Self { config })
    }

    /// 获取配置
    pub fn get_config(&self) -> &TranslationConfig {
        &self.config
    }

    pub fn into_config(self) -> TranslationConfig {
        self.config
    }

    fn load_config() -> TranslationResult<TranslationConfig> {
        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            if Path::new(expanded_path.as_ref()).exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                return Self::load_from_file(&expanded_path);
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Ok(TranslationConfig::default())
    }

    fn load_from_file(path: &str) -> TranslationResult<TranslationConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TranslationError::ConfigError(format!("读取配置文件失败 {}: {}", path, e)))?;

        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .map_err(|e| TranslationError::ConfigError(format!("解析JSON配置失败: {}", e)))
        } else {
            toml::from_str(&content)
                .map_err(|e| TranslationError::ConfigError(format!("解析TOML配置失败: {}", e)))
        }
    }

    fn load_dotenv() {
        for env_file in constants::ENV_FILES {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> TranslationResult<()> {
        let config = TranslationConfig {
            api_key: Some("your-api-key".to_string()),
            store_path: Some("~/.cache/article-translator/translations.redb".to_string()),
            ..TranslationConfig::default()
        };
        let content = toml::to_string_pretty(&config)
            .map_err(|e| TranslationError::ConfigError(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TranslationError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}
