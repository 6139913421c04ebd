//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量访问。所有变量以 `ARTICLE_TRANSLATOR_` 为前缀。

use std::env;
use std::fmt;
use std::time::Duration;

use crate::translation::backend::BackendKind;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    /// 仅在变量已设置时解析
    ///
    /// 用于覆盖配置文件：未设置的变量不应让默认值覆盖文件中的值。
    fn lookup() -> Option<EnvResult<T>> {
        env::var(Self::NAME).ok().map(|value| Self::parse(&value))
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "ARTICLE_TRANSLATOR_LOG_LEVEL";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!("Invalid log level '{}'. Use: trace, debug, info, warn, error", value),
                }),
            }
        }
    }
}

/// 翻译相关环境变量
pub mod translation {
    use super::*;

    /// 翻译后端
    pub struct Backend;
    impl EnvVar<BackendKind> for Backend {
        const NAME: &'static str = "ARTICLE_TRANSLATOR_BACKEND";
        const DEFAULT: Option<BackendKind> = Some(BackendKind::OpenAi);
        const DESCRIPTION: &'static str = "Translation backend: openai, deepl, google, mock";

        fn parse(value: &str) -> EnvResult<BackendKind> {
            value.parse().map_err(|message| EnvError {
                variable: Self::NAME.to_string(),
                message,
            })
        }
    }

    /// 源语言
    pub struct SourceLang;
    impl EnvVar<String> for SourceLang {
        const NAME: &'static str = "ARTICLE_TRANSLATOR_SOURCE_LANG";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("en".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Default source language (ISO 639-1, optional region)";

        fn parse(value: &str) -> EnvResult<String> {
            parse_language(value, Self::NAME)
        }
    }

    /// API URL
    pub struct ApiUrl;
    impl EnvVar<String> for ApiUrl {
        const NAME: &'static str = "ARTICLE_TRANSLATOR_API_URL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Translation API endpoint URL (defaults per backend)";

        fn parse(value: &str) -> EnvResult<String> {
            let url = value.trim();
            match url::Url::parse(url) {
                Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => {
                    Ok(url.to_string())
                }
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "API URL must be an absolute http:// or https:// URL".to_string(),
                }),
            }
        }
    }

    /// API密钥
    pub struct ApiKey;
    impl EnvVar<String> for ApiKey {
        const NAME: &'static str = "ARTICLE_TRANSLATOR_API_KEY";
        const DEFAULT: Option<String> = None; // 无默认值，远程后端必须设置
        const DESCRIPTION: &'static str = "API key for the selected translation backend";

        fn parse(value: &str) -> EnvResult<String> {
            let key = value.trim();
            if key.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "API key cannot be empty".to_string(),
                });
            }
            Ok(key.to_string())
        }
    }

    /// 生成式后端模型
    pub struct Model;
    impl EnvVar<String> for Model {
        const NAME: &'static str = "ARTICLE_TRANSLATOR_MODEL";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("gpt-3.5-turbo".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Model used by the generative HTML backend";

        fn parse(value: &str) -> EnvResult<String> {
            let model = value.trim();
            if model.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Model name cannot be empty".to_string(),
                });
            }
            Ok(model.to_string())
        }
    }

    /// 请求超时
    pub struct RequestTimeout;
    impl EnvVar<Duration> for RequestTimeout {
        const NAME: &'static str = "ARTICLE_TRANSLATOR_REQUEST_TIMEOUT";
        const DEFAULT: Option<Duration> = Some(Duration::from_secs(60));
        const DESCRIPTION: &'static str = "Per-request timeout towards the backend in seconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            let seconds: u64 = value.trim().parse().map_err(|_| EnvError {
                variable: Self::NAME.to_string(),
                message: "Must be a valid number of seconds".to_string(),
            })?;

            if seconds == 0 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Timeout must be greater than 0".to_string(),
                });
            }

            if seconds > 600 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Timeout too long (max 600 seconds)".to_string(),
                });
            }

            Ok(Duration::from_secs(seconds))
        }
    }

    /// 单个请求内的最大并发批次数
    pub struct MaxConcurrentBatches;
    impl EnvVar<usize> for MaxConcurrentBatches {
        const NAME: &'static str = "ARTICLE_TRANSLATOR_MAX_CONCURRENT_BATCHES";
        const DEFAULT: Option<usize> = Some(4);
        const DESCRIPTION: &'static str = "Maximum concurrent backend calls per request";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 64)
        }
    }

    /// 每批最大单元数
    pub struct MaxUnitsPerBatch;
    impl EnvVar<usize> for MaxUnitsPerBatch {
        const NAME: &'static str = "ARTICLE_TRANSLATOR_MAX_UNITS_PER_BATCH";
        const DEFAULT: Option<usize> = None; // 使用后端默认值
        const DESCRIPTION: &'static str = "Override of the backend's units-per-call limit";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 1000)
        }
    }

    /// 每批最大字符数
    pub struct MaxCharsPerBatch;
    impl EnvVar<usize> for MaxCharsPerBatch {
        const NAME: &'static str = "ARTICLE_TRANSLATOR_MAX_CHARS_PER_BATCH";
        const DEFAULT: Option<usize> = None; // 使用后端默认值
        const DESCRIPTION: &'static str = "Override of the backend's characters-per-call limit";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 10, 100_000)
        }
    }
}

/// 存储相关环境变量
pub mod storage {
    use super::*;

    /// 磁盘存储路径
    pub struct StorePath;
    impl EnvVar<String> for StorePath {
        const NAME: &'static str = "ARTICLE_TRANSLATOR_STORE_PATH";
        const DEFAULT: Option<String> = None; // 未设置时使用内存存储
        const DESCRIPTION: &'static str = "Path of the on-disk translation store (unset: in-memory)";

        fn parse(value: &str) -> EnvResult<String> {
            let path = value.trim();
            if path.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Store path cannot be empty".to_string(),
                });
            }
            Ok(path.to_string())
        }
    }
}

/// 辅助函数
fn parse_positive_usize(value: &str, var_name: &str, min: usize, max: usize) -> EnvResult<usize> {
    let num: usize = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid positive number".to_string(),
    })?;

    if num < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", num, min),
        });
    }

    if num > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", num, max),
        });
    }

    Ok(num)
}

fn parse_language(value: &str, var_name: &str) -> EnvResult<String> {
    let lang = value.trim().to_lowercase();
    let primary = lang.split(['-', '_']).next().unwrap_or("");

    if primary.len() == 2 && primary.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(lang)
    } else {
        Err(EnvError {
            variable: var_name.to_string(),
            message: "Language code must start with 2 letters (ISO 639-1)".to_string(),
        })
    }
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let mut docs = String::new();
    docs.push_str("# Environment Variables\n\n");

    docs.push_str("## Core\n\n");
    docs.push_str(&format!("- `{}`: {}\n", core::LogLevel::NAME, core::LogLevel::DESCRIPTION));

    docs.push_str("\n## Translation\n\n");
    for (name, description) in [
        (translation::Backend::NAME, translation::Backend::DESCRIPTION),
        (translation::SourceLang::NAME, translation::SourceLang::DESCRIPTION),
        (translation::ApiUrl::NAME, translation::ApiUrl::DESCRIPTION),
        (translation::ApiKey::NAME, translation::ApiKey::DESCRIPTION),
        (translation::Model::NAME, translation::Model::DESCRIPTION),
        (translation::RequestTimeout::NAME, translation::RequestTimeout::DESCRIPTION),
        (translation::MaxConcurrentBatches::NAME, translation::MaxConcurrentBatches::DESCRIPTION),
        (translation::MaxUnitsPerBatch::NAME, translation::MaxUnitsPerBatch::DESCRIPTION),
        (translation::MaxCharsPerBatch::NAME, translation::MaxCharsPerBatch::DESCRIPTION),
    ] {
        docs.push_str(&format!("- `{}`: {}\n", name, description));
    }

    docs.push_str("\n## Storage\n\n");
    docs.push_str(&format!(
        "- `{}`: {}\n",
        storage::StorePath::NAME,
        storage::StorePath::DESCRIPTION
    ));

    docs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend() {
        assert_eq!(translation::Backend::parse("DeepL").unwrap(), BackendKind::DeepL);
        assert_eq!(translation::Backend::parse("google").unwrap(), BackendKind::Google);
        assert!(translation::Backend::parse("babelfish").is_err());
    }

    #[test]
    fn test_parse_language() {
        assert_eq!(translation::SourceLang::parse(" EN ").unwrap(), "en");
        assert_eq!(translation::SourceLang::parse("pt-BR").unwrap(), "pt-br");
        assert!(translation::SourceLang::parse("english").is_err());
    }

    #[test]
    fn test_parse_api_url() {
        assert!(translation::ApiUrl::parse("https://api.example.com/v1").is_ok());
        assert!(translation::ApiUrl::parse("ftp://example.com").is_err());
        assert!(translation::ApiUrl::parse("not a url").is_err());
    }

    #[test]
    fn test_parse_positive_usize_bounds() {
        assert_eq!(translation::MaxConcurrentBatches::parse("8").unwrap(), 8);
        assert!(translation::MaxConcurrentBatches::parse("0").is_err());
        assert!(translation::MaxConcurrentBatches::parse("65").is_err());
        assert!(translation::MaxConcurrentBatches::parse("many").is_err());
    }

    #[test]
    fn test_parse_timeout() {
        assert_eq!(
            translation::RequestTimeout::parse("30").unwrap(),
            Duration::from_secs(30)
        );
        assert!(translation::RequestTimeout::parse("0").is_err());
    }

    #[test]
    fn test_lookup_unset_variable_is_none() {
        assert!(storage::StorePath::lookup().is_none());
    }

    #[test]
    fn test_env_docs_list_variables() {
        let docs = generate_env_docs();
        assert!(docs.contains("ARTICLE_TRANSLATOR_BACKEND"));
        assert!(docs.contains("ARTICLE_TRANSLATOR_STORE_PATH"));
    }
}
