//! 翻译配置管理模块
//!
//! 提供简化的配置管理，支持环境变量、配置文件和默认值

pub mod manager;

// 重新导出主要类型
pub use manager::{ConfigManager, TranslationConfig};

/// 配置常量
pub mod constants {
    // 默认语言与模型
    pub const DEFAULT_SOURCE_LANG: &str = "en";
    pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";

    // 默认API设置
    pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
    pub const DEEPL_API_URL: &str = "https://api-free.deepl.com/v2/translate";
    pub const GOOGLE_API_URL: &str = "https://translation.googleapis.com/language/translate/v2";
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
    pub const DEFAULT_MAX_CONCURRENT_BATCHES: usize = 4;

    // 各后端的批次限制
    pub const OPENAI_CHUNK_CHARS: usize = 2000;
    pub const DEEPL_MAX_TEXTS: usize = 50;
    pub const DEEPL_MAX_CHARS: usize = 30000;
    pub const GOOGLE_MAX_SEGMENTS: usize = 128;
    pub const GOOGLE_MAX_CHARS: usize = 30000;
    pub const MOCK_MAX_UNITS: usize = 50;
    pub const MOCK_MAX_CHARS: usize = 5000;

    /// 每个单元在请求体中的额外开销（引号与分隔符）
    pub const UNIT_FRAMING_CHARS: usize = 3;

    /// 离线后端的译文前缀
    pub const MOCK_PREFIX: &str = "T:";

    // 可翻译属性（按输出顺序）
    pub const TRANSLATABLE_ATTRS: &[&str] = &["alt", "title", "aria-label"];

    // 跳过的元素
    pub const SKIP_ELEMENTS: &[&str] = &[
        "script", "style", "noscript", "template", "code", "svg", "math",
    ];

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "article-translator.toml",
        "article-translator.json",
        ".article-translator.toml",
        "~/.config/article-translator/config.toml",
        "/etc/article-translator/config.toml",
    ];

    // .env 文件搜索顺序
    pub const ENV_FILES: &[&str] = &[".env.local", ".env.development", ".env.production", ".env"];
}
