//! # Article Translator Library
//!
//! 文章 HTML 翻译库：在保留标记结构的前提下把文章翻译为目标语言，
//! 并按（文章、源语言、目标语言、后端、内容版本）缓存结果，
//! 相同请求不会再次调用付费翻译服务。
//!
//! ## 模块组织
//!
//! - `parsers` - HTML 解析、序列化与词法切分
//! - `translation` - 翻译管道、后端、存储与服务
//! - `env` - 类型化的环境变量访问

pub mod env;
pub mod parsers;
pub mod translation;

pub use translation::{
    create_service, TranslationError, TranslationOutcome, TranslationRequest, TranslationResult,
    TranslationService,
};
