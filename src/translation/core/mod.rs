//! 翻译核心模块
//!
//! - `engine`: 批次并发调度，按位置写回结果
//! - `service`: 缓存旁路的翻译服务入口

pub mod engine;
pub mod service;

pub use engine::{EngineOutput, TranslationEngine};
pub use service::{
    ServiceStats, ServiceStatsSnapshot, TranslationOutcome, TranslationRequest, TranslationService,
    TranslationSource,
};
