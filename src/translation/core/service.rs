//! 翻译服务核心实现
//!
//! 本模块实现缓存旁路（cache-aside）的文章翻译服务：
//!
//! 1. **查找**：按 [`CacheKey`] 查询存储，命中直接返回已存储的译文
//! 2. **未命中**：规范化 → 收集片段或分块 → 批次调度 → 回填 → 后处理
//! 3. **持久化**：插入新记录；唯一键冲突说明有并发请求抢先写入，
//!    此时重新读取并返回已存在的记录
//!
//! ## 主要组件
//!
//! - `TranslationService`: 服务入口，对后端和存储做泛型
//! - `TranslationRequest` / `TranslationOutcome`: 请求与结果
//! - `ServiceStats`: 线程安全的统计信息收集器
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use article_translator::translation::{
//!     MemoryStore, MockBackend, TranslationRequest, TranslationService,
//! };
//!
//! # async fn demo() -> article_translator::translation::TranslationResult<()> {
//! let service = TranslationService::new(MockBackend::prefixing("T:"), MemoryStore::new(), 4)?;
//! let request = TranslationRequest::new("article-1", "en", "fr", "<p>Hello</p>", "2024-05-01");
//! let outcome = service.translate(request).await?;
//! println!("{} ({})", outcome.translated_html, outcome.source);
//! # Ok(())
//! # }
//! ```
//!
//! ## 并发
//!
//! 节点模式下 DOM 树（`Rc` 节点）在批次调用期间保持存活，因此
//! [`TranslationService::translate`] 返回的 future 不是 `Send`，
//! 需要在调用方所在任务中驱动（`#[tokio::main]`、`block_on` 或 `LocalSet`）。
//! 同一服务实例可被多个并发请求共享。

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize, Serializer};

use super::engine::TranslationEngine;
use crate::translation::backend::{BackendMode, TranslationBackend};
use crate::translation::config::constants;
use crate::translation::error::{helpers, StoreError, TranslationError, TranslationResult};
use crate::translation::pipeline::{
    ensure_parseable, normalize, reassemble_chunks, reassemble_nodes, Batcher, PostProcessor,
    SegmentTree,
};
use crate::translation::storage::{CacheKey, RecordId, StoredTranslation, TranslationRecord, TranslationStore};

fn default_source_language() -> String {
    constants::DEFAULT_SOURCE_LANG.to_string()
}

/// 翻译请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRequest {
    pub article_id: String,
    #[serde(alias = "srcLanguage", default = "default_source_language")]
    pub source_language: String,
    pub target_language: String,
    pub html_content: String,
    /// 内容版本，通常是文章的最后修改时间
    #[serde(alias = "lastUpdated")]
    pub content_version: String,
}

impl TranslationRequest {
    pub fn new(
        article_id: impl Into<String>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
        html_content: impl Into<String>,
        content_version: impl Into<String>,
    ) -> Self {
        Self {
            article_id: article_id.into(),
            source_language: source_language.into(),
            target_language: target_language.into(),
            html_content: html_content.into(),
            content_version: content_version.into(),
        }
    }

    /// 验证请求字段
    pub fn validate(&self) -> TranslationResult<()> {
        let required = [
            ("articleId", &self.article_id),
            ("sourceLanguage", &self.source_language),
            ("targetLanguage", &self.target_language),
            ("contentVersion", &self.content_version),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(helpers::validation_error(format!("{} 不能为空", field)));
            }
        }

        if self.html_content.trim().is_empty() {
            return Err(helpers::validation_error("htmlContent 不能为空"));
        }

        Ok(())
    }

    fn source_lang(&self) -> String {
        self.source_language.trim().to_ascii_lowercase()
    }

    fn target_lang(&self) -> String {
        self.target_language.trim().to_ascii_lowercase()
    }
}

/// 译文来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationSource {
    /// 来自已存储的记录
    Cache,
    /// 由指定后端新翻译
    Backend(String),
}

impl TranslationSource {
    pub fn as_str(&self) -> &str {
        match self {
            TranslationSource::Cache => "cache",
            TranslationSource::Backend(identifier) => identifier,
        }
    }

    pub fn is_cache(&self) -> bool {
        matches!(self, TranslationSource::Cache)
    }
}

impl fmt::Display for TranslationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TranslationSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// 翻译结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationOutcome {
    pub translated_html: String,
    pub source: TranslationSource,
    /// 对应的存储记录；并发写入后无法读回时为空
    pub translation_id: Option<RecordId>,
}

/// 翻译服务
///
/// 后端和存储在构造时注入，服务不持有任何全局状态。
pub struct TranslationService<B, S> {
    backend: B,
    store: S,
    max_concurrent_batches: usize,
    post_processor: PostProcessor,
    stats: ServiceStats,
}

impl<B: TranslationBackend, S: TranslationStore> TranslationService<B, S> {
    /// 创建翻译服务
    ///
    /// # 参数
    /// * `backend` - 翻译后端
    /// * `store` - 翻译记录存储
    /// * `max_concurrent_batches` - 单个请求内同时进行的后端调用数上限
    pub fn new(backend: B, store: S, max_concurrent_batches: usize) -> TranslationResult<Self> {
        Ok(Self {
            backend,
            store,
            max_concurrent_batches: max_concurrent_batches.max(1),
            post_processor: PostProcessor::new()?,
            stats: ServiceStats::default(),
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn stats(&self) -> &ServiceStats {
        &self.stats
    }

    /// 请求对应的缓存键
    pub fn cache_key(&self, request: &TranslationRequest) -> CacheKey {
        CacheKey::new(
            request.article_id.trim(),
            request.source_lang(),
            request.target_lang(),
            self.backend.identifier(),
            request.content_version.trim(),
        )
    }

    /// 翻译文章
    ///
    /// 命中缓存时不会调用后端；未命中时完整执行管道并写入一条记录。
    /// 任何批次失败都会让整个请求失败，不会存储部分翻译的结果。
    pub async fn translate(&self, request: TranslationRequest) -> TranslationResult<TranslationOutcome> {
        let start = Instant::now();
        self.stats.inc_requests();

        let result = self.translate_inner(&request).await;
        self.stats.add_processing_time(start.elapsed());

        match result {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.stats.inc_errors();
                helpers::log_error(e.with_context(format!("文章 {}", request.article_id)))
            }
        }
    }

    /// 查询已存储的翻译，不触发翻译
    pub async fn status(&self, request: &TranslationRequest) -> TranslationResult<Option<StoredTranslation>> {
        let key = self.cache_key(request);
        Ok(self.store.find_by_key(&key).await?)
    }

    async fn translate_inner(&self, request: &TranslationRequest) -> TranslationResult<TranslationOutcome> {
        request.validate()?;
        let key = self.cache_key(request);

        if let Some(stored) = self.store.find_by_key(&key).await? {
            self.stats.inc_cache_hits();
            tracing::info!("缓存命中: {} (记录 {})", key, stored.id);
            return Ok(TranslationOutcome {
                translated_html: stored.record.translated_html,
                source: TranslationSource::Cache,
                translation_id: Some(stored.id),
            });
        }

        self.stats.inc_cache_misses();
        tracing::info!("缓存未命中: {}", key);

        let (translated_html, character_count) = self.run_pipeline(request).await?;
        let record = TranslationRecord::new(
            &key,
            translated_html.clone(),
            request.html_content.clone(),
            character_count,
        );
        let source = TranslationSource::Backend(self.backend.identifier().to_string());

        match self.store.insert(record).await {
            Ok(id) => {
                tracing::info!("已保存翻译记录 {}: {}", id, key);
                Ok(TranslationOutcome {
                    translated_html,
                    source,
                    translation_id: Some(id),
                })
            }
            Err(StoreError::UniqueViolation(_)) => {
                tracing::warn!("并发请求已写入 {}，读取已存在的记录", key);
                match self.store.find_by_key(&key).await? {
                    Some(stored) => Ok(TranslationOutcome {
                        translated_html: stored.record.translated_html,
                        source,
                        translation_id: Some(stored.id),
                    }),
                    None => {
                        tracing::warn!("唯一键冲突后未能读回记录 {}，返回本次结果", key);
                        Ok(TranslationOutcome {
                            translated_html,
                            source,
                            translation_id: None,
                        })
                    }
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 执行翻译管道，返回后处理后的 HTML 和送翻字符数
    async fn run_pipeline(&self, request: &TranslationRequest) -> TranslationResult<(String, usize)> {
        let source_lang = request.source_lang();
        let target_lang = request.target_lang();
        let engine = TranslationEngine::new(&self.backend, self.max_concurrent_batches);
        let normalized = normalize(&request.html_content);

        let (html, output) = match self.backend.mode() {
            BackendMode::NodeText => {
                let mut tree = SegmentTree::parse(&request.article_id, &normalized)?;
                let segments = tree.collect_segments();
                self.stats.add_segments(segments.len());
                tracing::info!("收集到 {} 个待翻译片段", segments.len());

                let output = engine
                    .translate_segments(&segments, &source_lang, &target_lang)
                    .await?;
                let html = reassemble_nodes(&mut tree, &segments, &output.translations)?;
                (html, output)
            }
            BackendMode::HtmlChunk => {
                ensure_parseable(&request.article_id, &normalized)?;
                let max_chars = self.backend.limits().max_chars_per_batch;
                let chunks = Batcher::chunk_html(&normalized, max_chars);
                let pending = chunks.iter().filter(|c| c.needs_translation()).count();
                self.stats.add_segments(pending);
                tracing::info!("切分为 {} 个分块，{} 个需要翻译", chunks.len(), pending);

                let output = engine
                    .translate_chunks(&chunks, &source_lang, &target_lang)
                    .await?;
                let html = reassemble_chunks(&chunks, &output.translations)?;
                (html, output)
            }
        };

        self.stats.add_batches(output.batch_count);
        self.stats.add_chars_processed(output.char_count);

        Ok((self.post_processor.process(&html), output.char_count))
    }
}

/// 服务统计信息
#[derive(Debug, Default)]
pub struct ServiceStats {
    requests: AtomicUsize,
    cache_hits: AtomicUsize,
    cache_misses: AtomicUsize,
    segments_collected: AtomicUsize,
    batches_dispatched: AtomicUsize,
    total_chars_processed: AtomicUsize,
    errors_encountered: AtomicUsize,
    /// 微秒
    processing_time: AtomicU64,
}

impl ServiceStats {
    pub fn inc_requests(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cache_hits(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cache_misses(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_segments(&self, count: usize) {
        self.segments_collected.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_batches(&self, count: usize) {
        self.batches_dispatched.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_chars_processed(&self, count: usize) {
        self.total_chars_processed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn inc_errors(&self) {
        self.errors_encountered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_processing_time(&self, duration: Duration) {
        self.processing_time
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    /// 获取统计数据快照
    pub fn snapshot(&self) -> ServiceStatsSnapshot {
        ServiceStatsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            segments_collected: self.segments_collected.load(Ordering::Relaxed),
            batches_dispatched: self.batches_dispatched.load(Ordering::Relaxed),
            total_chars_processed: self.total_chars_processed.load(Ordering::Relaxed),
            errors_encountered: self.errors_encountered.load(Ordering::Relaxed),
            processing_time: Duration::from_micros(self.processing_time.load(Ordering::Relaxed)),
        }
    }
}

/// 统计数据快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServiceStatsSnapshot {
    pub requests: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub segments_collected: usize,
    pub batches_dispatched: usize,
    pub total_chars_processed: usize,
    pub errors_encountered: usize,
    pub processing_time: Duration,
}

impl ServiceStatsSnapshot {
    /// 缓存命中率
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.cache_hits + self.cache_misses;
        if lookups == 0 {
            0.0
        } else {
            self.cache_hits as f64 / lookups as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::backend::MockBackend;
    use crate::translation::storage::MemoryStore;

    fn request(html: &str) -> TranslationRequest {
        TranslationRequest::new("article-1", "EN", " fr ", html, "v1")
    }

    #[test]
    fn test_request_deserializes_aliases() {
        let request: TranslationRequest = serde_json::from_str(
            r#"{"articleId":"a","srcLanguage":"de","targetLanguage":"fr","htmlContent":"<p>x</p>","lastUpdated":"2024-01-01"}"#,
        )
        .unwrap();
        assert_eq!(request.source_language, "de");
        assert_eq!(request.content_version, "2024-01-01");

        let request: TranslationRequest = serde_json::from_str(
            r#"{"articleId":"a","targetLanguage":"fr","htmlContent":"<p>x</p>","contentVersion":"1"}"#,
        )
        .unwrap();
        assert_eq!(request.source_language, "en");
    }

    #[test]
    fn test_request_validation() {
        assert!(request("<p>x</p>").validate().is_ok());
        assert!(matches!(request("  ").validate(), Err(TranslationError::InvalidInput(_))));

        let mut missing = request("<p>x</p>");
        missing.content_version = String::new();
        assert!(matches!(missing.validate(), Err(TranslationError::InvalidInput(_))));
    }

    #[test]
    fn test_cache_key_normalizes_languages() {
        let service = TranslationService::new(MockBackend::prefixing("T:"), MemoryStore::new(), 2).unwrap();
        let key = service.cache_key(&request("<p>x</p>"));

        assert_eq!(key.source_language, "en");
        assert_eq!(key.target_language, "fr");
        assert_eq!(key.backend_identifier, "mock");
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = TranslationOutcome {
            translated_html: "<p>x</p>".to_string(),
            source: TranslationSource::Cache,
            translation_id: Some(RecordId(3)),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["source"], "cache");
        assert_eq!(json["translationId"], 3);

        let outcome = TranslationOutcome {
            source: TranslationSource::Backend("deepl_translate".to_string()),
            ..outcome
        };
        assert_eq!(serde_json::to_value(&outcome).unwrap()["source"], "deepl_translate");
    }

    #[tokio::test]
    async fn test_miss_then_hit_updates_stats() {
        let service = TranslationService::new(MockBackend::prefixing("T:"), MemoryStore::new(), 2).unwrap();

        let first = service.translate(request("<p>Hello</p>")).await.unwrap();
        assert_eq!(first.translated_html, "<p>T:Hello</p>");
        assert_eq!(first.source, TranslationSource::Backend("mock".to_string()));

        let second = service.translate(request("<p>Hello</p>")).await.unwrap();
        assert!(second.source.is_cache());
        assert_eq!(second.translation_id, first.translation_id);

        let stats = service.stats().snapshot();
        assert_eq!(stats.requests, 2);
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.cache_misses, 1);
        assert_eq!(stats.segments_collected, 1);
        assert_eq!(stats.batches_dispatched, 1);
        assert_eq!(stats.total_chars_processed, 5);
        assert_eq!(stats.hit_rate(), 0.5);
        assert_eq!(service.backend().call_count(), 1);
    }

    #[tokio::test]
    async fn test_status_does_not_translate() {
        let service = TranslationService::new(MockBackend::prefixing("T:"), MemoryStore::new(), 2).unwrap();

        assert!(service.status(&request("<p>Hi</p>")).await.unwrap().is_none());
        service.translate(request("<p>Hi</p>")).await.unwrap();

        let stored = service.status(&request("<p>Hi</p>")).await.unwrap().unwrap();
        assert_eq!(stored.record.original_html, "<p>Hi</p>");
        assert_eq!(stored.record.character_count, 2);
        assert_eq!(service.backend().call_count(), 1);
    }
}
