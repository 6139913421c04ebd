// 集成测试公共模块
//
// 提供测试辅助工具和共享功能

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use article_translator::translation::{
    BackendMode, CacheKey, MemoryStore, MockBackend, RecordId, StoreError, StoredTranslation,
    TranslationRecord, TranslationRequest, TranslationService, TranslationStore,
};

#[allow(dead_code)]
/// 示例文章
pub const SCENARIO_HTML: &str = r#"<p>Hello <a href="/x">world</a>.</p>"#;

#[allow(dead_code)]
/// 示例文章的期望译文
pub const SCENARIO_TRANSLATED: &str = r#"<p>Bonjour <a href="/x">monde</a>.</p>"#;

/// 使用内存存储的测试服务
#[allow(dead_code)]
pub type MockService = TranslationService<MockBackend, MemoryStore>;

/// 示例映射表后端
#[allow(dead_code)]
pub fn scenario_backend(mode: BackendMode) -> MockBackend {
    MockBackend::mapping([("Hello ", "Bonjour "), ("world", "monde")]).with_mode(mode)
}

/// 创建内存存储的服务
#[allow(dead_code)]
pub fn memory_service(backend: MockBackend) -> MockService {
    TranslationService::new(backend, MemoryStore::new(), 4).expect("service should build")
}

/// 创建 en → fr、版本 v1 的请求
#[allow(dead_code)]
pub fn article_request(article_id: &str, html: &str) -> TranslationRequest {
    TranslationRequest::new(article_id, "en", "fr", html, "v1")
}

/// 查询总是失败的存储
#[allow(dead_code)]
#[derive(Default)]
pub struct UnavailableStore {
    pub inserts: AtomicUsize,
}

#[async_trait]
impl TranslationStore for UnavailableStore {
    async fn find_by_key(&self, _key: &CacheKey) -> Result<Option<StoredTranslation>, StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn insert(&self, _record: TranslationRecord) -> Result<RecordId, StoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Ok(RecordId(1))
    }
}

/// 插入总是冲突、且冲突后读不到记录的存储
#[allow(dead_code)]
#[derive(Default)]
pub struct RacingStore {
    pub lookups: AtomicUsize,
}

#[async_trait]
impl TranslationStore for RacingStore {
    async fn find_by_key(&self, _key: &CacheKey) -> Result<Option<StoredTranslation>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }

    async fn insert(&self, record: TranslationRecord) -> Result<RecordId, StoreError> {
        Err(StoreError::UniqueViolation(record.cache_key()))
    }
}
