//! 存储模块
//!
//! 翻译记录的持久化接口。核心管道只需要两个操作：按缓存键查询、插入新记录。
//! 记录一经写入不再更新，也不需要删除。

use std::path::Path;

use async_trait::async_trait;

use crate::translation::error::StoreError;

pub mod memory;
pub mod record;
pub mod redb_store;

pub use memory::MemoryStore;
pub use record::{CacheKey, RecordId, StoredTranslation, TranslationRecord};
pub use redb_store::RedbStore;

/// 翻译记录存储
#[async_trait]
pub trait TranslationStore: Send + Sync {
    /// 按缓存键查询记录
    ///
    /// 查询失败必须返回错误，调用方不得把它当作未命中。
    async fn find_by_key(&self, key: &CacheKey) -> Result<Option<StoredTranslation>, StoreError>;

    /// 插入新记录
    ///
    /// 同一缓存键已存在记录时返回 [`StoreError::UniqueViolation`]。
    async fn insert(&self, record: TranslationRecord) -> Result<RecordId, StoreError>;
}

/// 由配置选择的存储实现
pub enum ConfiguredStore {
    Memory(MemoryStore),
    Redb(RedbStore),
}

impl ConfiguredStore {
    /// 根据可选路径打开存储：无路径时使用内存存储
    pub fn open(path: Option<&str>) -> Result<Self, StoreError> {
        match path {
            Some(path) => {
                let expanded = shellexpand::tilde(path);
                tracing::info!("打开磁盘存储: {}", expanded);
                Ok(Self::Redb(RedbStore::open(Path::new(expanded.as_ref()))?))
            }
            None => {
                tracing::debug!("未配置存储路径，使用内存存储");
                Ok(Self::Memory(MemoryStore::new()))
            }
        }
    }
}

#[async_trait]
impl TranslationStore for ConfiguredStore {
    async fn find_by_key(&self, key: &CacheKey) -> Result<Option<StoredTranslation>, StoreError> {
        match self {
            Self::Memory(store) => store.find_by_key(key).await,
            Self::Redb(store) => store.find_by_key(key).await,
        }
    }

    async fn insert(&self, record: TranslationRecord) -> Result<RecordId, StoreError> {
        match self {
            Self::Memory(store) => store.insert(record).await,
            Self::Redb(store) => store.insert(record).await,
        }
    }
}
