//! 内存存储
//!
//! 基于 `DashMap` 的并发存储，进程退出即丢失。适用于测试和一次性命令行调用。

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{CacheKey, RecordId, StoredTranslation, TranslationRecord, TranslationStore};
use crate::translation::error::StoreError;

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: DashMap<String, StoredTranslation>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已存储的记录数
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl TranslationStore for MemoryStore {
    async fn find_by_key(&self, key: &CacheKey) -> Result<Option<StoredTranslation>, StoreError> {
        Ok(self
            .records
            .get(&key.digest())
            .map(|entry| entry.value().clone()))
    }

    async fn insert(&self, record: TranslationRecord) -> Result<RecordId, StoreError> {
        let key = record.cache_key();

        // entry 持有分片写锁，检查与插入是原子的
        match self.records.entry(key.digest()) {
            Entry::Occupied(_) => Err(StoreError::UniqueViolation(key)),
            Entry::Vacant(slot) => {
                let id = RecordId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
                slot.insert(StoredTranslation { id, record });
                tracing::debug!("内存存储写入记录 #{}: {}", id, key);
                Ok(id)
            }
        }
    }
}
