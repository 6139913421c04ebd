//! 磁盘存储
//!
//! 使用 redb 嵌入式数据库保存翻译记录。记录以 JSON 编码写入
//! `translation_records` 表，键为缓存键摘要；记录编号由 `translation_sequence`
//! 表维护。redb 的写事务是串行的，因此"检查是否存在 + 插入"在同一写事务内完成即为原子操作。
//!
//! redb 的调用是阻塞的，全部放到 `spawn_blocking` 中执行。

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};

use super::{CacheKey, RecordId, StoredTranslation, TranslationRecord, TranslationStore};
use crate::translation::error::StoreError;

const RECORDS: TableDefinition<&str, &[u8]> = TableDefinition::new("translation_records");
const SEQUENCE: TableDefinition<&str, u64> = TableDefinition::new("translation_sequence");
const SEQUENCE_KEY: &str = "records";

pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// 打开（或创建）数据库文件，并确保表存在
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Backend(format!("创建存储目录失败: {}", e)))?;
            }
        }

        let db = Database::create(path).map_err(backend_error)?;

        let txn = db.begin_write().map_err(backend_error)?;
        {
            txn.open_table(RECORDS).map_err(backend_error)?;
            txn.open_table(SEQUENCE).map_err(backend_error)?;
        }
        txn.commit().map_err(backend_error)?;

        Ok(Self { db: Arc::new(db) })
    }

    /// 已存储的记录数
    pub async fn len(&self) -> Result<u64, StoreError> {
        let db = Arc::clone(&self.db);
        run_blocking(move || {
            let txn = db.begin_read().map_err(backend_error)?;
            let table = txn.open_table(RECORDS).map_err(backend_error)?;
            table.len().map_err(backend_error)
        })
        .await
    }
}

#[async_trait]
impl TranslationStore for RedbStore {
    async fn find_by_key(&self, key: &CacheKey) -> Result<Option<StoredTranslation>, StoreError> {
        let db = Arc::clone(&self.db);
        let digest = key.digest();

        run_blocking(move || {
            let txn = db.begin_read().map_err(backend_error)?;
            let table = txn.open_table(RECORDS).map_err(backend_error)?;

            let stored = match table.get(digest.as_str()).map_err(backend_error)? {
                Some(guard) => Some(decode(guard.value())?),
                None => None,
            };
            Ok(stored)
        })
        .await
    }

    async fn insert(&self, record: TranslationRecord) -> Result<RecordId, StoreError> {
        let db = Arc::clone(&self.db);
        let key = record.cache_key();

        run_blocking(move || {
            let digest = key.digest();
            let txn = db.begin_write().map_err(backend_error)?;

            let id = {
                let mut records = txn.open_table(RECORDS).map_err(backend_error)?;
                let exists = records.get(digest.as_str()).map_err(backend_error)?.is_some();
                if exists {
                    // 未提交的写事务在 drop 时自动回滚
                    return Err(StoreError::UniqueViolation(key));
                }

                let mut sequence = txn.open_table(SEQUENCE).map_err(backend_error)?;
                let last = sequence
                    .get(SEQUENCE_KEY)
                    .map_err(backend_error)?
                    .map(|guard| guard.value())
                    .unwrap_or(0);
                let id = RecordId(last + 1);
                sequence.insert(SEQUENCE_KEY, id.0).map_err(backend_error)?;

                let bytes = serde_json::to_vec(&StoredTranslation { id, record })
                    .map_err(|e| StoreError::Backend(format!("记录编码失败: {}", e)))?;
                records
                    .insert(digest.as_str(), bytes.as_slice())
                    .map_err(backend_error)?;
                id
            };

            txn.commit().map_err(backend_error)?;
            tracing::debug!("磁盘存储写入记录 #{}: {}", id, key);
            Ok(id)
        })
        .await
    }
}

fn decode(bytes: &[u8]) -> Result<StoredTranslation, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Backend(format!("记录解码失败: {}", e)))
}

fn backend_error(error: impl Into<redb::Error>) -> StoreError {
    StoreError::Backend(error.into().to_string())
}

async fn run_blocking<F, T>(f: F) -> Result<T, StoreError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::Backend(format!("存储任务异常: {}", e)))?
}
