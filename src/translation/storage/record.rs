//! 翻译记录与缓存键

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 缓存键
///
/// 同一个缓存键最多对应一条翻译记录。`content_version` 由调用方提供
/// （通常是文章的最后修改时间），源内容变化时换用新版本号即可让旧记录失效。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub article_id: String,
    pub source_language: String,
    pub target_language: String,
    pub backend_identifier: String,
    pub content_version: String,
}

impl CacheKey {
    pub fn new(
        article_id: impl Into<String>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
        backend_identifier: impl Into<String>,
        content_version: impl Into<String>,
    ) -> Self {
        Self {
            article_id: article_id.into(),
            source_language: source_language.into(),
            target_language: target_language.into(),
            backend_identifier: backend_identifier.into(),
            content_version: content_version.into(),
        }
    }

    /// 计算缓存键摘要（blake3，十六进制）
    ///
    /// 每个字段前写入长度前缀，避免 `("ab", "c")` 与 `("a", "bc")` 冲突。
    pub fn digest(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for field in [
            &self.article_id,
            &self.source_language,
            &self.target_language,
            &self.backend_identifier,
            &self.content_version,
        ] {
            hasher.update(&(field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}->{}/{}@{}",
            self.article_id,
            self.source_language,
            self.target_language,
            self.backend_identifier,
            self.content_version
        )
    }
}

/// 记录标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 持久化的翻译结果，写入后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRecord {
    pub article_id: String,
    pub source_language: String,
    pub target_language: String,
    pub content_version: String,
    pub backend_identifier: String,
    pub translated_html: String,
    pub original_html: String,
    /// 送往翻译后端的字符数
    pub character_count: usize,
    pub created_at: DateTime<Utc>,
}

impl TranslationRecord {
    pub fn new(
        key: &CacheKey,
        translated_html: String,
        original_html: String,
        character_count: usize,
    ) -> Self {
        Self {
            article_id: key.article_id.clone(),
            source_language: key.source_language.clone(),
            target_language: key.target_language.clone(),
            content_version: key.content_version.clone(),
            backend_identifier: key.backend_identifier.clone(),
            translated_html,
            original_html,
            character_count,
            created_at: Utc::now(),
        }
    }

    /// 记录对应的缓存键
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(
            self.article_id.clone(),
            self.source_language.clone(),
            self.target_language.clone(),
            self.backend_identifier.clone(),
            self.content_version.clone(),
        )
    }
}

/// 带标识的已存储记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTranslation {
    pub id: RecordId,
    pub record: TranslationRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_key() -> CacheKey {
        CacheKey::new("article-1", "en", "fr", "deepl_translate", "2024-05-01T10:00:00Z")
    }

    #[test]
    fn test_digest_is_stable() {
        assert_eq!(sample_key().digest(), sample_key().digest());
        assert_eq!(sample_key().digest().len(), 64);
    }

    #[test]
    fn test_digest_distinguishes_field_boundaries() {
        let a = CacheKey::new("ab", "c", "fr", "x", "1");
        let b = CacheKey::new("a", "bc", "fr", "x", "1");
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn test_digest_changes_with_content_version() {
        let mut newer = sample_key();
        newer.content_version = "2024-06-01T10:00:00Z".to_string();
        assert_ne!(sample_key().digest(), newer.digest());
    }

    #[test]
    fn test_record_cache_key_matches_source_key() {
        let key = sample_key();
        let record = TranslationRecord::new(&key, "<p>Bonjour</p>".into(), "<p>Hello</p>".into(), 5);
        assert_eq!(record.cache_key(), key);
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = TranslationRecord::new(&sample_key(), "x".into(), "y".into(), 1);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"articleId\":\"article-1\""));
        assert!(json.contains("\"translatedHtml\":\"x\""));
    }
}
