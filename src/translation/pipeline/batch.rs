//! 翻译批次规划模块
//!
//! 把有序的翻译单元切分为满足后端限制的批次。
//!
//! ## 规则
//!
//! - 贪心装箱：当前批次加入下一个单元会超过单元数或字符数限制时，关闭当前批次
//! - 批次之间不重排，批次 N 的最后一个单元总在批次 N+1 的第一个单元之前
//! - 单独超过字符上限的单元自成一批，不截断也不丢弃
//! - 每个单元按 Unicode 标量计数，并计入 [`constants::UNIT_FRAMING_CHARS`] 的请求开销
//!
//! HTML 分块模式下使用 [`Batcher::chunk_html`]，分块边界只落在记号之间，
//! 永远不会切开一个标签。

use std::ops::Range;

use crate::parsers::html::lexer::tokenize;
use crate::translation::backend::BatchLimits;
use crate::translation::config::constants;

/// 翻译批次
///
/// 表示单元列表中的一段连续区间。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch {
    /// 第一个单元的位置
    pub start: usize,
    /// 单元数
    pub len: usize,
    /// 原文字符数（不含请求开销）
    pub char_count: usize,
}

impl Batch {
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.len
    }
}

/// HTML 分块
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlChunk {
    pub html: String,
    needs_translation: bool,
}

impl HtmlChunk {
    /// 是否包含可见文本
    ///
    /// 只含标签、注释或空白的分块无需发送给后端。
    pub fn needs_translation(&self) -> bool {
        self.needs_translation
    }
}

/// 批次规划器
#[derive(Debug, Clone, Copy)]
pub struct Batcher {
    limits: BatchLimits,
}

impl Batcher {
    pub fn new(limits: BatchLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> BatchLimits {
        self.limits
    }

    /// 规划批次
    ///
    /// # 参数
    /// * `units` - 按文档顺序排列的待翻译文本
    ///
    /// # 返回值
    /// 覆盖全部单元且互不重叠的批次列表
    pub fn plan<S: AsRef<str>>(&self, units: &[S]) -> Vec<Batch> {
        let mut batches = Vec::new();
        let mut current = Batch {
            start: 0,
            len: 0,
            char_count: 0,
        };
        let mut current_cost = 0;

        for (index, unit) in units.iter().enumerate() {
            let chars = unit.as_ref().chars().count();
            let cost = chars + constants::UNIT_FRAMING_CHARS;

            let too_many = current.len + 1 > self.limits.max_units_per_batch;
            let too_long = current_cost + cost > self.limits.max_chars_per_batch;
            if current.len > 0 && (too_many || too_long) {
                batches.push(current);
                current = Batch {
                    start: index,
                    len: 0,
                    char_count: 0,
                };
                current_cost = 0;
            }

            if current.len == 0 && cost > self.limits.max_chars_per_batch {
                tracing::warn!(
                    "单元 {} 长度 {} 超过批次字符上限 {}，单独成批",
                    index,
                    chars,
                    self.limits.max_chars_per_batch
                );
            }

            current.len += 1;
            current.char_count += chars;
            current_cost += cost;
        }

        if current.len > 0 {
            batches.push(current);
        }

        tracing::debug!("{} 个单元规划为 {} 个批次", units.len(), batches.len());
        batches
    }

    /// 按标签边界切分 HTML
    ///
    /// 贪心拼接词法记号直到超过 `max_chars`，超长的单个记号独占一个分块。
    /// 所有分块按顺序拼接后与输入完全相同。
    pub fn chunk_html(html: &str, max_chars: usize) -> Vec<HtmlChunk> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_chars = 0;
        let mut needs_translation = false;

        for token in tokenize(html) {
            let chars = token.text.chars().count();
            if !current.is_empty() && current_chars + chars > max_chars {
                chunks.push(HtmlChunk {
                    html: std::mem::take(&mut current),
                    needs_translation,
                });
                current_chars = 0;
                needs_translation = false;
            }

            current.push_str(token.text);
            current_chars += chars;
            needs_translation |= token.has_visible_text();
        }

        if !current.is_empty() {
            chunks.push(HtmlChunk {
                html: current,
                needs_translation,
            });
        }

        chunks
    }
}
