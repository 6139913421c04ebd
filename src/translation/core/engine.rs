//! 批次调度引擎
//!
//! 把翻译单元规划成批次后并发发送给后端，并按批次起始位置写回结果，
//! 后端调用的完成顺序不会影响输出顺序。
//!
//! ## 失败策略
//!
//! 任一批次失败即整体失败，其余未完成的调用被丢弃，
//! 不会产出部分翻译的结果。引擎本身从不重试。

use futures::stream::{self, StreamExt};

use crate::translation::backend::TranslationBackend;
use crate::translation::error::BackendError;
use crate::translation::pipeline::batch::{Batch, Batcher, HtmlChunk};
use crate::translation::pipeline::collector::Segment;

/// 一次调度的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOutput {
    /// 与输入单元一一对应的译文
    pub translations: Vec<String>,
    /// 发送的批次数
    pub batch_count: usize,
    /// 发送的原文字符数
    pub char_count: usize,
}

/// 翻译引擎
pub struct TranslationEngine<'a, B: ?Sized> {
    backend: &'a B,
    max_concurrent_batches: usize,
}

impl<'a, B: TranslationBackend + ?Sized> TranslationEngine<'a, B> {
    pub fn new(backend: &'a B, max_concurrent_batches: usize) -> Self {
        Self {
            backend,
            max_concurrent_batches: max_concurrent_batches.max(1),
        }
    }

    /// 翻译节点片段
    pub async fn translate_segments(
        &self,
        segments: &[Segment],
        source_lang: &str,
        target_lang: &str,
    ) -> Result<EngineOutput, BackendError> {
        let units: Vec<String> = segments.iter().map(|s| s.original_text.clone()).collect();
        self.dispatch(&units, source_lang, target_lang).await
    }

    /// 翻译 HTML 分块
    ///
    /// 只发送需要翻译的分块，返回的译文与这些分块按顺序对应。
    pub async fn translate_chunks(
        &self,
        chunks: &[HtmlChunk],
        source_lang: &str,
        target_lang: &str,
    ) -> Result<EngineOutput, BackendError> {
        let units: Vec<String> = chunks
            .iter()
            .filter(|c| c.needs_translation())
            .map(|c| c.html.clone())
            .collect();
        self.dispatch(&units, source_lang, target_lang).await
    }

    async fn dispatch(
        &self,
        units: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Result<EngineOutput, BackendError> {
        let batches = Batcher::new(self.backend.limits()).plan(units);
        let batch_count = batches.len();
        let char_count = batches.iter().map(|b| b.char_count).sum();

        if batches.is_empty() {
            return Ok(EngineOutput {
                translations: Vec::new(),
                batch_count,
                char_count,
            });
        }

        tracing::info!(
            "发送 {} 个批次到 {}（并发 {}）",
            batch_count,
            self.backend.identifier(),
            self.max_concurrent_batches
        );

        let mut slots: Vec<Option<String>> = vec![None; units.len()];
        let mut results = stream::iter(batches)
            .map(|batch| self.translate_batch(units, batch, source_lang, target_lang))
            .buffer_unordered(self.max_concurrent_batches);

        while let Some((batch, result)) = results.next().await {
            let translations = result?;
            if translations.len() != batch.len {
                return Err(BackendError::malformed(
                    self.backend.identifier(),
                    format!(
                        "批次 {} 期望 {} 条译文，实际返回 {} 条",
                        batch.start,
                        batch.len,
                        translations.len()
                    ),
                ));
            }

            for (offset, translated) in translations.into_iter().enumerate() {
                slots[batch.start + offset] = Some(translated);
            }
        }

        let translations = slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| BackendError::malformed(self.backend.identifier(), "部分单元没有译文"))?;

        Ok(EngineOutput {
            translations,
            batch_count,
            char_count,
        })
    }

    async fn translate_batch(
        &self,
        units: &[String],
        batch: Batch,
        source_lang: &str,
        target_lang: &str,
    ) -> (Batch, Result<Vec<String>, BackendError>) {
        tracing::debug!(
            "批次 {}..{}: {} 个单元, {} 字符",
            batch.start,
            batch.start + batch.len,
            batch.len,
            batch.char_count
        );
        let result = self
            .backend
            .translate(&units[batch.range()], source_lang, target_lang)
            .await;
        (batch, result)
    }
}
