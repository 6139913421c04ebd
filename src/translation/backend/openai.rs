//! OpenAI Chat Completions 后端
//!
//! 每个 HTML 分块作为一次独立的对话请求发送，提示词要求模型保留标签。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{classify_status, classify_transport, http_client, BackendMode, BatchLimits, TranslationBackend};
use crate::translation::config::{constants, TranslationConfig};
use crate::translation::error::{BackendError, TranslationResult};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// OpenAI 后端
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    limits: BatchLimits,
}

impl OpenAiBackend {
    pub fn new(config: &TranslationConfig, api_key: String) -> TranslationResult<Self> {
        Ok(Self {
            client: http_client(config)?,
            api_url: config
                .api_url
                .clone()
                .unwrap_or_else(|| constants::OPENAI_API_URL.to_string()),
            api_key,
            model: config.model.clone(),
            limits: config.batch_limits(BatchLimits::new(1, constants::OPENAI_CHUNK_CHARS)),
        })
    }

    fn prompt(chunk: &str, source_lang: &str, target_lang: &str) -> String {
        format!(
            "Translate the following HTML from {} to {}, preserving the HTML tags:\n\n{}",
            source_lang, target_lang, chunk
        )
    }

    async fn translate_chunk(
        &self,
        chunk: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, BackendError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Self::prompt(chunk, source_lang, target_lang),
            }],
            temperature: 0.0,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| classify_transport(&self.model, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(&self.model, status, &body));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| BackendError::malformed(&self.model, e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| BackendError::malformed(&self.model, "响应中没有 choices"))?;

        Ok(strip_code_fence(&content).to_string())
    }
}

/// 去掉模型偶尔包裹的 ```html 代码块
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return content;
    };

    let body = rest.strip_prefix("html").unwrap_or(rest);
    body.strip_suffix("```").unwrap_or(body).trim_matches('\n')
}

#[async_trait]
impl TranslationBackend for OpenAiBackend {
    fn identifier(&self) -> &str {
        &self.model
    }

    fn mode(&self) -> BackendMode {
        BackendMode::HtmlChunk
    }

    fn limits(&self) -> BatchLimits {
        self.limits
    }

    async fn translate(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Vec<String>, BackendError> {
        let mut translations = Vec::with_capacity(texts.len());
        for chunk in texts {
            tracing::debug!("OpenAI 翻译分块: {} 字符", chunk.chars().count());
            translations.push(self.translate_chunk(chunk, source_lang, target_lang).await?);
        }
        Ok(translations)
    }
}
