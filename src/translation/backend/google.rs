//! Google Translate v2 后端
//!
//! 以 `format=html` 提交整段 HTML，服务端负责保留标签结构。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{
    classify_status, classify_transport, ensure_count, http_client, BackendMode, BatchLimits,
    TranslationBackend,
};
use crate::translation::config::{constants, TranslationConfig};
use crate::translation::error::{BackendError, TranslationResult};

const IDENTIFIER: &str = "google_translate";

#[derive(Debug, Serialize)]
struct GoogleRequest<'a> {
    q: &'a [String],
    source: &'a str,
    target: &'a str,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    data: GoogleData,
}

#[derive(Debug, Deserialize)]
struct GoogleData {
    translations: Vec<GoogleTranslation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleTranslation {
    translated_text: String,
}

/// Google 翻译后端
pub struct GoogleBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    limits: BatchLimits,
}

impl GoogleBackend {
    pub fn new(config: &TranslationConfig, api_key: String) -> TranslationResult<Self> {
        Ok(Self {
            client: http_client(config)?,
            api_url: config
                .api_url
                .clone()
                .unwrap_or_else(|| constants::GOOGLE_API_URL.to_string()),
            api_key,
            limits: config.batch_limits(BatchLimits::new(
                constants::GOOGLE_MAX_SEGMENTS,
                constants::GOOGLE_MAX_CHARS,
            )),
        })
    }
}

#[async_trait]
impl TranslationBackend for GoogleBackend {
    fn identifier(&self) -> &str {
        IDENTIFIER
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
        let request = GoogleRequest {
            q: texts,
            source: source_lang,
            target: target_lang,
            format: "html",
        };

        let response = self
            .client
            .post(&self.api_url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| classify_transport(IDENTIFIER, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(IDENTIFIER, status, &body));
        }

        let parsed: GoogleResponse = response
            .json()
            .await
            .map_err(|e| BackendError::malformed(IDENTIFIER, e.to_string()))?;

        ensure_count(
            IDENTIFIER,
            texts.len(),
            parsed
                .data
                .translations
                .into_iter()
                .map(|t| t.translated_text)
                .collect(),
        )
    }
}
