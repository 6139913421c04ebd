//! DeepL 后端
//!
//! 一次请求携带多个 `text` 字段。送出的是 DOM 解码后的纯文本，
//! 不开启 `tag_handling`，否则 `<`、`&` 会被当作标记解析，译文回填后再被转义一次。

use async_trait::async_trait;
use serde::Deserialize;

use super::{
    classify_status, classify_transport, ensure_count, http_client, BackendMode, BatchLimits,
    TranslationBackend,
};
use crate::translation::config::{constants, TranslationConfig};
use crate::translation::error::{BackendError, TranslationResult};

const IDENTIFIER: &str = "deepl_translate";

#[derive(Debug, Deserialize)]
struct DeepLResponse {
    translations: Vec<DeepLTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeepLTranslation {
    text: String,
}

/// DeepL 后端
pub struct DeepLBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    limits: BatchLimits,
}

impl DeepLBackend {
    pub fn new(config: &TranslationConfig, api_key: String) -> TranslationResult<Self> {
        Ok(Self {
            client: http_client(config)?,
            api_url: config
                .api_url
                .clone()
                .unwrap_or_else(|| constants::DEEPL_API_URL.to_string()),
            api_key,
            limits: config.batch_limits(BatchLimits::new(
                constants::DEEPL_MAX_TEXTS,
                constants::DEEPL_MAX_CHARS,
            )),
        })
    }
}

/// 源语言只接受主语言代码
fn source_code(lang: &str) -> String {
    lang.split(['-', '_'])
        .next()
        .unwrap_or(lang)
        .to_ascii_uppercase()
}

/// 目标语言对英语和葡萄牙语要求区域变体
fn target_code(lang: &str) -> String {
    match lang.to_ascii_lowercase().as_str() {
        "en" => "EN-US".to_string(),
        "pt" => "PT-PT".to_string(),
        other => other.replace('_', "-").to_ascii_uppercase(),
    }
}

/// 构造请求表单，文本原样作为纯文本发送
fn build_form(texts: &[String], source_lang: &str, target_lang: &str) -> Vec<(&'static str, String)> {
    let mut form: Vec<(&str, String)> = texts.iter().map(|text| ("text", text.clone())).collect();
    form.push(("source_lang", source_code(source_lang)));
    form.push(("target_lang", target_code(target_lang)));
    form
}

#[async_trait]
impl TranslationBackend for DeepLBackend {
    fn identifier(&self) -> &str {
        IDENTIFIER
    }

    fn mode(&self) -> BackendMode {
        BackendMode::NodeText
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
        let form = build_form(texts, source_lang, target_lang);

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .form(&form)
            .send()
            .await
            .map_err(|e| classify_transport(IDENTIFIER, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(IDENTIFIER, status, &body));
        }

        let parsed: DeepLResponse = response
            .json()
            .await
            .map_err(|e| BackendError::malformed(IDENTIFIER, e.to_string()))?;

        ensure_count(
            IDENTIFIER,
            texts.len(),
            parsed.translations.into_iter().map(|t| t.text).collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_codes() {
        assert_eq!(source_code("en-GB"), "EN");
        assert_eq!(source_code("de"), "DE");
        assert_eq!(target_code("en"), "EN-US");
        assert_eq!(target_code("pt"), "PT-PT");
        assert_eq!(target_code("pt_br"), "PT-BR");
        assert_eq!(target_code("fr"), "FR");
    }

    #[test]
    fn test_form_sends_plain_text() {
        let texts = vec!["Tom & Jerry".to_string(), "a < b\u{a0}c".to_string()];
        let form = build_form(&texts, "en", "fr");

        assert_eq!(
            form,
            vec![
                ("text", "Tom & Jerry".to_string()),
                ("text", "a < b\u{a0}c".to_string()),
                ("source_lang", "EN".to_string()),
                ("target_lang", "FR".to_string()),
            ]
        );
        assert!(form.iter().all(|(name, _)| *name != "tag_handling"));
    }

    #[test]
    fn test_response_shape() {
        let parsed: DeepLResponse = serde_json::from_str(
            r#"{"translations":[{"detected_source_language":"EN","text":"Bonjour"}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.translations[0].text, "Bonjour");
    }
}
