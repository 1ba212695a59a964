// LibreTranslate HTTP client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::TranslationBackend;
use crate::core::config::TranslationConfig;
use crate::core::errors::{TranslationError, TranslationResult};

/// Client for a LibreTranslate-compatible `/translate` endpoint
pub struct LibreTranslateClient {
    api_url: String,
    api_key: Option<String>,
    timeout: Duration,
    http_client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct TranslateBody<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TranslateReply {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
    error: Option<String>,
}

impl LibreTranslateClient {
    pub fn new(config: &TranslationConfig) -> TranslationResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(config.concurrency)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        info!("LibreTranslate client ready ({})", config.api_url);

        Ok(Self {
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            timeout: config.timeout,
            http_client,
        })
    }

    fn parse_reply(body: &str) -> TranslationResult<String> {
        let reply: TranslateReply = serde_json::from_str(body)
            .map_err(|e| TranslationError::InvalidResponse(e.to_string()))?;

        match (reply.translated_text, reply.error) {
            (Some(text), _) => Ok(text),
            (None, Some(err)) => Err(TranslationError::InvalidResponse(err)),
            (None, None) => Err(TranslationError::InvalidResponse(
                "missing translatedText".to_string(),
            )),
        }
    }
}

#[async_trait]
impl TranslationBackend for LibreTranslateClient {
    async fn translate(&self, text: &str, target_lang: &str) -> TranslationResult<String> {
        let body = TranslateBody {
            q: text,
            source: "auto",
            target: target_lang,
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        let response = self
            .http_client
            .post(&self.api_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TranslationError::Timeout(self.timeout)
                } else {
                    TranslationError::RequestFailed(e)
                }
            })?;

        let status = response.status();
        let text_body = response.text().await?;

        if !status.is_success() {
            return Err(TranslationError::BadStatus {
                status: status.as_u16(),
                body: text_body,
            });
        }

        let translated = Self::parse_reply(&text_body)?;
        debug!("LibreTranslate: {:?} -> {:?} ({})", text, translated, target_lang);
        Ok(translated)
    }
}
