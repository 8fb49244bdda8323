//! Translation HTTP client.
//!
//! Builds the signed query, performs the single GET and classifies the body
//! into a [`TranslationOutcome`]. Nothing escapes as an error.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::Credentials;
use crate::config::TranslationConfig;
use crate::error::TranslationError;
use crate::outcome::TranslationOutcome;
use crate::provider::DEFAULT_ENDPOINT;
use crate::provider::LanguagePair;
use crate::provider::TranslateResponse;
use crate::provider::TranslationRequest;
use crate::provider::describe_error_code;
use crate::sign::SaltGenerator;

const MAX_ERROR_BODY_CHARS: usize = 300;

/// Anything able to turn text into a [`TranslationOutcome`].
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        languages: &LanguagePair,
        credentials: &Credentials,
    ) -> TranslationOutcome;
}

/// Transport settings for [`TranslationClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub endpoint: String,
    /// Transport timeout; `None` leaves it to reqwest.
    pub timeout: Option<Duration>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: None,
        }
    }
}

impl ClientSettings {
    pub fn from_config(config: &TranslationConfig) -> Self {
        Self {
            endpoint: config.effective_endpoint().to_string(),
            timeout: Some(config.effective_timeout()),
        }
    }
}

/// Translation client.
pub struct TranslationClient {
    http: Client,
    endpoint: String,
    salts: SaltGenerator,
}

impl TranslationClient {
    pub fn new(settings: ClientSettings) -> Result<Self, TranslationError> {
        let mut builder =
            Client::builder().user_agent(concat!("fanyi/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(TranslationError::Network)?;

        Ok(Self {
            http,
            endpoint: settings.endpoint,
            salts: SaltGenerator::new(),
        })
    }

    /// Create a new translation client from configuration.
    pub fn from_config(config: &TranslationConfig) -> Result<Self, TranslationError> {
        Self::new(ClientSettings::from_config(config))
    }

    async fn send(
        &self,
        request: &TranslationRequest,
    ) -> Result<TranslateResponse, TranslationError> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&request.query())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(TranslationError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| TranslationError::Parse(e.to_string()))
    }
}

#[async_trait]
impl Translator for TranslationClient {
    async fn translate(
        &self,
        text: &str,
        languages: &LanguagePair,
        credentials: &Credentials,
    ) -> TranslationOutcome {
        if !credentials.is_valid() {
            tracing::debug!("credentials incomplete, not sending translation request");
            return TranslationOutcome::ConfigInvalid;
        }

        let request =
            TranslationRequest::signed(text, languages, credentials, self.salts.next_salt());
        tracing::debug!(
            from = request.source_lang(),
            to = request.target_lang(),
            salt = request.salt(),
            chars = text.chars().count(),
            "sending translation request"
        );

        match self.send(&request).await {
            Ok(response) => classify(response),
            Err(err) => {
                tracing::warn!("translation request failed: {err}");
                err.into()
            }
        }
    }
}

/// Trim an HTTP error body to at most `MAX_ERROR_BODY_CHARS` characters.
fn truncate_body(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

/// Map a parsed provider body to an outcome. `error_code` wins over any
/// result list present in the same body.
fn classify(response: TranslateResponse) -> TranslationOutcome {
    if let Some(code) = response.error_code {
        let message = response
            .error_msg
            .filter(|m| !m.is_empty())
            .or_else(|| describe_error_code(&code).map(str::to_string))
            .unwrap_or_else(|| format!("error code {code}"));
        tracing::warn!(code = %code, "provider rejected translation: {message}");
        return TranslationOutcome::ProviderError { code, message };
    }

    let Some(results) = response.trans_result else {
        let reason = "response has neither trans_result nor error_code";
        return TranslationError::Parse(reason.to_string()).into();
    };

    let total = results.len();
    let Some(first) = results.into_iter().next() else {
        return TranslationError::Parse("trans_result is empty".to_string()).into();
    };
    if total > 1 {
        tracing::warn!(
            dropped = total - 1,
            "provider returned several result entries, only the first is used"
        );
    }

    TranslationOutcome::Success {
        translated_text: first.dst,
    }
}
