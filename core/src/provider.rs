//! Baidu general translation API contract.
//!
//! The provider takes a single GET with a signed query string and answers
//! with a JSON body carrying either `trans_result` or `error_code`.

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;

use crate::config::Credentials;
use crate::sign::sign;

pub const DEFAULT_ENDPOINT: &str = "https://fanyi-api.baidu.com/api/trans/vip/translate";

/// Language code asking the provider to detect the language.
pub const AUTO_LANGUAGE: &str = "auto";

/// Source and target language codes of one translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePair {
    pub from: String,
    pub to: String,
}

impl LanguagePair {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl Default for LanguagePair {
    fn default() -> Self {
        Self::new(AUTO_LANGUAGE, "zh")
    }
}

/// A signed request. The signature is derived from the other fields and can
/// only be produced by [`TranslationRequest::signed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    text: String,
    source_lang: String,
    target_lang: String,
    app_id: String,
    salt: u64,
    signature: String,
}

impl TranslationRequest {
    pub fn signed(
        text: &str,
        languages: &LanguagePair,
        credentials: &Credentials,
        salt: u64,
    ) -> Self {
        Self {
            text: text.to_string(),
            source_lang: languages.from.clone(),
            target_lang: languages.to.clone(),
            app_id: credentials.app_id.clone(),
            salt,
            signature: sign(&credentials.app_id, text, salt, &credentials.secret_key),
        }
    }

    pub fn source_lang(&self) -> &str {
        &self.source_lang
    }

    pub fn target_lang(&self) -> &str {
        &self.target_lang
    }

    pub fn salt(&self) -> u64 {
        self.salt
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub(crate) fn query(&self) -> TranslateQuery<'_> {
        TranslateQuery {
            q: &self.text,
            from: &self.source_lang,
            to: &self.target_lang,
            appid: &self.app_id,
            salt: self.salt.to_string(),
            sign: &self.signature,
        }
    }
}

// Wire types
#[derive(Serialize)]
pub(crate) struct TranslateQuery<'a> {
    q: &'a str,
    from: &'a str,
    to: &'a str,
    appid: &'a str,
    salt: String,
    sign: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TranslateResponse {
    #[serde(default)]
    #[allow(dead_code)]
    pub(crate) from: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    pub(crate) to: Option<String>,
    #[serde(default)]
    pub(crate) trans_result: Option<Vec<TransResult>>,
    #[serde(default, deserialize_with = "code_as_string")]
    pub(crate) error_code: Option<String>,
    #[serde(default)]
    pub(crate) error_msg: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransResult {
    #[allow(dead_code)]
    pub(crate) src: String,
    pub(crate) dst: String,
}

/// The provider sends `error_code` as a string, but some gateways forward it
/// as a number.
fn code_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(code)) => Some(code),
        Some(other) => Some(other.to_string()),
    })
}

/// Documented meaning of a provider error code.
pub fn describe_error_code(code: &str) -> Option<&'static str> {
    let description = match code {
        "52001" => "request timed out",
        "52002" => "system error",
        "52003" => "unauthorized user, check the app id",
        "54000" => "required parameter is empty",
        "54001" => "invalid signature, check the secret key",
        "54003" => "access frequency limited",
        "54004" => "insufficient account balance",
        "54005" => "long queries sent too frequently",
        "58000" => "client IP not allowed",
        "58001" => "target language not supported",
        "58002" => "service is closed",
        "90107" => "authentication failed",
        _ => return None,
    };
    Some(description)
}
