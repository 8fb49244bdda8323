use crate::error::TranslationError;

/// Result of one translation attempt. Exactly one variant per attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationOutcome {
    Success { translated_text: String },
    /// The provider answered with an `error_code`.
    ProviderError { code: String, message: String },
    /// The call never produced a usable provider answer.
    TransportError { message: String },
    /// Credentials were incomplete; no request was sent.
    ConfigInvalid,
}

impl From<TranslationError> for TranslationOutcome {
    fn from(err: TranslationError) -> Self {
        Self::TransportError {
            message: err.to_string(),
        }
    }
}
