//! Selection translation pipeline.
//!
//! This crate provides:
//! - `ConfigProvider` / `FileConfigProvider` - credential lookup, read fresh
//!   on every attempt
//! - `sign` / `SaltGenerator` - request signing for the provider
//! - `TranslationClient` - signed HTTP call and response classification
//! - `TranslationOrchestrator` - one translation attempt from selection
//!   capture to the user-visible effect
//! - `EditorHost` - the narrow interface a host editor implements

mod client;
mod config;
mod error;
mod host;
mod orchestrator;
mod outcome;
mod provider;
mod sign;

pub use client::ClientSettings;
pub use client::TranslationClient;
pub use client::Translator;
pub use config::APP_ID_ENV;
pub use config::ConfigProvider;
pub use config::Credentials;
pub use config::FileConfigProvider;
pub use config::SECRET_KEY_ENV;
pub use config::TranslationConfig;
pub use error::TranslationError;
pub use host::EditorHost;
pub use host::SelectionContext;
pub use host::Severity;
pub use host::TextRange;
pub use orchestrator::Command;
pub use orchestrator::Mode;
pub use orchestrator::TerminalState;
pub use orchestrator::TranslationOrchestrator;
pub use orchestrator::messages;
pub use outcome::TranslationOutcome;
pub use provider::AUTO_LANGUAGE;
pub use provider::DEFAULT_ENDPOINT;
pub use provider::LanguagePair;
pub use provider::TranslationRequest;
pub use provider::describe_error_code;
pub use sign::SaltGenerator;
pub use sign::sign;
