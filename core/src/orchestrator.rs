//! Selection translation orchestrator.
//!
//! One invocation walks `Idle -> CapturingSelection -> Translating` and ends
//! in exactly one [`TerminalState`]. Every terminal state tries to notify the
//! user; failures of the host's surfaces are logged and discarded so they can
//! never replace the primary outcome.

use std::sync::Arc;

use crate::client::Translator;
use crate::config::ConfigProvider;
use crate::config::Credentials;
use crate::host::EditorHost;
use crate::host::SelectionContext;
use crate::host::Severity;
use crate::outcome::TranslationOutcome;
use crate::provider::LanguagePair;

/// User-visible message texts.
pub mod messages {
    pub const WELCOME: &str =
        "fanyi is ready. Select some text and run translate-and-show or translate-and-replace.";
    pub const NO_EDITOR: &str = "No editor is open.";
    pub const NO_SELECTION: &str = "No text selected.";
    pub const CONFIGURE_CREDENTIALS: &str =
        "Please configure the translation app id and secret key.";
    pub const INCOMPLETE_CREDENTIALS: &str =
        "Translation credentials are incomplete: both app id and secret key are required.";
    pub const APPLIED: &str = "Translation applied.";
    pub const PROGRESS_TITLE: &str = "Translating...";
    pub const TRANSLATION_FAILED: &str = "Translation failed";
    pub const REQUEST_FAILED: &str = "Translation request failed";
}

/// What to do with a successful translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Present the translation as a read-only message.
    Show,
    /// Overwrite the captured selection with the translation.
    Replace,
}

/// Commands the host can trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Welcome,
    TranslateAndShow(LanguagePair),
    TranslateAndReplace(LanguagePair),
}

/// How an invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalState {
    /// The selection was replaced with the translation.
    Applied,
    /// A message was shown: the translation itself or a handled error.
    Reported(Severity),
    /// Nothing to translate.
    Skipped,
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    CapturingSelection,
    Translating,
}

pub struct TranslationOrchestrator {
    config: Arc<dyn ConfigProvider>,
    translator: Arc<dyn Translator>,
    host: Arc<dyn EditorHost>,
}

impl TranslationOrchestrator {
    pub fn new(
        config: Arc<dyn ConfigProvider>,
        translator: Arc<dyn Translator>,
        host: Arc<dyn EditorHost>,
    ) -> Self {
        Self {
            config,
            translator,
            host,
        }
    }

    pub async fn run(&self, command: Command) -> TerminalState {
        match command {
            Command::Welcome => self.report(Severity::Info, messages::WELCOME).await,
            Command::TranslateAndShow(languages) => {
                self.translate_selection(Mode::Show, &languages).await
            }
            Command::TranslateAndReplace(languages) => {
                self.translate_selection(Mode::Replace, &languages).await
            }
        }
    }

    /// Translate the current selection and apply the outcome per `mode`.
    #[tracing::instrument(
        level = "debug",
        skip(self, languages),
        fields(from = %languages.from, to = %languages.to)
    )]
    pub async fn translate_selection(&self, mode: Mode, languages: &LanguagePair) -> TerminalState {
        tracing::debug!(stage = ?Stage::CapturingSelection);
        let selection = self.host.selection();
        if !selection.has_active_editor {
            return self.skip(messages::NO_EDITOR).await;
        }
        if !selection.has_selection || selection.text.trim().is_empty() {
            return self.skip(messages::NO_SELECTION).await;
        }

        let credentials = self.config.credentials();
        if !self.config.is_valid(&credentials) {
            return self
                .apply(mode, &selection, TranslationOutcome::ConfigInvalid)
                .await;
        }

        tracing::debug!(stage = ?Stage::Translating);
        let outcome = {
            let _progress = ProgressScope::open(self.host.as_ref(), messages::PROGRESS_TITLE);
            self.translator
                .translate(&selection.text, languages, &credentials)
                .await
        };

        self.apply(mode, &selection, outcome).await
    }

    /// Config-change hook. The host calls it whenever the settings change.
    pub async fn on_credentials_changed(&self, credentials: &Credentials) {
        if self.config.is_valid(credentials) {
            tracing::debug!(app_id = %credentials.app_id, "translation credentials updated");
        } else {
            self.notify(Severity::Warning, messages::INCOMPLETE_CREDENTIALS)
                .await;
        }
    }

    async fn apply(
        &self,
        mode: Mode,
        selection: &SelectionContext,
        outcome: TranslationOutcome,
    ) -> TerminalState {
        match outcome {
            TranslationOutcome::Success { translated_text } => match mode {
                Mode::Show => self.report(Severity::Info, &translated_text).await,
                Mode::Replace => {
                    match self.host.replace(selection.range, &translated_text).await {
                        Ok(()) => {
                            self.notify(Severity::Info, messages::APPLIED).await;
                            TerminalState::Applied
                        }
                        Err(err) => {
                            // Keep the result visible when the edit is refused.
                            tracing::warn!("failed to replace selection: {err:#}");
                            self.report(Severity::Info, &translated_text).await
                        }
                    }
                }
            },
            TranslationOutcome::ConfigInvalid => {
                self.report(Severity::Error, messages::CONFIGURE_CREDENTIALS)
                    .await
            }
            TranslationOutcome::ProviderError { code, message } => {
                tracing::debug!(code = %code, "provider error");
                let text = format!("{}: {message}", messages::TRANSLATION_FAILED);
                self.report(Severity::Error, &text).await
            }
            TranslationOutcome::TransportError { message } => {
                let text = format!("{}: {message}", messages::REQUEST_FAILED);
                self.report(Severity::Error, &text).await
            }
        }
    }

    async fn report(&self, severity: Severity, message: &str) -> TerminalState {
        self.notify(severity, message).await;
        TerminalState::Reported(severity)
    }

    async fn skip(&self, message: &str) -> TerminalState {
        self.notify(Severity::Info, message).await;
        TerminalState::Skipped
    }

    async fn notify(&self, severity: Severity, message: &str) {
        if let Err(err) = self.host.show_message(severity, message).await {
            tracing::warn!(
                severity = severity.as_str(),
                "failed to show notification: {err:#}"
            );
        }
    }
}

/// Keeps the host's progress indicator open for its lifetime, closing it on
/// every exit path including unwinding.
struct ProgressScope<'a> {
    host: &'a dyn EditorHost,
    open: bool,
}

impl<'a> ProgressScope<'a> {
    fn open(host: &'a dyn EditorHost, title: &str) -> Self {
        let open = match host.begin_progress(title) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!("failed to open progress indicator: {err:#}");
                false
            }
        };
        Self { host, open }
    }
}

impl Drop for ProgressScope<'_> {
    fn drop(&mut self) {
        if self.open {
            self.host.end_progress();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::TextRange;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;
    use tracing_test::traced_test;

    struct StaticConfig(Credentials);

    impl ConfigProvider for StaticConfig {
        fn credentials(&self) -> Credentials {
            self.0.clone()
        }
    }

    fn valid_config() -> Arc<StaticConfig> {
        Arc::new(StaticConfig(Credentials::new("app", "secret")))
    }

    struct StubTranslator {
        outcome: TranslationOutcome,
        calls: AtomicUsize,
    }

    impl StubTranslator {
        fn new(outcome: TranslationOutcome) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Translator for StubTranslator {
        async fn translate(
            &self,
            _text: &str,
            _languages: &LanguagePair,
            _credentials: &Credentials,
        ) -> TranslationOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    struct PanickingTranslator;

    #[async_trait]
    impl Translator for PanickingTranslator {
        async fn translate(
            &self,
            _text: &str,
            _languages: &LanguagePair,
            _credentials: &Credentials,
        ) -> TranslationOutcome {
            panic!("translator blew up");
        }
    }

    #[derive(Default)]
    struct RecordingHost {
        selection: SelectionContext,
        fail_messages: bool,
        fail_replace: bool,
        edits: Mutex<Vec<(TextRange, String)>>,
        messages: Mutex<Vec<(Severity, String)>>,
        progress: Mutex<Vec<String>>,
    }

    impl RecordingHost {
        fn with_selection(text: &str) -> Self {
            Self {
                selection: SelectionContext::selected(text, TextRange::new(4, 4 + text.len())),
                ..Default::default()
            }
        }

        fn edits(&self) -> Vec<(TextRange, String)> {
            self.edits.lock().unwrap().clone()
        }

        fn messages(&self) -> Vec<(Severity, String)> {
            self.messages.lock().unwrap().clone()
        }

        fn progress(&self) -> Vec<String> {
            self.progress.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EditorHost for RecordingHost {
        fn selection(&self) -> SelectionContext {
            self.selection.clone()
        }

        async fn replace(&self, range: TextRange, text: &str) -> anyhow::Result<()> {
            if self.fail_replace {
                anyhow::bail!("document is read-only");
            }
            self.edits.lock().unwrap().push((range, text.to_string()));
            Ok(())
        }

        async fn show_message(&self, severity: Severity, message: &str) -> anyhow::Result<()> {
            if self.fail_messages {
                anyhow::bail!("window disposed");
            }
            self.messages
                .lock()
                .unwrap()
                .push((severity, message.to_string()));
            Ok(())
        }

        fn begin_progress(&self, title: &str) -> anyhow::Result<()> {
            self.progress.lock().unwrap().push(format!("begin:{title}"));
            Ok(())
        }

        fn end_progress(&self) {
            self.progress.lock().unwrap().push("end".to_string());
        }
    }

    fn success(text: &str) -> TranslationOutcome {
        TranslationOutcome::Success {
            translated_text: text.to_string(),
        }
    }

    fn orchestrator(
        config: Arc<dyn ConfigProvider>,
        translator: Arc<dyn Translator>,
        host: Arc<RecordingHost>,
    ) -> TranslationOrchestrator {
        TranslationOrchestrator::new(config, translator, host)
    }

    fn en_zh() -> LanguagePair {
        LanguagePair::new("en", "zh")
    }

    #[tokio::test]
    async fn no_editor_skips_without_calling_client() {
        let translator = StubTranslator::new(success("unused"));
        let host = Arc::new(RecordingHost::default());
        let orch = orchestrator(valid_config(), translator.clone(), host.clone());

        let state = orch.run(Command::TranslateAndShow(en_zh())).await;

        assert_eq!(state, TerminalState::Skipped);
        assert_eq!(translator.calls(), 0);
        assert_eq!(
            host.messages(),
            vec![(Severity::Info, messages::NO_EDITOR.to_string())]
        );
        assert!(host.progress().is_empty());
    }

    #[tokio::test]
    async fn blank_selection_skips() {
        let translator = StubTranslator::new(success("unused"));
        let host = Arc::new(RecordingHost::with_selection("   \n"));
        let orch = orchestrator(valid_config(), translator.clone(), host.clone());

        let state = orch.run(Command::TranslateAndReplace(en_zh())).await;

        assert_eq!(state, TerminalState::Skipped);
        assert_eq!(translator.calls(), 0);
        assert_eq!(
            host.messages(),
            vec![(Severity::Info, messages::NO_SELECTION.to_string())]
        );
    }

    #[tokio::test]
    async fn invalid_credentials_report_without_calling_client() {
        let translator = StubTranslator::new(success("unused"));
        let host = Arc::new(RecordingHost::with_selection("hello"));
        let config = Arc::new(StaticConfig(Credentials::new("app", "")));
        let orch = orchestrator(config, translator.clone(), host.clone());

        let state = orch.run(Command::TranslateAndShow(en_zh())).await;

        assert_eq!(state, TerminalState::Reported(Severity::Error));
        assert_eq!(translator.calls(), 0);
        assert_eq!(
            host.messages(),
            vec![(Severity::Error, messages::CONFIGURE_CREDENTIALS.to_string())]
        );
    }

    #[tokio::test]
    async fn replace_mode_edits_captured_range_once() {
        let translator = StubTranslator::new(success("你好"));
        let host = Arc::new(RecordingHost::with_selection("hello"));
        let orch = orchestrator(valid_config(), translator.clone(), host.clone());

        let state = orch.run(Command::TranslateAndReplace(en_zh())).await;

        assert_eq!(state, TerminalState::Applied);
        assert_eq!(translator.calls(), 1);
        assert_eq!(
            host.edits(),
            vec![(TextRange::new(4, 9), "你好".to_string())]
        );
        assert_eq!(
            host.messages(),
            vec![(Severity::Info, messages::APPLIED.to_string())]
        );
        assert_eq!(
            host.progress(),
            vec![format!("begin:{}", messages::PROGRESS_TITLE), "end".to_string()]
        );
    }

    #[tokio::test]
    async fn show_mode_never_edits() {
        let translator = StubTranslator::new(success("你好"));
        let host = Arc::new(RecordingHost::with_selection("hello"));
        let orch = orchestrator(valid_config(), translator, host.clone());

        let state = orch.run(Command::TranslateAndShow(en_zh())).await;

        assert_eq!(state, TerminalState::Reported(Severity::Info));
        assert!(host.edits().is_empty());
        assert_eq!(host.messages(), vec![(Severity::Info, "你好".to_string())]);
    }

    #[tokio::test]
    async fn provider_error_is_reported_with_message() {
        let translator = StubTranslator::new(TranslationOutcome::ProviderError {
            code: "54001".to_string(),
            message: "Invalid Sign".to_string(),
        });
        let host = Arc::new(RecordingHost::with_selection("hello"));
        let orch = orchestrator(valid_config(), translator, host.clone());

        let state = orch.run(Command::TranslateAndReplace(en_zh())).await;

        assert_eq!(state, TerminalState::Reported(Severity::Error));
        assert!(host.edits().is_empty());
        assert_eq!(
            host.messages(),
            vec![(Severity::Error, "Translation failed: Invalid Sign".to_string())]
        );
    }

    #[tokio::test]
    async fn transport_error_resolves_to_reported() {
        let translator = StubTranslator::new(TranslationOutcome::TransportError {
            message: "connection refused".to_string(),
        });
        let host = Arc::new(RecordingHost::with_selection("hello"));
        let orch = orchestrator(valid_config(), translator, host.clone());

        let state = orch.run(Command::TranslateAndShow(en_zh())).await;

        assert_eq!(state, TerminalState::Reported(Severity::Error));
        let messages = host.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, Severity::Error);
        assert!(messages[0].1.contains("connection refused"));
        assert_eq!(host.progress().last().map(String::as_str), Some("end"));
    }

    #[traced_test]
    #[tokio::test]
    async fn notification_failure_is_logged_not_propagated() {
        let translator = StubTranslator::new(TranslationOutcome::TransportError {
            message: "timeout".to_string(),
        });
        let host = Arc::new(RecordingHost {
            fail_messages: true,
            ..RecordingHost::with_selection("hello")
        });
        let orch = orchestrator(valid_config(), translator, host.clone());

        let state = orch.run(Command::TranslateAndShow(en_zh())).await;

        assert_eq!(state, TerminalState::Reported(Severity::Error));
        assert!(logs_contain("failed to show notification"));
        assert!(logs_contain("window disposed"));
    }

    #[traced_test]
    #[tokio::test]
    async fn refused_edit_falls_back_to_showing_translation() {
        let translator = StubTranslator::new(success("你好"));
        let host = Arc::new(RecordingHost {
            fail_replace: true,
            ..RecordingHost::with_selection("hello")
        });
        let orch = orchestrator(valid_config(), translator, host.clone());

        let state = orch.run(Command::TranslateAndReplace(en_zh())).await;

        assert_eq!(state, TerminalState::Reported(Severity::Info));
        assert_eq!(host.messages(), vec![(Severity::Info, "你好".to_string())]);
        assert!(logs_contain("document is read-only"));
    }

    #[tokio::test]
    async fn progress_closes_when_translator_panics() {
        let host = Arc::new(RecordingHost::with_selection("hello"));
        let orch = Arc::new(orchestrator(
            valid_config(),
            Arc::new(PanickingTranslator),
            host.clone(),
        ));

        let joined = tokio::spawn(async move { orch.run(Command::TranslateAndShow(en_zh())).await })
            .await;

        assert!(joined.is_err());
        assert_eq!(
            host.progress(),
            vec![format!("begin:{}", messages::PROGRESS_TITLE), "end".to_string()]
        );
    }

    #[tokio::test]
    async fn welcome_shows_greeting() {
        let host = Arc::new(RecordingHost::default());
        let translator = StubTranslator::new(success("unused"));
        let orch = orchestrator(valid_config(), translator.clone(), host.clone());

        let state = orch.run(Command::Welcome).await;

        assert_eq!(state, TerminalState::Reported(Severity::Info));
        assert_eq!(translator.calls(), 0);
        assert_eq!(
            host.messages(),
            vec![(Severity::Info, messages::WELCOME.to_string())]
        );
    }

    #[tokio::test]
    async fn credential_change_warns_only_when_incomplete() {
        let host = Arc::new(RecordingHost::default());
        let orch = orchestrator(valid_config(), StubTranslator::new(success("")), host.clone());

        orch.on_credentials_changed(&Credentials::new("app", "secret"))
            .await;
        assert!(host.messages().is_empty());

        orch.on_credentials_changed(&Credentials::new("", "secret"))
            .await;
        assert_eq!(
            host.messages(),
            vec![(Severity::Warning, messages::INCOMPLETE_CREDENTIALS.to_string())]
        );
    }
}
