//! Interface to the host editor.
//!
//! The pipeline never touches editor state directly. It reads one
//! [`SelectionContext`] per invocation and reaches every user-visible surface
//! through [`EditorHost`].

use async_trait::async_trait;

/// Severity of a user-visible message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Byte range of a selection inside the active document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Snapshot of the editor taken once per invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionContext {
    pub text: String,
    pub range: TextRange,
    pub has_active_editor: bool,
    pub has_selection: bool,
}

impl SelectionContext {
    /// No editor is open.
    pub fn no_editor() -> Self {
        Self::default()
    }

    /// An editor is open with `text` selected at `range`.
    pub fn selected(text: impl Into<String>, range: TextRange) -> Self {
        let text = text.into();
        let has_selection = !text.is_empty();
        Self {
            text,
            range,
            has_active_editor: true,
            has_selection,
        }
    }
}

/// Capabilities the host editor provides to the pipeline.
///
/// Every method that reaches the user may fail (for example when the UI is
/// torn down mid-operation); the orchestrator logs and discards those
/// failures.
#[async_trait]
pub trait EditorHost: Send + Sync {
    /// Current selection of the active editor.
    fn selection(&self) -> SelectionContext;

    /// Replace `range` of the active document with `text`.
    async fn replace(&self, range: TextRange, text: &str) -> anyhow::Result<()>;

    async fn show_message(&self, severity: Severity, message: &str) -> anyhow::Result<()>;

    /// Open a non-cancellable progress indicator titled `title`.
    fn begin_progress(&self, title: &str) -> anyhow::Result<()>;

    /// Close the indicator opened by [`EditorHost::begin_progress`].
    fn end_progress(&self);
}
