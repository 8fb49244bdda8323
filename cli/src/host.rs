//! Terminal implementation of [`EditorHost`].
//!
//! The "editor" is either a file (optionally narrowed to a byte range), text
//! passed on the command line, or stdin. Messages go to stdout (info) and
//! stderr (warnings and errors); the progress indicator is a transient line
//! on stderr when it is a terminal.

use std::io::IsTerminal;
use std::io::Read;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use anyhow::Context;
use async_trait::async_trait;
use fanyi_core::EditorHost;
use fanyi_core::SelectionContext;
use fanyi_core::Severity;
use fanyi_core::TextRange;
use owo_colors::OwoColorize;

/// Where the selection comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Nothing to read: behaves like an editor with no open document.
    None,
    Text(String),
    Stdin,
    File {
        path: PathBuf,
        range: Option<TextRange>,
    },
}

#[derive(Debug)]
struct Document {
    path: PathBuf,
    contents: String,
}

#[derive(Debug)]
pub struct TerminalHost {
    selection: SelectionContext,
    document: Option<Document>,
    color_stderr: bool,
    interactive_stderr: bool,
    progress_visible: AtomicBool,
}

impl TerminalHost {
    /// Snapshot `source` once; the selection is never re-read afterwards.
    pub fn open(source: Source) -> anyhow::Result<Self> {
        let (selection, document) = match source {
            Source::None => (SelectionContext::no_editor(), None),
            Source::Text(text) => {
                let range = TextRange::new(0, text.len());
                (SelectionContext::selected(text, range), None)
            }
            Source::Stdin => {
                let mut text = String::new();
                std::io::stdin()
                    .read_to_string(&mut text)
                    .context("failed to read selection from stdin")?;
                let text = text.trim_end_matches(['\r', '\n']).to_string();
                let range = TextRange::new(0, text.len());
                (SelectionContext::selected(text, range), None)
            }
            Source::File { path, range } => {
                let contents = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                let range = range.unwrap_or_else(|| {
                    let end = contents.trim_end_matches(['\r', '\n']).len();
                    TextRange::new(0, end)
                });
                let text = slice(&contents, range)?.to_string();
                (
                    SelectionContext::selected(text, range),
                    Some(Document { path, contents }),
                )
            }
        };

        let stderr = std::io::stderr();
        Ok(Self {
            selection,
            document,
            color_stderr: supports_color::on(supports_color::Stream::Stderr).is_some(),
            interactive_stderr: stderr.is_terminal(),
            progress_visible: AtomicBool::new(false),
        })
    }

    fn clear_progress_line(&self) {
        if self.progress_visible.swap(false, Ordering::SeqCst) {
            let mut err = std::io::stderr().lock();
            let _ = write!(err, "\r\x1b[2K");
            let _ = err.flush();
        }
    }

    fn label(&self, severity: Severity) -> String {
        let label = format!("{}:", severity.as_str());
        if !self.color_stderr {
            return label;
        }
        match severity {
            Severity::Info => label,
            Severity::Warning => label.yellow().bold().to_string(),
            Severity::Error => label.red().bold().to_string(),
        }
    }
}

/// Borrow `range` of `contents`, rejecting ranges that are reversed, out of
/// bounds or not on character boundaries.
pub fn slice(contents: &str, range: TextRange) -> anyhow::Result<&str> {
    if range.start > range.end {
        anyhow::bail!("range {}..{} is reversed", range.start, range.end);
    }
    contents.get(range.start..range.end).with_context(|| {
        format!(
            "range {}..{} is outside the document or splits a character (document is {} bytes)",
            range.start,
            range.end,
            contents.len()
        )
    })
}

#[async_trait]
impl EditorHost for TerminalHost {
    fn selection(&self) -> SelectionContext {
        self.selection.clone()
    }

    async fn replace(&self, range: TextRange, text: &str) -> anyhow::Result<()> {
        let Some(document) = &self.document else {
            anyhow::bail!("no document is open for editing");
        };

        slice(&document.contents, range)?;
        let before = document.contents.get(..range.start).unwrap_or_default();
        let after = document.contents.get(range.end..).unwrap_or_default();
        let updated = format!("{before}{text}{after}");

        tokio::fs::write(&document.path, updated)
            .await
            .with_context(|| format!("failed to write {}", document.path.display()))?;
        tracing::debug!(path = %document.path.display(), "selection replaced");
        Ok(())
    }

    async fn show_message(&self, severity: Severity, message: &str) -> anyhow::Result<()> {
        self.clear_progress_line();
        match severity {
            Severity::Info => {
                let mut out = std::io::stdout().lock();
                writeln!(out, "{message}")?;
                out.flush()?;
            }
            Severity::Warning | Severity::Error => {
                let label = self.label(severity);
                let mut err = std::io::stderr().lock();
                writeln!(err, "{label} {message}")?;
                err.flush()?;
            }
        }
        Ok(())
    }

    fn begin_progress(&self, title: &str) -> anyhow::Result<()> {
        if !self.interactive_stderr {
            return Ok(());
        }
        let mut err = std::io::stderr().lock();
        write!(err, "{title}")?;
        err.flush()?;
        self.progress_visible.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn end_progress(&self) {
        self.clear_progress_line();
    }
}
