//! `fanyi` command line host.
//!
//! Plays the part of the editor: it supplies the selection, performs the
//! replace edit and renders messages, while `fanyi-core` drives the
//! translation itself.

mod host;
mod watch;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use clap::Parser;
use fanyi_core::Command;
use fanyi_core::ConfigProvider;
use fanyi_core::EditorHost;
use fanyi_core::FileConfigProvider;
use fanyi_core::LanguagePair;
use fanyi_core::Severity;
use fanyi_core::TerminalState;
use fanyi_core::TextRange;
use fanyi_core::TranslationClient;
use fanyi_core::TranslationConfig;
use fanyi_core::TranslationOrchestrator;

pub use host::Source;
pub use host::TerminalHost;

/// Translate selected text with the Baidu translation API.
#[derive(Debug, Parser)]
#[command(name = "fanyi", version)]
pub struct Cli {
    /// Config file (defaults to ~/.fanyi/config.toml).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Ignore FANYI_APP_ID / FANYI_SECRET_KEY.
    #[arg(long, global = true)]
    pub no_env: bool,

    #[command(subcommand)]
    pub command: Subcommand,
}

#[derive(Debug, clap::Subcommand)]
pub enum Subcommand {
    /// Show the welcome message.
    Welcome,

    /// Translate the selection and print the result.
    Show(ShowArgs),

    /// Translate the selection and write the result back into the file.
    Replace(ReplaceArgs),

    /// Inspect the configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, clap::Subcommand)]
pub enum ConfigCommand {
    /// Validate the current credentials once.
    Check,

    /// Re-validate the credentials every time the config file changes.
    Watch,
}

#[derive(Debug, Args)]
pub struct LanguageArgs {
    /// Source language code (`auto` to detect).
    #[arg(long)]
    pub from: Option<String>,

    /// Target language code.
    #[arg(long)]
    pub to: Option<String>,
}

impl LanguageArgs {
    fn resolve(self, config: &TranslationConfig) -> LanguagePair {
        let defaults = config.language_pair();
        LanguagePair::new(
            self.from.unwrap_or(defaults.from),
            self.to.unwrap_or(defaults.to),
        )
    }
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub languages: LanguageArgs,

    /// Text to translate.
    #[arg(long, conflicts_with = "file")]
    pub text: Option<String>,

    /// File holding the selection.
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Byte range of the selection inside `--file`, as `START..END`.
    #[arg(long, requires = "file", value_parser = parse_range)]
    pub range: Option<TextRange>,
}

impl ShowArgs {
    fn source(&self) -> Source {
        if let Some(text) = &self.text {
            Source::Text(text.clone())
        } else if let Some(path) = &self.file {
            Source::File {
                path: path.clone(),
                range: self.range,
            }
        } else if std::io::stdin().is_terminal() {
            Source::None
        } else {
            Source::Stdin
        }
    }
}

#[derive(Debug, Args)]
pub struct ReplaceArgs {
    #[command(flatten)]
    pub languages: LanguageArgs,

    /// File holding the selection.
    #[arg(long)]
    pub file: PathBuf,

    /// Byte range of the selection, as `START..END` (defaults to the whole file).
    #[arg(long, value_parser = parse_range)]
    pub range: Option<TextRange>,
}

fn parse_range(raw: &str) -> Result<TextRange, String> {
    let (start, end) = raw
        .split_once("..")
        .ok_or_else(|| format!("expected START..END, got `{raw}`"))?;
    let start = start
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("invalid range start `{start}`: {e}"))?;
    let end = end
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("invalid range end `{end}`: {e}"))?;
    if start > end {
        return Err(format!("range start {start} is after end {end}"));
    }
    Ok(TextRange::new(start, end))
}

/// Run one CLI invocation.
pub async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config_path = match cli.config {
        Some(path) => path,
        None => TranslationConfig::default_path()
            .context("cannot determine the home directory, pass --config")?,
    };
    let mut provider = FileConfigProvider::new(config_path);
    if cli.no_env {
        provider = provider.without_env();
    }

    // Transport settings and default languages; credentials are re-read by
    // the provider on every attempt.
    let config = provider.load();
    let client = TranslationClient::from_config(&config).context("failed to build HTTP client")?;

    let mut whole_file_replace = false;
    let (command, source) = match cli.command {
        Subcommand::Welcome => (Command::Welcome, Source::None),
        Subcommand::Show(args) => {
            let source = args.source();
            (
                Command::TranslateAndShow(args.languages.resolve(&config)),
                source,
            )
        }
        Subcommand::Replace(args) => {
            whole_file_replace = args.range.is_none();
            (
                Command::TranslateAndReplace(args.languages.resolve(&config)),
                Source::File {
                    path: args.file,
                    range: args.range,
                },
            )
        }
        Subcommand::Config(command) => {
            let host = Arc::new(TerminalHost::open(Source::None)?);
            let orchestrator = build_orchestrator(&provider, client, host.clone());
            return match command {
                ConfigCommand::Check => {
                    let status = check_config(&orchestrator, &provider, host.as_ref()).await;
                    Ok(ExitCode::from(status))
                }
                ConfigCommand::Watch => {
                    watch::watch_config(&orchestrator, &provider).await?;
                    Ok(ExitCode::SUCCESS)
                }
            };
        }
    };

    let host = Arc::new(TerminalHost::open(source)?);
    // The provider answers line by line and only the first line comes back,
    // so a multi-line file would lose every line after the first.
    if whole_file_replace && host.selection().text.contains('\n') {
        anyhow::bail!("the file has several lines; pass --range to replace part of it");
    }
    let orchestrator = build_orchestrator(&provider, client, host);
    let state = orchestrator.run(command).await;
    tracing::debug!(?state, "invocation finished");

    Ok(ExitCode::from(exit_status(state)))
}

fn build_orchestrator(
    provider: &FileConfigProvider,
    client: TranslationClient,
    host: Arc<TerminalHost>,
) -> TranslationOrchestrator {
    TranslationOrchestrator::new(Arc::new(provider.clone()), Arc::new(client), host)
}

async fn check_config(
    orchestrator: &TranslationOrchestrator,
    provider: &FileConfigProvider,
    host: &dyn EditorHost,
) -> u8 {
    let credentials = provider.credentials();
    orchestrator.on_credentials_changed(&credentials).await;
    if !provider.is_valid(&credentials) {
        return 1;
    }
    let message = format!(
        "Translation credentials are configured ({}).",
        provider.path().display()
    );
    if let Err(err) = host.show_message(Severity::Info, &message).await {
        tracing::warn!("failed to show config status: {err:#}");
    }
    0
}

fn exit_status(state: TerminalState) -> u8 {
    match state {
        TerminalState::Reported(Severity::Error) => 1,
        TerminalState::Applied | TerminalState::Reported(_) | TerminalState::Skipped => 0,
    }
}
