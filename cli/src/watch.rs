//! Config-change plumbing: runs the orchestrator's credential hook whenever
//! the config file changes.

use std::path::Path;

use anyhow::Context;
use fanyi_core::ConfigProvider;
use fanyi_core::FileConfigProvider;
use fanyi_core::TranslationOrchestrator;
use notify::Event;
use notify::RecursiveMode;
use notify::Watcher;
use tokio::sync::mpsc;

/// Watch the provider's file until Ctrl-C.
pub async fn watch_config(
    orchestrator: &TranslationOrchestrator,
    provider: &FileConfigProvider,
) -> anyhow::Result<()> {
    let path = provider.path();
    // Editors often replace the file instead of writing in place, so watch
    // the directory and filter by name.
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        let _ = tx.send(res);
    })
    .context("failed to start config watcher")?;
    watcher
        .watch(dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("failed to watch {}", dir.display()))?;

    tracing::info!(path = %path.display(), "watching translation config");
    orchestrator
        .on_credentials_changed(&provider.credentials())
        .await;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            event = rx.recv() => match event {
                Some(Ok(event)) if touches(&event, path) => {
                    tracing::debug!(kind = ?event.kind, "config file changed");
                    orchestrator
                        .on_credentials_changed(&provider.credentials())
                        .await;
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => tracing::warn!("config watcher error: {err}"),
                None => break,
            },
        }
    }

    Ok(())
}

fn touches(event: &Event, path: &Path) -> bool {
    let relevant = event.kind.is_create() || event.kind.is_modify() || event.kind.is_remove();
    relevant
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == path.file_name())
}
