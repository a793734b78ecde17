//! Hot reload of aim settings
//!
//! Only the `aim` section applies to a running controller. The watcher keeps
//! the last loaded file contents and forwards new [`AimSettings`] only when
//! that section actually changed; edits to `gamepad` or `output` are logged as
//! needing a restart.
//!
//! The parent directory is watched rather than the file itself, since editors
//! that save by writing a temp file and renaming it replace the watched inode.

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::{AimSettings, AppConfig};

/// Let editors finish writing before reading the file
const RELOAD_DELAY: Duration = Duration::from_millis(100);

/// Watches the config file and yields changed aim settings
pub struct SettingsWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<AimSettings>,
}

impl SettingsWatcher {
    /// Load `config_path` and start watching it
    ///
    /// Returns the initial configuration alongside the watcher.
    pub async fn new(config_path: String) -> Result<(Self, AppConfig)> {
        let initial = AppConfig::load(&config_path)
            .await
            .context("Failed to load initial config")?;

        let path = PathBuf::from(&config_path);
        let file_name = path
            .file_name()
            .map(|name| name.to_os_string())
            .with_context(|| format!("Config path has no file name: {}", config_path))?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (tx, rx) = mpsc::channel(10);
        let current = Arc::new(Mutex::new(initial.clone()));

        // notify callbacks run on their own OS thread
        let runtime_handle = tokio::runtime::Handle::current();

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    error!("Watch error: {}", e);
                    return;
                }
            };
            if !touches_file(&event, &file_name) {
                return;
            }
            debug!("Config file changed: {:?}", event.kind);

            let config_path = config_path.clone();
            let current = Arc::clone(&current);
            let tx = tx.clone();

            runtime_handle.spawn(async move {
                tokio::time::sleep(RELOAD_DELAY).await;

                let new_config = match AppConfig::load(&config_path).await {
                    Ok(config) => config,
                    Err(e) => {
                        warn!("Ignoring config change (keeping current settings): {:#}", e);
                        return;
                    }
                };

                let changed = apply_reload(&mut current.lock(), new_config);
                if let Some(settings) = changed {
                    if tx.send(settings).await.is_err() {
                        debug!("Settings receiver closed");
                    }
                }
            });
        })?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch config directory: {}", dir.display()))?;

        info!("Watching {} for aim setting changes", path.display());

        Ok((Self { _watcher: watcher, rx }, initial))
    }

    /// Wait for the next aim settings change
    ///
    /// Returns `None` once the watcher has shut down.
    pub async fn next_settings(&mut self) -> Option<AimSettings> {
        self.rx.recv().await
    }
}

/// Whether `event` writes or replaces a file called `file_name`
fn touches_file(event: &Event, file_name: &OsString) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}

/// Store `new` as the current file contents
///
/// Returns the new aim settings if they differ from the previous ones.
fn apply_reload(current: &mut AppConfig, new: AppConfig) -> Option<AimSettings> {
    if new.gamepad != current.gamepad {
        warn!("Gamepad settings changed; restart to apply them");
    }
    if new.output != current.output {
        warn!("Output settings changed; restart to apply them");
    }

    let changed = new.aim != current.aim;
    *current = new;
    if changed {
        info!("Aim settings reloaded");
        Some(current.aim)
    } else {
        debug!("Config rewritten without aim changes");
        None
    }
}
