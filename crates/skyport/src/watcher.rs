use anyhow::Result;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::dev::DevService;

/// Quiet period after the last change before the table is rebuilt
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Watches the functions directories and refreshes a [`DevService`] on change
///
/// Dropping the watcher closes the event channel, which ends the refresh task.
pub struct FunctionsWatcher {
    _watcher: notify::RecommendedWatcher,
    task: JoinHandle<()>,
}

impl FunctionsWatcher {
    /// Starts watching; must be called from within a tokio runtime
    pub fn start(service: DevService, debounce: Duration) -> Result<Self> {
        let (tx, mut rx) = mpsc::channel::<PathBuf>(100);
        let extensions = service.config().functions.extensions.clone();

        let config = service.config();
        let mut roots = Vec::new();
        for path in [
            config.routes_root(service.root()),
            config.subscribers_root(service.root()),
        ] {
            if path.exists() {
                // Events report paths under the watched path as given
                roots.push(path.canonicalize().unwrap_or(path));
            } else {
                warn!("Not watching {}: directory does not exist", path.display());
            }
        }

        let event_roots = roots.clone();
        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    if !matches!(
                        event.kind,
                        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                    ) {
                        return;
                    }
                    for path in event.paths {
                        if is_relevant(&path, &event_roots, &extensions) {
                            // A full channel already has a refresh pending
                            let _ = tx.try_send(path);
                        }
                    }
                }
                Err(e) => error!("Watch error: {:?}", e),
            }
        })?;

        for root in &roots {
            watcher.watch(root, RecursiveMode::Recursive)?;
            info!("Watching {}", root.display());
        }

        let task = tokio::spawn(async move {
            while let Some(path) = rx.recv().await {
                info!("File changed: {}", path.display());

                // Batch rapid changes
                loop {
                    match tokio::time::timeout(debounce, rx.recv()).await {
                        Ok(Some(_)) => continue,
                        Ok(None) => return,
                        Err(_) => break,
                    }
                }

                if let Err(e) = service.refresh().await {
                    error!("Failed to refresh routes: {:#}", e);
                }
            }
        });

        Ok(Self {
            _watcher: watcher,
            task,
        })
    }

    /// Stops the refresh task immediately
    pub fn stop(self) {
        self.task.abort();
    }
}

/// Handler-module change that should trigger a rescan
///
/// Hidden files and directories below a watched root (editor swap files,
/// caches) are ignored. A path without an extension under a watched root is
/// taken to be a directory: renaming or removing one moves whole routes.
pub fn is_relevant(path: &Path, roots: &[PathBuf], extensions: &[String]) -> bool {
    let under_root = roots.iter().find_map(|root| path.strip_prefix(root).ok());
    let relative = under_root.unwrap_or(path);

    let hidden = relative.components().any(|c| match c {
        Component::Normal(part) => part.to_string_lossy().starts_with('.'),
        _ => false,
    });
    if hidden {
        return false;
    }

    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => extensions.iter().any(|wanted| wanted.trim_start_matches('.') == ext),
        None => under_root.is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::dev::Dispatch;
    use skyport_router::Method;
    use std::fs;

    #[test]
    fn test_relevant_paths() {
        let ts = vec!["ts".to_string()];
        let roots = vec![PathBuf::from("/tmp/.tmpA1/functions/api")];

        assert!(is_relevant(Path::new("/tmp/.tmpA1/functions/api/users/[id].ts"), &roots, &ts));
        assert!(!is_relevant(Path::new("/tmp/.tmpA1/functions/api/notes.md"), &roots, &ts));
        assert!(!is_relevant(Path::new("/tmp/.tmpA1/functions/api/.index.ts.swp"), &roots, &ts));
        assert!(!is_relevant(Path::new("/tmp/.tmpA1/functions/api/.cache/a.ts"), &roots, &ts));
    }

    #[test]
    fn test_directories_under_a_root_are_relevant() {
        let ts = vec!["ts".to_string()];
        let roots = vec![PathBuf::from("/srv/app/functions/api")];

        assert!(is_relevant(Path::new("/srv/app/functions/api/users"), &roots, &ts));
        assert!(is_relevant(Path::new("/srv/app/functions/api/orgs/[org]"), &roots, &ts));
        assert!(!is_relevant(Path::new("/srv/app/functions/api/.git"), &roots, &ts));
        assert!(!is_relevant(Path::new("/srv/app/scripts"), &roots, &ts));
    }

    #[tokio::test]
    async fn test_change_triggers_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let routes = dir.path().join("functions/api");
        fs::create_dir_all(&routes).unwrap();

        let service = DevService::new(dir.path(), Config::default());
        service.refresh().await.unwrap();
        let watcher = FunctionsWatcher::start(service.clone(), Duration::from_millis(50)).unwrap();

        fs::write(routes.join("ping.ts"), "export function GET() {}").unwrap();

        let mut matched = false;
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            if matches!(service.dispatch(Method::Get, "/ping").await, Dispatch::Matched { .. }) {
                matched = true;
                break;
            }
        }
        watcher.stop();
        assert!(matched, "route was not picked up after the file was written");
    }

    #[tokio::test]
    async fn test_directory_rename_triggers_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let routes = dir.path().join("functions/api");
        fs::create_dir_all(routes.join("users")).unwrap();
        fs::write(routes.join("users/index.ts"), "export function GET() {}").unwrap();

        let service = DevService::new(dir.path(), Config::default());
        service.refresh().await.unwrap();
        let watcher = FunctionsWatcher::start(service.clone(), Duration::from_millis(50)).unwrap();

        fs::rename(routes.join("users"), routes.join("people")).unwrap();

        let mut moved = false;
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let old = service.dispatch(Method::Get, "/users").await;
            let new = service.dispatch(Method::Get, "/people").await;
            if matches!(old, Dispatch::NotFound { .. }) && matches!(new, Dispatch::Matched { .. }) {
                moved = true;
                break;
            }
        }
        watcher.stop();
        assert!(moved, "routes were not rebuilt after the directory was renamed");
    }
}
