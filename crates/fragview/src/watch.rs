use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{unbounded, Receiver};
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind, Debouncer};
use tracing::{debug, warn};

/// Filesystem watcher for a single shader file.
///
/// Change notifications come from `notify` with a small coalescing window,
/// so a save that produces several filesystem events yields one re-read. The
/// parent directory is watched rather than the file itself, which keeps
/// editors that save via rename-and-replace from detaching the watch. Only
/// revisions whose contents actually differ are forwarded.
pub struct ShaderWatcher {
    _debouncer: Debouncer<notify::RecommendedWatcher>,
    changes: Receiver<String>,
}

impl ShaderWatcher {
    pub fn spawn(path: PathBuf, settle: Duration) -> Result<Self> {
        let initial = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read shader at {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_owned())
            .ok_or_else(|| anyhow!("shader path {} has no file name", path.display()))?;
        let watch_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (tx, rx) = unbounded();
        let shader_path = path.clone();
        let mut last_seen = initial;
        let mut debouncer = new_debouncer(
            settle,
            move |res: Result<Vec<notify_debouncer_mini::DebouncedEvent>, notify::Error>| {
                let events = match res {
                    Ok(events) => events,
                    Err(err) => {
                        warn!(path = %shader_path.display(), "shader watch error: {err}");
                        return;
                    }
                };
                let touched = events.iter().any(|event| {
                    event.kind == DebouncedEventKind::Any
                        && event.path.file_name() == Some(file_name.as_os_str())
                });
                if !touched {
                    return;
                }
                match std::fs::read_to_string(&shader_path) {
                    Ok(contents) => {
                        if contents != last_seen {
                            debug!(
                                path = %shader_path.display(),
                                bytes = contents.len(),
                                "shader file changed"
                            );
                            last_seen = contents.clone();
                            let _ = tx.send(contents);
                        }
                    }
                    // Editors briefly unlink the file during atomic saves;
                    // keep the previous revision, the rename fires next.
                    Err(err) => {
                        warn!(path = %shader_path.display(), "failed to re-read shader: {err}");
                    }
                }
            },
        )?;
        debouncer
            .watcher()
            .watch(&watch_dir, notify::RecursiveMode::NonRecursive)
            .with_context(|| format!("failed to watch {}", watch_dir.display()))?;
        debug!(dir = %watch_dir.display(), shader = %path.display(), "watching for shader changes");

        Ok(Self {
            _debouncer: debouncer,
            changes: rx,
        })
    }

    /// Stream of full-file revisions, newest last.
    pub fn changes(&self) -> &Receiver<String> {
        &self.changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTLE: Duration = Duration::from_millis(50);
    const PATIENCE: Duration = Duration::from_secs(5);

    #[test]
    fn reports_changed_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.frag");
        std::fs::write(&path, "void main() {}").unwrap();

        let watcher = ShaderWatcher::spawn(path.clone(), SETTLE).unwrap();
        std::fs::write(&path, "void main() { gl_FragColor = vec4(1.0); }").unwrap();

        let revision = watcher.changes().recv_timeout(PATIENCE).unwrap();
        assert!(revision.contains("gl_FragColor"));
    }

    #[test]
    fn picks_up_rename_style_saves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.frag");
        std::fs::write(&path, "void main() {}").unwrap();

        let watcher = ShaderWatcher::spawn(path.clone(), SETTLE).unwrap();

        // The atomic-save dance: write a sibling, rename over the target.
        let staging = dir.path().join(".demo.frag.tmp");
        std::fs::write(&staging, "void main() { gl_FragColor = vec4(0.5); }").unwrap();
        std::fs::rename(&staging, &path).unwrap();

        let revision = watcher.changes().recv_timeout(PATIENCE).unwrap();
        assert!(revision.contains("vec4(0.5)"));
    }

    #[test]
    fn ignores_rewrites_with_identical_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.frag");
        std::fs::write(&path, "void main() {}").unwrap();

        let watcher = ShaderWatcher::spawn(path.clone(), SETTLE).unwrap();
        // Touch the file without changing it.
        std::fs::write(&path, "void main() {}").unwrap();

        assert!(watcher
            .changes()
            .recv_timeout(Duration::from_millis(400))
            .is_err());
    }

    #[test]
    fn missing_file_fails_to_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.frag");
        assert!(ShaderWatcher::spawn(missing, SETTLE).is_err());
    }
}
