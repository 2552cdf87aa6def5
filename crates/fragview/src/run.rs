use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::{never, select, Receiver};
use preview::{CompileEvent, PreviewConfig, PreviewRuntime};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::watch::ShaderWatcher;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// One preview window plus the watcher feeding it.
struct Session {
    label: String,
    runtime: PreviewRuntime,
    watcher: ShaderWatcher,
}

impl Session {
    fn open(shader: &Path, size: (u32, u32), debounce: Duration, settle: Duration) -> Result<Self> {
        let initial_source = std::fs::read_to_string(shader)
            .with_context(|| format!("failed to read shader at {}", shader.display()))?;
        let label = shader.display().to_string();

        let config = PreviewConfig {
            surface_size: size,
            initial_source,
            debounce,
            window_title: format!("fragview - {label}"),
        };
        let runtime = PreviewRuntime::spawn(config)
            .with_context(|| format!("failed to start preview for {label}"))?;
        let watcher = ShaderWatcher::spawn(shader.to_path_buf(), settle)?;

        Ok(Self {
            label,
            runtime,
            watcher,
        })
    }

    fn report_compile(&self, event: &CompileEvent) {
        match event {
            CompileEvent::Succeeded => info!(shader = %self.label, "shader reloaded"),
            CompileEvent::Failed { diagnostic } => {
                warn!(shader = %self.label, "shader rejected, keeping previous program:\n{diagnostic}");
            }
        }
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let debounce = Duration::from_millis(cli.debounce_ms);
    let settle = Duration::from_millis(cli.watch_ms);

    let main = Session::open(&cli.shader, cli.size, debounce, settle)?;
    let peep = match cli.peep.as_deref() {
        Some(path) => {
            let size = ((cli.size.0 / 4).max(1), (cli.size.1 / 4).max(1));
            Some(Session::open(path, size, debounce, settle)?)
        }
        None => None,
    };

    info!(shader = %main.label, "preview running, edit the file to reload");

    let silent: Receiver<String> = never();
    let silent_events: Receiver<CompileEvent> = never();
    let peep_changes = peep.as_ref().map_or(&silent, |s| s.watcher.changes());
    let peep_events = peep
        .as_ref()
        .map_or(&silent_events, |s| s.runtime.compile_events());

    loop {
        select! {
            recv(main.watcher.changes()) -> revision => {
                let Ok(source) = revision else { break };
                if main.runtime.update_source(source).is_err() {
                    break;
                }
            }
            recv(main.runtime.compile_events()) -> event => {
                match event {
                    Ok(outcome) => main.report_compile(&outcome),
                    // Sender gone means the window closed.
                    Err(_) => break,
                }
            }
            recv(peep_changes) -> revision => {
                let (Ok(source), Some(session)) = (revision, peep.as_ref()) else { break };
                if session.runtime.update_source(source).is_err() {
                    break;
                }
            }
            recv(peep_events) -> event => {
                let (Ok(outcome), Some(session)) = (event, peep.as_ref()) else { break };
                session.report_compile(&outcome);
            }
        }
    }

    if let Some(session) = peep {
        drop(session.watcher);
        let _ = session.runtime.shutdown();
    }
    drop(main.watcher);
    main.runtime.shutdown()
}
