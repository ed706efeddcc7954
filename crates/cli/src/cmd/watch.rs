//! Watch command
//!
//! Adds every path, then prints events until a timeout or a fatal error.

use crate::settings::{self, Settings};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::io::Write;
use std::path::{Path, PathBuf};
use watcher::{Backend, Event, Watcher};

/// Command-line values that take precedence over the config file
#[derive(Debug, Default)]
pub struct Overrides {
    pub events: Option<String>,
    pub timeout_ms: Option<i64>,
    pub coalesce_ms: Option<u64>,
}

impl Overrides {
    fn apply(self, settings: &mut Settings) {
        if let Some(events) = self.events {
            settings.watch.events = events
                .split([',', '|'])
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect();
        }
        if let Some(timeout_ms) = self.timeout_ms {
            settings.watch.timeout_ms = timeout_ms;
        }
        if let Some(coalesce_ms) = self.coalesce_ms {
            settings.watch.coalesce_ms = coalesce_ms;
        }
    }
}

pub fn run(paths: &[PathBuf], overrides: Overrides, config: Option<&Path>) -> Result<()> {
    let mut settings = settings::load(config)?;
    overrides.apply(&mut settings);
    settings.validate().context("Invalid configuration")?;

    let mut watcher =
        Watcher::new(settings.watcher_config()?).context("Failed to start watcher")?;

    for path in paths {
        match watcher.add_watch(path, true) {
            Ok(_) => {}
            // Logged by the watcher; keep going with the other paths
            Err(err) if !err.is_fatal() => {}
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to watch {}", path.display()))
            }
        }
    }
    if watcher.watches().is_empty() {
        anyhow::bail!("Nothing to watch");
    }
    tracing::info!("watching {} directories", watcher.watches().len());

    let timeout = settings.watch.timeout();
    let coalesce = settings.watch.coalesce();
    let stdout = std::io::stdout();

    while let Some(event) = watcher.read(timeout, coalesce).context("Failed to read events")? {
        let line = format_event(&watch_label(&watcher, &event), &event);
        let mut out = stdout.lock();
        writeln!(out, "{}", line)?;
        out.flush()?;
    }

    tracing::info!("no events within {:?}, exiting", timeout);
    Ok(())
}

/// Directory of `event`, or its raw descriptor once the watch is gone
///
/// IGNORED is delivered after its table entry has been dropped.
fn watch_label<B: Backend>(watcher: &Watcher<B>, event: &Event) -> String {
    match watcher.path(event.wd) {
        Ok(dir) => dir.display().to_string(),
        Err(_) => event.wd.to_string(),
    }
}

/// `<dir>: <name>\t(<mask names>)`
fn format_event(dir: &str, event: &Event) -> String {
    format!(
        "{}: {}\t{}",
        dir.cyan(),
        event.name().to_string_lossy(),
        format!("({})", event.mask).dimmed()
    )
}
