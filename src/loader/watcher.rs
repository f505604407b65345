//! File watching for a single resolved configuration path.
//!
//! A watch session owns exactly one OS watch handle and runs one event loop
//! task. The loop wakes on a filesystem event, a watcher error, or
//! cancellation:
//! - Write/create events send `true` on the notification channel
//! - Other event kinds are ignored
//! - Watcher errors are logged and the loop keeps going
//! - Cancellation, a closed event source, or a dropped notification receiver
//!   end the loop
//!
//! The handle is released on every exit path through [`WatchGuard`].
//! No debouncing is done: each qualifying event produces one notification.

use crate::error::{ConfigError, ConfigResult};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Kinds of filesystem events a watcher reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsEventKind {
    Create,
    Write,
    Remove,
    Rename,
    Metadata,
    Access,
    Other,
}

impl FsEventKind {
    /// Returns true if this event means the file content may have changed.
    pub fn is_content_change(&self) -> bool {
        matches!(self, FsEventKind::Create | FsEventKind::Write)
    }
}

impl From<&EventKind> for FsEventKind {
    fn from(kind: &EventKind) -> Self {
        match kind {
            EventKind::Create(_) => FsEventKind::Create,
            EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any | ModifyKind::Other) => {
                FsEventKind::Write
            }
            EventKind::Modify(ModifyKind::Metadata(_)) => FsEventKind::Metadata,
            EventKind::Modify(ModifyKind::Name(_)) => FsEventKind::Rename,
            EventKind::Remove(_) => FsEventKind::Remove,
            EventKind::Access(_) => FsEventKind::Access,
            EventKind::Any | EventKind::Other => FsEventKind::Other,
        }
    }
}

/// Message delivered by a watcher backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchMessage {
    Event(FsEventKind),
    Error(String),
}

/// An OS watch handle that can register a path and be released.
pub trait WatchHandle: Send {
    /// Register interest in `path`.
    fn add(&mut self, path: &Path) -> ConfigResult<()>;

    /// Release the OS resources. Must be safe to call more than once.
    fn close(&mut self);
}

/// Creates watch handles together with the stream of messages they produce.
///
/// The message stream ends (returns `None`) once the handle is closed or the
/// backend shuts down.
pub trait WatcherFactory: Send + Sync {
    fn create(&self) -> ConfigResult<(Box<dyn WatchHandle>, mpsc::UnboundedReceiver<WatchMessage>)>;
}

/// Watcher backend on top of `notify`'s recommended OS watcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotifyWatcherFactory;

struct NotifyWatchHandle {
    watcher: Option<RecommendedWatcher>,
}

impl WatcherFactory for NotifyWatcherFactory {
    fn create(&self) -> ConfigResult<(Box<dyn WatchHandle>, mpsc::UnboundedReceiver<WatchMessage>)> {
        let (tx, rx) = mpsc::unbounded_channel();

        let watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            let message = match res {
                Ok(event) => WatchMessage::Event(FsEventKind::from(&event.kind)),
                Err(err) => WatchMessage::Error(err.to_string()),
            };
            // Receiver gone means the session already ended.
            let _ = tx.send(message);
        })
        .map_err(|e| ConfigError::watch_setup(PathBuf::new(), e))?;

        Ok((
            Box::new(NotifyWatchHandle {
                watcher: Some(watcher),
            }),
            rx,
        ))
    }
}

impl WatchHandle for NotifyWatchHandle {
    fn add(&mut self, path: &Path) -> ConfigResult<()> {
        match self.watcher.as_mut() {
            Some(watcher) => watcher
                .watch(path, RecursiveMode::NonRecursive)
                .map_err(|e| ConfigError::watch_setup(path, e)),
            None => Err(ConfigError::watch_setup(path, "watcher already closed")),
        }
    }

    fn close(&mut self) {
        // Dropping the watcher drops the event callback and its sender.
        self.watcher.take();
    }
}

/// Owns a watch handle and releases it when dropped.
pub struct WatchGuard {
    handle: Box<dyn WatchHandle>,
}

impl WatchGuard {
    pub fn new(handle: Box<dyn WatchHandle>) -> Self {
        Self { handle }
    }

    pub fn add(&mut self, path: &Path) -> ConfigResult<()> {
        self.handle.add(path)
    }
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        self.handle.close();
    }
}

/// Start watching `path` and spawn the session's event loop.
///
/// Setup failures are returned synchronously; the handle is released before
/// returning.
pub fn spawn_watch(
    factory: &dyn WatcherFactory,
    path: PathBuf,
    notify: mpsc::Sender<bool>,
    cancel: CancellationToken,
) -> ConfigResult<()> {
    let runtime = tokio::runtime::Handle::try_current()
        .map_err(|e| ConfigError::watch_setup(&path, e))?;

    let (handle, events) = factory.create()?;
    let mut guard = WatchGuard::new(handle);
    guard.add(&path)?;

    info!(path = %path.display(), "Watching configuration file");
    runtime.spawn(run_watch_loop(guard, events, notify, cancel, path));
    Ok(())
}

async fn run_watch_loop(
    guard: WatchGuard,
    mut events: mpsc::UnboundedReceiver<WatchMessage>,
    notify: mpsc::Sender<bool>,
    cancel: CancellationToken,
    path: PathBuf,
) {
    // Released when the loop returns, whichever branch ends it.
    let _guard = guard;

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!(path = %path.display(), "Watch cancelled");
                return;
            }
            message = events.recv() => match message {
                None => {
                    debug!(path = %path.display(), "Watch event source closed");
                    return;
                }
                Some(WatchMessage::Event(kind)) if kind.is_content_change() => {
                    trace!(path = %path.display(), ?kind, "Configuration file changed");
                    tokio::select! {
                        biased;

                        _ = cancel.cancelled() => return,
                        sent = notify.send(true) => {
                            if sent.is_err() {
                                debug!(path = %path.display(), "Notification receiver dropped");
                                return;
                            }
                        }
                    }
                }
                Some(WatchMessage::Event(kind)) => {
                    trace!(path = %path.display(), ?kind, "Ignoring event");
                }
                Some(WatchMessage::Error(err)) => {
                    warn!(path = %path.display(), error = %err, "File watcher error");
                }
            }
        }
    }
}
