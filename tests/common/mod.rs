//! Shared helpers for integration tests.
#![allow(dead_code)]

use prefer::ConfigResult;
use prefer::error::ConfigError;
use prefer::fs::{FileSystem, OsFileSystem};
use prefer::loader::watcher::{FsEventKind, WatchHandle, WatchMessage, WatcherFactory};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Default)]
struct ManualState {
    sender: Option<mpsc::UnboundedSender<WatchMessage>>,
    watched: Vec<PathBuf>,
    created: usize,
    closed: usize,
    fail_add: bool,
}

/// Watcher backend driven by the test instead of the OS.
#[derive(Clone, Default)]
pub struct ManualWatchers {
    state: Arc<Mutex<ManualState>>,
}

impl ManualWatchers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles created from now on reject `add`.
    pub fn failing_add() -> Self {
        let watchers = Self::default();
        watchers.state.lock().unwrap().fail_add = true;
        watchers
    }

    pub fn emit(&self, message: WatchMessage) {
        let state = self.state.lock().unwrap();
        let sender = state.sender.as_ref().expect("no open watch handle");
        sender.send(message).unwrap();
    }

    pub fn emit_event(&self, kind: FsEventKind) {
        self.emit(WatchMessage::Event(kind));
    }

    /// Simulate the backend shutting down its event stream.
    pub fn close_source(&self) {
        self.state.lock().unwrap().sender.take();
    }

    pub fn watched(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().watched.clone()
    }

    pub fn created(&self) -> usize {
        self.state.lock().unwrap().created
    }

    pub fn closed(&self) -> usize {
        self.state.lock().unwrap().closed
    }
}

struct ManualHandle {
    state: Arc<Mutex<ManualState>>,
    open: bool,
}

impl WatchHandle for ManualHandle {
    fn add(&mut self, path: &Path) -> ConfigResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_add {
            return Err(ConfigError::watch_setup(path, "add rejected"));
        }
        state.watched.push(path.to_path_buf());
        Ok(())
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            let mut state = self.state.lock().unwrap();
            state.closed += 1;
            state.sender.take();
        }
    }
}

impl WatcherFactory for ManualWatchers {
    fn create(
        &self,
    ) -> ConfigResult<(Box<dyn WatchHandle>, mpsc::UnboundedReceiver<WatchMessage>)> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state.lock().unwrap();
        state.sender = Some(tx);
        state.created += 1;
        Ok((
            Box::new(ManualHandle {
                state: Arc::clone(&self.state),
                open: true,
            }),
            rx,
        ))
    }
}

/// Real filesystem, except stat on `denied` fails with permission denied.
pub struct DeniedFileSystem {
    pub denied: PathBuf,
}

impl FileSystem for DeniedFileSystem {
    fn file_exists(&self, path: &Path) -> io::Result<bool> {
        if path == self.denied {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        OsFileSystem.file_exists(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        OsFileSystem.read(path)
    }
}

/// Poll `condition` until it holds, panicking after two seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Receive with a timeout so a hung watch fails the test instead of blocking.
pub async fn recv_timeout<T>(rx: &mut mpsc::Receiver<T>) -> Option<T> {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for message")
}
