//! Typed configuration loading, reloading and live watching.
//!
//! A [`Configuration`] starts from an identifier (bare name, name with
//! extension, or absolute path). The first successful load replaces the
//! identifier with the resolved path, so later reloads read the same file.
//!
//! ## Watching
//! [`Configuration::watch_with_cancel`] reloads once synchronously and
//! publishes the result before any background work starts. A single task then
//! handles change notifications one at a time:
//! - Read and decode failures skip the cycle; the watch keeps running
//! - Successful decodes are published as a fresh value
//! - When the task ends the output sender is dropped, closing the channel
//!
//! The destination passed in is consumed: it is reloaded and sent as the
//! initial value. Every later update is decoded from scratch and sent as is.

use crate::context::LoadContext;
use crate::error::{ConfigError, ConfigResult};
use crate::loader::{FileLoader, LoadedContent, Loader};
use serde::de::DeserializeOwned;
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Capacity of channels created by the top-level watch helpers.
pub const UPDATE_CHANNEL_CAPACITY: usize = 16;

/// Capacity of the internal change notification channel.
const NOTIFY_CHANNEL_CAPACITY: usize = 16;

/// A configuration bound to an identifier.
///
/// Clones share the identifier, so a resolved path recorded by a watch task
/// is visible through every clone.
#[derive(Clone)]
pub struct Configuration {
    identifier: Arc<RwLock<String>>,
    loader: Option<Arc<dyn Loader>>,
    context: LoadContext,
}

impl std::fmt::Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("identifier", &self.identifier())
            .field("injected_loader", &self.loader.is_some())
            .finish_non_exhaustive()
    }
}

impl Configuration {
    /// Create a configuration using the default [`LoadContext`].
    pub fn new(identifier: impl Into<String>) -> Self {
        Self::with_context(identifier, LoadContext::default())
    }

    pub fn with_context(identifier: impl Into<String>, context: LoadContext) -> Self {
        Self {
            identifier: Arc::new(RwLock::new(identifier.into())),
            loader: None,
            context,
        }
    }

    /// Use `loader` instead of resolving the identifier through the filesystem.
    pub fn with_loader(mut self, loader: Arc<dyn Loader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// The current identifier; the resolved path after a successful load.
    pub fn identifier(&self) -> String {
        match self.identifier.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn context(&self) -> &LoadContext {
        &self.context
    }

    fn set_identifier(&self, identifier: String) {
        let mut guard = match self.identifier.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = identifier;
    }

    fn loader(&self) -> ConfigResult<Arc<dyn Loader>> {
        match &self.loader {
            Some(loader) => Ok(Arc::clone(loader)),
            None => Ok(Arc::new(FileLoader::new(self.identifier(), &self.context)?)),
        }
    }

    /// Load, decode, and replace `dest` with the result.
    ///
    /// `dest` is untouched on any failure.
    pub fn reload<T: DeserializeOwned>(&self, dest: &mut T) -> ConfigResult<()> {
        let loader = self.loader()?;
        let loaded = loader.load()?;
        self.set_identifier(loaded.path.to_string_lossy().into_owned());
        info!(identifier = %loaded.path.display(), "Loaded configuration");

        *dest = self.decode(&loaded)?;
        Ok(())
    }

    fn decode<T: DeserializeOwned>(&self, loaded: &LoadedContent) -> ConfigResult<T> {
        let codec = self.context.codecs().dispatch(&loaded.path)?;
        codec.deserialize(&loaded.content)
    }

    /// Watch until the underlying file watch ends. See [`Self::watch_with_cancel`].
    pub async fn watch<T>(&self, dest: T, output: mpsc::Sender<T>) -> ConfigResult<()>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.watch_with_cancel(dest, output, CancellationToken::new())
            .await
    }

    /// Reload into `dest`, publish it, then keep publishing on every change.
    ///
    /// Setup errors (resolution, decode, watch registration) are returned
    /// before anything is published or spawned. The initial publish waits for
    /// channel capacity, so the caller observes the initial state before the
    /// watch is registered. Cancelling `cancel` stops the watch and closes
    /// `output`; keep no other clones of the sender if you rely on closure.
    pub async fn watch_with_cancel<T>(
        &self,
        mut dest: T,
        output: mpsc::Sender<T>,
        cancel: CancellationToken,
    ) -> ConfigResult<()>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.reload(&mut dest)?;

        output
            .send(dest)
            .await
            .map_err(|_| ConfigError::UpdatesClosed)?;

        let loader = self.loader()?;
        let (notify_tx, mut notify_rx) = mpsc::channel(NOTIFY_CHANNEL_CAPACITY);
        let session = cancel.child_token();
        loader.watch_with_cancel(notify_tx, session.clone())?;

        let configuration = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;

                    _ = cancel.cancelled() => break,
                    notification = notify_rx.recv() => {
                        if notification.is_none() {
                            break;
                        }
                    }
                }

                let loaded = match loader.load() {
                    Ok(loaded) => loaded,
                    Err(err) => {
                        warn!(error = %err, "Skipping configuration update: load failed");
                        continue;
                    }
                };
                let value = match configuration.decode::<T>(&loaded) {
                    Ok(value) => value,
                    Err(err) => {
                        warn!(path = %loaded.path.display(), error = %err, "Skipping configuration update: decode failed");
                        continue;
                    }
                };
                configuration.set_identifier(loaded.path.to_string_lossy().into_owned());
                debug!(path = %loaded.path.display(), "Publishing configuration update");

                tokio::select! {
                    biased;

                    _ = cancel.cancelled() => break,
                    sent = output.send(value) => {
                        if sent.is_err() {
                            break;
                        }
                    }
                }
            }

            // Stop the file watch session too; `output` drops with this task.
            session.cancel();
            debug!("Configuration watch ended");
        });

        Ok(())
    }
}

/// Load `identifier` into `dest` using the default context.
pub fn load<T: DeserializeOwned>(identifier: &str, dest: &mut T) -> ConfigResult<Configuration> {
    let configuration = Configuration::new(identifier);
    configuration.reload(dest)?;
    Ok(configuration)
}

/// Watch `identifier`, returning a receiver that already holds the initial value.
pub async fn watch<T>(identifier: &str, dest: T) -> ConfigResult<mpsc::Receiver<T>>
where
    T: DeserializeOwned + Send + 'static,
{
    watch_with_cancel(identifier, dest, CancellationToken::new()).await
}

/// Like [`watch`], stopping when `cancel` fires.
pub async fn watch_with_cancel<T>(
    identifier: &str,
    dest: T,
    cancel: CancellationToken,
) -> ConfigResult<mpsc::Receiver<T>>
where
    T: DeserializeOwned + Send + 'static,
{
    let (tx, rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
    Configuration::new(identifier)
        .watch_with_cancel(dest, tx, cancel)
        .await?;
    Ok(rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryLoader;
    use serde::Deserialize;

    #[derive(Debug, Clone, Default, PartialEq, Deserialize)]
    struct Mock {
        name: String,
        age: u32,
    }

    #[test]
    fn test_reload_from_injected_loader() {
        let configuration = Configuration::new("ignored").with_loader(Arc::new(
            MemoryLoader::new("memory/config.yaml", "name: Bailey\nage: 30\n"),
        ));
        let mut mock = Mock::default();
        configuration.reload(&mut mock).unwrap();

        assert_eq!(
            mock,
            Mock {
                name: "Bailey".to_string(),
                age: 30
            }
        );
        assert_eq!(configuration.identifier(), "memory/config.yaml");
    }

    #[test]
    fn test_reload_keeps_dest_on_decode_error() {
        let configuration = Configuration::new("ignored")
            .with_loader(Arc::new(MemoryLoader::new("config.json", "{\"name\": ")));
        let mut mock = Mock {
            name: "before".to_string(),
            age: 1,
        };
        let err = configuration.reload(&mut mock).unwrap_err();

        assert!(matches!(err, ConfigError::Deserialize { .. }));
        assert_eq!(mock.name, "before");
        assert_eq!(mock.age, 1);
    }

    #[test]
    fn test_reload_with_unknown_extension() {
        let configuration = Configuration::new("ignored")
            .with_loader(Arc::new(MemoryLoader::new("config.txt", "name=x")));
        let mut mock = Mock::default();
        assert!(matches!(
            configuration.reload(&mut mock),
            Err(ConfigError::NoMatchingCodec { .. })
        ));
    }

    #[test]
    fn test_reload_with_empty_identifier() {
        let configuration = Configuration::new("");
        let mut mock = Mock::default();
        assert!(matches!(
            configuration.reload(&mut mock),
            Err(ConfigError::EmptyIdentifier)
        ));
    }

    #[test]
    fn test_clones_share_identifier() {
        let configuration = Configuration::new("first");
        let clone = configuration.clone();
        configuration.set_identifier("second".to_string());
        assert_eq!(clone.identifier(), "second");
    }

    #[tokio::test]
    async fn test_watch_with_unwatchable_loader_fails_after_initial_publish() {
        let configuration = Configuration::new("ignored")
            .with_loader(Arc::new(MemoryLoader::new("config.json", r#"{"name": "m", "age": 2}"#)));
        let (tx, mut rx) = mpsc::channel(1);

        let err = configuration
            .watch(Mock::default(), tx)
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::WatchUnsupported { .. }));

        // The initial value was already delivered; then the sender was dropped.
        assert_eq!(rx.recv().await.unwrap().name, "m");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_watch_fails_fast_when_initial_reload_fails() {
        let configuration = Configuration::new("");
        let (tx, mut rx) = mpsc::channel(1);

        let err = configuration
            .watch(Mock::default(), tx)
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyIdentifier));
        assert!(rx.recv().await.is_none());
    }
}
