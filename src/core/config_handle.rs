//! The active-configuration handle: lock-free reads, transactional reloads.

use crate::core::{ConfigLoader, Configuration, LogConfBuilder};
use crate::error::{ConfError, Result, ValidationError};
use crate::notify::{SubscriberRegistry, SubscriptionHandle};
use crate::sources::{ConfigSource, FileSource, env};
use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Type alias for validator functions.
pub(crate) type Validator =
    Arc<dyn Fn(&Configuration) -> std::result::Result<(), ValidationError> + Send + Sync>;

/// Handle to the one active [`Configuration`].
///
/// Reads go through `arc-swap`: [`get`](Self::get) never blocks and always
/// returns either the old or the new configuration in full. Reloads build a
/// brand-new configuration off to the side and publish it with a single
/// pointer swap only if the build succeeded; a failed reload leaves the
/// active configuration untouched. The old configuration is dropped when the
/// last reader releases its `Arc`.
///
/// # Examples
///
/// ```rust,no_run
/// use hotlog_conf::prelude::*;
/// use std::path::Path;
///
/// # fn example() -> Result<()> {
/// let conf = LogConf::initialize(Some(Path::new("/etc/app/log.conf")))?;
///
/// // hot path
/// let active = conf.get().expect("initialized");
/// for rule in active.matching_rules("app_db", 100) {
///     println!("route to {}", rule.output());
/// }
///
/// // after editing the file
/// if let Err(e) = conf.reload(None) {
///     eprintln!("keeping previous configuration: {}", e);
/// }
/// # Ok(())
/// # }
/// ```
pub struct LogConf {
    /// The active configuration; `None` only after shutdown
    current: Arc<ArcSwapOption<Configuration>>,
    /// Source of the active configuration. Its lock also serializes reloads.
    source: Arc<Mutex<Option<Arc<dyn ConfigSource>>>>,
    /// Forced strict mode; `None` defers to the process-wide toggle
    strict: Option<bool>,
    /// Extra checks run on every build
    validator: Option<Validator>,
    /// Callbacks run after each successful publish
    subscribers: SubscriberRegistry,
}

impl LogConf {
    /// Create a new builder for constructing a configuration handle.
    pub fn builder() -> LogConfBuilder {
        LogConfBuilder::new()
    }

    /// Load the initial configuration.
    ///
    /// With no `path`, the file named by `HOTLOG_CONF_PATH` is used if set;
    /// otherwise the built-in defaults with a single catch-all rule to
    /// stdout are installed.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be built. No handle
    /// exists in that case.
    pub fn initialize(path: Option<&Path>) -> Result<Self> {
        let builder = LogConf::builder().with_env_path(true);
        match path {
            Some(path) => builder.with_file(path).build(),
            None => builder.build(),
        }
    }

    pub(crate) fn from_parts(
        initial: Configuration,
        source: Option<Arc<dyn ConfigSource>>,
        strict: Option<bool>,
        validator: Option<Validator>,
    ) -> Self {
        Self {
            current: Arc::new(ArcSwapOption::from_pointee(initial)),
            source: Arc::new(Mutex::new(source)),
            strict,
            validator,
            subscribers: SubscriberRegistry::new(),
        }
    }

    /// The active configuration, or `None` after [`shutdown`](Self::shutdown).
    ///
    /// Lock-free; the returned `Arc` keeps that configuration alive even if
    /// a reload replaces it meanwhile.
    pub fn get(&self) -> Option<Arc<Configuration>> {
        self.current.load_full()
    }

    /// Whether a configuration is active.
    pub fn is_active(&self) -> bool {
        self.current.load().is_some()
    }

    /// Rebuild and publish the configuration.
    ///
    /// `path` names a new file to load; `None` reloads whatever the active
    /// configuration was loaded from (the defaults, if it came from none).
    /// Concurrent reloads are serialized.
    ///
    /// # Errors
    ///
    /// Returns the build error if the new configuration is invalid; the
    /// active configuration is unchanged. Returns [`ConfError::NotActive`]
    /// after shutdown.
    pub fn reload(&self, path: Option<&Path>) -> Result<()> {
        let source = path.map(|p| Arc::new(FileSource::new(p)) as Arc<dyn ConfigSource>);
        self.publish(source)
    }

    /// Rebuild and publish the configuration from `source`.
    ///
    /// # Errors
    ///
    /// Same as [`reload`](Self::reload).
    pub fn reload_from<S: ConfigSource + 'static>(&self, source: S) -> Result<()> {
        self.publish(Some(Arc::new(source)))
    }

    fn publish(&self, requested: Option<Arc<dyn ConfigSource>>) -> Result<()> {
        let mut active_source = self.source.lock();
        if !self.is_active() {
            return Err(ConfError::NotActive);
        }

        let source = requested.or_else(|| active_source.clone());
        let conf = match self.build(source.as_deref()) {
            Ok(conf) => Arc::new(conf),
            Err(err) => {
                tracing::warn!(error = %err, "reload failed, keeping the active configuration");
                return Err(err);
            }
        };

        let previous = self.current.swap(Some(Arc::clone(&conf)));
        *active_source = source;
        drop(active_source);

        tracing::info!(
            source = %conf.source_name(),
            rules = conf.rules().len(),
            "published new configuration"
        );
        // readers that still hold the previous snapshot keep it alive
        drop(previous);

        self.subscribers.notify_all(&conf);
        Ok(())
    }

    pub(crate) fn build(&self, source: Option<&dyn ConfigSource>) -> Result<Configuration> {
        build_configuration(source, self.strict, self.validator.as_ref())
    }

    /// Release the active configuration.
    ///
    /// Readers holding an `Arc` from [`get`](Self::get) keep their snapshot;
    /// later calls to `get` return `None` and reloads fail.
    pub fn shutdown(&self) {
        let mut active_source = self.source.lock();
        *active_source = None;
        if self.current.swap(None).is_some() {
            tracing::info!("configuration shut down");
        }
    }

    /// Emit the active configuration through `tracing` for troubleshooting.
    pub fn profile(&self) {
        match self.get() {
            Some(conf) => conf.profile(),
            None => tracing::info!("no active configuration"),
        }
    }

    /// Run `callback` after every successful reload.
    ///
    /// Returns a handle that unsubscribes when dropped.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&Configuration) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(callback)
    }

    /// Reload automatically whenever the active configuration file changes.
    ///
    /// Failed reloads are logged and the previous configuration stays
    /// active. Drop the returned watcher to stop. Must be called inside a
    /// tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the active configuration did not come from a file
    /// or the file cannot be watched.
    #[cfg(feature = "file-watch")]
    pub fn watch(&self, debounce: std::time::Duration) -> Result<crate::notify::ConfigWatcher> {
        let path = self
            .get()
            .ok_or(ConfError::NotActive)?
            .source_path()
            .map(Path::to_path_buf)
            .ok_or_else(|| ConfError::Watch("active configuration has no file to watch".into()))?;

        let (watcher, mut rx) = crate::notify::ConfigWatcher::new(debounce)?;
        watcher.watch(&path)?;

        let handle = self.clone();
        tokio::spawn(async move {
            while rx.recv().await.is_some() {
                let handle = handle.clone();
                match tokio::task::spawn_blocking(move || handle.reload(None)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => tracing::warn!(error = %e, "automatic reload failed"),
                    Err(e) => tracing::error!(error = %e, "reload task panicked"),
                }
            }
        });
        Ok(watcher)
    }
}

pub(crate) fn build_configuration(
    source: Option<&dyn ConfigSource>,
    strict: Option<bool>,
    validator: Option<&Validator>,
) -> Result<Configuration> {
    let strict = strict.unwrap_or_else(env::strict_mode);
    let conf = ConfigLoader::new(strict).load(source)?;
    if let Some(validator) = validator {
        validator(&conf)?;
    }
    Ok(conf)
}

impl Clone for LogConf {
    fn clone(&self) -> Self {
        Self {
            current: Arc::clone(&self.current),
            source: Arc::clone(&self.source),
            strict: self.strict,
            validator: self.validator.clone(),
            subscribers: self.subscribers.clone(),
        }
    }
}

impl fmt::Debug for LogConf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let active = self.get();
        f.debug_struct("LogConf")
            .field("active", &active.as_deref().map(Configuration::source_name))
            .field("strict", &self.strict)
            .field("validator", &self.validator.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::TextSource;

    fn handle(text: &str) -> LogConf {
        LogConf::builder()
            .with_text("test.conf", text)
            .strict(false)
            .build()
            .unwrap()
    }

    #[test]
    fn test_debug_names_active_source() {
        let conf = handle("*.* >stdout\n");
        let rendered = format!("{:?}", conf);
        assert!(rendered.starts_with("LogConf"));
        assert!(rendered.contains("\"test.conf\""));

        conf.shutdown();
        assert!(format!("{:?}", conf).contains("active: None"));
    }

    #[test]
    fn test_reload_from_new_source() {
        let conf = handle("*.* >stdout\n");
        conf.reload_from(TextSource::new("next.conf", "*.* >stderr\napp.* >stdout\n"))
            .unwrap();

        let active = conf.get().unwrap();
        assert_eq!(active.source_name(), "next.conf");
        assert_eq!(active.rules().len(), 2);
    }

    #[test]
    fn test_failed_reload_keeps_snapshot() {
        let conf = handle("*.* >stdout\n");
        let before = conf.get().unwrap();

        let err = conf
            .reload_from(TextSource::new("broken.conf", "*.* >stdout\n*.* >nowhere\n"))
            .unwrap_err();
        assert_eq!(err.line(), Some(2));

        let after = conf.get().unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(after.source_name(), "test.conf");
    }

    #[test]
    fn test_reload_without_path_reuses_source() {
        let conf = handle("@buf_size_min 4KB\n*.* >stdout\n");
        conf.reload(None).unwrap();
        assert_eq!(conf.get().unwrap().min_buffer_size(), 4096);
        assert_eq!(conf.get().unwrap().source_name(), "test.conf");
    }

    #[test]
    fn test_reader_keeps_old_snapshot_across_swap() {
        let conf = handle("*.* >stdout\n");
        let old = conf.get().unwrap();
        conf.reload_from(TextSource::new("next.conf", "")).unwrap();

        assert_eq!(old.rules().len(), 1);
        assert!(conf.get().unwrap().rules().is_empty());
        assert_eq!(Arc::strong_count(&old), 1);
    }

    #[test]
    fn test_shutdown() {
        let conf = handle("*.* >stdout\n");
        let clone = conf.clone();
        conf.shutdown();

        assert!(clone.get().is_none());
        assert!(!clone.is_active());
        assert!(matches!(clone.reload(None), Err(ConfError::NotActive)));
    }

    #[test]
    fn test_subscribers_see_new_configuration() {
        let conf = handle("*.* >stdout\n");
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = Arc::clone(&seen);
        let _handle = conf.subscribe(move |c| seen_clone.lock().push(c.rules().len()));

        conf.reload_from(TextSource::new("two.conf", "a.* >stdout\nb.* >stdout\n"))
            .unwrap();
        let _ = conf.reload_from(TextSource::new("bad.conf", "@oops 1\n"));

        assert_eq!(*seen.lock(), vec![2]);
    }
}
