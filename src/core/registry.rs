//! Named logger registry
//!
//! A [`LoggingContext`] owns a set of uniquely named loggers plus one default
//! logger, and applies context-wide defaults (level, pattern, error handler,
//! flush level) to every logger it registers. Contexts are created and passed
//! around explicitly; there is no process-global instance.

use super::{
    error::{LoggerError, Result},
    formatter::RenderTo,
    level_config::{LevelConfig, DEFAULT_LEVEL_ENV},
    log_level::LogLevel,
    logger::{ErrorHandler, Logger},
    overflow_policy::OverflowPolicy,
    pattern::PatternFormatter,
    sink::{SharedSink, Sink},
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct Defaults {
    level: Option<LogLevel>,
    overrides: HashMap<String, LogLevel>,
    pattern: Option<PatternFormatter>,
    error_handler: Option<ErrorHandler>,
    flush_level: Option<LogLevel>,
}

/// Registry of named loggers
///
/// # Example
///
/// ```
/// use rust_sink_logger::prelude::*;
///
/// let context = LoggingContext::empty();
/// context.set_level(LogLevel::Warn);
///
/// let db = context.create("db", || Ok(NullSink::new())).unwrap();
/// assert_eq!(db.level(), LogLevel::Warn);
/// assert!(context.create("db", || Ok(NullSink::new())).is_err());
/// assert!(context.get("db").is_some());
/// ```
pub struct LoggingContext {
    loggers: RwLock<HashMap<String, Arc<Logger>>>,
    default_logger: RwLock<Option<Arc<Logger>>>,
    defaults: RwLock<Defaults>,
}

impl LoggingContext {
    /// Context whose default logger (named `""`) writes to stdout
    #[cfg(feature = "console")]
    #[must_use]
    pub fn new() -> Self {
        use crate::sinks::ConsoleSink;

        let context = Self::empty();
        context.set_default_logger(Arc::new(Logger::with_sink("", Arc::new(ConsoleSink::new()))));
        context
    }

    /// Context with no loggers and no default logger
    #[must_use]
    pub fn empty() -> Self {
        Self {
            loggers: RwLock::new(HashMap::new()),
            default_logger: RwLock::new(None),
            defaults: RwLock::new(Defaults::default()),
        }
    }

    /// Create and register a logger writing to the sink built by `make_sink`
    ///
    /// The name is checked first: `make_sink` is not called when a logger
    /// with this name already exists.
    ///
    /// # Errors
    ///
    /// [`LoggerError::DuplicateLogger`], or whatever `make_sink` returns.
    pub fn create<S, F>(&self, name: &str, make_sink: F) -> Result<Arc<Logger>>
    where
        S: Sink + 'static,
        F: FnOnce() -> Result<S>,
    {
        self.ensure_unique(name)?;
        let sink: SharedSink = Arc::new(make_sink()?);
        self.insert_unique(Arc::new(Logger::with_sink(name, sink)))
    }

    /// Like [`create`](Self::create), but the logger dispatches through an
    /// async queue of `capacity` records
    pub fn create_async<S, F>(
        &self,
        name: &str,
        make_sink: F,
        capacity: usize,
        policy: OverflowPolicy,
    ) -> Result<Arc<Logger>>
    where
        S: Sink + 'static,
        F: FnOnce() -> Result<S>,
    {
        self.ensure_unique(name)?;
        let logger = Logger::builder()
            .name(name)
            .sink(Arc::new(make_sink()?))
            .async_mode(capacity)
            .overflow_policy(policy)
            .build();
        self.insert_unique(Arc::new(logger))
    }

    fn ensure_unique(&self, name: &str) -> Result<()> {
        if self.loggers.read().contains_key(name) {
            return Err(LoggerError::duplicate_logger(name));
        }
        Ok(())
    }

    fn insert_unique(&self, logger: Arc<Logger>) -> Result<Arc<Logger>> {
        self.apply_defaults(&logger);
        let mut loggers = self.loggers.write();
        // A concurrent create may have won the race since ensure_unique
        if loggers.contains_key(logger.name()) {
            return Err(LoggerError::duplicate_logger(logger.name()));
        }
        loggers.insert(logger.name().to_string(), Arc::clone(&logger));
        Ok(logger)
    }

    /// Look up a logger; never creates one
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<Logger>> {
        self.loggers.read().get(name).cloned()
    }

    /// Apply the context defaults to `logger`, then register it,
    /// replacing any logger of the same name
    pub fn initialize_logger(&self, logger: Arc<Logger>) {
        self.register(logger);
    }

    /// Register `logger` with the context defaults applied
    ///
    /// Returns the logger it replaced, if any. A replaced default logger is
    /// replaced in the default slot as well.
    pub fn register(&self, logger: Arc<Logger>) -> Option<Arc<Logger>> {
        self.apply_defaults(&logger);
        let replaced = self
            .loggers
            .write()
            .insert(logger.name().to_string(), Arc::clone(&logger));
        if let Some(ref old) = replaced {
            let mut default = self.default_logger.write();
            if default.as_ref().is_some_and(|d| Arc::ptr_eq(d, old)) {
                *default = Some(logger);
            }
        }
        replaced
    }

    fn apply_defaults(&self, logger: &Logger) {
        let defaults = self.defaults.read();
        if logger.explicit_level().is_none() {
            let level = defaults
                .overrides
                .get(logger.name())
                .copied()
                .or(defaults.level);
            if let Some(level) = level {
                logger.set_level(level);
            }
        }
        if logger.pattern().is_none() {
            if let Some(ref formatter) = defaults.pattern {
                logger.set_formatter(formatter.clone());
            }
        }
        if !logger.has_error_handler() {
            if let Some(ref handler) = defaults.error_handler {
                logger.set_error_handler(Arc::clone(handler));
            }
        }
        if let Some(level) = defaults.flush_level {
            logger.flush_on(level);
        }
    }

    /// Register `logger` and make it the default
    ///
    /// The previous default is unregistered, unless it is `logger` itself.
    pub fn set_default_logger(&self, logger: Arc<Logger>) {
        self.apply_defaults(&logger);
        let previous = self.default_logger.write().replace(Arc::clone(&logger));

        // Released after the lock; loggers flush on drop
        let (stale, replaced) = {
            let mut loggers = self.loggers.write();
            let stale = match previous {
                Some(ref old) if !Arc::ptr_eq(old, &logger) => {
                    let registered = loggers
                        .get(old.name())
                        .is_some_and(|current| Arc::ptr_eq(current, old));
                    if registered {
                        loggers.remove(old.name())
                    } else {
                        None
                    }
                }
                _ => None,
            };
            let replaced = loggers.insert(logger.name().to_string(), logger);
            (stale, replaced)
        };
        drop((stale, replaced, previous));
    }

    #[must_use]
    pub fn default_logger(&self) -> Option<Arc<Logger>> {
        self.default_logger.read().clone()
    }

    /// Unregister `name`; clears the default slot if it held that logger
    pub fn drop_logger(&self, name: &str) -> Option<Arc<Logger>> {
        let removed = self.loggers.write().remove(name);
        let old_default = {
            let mut default = self.default_logger.write();
            if default.as_ref().is_some_and(|l| l.name() == name) {
                default.take()
            } else {
                None
            }
        };
        removed.or(old_default)
    }

    /// Unregister every logger, including the default
    pub fn drop_all(&self) {
        // Loggers flush on drop, so release them after the locks
        let loggers = std::mem::take(&mut *self.loggers.write());
        let default = self.default_logger.write().take();
        drop(loggers);
        drop(default);
    }

    /// Registered names, sorted
    #[must_use]
    pub fn logger_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.loggers.read().keys().cloned().collect();
        names.sort();
        names
    }

    fn snapshot(&self) -> Vec<Arc<Logger>> {
        self.loggers.read().values().cloned().collect()
    }

    /// Call `f` for every registered logger
    ///
    /// No registry lock is held while `f` runs.
    pub fn apply_all<F: FnMut(&Arc<Logger>)>(&self, mut f: F) {
        for logger in self.snapshot() {
            f(&logger);
        }
    }

    /// Set the level of every logger and of loggers registered later
    pub fn set_level(&self, level: LogLevel) {
        self.defaults.write().level = Some(level);
        self.apply_all(|logger| logger.set_level(level));
    }

    /// Set the pattern of every logger and of loggers registered later
    ///
    /// # Errors
    ///
    /// [`LoggerError::InvalidPattern`]; nothing is changed.
    pub fn set_pattern(&self, pattern: &str) -> Result<()> {
        let formatter = PatternFormatter::new(pattern)?;
        self.defaults.write().pattern = Some(formatter.clone());
        self.apply_all(|logger| logger.set_formatter(formatter.clone()));
        Ok(())
    }

    pub fn flush_on(&self, level: LogLevel) {
        self.defaults.write().flush_level = Some(level);
        self.apply_all(|logger| logger.flush_on(level));
    }

    pub fn set_error_handler(&self, handler: ErrorHandler) {
        self.defaults.write().error_handler = Some(Arc::clone(&handler));
        self.apply_all(|logger| logger.set_error_handler(Arc::clone(&handler)));
    }

    /// Replace the per-logger overrides with `config` and apply it
    ///
    /// Every registered logger gets its override, or else the global level.
    /// Overrides from an earlier config are forgotten, so a logger registered
    /// later sees the same levels as one registered now.
    pub fn apply_level_config(&self, config: &LevelConfig) {
        {
            let mut defaults = self.defaults.write();
            defaults.overrides = config.loggers.clone();
            if config.global.is_some() {
                defaults.level = config.global;
            }
        }
        self.apply_all(|logger| {
            if let Some(level) = config.level_for(logger.name()) {
                logger.set_level(level);
            }
        });
    }

    /// Apply `LOG_LEVEL` from the environment overlaid with `args`
    ///
    /// The command line wins where both name the same logger or both set a
    /// global level.
    pub fn load_levels<I, S>(&self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if let Some(config) = LevelConfig::from_env_and_args(DEFAULT_LEVEL_ENV, args) {
            self.apply_level_config(&config);
        }
    }

    /// Flush every logger, returning the first error after trying them all
    pub fn flush_all(&self) -> Result<()> {
        let mut first_error = None;
        for logger in self.snapshot() {
            if let Err(e) = logger.flush() {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Shut every logger down and unregister them all
    ///
    /// Returns `false` if any async logger failed to drain within `timeout`.
    pub fn shutdown(&self, timeout: Duration) -> bool {
        let mut drained = true;
        for logger in self.snapshot() {
            drained &= logger.shutdown(timeout);
        }
        self.drop_all();
        drained
    }

    /// Log through the default logger; does nothing without one
    pub fn log(&self, level: LogLevel, template: &str, args: &[&dyn RenderTo]) {
        if let Some(logger) = self.default_logger() {
            logger.log(level, template, args);
        }
    }

    pub fn trace(&self, template: &str, args: &[&dyn RenderTo]) {
        self.log(LogLevel::Trace, template, args);
    }

    pub fn debug(&self, template: &str, args: &[&dyn RenderTo]) {
        self.log(LogLevel::Debug, template, args);
    }

    pub fn info(&self, template: &str, args: &[&dyn RenderTo]) {
        self.log(LogLevel::Info, template, args);
    }

    pub fn warn(&self, template: &str, args: &[&dyn RenderTo]) {
        self.log(LogLevel::Warn, template, args);
    }

    pub fn error(&self, template: &str, args: &[&dyn RenderTo]) {
        self.log(LogLevel::Error, template, args);
    }

    pub fn critical(&self, template: &str, args: &[&dyn RenderTo]) {
        self.log(LogLevel::Critical, template, args);
    }
}

#[cfg(feature = "console")]
impl Default for LoggingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LoggingContext {
    fn drop(&mut self) {
        if let Err(e) = self.flush_all() {
            eprintln!("[LOGGER ERROR] Failed to flush loggers during shutdown: {}", e);
        }
    }
}

impl std::fmt::Debug for LoggingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggingContext")
            .field("loggers", &self.logger_names())
            .field(
                "default_logger",
                &self.default_logger().map(|l| l.name().to_string()),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::{NullSink, StreamSink};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_create_and_get() {
        let context = LoggingContext::empty();
        let logger = context.create("net", || Ok(NullSink::new())).unwrap();
        let found = context.get("net").unwrap();
        assert!(Arc::ptr_eq(&logger, &found));
        assert!(context.get("missing").is_none());
    }

    #[test]
    fn test_duplicate_create_skips_sink_construction() {
        let context = LoggingContext::empty();
        let first = context.create("db", || Ok(NullSink::new())).unwrap();

        let calls = AtomicUsize::new(0);
        let err = context
            .create("db", || {
                calls.fetch_add(1, Ordering::Relaxed);
                Ok(NullSink::new())
            })
            .unwrap_err();

        assert!(matches!(err, LoggerError::DuplicateLogger { ref name } if name == "db"));
        assert_eq!(calls.load(Ordering::Relaxed), 0);
        assert!(Arc::ptr_eq(&first, &context.get("db").unwrap()));
    }

    #[test]
    fn test_failed_sink_construction_registers_nothing() {
        let context = LoggingContext::empty();
        let result = context.create::<NullSink, _>("bad", || Err(LoggerError::sink("nope")));
        assert!(result.is_err());
        assert!(context.get("bad").is_none());
    }

    #[test]
    fn test_register_overwrites() {
        let context = LoggingContext::empty();
        let first = Arc::new(Logger::new("svc"));
        let second = Arc::new(Logger::new("svc"));
        assert!(context.register(Arc::clone(&first)).is_none());
        let replaced = context.register(Arc::clone(&second)).unwrap();
        assert!(Arc::ptr_eq(&replaced, &first));
        assert!(Arc::ptr_eq(&context.get("svc").unwrap(), &second));
    }

    #[test]
    fn test_defaults_only_fill_unset_fields() {
        let context = LoggingContext::empty();
        context.set_level(LogLevel::Error);
        context.set_pattern("%v").unwrap();

        let plain = Arc::new(Logger::new("plain"));
        let tuned = Arc::new(Logger::builder().name("tuned").level(LogLevel::Debug).pattern("[%n] %v").build());
        context.initialize_logger(Arc::clone(&plain));
        context.initialize_logger(Arc::clone(&tuned));

        assert_eq!(plain.level(), LogLevel::Error);
        assert_eq!(plain.pattern().as_deref(), Some("%v"));
        assert_eq!(tuned.level(), LogLevel::Debug);
        assert_eq!(tuned.pattern().as_deref(), Some("[%n] %v"));
    }

    #[test]
    fn test_set_level_applies_to_existing_loggers() {
        let context = LoggingContext::empty();
        let a = context.create("a", || Ok(NullSink::new())).unwrap();
        let b = context.create("b", || Ok(NullSink::new())).unwrap();
        context.set_level(LogLevel::Critical);
        assert_eq!(a.level(), LogLevel::Critical);
        assert_eq!(b.level(), LogLevel::Critical);
    }

    #[test]
    fn test_invalid_pattern_changes_nothing() {
        let context = LoggingContext::empty();
        let a = context.create("a", || Ok(NullSink::new())).unwrap();
        assert!(context.set_pattern("%$").is_err());
        assert_eq!(a.pattern(), None);
    }

    #[test]
    fn test_default_logger_routing() {
        let context = LoggingContext::empty();
        let (sink, buffer) = StreamSink::memory();
        let app = Arc::new(Logger::builder().name("app").level(LogLevel::Warn).pattern("%v").sink(Arc::new(sink)).build());
        context.set_default_logger(Arc::clone(&app));

        context.info("hello", &[]);
        context.error("boom", &[]);

        assert_eq!(buffer.contents(), "boom\n");
        assert!(context.get("app").is_some());
    }

    #[test]
    fn test_no_default_logger_is_noop() {
        let context = LoggingContext::empty();
        context.critical("nowhere", &[]);
        assert!(context.default_logger().is_none());
    }

    #[test]
    fn test_drop_logger_clears_default() {
        let context = LoggingContext::empty();
        context.set_default_logger(Arc::new(Logger::new("main")));
        assert!(context.drop_logger("main").is_some());
        assert!(context.default_logger().is_none());
        assert!(context.logger_names().is_empty());
    }

    #[test]
    fn test_level_config_overrides() {
        let context = LoggingContext::empty();
        let db = context.create("db", || Ok(NullSink::new())).unwrap();
        let web = context.create("web", || Ok(NullSink::new())).unwrap();

        context.apply_level_config(&LevelConfig::parse("warn,db=trace,cache=off"));
        assert_eq!(db.level(), LogLevel::Trace);
        assert_eq!(web.level(), LogLevel::Warn);

        let cache = context.create("cache", || Ok(NullSink::new())).unwrap();
        assert_eq!(cache.level(), LogLevel::Off);
    }

    #[test]
    fn test_later_level_config_wins() {
        let context = LoggingContext::empty();
        let ui = context.create("ui", || Ok(NullSink::new())).unwrap();
        context.apply_level_config(&LevelConfig::parse("ui=error"));
        context.apply_level_config(&LevelConfig::from_args(["bin", "LOG_LEVEL=ui=debug"]).unwrap());
        assert_eq!(ui.level(), LogLevel::Debug);
    }

    #[test]
    fn test_global_level_replaces_earlier_overrides() {
        let context = LoggingContext::empty();
        let db = context.create("db", || Ok(NullSink::new())).unwrap();

        context.apply_level_config(&LevelConfig::parse("db=trace"));
        assert_eq!(db.level(), LogLevel::Trace);

        context.apply_level_config(&LevelConfig::parse("warn"));
        assert_eq!(db.level(), LogLevel::Warn);

        context.drop_logger("db");
        let db = context.create("db", || Ok(NullSink::new())).unwrap();
        assert_eq!(db.level(), LogLevel::Warn);
    }

    #[test]
    fn test_env_and_args_levels_combined() {
        let var = "RUST_SINK_LOGGER_TEST_REGISTRY_LEVELS";
        std::env::set_var(var, "db=trace");
        let config = LevelConfig::from_env_and_args(var, ["prog", "LOG_LEVEL=warn"]).unwrap();
        std::env::remove_var(var);

        let context = LoggingContext::empty();
        let db = context.create("db", || Ok(NullSink::new())).unwrap();
        let web = context.create("web", || Ok(NullSink::new())).unwrap();
        context.apply_level_config(&config);
        assert_eq!(db.level(), LogLevel::Trace);
        assert_eq!(web.level(), LogLevel::Warn);

        // A logger registered afterwards sees the same levels
        context.drop_logger("db");
        let db = context.create("db", || Ok(NullSink::new())).unwrap();
        let api = context.create("api", || Ok(NullSink::new())).unwrap();
        assert_eq!(db.level(), LogLevel::Trace);
        assert_eq!(api.level(), LogLevel::Warn);
    }

    #[test]
    fn test_new_default_logger_unregisters_previous() {
        let context = LoggingContext::empty();
        context.set_default_logger(Arc::new(Logger::new("old")));
        context.create("worker", || Ok(NullSink::new())).unwrap();

        let app = Arc::new(Logger::new("app"));
        context.set_default_logger(Arc::clone(&app));
        assert_eq!(context.logger_names(), vec!["app", "worker"]);
        assert!(Arc::ptr_eq(&context.default_logger().unwrap(), &app));

        context.set_default_logger(Arc::clone(&app));
        assert_eq!(context.logger_names(), vec!["app", "worker"]);
    }

    #[test]
    fn test_register_refreshes_default_slot() {
        let context = LoggingContext::empty();
        let first = Arc::new(Logger::new("main"));
        context.set_default_logger(Arc::clone(&first));

        let second = Arc::new(Logger::new("main"));
        let replaced = context.register(Arc::clone(&second)).unwrap();
        assert!(Arc::ptr_eq(&replaced, &first));
        assert!(Arc::ptr_eq(&context.default_logger().unwrap(), &second));

        // An unrelated name leaves the default alone
        context.register(Arc::new(Logger::new("other")));
        assert!(Arc::ptr_eq(&context.default_logger().unwrap(), &second));
    }

    #[test]
    fn test_error_handler_default_applies_to_new_loggers() {
        let context = LoggingContext::empty();
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = Arc::clone(&hits);
        context.set_error_handler(Arc::new(move |_, _| {
            hits_clone.fetch_add(1, Ordering::Relaxed);
        }));

        let logger = context.create("late", || Ok(NullSink::new())).unwrap();
        assert!(logger.has_error_handler());
    }

    #[test]
    fn test_shutdown_unregisters_everything() {
        let context = LoggingContext::empty();
        context
            .create_async("bg", || Ok(NullSink::new()), 64, OverflowPolicy::Block)
            .unwrap();
        context.create("fg", || Ok(NullSink::new())).unwrap();
        assert_eq!(context.logger_names(), vec!["bg", "fg"]);
        assert!(context.shutdown(Duration::from_secs(1)));
        assert!(context.logger_names().is_empty());
    }
}
