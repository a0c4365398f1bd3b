//! Logger levels loaded from the environment, the command line or config files
//!
//! The textual form is a comma separated list: a bare level sets the global
//! level, `name=level` overrides a single logger.
//!
//! ```
//! use rust_sink_logger::{LevelConfig, LogLevel};
//!
//! let config = LevelConfig::parse("info,db=off,net=trace");
//! assert_eq!(config.global, Some(LogLevel::Info));
//! assert_eq!(config.level_for("db"), Some(LogLevel::Off));
//! assert_eq!(config.level_for("web"), Some(LogLevel::Info));
//! ```

use super::log_level::LogLevel;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Environment variable and argument prefix read by default
pub const DEFAULT_LEVEL_ENV: &str = "LOG_LEVEL";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelConfig {
    #[serde(default)]
    pub global: Option<LogLevel>,
    #[serde(default)]
    pub loggers: HashMap<String, LogLevel>,
}

impl LevelConfig {
    /// Parse `info,app=trace,db=off`
    ///
    /// Entries that do not name a valid level are skipped. Later entries win.
    #[must_use]
    pub fn parse(directives: &str) -> Self {
        let mut config = Self::default();
        for entry in directives.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            match entry.split_once('=') {
                Some((name, level)) => {
                    let name = name.trim();
                    if name.is_empty() {
                        continue;
                    }
                    if let Ok(level) = level.parse() {
                        config.loggers.insert(name.to_string(), level);
                    }
                }
                None => {
                    if let Ok(level) = entry.parse() {
                        config.global = Some(level);
                    }
                }
            }
        }
        config
    }

    /// Read levels from the environment variable `var`
    ///
    /// Returns `None` when the variable is unset or not valid unicode.
    #[must_use]
    pub fn from_env(var: &str) -> Option<Self> {
        std::env::var(var).ok().map(|value| Self::parse(&value))
    }

    /// Read levels from `LOG_LEVEL`
    #[must_use]
    pub fn from_default_env() -> Option<Self> {
        Self::from_env(DEFAULT_LEVEL_ENV)
    }

    /// Read levels from an argument of the form `LOG_LEVEL=...`
    ///
    /// Typically called with `std::env::args()`; the last matching argument wins.
    #[must_use]
    pub fn from_args<I, S>(args: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let prefix = format!("{}=", DEFAULT_LEVEL_ENV);
        args.into_iter()
            .filter_map(|arg| arg.as_ref().strip_prefix(prefix.as_str()).map(Self::parse))
            .last()
    }

    /// Levels from the environment variable `var`, overlaid with a
    /// `LOG_LEVEL=` argument from `args`
    #[must_use]
    pub fn from_env_and_args<I, S>(var: &str, args: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        match (Self::from_env(var), Self::from_args(args)) {
            (Some(mut env), Some(args)) => {
                env.merge(args);
                Some(env)
            }
            (env, args) => env.or(args),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.global.is_none() && self.loggers.is_empty()
    }

    /// Level for the named logger: its override, else the global level
    #[must_use]
    pub fn level_for(&self, name: &str) -> Option<LogLevel> {
        self.loggers.get(name).copied().or(self.global)
    }

    /// Overlay `other` on top of `self`; `other` wins on conflicts
    pub fn merge(&mut self, other: LevelConfig) {
        if other.global.is_some() {
            self.global = other.global;
        }
        self.loggers.extend(other.loggers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_and_overrides() {
        let config = LevelConfig::parse("warn, app=trace ,db=off");
        assert_eq!(config.global, Some(LogLevel::Warn));
        assert_eq!(config.loggers.len(), 2);
        assert_eq!(config.level_for("app"), Some(LogLevel::Trace));
        assert_eq!(config.level_for("db"), Some(LogLevel::Off));
        assert_eq!(config.level_for("other"), Some(LogLevel::Warn));
    }

    #[test]
    fn test_parse_skips_invalid_entries() {
        let config = LevelConfig::parse("loud,app=verbose,=info,,net=err");
        assert_eq!(config.global, None);
        assert_eq!(config.loggers.len(), 1);
        assert_eq!(config.level_for("net"), Some(LogLevel::Error));
        assert_eq!(config.level_for("app"), None);
    }

    #[test]
    fn test_parse_empty() {
        assert!(LevelConfig::parse("").is_empty());
        assert!(LevelConfig::parse(" , ,").is_empty());
    }

    #[test]
    fn test_later_entries_win() {
        let config = LevelConfig::parse("info,debug,a=warn,a=error");
        assert_eq!(config.global, Some(LogLevel::Debug));
        assert_eq!(config.level_for("a"), Some(LogLevel::Error));
    }

    #[test]
    fn test_from_env() {
        let var = "RUST_SINK_LOGGER_TEST_LEVELS";
        std::env::set_var(var, "error,io=debug");
        let config = LevelConfig::from_env(var).unwrap();
        assert_eq!(config.global, Some(LogLevel::Error));
        assert_eq!(config.level_for("io"), Some(LogLevel::Debug));
        std::env::remove_var(var);
        assert!(LevelConfig::from_env(var).is_none());
    }

    #[test]
    fn test_from_args() {
        let args = ["prog", "--verbose", "LOG_LEVEL=critical,ui=info"];
        let config = LevelConfig::from_args(args).unwrap();
        assert_eq!(config.global, Some(LogLevel::Critical));
        assert_eq!(config.level_for("ui"), Some(LogLevel::Info));

        assert!(LevelConfig::from_args(["prog", "--quiet"]).is_none());
    }

    #[test]
    fn test_env_overlaid_with_args() {
        let var = "RUST_SINK_LOGGER_TEST_OVERLAY";
        std::env::set_var(var, "info,db=trace,net=debug");
        let config =
            LevelConfig::from_env_and_args(var, ["prog", "LOG_LEVEL=warn,net=error"]).unwrap();
        assert_eq!(config.global, Some(LogLevel::Warn));
        assert_eq!(config.level_for("db"), Some(LogLevel::Trace));
        assert_eq!(config.level_for("net"), Some(LogLevel::Error));

        let env_only = LevelConfig::from_env_and_args(var, ["prog"]).unwrap();
        assert_eq!(env_only.global, Some(LogLevel::Info));
        std::env::remove_var(var);

        assert!(LevelConfig::from_env_and_args(var, ["prog"]).is_none());
        let args_only = LevelConfig::from_env_and_args(var, ["LOG_LEVEL=off"]).unwrap();
        assert_eq!(args_only.global, Some(LogLevel::Off));
    }

    #[test]
    fn test_merge_prefers_other() {
        let mut base = LevelConfig::parse("info,a=debug,b=warn");
        base.merge(LevelConfig::parse("b=error,c=trace"));
        assert_eq!(base.global, Some(LogLevel::Info));
        assert_eq!(base.level_for("a"), Some(LogLevel::Debug));
        assert_eq!(base.level_for("b"), Some(LogLevel::Error));
        assert_eq!(base.level_for("c"), Some(LogLevel::Trace));
    }

    #[test]
    fn test_deserialize() {
        let config: LevelConfig =
            serde_json::from_str(r#"{"global":"warn","loggers":{"db":"trace"}}"#).unwrap();
        assert_eq!(config.global, Some(LogLevel::Warn));
        assert_eq!(config.level_for("db"), Some(LogLevel::Trace));

        let empty: LevelConfig = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }
}
