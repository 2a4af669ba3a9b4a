//! # Configuration
//!
//! Environment-driven settings for the reminder daemon. A `.env` file is
//! honoured when the binary loads it through `dotenvy` before calling
//! [`Config::from_env`].
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Name of the events directory placed next to the executable
pub const EVENT_DIRECTORY: &str = "Events";

/// How due events are presented to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    /// Interactive Delete/Keep prompt on the terminal
    Prompt,
    /// Log the event and keep the record
    Log,
}

impl SinkKind {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "prompt" => Ok(SinkKind::Prompt),
            "log" => Ok(SinkKind::Log),
            other => Err(anyhow::anyhow!(
                "Invalid REMEMBER_SINK '{}': expected 'prompt' or 'log'",
                other
            )),
        }
    }

    fn default_kind() -> Self {
        if cfg!(feature = "prompt") {
            SinkKind::Prompt
        } else {
            SinkKind::Log
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub events_dir: PathBuf,
    pub sink: SinkKind,
    pub log_level: String,
}

impl Config {
    /// Read configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let events_dir = match lookup("REMEMBER_EVENTS_DIR") {
            Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => default_events_dir()?,
        };

        let sink = match lookup("REMEMBER_SINK") {
            Some(value) => SinkKind::parse(&value)?,
            None => SinkKind::default_kind(),
        };

        if sink == SinkKind::Prompt && !cfg!(feature = "prompt") {
            return Err(anyhow::anyhow!(
                "REMEMBER_SINK=prompt requires building with the 'prompt' feature"
            ));
        }

        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        Ok(Config {
            events_dir,
            sink,
            log_level,
        })
    }
}

/// `Events` directory beside the running executable
fn default_events_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let parent = exe.parent().unwrap_or_else(|| Path::new("."));
    Ok(parent.join(EVENT_DIRECTORY))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_explicit_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("REMEMBER_EVENTS_DIR", "/tmp/events"),
            ("REMEMBER_SINK", "log"),
            ("LOG_LEVEL", "debug"),
        ]))
        .unwrap();

        assert_eq!(config.events_dir, PathBuf::from("/tmp/events"));
        assert_eq!(config.sink, SinkKind::Log);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();

        assert!(config.events_dir.ends_with(EVENT_DIRECTORY));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.sink, SinkKind::default_kind());
    }

    #[test]
    fn test_invalid_sink_rejected() {
        let result = Config::from_lookup(lookup_from(&[("REMEMBER_SINK", "email")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_sink_parse_is_case_insensitive() {
        assert_eq!(SinkKind::parse(" LOG ").unwrap(), SinkKind::Log);
        assert_eq!(SinkKind::parse("Prompt").unwrap(), SinkKind::Prompt);
    }
}
