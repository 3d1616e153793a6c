//! Runtime configuration from environment variables.
//!
//! - `CARDIORISK_MODEL_DIR` (default `models`)
//! - `CARDIORISK_REQUIRE_MANIFEST` (default `false`)
//! - `CARDIORISK_LOG_MODE` = `file` | `stderr` | `auto` (default `auto`)
//! - `CARDIORISK_LOG_FILE` (default `cardiorisk.log`)
//!
//! Unparseable values fall back to the default with a warning.

use std::path::PathBuf;

/// Where log output goes. stdout is reserved for JSON responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    File,
    Stderr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub model_dir: PathBuf,
    pub require_manifest: bool,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            require_manifest: false,
            log_mode: LogMode::Stderr,
            log_file: PathBuf::from("cardiorisk.log"),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}

fn parse_log_mode(value: &str) -> Option<LogMode> {
    match value.trim() {
        "file" => Some(LogMode::File),
        "stderr" | "auto" => Some(LogMode::Stderr),
        _ => None,
    }
}

impl Config {
    /// Read the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(v) = lookup("CARDIORISK_MODEL_DIR") {
            if v.trim().is_empty() {
                tracing::warn!("CARDIORISK_MODEL_DIR is empty, using {:?}", cfg.model_dir);
            } else {
                cfg.model_dir = PathBuf::from(v.trim());
            }
        }

        if let Some(v) = lookup("CARDIORISK_REQUIRE_MANIFEST") {
            match parse_bool(&v) {
                Some(b) => cfg.require_manifest = b,
                None => tracing::warn!("Ignoring invalid CARDIORISK_REQUIRE_MANIFEST={v:?}"),
            }
        }

        if let Some(v) = lookup("CARDIORISK_LOG_MODE") {
            match parse_log_mode(&v) {
                Some(mode) => cfg.log_mode = mode,
                None => tracing::warn!("Ignoring invalid CARDIORISK_LOG_MODE={v:?}"),
            }
        }

        if let Some(v) = lookup("CARDIORISK_LOG_FILE") {
            if !v.trim().is_empty() {
                cfg.log_file = PathBuf::from(v.trim());
            }
        }

        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = from_pairs(&[]);
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.model_dir, PathBuf::from("models"));
        assert!(!cfg.require_manifest);
        assert_eq!(cfg.log_mode, LogMode::Stderr);
    }

    #[test]
    fn test_overrides() {
        let cfg = from_pairs(&[
            ("CARDIORISK_MODEL_DIR", "/srv/models"),
            ("CARDIORISK_REQUIRE_MANIFEST", "yes"),
            ("CARDIORISK_LOG_MODE", "file"),
            ("CARDIORISK_LOG_FILE", "/var/log/cardiorisk.log"),
        ]);
        assert_eq!(cfg.model_dir, PathBuf::from("/srv/models"));
        assert!(cfg.require_manifest);
        assert_eq!(cfg.log_mode, LogMode::File);
        assert_eq!(cfg.log_file, PathBuf::from("/var/log/cardiorisk.log"));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let cfg = from_pairs(&[
            ("CARDIORISK_MODEL_DIR", "  "),
            ("CARDIORISK_REQUIRE_MANIFEST", "maybe"),
            ("CARDIORISK_LOG_MODE", "syslog"),
        ]);
        assert_eq!(cfg, Config::default());
    }
}
