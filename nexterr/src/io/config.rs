//! Navigator configuration stored in `nexterr.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::filter::{DEFAULT_MESSAGE_NOISE, DEFAULT_PATH_NOISE, Filter};

/// Navigator configuration (TOML).
///
/// Missing fields default to the values the CLI uses without a config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NexterrConfig {
    /// Fallback refresh period when no change notification arrives.
    pub refresh_interval_secs: u64,

    /// Polling period of the filesystem watcher backend.
    pub poll_interval_ms: u64,

    /// Truncate captured tool stdout/stderr beyond this many bytes per stream.
    pub output_limit_bytes: usize,

    pub filter: FilterConfig,

    pub markers: MarkerConfig,

    pub commands: CommandOverrides,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FilterConfig {
    /// Diagnostics whose file contains any of these are dropped.
    pub path_noise: Vec<String>,
    /// Diagnostics whose message contains any of these are dropped.
    pub message_noise: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            path_noise: DEFAULT_PATH_NOISE.iter().map(|s| s.to_string()).collect(),
            message_noise: DEFAULT_MESSAGE_NOISE.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl FilterConfig {
    pub fn to_filter(&self) -> Filter {
        Filter::new(self.path_noise.clone(), self.message_noise.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MarkerConfig {
    /// Directory scanned for markers, relative to the working directory.
    pub root: PathBuf,
    /// File-name suffixes eligible for scanning (e.g. `[".go"]`).
    pub extensions: Vec<String>,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            extensions: vec![".go".to_string()],
        }
    }
}

/// Per-mode argv replacing the built-in Go commands.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CommandOverrides {
    pub build: Option<Vec<String>>,
    pub test: Option<Vec<String>>,
    /// May contain `{pattern}`, replaced by `--run`.
    pub run_test: Option<Vec<String>>,
    pub analysis: Option<Vec<String>>,
}

impl Default for NexterrConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 5,
            poll_interval_ms: 250,
            output_limit_bytes: 1_000_000,
            filter: FilterConfig::default(),
            markers: MarkerConfig::default(),
            commands: CommandOverrides::default(),
        }
    }
}

impl NexterrConfig {
    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval_secs == 0 {
            return Err(anyhow!("refresh_interval_secs must be > 0"));
        }
        if self.poll_interval_ms == 0 {
            return Err(anyhow!("poll_interval_ms must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        if self.markers.extensions.is_empty() {
            return Err(anyhow!("markers.extensions must be a non-empty array"));
        }
        let overrides = [
            ("build", &self.commands.build),
            ("test", &self.commands.test),
            ("run_test", &self.commands.run_test),
            ("analysis", &self.commands.analysis),
        ];
        for (name, argv) in overrides {
            if let Some(argv) = argv
                && (argv.is_empty() || argv[0].trim().is_empty())
            {
                return Err(anyhow!("commands.{name} must be a non-empty array"));
            }
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `NexterrConfig::default()`.
pub fn load_config(path: &Path) -> Result<NexterrConfig> {
    if !path.exists() {
        let cfg = NexterrConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: NexterrConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, NexterrConfig::default());
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("nexterr.toml");
        fs::write(
            &path,
            "refresh_interval_secs = 2\n\n[commands]\ntest = [\"go\", \"test\", \"-short\", \"./...\"]\n",
        )
        .expect("write");

        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.refresh_interval_secs, 2);
        assert_eq!(cfg.poll_interval_ms, 250);
        assert_eq!(cfg.filter, FilterConfig::default());
        let expected: Vec<String> = ["go", "test", "-short", "./..."]
            .iter()
            .map(|arg| arg.to_string())
            .collect();
        assert_eq!(cfg.commands.test, Some(expected));
    }

    #[test]
    fn zero_refresh_interval_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("nexterr.toml");
        fs::write(&path, "refresh_interval_secs = 0\n").expect("write");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("refresh_interval_secs"));
    }

    #[test]
    fn empty_command_override_is_rejected() {
        let cfg = NexterrConfig {
            commands: CommandOverrides {
                build: Some(Vec::new()),
                ..CommandOverrides::default()
            },
            ..NexterrConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("commands.build"));
    }
}
