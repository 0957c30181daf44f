//! Studio configuration.
//!
//! Sources, later wins: built-in defaults, an optional YAML file named by
//! `BPMN_FORMS_CONFIG`, then environment overrides:
//!   BPMN_FORMS_STORE_DIR   : JSON-file backend directory (unset: in-memory)
//!   BPMN_FORMS_LATENCY_MS  : artificial latency for every operation
//!   BPMN_FORMS_LINK_POLICY : `per_task` (default) or `per_process`
//!
//! ```yaml
//! backend:
//!   kind: json_file
//!   dir: ./data
//! latency:
//!   read_ms: 300
//!   write_ms: 500
//! link_policy: per_task
//! seed_defaults: true
//! ```

use crate::error::{Result, StudioError};
use crate::store::Latency;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

pub const ENV_CONFIG_FILE: &str = "BPMN_FORMS_CONFIG";
pub const ENV_STORE_DIR: &str = "BPMN_FORMS_STORE_DIR";
pub const ENV_LATENCY_MS: &str = "BPMN_FORMS_LATENCY_MS";
pub const ENV_LINK_POLICY: &str = "BPMN_FORMS_LINK_POLICY";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backend {
    #[default]
    Memory,
    JsonFile {
        dir: PathBuf,
    },
}

/// How integrations are keyed when a link is written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkPolicy {
    /// At most one integration per process; a new link replaces it.
    PerProcess,
    /// At most one integration per (process, task).
    #[default]
    PerTask,
}

impl FromStr for LinkPolicy {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per_process" | "per-process" | "process" => Ok(LinkPolicy::PerProcess),
            "per_task" | "per-task" | "task" => Ok(LinkPolicy::PerTask),
            other => Err(StudioError::Config(format!(
                "unknown link policy '{}', expected per_task or per_process",
                other
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencyConfig {
    #[serde(default)]
    pub read_ms: u64,
    #[serde(default)]
    pub write_ms: u64,
}

impl From<LatencyConfig> for Latency {
    fn from(c: LatencyConfig) -> Self {
        Latency::from_millis(c.read_ms, c.write_ms)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudioConfig {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub latency: LatencyConfig,
    #[serde(default)]
    pub link_policy: LinkPolicy,
    /// Seed one default process, form and link into empty collections.
    #[serde(default = "default_true")]
    pub seed_defaults: bool,
}

fn default_true() -> bool {
    true
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Memory,
            latency: LatencyConfig::default(),
            link_policy: LinkPolicy::default(),
            seed_defaults: true,
        }
    }
}

impl StudioConfig {
    /// In-memory backend with the delays of a remote API (300 ms reads, 500 ms writes).
    pub fn remote_like() -> Self {
        Self {
            latency: LatencyConfig {
                read_ms: 300,
                write_ms: 500,
            },
            ..Self::default()
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| StudioError::Config(e.to_string()))
    }

    /// Defaults, then the YAML file from `BPMN_FORMS_CONFIG`, then env overrides.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`StudioConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match lookup(ENV_CONFIG_FILE) {
            Some(path) => {
                let text = std::fs::read_to_string(&path)
                    .map_err(|e| StudioError::Config(format!("{}: {}", path, e)))?;
                Self::from_yaml_str(&text)?
            }
            None => Self::default(),
        };
        config.apply_overrides(lookup)?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(dir) = lookup(ENV_STORE_DIR).filter(|d| !d.trim().is_empty()) {
            self.backend = Backend::JsonFile {
                dir: PathBuf::from(dir),
            };
        }
        if let Some(ms) = lookup(ENV_LATENCY_MS) {
            let ms: u64 = ms.trim().parse().map_err(|_| {
                StudioError::Config(format!("{} must be an integer, got '{}'", ENV_LATENCY_MS, ms))
            })?;
            self.latency = LatencyConfig {
                read_ms: ms,
                write_ms: ms,
            };
        }
        if let Some(policy) = lookup(ENV_LINK_POLICY) {
            self.link_policy = policy.parse()?;
        }
        Ok(())
    }
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
    fn test_defaults() {
        let config = StudioConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, StudioConfig::default());
        assert_eq!(config.backend, Backend::Memory);
        assert_eq!(config.link_policy, LinkPolicy::PerTask);
        assert!(config.seed_defaults);
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
backend:
  kind: json_file
  dir: /tmp/studio
latency:
  read_ms: 300
  write_ms: 500
link_policy: per_process
seed_defaults: false
"#;
        let config = StudioConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(
            config.backend,
            Backend::JsonFile {
                dir: PathBuf::from("/tmp/studio")
            }
        );
        assert_eq!(Latency::from(config.latency), Latency::from_millis(300, 500));
        assert_eq!(config.link_policy, LinkPolicy::PerProcess);
        assert!(!config.seed_defaults);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = StudioConfig::from_yaml_str("link_policy: per_task\n").unwrap();
        assert_eq!(config.backend, Backend::Memory);
        assert!(config.seed_defaults);
    }

    #[test]
    fn test_env_overrides() {
        let config = StudioConfig::from_lookup(lookup_from(&[
            (ENV_STORE_DIR, "/var/lib/studio"),
            (ENV_LATENCY_MS, "250"),
            (ENV_LINK_POLICY, "per-process"),
        ]))
        .unwrap();
        assert_eq!(
            config.backend,
            Backend::JsonFile {
                dir: PathBuf::from("/var/lib/studio")
            }
        );
        assert_eq!(config.latency.read_ms, 250);
        assert_eq!(config.latency.write_ms, 250);
        assert_eq!(config.link_policy, LinkPolicy::PerProcess);
    }

    #[test]
    fn test_bad_values_are_config_errors() {
        let err = StudioConfig::from_lookup(lookup_from(&[(ENV_LATENCY_MS, "soon")])).unwrap_err();
        assert!(matches!(err, StudioError::Config(_)));

        let err = "sometimes".parse::<LinkPolicy>().unwrap_err();
        assert!(err.to_string().contains("unknown link policy"));

        assert!(StudioConfig::from_yaml_str("backend: [1, 2]").is_err());
    }

    #[test]
    fn test_yaml_file_then_env() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("studio.yaml");
        std::fs::write(&path, "link_policy: per_process\nlatency:\n  read_ms: 10\n").unwrap();
        let path = path.to_string_lossy().into_owned();

        let config = StudioConfig::from_lookup(lookup_from(&[
            (ENV_CONFIG_FILE, path.as_str()),
            (ENV_LINK_POLICY, "per_task"),
        ]))
        .unwrap();
        assert_eq!(config.latency.read_ms, 10);
        assert_eq!(config.link_policy, LinkPolicy::PerTask);
    }

    #[test]
    fn test_remote_like() {
        let config = StudioConfig::remote_like();
        assert_eq!(Latency::from(config.latency), Latency::from_millis(300, 500));
    }
}
