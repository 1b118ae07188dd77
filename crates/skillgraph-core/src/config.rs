//! Configuration for taxonomy lookup, skill suggestions, and report export.
//!
//! Load order: `.skillgraph/config.toml` → environment variables → defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = ".skillgraph";
const CONFIG_FILE: &str = "config.toml";

/// Top-level skillgraph configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillgraphConfig {
    pub taxonomy: TaxonomyConfig,
    pub advisor: AdvisorConfig,
    pub export: ExportConfig,
}

/// Where the taxonomy lives and how strictly it is loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxonomyConfig {
    /// Taxonomy YAML path. Relative paths resolve against the project root.
    pub path: PathBuf,
    /// Keep edges that reference undeclared nodes instead of rejecting the file.
    pub lenient: bool,
}

/// Skill suggestion defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Propagation depth used when `suggest` is called without `--depth`.
    pub depth: usize,
    /// Maximum number of suggestions printed. 0 means no limit.
    pub limit: usize,
}

/// HTML report and diagram defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub title: String,
    pub group_by_domain: bool,
    /// Override for the Mermaid script URL embedded in HTML reports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cdn_url: Option<String>,
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("taxonomy.yaml"),
            lenient: false,
        }
    }
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self { depth: 2, limit: 0 }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            title: "Knowledge Graph".to_string(),
            group_by_domain: true,
            cdn_url: None,
        }
    }
}

/// Helper to parse an env var and apply it to a config field.
fn env_override<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(v) = std::env::var(var)
        && let Ok(n) = v.parse()
    {
        *target = n;
    }
}

impl SkillgraphConfig {
    /// Path of the config file for a project root.
    pub fn config_path(project_root: &Path) -> PathBuf {
        project_root.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Load config from `.skillgraph/config.toml` in the project root, with env var
    /// overrides. Falls back to defaults if no config file exists.
    pub fn load(project_root: &Path) -> Result<Self> {
        let config_path = Self::config_path(project_root);

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read {}", config_path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("failed to parse {}", config_path.display()))?
        } else {
            Self::default()
        };

        env_override("SKILLGRAPH_TAXONOMY", &mut config.taxonomy.path);
        env_override("SKILLGRAPH_DEPTH", &mut config.advisor.depth);
        env_override("SKILLGRAPH_LIMIT", &mut config.advisor.limit);

        if config.taxonomy.path.as_os_str().is_empty() {
            anyhow::bail!("taxonomy.path must not be empty");
        }

        Ok(config)
    }

    /// The taxonomy path, resolved against `project_root` when relative.
    pub fn taxonomy_path(&self, project_root: &Path) -> PathBuf {
        if self.taxonomy.path.is_absolute() {
            self.taxonomy.path.clone()
        } else {
            project_root.join(&self.taxonomy.path)
        }
    }
}
