//! Optional `chainforge.toml` layer applied over the built-in declarations
//!
//! The overlay can add networks, register custom explorer chains, append
//! artifact globs and override individual paths. It cannot redeclare a
//! built-in network or change compiler settings.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::config::{ConfigError, CustomChain};

/// Default overlay file name, looked up in the working directory
pub const DEFAULT_OVERLAY_FILE: &str = "chainforge.toml";

/// Extra network declared in the overlay
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NetworkProfile {
    pub rpc_url: String,
    pub chain_id: u64,
    /// Attach the `PRIVATE_KEY` accounts to this network
    #[serde(default)]
    pub signing: bool,
    /// Environment variable holding this network's explorer key
    #[serde(default)]
    pub explorer_key_var: Option<String>,
}

/// Per-field path overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PathOverrides {
    pub sources: Option<String>,
    pub tests: Option<String>,
    pub cache: Option<String>,
    pub artifacts: Option<String>,
}

/// Parsed overlay file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Overlay {
    #[serde(default)]
    pub external_artifacts: Vec<String>,
    #[serde(default)]
    pub paths: PathOverrides,
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkProfile>,
    #[serde(default)]
    pub custom_chains: Vec<CustomChain>,
}

impl Overlay {
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::TomlError)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "reading overlay");
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load `chainforge.toml` from the working directory if it exists
    pub fn discover() -> Result<Option<Self>, ConfigError> {
        Self::discover_in(Path::new("."))
    }

    pub fn discover_in(dir: &Path) -> Result<Option<Self>, ConfigError> {
        let path = dir.join(DEFAULT_OVERLAY_FILE);
        if path.exists() {
            Self::from_file(&path).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Explorer key variables referenced by overlay networks
    pub fn explorer_key_vars(&self) -> impl Iterator<Item = &str> {
        self.networks
            .values()
            .filter_map(|profile| profile.explorer_key_var.as_deref())
    }
}
