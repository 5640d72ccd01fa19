//! Multi-network toolchain configuration
//!
//! This module assembles the single configuration record handed to the
//! external contract build tool. Configuration is resolved in order:
//!
//! 1. Built-in network, compiler and path declarations
//! 2. Secrets from the injected [`Environment`] (process env + `.env`)
//! 3. Optional `chainforge.toml` overlay
//! 4. Validation
//!
//! # Examples
//!
//! ```rust,no_run
//! use chainforge_tools::{Environment, ToolchainConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let env = Environment::from_process_with_dotenv(None)?;
//! let config = ToolchainConfig::load(&env)?;
//! println!("{}", config.to_json()?);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::env::Environment;
use crate::network::Network;
use crate::overlay::Overlay;
use crate::secrets::{Secrets, INFURA_ID};

pub const SOLC_VERSION: &str = "0.8.19";
pub const OPTIMIZER_RUNS: u32 = 200;
pub const DEFAULT_ARTIFACT_GLOB: &str = "./abi/*.json";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required secret: {0} is not set")]
    MissingSecret(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Dotenv error: {0}")]
    Dotenv(#[from] dotenvy::Error),

    #[error("Unknown network: {0}")]
    InvalidNetwork(String),

    #[error("Network '{0}' is already declared")]
    DuplicateNetwork(String),

    #[error("Chain id {chain_id} is used by both '{first}' and '{second}'")]
    DuplicateChainId {
        chain_id: u64,
        first: String,
        second: String,
    },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Solidity compiler settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerSettings {
    pub version: String,
    pub optimizer_enabled: bool,
    pub optimizer_runs: u32,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            version: SOLC_VERSION.to_string(),
            optimizer_enabled: true,
            optimizer_runs: OPTIMIZER_RUNS,
        }
    }
}

impl Serialize for CompilerSettings {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        #[derive(Serialize)]
        struct Optimizer {
            enabled: bool,
            runs: u32,
        }

        #[derive(Serialize)]
        struct Settings {
            optimizer: Optimizer,
        }

        #[derive(Serialize)]
        struct Solidity<'a> {
            version: &'a str,
            settings: Settings,
        }

        Solidity {
            version: &self.version,
            settings: Settings {
                optimizer: Optimizer {
                    enabled: self.optimizer_enabled,
                    runs: self.optimizer_runs,
                },
            },
        }
        .serialize(serializer)
    }
}

/// Connection descriptor for one network
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    /// `None` for the in-process chain
    #[serde(rename = "url", skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub accounts: Vec<String>,
    pub chain_id: u64,
}

/// Directory roles used by the build tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    pub sources: String,
    pub tests: String,
    pub cache: String,
    pub artifacts: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            sources: "./contracts".to_string(),
            tests: "./test".to_string(),
            cache: "./cache".to_string(),
            artifacts: "./artifacts".to_string(),
        }
    }
}

/// Explorer chain unknown to the verification plugin
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CustomChain {
    pub network: String,
    pub chain_id: u64,
    pub api_url: String,
    pub browser_url: String,
}

// Output nests the two URLs under `urls`, input keeps them flat
impl Serialize for CustomChain {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        #[derive(Serialize)]
        struct Urls<'a> {
            #[serde(rename = "apiURL")]
            api_url: &'a str,
            #[serde(rename = "browserURL")]
            browser_url: &'a str,
        }

        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("network", &self.network)?;
        map.serialize_entry("chainId", &self.chain_id)?;
        map.serialize_entry(
            "urls",
            &Urls {
                api_url: &self.api_url,
                browser_url: &self.browser_url,
            },
        )?;
        map.end()
    }
}

/// Output formats for [`ToolchainConfig::render`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Toml,
}

/// Resolved toolchain configuration. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainConfig {
    pub compiler: CompilerSettings,
    /// Connection descriptors keyed by network name
    pub networks: BTreeMap<String, NetworkConfig>,
    pub paths: PathsConfig,
    /// Explorer API keys keyed by network name
    pub explorer_api_keys: BTreeMap<String, String>,
    pub custom_chains: Vec<CustomChain>,
    /// Globs for out-of-tree ABI definitions
    pub external_artifacts: Vec<String>,
}

impl ToolchainConfig {
    /// Load the built-in configuration from an environment snapshot
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingSecret` if `PRIVATE_KEY` is unset or
    /// empty, since every remote network signs with it.
    pub fn load(env: &Environment) -> Result<Self, ConfigError> {
        Self::load_with_overlay(env, None)
    }

    /// Load configuration and apply an optional overlay
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - A required secret is missing
    /// - The overlay redeclares a network or reuses a chain id
    /// - An overlay URL is not http(s)
    pub fn load_with_overlay(
        env: &Environment,
        overlay: Option<&Overlay>,
    ) -> Result<Self, ConfigError> {
        let mut secrets = Secrets::from_env(env);
        if let Some(overlay) = overlay {
            for var in overlay.explorer_key_vars() {
                secrets.read_extra_key(env, var);
            }
        }

        if secrets.infura_id.is_none() {
            warn!(var = INFURA_ID, "provider id not set, RPC URLs will be incomplete");
        }

        let mut networks = BTreeMap::new();
        for network in Network::ALL {
            let accounts = if network.requires_signing() {
                secrets.signing_accounts()?
            } else {
                Vec::new()
            };
            networks.insert(
                network.as_str().to_string(),
                NetworkConfig {
                    rpc_url: network.rpc_url(secrets.provider_id()),
                    accounts,
                    chain_id: network.chain_id(),
                },
            );
        }

        let mut config = ToolchainConfig {
            compiler: CompilerSettings::default(),
            networks,
            paths: PathsConfig::default(),
            explorer_api_keys: secrets.builtin_explorer_keys(),
            custom_chains: Vec::new(),
            external_artifacts: vec![DEFAULT_ARTIFACT_GLOB.to_string()],
        };

        let mut used_vars: Vec<&str> = Network::ALL
            .iter()
            .filter_map(|n| n.explorer_key_var())
            .collect();

        if let Some(overlay) = overlay {
            config.apply_overlay(overlay, &secrets)?;
            used_vars.extend(overlay.explorer_key_vars());
        }

        for var in secrets.unused_explorer_keys(&used_vars) {
            debug!(var, "explorer key set but no declared network uses it");
        }

        config.validate()?;

        info!(
            networks = config.networks.len(),
            explorer_keys = config.explorer_api_keys.len(),
            "toolchain configuration loaded"
        );
        Ok(config)
    }

    /// Resolve from the process: environment plus `.env`, then the overlay
    /// at `overlay_file` or `chainforge.toml` if present
    pub fn discover(
        env_file: Option<&Path>,
        overlay_file: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let env = Environment::from_process_with_dotenv(env_file)?;
        let overlay = match overlay_file {
            Some(path) => Some(Overlay::from_file(path)?),
            None => Overlay::discover()?,
        };
        Self::load_with_overlay(&env, overlay.as_ref())
    }

    fn apply_overlay(&mut self, overlay: &Overlay, secrets: &Secrets) -> Result<(), ConfigError> {
        let paths = &overlay.paths;
        if let Some(sources) = &paths.sources {
            self.paths.sources = sources.clone();
        }
        if let Some(tests) = &paths.tests {
            self.paths.tests = tests.clone();
        }
        if let Some(cache) = &paths.cache {
            self.paths.cache = cache.clone();
        }
        if let Some(artifacts) = &paths.artifacts {
            self.paths.artifacts = artifacts.clone();
        }

        for (name, profile) in &overlay.networks {
            if self.networks.contains_key(name) {
                return Err(ConfigError::DuplicateNetwork(name.clone()));
            }
            Self::validate_url(&format!("networks.{}.rpc_url", name), &profile.rpc_url)?;

            let accounts = if profile.signing {
                secrets.signing_accounts()?
            } else {
                Vec::new()
            };
            self.networks.insert(
                name.clone(),
                NetworkConfig {
                    rpc_url: Some(profile.rpc_url.clone()),
                    accounts,
                    chain_id: profile.chain_id,
                },
            );

            if let Some(key) = profile
                .explorer_key_var
                .as_deref()
                .and_then(|var| secrets.explorer_key(var))
            {
                self.explorer_api_keys.insert(name.clone(), key.to_string());
            }
        }

        self.custom_chains.extend(overlay.custom_chains.iter().cloned());

        for glob in &overlay.external_artifacts {
            if !self.external_artifacts.contains(glob) {
                self.external_artifacts.push(glob.clone());
            }
        }

        Ok(())
    }

    /// Check invariants that overlays can break
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen: HashMap<u64, &str> = HashMap::new();
        for (name, network) in &self.networks {
            if let Some(first) = seen.insert(network.chain_id, name.as_str()) {
                return Err(ConfigError::DuplicateChainId {
                    chain_id: network.chain_id,
                    first: first.to_string(),
                    second: name.clone(),
                });
            }
        }

        for (role, dir) in [
            ("sources", &self.paths.sources),
            ("tests", &self.paths.tests),
            ("cache", &self.paths.cache),
            ("artifacts", &self.paths.artifacts),
        ] {
            if dir.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "paths.{} cannot be empty",
                    role
                )));
            }
        }

        for chain in &self.custom_chains {
            Self::validate_url("custom_chains.api_url", &chain.api_url)?;
            Self::validate_url("custom_chains.browser_url", &chain.browser_url)?;
        }

        Ok(())
    }

    fn validate_url(field: &str, url: &str) -> Result<(), ConfigError> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::ValidationError(format!(
                "{} must start with http:// or https://: {}",
                field, url
            )));
        }
        Ok(())
    }

    /// Human readable summary with secrets redacted
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "╔════════════════════════════════════════════════════════════════╗".to_string(),
            "║         TOOLCHAIN CONFIGURATION RESOLVED                       ║".to_string(),
            "╚════════════════════════════════════════════════════════════════╝".to_string(),
            format!(
                "  Compiler:            solc {} (optimizer {}, {} runs)",
                self.compiler.version,
                if self.compiler.optimizer_enabled { "on" } else { "off" },
                self.compiler.optimizer_runs
            ),
        ];

        for (name, network) in &self.networks {
            lines.push(format!("  Network {:<12} chain id {}", name, network.chain_id));
            if let Some(url) = &network.rpc_url {
                lines.push(format!("    RPC URL:           {}", redact_url(url)));
            }
            if !network.accounts.is_empty() {
                let accounts: Vec<String> = network.accounts.iter().map(|a| redact(a)).collect();
                lines.push(format!("    Accounts:          {}", accounts.join(", ")));
            }
        }

        if self.explorer_api_keys.is_empty() {
            lines.push("  Explorer keys:       (not configured)".to_string());
        } else {
            for (name, key) in &self.explorer_api_keys {
                lines.push(format!("  Explorer key:        {} = {}", name, redact(key)));
            }
        }

        lines.push(format!(
            "  Paths:               sources={} tests={} cache={} artifacts={}",
            self.paths.sources, self.paths.tests, self.paths.cache, self.paths.artifacts
        ));
        lines.push(format!(
            "  External artifacts:  {}",
            self.external_artifacts.join(", ")
        ));
        if !self.custom_chains.is_empty() {
            lines.push(format!("  Custom chains:       {}", self.custom_chains.len()));
        }
        lines.push("╚════════════════════════════════════════════════════════════════╝".to_string());

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    /// Look up a network by name. Built-in names match case-insensitively.
    pub fn network(&self, name: &str) -> Result<&NetworkConfig, ConfigError> {
        let key = Network::from_str(name)
            .map(|network| network.as_str().to_string())
            .unwrap_or_else(|_| name.to_string());
        self.networks
            .get(&key)
            .ok_or_else(|| ConfigError::InvalidNetwork(name.to_string()))
    }

    /// Print the resolved configuration
    pub fn print_summary(&self) {
        print!("{}", self.summary());
    }

    /// Get configuration as JSON in the build tool's schema
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn render(&self, format: ExportFormat) -> Result<String, ConfigError> {
        Ok(match format {
            ExportFormat::Json => self.to_json()?,
            ExportFormat::Toml => self.to_toml()?,
        })
    }
}

// Manual Serialize impl since the build tool expects its own field names
impl Serialize for ToolchainConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Etherscan<'a> {
            api_key: &'a BTreeMap<String, String>,
            custom_chains: &'a [CustomChain],
        }

        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Typechain<'a> {
            external_artifacts: &'a [String],
        }

        let mut map = serializer.serialize_map(Some(5))?;
        map.serialize_entry("solidity", &self.compiler)?;
        map.serialize_entry("networks", &self.networks)?;
        map.serialize_entry("paths", &self.paths)?;
        map.serialize_entry(
            "etherscan",
            &Etherscan {
                api_key: &self.explorer_api_keys,
                custom_chains: &self.custom_chains,
            },
        )?;
        map.serialize_entry(
            "typechain",
            &Typechain {
                external_artifacts: &self.external_artifacts,
            },
        )?;
        map.end()
    }
}

/// Keep a short prefix of a secret for recognition, mask the rest
pub fn redact(secret: &str) -> String {
    let prefix: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("{}****", prefix)
    }
}

/// Mask the last path segment of a URL, where providers put project ids
pub fn redact_url(url: &str) -> String {
    let host_start = url.find("://").map(|i| i + 3).unwrap_or(0);
    let Some(path_start) = url[host_start..].find('/').map(|i| host_start + i) else {
        return url.to_string();
    };
    let split = url[path_start..]
        .rfind('/')
        .map(|i| path_start + i + 1)
        .unwrap_or(path_start);
    let tail = &url[split..];
    if tail.is_empty() {
        url.to_string()
    } else {
        format!("{}{}", &url[..split], redact(tail))
    }
}
