//! Named secrets read from the environment

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::ConfigError;
use crate::env::Environment;
use crate::network::Network;

pub const PRIVATE_KEY: &str = "PRIVATE_KEY";
pub const INFURA_ID: &str = "INFURA_ID";

/// Block explorer key variables the toolchain recognises
pub const EXPLORER_KEY_VARS: [&str; 8] = [
    "ETHERSCAN_API_KEY",
    "POLYGONSCAN_API_KEY",
    "BSCSCAN_API_KEY",
    "LINEASCAN_API_KEY",
    "ARBISCAN_API_KEY",
    "SCROLLSCAN_API_KEY",
    "BERATRAILSCAN_API_KEY",
    "AMOYSCAN_API_KEY",
];

/// Secrets as found in the environment. Nothing here is required until
/// it is dereferenced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Secrets {
    pub private_key: Option<String>,
    pub infura_id: Option<String>,
    /// Explorer keys by variable name; unset variables are absent
    pub explorer_keys: BTreeMap<String, String>,
}

impl Secrets {
    pub fn from_env(env: &Environment) -> Self {
        let explorer_keys = EXPLORER_KEY_VARS
            .iter()
            .filter_map(|var| env.get(var).map(|v| (var.to_string(), v.to_string())))
            .collect();

        Self {
            private_key: env.get(PRIVATE_KEY).map(str::to_string),
            infura_id: env.get(INFURA_ID).map(str::to_string),
            explorer_keys,
        }
    }

    /// Read an additional explorer key that only an overlay network names
    pub fn read_extra_key(&mut self, env: &Environment, var: &str) {
        if let Some(value) = env.get(var) {
            self.explorer_keys.insert(var.to_string(), value.to_string());
        }
    }

    /// Signing accounts from the comma separated `PRIVATE_KEY`.
    ///
    /// Order is preserved. Fails when the variable is unset or holds no
    /// non-empty entry.
    pub fn signing_accounts(&self) -> Result<Vec<String>, ConfigError> {
        let raw = self
            .private_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingSecret(PRIVATE_KEY.to_string()))?;

        let accounts: Vec<String> = raw.split(',').map(str::to_string).collect();
        if accounts.iter().all(|a| a.trim().is_empty()) {
            return Err(ConfigError::MissingSecret(PRIVATE_KEY.to_string()));
        }
        Ok(accounts)
    }

    /// Provider id for RPC URLs, empty when unset
    pub fn provider_id(&self) -> &str {
        self.infura_id.as_deref().unwrap_or("")
    }

    pub fn explorer_key(&self, var: &str) -> Option<&str> {
        self.explorer_keys.get(var).map(String::as_str)
    }

    /// Explorer keys that were set but are not wired to any network in `used`
    pub fn unused_explorer_keys<'a>(&'a self, used: &[&str]) -> Vec<&'a str> {
        self.explorer_keys
            .keys()
            .map(String::as_str)
            .filter(|var| !used.contains(var))
            .collect()
    }

    /// Explorer API keys for the built-in networks
    pub fn builtin_explorer_keys(&self) -> BTreeMap<String, String> {
        let mut keys = BTreeMap::new();
        for network in Network::ALL {
            let Some(var) = network.explorer_key_var() else {
                continue;
            };
            match self.explorer_key(var) {
                Some(key) => {
                    keys.insert(network.as_str().to_string(), key.to_string());
                }
                None => debug!(%network, var, "explorer key not set"),
            }
        }
        keys
    }
}
