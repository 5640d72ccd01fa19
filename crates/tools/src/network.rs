//! Statically declared EVM networks

use std::fmt;

use crate::config::ConfigError;

/// Networks known to the toolchain without any overlay file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Network {
    /// In-process development chain
    Hardhat,
    /// Ethereum mainnet
    Ethereum,
    /// Polygon PoS mainnet
    Polygon,
    /// Ethereum Sepolia testnet
    Sepolia,
}

impl Network {
    /// Every built-in network, in declaration order
    pub const ALL: [Network; 4] = [
        Network::Hardhat,
        Network::Ethereum,
        Network::Polygon,
        Network::Sepolia,
    ];

    /// Get network as string
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Hardhat => "hardhat",
            Network::Ethereum => "ethereum",
            Network::Polygon => "polygon",
            Network::Sepolia => "sepolia",
        }
    }

    /// Parse network from string
    pub fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "hardhat" => Ok(Network::Hardhat),
            "ethereum" => Ok(Network::Ethereum),
            "polygon" => Ok(Network::Polygon),
            "sepolia" => Ok(Network::Sepolia),
            other => Err(ConfigError::InvalidNetwork(other.to_string())),
        }
    }

    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Hardhat => 31337,
            Network::Ethereum => 1,
            Network::Polygon => 137,
            Network::Sepolia => 11_155_111,
        }
    }

    /// RPC host prefix; the provider id is appended verbatim.
    /// `None` for the in-process chain.
    pub fn rpc_host(&self) -> Option<&'static str> {
        match self {
            Network::Hardhat => None,
            Network::Ethereum => Some("https://mainnet.infura.io/v3/"),
            Network::Polygon => Some("https://polygon-mainnet.infura.io/v3/"),
            Network::Sepolia => Some("https://sepolia.infura.io/v3/"),
        }
    }

    /// Whether deployments to this network need signing accounts
    pub fn requires_signing(&self) -> bool {
        !matches!(self, Network::Hardhat)
    }

    /// Environment variable holding the block explorer key for this network
    pub fn explorer_key_var(&self) -> Option<&'static str> {
        match self {
            Network::Hardhat => None,
            Network::Ethereum | Network::Sepolia => Some("ETHERSCAN_API_KEY"),
            Network::Polygon => Some("POLYGONSCAN_API_KEY"),
        }
    }

    /// Build the RPC URL for a provider id. No validation of the id.
    pub fn rpc_url(&self, provider_id: &str) -> Option<String> {
        self.rpc_host().map(|host| format!("{}{}", host, provider_id))
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
