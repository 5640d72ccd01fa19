//! Chainforge Tools Library
//!
//! Resolves the configuration consumed by the contract build toolchain:
//! compiler settings, network endpoints, signing accounts, paths and block
//! explorer keys.

pub mod config;
pub mod env;
pub mod logging;
pub mod network;
pub mod overlay;
pub mod secrets;

pub use config::{ConfigError, ExportFormat, ToolchainConfig};
pub use env::Environment;
pub use network::Network;
pub use overlay::Overlay;
