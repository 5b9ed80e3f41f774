//! Ledger settings resolution.
//!
//! # Data Flow
//! ```text
//! settings file (flat TOML) / environment
//!     → store.rs (key-value lookup, re-read on every call)
//!     → resolver.rs (presence checks, gas limit default)
//!     → LedgerConfig (per operation, never cached)
//! ```
//!
//! # Security Constraints
//! - The signer key is never logged; `LedgerConfig`'s Debug output redacts it
//! - Prefer supplying the signer key through the environment, not the file

pub mod resolver;
pub mod store;

pub use resolver::{
    ConfigProvider, ConfigurationError, LedgerConfig, SettingsResolver, DEFAULT_GAS_LIMIT,
};
pub use store::{EnvSettings, FileSettings, LayeredSettings, MemorySettings, SettingsStore};

/// Setting key for the JSON-RPC endpoint URL.
pub const KEY_RPC_URL: &str = "ledger.rpc_url";
/// Setting key for the deployed registry contract address.
pub const KEY_CONTRACT_ADDRESS: &str = "ledger.contract_address";
/// Setting key for the hex-encoded signer private key.
pub const KEY_SIGNER_KEY: &str = "ledger.signer_key";
/// Setting key for the per-transaction gas limit.
pub const KEY_GAS_LIMIT: &str = "ledger.gas_limit";
