//! Resolve the ledger credentials needed for one operation.

use std::sync::Arc;
use thiserror::Error;

use crate::settings::store::SettingsStore;
use crate::settings::{KEY_CONTRACT_ADDRESS, KEY_GAS_LIMIT, KEY_RPC_URL, KEY_SIGNER_KEY};

/// Gas limit used when none is configured.
pub const DEFAULT_GAS_LIMIT: u64 = 200_000;

/// Problems with the ledger settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// One or more required settings are absent or empty.
    #[error("Blockchain configuration is missing: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    /// The gas limit is present but not a positive integer.
    #[error("Blockchain configuration has an invalid gas limit: '{0}'")]
    InvalidGasLimit(String),
}

/// Ledger credentials for a single issuance or revocation.
#[derive(Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub rpc_url: String,
    pub contract_address: String,
    pub signer_key: String,
    pub gas_limit: u64,
}

impl std::fmt::Debug for LedgerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerConfig")
            .field("rpc_url", &self.rpc_url)
            .field("contract_address", &self.contract_address)
            .field("signer_key", &"<redacted>")
            .field("gas_limit", &self.gas_limit)
            .finish()
    }
}

/// Source of ledger credentials, consulted once per operation.
pub trait ConfigProvider: Send + Sync {
    fn resolve(&self) -> Result<LedgerConfig, ConfigurationError>;
}

/// `ConfigProvider` backed by a key-value settings store.
#[derive(Clone)]
pub struct SettingsResolver {
    store: Arc<dyn SettingsStore>,
}

impl SettingsResolver {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    fn non_empty(&self, key: &str) -> Option<String> {
        self.store
            .get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

impl ConfigProvider for SettingsResolver {
    fn resolve(&self) -> Result<LedgerConfig, ConfigurationError> {
        let rpc_url = self.non_empty(KEY_RPC_URL);
        let contract_address = self.non_empty(KEY_CONTRACT_ADDRESS);
        let signer_key = self.non_empty(KEY_SIGNER_KEY);

        let (rpc_url, contract_address, signer_key) = match (rpc_url, contract_address, signer_key) {
            (Some(url), Some(address), Some(key)) => (url, address, key),
            (url, address, key) => {
                let mut missing = Vec::new();
                if url.is_none() {
                    missing.push(KEY_RPC_URL);
                }
                if address.is_none() {
                    missing.push(KEY_CONTRACT_ADDRESS);
                }
                if key.is_none() {
                    missing.push(KEY_SIGNER_KEY);
                }
                return Err(ConfigurationError::Missing(missing));
            }
        };

        let gas_limit = match self.non_empty(KEY_GAS_LIMIT) {
            None => DEFAULT_GAS_LIMIT,
            Some(raw) => match raw.parse::<u64>() {
                Ok(limit) if limit > 0 => limit,
                _ => return Err(ConfigurationError::InvalidGasLimit(raw)),
            },
        };

        Ok(LedgerConfig {
            rpc_url,
            contract_address,
            signer_key,
            gas_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemorySettings;

    fn complete_settings() -> MemorySettings {
        let store = MemorySettings::new();
        store.set(KEY_RPC_URL, "http://127.0.0.1:8545");
        store.set(KEY_CONTRACT_ADDRESS, "0x5FbDB2315678afecb367f032d93F642f64180aa3");
        store.set(
            KEY_SIGNER_KEY,
            "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        );
        store
    }

    #[test]
    fn test_resolve_defaults_gas_limit() {
        let resolver = SettingsResolver::new(Arc::new(complete_settings()));
        let config = resolver.resolve().unwrap();
        assert_eq!(config.gas_limit, DEFAULT_GAS_LIMIT);
        assert_eq!(config.rpc_url, "http://127.0.0.1:8545");
    }

    #[test]
    fn test_resolve_custom_gas_limit() {
        let store = complete_settings();
        store.set(KEY_GAS_LIMIT, "350000");
        let config = SettingsResolver::new(Arc::new(store)).resolve().unwrap();
        assert_eq!(config.gas_limit, 350_000);
    }

    #[test]
    fn test_missing_keys_are_all_reported() {
        let store = complete_settings();
        store.remove(KEY_RPC_URL);
        store.set(KEY_SIGNER_KEY, "   ");

        let err = SettingsResolver::new(Arc::new(store)).resolve().unwrap_err();
        assert_eq!(err, ConfigurationError::Missing(vec![KEY_RPC_URL, KEY_SIGNER_KEY]));
        assert!(err.to_string().contains("configuration is missing"));
    }

    #[test]
    fn test_invalid_gas_limit() {
        let store = complete_settings();
        store.set(KEY_GAS_LIMIT, "lots");
        let err = SettingsResolver::new(Arc::new(store)).resolve().unwrap_err();
        assert_eq!(err, ConfigurationError::InvalidGasLimit("lots".to_string()));

        let store = complete_settings();
        store.set(KEY_GAS_LIMIT, "0");
        assert!(SettingsResolver::new(Arc::new(store)).resolve().is_err());
    }

    #[test]
    fn test_debug_redacts_signer_key() {
        let config = SettingsResolver::new(Arc::new(complete_settings()))
            .resolve()
            .unwrap();
        let rendered = format!("{:?}", config);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("ac0974bec39a17e3"));
    }
}
