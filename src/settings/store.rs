//! Key-value settings stores.
//!
//! Every lookup goes to the backing source again. Nothing here caches, so a
//! changed settings file or environment is picked up by the next operation.

use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Read-only view of a key-value settings source.
pub trait SettingsStore: Send + Sync {
    /// Look up a setting. Returns `None` when the key is absent.
    fn get(&self, key: &str) -> Option<String>;
}

/// In-memory settings, used by embedders and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    inner: Arc<DashMap<String, String>>,
}

impl MemorySettings {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.insert(key.into(), value.into());
    }

    /// Remove a value.
    pub fn remove(&self, key: &str) {
        self.inner.remove(key);
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).map(|r| r.value().clone())
    }
}

/// Settings read from a TOML file on every lookup.
///
/// Dotted keys walk nested tables, so `ledger.rpc_url` matches both
/// `"ledger.rpc_url" = "..."` at the top level and `rpc_url` under `[ledger]`.
#[derive(Debug, Clone)]
pub struct FileSettings {
    path: PathBuf,
}

impl FileSettings {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn load(&self) -> Option<toml::Table> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!(path = ?self.path, error = %e, "Settings file not readable");
                return None;
            }
        };
        match content.parse::<toml::Table>() {
            Ok(table) => Some(table),
            Err(e) => {
                tracing::warn!(path = ?self.path, error = %e, "Settings file is not valid TOML");
                None
            }
        }
    }
}

impl SettingsStore for FileSettings {
    fn get(&self, key: &str) -> Option<String> {
        let table = self.load()?;

        if let Some(value) = table.get(key) {
            return scalar_to_string(value);
        }

        let mut parts = key.split('.').peekable();
        let mut current = &table;
        while let Some(part) = parts.next() {
            let value = current.get(part)?;
            if parts.peek().is_none() {
                return scalar_to_string(value);
            }
            current = value.as_table()?;
        }
        None
    }
}

fn scalar_to_string(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Settings read from environment variables.
///
/// `ledger.signer_key` with prefix `CERT_REGISTRAR_` maps to
/// `CERT_REGISTRAR_LEDGER_SIGNER_KEY`.
#[derive(Debug, Clone)]
pub struct EnvSettings {
    prefix: String,
}

impl EnvSettings {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Environment variable name for a setting key.
    pub fn var_name(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key.replace('.', "_").to_uppercase())
    }
}

impl SettingsStore for EnvSettings {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(self.var_name(key)).ok()
    }
}

/// Chain of stores; the first non-empty value wins.
#[derive(Clone, Default)]
pub struct LayeredSettings {
    layers: Vec<Arc<dyn SettingsStore>>,
}

impl LayeredSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a lower-priority layer.
    pub fn with_layer(mut self, layer: Arc<dyn SettingsStore>) -> Self {
        self.layers.push(layer);
        self
    }
}

impl SettingsStore for LayeredSettings {
    fn get(&self, key: &str) -> Option<String> {
        self.layers
            .iter()
            .filter_map(|layer| layer.get(key))
            .find(|value| !value.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_memory_settings() {
        let store = MemorySettings::new();
        assert!(store.get("ledger.rpc_url").is_none());

        store.set("ledger.rpc_url", "http://localhost:8545");
        assert_eq!(store.get("ledger.rpc_url").as_deref(), Some("http://localhost:8545"));

        store.remove("ledger.rpc_url");
        assert!(store.get("ledger.rpc_url").is_none());
    }

    #[test]
    fn test_file_settings_nested_and_flat_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "\"ledger.contract_address\" = \"0x5FbDB2315678afecb367f032d93F642f64180aa3\"\n\
             [ledger]\nrpc_url = \"http://127.0.0.1:8545\"\ngas_limit = 300000"
        )
        .unwrap();

        let store = FileSettings::new(file.path());
        assert_eq!(store.get("ledger.rpc_url").as_deref(), Some("http://127.0.0.1:8545"));
        assert_eq!(store.get("ledger.gas_limit").as_deref(), Some("300000"));
        assert_eq!(
            store.get("ledger.contract_address").as_deref(),
            Some("0x5FbDB2315678afecb367f032d93F642f64180aa3")
        );
        assert!(store.get("ledger.signer_key").is_none());
    }

    #[test]
    fn test_file_settings_rereads_on_every_lookup() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let store = FileSettings::new(file.path());
        assert!(store.get("ledger.rpc_url").is_none());

        std::fs::write(file.path(), "[ledger]\nrpc_url = \"http://node:8545\"\n").unwrap();
        assert_eq!(store.get("ledger.rpc_url").as_deref(), Some("http://node:8545"));
    }

    #[test]
    fn test_missing_file_yields_none() {
        let store = FileSettings::new("/nonexistent/ledger-settings.toml");
        assert!(store.get("ledger.rpc_url").is_none());
    }

    #[test]
    fn test_env_var_name() {
        let env = EnvSettings::new("CERT_REGISTRAR_");
        assert_eq!(env.var_name("ledger.signer_key"), "CERT_REGISTRAR_LEDGER_SIGNER_KEY");
    }

    #[test]
    fn test_layered_skips_empty_values() {
        let top = MemorySettings::new();
        top.set("ledger.rpc_url", "  ");
        let bottom = MemorySettings::new();
        bottom.set("ledger.rpc_url", "http://fallback:8545");

        let layered = LayeredSettings::new()
            .with_layer(Arc::new(top.clone()))
            .with_layer(Arc::new(bottom));
        assert_eq!(layered.get("ledger.rpc_url").as_deref(), Some("http://fallback:8545"));

        top.set("ledger.rpc_url", "http://primary:8545");
        assert_eq!(layered.get("ledger.rpc_url").as_deref(), Some("http://primary:8545"));
    }
}
