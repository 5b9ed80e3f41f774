//! Configuration schema definitions.
//!
//! This module defines the process configuration for the registrar service.
//! Ledger credentials are not part of it; they are resolved per operation
//! through the settings store (see `crate::settings`).

use serde::{Deserialize, Serialize};

/// Root configuration for the registrar service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RegistrarConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,

    /// Admin API settings.
    pub admin: AdminConfig,

    /// Ledger client timeouts and confirmation policy.
    pub ledger: LedgerClientConfig,

    /// Where ledger credentials are read from.
    pub settings: SettingsConfig,

    /// Certificate record persistence.
    pub store: StoreConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8090").
    pub bind_address: String,

    /// Upper bound for a single request, including ledger waits.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8090".to_string(),
            request_timeout_secs: 300,
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Bearer token required on every request.
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            api_key: "admin-secret-key".to_string(),
        }
    }
}

/// Ledger client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LedgerClientConfig {
    /// Timeout for each JSON-RPC request in seconds.
    pub rpc_timeout_secs: u64,

    /// Upper bound for waiting on a transaction receipt in seconds.
    pub receipt_timeout_secs: u64,

    /// Receipt polling interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Extra blocks required on top of the receipt block (0 = mined is enough).
    pub confirmation_blocks: u64,

    /// Refuse to submit above this gas price in gwei (0 = no cap).
    pub max_gas_price_gwei: u64,
}

impl Default for LedgerClientConfig {
    fn default() -> Self {
        Self {
            rpc_timeout_secs: 10,
            receipt_timeout_secs: 120,
            poll_interval_ms: 2000,
            confirmation_blocks: 0,
            max_gas_price_gwei: 0,
        }
    }
}

/// Ledger settings sources.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SettingsConfig {
    /// Flat TOML file holding `ledger.*` keys, re-read per operation.
    pub path: Option<String>,

    /// Environment variable prefix; environment values override the file.
    pub env_prefix: String,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            path: Some("ledger-settings.toml".to_string()),
            env_prefix: "CERT_REGISTRAR_".to_string(),
        }
    }
}

/// Record persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON snapshot written after every change; `None` keeps records in memory only.
    pub path: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: Some("certificates.json".to_string()),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default tracing filter directive; `RUST_LOG` takes precedence.
    pub log_filter: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Prometheus exporter listen address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "cert_registrar=info,tower_http=info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9091".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: RegistrarConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1:8090");
        assert_eq!(config.ledger.receipt_timeout_secs, 120);
        assert_eq!(config.settings.env_prefix, "CERT_REGISTRAR_");
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_partial_sections() {
        let config: RegistrarConfig = toml::from_str(
            r#"
            [ledger]
            receipt_timeout_secs = 30
            confirmation_blocks = 2

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.ledger.receipt_timeout_secs, 30);
        assert_eq!(config.ledger.confirmation_blocks, 2);
        assert_eq!(config.ledger.rpc_timeout_secs, 10);
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }
}
