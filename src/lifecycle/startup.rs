//! Startup orchestration.
//!
//! Builds the certificate stack from a validated `RegistrarConfig`. Ledger
//! credentials are not read here; they are resolved per operation so an
//! operator can fix them without a restart.

use std::path::Path;
use std::sync::Arc;

use crate::blockchain::AlloyGateway;
use crate::certificates::{CertificateManager, FileStore, StoreError, TriggerSurface};
use crate::config::RegistrarConfig;
use crate::settings::{EnvSettings, FileSettings, LayeredSettings, SettingsResolver};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Failed to open certificate store: {0}")]
    Store(#[from] StoreError),
}

/// Wire settings, gateway, store and manager into a trigger surface.
pub fn assemble(config: &RegistrarConfig) -> Result<Arc<TriggerSurface>, StartupError> {
    let mut settings =
        LayeredSettings::new().with_layer(Arc::new(EnvSettings::new(&config.settings.env_prefix)));
    if let Some(path) = &config.settings.path {
        settings = settings.with_layer(Arc::new(FileSettings::new(path)));
    }
    let resolver = SettingsResolver::new(Arc::new(settings));

    let store = match &config.store.path {
        Some(path) => FileStore::load_from_file(Path::new(path))?,
        None => {
            tracing::warn!("No store path configured; certificate records will not survive a restart");
            FileStore::in_memory()
        }
    };
    let store = Arc::new(store);

    let gateway = AlloyGateway::new(config.ledger.clone());
    let manager = CertificateManager::new(Arc::new(resolver), Arc::new(gateway), store.clone());

    tracing::info!(
        records = store.count(),
        settings_path = ?config.settings.path,
        store_path = ?config.store.path,
        "Certificate registrar assembled"
    );

    Ok(Arc::new(TriggerSurface::new(Arc::new(manager), store)))
}
