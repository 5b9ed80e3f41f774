//! Certificate record and attempt persistence.
//!
//! `RecordStore` and `AttemptDirectory` are the host persistence boundary.
//! `FileStore` keeps both maps in memory and, when a path is configured,
//! rewrites a JSON snapshot after every change so a transaction hash written
//! right after broadcast survives a crash.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::certificates::error::StoreError;
use crate::certificates::types::{CertificateRecord, CertificationTarget};

/// Durable certificate records keyed by attempt id.
pub trait RecordStore: Send + Sync {
    fn get(&self, attempt_id: &str) -> Result<Option<CertificateRecord>, StoreError>;
    fn put(&self, record: &CertificateRecord) -> Result<(), StoreError>;
    fn list(&self) -> Result<Vec<CertificateRecord>, StoreError>;
}

/// Completed attempts known to the host, for operator-driven retries.
pub trait AttemptDirectory: Send + Sync {
    fn record_attempt(&self, target: &CertificationTarget) -> Result<(), StoreError>;
    fn attempt(&self, attempt_id: &str) -> Result<Option<CertificationTarget>, StoreError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    attempts: BTreeMap<String, CertificationTarget>,
    #[serde(default)]
    records: BTreeMap<String, CertificateRecord>,
}

/// In-memory store with optional JSON snapshot persistence.
#[derive(Clone, Default)]
pub struct FileStore {
    records: Arc<DashMap<String, CertificateRecord>>,
    attempts: Arc<DashMap<String, CertificationTarget>>,
    persistence_path: Option<PathBuf>,
    /// Serializes snapshot writes.
    write_lock: Arc<Mutex<()>>,
}

impl FileStore {
    /// Create an empty store.
    pub fn new(persistence_path: Option<PathBuf>) -> Self {
        Self {
            persistence_path,
            ..Self::default()
        }
    }

    /// Memory-only store.
    pub fn in_memory() -> Self {
        Self::new(None)
    }

    /// Load from file if it exists; later writes go to the same file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let store = Self::new(Some(path.to_path_buf()));
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let snapshot: Snapshot = serde_json::from_reader(reader)?;
            for (id, target) in snapshot.attempts {
                store.attempts.insert(id, target);
            }
            for (id, record) in snapshot.records {
                store.records.insert(id, record);
            }
            tracing::info!(
                path = ?path,
                records = store.records.len(),
                attempts = store.attempts.len(),
                "Loaded certificate store"
            );
        }
        Ok(store)
    }

    /// Write the snapshot through a temp file and rename.
    pub fn save_to_file(&self) -> Result<(), StoreError> {
        let Some(path) = &self.persistence_path else {
            return Ok(());
        };
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let snapshot = Snapshot {
            attempts: self
                .attempts
                .iter()
                .map(|r| (r.key().clone(), r.value().clone()))
                .collect(),
            records: self
                .records
                .iter()
                .map(|r| (r.key().clone(), r.value().clone()))
                .collect(),
        };

        let tmp_path = path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            serde_json::to_writer_pretty(&mut writer, &snapshot)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Number of records.
    pub fn count(&self) -> usize {
        self.records.len()
    }
}

impl RecordStore for FileStore {
    fn get(&self, attempt_id: &str) -> Result<Option<CertificateRecord>, StoreError> {
        Ok(self.records.get(attempt_id).map(|r| r.value().clone()))
    }

    fn put(&self, record: &CertificateRecord) -> Result<(), StoreError> {
        self.records.insert(record.attempt_id.clone(), record.clone());
        self.save_to_file()
    }

    fn list(&self) -> Result<Vec<CertificateRecord>, StoreError> {
        let mut records: Vec<_> = self.records.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| a.attempt_id.cmp(&b.attempt_id));
        Ok(records)
    }
}

impl AttemptDirectory for FileStore {
    fn record_attempt(&self, target: &CertificationTarget) -> Result<(), StoreError> {
        self.attempts.insert(target.id.clone(), target.clone());
        self.save_to_file()
    }

    fn attempt(&self, attempt_id: &str) -> Result<Option<CertificationTarget>, StoreError> {
        Ok(self.attempts.get(attempt_id).map(|r| r.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificates::types::CertificateStatus;
    use alloy::primitives::{TxHash, U256};

    fn target(id: &str) -> CertificationTarget {
        CertificationTarget {
            id: id.to_string(),
            student_name: Some("Alan Turing".to_string()),
            email: None,
            course_title: Some("Computability".to_string()),
            passed: true,
            certification_required: true,
        }
    }

    #[test]
    fn test_record_operations() {
        let store = FileStore::in_memory();
        assert!(store.get("a-1").unwrap().is_none());

        let mut record = CertificateRecord::new("a-1");
        record.mark_submitted(TxHash::repeat_byte(9));
        store.put(&record).unwrap();

        let loaded = store.get("a-1").unwrap().unwrap();
        assert_eq!(loaded.transaction_hash, Some(TxHash::repeat_byte(9)));
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_list_is_sorted() {
        let store = FileStore::in_memory();
        store.put(&CertificateRecord::new("b")).unwrap();
        store.put(&CertificateRecord::new("a")).unwrap();
        let ids: Vec<_> = store.list().unwrap().into_iter().map(|r| r.attempt_id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_persistence_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("certificates.json");

        let store = FileStore::load_from_file(&path).unwrap();
        let mut record = CertificateRecord::new("a-1");
        record.mark_submitted(TxHash::repeat_byte(3));
        record.mark_confirmed(U256::from(42));
        store.put(&record).unwrap();
        store.record_attempt(&target("a-1")).unwrap();

        let reloaded = FileStore::load_from_file(&path).unwrap();
        let loaded = reloaded.get("a-1").unwrap().unwrap();
        assert_eq!(loaded.status, CertificateStatus::Confirmed);
        assert_eq!(loaded.certificate_id, Some(U256::from(42)));
        assert_eq!(reloaded.attempt("a-1").unwrap(), Some(target("a-1")));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_corrupt_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("certificates.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            FileStore::load_from_file(&path),
            Err(StoreError::Serialization(_))
        ));
    }
}
