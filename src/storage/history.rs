//! Saved analyses.

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;

use super::{load_json, save_json};
use crate::types::AnalysisRecord;

/// Durable analysis storage keyed by record id, listable per owner.
pub trait AnalysisRepository: Send + Sync {
    fn get(&self, id: &str) -> Result<Option<AnalysisRecord>>;
    /// Insert or replace by id.
    fn put(&self, record: AnalysisRecord) -> Result<()>;
    /// Returns whether a record was actually removed.
    fn delete(&self, id: &str) -> Result<bool>;
    /// All records owned by `owner_id`, newest first.
    fn list_for(&self, owner_id: &str) -> Result<Vec<AnalysisRecord>>;
}

/// JSON-file-backed analysis store.
pub struct JsonAnalysisStore {
    path: PathBuf,
    records: Mutex<Vec<AnalysisRecord>>,
}

impl JsonAnalysisStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records: Vec<AnalysisRecord> = load_json(&path)?.unwrap_or_default();
        info!(path = %path.display(), analyses = records.len(), "Analysis store opened");
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    fn persist(&self, records: &[AnalysisRecord]) -> Result<()> {
        save_json(&records, &self.path)
    }
}

impl AnalysisRepository for JsonAnalysisStore {
    fn get(&self, id: &str) -> Result<Option<AnalysisRecord>> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    fn put(&self, record: AnalysisRecord) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(slot) => *slot = record,
            None => records.push(record),
        }
        self.persist(&records)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.id != id);
        let removed = records.len() < before;
        if removed {
            self.persist(&records)?;
        }
        Ok(removed)
    }

    fn list_for(&self, owner_id: &str) -> Result<Vec<AnalysisRecord>> {
        let records = self.records.lock().unwrap();
        let mut owned: Vec<AnalysisRecord> = records
            .iter()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        Ok(owned)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
