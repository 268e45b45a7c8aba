use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::model::{MaskId, MaskRecord};

/// In-memory ordered collection of masks; the single source of client-visible
/// truth for the list view. Insertion order, newest-first for rows created
/// this session. All mutations are synchronous and immediately visible.
#[derive(Default)]
pub struct MaskStore {
    rows: RwLock<Vec<MaskRecord>>,
}

impl MaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self) -> Vec<MaskRecord> {
        self.read().clone()
    }

    pub fn get(&self, id: &MaskId) -> Option<MaskRecord> {
        self.read().iter().find(|r| &r.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Inserts at the head, replacing any existing row with the same id.
    pub fn upsert_front(&self, record: MaskRecord) {
        let mut rows = self.write();
        rows.retain(|r| r.id != record.id);
        rows.insert(0, record);
    }

    pub fn remove(&self, id: &MaskId) {
        self.write().retain(|r| &r.id != id);
    }

    pub fn replace_all(&self, records: Vec<MaskRecord>) {
        *self.write() = records;
    }

    /// Replaces a row in place, preserving its position. Returns false if the
    /// id is not present.
    pub fn replace(&self, id: &MaskId, record: MaskRecord) -> bool {
        let mut rows = self.write();
        match rows.iter_mut().find(|r| &r.id == id) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    /// Captures a row and its position, for rollback.
    pub fn snapshot(&self, id: &MaskId) -> Option<(usize, MaskRecord)> {
        let rows = self.read();
        rows.iter()
            .position(|r| &r.id == id)
            .map(|i| (i, rows[i].clone()))
    }

    /// Re-inserts a previously captured row at its captured position.
    pub fn restore_at(&self, index: usize, record: MaskRecord) {
        let mut rows = self.write();
        rows.retain(|r| r.id != record.id);
        let index = index.min(rows.len());
        rows.insert(index, record);
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<MaskRecord>> {
        self.rows.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<MaskRecord>> {
        self.rows.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
