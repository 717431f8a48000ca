//! Dataset Cache - Reuse parsed uploads
//!
//! Uploads are keyed by a content digest (a name-based UUID over the raw
//! bytes), so uploading the same file twice returns the same dataset id
//! without parsing it again. Entries are immutable once inserted; readers
//! hold an `Arc` and never observe a partially built table.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::parser::LoadedTable;

/// Datasets kept before the oldest is evicted.
pub const DEFAULT_CAPACITY: usize = 16;

/// A loaded upload with metadata
#[derive(Debug, Clone)]
pub struct CachedDataset {
    pub id: Uuid,
    pub table: Arc<LoadedTable>,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<Uuid, CachedDataset>,
    /// Insertion order, oldest first.
    order: VecDeque<Uuid>,
}

/// Bounded in-memory map from content digest to loaded table.
#[derive(Debug)]
pub struct DatasetCache {
    capacity: usize,
    state: RwLock<CacheState>,
}

impl DatasetCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: RwLock::new(CacheState::default()),
        }
    }

    /// Dataset id for raw upload bytes.
    pub fn dataset_id(bytes: &[u8]) -> Uuid {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, bytes)
    }

    pub fn get(&self, id: &Uuid) -> Option<CachedDataset> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.entries.get(id).cloned()
    }

    /// Return the cached dataset for `bytes`, or load and insert it.
    ///
    /// The flag is `true` on a cache hit. Loading runs outside the lock; if
    /// two callers race on the same bytes the first insert wins.
    pub fn get_or_load<E, F>(&self, bytes: &[u8], load: F) -> Result<(CachedDataset, bool), E>
    where
        F: FnOnce(&[u8]) -> Result<LoadedTable, E>,
    {
        let id = Self::dataset_id(bytes);
        if let Some(hit) = self.get(&id) {
            return Ok((hit, true));
        }

        let dataset = CachedDataset {
            id,
            table: Arc::new(load(bytes)?),
            loaded_at: Utc::now(),
        };

        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = state.entries.get(&id) {
            return Ok((existing.clone(), true));
        }
        while state.order.len() >= self.capacity {
            match state.order.pop_front() {
                Some(oldest) => {
                    state.entries.remove(&oldest);
                }
                None => break,
            }
        }
        state.order.push_back(id);
        state.entries.insert(id, dataset.clone());
        Ok((dataset, false))
    }

    pub fn len(&self) -> usize {
        self.state.read().unwrap_or_else(|e| e.into_inner()).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DatasetCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnNames;
    use crate::error::LoadResult;
    use crate::parser::load_bytes_auto;
    use std::cell::Cell;

    fn csv(qty: u32) -> Vec<u8> {
        format!("StrCd,StrNm,CpnNm,SaleDy,Qty\nS1,Store1,TM,20240101,{}\n", qty).into_bytes()
    }

    fn load(bytes: &[u8]) -> LoadResult<LoadedTable> {
        load_bytes_auto(bytes, &ColumnNames::default())
    }

    #[test]
    fn test_same_bytes_hit_cache() {
        let cache = DatasetCache::default();
        let calls = Cell::new(0);
        let counting = |bytes: &[u8]| {
            calls.set(calls.get() + 1);
            load(bytes)
        };

        let (first, hit) = cache.get_or_load(&csv(5), counting).unwrap();
        assert!(!hit);
        let (second, hit) = cache.get_or_load(&csv(5), counting).unwrap();
        assert!(hit);
        assert_eq!(first.id, second.id);
        assert!(Arc::ptr_eq(&first.table, &second.table));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_different_bytes_new_entry() {
        let cache = DatasetCache::default();
        let (a, _) = cache.get_or_load(&csv(5), load).unwrap();
        let (b, _) = cache.get_or_load(&csv(6), load).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(cache.len(), 2);
        assert_eq!(a.table.records.total_quantity(), 5);
    }

    #[test]
    fn test_oldest_evicted() {
        let cache = DatasetCache::new(2);
        let (first, _) = cache.get_or_load(&csv(1), load).unwrap();
        cache.get_or_load(&csv(2), load).unwrap();
        cache.get_or_load(&csv(3), load).unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&first.id).is_none());
    }

    #[test]
    fn test_failed_load_not_cached() {
        let cache = DatasetCache::default();
        assert!(cache.get_or_load(b"StrCd\nS1\n", load).is_err());
        assert!(cache.is_empty());
    }
}
