//! In-memory checkpoint table.
//!
//! Checkpoints are a process-lifetime simulation: the backend has no native
//! checkpoint concept, so the table lives entirely inside the drive. Ids are
//! assigned from a per-path monotonic counter, never from the current map
//! size, so deleting a checkpoint can never cause an id to be reissued.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use indexmap::IndexMap;

use crate::model::Checkpoint;
use crate::path::DrivePath;

#[derive(Default)]
struct PathCheckpoints {
    next_id: u64,
    /// Insertion order is creation order; listings report it as-is.
    entries: IndexMap<String, Checkpoint>,
}

/// Per-path checkpoint storage, safe to share across tasks.
#[derive(Default)]
pub struct CheckpointTable {
    inner: Mutex<HashMap<String, PathCheckpoints>>,
}

impl CheckpointTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a checkpoint for `path`, stamped now, with the next id.
    pub fn create(&self, path: &DrivePath) -> Checkpoint {
        let mut table = self.lock();
        let slot = table.entry(path.as_str().to_string()).or_default();
        let checkpoint = Checkpoint {
            id: slot.next_id.to_string(),
            last_modified: Utc::now(),
        };
        slot.next_id += 1;
        slot.entries
            .insert(checkpoint.id.clone(), checkpoint.clone());
        checkpoint
    }

    /// All checkpoints for `path` in creation order; empty for unseen paths.
    pub fn list(&self, path: &DrivePath) -> Vec<Checkpoint> {
        self.lock()
            .get(path.as_str())
            .map(|slot| slot.entries.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Remove a checkpoint if present. Removing an unknown id is not an
    /// error; the id stays retired either way.
    pub fn remove(&self, path: &DrivePath, id: &str) {
        if let Some(slot) = self.lock().get_mut(path.as_str()) {
            slot.entries.shift_remove(id);
        }
    }

    /// Whether `path` currently has a checkpoint with `id`.
    pub fn contains(&self, path: &DrivePath, id: &str) -> bool {
        self.lock()
            .get(path.as_str())
            .is_some_and(|slot| slot.entries.contains_key(id))
    }

    /// Drop all checkpoints for all paths.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, PathCheckpoints>> {
        // A poisoned lock still holds consistent data; keep going.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> DrivePath {
        DrivePath::new(s).unwrap()
    }

    #[test]
    fn test_ids_are_sequential_per_path() {
        let table = CheckpointTable::new();
        let p = path("a/b.txt");
        assert_eq!(table.create(&p).id, "0");
        assert_eq!(table.create(&p).id, "1");
        assert_eq!(table.create(&p).id, "2");
        // Another path starts from zero independently.
        assert_eq!(table.create(&path("other.txt")).id, "0");
    }

    #[test]
    fn test_list_unseen_path_is_empty() {
        let table = CheckpointTable::new();
        assert!(table.list(&path("never/seen.txt")).is_empty());
    }

    #[test]
    fn test_list_preserves_creation_order() {
        let table = CheckpointTable::new();
        let p = path("f.txt");
        for _ in 0..4 {
            table.create(&p);
        }
        let ids: Vec<String> = table.list(&p).into_iter().map(|c| c.id).collect();
        assert_eq!(ids, ["0", "1", "2", "3"]);
    }

    #[test]
    fn test_no_id_reuse_after_removal() {
        let table = CheckpointTable::new();
        let p = path("f.txt");
        table.create(&p);
        table.create(&p);
        table.remove(&p, "1");
        // Size is back to one, but the next id must not collide with "1".
        assert_eq!(table.create(&p).id, "2");
        let ids: Vec<String> = table.list(&p).into_iter().map(|c| c.id).collect();
        assert_eq!(ids, ["0", "2"]);
    }

    #[test]
    fn test_remove_unknown_id_is_a_noop() {
        let table = CheckpointTable::new();
        let p = path("f.txt");
        table.create(&p);
        table.remove(&p, "17");
        table.remove(&path("missing.txt"), "0");
        assert_eq!(table.list(&p).len(), 1);
    }
}
