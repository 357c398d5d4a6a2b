//! The in-memory `active` map (spec §4.2, §5, §9): the scheduler's sole
//! coordination structure for avoiding double-dispatch and for carrying
//! each running job's cancel signal. Advisory only — the store remains
//! authoritative for what "is queued" or "is downloading"; Recovery
//! reconciles on restart regardless of what this map held.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use vodkeep_extractor::CancelSignal;

/// One job currently held by a worker.
#[derive(Clone)]
pub(crate) struct ActiveEntry {
    /// The cancel signal `pause`/`delete` set to request cooperative
    /// shutdown.
    pub(crate) cancel: CancelSignal,
    /// When the worker picked this job up, for diagnostics only.
    pub(crate) started: Instant,
}

/// Mutex-protected map of job id to [`ActiveEntry`]. Cloned handles share
/// the same underlying map (spec §5: "its mutex protects insertion and
/// removal").
#[derive(Clone, Default)]
pub struct ActiveMap {
    inner: std::sync::Arc<Mutex<HashMap<String, ActiveEntry>>>,
}

impl ActiveMap {
    /// An empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically insert `id` with a fresh cancel signal if it is not
    /// already present. Returns the signal either way, and whether this
    /// call performed the insertion (the scheduler skips dispatch when
    /// `false` — the job is already in flight in this process).
    #[must_use]
    pub fn try_insert(&self, id: &str) -> (CancelSignal, bool) {
        let mut guard = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(entry) = guard.get(id) {
            return (entry.cancel.clone(), false);
        }
        let cancel = CancelSignal::new();
        guard.insert(
            id.to_string(),
            ActiveEntry {
                cancel: cancel.clone(),
                started: Instant::now(),
            },
        );
        (cancel, true)
    }

    /// Remove `id`, e.g. when its worker has finished.
    pub fn remove(&self, id: &str) {
        let mut guard = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.remove(id);
    }

    /// Look up the cancel signal for an active job, for `pause`/`delete`
    /// to set.
    #[must_use]
    pub fn cancel_signal(&self, id: &str) -> Option<CancelSignal> {
        let guard = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.get(id).map(|entry| entry.cancel.clone())
    }

    /// Whether `id` is currently held by a worker in this process.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        let guard = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.contains_key(id)
    }

    /// Current count of in-flight jobs, for the `downloader_active_jobs`
    /// gauge.
    #[must_use]
    pub fn len(&self) -> usize {
        let guard = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.len()
    }

    /// Whether the map currently holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_insert_skips_already_active_job() {
        let map = ActiveMap::new();
        let (first, inserted_first) = map.try_insert("job-1");
        assert!(inserted_first);
        let (second, inserted_second) = map.try_insert("job-1");
        assert!(!inserted_second);
        assert!(!first.is_set());
        second.set();
        assert!(first.is_set());
    }

    #[test]
    fn remove_drops_the_entry() {
        let map = ActiveMap::new();
        map.try_insert("job-1");
        assert!(map.contains("job-1"));
        map.remove("job-1");
        assert!(!map.contains("job-1"));
        assert!(map.is_empty());
    }

    #[test]
    fn cancel_signal_looks_up_existing_entry() {
        let map = ActiveMap::new();
        assert!(map.cancel_signal("missing").is_none());
        map.try_insert("job-1");
        assert!(map.cancel_signal("job-1").is_some());
    }
}
