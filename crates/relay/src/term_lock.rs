use std::sync::Arc;

use {
    dashmap::DashMap,
    tokio::sync::{Mutex, OwnedMutexGuard},
};

/// Serializes reconciliation per tracking term within this process.
///
/// Entries are dropped once nobody holds or waits on them, so the map only
/// grows with concurrent work.
#[derive(Default)]
pub struct TermLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl TermLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, term: &str) -> TermGuard<'_> {
        let mutex = Arc::clone(&self.locks.entry(term.to_string()).or_default());
        let guard = mutex.lock_owned().await;
        TermGuard {
            locks: self,
            term: term.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of terms currently locked or waited on.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

pub struct TermGuard<'a> {
    locks: &'a TermLocks,
    term: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for TermGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.locks
            .locks
            .remove_if(&self.term, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
