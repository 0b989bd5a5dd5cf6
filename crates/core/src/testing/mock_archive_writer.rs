//! Mock archive writer for testing.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::archive::{unique_entry_name, ArchiveError, ArchiveWriter};

/// A recorded upsert for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedUpsert {
    pub path: PathBuf,
    /// Name the entry was stored under.
    pub entry_name: String,
    pub size: usize,
}

#[derive(Debug, Default)]
struct MockArchiveState {
    upserts: Vec<RecordedUpsert>,
    failing: HashSet<String>,
    delay: Duration,
}

/// Mock implementation of the ArchiveWriter trait.
///
/// Keeps entries in memory instead of writing containers. Upserts run on the
/// blocking pool, so state sits behind a std mutex.
#[derive(Debug, Clone, Default)]
pub struct MockArchiveWriter {
    state: Arc<Mutex<MockArchiveState>>,
}

impl MockArchiveWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every upsert of `entry_name` fail.
    pub fn fail_entry(&self, entry_name: impl Into<String>) {
        self.lock().failing.insert(entry_name.into());
    }

    /// Sleep this long inside every upsert.
    pub fn set_delay(&self, delay: Duration) {
        self.lock().delay = delay;
    }

    /// Successful upserts, in write order.
    pub fn upserts(&self) -> Vec<RecordedUpsert> {
        self.lock().upserts.clone()
    }

    /// Entry names stored in the container at `path`.
    pub fn entries(&self, path: &Path) -> Vec<String> {
        self.lock()
            .upserts
            .iter()
            .filter(|u| u.path == path)
            .map(|u| u.entry_name.clone())
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, MockArchiveState> {
        // A panicking test thread must not wedge the others.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ArchiveWriter for MockArchiveWriter {
    fn upsert(&self, path: &Path, entry_name: &str, bytes: &[u8]) -> Result<String, ArchiveError> {
        let delay = self.lock().delay;
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        let mut state = self.lock();
        if state.failing.contains(entry_name) {
            return Err(ArchiveError::Io(std::io::Error::other(format!(
                "injected failure for {}",
                entry_name
            ))));
        }

        let taken: HashSet<String> = state
            .upserts
            .iter()
            .filter(|u| u.path == path)
            .map(|u| u.entry_name.clone())
            .collect();
        let stored = unique_entry_name(entry_name, &taken);

        state.upserts.push(RecordedUpsert {
            path: path.to_path_buf(),
            entry_name: stored.clone(),
            size: bytes.len(),
        });
        Ok(stored)
    }
}
