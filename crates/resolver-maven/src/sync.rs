//! Sync contexts (spec §4.8): coordinate concurrent access to the same
//! artifact or metadata key across threads sharing a local repository.
//!
//! Only the in-process factory is implemented here; `syncContext.factory`
//! (§6) is reserved for a future file-lock or broker-backed implementation
//! that would plug in behind the same trait without touching callers.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};

/// A key identifying either an artifact (full coordinate) or a
/// `(groupId, artifactId)` metadata scope to lock against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LockKey {
    Artifact(String),
    Metadata(String, String),
}

impl LockKey {
    pub fn artifact(coordinate: impl Into<String>) -> Self {
        Self::Artifact(coordinate.into())
    }

    pub fn metadata(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self::Metadata(group_id.into(), artifact_id.into())
    }
}

/// An acquired set of locks, held until dropped or closed.
pub trait SyncContext: Send {
    fn close(&mut self) {}
}

/// Creates `SyncContext`s scoped to a local repository.
pub trait SyncContextFactory: Send + Sync {
    /// Blocks until every key in `artifact_keys`/`metadata_keys` can be held
    /// in the requested mode (`exclusive` for write, shared otherwise).
    fn acquire(
        &self,
        artifact_keys: &[LockKey],
        metadata_keys: &[LockKey],
        exclusive: bool,
    ) -> Box<dyn SyncContext>;
}

#[derive(Default)]
struct KeyState {
    readers: u32,
    writer: bool,
    /// Thread that currently holds the exclusive lock, for reentrancy.
    writer_thread: Option<std::thread::ThreadId>,
}

struct KeyLock {
    state: Mutex<KeyState>,
    condvar: Condvar,
}

impl KeyLock {
    fn new() -> Self {
        Self {
            state: Mutex::new(KeyState::default()),
            condvar: Condvar::new(),
        }
    }

    fn lock_shared(&self) {
        let mut state = self.state.lock().expect("sync lock poisoned");
        let me = std::thread::current().id();
        while state.writer && state.writer_thread != Some(me) {
            state = self.condvar.wait(state).expect("sync lock poisoned");
        }
        state.readers += 1;
    }

    fn unlock_shared(&self) {
        let mut state = self.state.lock().expect("sync lock poisoned");
        state.readers -= 1;
        if state.readers == 0 {
            self.condvar.notify_all();
        }
    }

    fn lock_exclusive(&self) {
        let mut state = self.state.lock().expect("sync lock poisoned");
        let me = std::thread::current().id();
        while (state.writer && state.writer_thread != Some(me)) || state.readers > 0 {
            state = self.condvar.wait(state).expect("sync lock poisoned");
        }
        state.writer = true;
        state.writer_thread = Some(me);
    }

    fn unlock_exclusive(&self) {
        let mut state = self.state.lock().expect("sync lock poisoned");
        state.writer = false;
        state.writer_thread = None;
        self.condvar.notify_all();
    }
}

/// In-process lock table keyed by [`LockKey`], one [`KeyLock`] per key
/// created lazily. Reentrant per thread: a thread already holding a key's
/// exclusive lock can re-acquire it without blocking.
#[derive(Default)]
pub struct InProcessSyncContextFactory {
    locks: Mutex<HashMap<LockKey, Arc<KeyLock>>>,
}

impl InProcessSyncContextFactory {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, key: &LockKey) -> Arc<KeyLock> {
        let mut locks = self.locks.lock().expect("sync context lock table poisoned");
        locks.entry(key.clone()).or_insert_with(|| Arc::new(KeyLock::new())).clone()
    }
}

struct HeldLock {
    lock: Arc<KeyLock>,
    exclusive: bool,
}

/// Holds acquired locks until dropped or explicitly closed.
pub struct InProcessSyncContext {
    held: Vec<HeldLock>,
}

impl InProcessSyncContext {
    fn release(&mut self) {
        for held in self.held.drain(..) {
            if held.exclusive {
                held.lock.unlock_exclusive();
            } else {
                held.lock.unlock_shared();
            }
        }
    }
}

impl SyncContext for InProcessSyncContext {
    fn close(&mut self) {
        self.release();
    }
}

impl Drop for InProcessSyncContext {
    fn drop(&mut self) {
        self.release();
    }
}

impl SyncContextFactory for InProcessSyncContextFactory {
    fn acquire(
        &self,
        artifact_keys: &[LockKey],
        metadata_keys: &[LockKey],
        exclusive: bool,
    ) -> Box<dyn SyncContext> {
        let mut keys: Vec<&LockKey> = artifact_keys.iter().chain(metadata_keys.iter()).collect();
        keys.sort();
        keys.dedup();

        let mut held = Vec::with_capacity(keys.len());
        for key in keys {
            let lock = self.lock_for(key);
            if exclusive {
                lock.lock_exclusive();
            } else {
                lock.lock_shared();
            }
            held.push(HeldLock { lock, exclusive });
        }

        Box::new(InProcessSyncContext { held })
    }
}
