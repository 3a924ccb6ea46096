//! Shared Lock Module
//!
//! A lock the owning thread may take again without blocking. Engines and file
//! caches handed the same lock serialize against each other across threads,
//! while one thread holding it can still drive all of them.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, ThreadId};

/// Lock serializing cache operations. Hand the same lock to several engines
/// or file caches to coordinate them.
pub type CacheLock = Arc<ReentrantLock>;

/// Creates a fresh, unshared [`CacheLock`].
pub fn new_lock() -> CacheLock {
    Arc::new(ReentrantLock::default())
}

// == Reentrant Lock ==
/// Mutual exclusion between threads, reentrant within one thread.
#[derive(Debug, Default)]
pub struct ReentrantLock {
    /// Owning thread and how many guards it holds
    owner: Mutex<Option<(ThreadId, usize)>>,
    released: Condvar,
}

impl ReentrantLock {
    /// Blocks until no other thread holds the lock, then takes it.
    pub fn acquire(&self) -> ReentrantGuard<'_> {
        let me = thread::current().id();
        let mut owner = self.owner.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            let available = match *owner {
                None => true,
                Some((id, _)) => id == me,
            };
            if available {
                break;
            }
            owner = self
                .released
                .wait(owner)
                .unwrap_or_else(PoisonError::into_inner);
        }

        let depth = owner.map_or(0, |(_, depth)| depth);
        *owner = Some((me, depth + 1));
        ReentrantGuard { lock: self }
    }

    /// True if the calling thread currently holds the lock.
    pub fn is_held_by_current_thread(&self) -> bool {
        let owner = self.owner.lock().unwrap_or_else(PoisonError::into_inner);
        matches!(*owner, Some((id, _)) if id == thread::current().id())
    }
}

/// Releases one level of a [`ReentrantLock`] when dropped.
#[derive(Debug)]
pub struct ReentrantGuard<'a> {
    lock: &'a ReentrantLock,
}

impl Drop for ReentrantGuard<'_> {
    fn drop(&mut self) {
        let mut owner = self
            .lock
            .owner
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let released = match owner.as_mut() {
            Some((_, depth)) => {
                *depth -= 1;
                *depth == 0
            }
            None => false,
        };
        if released {
            *owner = None;
            self.lock.released.notify_one();
        }
    }
}
