//! Per-note save debouncing
//!
//! Rapid edits to the same note re-arm a single timer; the save runs once the
//! note has been quiet for the configured delay.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::task::JoinHandle;
use tokio::time::Duration;

/// Default quiet period before a debounced save fires
pub const DEFAULT_SAVE_DELAY_MS: u64 = 600;

struct PendingSave {
    /// Distinguishes this timer from a later one armed for the same key
    generation: u64,
    handle: JoinHandle<()>,
}

/// Timer registry keyed by note id
pub struct SaveDebouncer {
    delay: Duration,
    next_generation: AtomicU64,
    pending: Arc<DashMap<String, PendingSave>>,
}

impl SaveDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_generation: AtomicU64::new(0),
            pending: Arc::new(DashMap::new()),
        }
    }

    /// Arm the timer for `key`, cancelling any timer already armed for it.
    /// `action` runs once, after the delay, unless cancelled or re-armed first.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, key: &str, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let spawn_timer = || {
            let pending = Arc::clone(&self.pending);
            let delay = self.delay;
            let key = key.to_string();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                // Only the most recent registration for the key may fire
                if pending
                    .remove_if(&key, |_, p| p.generation == generation)
                    .is_some()
                {
                    action();
                }
            })
        };

        // The shard stays locked until the registration is stored, so the
        // timer cannot look for itself before it is there.
        match self.pending.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                occupied.get().handle.abort();
                let handle = spawn_timer();
                occupied.insert(PendingSave { generation, handle });
                log::debug!("[DEBOUNCE] Re-armed save timer for {}", key);
            }
            Entry::Vacant(vacant) => {
                let handle = spawn_timer();
                vacant.insert(PendingSave { generation, handle });
                log::debug!("[DEBOUNCE] Armed save timer for {}", key);
            }
        }
    }

    /// Cancel the timer for `key`. Returns whether one was armed.
    pub fn cancel(&self, key: &str) -> bool {
        match self.pending.remove(key) {
            Some((_, p)) => {
                p.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        self.take_pending();
    }

    /// Cancel every armed timer and return the keys they were armed for,
    /// so the caller can run those saves itself.
    pub fn take_pending(&self) -> Vec<String> {
        let keys: Vec<String> = self.pending.iter().map(|e| e.key().clone()).collect();
        keys.into_iter()
            .filter(|key| self.cancel(key))
            .collect()
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.pending.contains_key(key)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Drop for SaveDebouncer {
    fn drop(&mut self) {
        for entry in self.pending.iter() {
            entry.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Box<dyn FnOnce() + Send>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let make = move || {
            let c = Arc::clone(&c);
            Box::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }) as Box<dyn FnOnce() + Send>
        };
        (count, make)
    }

    #[tokio::test]
    async fn test_rapid_schedules_coalesce() {
        let debouncer = SaveDebouncer::new(Duration::from_millis(150));
        let (count, make) = counter();

        for _ in 0..5 {
            debouncer.schedule("note-1", make());
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        assert_eq!(debouncer.pending_count(), 1);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(debouncer.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let debouncer = SaveDebouncer::new(Duration::from_millis(20));
        let (count, make) = counter();

        debouncer.schedule("a", make());
        debouncer.schedule("b", make());
        assert_eq!(debouncer.pending_count(), 2);

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancel_prevents_fire() {
        let debouncer = SaveDebouncer::new(Duration::from_millis(20));
        let (count, make) = counter();

        debouncer.schedule("a", make());
        assert!(debouncer.is_pending("a"));
        assert!(debouncer.cancel("a"));
        assert!(!debouncer.cancel("a"));

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_take_pending_returns_keys() {
        let debouncer = SaveDebouncer::new(Duration::from_millis(20));
        let (count, make) = counter();

        debouncer.schedule("a", make());
        debouncer.schedule("b", make());
        let mut keys = debouncer.take_pending();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(debouncer.pending_count(), 0);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
