//! Keyed waits on in-flight work.
//!
//! The first caller for a key becomes its leader and does the work; later
//! callers get a [`Waiter`] that resolves with the leader's result. A single
//! completion resumes every waiter. A leader dropped without completing
//! resumes its waiters with `None` so they can retry.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

pub struct Scheduler<K, T> {
    inflight: Mutex<HashMap<K, watch::Receiver<Option<T>>>>,
}

impl<K, T> Default for Scheduler<K, T> {
    fn default() -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, T> fmt::Debug for Scheduler<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("in_flight", &crate::lock(&self.inflight).len())
            .finish()
    }
}

pub enum Role<K: Eq + Hash + Clone, T: Clone> {
    Leader(LeaderGuard<K, T>),
    Waiter(Waiter<T>),
}

impl<K: Eq + Hash + Clone, T: Clone> Scheduler<K, T> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Lead the work for `key`, or wait for whoever already does.
    pub fn join(self: &Arc<Self>, key: K) -> Role<K, T> {
        let mut inflight = crate::lock(&self.inflight);
        if let Some(rx) = inflight.get(&key) {
            return Role::Waiter(Waiter { rx: rx.clone() });
        }
        let (tx, rx) = watch::channel(None);
        inflight.insert(key.clone(), rx);
        Role::Leader(LeaderGuard {
            key,
            sender: tx,
            scheduler: Arc::clone(self),
        })
    }

    pub fn in_flight(&self) -> usize {
        crate::lock(&self.inflight).len()
    }

    pub fn is_in_flight(&self, key: &K) -> bool {
        crate::lock(&self.inflight).contains_key(key)
    }
}

/// Held by the caller doing the work for a key.
pub struct LeaderGuard<K: Eq + Hash + Clone, T: Clone> {
    key: K,
    sender: watch::Sender<Option<T>>,
    scheduler: Arc<Scheduler<K, T>>,
}

impl<K: Eq + Hash + Clone, T: Clone> LeaderGuard<K, T> {
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Publish the result to every waiter.
    pub fn complete(self, value: T) {
        self.sender.send_replace(Some(value));
    }
}

impl<K: Eq + Hash + Clone, T: Clone> Drop for LeaderGuard<K, T> {
    fn drop(&mut self) {
        crate::lock(&self.scheduler.inflight).remove(&self.key);
    }
}

/// Resolves with the leader's result.
pub struct Waiter<T> {
    rx: watch::Receiver<Option<T>>,
}

impl<T: Clone> Waiter<T> {
    /// `None` when the leader gave up without a result.
    pub async fn wait(mut self) -> Option<T> {
        let value = self
            .rx
            .wait_for(Option::is_some)
            .await
            .ok()
            .map(|value| value.clone());
        value.flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn leader<K: Eq + Hash + Clone, T: Clone>(role: Role<K, T>) -> LeaderGuard<K, T> {
        match role {
            Role::Leader(guard) => guard,
            Role::Waiter(_) => panic!("expected to lead"),
        }
    }

    fn waiter<K: Eq + Hash + Clone, T: Clone>(role: Role<K, T>) -> Waiter<T> {
        match role {
            Role::Waiter(waiter) => waiter,
            Role::Leader(_) => panic!("expected to wait"),
        }
    }

    #[tokio::test]
    async fn test_single_completion_resumes_all_waiters() {
        let scheduler = Scheduler::<(&str, u64), String>::new();
        let guard = leader(scheduler.join(("P", 1)));
        let first = waiter(scheduler.join(("P", 1)));
        let second = waiter(scheduler.join(("P", 1)));
        // Another version of the same file is independent.
        let other = leader(scheduler.join(("P", 2)));
        assert_eq!(scheduler.in_flight(), 2);

        let a = tokio::spawn(first.wait());
        let b = tokio::spawn(second.wait());
        tokio::task::yield_now().await;
        guard.complete("composed".to_string());

        assert_eq!(a.await.unwrap().as_deref(), Some("composed"));
        assert_eq!(b.await.unwrap().as_deref(), Some("composed"));
        assert!(!scheduler.is_in_flight(&("P", 1)));
        drop(other);
        assert_eq!(scheduler.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_abandoned_leader_releases_waiters() {
        let scheduler = Scheduler::<u32, u32>::new();
        let guard = leader(scheduler.join(7));
        let waiting = waiter(scheduler.join(7));
        drop(guard);
        assert_eq!(waiting.wait().await, None);
        // The key can be led again.
        let again = leader(scheduler.join(7));
        assert_eq!(again.key(), &7);
    }
}
