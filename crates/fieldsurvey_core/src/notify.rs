//! URI-keyed change notification.
//!
//! # Responsibility
//! - Keep weak observer registrations per canonical URI.
//! - Deliver change signals after the store has committed and released its
//!   lock.
//!
//! # Invariants
//! - A registration never keeps its observer alive; dropped observers are
//!   pruned on the next publish.
//! - Observers run without the registry lock held, so an observer may
//!   subscribe, unsubscribe or query the store from its callback.
//! - Delivery is exact-URI only; an observer of `responses` is not told
//!   about `responses/7` unless the coordinator publishes both.

use log::trace;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Receives the canonical URI of every collection or item that changed.
pub trait ChangeObserver: Send + Sync {
    fn on_change(&self, uri: &str);
}

impl<F> ChangeObserver for F
where
    F: Fn(&str) + Send + Sync,
{
    fn on_change(&self, uri: &str) {
        self(uri)
    }
}

static SHARED: Lazy<Arc<ChangeNotifier>> = Lazy::new(|| Arc::new(ChangeNotifier::new()));

/// Observer registry shared by one or more stores.
#[derive(Default)]
pub struct ChangeNotifier {
    observers: Mutex<BTreeMap<String, Vec<Weak<dyn ChangeObserver>>>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide notifier, created on first use.
    pub fn shared() -> Arc<ChangeNotifier> {
        Arc::clone(&SHARED)
    }

    /// Registers `observer` for changes to exactly `uri`.
    pub fn subscribe(&self, uri: &str, observer: &Arc<dyn ChangeObserver>) {
        self.lock()
            .entry(uri.to_string())
            .or_default()
            .push(Arc::downgrade(observer));
    }

    /// Removes every registration of `observer` under `uri`.
    pub fn unsubscribe(&self, uri: &str, observer: &Arc<dyn ChangeObserver>) {
        let target = Arc::downgrade(observer);
        let mut observers = self.lock();
        if let Some(list) = observers.get_mut(uri) {
            list.retain(|weak| !Weak::ptr_eq(weak, &target));
            if list.is_empty() {
                observers.remove(uri);
            }
        }
    }

    /// Signals `uri` to its live observers and returns how many were called.
    pub fn publish(&self, uri: &str) -> usize {
        let live = {
            let mut observers = self.lock();
            let Some(list) = observers.get_mut(uri) else {
                return 0;
            };
            let live: Vec<Arc<dyn ChangeObserver>> =
                list.iter().filter_map(Weak::upgrade).collect();
            list.retain(|weak| weak.strong_count() > 0);
            if list.is_empty() {
                observers.remove(uri);
            }
            live
        };

        for observer in &live {
            observer.on_change(uri);
        }
        trace!(
            "event=change_published module=notify status=ok uri={} observers={}",
            uri,
            live.len()
        );
        live.len()
    }

    /// Live registrations under `uri`.
    pub fn observer_count(&self, uri: &str) -> usize {
        self.lock()
            .get(uri)
            .map_or(0, |list| list.iter().filter(|weak| weak.strong_count() > 0).count())
    }

    // A panicking observer runs outside the lock, so the map itself is never
    // left half-updated.
    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Vec<Weak<dyn ChangeObserver>>>> {
        self.observers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
