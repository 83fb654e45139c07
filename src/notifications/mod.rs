// notifications/mod.rs - Per-user toast store with explicit subscriptions
//
// The store is an owned service held in application state. Listeners get a
// `Subscription` from `subscribe()` and stop listening by dropping it.
// `shutdown()` cancels pending removals and empties the store.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

const EVENT_CAPACITY: usize = 64;

/// Once keys remembered per user; the oldest is forgotten past this
const ANNOUNCED_LIMIT: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastVariant {
    #[default]
    Default,
    Success,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Toast {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub variant: ToastVariant,
    pub open: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for `ToastStore::add`
#[derive(Debug, Clone, Default)]
pub struct NewToast {
    pub title: String,
    pub description: Option<String>,
    pub variant: ToastVariant,
    /// When set, a toast with this key is only ever announced once per user
    pub once_key: Option<String>,
}

impl NewToast {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn variant(mut self, variant: ToastVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn once(mut self, key: impl Into<String>) -> Self {
        self.once_key = Some(key.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToastEvent {
    Added { user_id: String, toast: Toast },
    Updated { user_id: String, toast: Toast },
    Dismissed { user_id: String, id: String },
    Removed { user_id: String, id: String },
}

#[derive(Default)]
struct State {
    toasts: HashMap<String, Vec<Toast>>,
    announced: HashMap<String, VecDeque<String>>,
    timers: HashMap<String, JoinHandle<()>>,
}

struct Inner {
    state: Mutex<State>,
    events: broadcast::Sender<ToastEvent>,
    limit: usize,
    remove_delay: Duration,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit(&self, event: ToastEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(|poisoned| poisoned.into_inner());
        for (_, timer) in state.timers.drain() {
            timer.abort();
        }
    }
}

#[derive(Clone)]
pub struct ToastStore {
    inner: Arc<Inner>,
}

/// Live feed of store changes; dropping it unsubscribes
pub struct Subscription {
    rx: broadcast::Receiver<ToastEvent>,
}

impl Subscription {
    /// Next event, or `None` once the store is gone
    pub async fn recv(&mut self) -> Option<ToastEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Toast subscriber lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn try_recv(&mut self) -> Option<ToastEvent> {
        self.rx.try_recv().ok()
    }
}

impl ToastStore {
    pub fn new(limit: usize, remove_delay: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                events,
                limit: limit.max(1),
                remove_delay,
            }),
        }
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.inner.events.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.events.receiver_count()
    }

    /// Add a toast at the front of the user's list. Returns `None` when a
    /// `once` key was already announced to this user.
    pub fn add(&self, user_id: &str, new: NewToast) -> Option<Toast> {
        let toast = Toast {
            id: Uuid::new_v4().to_string(),
            title: new.title,
            description: new.description,
            variant: new.variant,
            open: true,
            created_at: Utc::now(),
        };

        let evicted = {
            let mut state = self.inner.lock();

            if let Some(key) = new.once_key {
                let announced = state.announced.entry(user_id.to_string()).or_default();
                if announced.contains(&key) {
                    return None;
                }
                if announced.len() >= ANNOUNCED_LIMIT {
                    announced.pop_front();
                }
                announced.push_back(key);
            }

            let list = state.toasts.entry(user_id.to_string()).or_default();
            list.insert(0, toast.clone());
            let evicted: Vec<Toast> = if list.len() > self.inner.limit {
                list.split_off(self.inner.limit)
            } else {
                Vec::new()
            };

            for old in &evicted {
                if let Some(timer) = state.timers.remove(&old.id) {
                    timer.abort();
                }
            }
            evicted
        };

        self.inner.emit(ToastEvent::Added {
            user_id: user_id.to_string(),
            toast: toast.clone(),
        });
        for old in evicted {
            self.inner.emit(ToastEvent::Removed {
                user_id: user_id.to_string(),
                id: old.id,
            });
        }

        Some(toast)
    }

    pub fn update(
        &self,
        user_id: &str,
        id: &str,
        title: Option<String>,
        description: Option<String>,
    ) -> Option<Toast> {
        let updated = {
            let mut state = self.inner.lock();
            let toast = state
                .toasts
                .get_mut(user_id)
                .and_then(|list| list.iter_mut().find(|t| t.id == id))?;
            if let Some(title) = title {
                toast.title = title;
            }
            if description.is_some() {
                toast.description = description;
            }
            toast.clone()
        };

        self.inner.emit(ToastEvent::Updated {
            user_id: user_id.to_string(),
            toast: updated.clone(),
        });
        Some(updated)
    }

    /// Close a toast and schedule its removal. Returns false if unknown.
    pub fn dismiss(&self, user_id: &str, id: &str) -> bool {
        {
            let mut state = self.inner.lock();
            let Some(toast) = state
                .toasts
                .get_mut(user_id)
                .and_then(|list| list.iter_mut().find(|t| t.id == id))
            else {
                return false;
            };
            if !toast.open {
                return true;
            }
            toast.open = false;
        }

        self.inner.emit(ToastEvent::Dismissed {
            user_id: user_id.to_string(),
            id: id.to_string(),
        });
        self.schedule_removal(user_id, id);
        true
    }

    fn schedule_removal(&self, user_id: &str, id: &str) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            self.remove(user_id, id);
            return;
        };

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let delay = self.inner.remove_delay;
        let (user, toast_id) = (user_id.to_string(), id.to_string());

        // The timer's own `remove` needs this lock, so its handle is always
        // registered before it can run
        let mut state = self.inner.lock();
        let timer = handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                ToastStore { inner }.remove(&user, &toast_id);
            }
        });
        if let Some(previous) = state.timers.insert(id.to_string(), timer) {
            previous.abort();
        }
    }

    pub fn remove(&self, user_id: &str, id: &str) -> bool {
        let removed = {
            let mut state = self.inner.lock();
            if let Some(timer) = state.timers.remove(id) {
                timer.abort();
            }
            let removed = match state.toasts.get_mut(user_id) {
                Some(list) => {
                    let before = list.len();
                    list.retain(|t| t.id != id);
                    list.len() != before
                }
                None => false,
            };
            if state.toasts.get(user_id).is_some_and(Vec::is_empty) {
                state.toasts.remove(user_id);
            }
            removed
        };

        if removed {
            self.inner.emit(ToastEvent::Removed {
                user_id: user_id.to_string(),
                id: id.to_string(),
            });
        }
        removed
    }

    /// Newest first
    pub fn list(&self, user_id: &str) -> Vec<Toast> {
        self.inner.lock().toasts.get(user_id).cloned().unwrap_or_default()
    }

    /// Cancel pending removals and drop every toast
    pub fn shutdown(&self) {
        let mut state = self.inner.lock();
        for (_, timer) in state.timers.drain() {
            timer.abort();
        }
        state.toasts.clear();
        state.announced.clear();
        tracing::debug!("Toast store shut down");
    }

    #[cfg(test)]
    fn pending_removals(&self) -> usize {
        self.inner.lock().timers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(limit: usize) -> ToastStore {
        ToastStore::new(limit, Duration::from_millis(20))
    }

    #[test]
    fn newest_first_and_capped() {
        let store = store(2);
        store.add("u1", NewToast::new("one"));
        store.add("u1", NewToast::new("two"));
        store.add("u1", NewToast::new("three"));

        let titles: Vec<_> = store.list("u1").into_iter().map(|t| t.title).collect();
        assert_eq!(titles, ["three", "two"]);
        assert!(store.list("u2").is_empty());
    }

    #[test]
    fn once_key_announces_once_per_user() {
        let store = store(5);
        assert!(store.add("u1", NewToast::new("Badge earned").once("badge:team")).is_some());
        assert!(store.add("u1", NewToast::new("Badge earned").once("badge:team")).is_none());
        assert!(store.add("u2", NewToast::new("Badge earned").once("badge:team")).is_some());
        assert_eq!(store.list("u1").len(), 1);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let store = store(5);
        let first = store.subscribe();
        let second = store.subscribe();
        assert_eq!(store.subscriber_count(), 2);

        drop(first);
        assert_eq!(store.subscriber_count(), 1);
        drop(second);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn subscribers_see_add_and_update() {
        let store = store(5);
        let mut sub = store.subscribe();

        let toast = store.add("u1", NewToast::new("Saved")).unwrap();
        store.update("u1", &toast.id, Some("Saved!".to_string()), None);

        assert!(matches!(sub.try_recv(), Some(ToastEvent::Added { .. })));
        match sub.try_recv() {
            Some(ToastEvent::Updated { toast, .. }) => assert_eq!(toast.title, "Saved!"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn dismiss_closes_then_removes() {
        let store = store(5);
        let mut sub = store.subscribe();
        let toast = store.add("u1", NewToast::new("Hello")).unwrap();

        assert!(store.dismiss("u1", &toast.id));
        assert!(!store.list("u1")[0].open);

        let mut removed = false;
        while let Ok(Some(event)) =
            tokio::time::timeout(Duration::from_millis(500), sub.recv()).await
        {
            if matches!(event, ToastEvent::Removed { .. }) {
                removed = true;
                break;
            }
        }
        assert!(removed);
        assert!(store.list("u1").is_empty());
    }

    #[test]
    fn once_keys_are_bounded_per_user() {
        let store = store(5);
        for n in 0..=ANNOUNCED_LIMIT {
            store.add("u1", NewToast::new("Badge earned").once(format!("badge:{}", n)));
        }

        // The first key fell out of the window; the newest is still remembered
        assert!(store.add("u1", NewToast::new("Badge earned").once("badge:0")).is_some());
        assert!(store
            .add("u1", NewToast::new("Badge earned").once(format!("badge:{}", ANNOUNCED_LIMIT)))
            .is_none());
        assert_eq!(store.inner.lock().announced["u1"].len(), ANNOUNCED_LIMIT);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn immediate_removals_leave_no_timers_behind() {
        let store = ToastStore::new(100, Duration::ZERO);
        for n in 0..50 {
            let toast = store.add("u1", NewToast::new(format!("toast {}", n))).unwrap();
            store.dismiss("u1", &toast.id);
        }

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(store.list("u1").is_empty());
        assert_eq!(store.pending_removals(), 0);
        assert!(!store.inner.lock().toasts.contains_key("u1"));
    }

    #[tokio::test]
    async fn manual_remove_cancels_timer() {
        let store = ToastStore::new(5, Duration::from_secs(60));
        let toast = store.add("u1", NewToast::new("Hello")).unwrap();
        store.dismiss("u1", &toast.id);
        assert_eq!(store.pending_removals(), 1);

        assert!(store.remove("u1", &toast.id));
        assert_eq!(store.pending_removals(), 0);
    }

    #[tokio::test]
    async fn shutdown_cancels_pending_removals() {
        let store = ToastStore::new(5, Duration::from_secs(60));
        let toast = store.add("u1", NewToast::new("Bye")).unwrap();
        store.dismiss("u1", &toast.id);

        store.shutdown();
        assert!(store.list("u1").is_empty());
        assert!(!store.dismiss("u1", &toast.id));
    }
}
