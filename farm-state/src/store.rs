//! The single owner of application state.
//!
//! All changes flow through [`StateStore::dispatch`]. Dispatches are
//! serialized, so subscribers observe transitions in the order they were
//! applied.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::action::Action;
use crate::state::{AppState, Collection, Result};
use crate::storage::{load_state, KeyValueStore, PersistenceSubscriber};

/// Observer notified after every successful dispatch.
#[async_trait]
pub trait StateSubscriber: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Called with the new state and the collections the dispatch replaced.
    async fn on_change(&self, state: &AppState, changed: &[Collection]) -> Result<()>;
}

/// Holds the current [`AppState`] and applies actions to it.
pub struct StateStore {
    state: RwLock<Arc<AppState>>,
    subscribers: RwLock<Vec<Arc<dyn StateSubscriber>>>,
    dispatch_lock: Mutex<()>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(AppState::default())
    }
}

impl StateStore {
    pub fn new(initial: AppState) -> Self {
        Self {
            state: RwLock::new(Arc::new(initial)),
            subscribers: RwLock::new(Vec::new()),
            dispatch_lock: Mutex::new(()),
        }
    }

    /// Hydrate from storage and persist every later change back to it.
    pub async fn load(kv: Arc<dyn KeyValueStore>) -> Result<Self> {
        let state = load_state(kv.as_ref()).await?;
        info!(
            farms = state.farms.len(),
            tasks = state.tasks.len(),
            "Loaded application state"
        );

        let store = Self::new(state);
        store
            .subscribe(Arc::new(PersistenceSubscriber::new(kv)))
            .await;
        Ok(store)
    }

    pub async fn subscribe(&self, subscriber: Arc<dyn StateSubscriber>) {
        self.subscribers.write().await.push(subscriber);
    }

    /// Current state.
    pub async fn snapshot(&self) -> Arc<AppState> {
        self.state.read().await.clone()
    }

    /// Apply `action` and notify subscribers.
    ///
    /// A rejected action leaves the state unchanged and notifies no one.
    /// Subscriber failures are logged; the new state stays in place.
    pub async fn dispatch(&self, action: Action) -> Result<Arc<AppState>> {
        let _guard = self.dispatch_lock.lock().await;
        let label = action.label();

        let current = self.snapshot().await;
        let (next, changed) = match current.apply(action) {
            Ok(transition) => transition,
            Err(e) => {
                warn!(action = label, error = %e, "Action rejected");
                return Err(e);
            }
        };

        let next = Arc::new(next);
        *self.state.write().await = next.clone();
        info!(action = label, changed = changed.len(), "Dispatched action");

        if changed.is_empty() {
            return Ok(next);
        }

        let subscribers = self.subscribers.read().await.clone();
        for subscriber in subscribers {
            if let Err(e) = subscriber.on_change(&next, &changed).await {
                warn!(subscriber = subscriber.name(), error = %e, "Subscriber failed");
            }
        }

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Task;
    use crate::storage::MemoryKeyValueStore;
    use crate::StateError;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicU32, Ordering};
    use sustainability::Farm;

    /// Counts notifications; optionally fails every one.
    struct CountingSubscriber {
        calls: AtomicU32,
        fail: bool,
    }

    impl CountingSubscriber {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicU32::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl StateSubscriber for CountingSubscriber {
        fn name(&self) -> &str {
            "counting"
        }

        async fn on_change(&self, _state: &AppState, _changed: &[Collection]) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(StateError::InvalidFormat("subscriber down".to_string()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_dispatch_notifies_subscribers() {
        let store = StateStore::default();
        let subscriber = Arc::new(CountingSubscriber::new(false));
        store.subscribe(subscriber.clone()).await;

        store
            .dispatch(Action::AddFarm(Farm::new(0, "North", "corn")))
            .await
            .unwrap();
        assert_eq!(subscriber.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.snapshot().await.farms.len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_action_notifies_no_one() {
        let store = StateStore::default();
        let subscriber = Arc::new(CountingSubscriber::new(false));
        store.subscribe(subscriber.clone()).await;

        let result = store.dispatch(Action::DeleteFarm { farm_id: 4 }).await;
        assert!(matches!(result, Err(StateError::NotFound { .. })));
        assert_eq!(subscriber.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failing_subscriber_keeps_state() {
        let store = StateStore::default();
        store.subscribe(Arc::new(CountingSubscriber::new(true))).await;

        let state = store
            .dispatch(Action::AddTask(Task {
                id: 0,
                title: "Order seed".to_string(),
                due_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                priority: "medium".to_string(),
                completed: false,
            }))
            .await
            .unwrap();
        assert_eq!(state.tasks.len(), 1);
        assert_eq!(store.snapshot().await.tasks.len(), 1);
    }

    #[tokio::test]
    async fn test_load_persists_changes() {
        let kv = MemoryKeyValueStore::new();
        let store = StateStore::load(Arc::new(kv.clone())).await.unwrap();
        assert!(kv.is_empty().await);

        store
            .dispatch(Action::AddFarm(Farm::new(0, "North", "corn")))
            .await
            .unwrap();
        assert_eq!(kv.keys().await.unwrap(), vec!["farms"]);

        let reloaded = StateStore::load(Arc::new(kv)).await.unwrap();
        assert_eq!(reloaded.snapshot().await.farms[0].name, "North");
    }

    #[tokio::test]
    async fn test_concurrent_dispatches_all_apply() {
        let store = Arc::new(StateStore::default());
        let mut handles = Vec::new();
        for i in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .dispatch(Action::AddFarm(Farm::new(0, format!("Farm {i}"), "corn")))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let state = store.snapshot().await;
        let mut ids: Vec<u64> = state.farms.iter().map(|f| f.id).collect();
        ids.sort();
        assert_eq!(ids, (1..=10).collect::<Vec<_>>());
    }
}
