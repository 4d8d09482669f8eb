//! Permission store: fetch, revalidate, and keep the newest result.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::runtime::Handle;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::{PermissionSource, PermissionState, RevalidatePolicy, RevalidateTrigger, SourceError};

/// Outcome of one revalidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revalidation {
    /// The fetched set is now the current state.
    Applied,
    /// A newer fetch started while this one was in flight; its result was dropped.
    Superseded,
    /// The fetch failed; the previous permissions (if any) remain.
    Failed(SourceError),
}

/// Holds the permission state for one user session.
///
/// Fetches may overlap. The last one started wins: results arriving for an
/// older generation are discarded.
pub struct PermissionStore<S> {
    source: S,
    policy: RevalidatePolicy,
    fetch_timeout: Duration,
    state: Arc<RwLock<PermissionState>>,
}

/// Marks one revalidation as in flight.
///
/// Dropping it while still armed (the revalidation future was cancelled
/// mid-fetch) clears `is_validating`, unless a newer fetch owns the flag.
struct InFlight {
    state: Arc<RwLock<PermissionState>>,
    generation: u64,
    armed: bool,
}

impl InFlight {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let generation = self.generation;
        tracing::debug!(generation, "permission revalidation cancelled");

        match self.state.try_write() {
            Ok(mut state) => settle_cancelled(&mut state, generation),
            Err(_) => {
                // Lock is busy; finish the cleanup once it frees up.
                let state = Arc::clone(&self.state);
                if let Ok(handle) = Handle::try_current() {
                    handle.spawn(async move {
                        settle_cancelled(&mut *state.write().await, generation);
                    });
                }
            }
        }
    }
}

fn settle_cancelled(state: &mut PermissionState, generation: u64) {
    if state.generation == generation {
        state.is_validating = false;
    }
}

impl<S: PermissionSource> PermissionStore<S> {
    pub fn new(source: S, policy: RevalidatePolicy, fetch_timeout: Duration) -> Self {
        Self {
            source,
            policy,
            fetch_timeout,
            state: Arc::new(RwLock::new(PermissionState::default())),
        }
    }

    /// Copy of the current state, for one render.
    pub async fn snapshot(&self) -> PermissionState {
        self.state.read().await.clone()
    }

    /// React to a host event; returns `None` when the policy ignores it.
    pub async fn trigger(&self, trigger: RevalidateTrigger) -> Option<Revalidation> {
        if !self.policy.allows(trigger) {
            tracing::debug!(?trigger, "revalidation trigger ignored by policy");
            return None;
        }
        Some(self.revalidate().await)
    }

    /// Fetch permissions now.
    ///
    /// Cancel-safe: dropping the returned future mid-fetch leaves the state
    /// as it was, minus the validating flag this call raised.
    pub async fn revalidate(&self) -> Revalidation {
        let in_flight = {
            let mut state = self.state.write().await;
            state.generation += 1;
            state.is_validating = true;
            InFlight {
                state: Arc::clone(&self.state),
                generation: state.generation,
                armed: true,
            }
        };
        let generation = in_flight.generation;
        tracing::debug!(generation, "permission revalidation started");

        let result = match tokio::time::timeout(self.fetch_timeout, self.source.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout(self.fetch_timeout)),
        };

        let mut state = self.state.write().await;
        in_flight.disarm();
        if state.generation != generation {
            tracing::debug!(
                generation,
                current = state.generation,
                "discarding superseded permission fetch"
            );
            return Revalidation::Superseded;
        }

        state.is_validating = false;
        match result {
            Ok(permissions) => {
                tracing::info!(generation, count = permissions.len(), "permissions resolved");
                state.permissions = Some(permissions);
                state.last_error = None;
                state.validated_at = Some(Utc::now());
                Revalidation::Applied
            }
            Err(error) => {
                // Keep the last known-good set; unresolved stays empty (fail closed).
                tracing::warn!(generation, %error, "permission fetch failed");
                state.last_error = Some(error.clone());
                Revalidation::Failed(error)
            }
        }
    }
}

impl<S: PermissionSource + 'static> PermissionStore<S> {
    /// Spawn the periodic refresh configured by the policy, if any.
    pub fn spawn_interval(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let period = self.policy.interval?;
        let store = Arc::clone(self);
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately; mount already fetched.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                store.trigger(RevalidateTrigger::Interval).await;
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use routeguard_auth::PermissionSet;

    use super::*;
    use crate::{DelayedSource, StaticSource};

    fn held(names: &[&'static str]) -> PermissionSet {
        names.iter().copied().collect()
    }

    /// Replays a script of (delay, result) pairs, one per fetch.
    struct ScriptedSource {
        script: Mutex<VecDeque<(Duration, Result<PermissionSet, SourceError>)>>,
    }

    impl ScriptedSource {
        fn new(steps: Vec<(Duration, Result<PermissionSet, SourceError>)>) -> Self {
            Self {
                script: Mutex::new(steps.into()),
            }
        }
    }

    #[async_trait]
    impl PermissionSource for ScriptedSource {
        async fn fetch(&self) -> Result<PermissionSet, SourceError> {
            let step = self.script.lock().unwrap().pop_front();
            let (delay, result) = step.expect("script exhausted");
            tokio::time::sleep(delay).await;
            result
        }
    }

    fn store<S: PermissionSource>(source: S) -> PermissionStore<S> {
        PermissionStore::new(source, RevalidatePolicy::default(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn revalidate_applies_fetched_permissions() {
        let store = store(StaticSource::granting(held(&["admin"])));
        assert!(store.snapshot().await.auth().is_empty());

        assert_eq!(store.revalidate().await, Revalidation::Applied);

        let state = store.snapshot().await;
        assert_eq!(state.auth(), held(&["admin"]));
        assert!(!state.is_validating);
        assert!(state.validated_at.is_some());
        assert_eq!(state.generation, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn state_is_validating_while_fetch_in_flight() {
        let store = Arc::new(store(DelayedSource::new(
            StaticSource::granting(held(&["admin"])),
            Duration::from_secs(1),
        )));

        let pending = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.revalidate().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        let during = store.snapshot().await;
        assert!(during.is_validating);
        assert!(during.auth().is_empty());

        assert_eq!(pending.await.unwrap(), Revalidation::Applied);
        assert!(!store.snapshot().await.is_validating);
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_fetch_is_discarded() {
        let store = store(ScriptedSource::new(vec![
            (Duration::from_millis(100), Ok(held(&["viewer"]))),
            (Duration::from_millis(10), Ok(held(&["admin"]))),
        ]));

        let (slow, fast) = tokio::join!(store.revalidate(), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            store.revalidate().await
        });

        assert_eq!(slow, Revalidation::Superseded);
        assert_eq!(fast, Revalidation::Applied);
        assert_eq!(store.snapshot().await.auth(), held(&["admin"]));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_revalidation_clears_validating() {
        let store = Arc::new(store(DelayedSource::new(
            StaticSource::granting(held(&["admin"])),
            Duration::from_secs(1),
        )));

        let pending = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.revalidate().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(store.snapshot().await.is_validating);

        pending.abort();
        assert!(pending.await.unwrap_err().is_cancelled());
        tokio::time::sleep(Duration::from_secs(2)).await;

        let state = store.snapshot().await;
        assert!(!state.is_validating);
        assert!(!state.is_resolved());
        assert_eq!(state.generation, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_stale_fetch_leaves_newer_fetch_validating() {
        let store = Arc::new(store(ScriptedSource::new(vec![
            (Duration::from_secs(5), Ok(held(&["viewer"]))),
            (Duration::from_secs(1), Ok(held(&["admin"]))),
        ])));

        let stale = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.revalidate().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        let fresh = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.revalidate().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        stale.abort();
        assert!(stale.await.unwrap_err().is_cancelled());
        assert!(store.snapshot().await.is_validating);

        assert_eq!(fresh.await.unwrap(), Revalidation::Applied);
        let state = store.snapshot().await;
        assert!(!state.is_validating);
        assert_eq!(state.auth(), held(&["admin"]));
    }

    #[tokio::test]
    async fn failure_keeps_last_known_good_permissions() {
        let store = store(ScriptedSource::new(vec![
            (Duration::ZERO, Ok(held(&["admin"]))),
            (Duration::ZERO, Err(SourceError::Network("connection reset".into()))),
        ]));

        store.revalidate().await;
        let outcome = store.revalidate().await;

        assert!(matches!(outcome, Revalidation::Failed(SourceError::Network(_))));
        let state = store.snapshot().await;
        assert_eq!(state.auth(), held(&["admin"]));
        assert!(state.last_error.is_some());
        assert!(!state.is_validating);
    }

    #[tokio::test]
    async fn failure_before_first_success_fails_closed() {
        let store = store(StaticSource::failing(SourceError::Unauthorized));
        store.revalidate().await;

        let state = store.snapshot().await;
        assert!(!state.is_resolved());
        assert!(state.auth().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetch_times_out() {
        let store = PermissionStore::new(
            DelayedSource::new(StaticSource::granting(held(&["admin"])), Duration::from_secs(60)),
            RevalidatePolicy::default(),
            Duration::from_secs(2),
        );

        let outcome = store.revalidate().await;
        assert_eq!(
            outcome,
            Revalidation::Failed(SourceError::Timeout(Duration::from_secs(2)))
        );
    }

    #[tokio::test]
    async fn focus_trigger_ignored_by_default() {
        let store = store(StaticSource::granting(held(&["admin"])));
        assert_eq!(store.trigger(RevalidateTrigger::Focus).await, None);
        assert_eq!(store.snapshot().await.generation, 0);

        assert_eq!(
            store.trigger(RevalidateTrigger::Mount).await,
            Some(Revalidation::Applied)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn interval_refreshes_periodically() {
        let store = Arc::new(PermissionStore::new(
            StaticSource::granting(held(&["admin"])),
            RevalidatePolicy {
                interval: Some(Duration::from_secs(30)),
                ..RevalidatePolicy::default()
            },
            Duration::from_secs(5),
        ));

        let handle = store.spawn_interval().expect("interval configured");
        tokio::time::sleep(Duration::from_secs(95)).await;
        handle.abort();

        assert_eq!(store.snapshot().await.generation, 3);
    }

    #[tokio::test]
    async fn no_interval_task_without_period() {
        let store = Arc::new(store(StaticSource::granting(held(&[]))));
        assert!(store.spawn_interval().is_none());
    }
}
