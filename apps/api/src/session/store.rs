use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use crate::session::{Session, SessionError};

/// A session plus the last time any handler touched it, in milliseconds since
/// the store was built. Atomic so shared reads can stamp it.
struct Tracked {
    session: Session,
    last_seen_ms: AtomicU64,
}

/// Registry of live sessions. A session is dropped on explicit teardown or
/// once it has been idle for longer than `idle_ttl`.
///
/// Closures run under the lock and are synchronous, so a lock is never held
/// across a model call.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Tracked>>>,
    /// Zero disables idle eviction.
    idle_ttl: Duration,
    origin: Instant,
}

impl SessionStore {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_ttl,
            origin: Instant::now(),
        }
    }

    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Opens a fresh, empty session and returns its id and creation time.
    pub async fn create(&self) -> (Uuid, DateTime<Utc>) {
        let id = Uuid::new_v4();
        let session = Session::new();
        let created_at = session.created_at();
        let tracked = Tracked {
            session,
            last_seen_ms: AtomicU64::new(self.now_ms()),
        };
        self.sessions.write().await.insert(id, tracked);
        info!("Session {id} created");
        (id, created_at)
    }

    /// Tears a session down, discarding all of its state.
    pub async fn remove(&self, id: Uuid) -> Result<(), SessionError> {
        match self.sessions.write().await.remove(&id) {
            Some(_) => {
                info!("Session {id} closed");
                Ok(())
            }
            None => Err(SessionError::SessionNotFound(id)),
        }
    }

    pub async fn read<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&Session) -> Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        let sessions = self.sessions.read().await;
        let tracked = sessions.get(&id).ok_or(SessionError::SessionNotFound(id))?;
        tracked.last_seen_ms.store(self.now_ms(), Ordering::Relaxed);
        f(&tracked.session)
    }

    pub async fn write<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut Session) -> Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        let now = self.now_ms();
        let mut sessions = self.sessions.write().await;
        let tracked = sessions
            .get_mut(&id)
            .ok_or(SessionError::SessionNotFound(id))?;
        *tracked.last_seen_ms.get_mut() = now;
        f(&mut tracked.session)
    }

    /// Drops every session idle for at least `idle_ttl`. Returns how many went.
    pub async fn evict_idle(&self) -> usize {
        if self.idle_ttl.is_zero() {
            return 0;
        }
        let ttl_ms = u64::try_from(self.idle_ttl.as_millis()).unwrap_or(u64::MAX);
        let now = self.now_ms();

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, tracked| {
            let idle_ms = now.saturating_sub(tracked.last_seen_ms.load(Ordering::Relaxed));
            let keep = idle_ms < ttl_ms;
            if !keep {
                info!("Session {id} evicted after {}s idle", idle_ms / 1000);
            }
            keep
        });
        before - sessions.len()
    }

    /// How often the sweeper runs: a quarter of the TTL, between 1 s and 60 s.
    fn sweep_every(&self) -> Duration {
        (self.idle_ttl / 4).clamp(Duration::from_secs(1), Duration::from_secs(60))
    }

    /// Spawns the background idle sweeper. `None` when eviction is disabled.
    pub fn spawn_sweeper(&self) -> Option<JoinHandle<()>> {
        if self.idle_ttl.is_zero() {
            return None;
        }
        let store = self.clone();
        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(store.sweep_every());
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let evicted = store.evict_idle().await;
                if evicted > 0 {
                    debug!("Idle sweep removed {evicted} session(s)");
                }
            }
        }))
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
