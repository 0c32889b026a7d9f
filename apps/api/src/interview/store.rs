//! In-memory session registry. Each session sits behind its own async mutex,
//! which a turn holds for the whole completion stream.
//!
//! Sessions do not outlive the retention window: a background sweep removes
//! finished interviews after `finished_ttl` and abandoned ones after
//! `idle_ttl`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use crate::interview::models::Phase;
use crate::interview::session::Session;

#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<DashMap<Uuid, Arc<Mutex<Session>>>>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Checkout {
    NotFound,
    /// Another turn for this session is still streaming.
    Busy,
}

/// How long sessions are kept after their last state change.
#[derive(Debug, Clone, Copy)]
pub struct Retention {
    /// A `Done` interview stays readable this long.
    pub finished_ttl: Duration,
    /// Any other interview is dropped after this much inactivity.
    pub idle_ttl: Duration,
}

impl Retention {
    pub fn is_expired(&self, session: &Session, now: DateTime<Utc>) -> bool {
        // Negative elapsed (clock skew) counts as fresh.
        let elapsed = (now - session.last_activity())
            .to_std()
            .unwrap_or_default();
        let ttl = match session.phase() {
            Phase::Done => self.finished_ttl,
            _ => self.idle_ttl,
        };
        elapsed > ttl
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: Session) -> Uuid {
        let id = session.id();
        self.sessions.insert(id, Arc::new(Mutex::new(session)));
        id
    }

    /// Takes exclusive ownership of a session without waiting. The guard is
    /// `'static` so it can live inside a response stream.
    pub fn checkout(&self, id: Uuid) -> Result<OwnedMutexGuard<Session>, Checkout> {
        let entry = self.entry(id)?;
        entry.try_lock_owned().map_err(|_| Checkout::Busy)
    }

    /// Copy of the last committed state. Does not wait for an in-flight turn.
    pub fn snapshot(&self, id: Uuid) -> Result<Session, Checkout> {
        let entry = self.entry(id)?;
        let session = entry.try_lock().map_err(|_| Checkout::Busy)?;
        Ok(session.clone())
    }

    fn entry(&self, id: Uuid) -> Result<Arc<Mutex<Session>>, Checkout> {
        self.sessions
            .get(&id)
            .map(|e| Arc::clone(e.value()))
            .ok_or(Checkout::NotFound)
    }

    /// Removes every expired session and returns how many were dropped.
    /// Sessions with a turn in flight are skipped until the next sweep.
    pub fn evict_expired(&self, retention: &Retention, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| match session.try_lock() {
            Ok(session) => !retention.is_expired(&session, now),
            Err(_) => true,
        });
        before.saturating_sub(self.sessions.len())
    }

    /// Runs `evict_expired` every `every` until the runtime shuts down.
    pub fn spawn_sweeper(&self, retention: Retention, every: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let removed = store.evict_expired(&retention, Utc::now());
                if removed > 0 {
                    info!(removed, remaining = store.len(), "Evicted expired interview sessions");
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::interview::intake::IntakeForm;
    use crate::llm_client::scripted::{Scripted, ScriptedGateway};

    const RETENTION: Retention = Retention {
        finished_ttl: Duration::from_secs(15 * 60),
        idle_ttl: Duration::from_secs(60 * 60),
    };

    fn form() -> IntakeForm {
        IntakeForm {
            name: Some("Alice".to_string()),
            job_description: Some("Backend Engineer".to_string()),
            resume: Some(Bytes::from_static(b"resume bytes")),
            experience_value: Some(2),
            ..IntakeForm::default()
        }
    }

    async fn finished_session() -> Session {
        let gateway = ScriptedGateway::new(vec![
            Scripted::Reply(vec!["Q1?"]),
            Scripted::Reply(vec!["Summary. Thank you!"]),
        ]);
        let mut session = Session::new(1);
        session.submit_intake(form()).await.unwrap();
        session.open(&gateway).await.unwrap();
        session.respond(&gateway, "A1").await.unwrap();
        assert_eq!(session.phase(), Phase::Done);
        session
    }

    fn minutes(m: i64) -> chrono::Duration {
        chrono::Duration::minutes(m)
    }

    #[tokio::test]
    async fn test_checkout_unknown_session() {
        let store = SessionStore::new();
        assert_eq!(store.checkout(Uuid::new_v4()).err(), Some(Checkout::NotFound));
    }

    #[tokio::test]
    async fn test_second_checkout_is_busy_until_released() {
        let store = SessionStore::new();
        let id = store.insert(Session::new(3));

        let guard = store.checkout(id).unwrap();
        assert_eq!(store.checkout(id).err(), Some(Checkout::Busy));
        drop(guard);
        assert!(store.checkout(id).is_ok());
    }

    #[tokio::test]
    async fn test_snapshot_does_not_wait_for_in_flight_turn() {
        let store = SessionStore::new();
        let id = store.insert(Session::new(3));

        let guard = store.checkout(id).unwrap();
        assert_eq!(store.snapshot(id).err(), Some(Checkout::Busy));
        drop(guard);
        assert_eq!(store.snapshot(id).unwrap().id(), id);
        assert_eq!(store.snapshot(Uuid::new_v4()).err(), Some(Checkout::NotFound));
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionStore::new();
        let a = store.insert(Session::new(3));
        let b = store.insert(Session::new(5));
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);

        let _held = store.checkout(a).unwrap();
        assert!(store.checkout(b).is_ok());
        assert_eq!(store.snapshot(b).unwrap().id(), b);
    }

    #[tokio::test]
    async fn test_finished_session_is_evicted_after_window() {
        let store = SessionStore::new();
        let done = finished_session().await;
        let finished_at = done.last_activity();
        let id = store.insert(done);

        // Still readable inside the window.
        assert_eq!(store.evict_expired(&RETENTION, finished_at + minutes(10)), 0);
        assert_eq!(store.snapshot(id).unwrap().phase(), Phase::Done);

        assert_eq!(store.evict_expired(&RETENTION, finished_at + minutes(16)), 1);
        assert_eq!(store.snapshot(id).err(), Some(Checkout::NotFound));
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_many_finished_sessions_are_all_evicted() {
        let store = SessionStore::new();
        let mut latest = Utc::now();
        for _ in 0..20 {
            let done = finished_session().await;
            latest = latest.max(done.last_activity());
            store.insert(done);
        }
        assert_eq!(store.len(), 20);
        assert_eq!(store.evict_expired(&RETENTION, latest + minutes(16)), 20);
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_active_session_uses_idle_window() {
        let store = SessionStore::new();
        let session = Session::new(3);
        let started = session.last_activity();
        let id = store.insert(session);

        // Past the finished window but inside the idle window.
        assert_eq!(store.evict_expired(&RETENTION, started + minutes(30)), 0);
        assert!(store.snapshot(id).is_ok());

        assert_eq!(store.evict_expired(&RETENTION, started + minutes(61)), 1);
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_sweep_skips_session_with_turn_in_flight() {
        let store = SessionStore::new();
        let session = Session::new(3);
        let started = session.last_activity();
        let id = store.insert(session);

        let guard = store.checkout(id).unwrap();
        assert_eq!(store.evict_expired(&RETENTION, started + minutes(120)), 0);
        drop(guard);
        assert_eq!(store.evict_expired(&RETENTION, started + minutes(120)), 1);
    }
}
