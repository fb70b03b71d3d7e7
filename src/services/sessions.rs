use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use rusqlite::Connection;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::db::queries;
use crate::models::{Booking, Session};

/// Keyed conversation storage. `load` never fails: anything missing, expired
/// or unreadable comes back as a fresh session.
pub trait SessionStore: Send + Sync {
    fn load(&self, id: &str) -> Session;

    fn save(&self, session: &Session) -> anyhow::Result<()>;

    /// Records the booking and saves the session together; on error neither is written.
    fn commit_booking(&self, booking: &Booking, session: &Session) -> anyhow::Result<()>;
}

pub struct SqliteSessionStore {
    db: Arc<Mutex<Connection>>,
    ttl_minutes: i64,
}

impl SqliteSessionStore {
    pub fn new(db: Arc<Mutex<Connection>>, ttl_minutes: i64) -> Self {
        Self { db, ttl_minutes }
    }

    pub fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> anyhow::Result<T>,
    ) -> anyhow::Result<T> {
        let db = self
            .db
            .lock()
            .map_err(|_| anyhow!("database mutex poisoned"))?;
        f(&db)
    }
}

impl SessionStore for SqliteSessionStore {
    fn load(&self, id: &str) -> Session {
        match self.with_conn(|conn| queries::get_session(conn, id)) {
            Ok(Some(session)) => session,
            Ok(None) => Session::new(id),
            Err(e) => {
                tracing::error!(session = id, error = %e, "failed to load session, starting fresh");
                Session::new(id)
            }
        }
    }

    fn save(&self, session: &Session) -> anyhow::Result<()> {
        let mut session = session.clone();
        session.touch(self.ttl_minutes);
        self.with_conn(|conn| queries::save_session(conn, &session))
    }

    fn commit_booking(&self, booking: &Booking, session: &Session) -> anyhow::Result<()> {
        let mut session = session.clone();
        session.touch(self.ttl_minutes);
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            queries::create_booking(&tx, booking)?;
            queries::save_session(&tx, &session)?;
            tx.commit()?;
            Ok(())
        })
    }
}

/// One async mutex per caller so that a caller's turns run strictly one after another
/// while different callers proceed in parallel.
#[derive(Default)]
pub struct SessionLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl SessionLocks {
    pub async fn acquire(&self, id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            // Entries nobody holds or waits on can go.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(id.to_string()).or_default())
        };
        lock.lock_owned().await
    }
}
