use std::fmt;
use std::fmt::{Display, Formatter};
use std::time::Duration;

use moka::future::Cache;
use uuid::Uuid;

use crate::types::AccountId;

/// Opaque handle returned by a successful login.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct SessionId(String);

impl SessionId {
    fn generate() -> Self {
        SessionId(Uuid::now_v7().to_string())
    }
}

impl Display for SessionId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Maps live sessions to the account that signed in.
///
/// Only the account id is kept. The account itself is always re-read from the ledger, so a
/// session can never hold a stale copy of a balance or profile.
pub struct SessionRegistry {
    sessions: Cache<SessionId, AccountId>
}

impl SessionRegistry {
    pub fn new(capacity: u64, idle_timeout: Duration) -> Self {
        Self {
            sessions: Cache::builder()
                .max_capacity(capacity)
                .time_to_idle(idle_timeout)
                .build()
        }
    }

    pub async fn open(&self, account_id: &AccountId) -> SessionId {
        let session = SessionId::generate();
        self.sessions.insert(session.clone(), account_id.clone()).await;
        session
    }

    /// Returns the signed-in account id and refreshes the idle timer.
    pub async fn resolve(&self, session: &SessionId) -> Option<AccountId> {
        self.sessions.get(session).await
    }

    pub async fn close(&self, session: &SessionId) {
        self.sessions.invalidate(session).await;
    }
}
