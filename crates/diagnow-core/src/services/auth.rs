use std::sync::Mutex;

use tracing::warn;

use crate::db::Database;
use crate::models::{AuthPayload, Credentials, Registration, User};
use crate::session::Session;
use crate::store::{Backend, StoreResult};

/// Login, registration and logout, driving the session state machine.
pub struct AuthService<'a> {
    backend: &'a dyn Backend,
    db: &'a Mutex<Database>,
    session: &'a mut Session,
}

impl<'a> AuthService<'a> {
    pub fn new(backend: &'a dyn Backend, db: &'a Mutex<Database>, session: &'a mut Session) -> Self {
        Self {
            backend,
            db,
            session,
        }
    }

    /// Authenticate and persist the issued token and user.
    pub fn login(&mut self, credentials: &Credentials) -> StoreResult<User> {
        self.session.begin_login();
        let result = self.backend.login(credentials);
        self.finish(result)
    }

    /// Create an account and sign straight into it.
    pub fn register(&mut self, registration: &Registration) -> StoreResult<User> {
        self.session.begin_login();
        let result = self.backend.register(registration);
        self.finish(result)
    }

    /// Clear stored credentials. Never fails on the backend side.
    pub fn logout(&mut self) -> StoreResult<()> {
        let db = self.db.lock()?;
        self.session.logout(&db)?;
        Ok(())
    }

    fn finish(&mut self, result: StoreResult<AuthPayload>) -> StoreResult<User> {
        match result {
            Ok(payload) => {
                let user = payload.user.clone();
                let db = self.db.lock()?;
                self.session.complete_login(&db, payload)?;
                Ok(user)
            }
            Err(e) => {
                warn!(error = %e, "authentication failed");
                self.session.fail_login();
                Err(e)
            }
        }
    }
}
