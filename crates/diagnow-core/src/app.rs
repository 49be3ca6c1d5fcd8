//! Composition root.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::info;

use crate::api::{ApiClient, HttpTransport};
use crate::config::Config;
use crate::db::Database;
use crate::services::{AuthService, PatientService, PrescriptionService};
use crate::session::Session;
use crate::store::{Backend, BackendKind, LocalBackend, RemoteBackend, StoreResult};

/// The running application: storage, the selected backend and the session.
///
/// The backend is chosen once from [`Config`] and never switches.
pub struct App {
    config: Config,
    db: Arc<Mutex<Database>>,
    backend: Box<dyn Backend>,
    session: Session,
}

impl App {
    /// Open storage, pick a backend and restore any stored session.
    ///
    /// Offline mode seeds demo data on first start.
    pub fn from_config(config: Config) -> StoreResult<Self> {
        let db = match &config.data_path {
            Some(path) => Database::open(path)?,
            None => Database::open_in_memory()?,
        };
        let db = Arc::new(Mutex::new(db));

        let backend: Box<dyn Backend> = if config.use_local_storage {
            db.lock()?.seed_demo_data()?;
            Box::new(LocalBackend::new(db.clone()))
        } else {
            let transport = HttpTransport::new(&config.api_url, config.request_timeout_secs)?;
            Box::new(RemoteBackend::new(ApiClient::new(transport, db.clone())))
        };

        Self::with_backend(config, db, backend)
    }

    /// Offline, in-memory, seeded.
    pub fn local_in_memory() -> StoreResult<Self> {
        Self::from_config(Config::local())
    }

    /// Assemble around an existing backend, e.g. a remote one over a mock
    /// transport.
    pub fn with_backend(
        config: Config,
        db: Arc<Mutex<Database>>,
        backend: Box<dyn Backend>,
    ) -> StoreResult<Self> {
        let session = Session::restore(&*db.lock()?, Utc::now())?;
        info!(
            backend = ?backend.kind(),
            authenticated = session.is_authenticated(),
            "app started"
        );
        Ok(Self {
            config,
            db,
            backend,
            session,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn db(&self) -> &Arc<Mutex<Database>> {
        &self.db
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn patients(&self) -> PatientService<'_> {
        PatientService::new(self.backend.as_ref())
    }

    pub fn prescriptions(&self) -> PrescriptionService<'_> {
        PrescriptionService::new(self.backend.as_ref())
    }

    pub fn auth(&mut self) -> AuthService<'_> {
        AuthService::new(self.backend.as_ref(), &self.db, &mut self.session)
    }

    /// Pass a service result through, ending the session if the server
    /// rejected our token.
    pub fn observe<T>(&mut self, result: StoreResult<T>) -> StoreResult<T> {
        if let Err(e) = &result {
            if e.is_unauthorized() {
                self.expire_session()?;
            }
        }
        result
    }

    /// Drop the session after a 401.
    pub fn expire_session(&mut self) -> StoreResult<()> {
        let db = self.db.lock()?;
        self.session.expire(&db)?;
        Ok(())
    }
}
