//! DiagNow Core Library
//!
//! Patient and prescription management for doctors, usable offline against a
//! local store or online against the DiagNow REST API.
//!
//! # Architecture
//!
//! ```text
//!                 Views / host app
//!                        │
//!        ┌───────────────┼────────────────┐
//!        ▼               ▼                ▼
//!   AuthService    PatientService  PrescriptionService
//!        │               │                │
//!        └───────────────┼────────────────┘
//!                        ▼
//!                  dyn Backend  (chosen once from Config)
//!                 ┌──────┴───────┐
//!                 ▼              ▼
//!           LocalBackend    RemoteBackend
//!                 │              │
//!                 │          ApiClient ── bearer token, 401 ⇒ sign out
//!                 │              │
//!                 ▼              ▼
//!          SQLite kv_store    HTTP
//! ```
//!
//! The session token and user always live in the local store, whichever
//! backend serves the data.
//!
//! # Modules
//!
//! - [`db`]: SQLite key-value store and demo seed data
//! - [`models`]: Domain types (Patient, Prescription, Medication, User)
//! - [`api`]: REST client, transports and wire formats
//! - [`store`]: The storage capability and its two backends
//! - [`services`]: Auth, patient and prescription operations
//! - [`session`]: Authentication state machine
//! - [`config`]: Runtime configuration and logging

pub mod api;
pub mod app;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod session;
pub mod store;

// Re-export commonly used types
pub use app::App;
pub use config::Config;
pub use db::Database;
pub use models::{
    AuthPayload, CreatedPrescription, Credentials, Medication, MedicationFailure, Patient,
    PatientInput, Prescription, PrescriptionInput, PrescriptionStatus, Registration, User,
};
pub use services::{filter_patients, filter_prescriptions};
pub use session::{Session, SessionState};
pub use store::{Backend, BackendKind, StoreError, StoreResult};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum DiagnowError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<StoreError> for DiagnowError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Validation(message) => DiagnowError::InvalidInput(message),
            StoreError::NotFound { .. } => DiagnowError::NotFound(e.to_string()),
            StoreError::Unauthorized(message) => DiagnowError::Unauthorized(message),
            StoreError::Server { status, message } => DiagnowError::ServerError { status, message },
            StoreError::Network(message) => DiagnowError::NetworkError(message),
            StoreError::Storage(_) | StoreError::Internal(_) => {
                DiagnowError::DatabaseError(e.to_string())
            }
        }
    }
}

impl From<db::DbError> for DiagnowError {
    fn from(e: db::DbError) -> Self {
        DiagnowError::DatabaseError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for DiagnowError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        DiagnowError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Start the app with the given configuration.
#[uniffi::export]
pub fn open_app(config: Config) -> Result<Arc<DiagnowCore>, DiagnowError> {
    config::init_logging();
    let app = App::from_config(config)?;
    Ok(Arc::new(DiagnowCore {
        app: Mutex::new(app),
    }))
}

/// Offline app over an in-memory store (for testing and demos).
#[uniffi::export]
pub fn open_local_in_memory() -> Result<Arc<DiagnowCore>, DiagnowError> {
    let app = App::local_in_memory()?;
    Ok(Arc::new(DiagnowCore {
        app: Mutex::new(app),
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe app wrapper for FFI.
#[derive(uniffi::Object)]
pub struct DiagnowCore {
    app: Mutex<App>,
}

impl DiagnowCore {
    /// Run a data operation, ending the session if the server answers 401.
    fn call<T>(&self, op: impl FnOnce(&App) -> StoreResult<T>) -> Result<T, DiagnowError> {
        let mut app = self.app.lock()?;
        let result = op(&*app);
        Ok(app.observe(result)?)
    }
}

#[uniffi::export]
impl DiagnowCore {
    // =========================================================================
    // Session
    // =========================================================================

    /// Sign in. Offline mode accepts any password for demo email domains.
    pub fn login(&self, email: String, password: String) -> Result<User, DiagnowError> {
        let mut app = self.app.lock()?;
        let user = app.auth().login(&Credentials { email, password })?;
        Ok(user)
    }

    /// Create an account and sign into it.
    pub fn register(&self, registration: Registration) -> Result<User, DiagnowError> {
        let mut app = self.app.lock()?;
        let user = app.auth().register(&registration)?;
        Ok(user)
    }

    pub fn logout(&self) -> Result<(), DiagnowError> {
        let mut app = self.app.lock()?;
        app.auth().logout()?;
        Ok(())
    }

    pub fn is_authenticated(&self) -> Result<bool, DiagnowError> {
        Ok(self.app.lock()?.session().is_authenticated())
    }

    pub fn session_state(&self) -> Result<SessionState, DiagnowError> {
        Ok(self.app.lock()?.session().state())
    }

    pub fn current_user(&self) -> Result<Option<User>, DiagnowError> {
        Ok(self.app.lock()?.session().current_user().cloned())
    }

    /// True when running against the local store.
    pub fn is_offline(&self) -> Result<bool, DiagnowError> {
        Ok(self.app.lock()?.backend_kind() == BackendKind::Local)
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    pub fn list_patients(&self) -> Result<Vec<Patient>, DiagnowError> {
        self.call(|app| app.patients().list())
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: String) -> Result<Option<Patient>, DiagnowError> {
        self.call(|app| match app.patients().get(&id) {
            Ok(patient) => Ok(Some(patient)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        })
    }

    pub fn create_patient(&self, input: PatientInput) -> Result<Patient, DiagnowError> {
        self.call(|app| app.patients().create(input))
    }

    pub fn update_patient(&self, id: String, input: PatientInput) -> Result<Patient, DiagnowError> {
        self.call(|app| app.patients().update(&id, input))
    }

    pub fn delete_patient(&self, id: String) -> Result<(), DiagnowError> {
        self.call(|app| app.patients().delete(&id))
    }

    /// Case-insensitive match on name, last name or email.
    pub fn search_patients(&self, term: String) -> Result<Vec<Patient>, DiagnowError> {
        self.call(|app| app.patients().search(&term))
    }

    // =========================================================================
    // Prescription Operations
    // =========================================================================

    pub fn list_prescriptions(&self) -> Result<Vec<Prescription>, DiagnowError> {
        self.call(|app| app.prescriptions().list())
    }

    /// Get a prescription by ID.
    pub fn get_prescription(&self, id: String) -> Result<Option<Prescription>, DiagnowError> {
        self.call(|app| match app.prescriptions().get(&id) {
            Ok(rx) => Ok(Some(rx)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        })
    }

    pub fn prescriptions_for_patient(
        &self,
        patient_id: String,
    ) -> Result<Vec<Prescription>, DiagnowError> {
        self.call(|app| app.prescriptions().for_patient(&patient_id))
    }

    /// Create a prescription. Against the remote API some medication lines
    /// may fail to attach; the outcome lists them.
    pub fn create_prescription(
        &self,
        input: PrescriptionInput,
    ) -> Result<CreatedPrescription, DiagnowError> {
        self.call(|app| app.prescriptions().create(input))
    }

    pub fn update_prescription(
        &self,
        id: String,
        input: PrescriptionInput,
    ) -> Result<Prescription, DiagnowError> {
        self.call(|app| app.prescriptions().update(&id, input))
    }

    pub fn delete_prescription(&self, id: String) -> Result<(), DiagnowError> {
        self.call(|app| app.prescriptions().delete(&id))
    }

    /// Case-insensitive match on patient name or diagnosis.
    pub fn search_prescriptions(&self, term: String) -> Result<Vec<Prescription>, DiagnowError> {
        self.call(|app| Ok(filter_prescriptions(&app.prescriptions().list()?, &term)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ffi_patient_flow() {
        let core = open_local_in_memory().unwrap();
        assert!(core.is_offline().unwrap());

        let luis = core
            .create_patient(PatientInput::new("Luis", "Mora", "luis@example.com"))
            .unwrap();
        assert_eq!(core.search_patients("mora".into()).unwrap().len(), 1);
        assert!(core.get_patient("missing".into()).unwrap().is_none());

        core.delete_patient(luis.id.clone()).unwrap();
        assert!(core.get_patient(luis.id).unwrap().is_none());
    }

    #[test]
    fn test_ffi_login_rejected_maps_to_unauthorized() {
        let core = open_local_in_memory().unwrap();
        let err = core
            .login("doc@hospital.org".into(), "secret".into())
            .unwrap_err();
        assert!(matches!(err, DiagnowError::Unauthorized(_)));
        assert_eq!(core.session_state().unwrap(), SessionState::Unauthenticated);
    }

    #[test]
    fn test_ffi_update_missing_is_not_found() {
        let core = open_local_in_memory().unwrap();
        let err = core
            .update_patient("nope".into(), PatientInput::new("A", "B", "a@b.co"))
            .unwrap_err();
        assert!(matches!(err, DiagnowError::NotFound(_)));
    }
}
