//! Storage-capability interface.
//!
//! Domain services talk to a [`Backend`] and never learn which one they
//! got. Two implementations exist: [`LocalBackend`] over the key-value
//! database (demo/offline mode) and [`RemoteBackend`] over the REST API.

mod local;
mod remote;

pub use local::*;
pub use remote::*;

use std::fmt;

use thiserror::Error;

use crate::db::DbError;
use crate::models::{
    AuthPayload, CreatedPrescription, Credentials, Patient, PatientInput, Prescription,
    PrescriptionInput, Registration,
};

/// Addressable entity kinds, for not-found reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Patient,
    Prescription,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Patient => f.write_str("Patient"),
            Entity::Prescription => f.write_str("Prescription"),
        }
    }
}

/// Errors surfaced by any backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Storage error: {0}")]
    Storage(#[from] DbError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn not_found(entity: Entity, id: &str) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// HTTP-like status code for this error; 0 when no response was received.
    pub fn status(&self) -> u16 {
        match self {
            StoreError::Validation(_) => 400,
            StoreError::Unauthorized(_) => 401,
            StoreError::NotFound { .. } => 404,
            StoreError::Server { status, .. } => *status,
            StoreError::Network(_) => 0,
            StoreError::Storage(_) | StoreError::Internal(_) => 500,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, StoreError::Unauthorized(_))
    }
}

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        StoreError::Internal(format!("Lock poisoned: {}", e))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Patient persistence.
pub trait PatientStore {
    fn list_patients(&self) -> StoreResult<Vec<Patient>>;

    fn get_patient(&self, id: &str) -> StoreResult<Patient>;

    /// Store a new patient under a freshly assigned identifier.
    fn create_patient(&self, input: PatientInput) -> StoreResult<Patient>;

    /// Replace the patient's fields. `NotFound` if `id` is unknown.
    fn update_patient(&self, id: &str, input: PatientInput) -> StoreResult<Patient>;

    fn delete_patient(&self, id: &str) -> StoreResult<()>;
}

/// Prescription persistence.
pub trait PrescriptionStore {
    fn list_prescriptions(&self) -> StoreResult<Vec<Prescription>>;

    fn get_prescription(&self, id: &str) -> StoreResult<Prescription>;

    fn list_prescriptions_for_patient(&self, patient_id: &str) -> StoreResult<Vec<Prescription>>;

    /// Store a new prescription. The patient name has already been resolved.
    fn create_prescription(&self, input: PrescriptionInput) -> StoreResult<CreatedPrescription>;

    fn update_prescription(&self, id: &str, input: PrescriptionInput) -> StoreResult<Prescription>;

    fn delete_prescription(&self, id: &str) -> StoreResult<()>;
}

/// Credential exchange.
pub trait AuthGateway {
    fn login(&self, credentials: &Credentials) -> StoreResult<AuthPayload>;

    fn register(&self, registration: &Registration) -> StoreResult<AuthPayload>;
}

/// Which persistence a backend uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Local,
    Remote,
}

/// Everything the domain services need from persistence.
pub trait Backend: PatientStore + PrescriptionStore + AuthGateway + Send + Sync {
    fn kind(&self) -> BackendKind;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(StoreError::not_found(Entity::Patient, "x").status(), 404);
        assert_eq!(StoreError::Unauthorized("expired".into()).status(), 401);
        assert_eq!(StoreError::Validation("bad".into()).status(), 400);
        assert_eq!(StoreError::Network("refused".into()).status(), 0);
        assert_eq!(
            StoreError::Server {
                status: 503,
                message: "down".into()
            }
            .status(),
            503
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = StoreError::not_found(Entity::Prescription, "rx42");
        assert_eq!(err.to_string(), "Prescription not found: rx42");
        assert!(err.is_not_found());
    }
}
