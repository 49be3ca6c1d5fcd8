//! Demo/offline backend over the local key-value database.

use std::sync::{Arc, Mutex, MutexGuard};

use rand::Rng;
use tracing::debug;

use super::{
    AuthGateway, Backend, BackendKind, Entity, PatientStore, PrescriptionStore, StoreError,
    StoreResult,
};
use crate::db::Database;
use crate::models::{
    AuthPayload, CreatedPrescription, Credentials, Patient, PatientInput, Prescription,
    PrescriptionInput, Registration, User,
};
use crate::session::DEMO_TOKEN_PREFIX;

/// Email domains the demo login accepts.
const DEMO_EMAIL_DOMAINS: &[&str] = &["@example.com", "@ejemplo.com"];

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".into();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

/// New record identifier: base-36 milliseconds plus a 5-char random suffix.
pub fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..5)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{}{}", to_base36(now_millis()), suffix)
}

fn demo_token() -> String {
    format!("{}_{}", DEMO_TOKEN_PREFIX, now_millis())
}

/// Backend that keeps everything in the local database.
///
/// Every mutation reads the whole collection, edits it in memory and writes
/// it back.
#[derive(Clone)]
pub struct LocalBackend {
    db: Arc<Mutex<Database>>,
}

impl LocalBackend {
    pub fn new(db: Arc<Mutex<Database>>) -> Self {
        Self { db }
    }

    fn db(&self) -> StoreResult<MutexGuard<'_, Database>> {
        Ok(self.db.lock()?)
    }
}

impl PatientStore for LocalBackend {
    fn list_patients(&self) -> StoreResult<Vec<Patient>> {
        Ok(self.db()?.load_patients()?)
    }

    fn get_patient(&self, id: &str) -> StoreResult<Patient> {
        self.db()?
            .load_patients()?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::not_found(Entity::Patient, id))
    }

    fn create_patient(&self, input: PatientInput) -> StoreResult<Patient> {
        let db = self.db()?;
        let mut patients = db.load_patients()?;
        let patient = Patient::with_id(generate_id(), input);
        patients.push(patient.clone());
        db.save_patients(&patients)?;
        debug!(id = %patient.id, "patient created locally");
        Ok(patient)
    }

    fn update_patient(&self, id: &str, input: PatientInput) -> StoreResult<Patient> {
        let db = self.db()?;
        let mut patients = db.load_patients()?;
        let slot = patients
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::not_found(Entity::Patient, id))?;
        *slot = Patient::with_id(id, input);
        let updated = slot.clone();
        db.save_patients(&patients)?;
        Ok(updated)
    }

    fn delete_patient(&self, id: &str) -> StoreResult<()> {
        let db = self.db()?;
        let mut patients = db.load_patients()?;
        let before = patients.len();
        patients.retain(|p| p.id != id);
        if patients.len() == before {
            debug!(id, "delete of absent patient ignored");
        }
        db.save_patients(&patients)?;
        Ok(())
    }
}

impl PrescriptionStore for LocalBackend {
    fn list_prescriptions(&self) -> StoreResult<Vec<Prescription>> {
        Ok(self.db()?.load_prescriptions()?)
    }

    fn get_prescription(&self, id: &str) -> StoreResult<Prescription> {
        self.db()?
            .load_prescriptions()?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::not_found(Entity::Prescription, id))
    }

    fn list_prescriptions_for_patient(&self, patient_id: &str) -> StoreResult<Vec<Prescription>> {
        Ok(self
            .db()?
            .load_prescriptions()?
            .into_iter()
            .filter(|p| p.patient_id == patient_id)
            .collect())
    }

    fn create_prescription(&self, mut input: PrescriptionInput) -> StoreResult<CreatedPrescription> {
        let db = self.db()?;
        let mut prescriptions = db.load_prescriptions()?;
        let patient_name = input.patient_name.take().unwrap_or_default();
        let prescription = Prescription::issue(generate_id(), input, patient_name);
        prescriptions.push(prescription.clone());
        db.save_prescriptions(&prescriptions)?;
        debug!(id = %prescription.id, "prescription created locally");
        Ok(CreatedPrescription::complete(prescription))
    }

    fn update_prescription(&self, id: &str, input: PrescriptionInput) -> StoreResult<Prescription> {
        let db = self.db()?;
        let mut prescriptions = db.load_prescriptions()?;
        let slot = prescriptions
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::not_found(Entity::Prescription, id))?;
        slot.apply(input);
        let updated = slot.clone();
        db.save_prescriptions(&prescriptions)?;
        Ok(updated)
    }

    fn delete_prescription(&self, id: &str) -> StoreResult<()> {
        let db = self.db()?;
        let mut prescriptions = db.load_prescriptions()?;
        prescriptions.retain(|p| p.id != id);
        db.save_prescriptions(&prescriptions)?;
        Ok(())
    }
}

impl AuthGateway for LocalBackend {
    /// Demo login: any password, but only demo email domains.
    fn login(&self, credentials: &Credentials) -> StoreResult<AuthPayload> {
        let email = credentials.email.trim().to_lowercase();
        if !DEMO_EMAIL_DOMAINS.iter().any(|domain| email.ends_with(domain)) {
            return Err(StoreError::Unauthorized("Invalid credentials".into()));
        }

        Ok(AuthPayload {
            user: User {
                id: "demo_user".into(),
                name: "Demo".into(),
                last_name: "User".into(),
                email: credentials.email.trim().to_string(),
            },
            token: demo_token(),
        })
    }

    fn register(&self, registration: &Registration) -> StoreResult<AuthPayload> {
        Ok(AuthPayload {
            user: User {
                id: now_millis().to_string(),
                name: registration.name.clone(),
                last_name: registration.last_name.clone(),
                email: registration.email.clone(),
            },
            token: demo_token(),
        })
    }
}

impl Backend for LocalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }
}
