use tracing::debug;

use super::needle;
use crate::models::{Patient, PatientInput};
use crate::store::{Backend, StoreResult};

/// Patient CRUD and search.
pub struct PatientService<'a> {
    backend: &'a dyn Backend,
}

impl<'a> PatientService<'a> {
    pub fn new(backend: &'a dyn Backend) -> Self {
        Self { backend }
    }

    pub fn list(&self) -> StoreResult<Vec<Patient>> {
        self.backend.list_patients()
    }

    pub fn get(&self, id: &str) -> StoreResult<Patient> {
        self.backend.get_patient(id)
    }

    pub fn create(&self, input: PatientInput) -> StoreResult<Patient> {
        let patient = self.backend.create_patient(input)?;
        debug!(id = %patient.id, "patient created");
        Ok(patient)
    }

    pub fn update(&self, id: &str, input: PatientInput) -> StoreResult<Patient> {
        self.backend.update_patient(id, input)
    }

    pub fn delete(&self, id: &str) -> StoreResult<()> {
        self.backend.delete_patient(id)
    }

    /// Fetch all patients and keep those matching `term`.
    pub fn search(&self, term: &str) -> StoreResult<Vec<Patient>> {
        Ok(filter_patients(&self.list()?, term))
    }
}

/// Case-insensitive substring filter over name, last name and email.
/// A blank term keeps everything.
pub fn filter_patients(patients: &[Patient], term: &str) -> Vec<Patient> {
    match needle(term) {
        None => patients.to_vec(),
        Some(needle) => patients
            .iter()
            .filter(|p| p.matches(&needle))
            .cloned()
            .collect(),
    }
}
