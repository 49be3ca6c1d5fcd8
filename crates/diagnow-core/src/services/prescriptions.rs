use tracing::{debug, warn};

use super::needle;
use crate::models::{CreatedPrescription, Prescription, PrescriptionInput};
use crate::store::{Backend, StoreResult};

/// Prescription CRUD.
pub struct PrescriptionService<'a> {
    backend: &'a dyn Backend,
}

impl<'a> PrescriptionService<'a> {
    pub fn new(backend: &'a dyn Backend) -> Self {
        Self { backend }
    }

    pub fn list(&self) -> StoreResult<Vec<Prescription>> {
        self.backend.list_prescriptions()
    }

    pub fn get(&self, id: &str) -> StoreResult<Prescription> {
        self.backend.get_prescription(id)
    }

    pub fn for_patient(&self, patient_id: &str) -> StoreResult<Vec<Prescription>> {
        self.backend.list_prescriptions_for_patient(patient_id)
    }

    /// Create a prescription, filling in the patient's display name when the
    /// caller did not supply one.
    pub fn create(&self, mut input: PrescriptionInput) -> StoreResult<CreatedPrescription> {
        if needs_name(&input) {
            input.patient_name = self.patient_name(&input.patient_id)?;
        }
        let created = self.backend.create_prescription(input)?;
        if created.is_partial() {
            warn!(
                id = %created.prescription.id,
                attached = created.attached(),
                requested = created.requested,
                "prescription stored with missing medications"
            );
        } else {
            debug!(id = %created.prescription.id, "prescription created");
        }
        Ok(created)
    }

    /// Replace a prescription's editable fields.
    ///
    /// The stored patient name is kept unless the edit moves the
    /// prescription to another patient.
    pub fn update(&self, id: &str, mut input: PrescriptionInput) -> StoreResult<Prescription> {
        if needs_name(&input) {
            let current = self.backend.get_prescription(id)?;
            if current.patient_id != input.patient_id {
                input.patient_name = self.patient_name(&input.patient_id)?;
            }
        }
        self.backend.update_prescription(id, input)
    }

    pub fn delete(&self, id: &str) -> StoreResult<()> {
        self.backend.delete_prescription(id)
    }

    /// "Name LastName" of a patient. An unknown patient leaves the name unset.
    fn patient_name(&self, patient_id: &str) -> StoreResult<Option<String>> {
        match self.backend.get_patient(patient_id) {
            Ok(patient) => Ok(Some(patient.full_name())),
            Err(e) if e.is_not_found() => {
                warn!(patient_id, "prescription for unknown patient");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

fn needs_name(input: &PrescriptionInput) -> bool {
    input
        .patient_name
        .as_deref()
        .map_or(true, |name| name.trim().is_empty())
}

/// Case-insensitive substring filter over patient name and diagnosis.
/// A blank term keeps everything.
pub fn filter_prescriptions(prescriptions: &[Prescription], term: &str) -> Vec<Prescription> {
    match needle(term) {
        None => prescriptions.to_vec(),
        Some(needle) => prescriptions
            .iter()
            .filter(|p| p.matches(&needle))
            .cloned()
            .collect(),
    }
}
