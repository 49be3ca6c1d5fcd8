//! Demo data for offline mode.

use tracing::info;

use super::{Database, DbResult, PATIENTS_KEY, PRESCRIPTIONS_KEY};
use crate::models::{Medication, Patient, PatientInput, Prescription, PrescriptionStatus};

/// What a seeding pass wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub patients: bool,
    pub prescriptions: bool,
}

impl Database {
    /// Seed demo patients and prescriptions.
    ///
    /// A collection is only written when its key is absent, so this is safe
    /// to call on every start.
    pub fn seed_demo_data(&self) -> DbResult<SeedReport> {
        let mut report = SeedReport::default();

        if !self.contains_key(PATIENTS_KEY)? {
            self.save_patients(&demo_patients())?;
            report.patients = true;
        }

        if !self.contains_key(PRESCRIPTIONS_KEY)? {
            self.save_prescriptions(&demo_prescriptions())?;
            report.prescriptions = true;
        }

        if report.patients || report.prescriptions {
            info!(?report, "seeded demo data");
        }
        Ok(report)
    }
}

fn demo_patients() -> Vec<Patient> {
    vec![
        Patient::with_id("p1", PatientInput::new("Juan", "Pérez", "juan.perez@example.com")),
        Patient::with_id("p2", PatientInput::new("María", "González", "maria.gonzalez@example.com")),
        Patient::with_id("p3", PatientInput::new("Carlos", "Rodríguez", "carlos.rodriguez@example.com")),
    ]
}

fn oral(name: &str, dosage: &str, frequency: u32, days: u32) -> Medication {
    Medication {
        administration_route: Some("oral".into()),
        frequency: Some(frequency),
        days: Some(days),
        ..Medication::new(name, dosage)
    }
}

fn demo_prescription(
    id: &str,
    patient_id: &str,
    patient_name: &str,
    date: &str,
    diagnosis: &str,
    medications: Vec<Medication>,
) -> Prescription {
    Prescription {
        id: id.into(),
        patient_id: patient_id.into(),
        patient_name: patient_name.into(),
        date: date.into(),
        diagnosis: diagnosis.into(),
        notes: None,
        status: PrescriptionStatus::Active,
        created_at: format!("{date}T00:00:00+00:00"),
        medications,
    }
}

fn demo_prescriptions() -> Vec<Prescription> {
    vec![
        demo_prescription(
            "rx1",
            "p1",
            "Juan Pérez",
            "2025-03-29",
            "Seasonal flu",
            vec![oral("Paracetamol", "500mg", 8, 5)],
        ),
        demo_prescription(
            "rx2",
            "p2",
            "María González",
            "2025-03-28",
            "Arterial hypertension",
            vec![oral("Losartan", "50mg", 24, 30)],
        ),
        demo_prescription(
            "rx3",
            "p1",
            "Juan Pérez",
            "2025-03-25",
            "Lower back pain",
            vec![
                oral("Diclofenac", "100mg", 12, 7),
                oral("Methocarbamol", "750mg", 8, 5),
            ],
        ),
    ]
}
