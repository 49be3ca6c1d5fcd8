//! Prescription and medication models.

use serde::{Deserialize, Serialize};

use super::de::{blank_as_none, number_or_string};

/// Prescription status. Only `active` is ever issued.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, uniffi::Enum)]
#[serde(rename_all = "lowercase")]
pub enum PrescriptionStatus {
    #[default]
    Active,
    /// Any status string this client does not know about
    #[serde(other)]
    Unknown,
}

/// One dosing instruction within a prescription.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, uniffi::Record)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub name: String,
    #[serde(default)]
    pub dosage: String,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub administration_route: Option<String>,
    /// Interval between doses, in hours
    #[serde(default, deserialize_with = "number_or_string", skip_serializing_if = "Option::is_none")]
    pub frequency: Option<u32>,
    /// Treatment duration, in days
    #[serde(default, deserialize_with = "number_or_string", skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl Medication {
    pub fn new(name: impl Into<String>, dosage: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dosage: dosage.into(),
            ..Default::default()
        }
    }

    /// A line the form would drop before submission.
    pub fn is_blank(&self) -> bool {
        self.name.trim().is_empty()
    }

    /// Has both a name and a dosage.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.dosage.trim().is_empty()
    }
}

/// Fields submitted by the prescription form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, uniffi::Record)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionInput {
    pub patient_id: String,
    /// Resolved from the patient record when absent
    #[serde(default, deserialize_with = "blank_as_none")]
    pub patient_name: Option<String>,
    /// ISO date (YYYY-MM-DD)
    pub date: String,
    pub diagnosis: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub medications: Vec<Medication>,
}

/// A stored prescription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, uniffi::Record)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub id: String,
    pub patient_id: String,
    /// Copied from the patient at creation, never re-synchronized
    #[serde(default)]
    pub patient_name: String,
    pub date: String,
    pub diagnosis: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: PrescriptionStatus,
    /// RFC 3339 creation timestamp
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub medications: Vec<Medication>,
}

impl Prescription {
    /// Build a new active prescription.
    pub fn issue(id: impl Into<String>, input: PrescriptionInput, patient_name: String) -> Self {
        Self {
            id: id.into(),
            patient_id: input.patient_id,
            patient_name,
            date: input.date,
            diagnosis: input.diagnosis,
            notes: input.notes,
            status: PrescriptionStatus::Active,
            created_at: chrono::Utc::now().to_rfc3339(),
            medications: input.medications,
        }
    }

    /// Merge an edit into this record.
    ///
    /// Id, status and creation time are preserved; the stored patient name
    /// is kept unless the edit carries one.
    pub fn apply(&mut self, input: PrescriptionInput) {
        self.patient_id = input.patient_id;
        if let Some(name) = input.patient_name {
            self.patient_name = name;
        }
        self.date = input.date;
        self.diagnosis = input.diagnosis;
        self.notes = input.notes;
        self.medications = input.medications;
    }

    /// Case-insensitive substring match over patient name and diagnosis.
    ///
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.patient_name.to_lowercase().contains(needle)
            || self.diagnosis.to_lowercase().contains(needle)
    }

    /// Comma-separated medication names, for list rows.
    pub fn medication_summary(&self) -> String {
        self.medications
            .iter()
            .map(|m| m.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A medication line the remote API refused to attach.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, uniffi::Record)]
pub struct MedicationFailure {
    pub name: String,
    pub reason: String,
}

/// Outcome of creating a prescription.
///
/// Against the remote API the prescription row and each medication line are
/// separate requests with no rollback, so the row can exist with only some
/// of its medications.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, uniffi::Record)]
pub struct CreatedPrescription {
    /// The stored prescription with the medications actually attached
    pub prescription: Prescription,
    /// Medication lines submitted
    pub requested: u32,
    pub failures: Vec<MedicationFailure>,
}

impl CreatedPrescription {
    /// Every submitted line was stored.
    pub fn complete(prescription: Prescription) -> Self {
        let requested = prescription.medications.len() as u32;
        Self {
            prescription,
            requested,
            failures: Vec::new(),
        }
    }

    pub fn attached(&self) -> u32 {
        self.requested - self.failures.len() as u32
    }

    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}
