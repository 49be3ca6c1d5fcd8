//! Wire shapes of the REST API.
//!
//! The API speaks snake_case and may wrap payloads in `{ "data": ... }`;
//! none of that leaks past this module.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::de::{blank_as_none, number_or_string};
use crate::models::{
    AuthPayload, Credentials, Medication, Patient, PatientInput, Prescription, PrescriptionInput,
    PrescriptionStatus, Registration, User,
};

/// Decode a payload sent either bare or inside a `data` envelope.
///
/// The error names the field that failed, not the envelope shape.
pub fn unwrap_envelope<T: DeserializeOwned>(body: &str) -> serde_json::Result<T> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    match value.get("data") {
        Some(data) => T::deserialize(data).or_else(|inner| T::deserialize(&value).map_err(|_| inner)),
        None => T::deserialize(&value),
    }
}

/// Human-readable message from an error body, or `fallback`.
pub fn error_message(body: &str, fallback: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "detail", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| fallback.to_string())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

/// Identifiers arrive as numbers from SQL-backed servers.
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

// -- auth ---------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct LoginBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

impl<'a> From<&'a Credentials> for LoginBody<'a> {
    fn from(c: &'a Credentials) -> Self {
        Self {
            email: &c.email,
            password: &c.password,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterBody<'a> {
    pub name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

impl<'a> From<&'a Registration> for RegisterBody<'a> {
    fn from(r: &'a Registration) -> Self {
        Self {
            name: &r.name,
            last_name: &r.last_name,
            email: &r.email,
            password: &r.password,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WireUser {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(alias = "first_name")]
    pub name: String,
    #[serde(alias = "lastName")]
    pub last_name: String,
    pub email: String,
}

impl From<WireUser> for User {
    fn from(u: WireUser) -> Self {
        Self {
            id: u.id,
            name: u.name,
            last_name: u.last_name,
            email: u.email,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WireAuth {
    #[serde(alias = "access_token")]
    pub token: String,
    #[serde(alias = "doctor")]
    pub user: WireUser,
}

impl From<WireAuth> for AuthPayload {
    fn from(a: WireAuth) -> Self {
        Self {
            user: a.user.into(),
            token: a.token,
        }
    }
}

// -- patients -----------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct PatientBody<'a> {
    pub name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergies: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_notes: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl<'a> From<&'a PatientInput> for PatientBody<'a> {
    fn from(p: &'a PatientInput) -> Self {
        Self {
            name: &p.name,
            last_name: &p.last_name,
            email: &p.email,
            phone: p.phone.as_deref(),
            birth_date: p.birth_date.as_deref(),
            gender: p.gender.as_deref(),
            address: p.address.as_deref(),
            allergies: p.allergies.as_deref(),
            medical_notes: p.medical_notes.as_deref(),
            age: p.age,
            height: p.height,
            weight: p.weight,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WirePatient {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(alias = "lastName")]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub phone: Option<String>,
    #[serde(default, alias = "birthDate", deserialize_with = "blank_as_none")]
    pub birth_date: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub allergies: Option<String>,
    #[serde(default, alias = "medicalNotes", deserialize_with = "blank_as_none")]
    pub medical_notes: Option<String>,
    #[serde(default, deserialize_with = "number_or_string")]
    pub age: Option<u32>,
    #[serde(default, deserialize_with = "number_or_string")]
    pub height: Option<f64>,
    #[serde(default, deserialize_with = "number_or_string")]
    pub weight: Option<f64>,
}

impl From<WirePatient> for Patient {
    fn from(p: WirePatient) -> Self {
        Self {
            id: p.id,
            name: p.name,
            last_name: p.last_name,
            email: p.email,
            phone: p.phone,
            birth_date: p.birth_date,
            gender: p.gender,
            address: p.address,
            allergies: p.allergies,
            medical_notes: p.medical_notes,
            age: p.age,
            height: p.height,
            weight: p.weight,
        }
    }
}

// -- medications --------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct MedicationBody<'a> {
    /// Set when the line is posted on its own to `/medications`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prescription_id: Option<&'a str>,
    pub name: &'a str,
    pub dosage: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub administration_route: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<&'a str>,
}

impl<'a> MedicationBody<'a> {
    pub fn new(medication: &'a Medication, prescription_id: Option<&'a str>) -> Self {
        Self {
            prescription_id,
            name: &medication.name,
            dosage: &medication.dosage,
            administration_route: medication.administration_route.as_deref(),
            frequency: medication.frequency,
            days: medication.days,
            instructions: medication.instructions.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WireMedication {
    pub name: String,
    #[serde(default)]
    pub dosage: String,
    #[serde(default, alias = "administrationRoute", deserialize_with = "blank_as_none")]
    pub administration_route: Option<String>,
    #[serde(default, deserialize_with = "number_or_string")]
    pub frequency: Option<u32>,
    #[serde(default, alias = "duration", deserialize_with = "number_or_string")]
    pub days: Option<u32>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub instructions: Option<String>,
}

impl From<WireMedication> for Medication {
    fn from(m: WireMedication) -> Self {
        Self {
            name: m.name,
            dosage: m.dosage,
            administration_route: m.administration_route,
            frequency: m.frequency,
            days: m.days,
            instructions: m.instructions,
        }
    }
}

// -- prescriptions ------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct PrescriptionBody<'a> {
    pub patient_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<&'a str>,
    pub date: &'a str,
    pub diagnosis: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<&'a str>,
    pub status: PrescriptionStatus,
    /// Omitted on create: lines are posted separately
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medications: Option<Vec<MedicationBody<'a>>>,
}

impl<'a> PrescriptionBody<'a> {
    /// Body for `POST /prescriptions` (without medication lines).
    pub fn for_create(input: &'a PrescriptionInput) -> Self {
        Self {
            patient_id: &input.patient_id,
            patient_name: input.patient_name.as_deref(),
            date: &input.date,
            diagnosis: &input.diagnosis,
            notes: input.notes.as_deref(),
            status: PrescriptionStatus::Active,
            medications: None,
        }
    }

    /// Body for `PUT /prescriptions/:id` (lines embedded).
    pub fn for_update(input: &'a PrescriptionInput) -> Self {
        Self {
            medications: Some(
                input
                    .medications
                    .iter()
                    .map(|m| MedicationBody::new(m, None))
                    .collect(),
            ),
            ..Self::for_create(input)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WirePrescription {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(alias = "patientId", deserialize_with = "id_string")]
    pub patient_id: String,
    #[serde(default, alias = "patientName")]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: PrescriptionStatus,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<String>,
    #[serde(default)]
    pub medications: Vec<WireMedication>,
}

impl From<WirePrescription> for Prescription {
    fn from(p: WirePrescription) -> Self {
        Self {
            id: p.id,
            patient_id: p.patient_id,
            patient_name: p.patient_name.unwrap_or_default(),
            date: p.date,
            diagnosis: p.diagnosis,
            notes: p.notes,
            status: p.status,
            created_at: p.created_at.unwrap_or_default(),
            medications: p.medications.into_iter().map(Medication::from).collect(),
        }
    }
}
