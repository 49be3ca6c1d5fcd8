//! Patient models.

use serde::{Deserialize, Serialize};

use super::de::{blank_as_none, number_or_string};

/// Fields a doctor submits when creating or editing a patient.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, uniffi::Record)]
#[serde(rename_all = "camelCase")]
pub struct PatientInput {
    pub name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub phone: Option<String>,
    /// ISO date (YYYY-MM-DD)
    #[serde(default, deserialize_with = "blank_as_none")]
    pub birth_date: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub allergies: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub medical_notes: Option<String>,
    /// Age in years (remote API only)
    #[serde(default, deserialize_with = "number_or_string")]
    pub age: Option<u32>,
    /// Height in cm (remote API only)
    #[serde(default, deserialize_with = "number_or_string")]
    pub height: Option<f64>,
    /// Weight in kg (remote API only)
    #[serde(default, deserialize_with = "number_or_string")]
    pub weight: Option<f64>,
}

impl PatientInput {
    /// Create an input with the three required fields.
    pub fn new(name: impl Into<String>, last_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            last_name: last_name.into(),
            email: email.into(),
            ..Default::default()
        }
    }
}

/// A stored patient record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, uniffi::Record)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl Patient {
    /// Build a record from submitted fields and an assigned identifier.
    pub fn with_id(id: impl Into<String>, input: PatientInput) -> Self {
        Self {
            id: id.into(),
            name: input.name,
            last_name: input.last_name,
            email: input.email,
            phone: input.phone,
            birth_date: input.birth_date,
            gender: input.gender,
            address: input.address,
            allergies: input.allergies,
            medical_notes: input.medical_notes,
            age: input.age,
            height: input.height,
            weight: input.weight,
        }
    }

    /// The editable fields of this record.
    pub fn to_input(&self) -> PatientInput {
        PatientInput {
            name: self.name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            birth_date: self.birth_date.clone(),
            gender: self.gender.clone(),
            address: self.address.clone(),
            allergies: self.allergies.clone(),
            medical_notes: self.medical_notes.clone(),
            age: self.age,
            height: self.height,
            weight: self.weight,
        }
    }

    /// "{name} {lastName}", the form denormalized onto prescriptions.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.last_name)
    }

    /// Case-insensitive substring match over name, last name and email.
    ///
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.last_name.to_lowercase().contains(needle)
            || self.email.to_lowercase().contains(needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_id_round_trips_input() {
        let mut input = PatientInput::new("Luis", "Cruz", "luis@example.com");
        input.allergies = Some("penicillin".into());

        let patient = Patient::with_id("abc", input.clone());
        assert_eq!(patient.id, "abc");
        assert_eq!(patient.to_input(), input);
    }

    #[test]
    fn test_full_name() {
        let patient = Patient::with_id("p1", PatientInput::new("Juan", "Pérez", "juan@example.com"));
        assert_eq!(patient.full_name(), "Juan Pérez");
    }

    #[test]
    fn test_seed_shape_deserializes() {
        // Demo records only carry the required fields.
        let json = r#"{"id":"p1","name":"Juan","lastName":"Pérez","email":"juan.perez@example.com"}"#;
        let patient: Patient = serde_json::from_str(json).unwrap();
        assert_eq!(patient.last_name, "Pérez");
        assert!(patient.phone.is_none());
    }

    #[test]
    fn test_form_input_blank_fields_are_absent() {
        let json = r#"{"name":"Ana","lastName":"Diaz","email":"ana@example.com","phone":"","birthDate":"","age":"42"}"#;
        let input: PatientInput = serde_json::from_str(json).unwrap();
        assert!(input.phone.is_none());
        assert!(input.birth_date.is_none());
        assert_eq!(input.age, Some(42));
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let patient = Patient::with_id("p2", PatientInput::new("María", "González", "MARIA@example.com"));
        assert!(patient.matches("gonz"));
        assert!(patient.matches("maria@"));
        assert!(!patient.matches("carlos"));
    }
}
