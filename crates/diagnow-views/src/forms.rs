//! Client-side form validation.
//!
//! Forms hold raw text as typed. `validate()` either produces the domain
//! input for a service call or the per-field messages to show inline.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use diagnow_core::models::{
    Credentials, Medication, Patient, PatientInput, Prescription, PrescriptionInput, Registration,
};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

pub const MIN_PASSWORD_LEN: usize = 6;
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inline messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    fn finish<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

fn require(errors: &mut FieldErrors, field: &'static str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.add(field, message);
    }
}

fn check_email(errors: &mut FieldErrors, email: &str) {
    if email.trim().is_empty() {
        errors.add("email", "Email is required");
    } else if !is_valid_email(email) {
        errors.add("email", "Invalid email");
    }
}

fn check_date(errors: &mut FieldErrors, field: &'static str, value: &str) {
    if NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).is_err() {
        errors.add(field, "Use the format YYYY-MM-DD");
    }
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn number<T: FromStr>(errors: &mut FieldErrors, field: &'static str, value: &str) -> Option<T> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    match value.parse() {
        Ok(n) => Some(n),
        Err(_) => {
            errors.add(field, "Must be a number");
            None
        }
    }
}

fn text<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<Credentials, FieldErrors> {
        let mut errors = FieldErrors::new();
        check_email(&mut errors, &self.email);
        if self.password.is_empty() {
            errors.add("password", "Password is required");
        }
        errors.finish(Credentials {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterForm {
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    /// The confirmation never leaves the form.
    pub fn validate(&self) -> Result<Registration, FieldErrors> {
        let mut errors = FieldErrors::new();
        require(&mut errors, "name", &self.name, "Name is required");
        require(&mut errors, "lastName", &self.last_name, "Last name is required");
        check_email(&mut errors, &self.email);

        if self.password.is_empty() {
            errors.add("password", "Password is required");
        } else if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.add("password", "Password must be at least 6 characters");
        }
        if self.confirm_password.is_empty() {
            errors.add("confirmPassword", "Confirm your password");
        } else if self.confirm_password != self.password {
            errors.add("confirmPassword", "Passwords must match");
        }

        errors.finish(Registration {
            name: self.name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientForm {
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: String,
    pub gender: String,
    pub address: String,
    pub allergies: String,
    pub medical_notes: String,
    pub age: String,
    pub height: String,
    pub weight: String,
}

impl PatientForm {
    /// Prefill for editing.
    pub fn from_patient(patient: &Patient) -> Self {
        Self {
            name: patient.name.clone(),
            last_name: patient.last_name.clone(),
            email: patient.email.clone(),
            phone: text(&patient.phone),
            birth_date: text(&patient.birth_date),
            gender: text(&patient.gender),
            address: text(&patient.address),
            allergies: text(&patient.allergies),
            medical_notes: text(&patient.medical_notes),
            age: text(&patient.age),
            height: text(&patient.height),
            weight: text(&patient.weight),
        }
    }

    pub fn validate(&self) -> Result<PatientInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        require(&mut errors, "name", &self.name, "Name is required");
        require(&mut errors, "lastName", &self.last_name, "Last name is required");
        check_email(&mut errors, &self.email);
        if !self.birth_date.trim().is_empty() {
            check_date(&mut errors, "birthDate", &self.birth_date);
        }

        let input = PatientInput {
            phone: optional(&self.phone),
            birth_date: optional(&self.birth_date),
            gender: optional(&self.gender),
            address: optional(&self.address),
            allergies: optional(&self.allergies),
            medical_notes: optional(&self.medical_notes),
            age: number(&mut errors, "age", &self.age),
            height: number(&mut errors, "height", &self.height),
            weight: number(&mut errors, "weight", &self.weight),
            ..PatientInput::new(self.name.trim(), self.last_name.trim(), self.email.trim())
        };
        errors.finish(input)
    }
}

/// One editable medication line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MedicationRow {
    pub name: String,
    pub dosage: String,
    pub administration_route: String,
    pub frequency: String,
    pub days: String,
    pub instructions: String,
}

impl MedicationRow {
    fn from_medication(med: &Medication) -> Self {
        Self {
            name: med.name.clone(),
            dosage: med.dosage.clone(),
            administration_route: text(&med.administration_route),
            frequency: text(&med.frequency),
            days: text(&med.days),
            instructions: text(&med.instructions),
        }
    }

    fn is_blank(&self) -> bool {
        self.name.trim().is_empty()
    }

    fn has_name_and_dosage(&self) -> bool {
        !self.name.trim().is_empty() && !self.dosage.trim().is_empty()
    }

    fn to_medication(&self, errors: &mut FieldErrors) -> Medication {
        Medication {
            administration_route: optional(&self.administration_route),
            frequency: number(errors, "medications", &self.frequency),
            days: number(errors, "medications", &self.days),
            instructions: optional(&self.instructions),
            ..Medication::new(self.name.trim(), self.dosage.trim())
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrescriptionForm {
    pub patient_id: String,
    pub date: String,
    pub diagnosis: String,
    pub notes: String,
    pub medications: Vec<MedicationRow>,
}

impl PrescriptionForm {
    /// Blank form dated `today` with one empty medication line.
    pub fn new(patient_id: Option<String>, today: NaiveDate) -> Self {
        Self {
            patient_id: patient_id.unwrap_or_default(),
            date: today.format(DATE_FORMAT).to_string(),
            medications: vec![MedicationRow::default()],
            ..Default::default()
        }
    }

    /// Prefill for editing.
    pub fn from_prescription(rx: &Prescription) -> Self {
        Self {
            patient_id: rx.patient_id.clone(),
            date: rx.date.clone(),
            diagnosis: rx.diagnosis.clone(),
            notes: text(&rx.notes),
            medications: rx.medications.iter().map(MedicationRow::from_medication).collect(),
        }
    }

    pub fn add_medication(&mut self) {
        self.medications.push(MedicationRow::default());
    }

    /// Never removes the last remaining line.
    pub fn remove_medication(&mut self, index: usize) {
        if self.medications.len() > 1 && index < self.medications.len() {
            self.medications.remove(index);
        }
    }

    /// Lines with a blank name are dropped from the result.
    pub fn validate(&self) -> Result<PrescriptionInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        require(&mut errors, "patientId", &self.patient_id, "Select a patient");
        if self.date.trim().is_empty() {
            errors.add("date", "Date is required");
        } else {
            check_date(&mut errors, "date", &self.date);
        }
        require(&mut errors, "diagnosis", &self.diagnosis, "Diagnosis is required");

        if !self.medications.iter().any(MedicationRow::has_name_and_dosage) {
            errors.add(
                "medications",
                "Add at least one medication with name and dosage",
            );
        }
        let medications = self
            .medications
            .iter()
            .filter(|row| !row.is_blank())
            .map(|row| row.to_medication(&mut errors))
            .collect();

        errors.finish(PrescriptionInput {
            patient_id: self.patient_id.trim().to_string(),
            patient_name: None,
            date: self.date.trim().to_string(),
            diagnosis: self.diagnosis.trim().to_string(),
            notes: optional(&self.notes),
            medications,
        })
    }
}
