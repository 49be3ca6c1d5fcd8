//! Typed collections over the key-value table.
//!
//! Each collection is one JSON array read and written whole: no partial
//! updates and no transactions, so interleaved writers lose updates.

use super::{Database, DbResult, PATIENTS_KEY, PRESCRIPTIONS_KEY, TOKEN_KEY, USER_KEY};
use crate::models::{Patient, Prescription, User};

impl Database {
    /// All stored patients (empty when the collection is absent).
    pub fn load_patients(&self) -> DbResult<Vec<Patient>> {
        Ok(self.get_json(PATIENTS_KEY)?.unwrap_or_default())
    }

    pub fn save_patients(&self, patients: &[Patient]) -> DbResult<()> {
        self.set_json(PATIENTS_KEY, patients)
    }

    /// All stored prescriptions (empty when the collection is absent).
    pub fn load_prescriptions(&self) -> DbResult<Vec<Prescription>> {
        Ok(self.get_json(PRESCRIPTIONS_KEY)?.unwrap_or_default())
    }

    pub fn save_prescriptions(&self, prescriptions: &[Prescription]) -> DbResult<()> {
        self.set_json(PRESCRIPTIONS_KEY, prescriptions)
    }

    /// Session token, stored as a bare string.
    pub fn token(&self) -> DbResult<Option<String>> {
        self.get_item(TOKEN_KEY)
    }

    pub fn save_token(&self, token: &str) -> DbResult<()> {
        self.set_item(TOKEN_KEY, token)
    }

    pub fn remove_token(&self) -> DbResult<()> {
        self.remove_item(TOKEN_KEY)?;
        Ok(())
    }

    pub fn user(&self) -> DbResult<Option<User>> {
        self.get_json(USER_KEY)
    }

    pub fn save_user(&self, user: &User) -> DbResult<()> {
        self.set_json(USER_KEY, user)
    }

    pub fn remove_user(&self) -> DbResult<()> {
        self.remove_item(USER_KEY)?;
        Ok(())
    }
}
