//! Doctor account models.

use serde::{Deserialize, Serialize};

/// The signed-in doctor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, uniffi::Record)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub last_name: String,
    pub email: String,
}

impl User {
    pub fn display_name(&self) -> String {
        format!("Dr. {} {}", self.name, self.last_name)
    }
}

/// Login form payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, uniffi::Record)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Registration form payload (the confirmation field never leaves the form).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, uniffi::Record)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// What a successful login or registration yields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, uniffi::Record)]
pub struct AuthPayload {
    pub user: User,
    pub token: String,
}
