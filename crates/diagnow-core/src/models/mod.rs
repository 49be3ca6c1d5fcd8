//! Domain models for DiagNow.

pub(crate) mod de;
mod patient;
mod prescription;
mod user;

pub use patient::*;
pub use prescription::*;
pub use user::*;
