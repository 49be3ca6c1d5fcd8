//! Screens and navigation for DiagNow.
//!
//! This crate holds everything between the host UI and `diagnow-core`:
//! the route table and its guard, form validation, client-side search and
//! one controller per screen. Controllers are synchronous; the host renders
//! whatever [`LoadState`] or [`Outcome`] they return.

pub mod forms;
pub mod guard;
pub mod routes;
pub mod screen;
pub mod screens;

pub use forms::{FieldErrors, LoginForm, MedicationRow, PatientForm, PrescriptionForm, RegisterForm};
pub use guard::{guard, navigate, GuardDecision};
pub use routes::Route;
pub use screen::{LoadState, Notice, NoticeLevel, Outcome, ViewError, ViewResult};
