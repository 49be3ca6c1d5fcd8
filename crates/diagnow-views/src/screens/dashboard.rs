use diagnow_core::models::Patient;
use diagnow_core::App;

use crate::routes::Route;
use crate::screen::{settle, LoadState, ViewResult};

/// Patients shown on the dashboard, newest first.
pub const RECENT_PATIENTS: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub greeting: String,
    pub patient_count: usize,
    pub prescription_count: usize,
    pub recent_patients: Vec<Patient>,
}

pub fn load_dashboard(app: &mut App) -> LoadState<DashboardView> {
    match fetch(app) {
        Ok(view) => LoadState::Loaded(view),
        Err(e) => LoadState::Failed(e),
    }
}

fn fetch(app: &mut App) -> ViewResult<DashboardView> {
    let patients = app.patients().list();
    let patients = settle(app, patients, Route::Dashboard)?;
    let prescriptions = app.prescriptions().list();
    let prescriptions = settle(app, prescriptions, Route::Dashboard)?;

    let greeting = match app.session().current_user() {
        Some(user) if !user.name.is_empty() => format!("Welcome, Dr. {}", user.name),
        _ => "Welcome".to_string(),
    };

    Ok(DashboardView {
        greeting,
        patient_count: patients.len(),
        prescription_count: prescriptions.len(),
        recent_patients: patients.iter().rev().take(RECENT_PATIENTS).cloned().collect(),
    })
}
