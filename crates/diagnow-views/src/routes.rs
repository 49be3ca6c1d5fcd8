//! Route table.

use std::fmt;

/// Every screen the app can show.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Landing,
    Login,
    Register,
    Dashboard,
    Patients,
    NewPatient,
    PatientDetail(String),
    Prescriptions,
    /// Optionally pre-bound to a patient via `?patientId=`
    NewPrescription { patient_id: Option<String> },
    PrescriptionDetail(String),
    EditPrescription(String),
}

impl Route {
    /// Resolve a path (with optional query string). Anything unmatched falls
    /// back to the landing page.
    pub fn parse(path: &str) -> Route {
        let (path, query) = match path.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (path, None),
        };
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Route::Landing,
            ["login"] => Route::Login,
            ["register"] => Route::Register,
            ["dashboard"] => Route::Dashboard,
            ["patients"] => Route::Patients,
            ["patients", "new"] => Route::NewPatient,
            ["patients", id] => Route::PatientDetail(id.to_string()),
            ["prescriptions"] => Route::Prescriptions,
            ["prescriptions", "new"] => Route::NewPrescription {
                patient_id: query.and_then(|q| query_param(q, "patientId")),
            },
            ["prescriptions", "edit", id] => Route::EditPrescription(id.to_string()),
            ["prescriptions", id] => Route::PrescriptionDetail(id.to_string()),
            _ => Route::Landing,
        }
    }

    pub fn to_path(&self) -> String {
        match self {
            Route::Landing => "/".into(),
            Route::Login => "/login".into(),
            Route::Register => "/register".into(),
            Route::Dashboard => "/dashboard".into(),
            Route::Patients => "/patients".into(),
            Route::NewPatient => "/patients/new".into(),
            Route::PatientDetail(id) => format!("/patients/{id}"),
            Route::Prescriptions => "/prescriptions".into(),
            Route::NewPrescription { patient_id: None } => "/prescriptions/new".into(),
            Route::NewPrescription {
                patient_id: Some(id),
            } => format!("/prescriptions/new?patientId={id}"),
            Route::PrescriptionDetail(id) => format!("/prescriptions/{id}"),
            Route::EditPrescription(id) => format!("/prescriptions/edit/{id}"),
        }
    }

    /// Requires a signed-in session.
    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Landing | Route::Login | Route::Register)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_path())
    }
}

fn query_param(query: &str, key: &str) -> Option<String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.to_string())
        .filter(|v| !v.is_empty())
}
