use diagnow_core::models::{Patient, Prescription};
use diagnow_core::services::filter_patients;
use diagnow_core::App;

use crate::forms::PatientForm;
use crate::routes::Route;
use crate::screen::{settle, LoadState, Notice, Outcome, ViewResult};

/// `/patients`: table with a search box.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientList {
    pub state: LoadState<Vec<Patient>>,
    pub search: String,
}

impl PatientList {
    pub fn open(app: &mut App) -> Self {
        let mut screen = Self::default();
        screen.refresh(app);
        screen
    }

    pub fn refresh(&mut self, app: &mut App) {
        let result = app.patients().list();
        self.state = LoadState::from_list(settle(app, result, Route::Dashboard));
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    /// Rows after the search filter; no refetch.
    pub fn visible(&self) -> Vec<Patient> {
        filter_patients(self.state.items(), &self.search)
    }
}

/// `/patients/:id`: record, edit form and the patient's prescriptions.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientDetail {
    pub patient: Patient,
    pub form: PatientForm,
    pub prescriptions: Vec<Prescription>,
}

impl PatientDetail {
    /// A missing patient sends the user back to the list.
    pub fn open(app: &mut App, id: &str) -> ViewResult<Self> {
        let patient = app.patients().get(id);
        let patient = settle(app, patient, Route::Patients)?;
        let prescriptions = app.prescriptions().for_patient(id);
        let prescriptions = settle(app, prescriptions, Route::Patients)?;
        Ok(Self {
            form: PatientForm::from_patient(&patient),
            patient,
            prescriptions,
        })
    }

    /// Save the edit form and stay on the detail screen.
    pub fn save(&mut self, app: &mut App) -> ViewResult<Outcome> {
        let input = self.form.validate()?;
        let updated = app.patients().update(&self.patient.id, input);
        self.patient = settle(app, updated, Route::Patients)?;
        self.form = PatientForm::from_patient(&self.patient);
        Ok(Outcome::to(
            Route::PatientDetail(self.patient.id.clone()),
            Notice::success("Patient updated"),
        ))
    }

    pub fn delete(&self, app: &mut App) -> ViewResult<Outcome> {
        let result = app.patients().delete(&self.patient.id);
        settle(app, result, Route::Patients)?;
        Ok(Outcome::to(Route::Patients, Notice::success("Patient deleted")))
    }

    /// Start a prescription already bound to this patient.
    pub fn new_prescription_route(&self) -> Route {
        Route::NewPrescription {
            patient_id: Some(self.patient.id.clone()),
        }
    }
}

/// `/patients/new`: create, then back to the list.
pub fn submit_new_patient(app: &mut App, form: &PatientForm) -> ViewResult<Outcome> {
    let input = form.validate()?;
    let created = app.patients().create(input);
    settle(app, created, Route::Patients)?;
    Ok(Outcome::to(Route::Patients, Notice::success("Patient created")))
}
