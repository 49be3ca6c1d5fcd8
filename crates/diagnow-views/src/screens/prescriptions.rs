use chrono::NaiveDate;
use tracing::debug;

use diagnow_core::models::{Patient, Prescription};
use diagnow_core::services::filter_prescriptions;
use diagnow_core::App;

use crate::forms::PrescriptionForm;
use crate::routes::Route;
use crate::screen::{settle, LoadState, Notice, Outcome, ViewResult};

/// `/prescriptions`: table with a search box.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrescriptionList {
    pub state: LoadState<Vec<Prescription>>,
    pub search: String,
}

impl PrescriptionList {
    pub fn open(app: &mut App) -> Self {
        let mut screen = Self::default();
        screen.refresh(app);
        screen
    }

    pub fn refresh(&mut self, app: &mut App) {
        let result = app.prescriptions().list();
        self.state = LoadState::from_list(settle(app, result, Route::Dashboard));
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    /// Rows after the search filter; no refetch.
    pub fn visible(&self) -> Vec<Prescription> {
        filter_prescriptions(self.state.items(), &self.search)
    }
}

/// `/prescriptions/:id`.
#[derive(Debug, Clone, PartialEq)]
pub struct PrescriptionDetail {
    pub prescription: Prescription,
}

impl PrescriptionDetail {
    /// A missing prescription sends the user to the dashboard.
    pub fn open(app: &mut App, id: &str) -> ViewResult<Self> {
        let result = app.prescriptions().get(id);
        let prescription = settle(app, result, Route::Dashboard)?;
        Ok(Self { prescription })
    }

    pub fn edit_route(&self) -> Route {
        Route::EditPrescription(self.prescription.id.clone())
    }

    /// Where "back" and delete lead: the owning patient if known.
    pub fn back_route(&self) -> Route {
        if self.prescription.patient_id.is_empty() {
            Route::Dashboard
        } else {
            Route::PatientDetail(self.prescription.patient_id.clone())
        }
    }

    pub fn delete(&self, app: &mut App) -> ViewResult<Outcome> {
        let result = app.prescriptions().delete(&self.prescription.id);
        settle(app, result, Route::Dashboard)?;
        Ok(Outcome::to(self.back_route(), Notice::success("Prescription deleted")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMode {
    /// `patient_id` is set when opened from a patient's page
    Create { patient_id: Option<String> },
    Edit { id: String },
}

/// `/prescriptions/new` and `/prescriptions/edit/:id`.
#[derive(Debug, Clone, PartialEq)]
pub struct PrescriptionEditor {
    pub mode: EditorMode,
    pub form: PrescriptionForm,
    /// Choices for the patient selector
    pub patients: Vec<Patient>,
}

impl PrescriptionEditor {
    pub fn open_new(app: &mut App, patient_id: Option<String>, today: NaiveDate) -> ViewResult<Self> {
        let patients = app.patients().list();
        let patients = settle(app, patients, Route::Dashboard)?;
        Ok(Self {
            form: PrescriptionForm::new(patient_id.clone(), today),
            mode: EditorMode::Create { patient_id },
            patients,
        })
    }

    pub fn open_edit(app: &mut App, id: &str) -> ViewResult<Self> {
        let existing = app.prescriptions().get(id);
        let existing = settle(app, existing, Route::Dashboard)?;
        let patients = app.patients().list();
        let patients = settle(app, patients, Route::Dashboard)?;
        Ok(Self {
            form: PrescriptionForm::from_prescription(&existing),
            mode: EditorMode::Edit { id: id.to_string() },
            patients,
        })
    }

    /// Open whichever editor `route` names.
    pub fn open(app: &mut App, route: &Route, today: NaiveDate) -> Option<ViewResult<Self>> {
        match route {
            Route::NewPrescription { patient_id } => Some(Self::open_new(app, patient_id.clone(), today)),
            Route::EditPrescription(id) => Some(Self::open_edit(app, id)),
            _ => None,
        }
    }

    /// Where cancel leads.
    pub fn cancel_route(&self) -> Route {
        match &self.mode {
            EditorMode::Create {
                patient_id: Some(patient_id),
            } => Route::PatientDetail(patient_id.clone()),
            EditorMode::Create { patient_id: None } => Route::Dashboard,
            EditorMode::Edit { id } => Route::PrescriptionDetail(id.clone()),
        }
    }

    /// Validate, save and say where to go.
    ///
    /// A partially attached prescription is still a saved one; the missing
    /// lines were logged by the service.
    pub fn submit(&self, app: &mut App) -> ViewResult<Outcome> {
        let input = self.form.validate()?;
        match &self.mode {
            EditorMode::Create { .. } => {
                let created = app.prescriptions().create(input);
                let created = settle(app, created, Route::Dashboard)?;
                debug!(
                    id = %created.prescription.id,
                    partial = created.is_partial(),
                    "prescription saved from editor"
                );
                Ok(Outcome::to(self.cancel_route(), Notice::success("Prescription created")))
            }
            EditorMode::Edit { id } => {
                let updated = app.prescriptions().update(id, input);
                settle(app, updated, Route::Dashboard)?;
                Ok(Outcome::to(
                    Route::PrescriptionDetail(id.clone()),
                    Notice::success("Prescription updated"),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::MedicationRow;
    use crate::screen::ViewError;
    use diagnow_core::models::Credentials;

    fn signed_in() -> App {
        let mut app = App::local_in_memory().unwrap();
        app.auth()
            .login(&Credentials {
                email: "ana@example.com".into(),
                password: "x".into(),
            })
            .unwrap();
        app
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 2).unwrap()
    }

    #[test]
    fn test_list_search_by_diagnosis() {
        let mut app = signed_in();
        let mut list = PrescriptionList::open(&mut app);
        assert_eq!(list.visible().len(), 3);
        list.set_search("back pain");
        assert_eq!(list.visible()[0].id, "rx3");
    }

    #[test]
    fn test_new_from_patient_page_returns_there() {
        let mut app = signed_in();
        let route = Route::parse("/prescriptions/new?patientId=p2");
        let mut editor = PrescriptionEditor::open(&mut app, &route, today()).unwrap().unwrap();
        assert_eq!(editor.form.patient_id, "p2");
        assert_eq!(editor.patients.len(), 3);

        editor.form.diagnosis = "Migraine".into();
        editor.form.medications[0] = MedicationRow {
            name: "Sumatriptan".into(),
            dosage: "50mg".into(),
            ..Default::default()
        };
        let outcome = editor.submit(&mut app).unwrap();
        assert_eq!(outcome.navigate, Route::PatientDetail("p2".into()));

        let saved = app.prescriptions().for_patient("p2").unwrap();
        assert!(saved.iter().any(|rx| rx.diagnosis == "Migraine" && rx.patient_name == "María González"));
    }

    #[test]
    fn test_new_without_patient_returns_to_dashboard() {
        let mut app = signed_in();
        let mut editor = PrescriptionEditor::open_new(&mut app, None, today()).unwrap();
        editor.form.patient_id = "p3".into();
        editor.form.diagnosis = "Sprain".into();
        editor.form.medications[0].name = "Ibuprofen".into();
        editor.form.medications[0].dosage = "400mg".into();
        assert_eq!(editor.submit(&mut app).unwrap().navigate, Route::Dashboard);
    }

    #[test]
    fn test_invalid_editor_form_is_not_saved() {
        let mut app = signed_in();
        let editor = PrescriptionEditor::open_new(&mut app, Some("p1".into()), today()).unwrap();
        let err = editor.submit(&mut app).unwrap_err();
        assert!(matches!(err, ViewError::Invalid(_)));
        assert_eq!(app.prescriptions().list().unwrap().len(), 3);
    }

    #[test]
    fn test_edit_keeps_identity() {
        let mut app = signed_in();
        let mut editor = PrescriptionEditor::open_edit(&mut app, "rx2").unwrap();
        assert_eq!(editor.form.medications[0].name, "Losartan");

        editor.form.notes = "Check pressure weekly".into();
        let outcome = editor.submit(&mut app).unwrap();
        assert_eq!(outcome.navigate, Route::PrescriptionDetail("rx2".into()));

        let rx = app.prescriptions().get("rx2").unwrap();
        assert_eq!(rx.notes.as_deref(), Some("Check pressure weekly"));
        assert_eq!(rx.patient_name, "María González");
    }

    #[test]
    fn test_detail_delete_goes_to_patient() {
        let mut app = signed_in();
        let detail = PrescriptionDetail::open(&mut app, "rx1").unwrap();
        let outcome = detail.delete(&mut app).unwrap();
        assert_eq!(outcome.navigate, Route::PatientDetail("p1".into()));
        assert!(PrescriptionDetail::open(&mut app, "rx1").is_err());
    }

    #[test]
    fn test_missing_prescription_redirects_to_dashboard() {
        let mut app = signed_in();
        let err = PrescriptionDetail::open(&mut app, "rx404").unwrap_err();
        assert_eq!(err.redirect(), Some(Route::Dashboard));
    }
}
