//! Backend over the REST API.

use std::thread;

use tracing::{debug, info, warn};

use super::{
    AuthGateway, Backend, BackendKind, Entity, PatientStore, PrescriptionStore, StoreError,
    StoreResult,
};
use crate::api::wire::{
    LoginBody, MedicationBody, PatientBody, PrescriptionBody, RegisterBody, WireAuth, WirePatient,
    WirePrescription,
};
use crate::api::{ApiClient, ApiError, HttpTransport, Transport};
use crate::models::{
    AuthPayload, CreatedPrescription, Credentials, Medication, MedicationFailure, Patient,
    PatientInput, Prescription, PrescriptionInput, Registration,
};

impl From<ApiError> for StoreError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Unauthorized(message) => StoreError::Unauthorized(message),
            ApiError::NotFound(message) => StoreError::Server {
                status: 404,
                message,
            },
            ApiError::Status { status: 400 | 422, message } => StoreError::Validation(message),
            ApiError::Status { status, message } => StoreError::Server { status, message },
            ApiError::Connection(_) | ApiError::Timeout(_) | ApiError::HttpClient(_) => {
                StoreError::Network(e.to_string())
            }
            ApiError::ResponseParsing(_) | ApiError::Storage(_) => StoreError::Internal(e.to_string()),
        }
    }
}

/// Map an error from a by-id request, naming the entity on 404.
fn by_id(entity: Entity, id: &str) -> impl FnOnce(ApiError) -> StoreError + '_ {
    move |e| match e {
        ApiError::NotFound(_) => StoreError::not_found(entity, id),
        other => other.into(),
    }
}

/// Backend that delegates to the REST API.
pub struct RemoteBackend<T: Transport = HttpTransport> {
    client: ApiClient<T>,
}

impl<T: Transport> RemoteBackend<T> {
    pub fn new(client: ApiClient<T>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient<T> {
        &self.client
    }

    /// Post each medication line to `/medications`, all at once.
    ///
    /// Returns the lines that were stored and the ones that were not.
    fn attach_medications(
        &self,
        prescription_id: &str,
        medications: &[Medication],
    ) -> (Vec<Medication>, Vec<(Medication, ApiError)>) {
        let results: Vec<Result<(), ApiError>> = thread::scope(|scope| {
            let handles: Vec<_> = medications
                .iter()
                .map(|medication| {
                    scope.spawn(move || {
                        let body = MedicationBody::new(medication, Some(prescription_id));
                        self.client.post_empty("/medications", &body)
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|_| Err(ApiError::HttpClient("medication request panicked".into())))
                })
                .collect()
        });

        let mut attached = Vec::new();
        let mut failed = Vec::new();
        for (medication, result) in medications.iter().zip(results) {
            match result {
                Ok(()) => attached.push(medication.clone()),
                Err(e) => failed.push((medication.clone(), e)),
            }
        }
        (attached, failed)
    }
}

impl<T: Transport> PatientStore for RemoteBackend<T> {
    fn list_patients(&self) -> StoreResult<Vec<Patient>> {
        let patients: Vec<WirePatient> = self.client.get("/patients")?;
        Ok(patients.into_iter().map(Patient::from).collect())
    }

    fn get_patient(&self, id: &str) -> StoreResult<Patient> {
        let patient: WirePatient = self
            .client
            .get(&format!("/patients/{id}"))
            .map_err(by_id(Entity::Patient, id))?;
        Ok(patient.into())
    }

    fn create_patient(&self, input: PatientInput) -> StoreResult<Patient> {
        let patient: WirePatient = self.client.post("/patients", &PatientBody::from(&input))?;
        Ok(patient.into())
    }

    fn update_patient(&self, id: &str, input: PatientInput) -> StoreResult<Patient> {
        let patient: WirePatient = self
            .client
            .put(&format!("/patients/{id}"), &PatientBody::from(&input))
            .map_err(by_id(Entity::Patient, id))?;
        Ok(patient.into())
    }

    fn delete_patient(&self, id: &str) -> StoreResult<()> {
        self.client
            .delete(&format!("/patients/{id}"))
            .map_err(by_id(Entity::Patient, id))
    }
}

impl<T: Transport> PrescriptionStore for RemoteBackend<T> {
    fn list_prescriptions(&self) -> StoreResult<Vec<Prescription>> {
        let prescriptions: Vec<WirePrescription> = self.client.get("/prescriptions")?;
        Ok(prescriptions.into_iter().map(Prescription::from).collect())
    }

    fn get_prescription(&self, id: &str) -> StoreResult<Prescription> {
        let prescription: WirePrescription = self
            .client
            .get(&format!("/prescriptions/{id}"))
            .map_err(by_id(Entity::Prescription, id))?;
        Ok(prescription.into())
    }

    /// Some servers answer 404 when a patient has no prescriptions yet.
    fn list_prescriptions_for_patient(&self, patient_id: &str) -> StoreResult<Vec<Prescription>> {
        let prescriptions: Vec<WirePrescription> = match self
            .client
            .get(&format!("/prescriptions/patient/{patient_id}"))
        {
            Ok(prescriptions) => prescriptions,
            Err(ApiError::NotFound(_)) => {
                debug!(patient_id, "no prescriptions for patient");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(prescriptions.into_iter().map(Prescription::from).collect())
    }

    /// Best-effort two-step create.
    ///
    /// The prescription row is created first, then every medication line is
    /// posted concurrently. Failed lines are reported in the outcome; the row
    /// is never rolled back. A 401 on any line fails the whole call since the
    /// session is gone.
    fn create_prescription(&self, input: PrescriptionInput) -> StoreResult<CreatedPrescription> {
        let created: WirePrescription = self
            .client
            .post("/prescriptions", &PrescriptionBody::for_create(&input))?;
        let mut prescription = Prescription::from(created);
        if prescription.patient_name.is_empty() {
            prescription.patient_name = input.patient_name.clone().unwrap_or_default();
        }

        let (attached, failed) = self.attach_medications(&prescription.id, &input.medications);

        if let Some((_, ApiError::Unauthorized(message))) =
            failed.iter().find(|(_, e)| matches!(e, ApiError::Unauthorized(_)))
        {
            return Err(StoreError::Unauthorized(message.clone()));
        }

        let failures: Vec<MedicationFailure> = failed
            .into_iter()
            .map(|(medication, e)| MedicationFailure {
                name: medication.name,
                reason: e.to_string(),
            })
            .collect();

        if failures.is_empty() {
            info!(id = %prescription.id, lines = attached.len(), "prescription created");
        } else {
            warn!(
                id = %prescription.id,
                attached = attached.len(),
                failed = failures.len(),
                "prescription created without all medications"
            );
        }

        prescription.medications = attached;
        Ok(CreatedPrescription {
            prescription,
            requested: input.medications.len() as u32,
            failures,
        })
    }

    fn update_prescription(&self, id: &str, input: PrescriptionInput) -> StoreResult<Prescription> {
        let prescription: WirePrescription = self
            .client
            .put(
                &format!("/prescriptions/{id}"),
                &PrescriptionBody::for_update(&input),
            )
            .map_err(by_id(Entity::Prescription, id))?;
        Ok(prescription.into())
    }

    fn delete_prescription(&self, id: &str) -> StoreResult<()> {
        self.client
            .delete(&format!("/prescriptions/{id}"))
            .map_err(by_id(Entity::Prescription, id))
    }
}

impl<T: Transport> AuthGateway for RemoteBackend<T> {
    fn login(&self, credentials: &Credentials) -> StoreResult<AuthPayload> {
        let auth: WireAuth = self.client.post("/auth/login", &LoginBody::from(credentials))?;
        Ok(auth.into())
    }

    fn register(&self, registration: &Registration) -> StoreResult<AuthPayload> {
        let auth: WireAuth = self
            .client
            .post("/auth/register", &RegisterBody::from(registration))?;
        Ok(auth.into())
    }
}

impl<T: Transport> Backend for RemoteBackend<T> {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Method, MockTransport};
    use crate::db::Database;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn backend(transport: MockTransport) -> RemoteBackend<MockTransport> {
        let db = Arc::new(Mutex::new(Database::open_in_memory().unwrap()));
        RemoteBackend::new(ApiClient::new(transport, db))
    }

    fn flu(medications: Vec<Medication>) -> PrescriptionInput {
        PrescriptionInput {
            patient_id: "7".into(),
            patient_name: Some("Luis Cruz".into()),
            date: "2025-04-01".into(),
            diagnosis: "Flu".into(),
            notes: None,
            medications,
        }
    }

    fn created_row() -> serde_json::Value {
        json!({ "data": { "id": 11, "patient_id": 7, "date": "2025-04-01", "diagnosis": "Flu", "status": "active" } })
    }

    #[test]
    fn test_get_patient_404_names_entity() {
        let backend = backend(MockTransport::new());
        let err = backend.get_patient("99").unwrap_err();
        assert_eq!(err.to_string(), "Patient not found: 99");
    }

    #[test]
    fn test_list_patients_translates() {
        let backend = backend(MockTransport::new().on(
            Method::Get,
            "/patients",
            200,
            json!({ "data": [{ "id": 1, "name": "Luis", "last_name": "Cruz", "email": "luis@example.com" }] }),
        ));
        let patients = backend.list_patients().unwrap();
        assert_eq!(patients[0].last_name, "Cruz");
        assert_eq!(patients[0].id, "1");
    }

    #[test]
    fn test_create_prescription_posts_each_line() {
        let backend = backend(
            MockTransport::new()
                .on(Method::Post, "/prescriptions", 201, created_row())
                .on(Method::Post, "/medications", 201, json!({ "id": 1 })),
        );

        let outcome = backend
            .create_prescription(flu(vec![
                Medication::new("Paracetamol", "500mg"),
                Medication::new("Ibuprofen", "400mg"),
            ]))
            .unwrap();

        assert!(!outcome.is_partial());
        assert_eq!(outcome.attached(), 2);
        assert_eq!(outcome.prescription.id, "11");
        assert_eq!(outcome.prescription.patient_name, "Luis Cruz");

        let posted = backend
            .client()
            .transport()
            .requests_to(Method::Post, "/medications");
        assert_eq!(posted.len(), 2);
        for request in posted {
            assert_eq!(request.body.unwrap()["prescription_id"], "11");
        }
    }

    #[test]
    fn test_partial_medication_failure_is_reported() {
        let backend = backend(
            MockTransport::new()
                .on(Method::Post, "/prescriptions", 201, created_row())
                .on_body(Method::Post, "/medications", "Ibuprofen", 500, json!({ "message": "boom" }))
                .on(Method::Post, "/medications", 201, json!({})),
        );

        let outcome = backend
            .create_prescription(flu(vec![
                Medication::new("Paracetamol", "500mg"),
                Medication::new("Ibuprofen", "400mg"),
            ]))
            .unwrap();

        assert!(outcome.is_partial());
        assert_eq!(outcome.requested, 2);
        assert_eq!(outcome.attached(), 1);
        assert_eq!(outcome.failures[0].name, "Ibuprofen");
        assert_eq!(outcome.prescription.medications[0].name, "Paracetamol");
        // No compensating delete
        assert!(backend
            .client()
            .transport()
            .requests_to(Method::Delete, "/prescriptions/11")
            .is_empty());
    }

    #[test]
    fn test_unauthorized_line_fails_create() {
        let backend = backend(
            MockTransport::new()
                .on(Method::Post, "/prescriptions", 201, created_row())
                .on(Method::Post, "/medications", 401, json!({ "message": "expired" })),
        );

        let err = backend
            .create_prescription(flu(vec![Medication::new("Paracetamol", "500mg")]))
            .unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_validation_status_mapped() {
        let backend = backend(MockTransport::new().on(
            Method::Post,
            "/patients",
            422,
            json!({ "message": "email is invalid" }),
        ));
        let err = backend
            .create_patient(PatientInput::new("a", "b", "bad"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(ref m) if m == "email is invalid"));
    }

    #[test]
    fn test_float_frequency_does_not_break_list() {
        let backend = backend(MockTransport::new().on(
            Method::Get,
            "/prescriptions",
            200,
            json!({ "data": [{
                "id": 4, "patient_id": 7, "date": "2025-04-01", "diagnosis": "Flu",
                "medications": [{ "name": "Paracetamol", "dosage": "500mg", "frequency": 8.0, "days": 5 }]
            }] }),
        ));
        let prescriptions = backend.list_prescriptions().unwrap();
        assert_eq!(prescriptions.len(), 1);
        assert_eq!(prescriptions[0].medications[0].frequency, Some(8));
    }

    #[test]
    fn test_patient_without_prescriptions_404_is_empty() {
        let backend = backend(MockTransport::new());
        let prescriptions = backend.list_prescriptions_for_patient("7").unwrap();
        assert!(prescriptions.is_empty());
    }

    #[test]
    fn test_patient_prescriptions_server_error_propagates() {
        let backend = backend(MockTransport::new().on(
            Method::Get,
            "/prescriptions/patient/7",
            500,
            json!({ "message": "boom" }),
        ));
        let err = backend.list_prescriptions_for_patient("7").unwrap_err();
        assert!(matches!(err, StoreError::Server { status: 500, .. }));
    }

    #[test]
    fn test_delete_prescription_404() {
        let backend = backend(MockTransport::new());
        let err = backend.delete_prescription("5").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_login_payload() {
        let backend = backend(MockTransport::new().on(
            Method::Post,
            "/auth/login",
            200,
            json!({ "data": { "token": "jwt", "user": { "id": 3, "name": "Ana", "last_name": "Diaz", "email": "ana@example.com" } } }),
        ));
        let payload = backend
            .login(&Credentials {
                email: "ana@example.com".into(),
                password: "secret1".into(),
            })
            .unwrap();
        assert_eq!(payload.user.last_name, "Diaz");
        let sent = backend.client().transport().requests();
        assert_eq!(sent[0].body.as_ref().unwrap()["email"], "ana@example.com");
    }
}
