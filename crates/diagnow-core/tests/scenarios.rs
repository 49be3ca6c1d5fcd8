//! End-to-end flows through the app facade.

use chrono::{Duration, Utc};
use diagnow_core::config::Config;
use diagnow_core::models::{PatientInput, PrescriptionInput, Registration};
use diagnow_core::session::SessionState;
use diagnow_core::{App, Database};

fn file_config(dir: &tempfile::TempDir) -> Config {
    Config {
        data_path: Some(dir.path().join("diagnow.db").to_string_lossy().into_owned()),
        ..Config::local()
    }
}

#[test]
fn test_register_signs_in() {
    let mut app = App::local_in_memory().unwrap();

    let user = app
        .auth()
        .register(&Registration {
            name: "Ana".into(),
            last_name: "Diaz".into(),
            email: "ana@example.com".into(),
            password: "secret1".into(),
        })
        .unwrap();

    assert_eq!(user.display_name(), "Dr. Ana Diaz");
    assert_eq!(app.session().state(), SessionState::Authenticated);
    assert!(app.session().token().unwrap().starts_with("demo_token_"));

    let db = app.db().lock().unwrap();
    assert_eq!(db.token().unwrap().as_deref(), app.session().token());
}

#[test]
fn test_patient_with_flu_prescription() {
    let app = App::local_in_memory().unwrap();

    let luis = app
        .patients()
        .create(PatientInput::new("Luis", "Cruz", "luis@example.com"))
        .unwrap();

    // Shape the form submits: numbers as strings
    let input: PrescriptionInput = serde_json::from_value(serde_json::json!({
        "patientId": luis.id,
        "date": "2025-04-02",
        "diagnosis": "Flu",
        "medications": [
            { "name": "Paracetamol", "dosage": "500mg", "frequency": "8", "days": "5" }
        ]
    }))
    .unwrap();
    app.prescriptions().create(input).unwrap();

    let list = app.prescriptions().for_patient(&luis.id).unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].diagnosis, "Flu");
    assert_eq!(list[0].patient_name, "Luis Cruz");
    assert_eq!(list[0].medications.len(), 1);
    assert_eq!(list[0].medications[0].name, "Paracetamol");
    assert_eq!(list[0].medications[0].frequency, Some(8));
}

#[test]
fn test_expired_token_at_startup() {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    let dir = tempfile::tempdir().unwrap();
    let config = file_config(&dir);

    {
        let db = Database::open(dir.path().join("diagnow.db")).unwrap();
        let exp = (Utc::now() - Duration::hours(2)).timestamp();
        let claims = serde_json::json!({ "exp": exp, "id": 7, "email": "ana@example.com" });
        let token = format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256"}"#),
            URL_SAFE_NO_PAD.encode(claims.to_string())
        );
        db.save_token(&token).unwrap();
    }

    let app = App::from_config(config).unwrap();
    assert_eq!(app.session().state(), SessionState::Unauthenticated);
    assert!(app.session().current_user().is_none());
}

#[test]
fn test_offline_data_survives_restart() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;

    let id = {
        let app = App::from_config(file_config(&dir))?;
        app.patients()
            .create(PatientInput::new("Luis", "Cruz", "luis@example.com"))?
            .id
    };

    let app = App::from_config(file_config(&dir))?;
    assert_eq!(app.patients().get(&id)?.name, "Luis");
    // Seeding only runs on an absent collection
    assert_eq!(app.patients().list()?.len(), 4);
    Ok(())
}
