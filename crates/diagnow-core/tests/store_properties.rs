//! Property tests for the local store and search filters.

use std::sync::{Arc, Mutex};

use diagnow_core::db::Database;
use diagnow_core::models::{Patient, PatientInput};
use diagnow_core::services::{filter_patients, PatientService};
use diagnow_core::store::{LocalBackend, PatientStore};
use proptest::prelude::*;

fn setup_backend() -> LocalBackend {
    let db = Database::open_in_memory().unwrap();
    LocalBackend::new(Arc::new(Mutex::new(db)))
}

fn word() -> impl Strategy<Value = String> {
    "[A-Za-zÁÉÍÓÚáéíóúñ]{1,12}"
}

fn patient_input() -> impl Strategy<Value = PatientInput> {
    (
        word(),
        word(),
        "[a-z]{1,8}@[a-z]{1,8}\\.(com|org|es)",
        proptest::option::of("[0-9]{3}-[0-9]{4}"),
        proptest::option::of(0u32..120),
        proptest::option::of("[A-Za-z ]{1,20}"),
    )
        .prop_map(|(name, last_name, email, phone, age, allergies)| PatientInput {
            phone,
            age,
            allergies: allergies.filter(|a| !a.trim().is_empty()),
            ..PatientInput::new(name, last_name, email)
        })
}

proptest! {
    #[test]
    fn created_patient_reads_back_equal(input in patient_input()) {
        let backend = setup_backend();
        let created = backend.create_patient(input.clone()).unwrap();
        let fetched = backend.get_patient(&created.id).unwrap();

        prop_assert_eq!(&fetched, &created);
        prop_assert_eq!(fetched.to_input(), input);
    }

    #[test]
    fn filter_keeps_exactly_the_matching_subset(
        inputs in proptest::collection::vec(patient_input(), 0..12),
        term in "[a-zA-Z@. ]{1,4}",
    ) {
        let patients: Vec<Patient> = inputs
            .into_iter()
            .enumerate()
            .map(|(i, input)| Patient::with_id(format!("p{i}"), input))
            .collect();

        let found = filter_patients(&patients, &term);
        let needle = term.to_lowercase();
        let expected: Vec<Patient> = patients
            .iter()
            .filter(|p| {
                term.trim().is_empty()
                    || p.name.to_lowercase().contains(&needle)
                    || p.last_name.to_lowercase().contains(&needle)
                    || p.email.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();

        prop_assert_eq!(found, expected);
    }
}

#[test]
fn test_delete_absent_patient_leaves_collection() {
    let db = Database::open_in_memory().unwrap();
    db.seed_demo_data().unwrap();
    let backend = LocalBackend::new(Arc::new(Mutex::new(db)));

    let before = backend.list_patients().unwrap();
    backend.delete_patient("does-not-exist").unwrap();
    assert_eq!(backend.list_patients().unwrap(), before);
}

#[test]
fn test_get_absent_patient_is_not_found() {
    let backend = setup_backend();
    let err = backend.get_patient("nope").unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.status(), 404);
}

#[test]
fn test_search_with_no_match_is_empty() {
    let db = Database::open_in_memory().unwrap();
    db.seed_demo_data().unwrap();
    let backend = LocalBackend::new(Arc::new(Mutex::new(db)));

    let service = PatientService::new(&backend);
    assert!(service.search("zzzz").unwrap().is_empty());
    assert_eq!(service.search("EXAMPLE.COM").unwrap().len(), 3);
}
