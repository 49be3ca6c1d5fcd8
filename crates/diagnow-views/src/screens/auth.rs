use tracing::info;

use diagnow_core::store::StoreError;
use diagnow_core::App;

use crate::forms::{LoginForm, RegisterForm};
use crate::routes::Route;
use crate::screen::{Notice, Outcome, ViewError, ViewResult, GENERIC_FAILURE};

const LOGIN_FAILED: &str = "Invalid credentials. Please try again.";
const REGISTER_FAILED: &str = "Registration failed. Please try again.";

/// Rejections here are about the credentials, not an expired session.
fn auth_failure(e: StoreError, fallback: &str) -> ViewError {
    match e {
        StoreError::Unauthorized(message) | StoreError::Validation(message)
            if !message.trim().is_empty() =>
        {
            ViewError::Failed(message)
        }
        StoreError::Network(_) => ViewError::Failed(GENERIC_FAILURE.to_string()),
        _ => ViewError::Failed(fallback.to_string()),
    }
}

/// Sign in and go to the dashboard.
pub fn submit_login(app: &mut App, form: &LoginForm) -> ViewResult<Outcome> {
    let credentials = form.validate()?;
    let user = app
        .auth()
        .login(&credentials)
        .map_err(|e| auth_failure(e, LOGIN_FAILED))?;
    info!(user = %user.email, "login screen done");
    Ok(Outcome::to(Route::Dashboard, Notice::success("Signed in")))
}

/// Register, which also signs in, and go to the dashboard.
pub fn submit_register(app: &mut App, form: &RegisterForm) -> ViewResult<Outcome> {
    let registration = form.validate()?;
    app.auth()
        .register(&registration)
        .map_err(|e| auth_failure(e, REGISTER_FAILED))?;
    Ok(Outcome::to(Route::Dashboard, Notice::success("Registration successful")))
}

pub fn logout(app: &mut App) -> ViewResult<Outcome> {
    app.auth()
        .logout()
        .map_err(|e| ViewError::from_store(e, Route::Login))?;
    Ok(Outcome::to(Route::Login, Notice::success("Signed out")))
}
