//! Screen plumbing shared by every controller.

use thiserror::Error;
use tracing::{debug, warn};

use diagnow_core::store::{StoreError, StoreResult};
use diagnow_core::App;

use crate::forms::FieldErrors;
use crate::routes::Route;

/// Generic message for network and server failures.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again later.";

/// What a screen surfaces when an operation fails.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewError {
    /// Shown inline next to each field
    #[error("Form has {} invalid field(s)", .0.len())]
    Invalid(FieldErrors),

    /// Notify, then leave the broken screen
    #[error("{message}")]
    NotFound { message: String, redirect: Route },

    /// The session was dropped; go to login
    #[error("Your session has expired. Please sign in again.")]
    SessionExpired,

    /// Dismissible notification
    #[error("{0}")]
    Failed(String),
}

impl ViewError {
    /// Map a service error; not-found sends the user to `fallback`.
    pub fn from_store(e: StoreError, fallback: Route) -> Self {
        match e {
            StoreError::NotFound { .. } => ViewError::NotFound {
                message: e.to_string(),
                redirect: fallback,
            },
            StoreError::Unauthorized(_) => ViewError::SessionExpired,
            StoreError::Validation(message) => ViewError::Failed(message),
            other => {
                warn!(error = %other, "operation failed");
                ViewError::Failed(GENERIC_FAILURE.to_string())
            }
        }
    }

    /// Where to navigate after showing this error, if anywhere.
    pub fn redirect(&self) -> Option<Route> {
        match self {
            ViewError::NotFound { redirect, .. } => Some(redirect.clone()),
            ViewError::SessionExpired => Some(Route::Login),
            ViewError::Invalid(_) | ViewError::Failed(_) => None,
        }
    }
}

impl From<FieldErrors> for ViewError {
    fn from(errors: FieldErrors) -> Self {
        ViewError::Invalid(errors)
    }
}

pub type ViewResult<T> = Result<T, ViewError>;

/// Run a service result through the app (401 ends the session) and map the
/// error for display.
pub fn settle<T>(app: &mut App, result: StoreResult<T>, fallback: Route) -> ViewResult<T> {
    app.observe(result)
        .map_err(|e| ViewError::from_store(e, fallback))
}

/// Lifecycle of a fetched collection.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Loading,
    Loaded(T),
    Empty,
    Failed(ViewError),
}

impl<T> Default for LoadState<T> {
    fn default() -> Self {
        LoadState::Loading
    }
}

impl<T> LoadState<Vec<T>> {
    pub fn from_list(result: ViewResult<Vec<T>>) -> Self {
        match result {
            Ok(items) if items.is_empty() => LoadState::Empty,
            Ok(items) => LoadState::Loaded(items),
            Err(e) => {
                debug!(error = %e, "load failed");
                LoadState::Failed(e)
            }
        }
    }

    pub fn items(&self) -> &[T] {
        match self {
            LoadState::Loaded(items) => items,
            _ => &[],
        }
    }
}

impl<T> LoadState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn error(&self) -> Option<&ViewError> {
        match self {
            LoadState::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Severity of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A transient notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: Option<String>,
}

impl Notice {
    pub fn success(title: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.into(),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: "Error".into(),
            message: Some(message.into()),
        }
    }
}

impl From<&ViewError> for Notice {
    fn from(e: &ViewError) -> Self {
        Notice::error(e.to_string())
    }
}

/// Result of a submit or delete handler.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub navigate: Route,
    pub notice: Notice,
}

impl Outcome {
    pub fn to(navigate: Route, notice: Notice) -> Self {
        Self { navigate, notice }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diagnow_core::store::Entity;

    #[test]
    fn test_not_found_redirects_to_fallback() {
        let e = ViewError::from_store(StoreError::not_found(Entity::Patient, "p9"), Route::Patients);
        assert_eq!(e.redirect(), Some(Route::Patients));
    }

    #[test]
    fn test_unauthorized_goes_to_login() {
        let e = ViewError::from_store(StoreError::Unauthorized("expired".into()), Route::Dashboard);
        assert_eq!(e, ViewError::SessionExpired);
        assert_eq!(e.redirect(), Some(Route::Login));
    }

    #[test]
    fn test_server_errors_are_generic() {
        let e = ViewError::from_store(
            StoreError::Server {
                status: 502,
                message: "upstream exploded".into(),
            },
            Route::Dashboard,
        );
        assert_eq!(e.to_string(), GENERIC_FAILURE);
        assert!(e.redirect().is_none());
    }

    #[test]
    fn test_load_state_from_list() {
        assert_eq!(LoadState::<Vec<u8>>::from_list(Ok(vec![])), LoadState::Empty);
        assert_eq!(LoadState::from_list(Ok(vec![1])).items(), &[1]);
        let failed = LoadState::<Vec<u8>>::from_list(Err(ViewError::Failed("x".into())));
        assert!(failed.error().is_some());
        assert!(failed.items().is_empty());
        assert!(LoadState::<Vec<u8>>::default().is_loading());
    }
}
