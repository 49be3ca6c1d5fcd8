//! Domain services.
//!
//! Each service borrows the active [`Backend`](crate::store::Backend) and
//! never knows which one it is talking to.

mod auth;
mod patients;
mod prescriptions;

pub use auth::*;
pub use patients::*;
pub use prescriptions::*;

/// Lowercased search needle. A blank term yields `None`, meaning "match
/// everything"; otherwise the term is matched as typed, spaces included.
pub(crate) fn needle(term: &str) -> Option<String> {
    (!term.trim().is_empty()).then(|| term.to_lowercase())
}
