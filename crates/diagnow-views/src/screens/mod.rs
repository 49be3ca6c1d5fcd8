//! Screen controllers.
//!
//! Each screen fetches on open, exposes a [`LoadState`](crate::screen::LoadState)
//! or a loaded view, and its submit handlers call a service and return
//! where to go next.

pub mod auth;
pub mod dashboard;
pub mod patients;
pub mod prescriptions;
