//! REST API client.
//!
//! Every request carries the stored session token as a bearer header. A 401
//! from any endpoint clears the stored session before the error is returned,
//! whichever service issued the call.

mod mock;
mod transport;
pub mod wire;

pub use mock::*;
pub use transport::*;

use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::db::Database;
use wire::{error_message, unwrap_envelope};

/// API client errors.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Cannot connect to API at {0}")]
    Connection(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Session storage error: {0}")]
    Storage(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Authenticated JSON client over a [`Transport`].
pub struct ApiClient<T: Transport = HttpTransport> {
    transport: T,
    db: Arc<Mutex<Database>>,
}

impl<T: Transport> ApiClient<T> {
    /// `db` is where the session token is read from and cleared on 401.
    pub fn new(transport: T, db: Arc<Mutex<Database>>) -> Self {
        Self { transport, db }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn stored_token(&self) -> ApiResult<Option<String>> {
        let db = self
            .db
            .lock()
            .map_err(|e| ApiError::Storage(e.to_string()))?;
        db.token().map_err(|e| ApiError::Storage(e.to_string()))
    }

    fn clear_session(&self) {
        let cleared = self.db.lock().map(|db| {
            let token = db.remove_token();
            let user = db.remove_user();
            token.and(user)
        });
        if !matches!(cleared, Ok(Ok(()))) {
            warn!("could not clear stored session after 401");
        }
    }

    /// Send a request and return the raw 2xx body.
    fn execute(&self, method: Method, path: &str, body: Option<serde_json::Value>) -> ApiResult<String> {
        let request = ApiRequest {
            method,
            path: path.to_string(),
            bearer: self.stored_token()?,
            body,
        };
        debug!(?method, path, "api request");

        let response = self.transport.send(&request)?;
        match response.status {
            200..=299 => Ok(response.body),
            401 => {
                warn!(path, "api returned 401, clearing stored session");
                self.clear_session();
                Err(ApiError::Unauthorized(error_message(&response.body, "Session expired")))
            }
            404 => Err(ApiError::NotFound(error_message(&response.body, path))),
            status => Err(ApiError::Status {
                status,
                message: error_message(&response.body, "Request failed"),
            }),
        }
    }

    /// Request a JSON payload, unwrapping a `{ "data": ... }` envelope if present.
    pub fn request<R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> ApiResult<R> {
        let text = self.execute(method, path, body)?;
        unwrap_envelope(&text).map_err(|e| ApiError::ResponseParsing(format!("{path}: {e}")))
    }

    /// Request where only success matters.
    pub fn request_empty(&self, method: Method, path: &str, body: Option<serde_json::Value>) -> ApiResult<()> {
        self.execute(method, path, body).map(|_| ())
    }

    pub fn get<R: DeserializeOwned>(&self, path: &str) -> ApiResult<R> {
        self.request(Method::Get, path, None)
    }

    pub fn post<B: Serialize, R: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<R> {
        self.request(Method::Post, path, Some(to_value(body)?))
    }

    /// POST where the response body is ignored.
    pub fn post_empty<B: Serialize>(&self, path: &str, body: &B) -> ApiResult<()> {
        self.request_empty(Method::Post, path, Some(to_value(body)?))
    }

    pub fn put<B: Serialize, R: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<R> {
        self.request(Method::Put, path, Some(to_value(body)?))
    }

    pub fn delete(&self, path: &str) -> ApiResult<()> {
        self.request_empty(Method::Delete, path, None)
    }
}

fn to_value<B: Serialize>(body: &B) -> ApiResult<serde_json::Value> {
    serde_json::to_value(body).map_err(|e| ApiError::HttpClient(e.to_string()))
}
