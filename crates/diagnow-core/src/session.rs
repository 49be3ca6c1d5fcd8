//! Session state.
//!
//! ```text
//! Unauthenticated ──begin_login──▶ Authenticating ──complete_login──▶ Authenticated
//!        ▲                               │                                  │
//!        └──────────fail_login───────────┘                                  │
//!        └─────────────────────logout / expire (401)────────────────────────┘
//! ```
//!
//! A session is restored from storage at startup: no token means
//! unauthenticated, a demo token is trusted as-is, and a JWT is decoded with
//! its `exp` claim checked. There is no refresh flow.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::db::{Database, DbResult};
use crate::models::{AuthPayload, User};

/// Tokens minted by the offline backend start with this.
pub const DEMO_TOKEN_PREFIX: &str = "demo_token";

/// Where the session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    Authenticated,
}

/// Token decoding errors.
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Token is not a JWT")]
    Malformed,

    #[error("Token payload is not base64url: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("Token claims are not valid JSON: {0}")]
    Claims(#[from] serde_json::Error),
}

/// Claims this client reads from a JWT payload.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Claims {
    /// Expiry, seconds since the epoch
    pub exp: Option<i64>,
    pub id: Option<serde_json::Value>,
    pub email: Option<String>,
    pub name: Option<String>,
    #[serde(alias = "last_name", rename = "lastName")]
    pub last_name: Option<String>,
}

impl Claims {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.exp.is_some_and(|exp| exp < now.timestamp())
    }

    fn user(&self) -> User {
        let id = match &self.id {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        User {
            id,
            name: self.name.clone().unwrap_or_default(),
            last_name: self.last_name.clone().unwrap_or_default(),
            email: self.email.clone().unwrap_or_default(),
        }
    }
}

/// Decode the payload segment of a JWT. The signature is not verified;
/// that is the server's job.
pub fn decode_claims(token: &str) -> Result<Claims, TokenError> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_)) if !payload.is_empty() => payload,
        _ => return Err(TokenError::Malformed),
    };
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
    Ok(serde_json::from_slice(&bytes)?)
}

pub fn is_demo_token(token: &str) -> bool {
    token.starts_with(DEMO_TOKEN_PREFIX)
}

/// The signed-in doctor, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    state: SessionState,
    token: Option<String>,
    user: Option<User>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A fresh, unauthenticated session.
    pub fn new() -> Self {
        Self {
            state: SessionState::Unauthenticated,
            token: None,
            user: None,
        }
    }

    /// Rebuild the session from stored credentials.
    ///
    /// An expired or undecodable JWT is cleared from storage.
    pub fn restore(db: &Database, now: DateTime<Utc>) -> DbResult<Self> {
        let Some(token) = db.token()? else {
            debug!("no stored token");
            return Ok(Self::new());
        };

        if is_demo_token(&token) {
            let user = db.user()?;
            info!("restored demo session");
            return Ok(Self::authenticated(token, user));
        }

        match decode_claims(&token) {
            Ok(claims) if claims.is_expired(now) => {
                info!("stored token expired, signing out");
                clear_stored(db)?;
                Ok(Self::new())
            }
            Ok(claims) => {
                let user = claims.user();
                Ok(Self::authenticated(token, Some(user)))
            }
            Err(e) => {
                warn!(error = %e, "stored token unreadable, signing out");
                clear_stored(db)?;
                Ok(Self::new())
            }
        }
    }

    fn authenticated(token: String, user: Option<User>) -> Self {
        Self {
            state: SessionState::Authenticated,
            token: Some(token),
            user,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Credentials submitted, awaiting the backend.
    pub fn begin_login(&mut self) {
        self.state = SessionState::Authenticating;
    }

    /// The backend rejected the credentials.
    pub fn fail_login(&mut self) {
        *self = Self::new();
    }

    /// Persist the issued token and user and become authenticated.
    pub fn complete_login(&mut self, db: &Database, payload: AuthPayload) -> DbResult<()> {
        db.save_token(&payload.token)?;
        db.save_user(&payload.user)?;
        info!(user = %payload.user.email, "signed in");
        *self = Self::authenticated(payload.token, Some(payload.user));
        Ok(())
    }

    /// Explicit sign-out.
    pub fn logout(&mut self, db: &Database) -> DbResult<()> {
        clear_stored(db)?;
        *self = Self::new();
        Ok(())
    }

    /// The API rejected our token (401).
    pub fn expire(&mut self, db: &Database) -> DbResult<()> {
        if self.is_authenticated() {
            warn!("session rejected by server");
        }
        self.logout(db)
    }
}

fn clear_stored(db: &Database) -> DbResult<()> {
    db.remove_token()?;
    db.remove_user()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn jwt(claims: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.signature")
    }

    fn ana() -> User {
        User {
            id: "1".into(),
            name: "Ana".into(),
            last_name: "Diaz".into(),
            email: "ana@example.com".into(),
        }
    }

    #[test]
    fn test_no_token_is_unauthenticated() {
        let db = Database::open_in_memory().unwrap();
        let session = Session::restore(&db, Utc::now()).unwrap();
        assert_eq!(session.state(), SessionState::Unauthenticated);
        assert!(session.current_user().is_none());
    }

    #[test]
    fn test_demo_token_trusted() {
        let db = Database::open_in_memory().unwrap();
        db.save_token("demo_token_1712000000000").unwrap();
        db.save_user(&ana()).unwrap();

        let session = Session::restore(&db, Utc::now()).unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.current_user(), Some(&ana()));
    }

    #[test]
    fn test_valid_jwt_restores_user_from_claims() {
        let db = Database::open_in_memory().unwrap();
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        db.save_token(&jwt(json!({
            "exp": exp, "id": 42, "email": "ana@example.com", "name": "Ana", "lastName": "Diaz"
        })))
        .unwrap();

        let session = Session::restore(&db, Utc::now()).unwrap();
        assert!(session.is_authenticated());
        let user = session.current_user().unwrap();
        assert_eq!(user.id, "42");
        assert_eq!(user.last_name, "Diaz");
    }

    #[test]
    fn test_expired_jwt_signs_out() {
        let db = Database::open_in_memory().unwrap();
        let exp = (Utc::now() - Duration::minutes(5)).timestamp();
        db.save_token(&jwt(json!({ "exp": exp, "id": 1 }))).unwrap();
        db.save_user(&ana()).unwrap();

        let session = Session::restore(&db, Utc::now()).unwrap();
        assert_eq!(session.state(), SessionState::Unauthenticated);
        assert!(session.current_user().is_none());
        assert!(db.token().unwrap().is_none());
        assert!(db.user().unwrap().is_none());
    }

    #[test]
    fn test_garbage_token_signs_out() {
        let db = Database::open_in_memory().unwrap();
        db.save_token("not-a-jwt").unwrap();

        let session = Session::restore(&db, Utc::now()).unwrap();
        assert!(!session.is_authenticated());
        assert!(db.token().unwrap().is_none());
    }

    #[test]
    fn test_jwt_without_exp_never_expires() {
        let claims = decode_claims(&jwt(json!({ "id": "u1" }))).unwrap();
        assert!(!claims.is_expired(Utc::now()));
    }

    #[test]
    fn test_login_lifecycle() {
        let db = Database::open_in_memory().unwrap();
        let mut session = Session::new();

        session.begin_login();
        assert_eq!(session.state(), SessionState::Authenticating);

        session
            .complete_login(
                &db,
                AuthPayload {
                    user: ana(),
                    token: "demo_token_1".into(),
                },
            )
            .unwrap();
        assert!(session.is_authenticated());
        assert_eq!(db.token().unwrap().as_deref(), Some("demo_token_1"));

        session.logout(&db).unwrap();
        assert_eq!(session, Session::new());
        assert!(db.token().unwrap().is_none());
    }

    #[test]
    fn test_failed_login_returns_to_unauthenticated() {
        let mut session = Session::new();
        session.begin_login();
        session.fail_login();
        assert_eq!(session.state(), SessionState::Unauthenticated);
    }
}
