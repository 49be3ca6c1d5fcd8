use tracing_subscriber::EnvFilter;

/// Application-level constants
pub const APP_NAME: &str = "DiagNow";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// REST API base URL when none is configured
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const ENV_API_URL: &str = "DIAGNOW_API_URL";
pub const ENV_USE_LOCAL_STORAGE: &str = "DIAGNOW_USE_LOCAL_STORAGE";
pub const ENV_DATA_PATH: &str = "DIAGNOW_DATA_PATH";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "DIAGNOW_REQUEST_TIMEOUT_SECS";

/// Runtime configuration, fixed for the life of the process.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct Config {
    pub api_url: String,
    /// Offline mode: everything lives in the local store
    pub use_local_storage: bool,
    /// SQLite file; in-memory when absent
    pub data_path: Option<String>,
    pub request_timeout_secs: u64,
}

impl Config {
    /// Offline, in-memory.
    pub fn local() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            use_local_storage: true,
            data_path: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    /// Talk to the REST API at `api_url`.
    pub fn remote(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            use_local_storage: false,
            ..Self::local()
        }
    }

    /// Read `DIAGNOW_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unset or unparsable values fall back to
    /// defaults; local storage defaults on in debug builds.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let use_local_storage = match value(ENV_USE_LOCAL_STORAGE).as_deref() {
            Some("true") | Some("1") => true,
            Some("false") | Some("0") => false,
            _ => cfg!(debug_assertions),
        };

        Self {
            api_url: value(ENV_API_URL).unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            use_local_storage,
            data_path: value(ENV_DATA_PATH),
            request_timeout_secs: value(ENV_REQUEST_TIMEOUT_SECS)
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "diagnow_core=info,diagnow_views=info,warn"
}

/// Install the global tracing subscriber. Returns false if one was already set.
pub fn init_logging() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_log_filter())),
        )
        .try_init()
        .is_ok()
}
