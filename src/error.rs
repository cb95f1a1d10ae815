use thiserror::Error;

/// Main error type for the grid bot
#[derive(Error, Debug)]
pub enum GridError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid endpoint for {setting}: {value:?} (expected https://hostname)")]
    InvalidEndpoint { setting: &'static str, value: String },

    #[error("Placeholder endpoint for {setting}: {value:?} - replace the template value with the real API base URL")]
    PlaceholderEndpoint { setting: &'static str, value: String },

    // Authorization errors
    #[error("Account not authorized: account_id={account_id} / register at {auth_url}?accountId={account_id}")]
    AuthDenied { account_id: u64, auth_url: String },

    #[error("Authorization check failed for account_id={account_id}: {cause} (startup blocked; fix connectivity and re-run)")]
    AuthCheckFailed { account_id: u64, cause: String },

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Exchange errors
    #[error("Exchange response error: {0}")]
    Exchange(String),
}

/// Result type alias using GridError
pub type Result<T> = std::result::Result<T, GridError>;
