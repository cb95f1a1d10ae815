//! Endpoint sanity checks for operator-supplied URLs

use url::Url;

use crate::error::{GridError, Result};

/// Hostname substring marking a template value the operator never replaced
const PLACEHOLDER_MARKER: &str = "example";

/// Check that a candidate base URL has a scheme and host and is not a
/// leftover placeholder. `setting` names the offending variable in errors.
pub fn validate_endpoint(setting: &'static str, candidate: &str) -> Result<()> {
    let invalid = || GridError::InvalidEndpoint {
        setting,
        value: candidate.to_string(),
    };

    // A bare hostname parses as a scheme-relative path, so parse failure and
    // missing host are the same operator mistake.
    let url = Url::parse(candidate).map_err(|_| invalid())?;
    let host = url.host_str().ok_or_else(invalid)?;
    if host.is_empty() {
        return Err(invalid());
    }

    if host.contains(PLACEHOLDER_MARKER) {
        return Err(GridError::PlaceholderEndpoint {
            setting,
            value: candidate.to_string(),
        });
    }

    Ok(())
}
