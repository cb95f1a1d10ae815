//! Remote authorization gate
//!
//! Startup is gated on an out-of-band authorization service that maps account
//! ids to an allow/deny answer. The gate fails closed: any inability to get a
//! positive confirmation (network error, timeout, non-2xx, unparseable body,
//! missing field) blocks startup. A single attempt is made per process run.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{info, warn};

#[cfg(test)]
use mockall::automock;

/// Bounded timeout on the single authorization request
pub const AUTH_TIMEOUT: Duration = Duration::from_secs(6);

/// String forms of `allowed` accepted as a positive answer, case-insensitive
const TRUTHY_FORMS: [&str; 3] = ["1", "true", "yes"];

/// Outcome of one authorization attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDecision {
    Allowed,
    /// The service answered and rejected the account
    Denied { account_id: u64 },
    /// The service could not be positively consulted; treated like a denial
    CheckFailed { account_id: u64, cause: String },
}

/// Seam for the remote check so the orchestrator can be tested without a
/// network
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AuthorizationCheck: Send + Sync {
    async fn check(&self, auth_url: &str, account_id: u64) -> AuthDecision;
}

/// Production gate backed by a one-shot reqwest client
#[derive(Debug, Default)]
pub struct AuthorizationGate;

#[async_trait]
impl AuthorizationCheck for AuthorizationGate {
    async fn check(&self, auth_url: &str, account_id: u64) -> AuthDecision {
        info!("authorization check: url={auth_url} account_id={account_id}");

        let check_failed = |cause: String| {
            warn!(
                "authorization service unreachable/unverifiable: {cause} / register at {auth_url}?accountId={account_id}"
            );
            AuthDecision::CheckFailed { account_id, cause }
        };

        // Client is scoped to this one request and dropped on every path;
        // redirects are followed (reqwest default policy).
        let client = match reqwest::Client::builder().timeout(AUTH_TIMEOUT).build() {
            Ok(client) => client,
            Err(e) => return check_failed(format!("building HTTP client: {e}")),
        };

        let response = client
            .get(auth_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[("accountId", account_id.to_string())])
            .send()
            .await;

        let decision = match response {
            Ok(response) => {
                let status = response.status();
                match response.bytes().await {
                    Ok(body) => evaluate_auth_response(status, &body, account_id),
                    Err(e) => return check_failed(format!("reading response body: {e}")),
                }
            }
            Err(e) => return check_failed(e.to_string()),
        };

        match &decision {
            AuthDecision::Allowed => info!("authorization OK: account_id={account_id}"),
            AuthDecision::Denied { .. } => warn!(
                "account not authorized: account_id={account_id} / register at {auth_url}?accountId={account_id}"
            ),
            AuthDecision::CheckFailed { cause, .. } => {
                warn!("authorization check failed: {cause}")
            }
        }
        decision
    }
}

/// Pure interpretation of the service response
///
/// Non-2xx is a transport-level failure, not a denial. A 2xx body must be
/// JSON; from a JSON mapping, only a truthy `allowed` field grants access.
/// Absent field, non-truthy value, or non-mapping body all mean denied; the
/// default posture is deny, never allow.
pub fn evaluate_auth_response(status: StatusCode, body: &[u8], account_id: u64) -> AuthDecision {
    if !status.is_success() {
        return AuthDecision::CheckFailed {
            account_id,
            cause: format!("authorization service returned HTTP {status}"),
        };
    }

    let parsed: Value = match serde_json::from_slice(body) {
        Ok(parsed) => parsed,
        Err(e) => {
            return AuthDecision::CheckFailed {
                account_id,
                cause: format!("authorization response is not JSON: {e}"),
            }
        }
    };

    let allowed = parsed
        .as_object()
        .and_then(|map| map.get("allowed"))
        .is_some_and(is_truthy);

    if allowed {
        AuthDecision::Allowed
    } else {
        AuthDecision::Denied { account_id }
    }
}

/// Truthiness of the `allowed` field by its string form
fn is_truthy(value: &Value) -> bool {
    let form = match value {
        Value::String(s) => s.to_ascii_lowercase(),
        other => other.to_string().to_ascii_lowercase(),
    };
    TRUTHY_FORMS.contains(&form.as_str())
}
