//! Bootstrap orchestrator
//!
//! Sequences the startup stages: resolve settings (which also verifies the
//! required secret/identifier and validates the base URL), run the remote
//! authorization gate, then hand the resolved config to the trade runtime.
//! Any stage failing short-circuits the rest; no partial engine ever starts.

use async_trait::async_trait;
use tracing::info;

#[cfg(test)]
use mockall::automock;

use crate::adapters::EdgeXAdapter;
use crate::auth::{AuthDecision, AuthorizationCheck};
use crate::config::{resolve_settings, RawSettingSources, ResolvedConfig};
use crate::error::{GridError, Result};
use crate::strategy::GridEngine;

/// Handoff seam: everything that happens after the gate opens
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TradeRuntime: Send + Sync {
    async fn launch(&self, config: ResolvedConfig) -> Result<()>;
}

/// Production runtime: construct the adapter and engine, await the run loop
#[derive(Debug, Default)]
pub struct LiveRuntime;

#[async_trait]
impl TradeRuntime for LiveRuntime {
    async fn launch(&self, config: ResolvedConfig) -> Result<()> {
        let adapter = EdgeXAdapter::new(
            &config.base_url,
            config.account_id,
            config.signing_key.clone(),
        )?;
        let engine = GridEngine::new(
            adapter,
            config.symbol,
            config.symbol_param_name,
            config.poll_interval_sec,
        );
        engine.run().await
    }
}

/// Run the full bootstrap sequence
///
/// The gate fails closed: `Denied` and `CheckFailed` both become fatal errors
/// and the runtime is never launched.
pub async fn run_bootstrap(
    sources: &RawSettingSources,
    auth: &dyn AuthorizationCheck,
    runtime: &dyn TradeRuntime,
) -> Result<()> {
    let config = resolve_settings(sources)?;
    info!(
        "edgex base_url={} symbol_param={} symbol={} poll_interval={:.1}s",
        config.base_url, config.symbol_param_name, config.symbol, config.poll_interval_sec
    );

    match auth.check(&config.auth_url, config.account_id).await {
        AuthDecision::Allowed => {}
        AuthDecision::Denied { account_id } => {
            return Err(GridError::AuthDenied {
                account_id,
                auth_url: config.auth_url,
            })
        }
        AuthDecision::CheckFailed { account_id, cause } => {
            return Err(GridError::AuthCheckFailed { account_id, cause })
        }
    }

    runtime.launch(config).await
}
