pub mod adapters;
pub mod auth;
pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod logging;
pub mod strategy;

pub use auth::{AuthDecision, AuthorizationCheck, AuthorizationGate};
pub use bootstrap::{run_bootstrap, LiveRuntime, TradeRuntime};
pub use config::{
    resolve_settings, FileConfig, RawSettingSources, ResolvedConfig, SigningKey,
};
pub use error::{GridError, Result};
