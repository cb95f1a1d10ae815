//! Runtime configuration: sources, precedence resolution, resolved settings
//!
//! Settings come from three read-only sources merged per-setting with a fixed
//! precedence: process environment, then the optional TOML config file, then
//! hardcoded defaults. Resolution never mutates a source; it produces a fresh
//! `ResolvedConfig` or a fatal error.

use std::collections::HashMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::Path;

use tracing::warn;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::endpoint::validate_endpoint;
use crate::error::{GridError, Result};

// Environment variable names
pub const ENV_BASE_URL: &str = "EDGEX_BASE_URL";
pub const ENV_ACCOUNT_ID: &str = "EDGEX_ACCOUNT_ID";
pub const ENV_API_ID: &str = "EDGEX_API_ID";
pub const ENV_STARK_PRIVATE_KEY: &str = "EDGEX_STARK_PRIVATE_KEY";
pub const ENV_L2_KEY: &str = "EDGEX_L2_KEY";
pub const ENV_SYMBOL_PARAM: &str = "EDGEX_SYMBOL_PARAM";
pub const ENV_CONTRACT_ID: &str = "EDGEX_CONTRACT_ID";
pub const ENV_SYMBOL: &str = "EDGEX_SYMBOL";
pub const ENV_POLL_INTERVAL_SEC: &str = "EDGEX_POLL_INTERVAL_SEC";

/// Production API base URL, used when neither env nor file supplies one
pub const DEFAULT_BASE_URL: &str = "https://pro.edgex.exchange";
/// Query parameter name the exchange expects for the contract identifier
pub const DEFAULT_SYMBOL_PARAM: &str = "contractId";
/// BTC-PERP contract id on EdgeX
pub const DEFAULT_SYMBOL: &str = "10000001";
pub const DEFAULT_POLL_INTERVAL_SEC: f64 = 2.5;
/// Hard floor on the poll interval; never poll faster than this
pub const MIN_POLL_INTERVAL_SEC: f64 = 1.5;
/// Ceiling on the poll interval; also keeps the value safe for
/// `Duration::from_secs_f64`, which panics on huge or non-finite input
pub const MAX_POLL_INTERVAL_SEC: f64 = 3600.0;
/// Maintained authorization service queried when the file sets no auth_url
pub const DEFAULT_AUTH_URL: &str =
    "https://script.google.com/macros/s/AKfycbz5qTzBD62-FRdRwA0qBzxPy6fGj3fuuRwx4fQ0cNj-qmLtWwOqo9UZDnc0tv31ezMl/exec";

/// Optional TOML config file, flattened to string values
///
/// A missing file is not an error and yields an empty mapping. A present but
/// unreadable or unparseable file is fatal: an operator who wrote a config
/// file wants it honored, not silently ignored.
#[derive(Debug, Clone, Default)]
pub struct FileConfig {
    values: HashMap<String, String>,
}

impl FileConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(GridError::Config(format!(
                    "cannot read config file {}: {e}",
                    path.display()
                )))
            }
        };
        let table: toml::Table = raw.parse().map_err(|e| {
            GridError::Config(format!("invalid config file {}: {e}", path.display()))
        })?;
        Ok(Self::from_table(table))
    }

    /// Flatten top-level scalar entries; nested tables and arrays are ignored
    fn from_table(table: toml::Table) -> Self {
        let mut values = HashMap::new();
        for (key, value) in table {
            let rendered = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Float(f) => f.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                _ => continue,
            };
            values.insert(key, rendered);
        }
        Self { values }
    }

    #[cfg(test)]
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            values: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// One step in a precedence chain
#[derive(Debug, Clone, Copy)]
enum Lookup {
    Env(&'static str),
    File(&'static str),
    Default(&'static str),
}

/// The three read-only setting sources
///
/// The environment is a snapshot taken once at startup (or constructed
/// directly in tests), never the live process environment, so resolution is
/// deterministic for the whole bootstrap.
pub struct RawSettingSources {
    env: HashMap<String, String>,
    file: FileConfig,
    defaults: HashMap<&'static str, &'static str>,
}

impl RawSettingSources {
    pub fn new(env: HashMap<String, String>, file: FileConfig) -> Self {
        let defaults = HashMap::from([
            ("base_url", DEFAULT_BASE_URL),
            ("symbol_param", DEFAULT_SYMBOL_PARAM),
            ("symbol", DEFAULT_SYMBOL),
            ("auth_url", DEFAULT_AUTH_URL),
        ]);
        Self {
            env,
            file,
            defaults,
        }
    }

    /// Snapshot the live process environment
    pub fn from_live_env(file: FileConfig) -> Self {
        Self::new(std::env::vars().collect(), file)
    }

    /// A value set to the empty string counts as absent
    fn get(&self, lookup: Lookup) -> Option<&str> {
        let value = match lookup {
            Lookup::Env(name) => self.env.get(name).map(String::as_str),
            Lookup::File(key) => self.file.get(key),
            Lookup::Default(key) => self.defaults.get(key).copied(),
        };
        value.filter(|v| !v.is_empty())
    }

    /// Ordered-fallback combinator: first non-empty value in the chain wins
    fn first_non_empty(&self, chain: &[Lookup]) -> Option<String> {
        chain
            .iter()
            .find_map(|lookup| self.get(*lookup))
            .map(str::to_string)
    }
}

/// Exchange signing key; zeroized on drop, redacted from Debug output
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SigningKey(String);

impl SigningKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

/// Fully resolved runtime settings
///
/// Only constructed once every required field has a value and the base URL
/// has passed endpoint validation; never partially populated.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub account_id: u64,
    pub signing_key: SigningKey,
    pub symbol: String,
    pub symbol_param_name: String,
    pub poll_interval_sec: f64,
    pub auth_url: String,
}

/// Resolve all settings against the precedence chains
///
/// Fatal when the account id or signing key is missing, the account id is not
/// an integer, or the base URL fails validation. All checks happen here,
/// before any network call is made.
pub fn resolve_settings(sources: &RawSettingSources) -> Result<ResolvedConfig> {
    use Lookup::{Default, Env, File};

    let base_url = sources
        .first_non_empty(&[Env(ENV_BASE_URL), File("base_url"), Default("base_url")])
        .unwrap_or_default();
    validate_endpoint(ENV_BASE_URL, &base_url)?;

    warn_on_conflicting_alias(sources, ENV_ACCOUNT_ID, ENV_API_ID);
    let account_raw = sources
        .first_non_empty(&[
            Env(ENV_ACCOUNT_ID),
            Env(ENV_API_ID),
            File("account_id"),
            File("api_id"),
        ])
        .ok_or_else(|| {
            GridError::Config(format!("{ENV_ACCOUNT_ID} (or {ENV_API_ID}) is not set"))
        })?;
    let account_id: u64 = account_raw.trim().parse().map_err(|_| {
        GridError::Config(format!(
            "{ENV_ACCOUNT_ID} must be an integer account id, got {account_raw:?}"
        ))
    })?;

    warn_on_conflicting_alias(sources, ENV_STARK_PRIVATE_KEY, ENV_L2_KEY);
    // Secrets have no file or default fallback
    let signing_key = sources
        .first_non_empty(&[Env(ENV_STARK_PRIVATE_KEY), Env(ENV_L2_KEY)])
        .map(SigningKey::new)
        .ok_or_else(|| {
            GridError::Config(format!(
                "{ENV_STARK_PRIVATE_KEY} (or {ENV_L2_KEY}) is not set"
            ))
        })?;

    let symbol_param_name = sources
        .first_non_empty(&[
            Env(ENV_SYMBOL_PARAM),
            File("symbol_param"),
            Default("symbol_param"),
        ])
        .unwrap_or_default();

    let symbol = sources
        .first_non_empty(&[
            Env(ENV_CONTRACT_ID),
            Env(ENV_SYMBOL),
            File("symbol"),
            File("contract_id"),
            Default("symbol"),
        ])
        .unwrap_or_default();

    let poll_interval_sec = sources
        .first_non_empty(&[Env(ENV_POLL_INTERVAL_SEC), File("poll_interval_sec")])
        .map(|raw| resolve_poll_interval(&raw))
        .unwrap_or(DEFAULT_POLL_INTERVAL_SEC)
        .clamp(MIN_POLL_INTERVAL_SEC, MAX_POLL_INTERVAL_SEC);

    let auth_url = sources
        .first_non_empty(&[File("auth_url"), Default("auth_url")])
        .unwrap_or_default();

    Ok(ResolvedConfig {
        base_url,
        account_id,
        signing_key,
        symbol,
        symbol_param_name,
        poll_interval_sec,
        auth_url,
    })
}

/// Non-numeric input falls back to the default rather than failing; so do
/// the non-finite values f64 parsing accepts ("inf", "nan")
fn resolve_poll_interval(raw: &str) -> f64 {
    let parsed: f64 = raw.trim().parse().unwrap_or(DEFAULT_POLL_INTERVAL_SEC);
    if parsed.is_finite() {
        parsed
    } else {
        DEFAULT_POLL_INTERVAL_SEC
    }
}

/// Both alias env vars set to different values masks operator
/// misconfiguration; the first-named wins, but make the shadowing visible.
fn warn_on_conflicting_alias(sources: &RawSettingSources, primary: &str, alias: &str) {
    if let (Some(a), Some(b)) = (
        sources.env.get(primary).filter(|v| !v.is_empty()),
        sources.env.get(alias).filter(|v| !v.is_empty()),
    ) {
        if a != b {
            warn!(
                "{primary} and {alias} are both set and differ; using {primary} and ignoring {alias}"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Sources with enough set that resolution succeeds unless a test breaks it
    fn sources(env_pairs: &[(&str, &str)], file_pairs: &[(&str, &str)]) -> RawSettingSources {
        let mut env_pairs = env_pairs.to_vec();
        if !env_pairs.iter().any(|(k, _)| *k == ENV_ACCOUNT_ID || *k == ENV_API_ID) {
            env_pairs.push((ENV_ACCOUNT_ID, "42"));
        }
        if !env_pairs
            .iter()
            .any(|(k, _)| *k == ENV_STARK_PRIVATE_KEY || *k == ENV_L2_KEY)
        {
            env_pairs.push((ENV_STARK_PRIVATE_KEY, "0xdeadbeef"));
        }
        RawSettingSources::new(env(&env_pairs), FileConfig::from_pairs(file_pairs))
    }

    #[test]
    fn base_url_precedence_matrix() {
        // (env present, file present, expected winner)
        let cases = [
            (true, true, "https://env.edgex.internal"),
            (true, false, "https://env.edgex.internal"),
            (false, true, "https://file.edgex.internal"),
            (false, false, DEFAULT_BASE_URL),
        ];
        for (env_set, file_set, expected) in cases {
            let env_pairs: &[(&str, &str)] = if env_set {
                &[(ENV_BASE_URL, "https://env.edgex.internal")]
            } else {
                &[]
            };
            let file_pairs: &[(&str, &str)] = if file_set {
                &[("base_url", "https://file.edgex.internal")]
            } else {
                &[]
            };
            let cfg = resolve_settings(&sources(env_pairs, file_pairs)).unwrap();
            assert_eq!(cfg.base_url, expected, "env={env_set} file={file_set}");
        }
    }

    #[test]
    fn empty_env_value_is_treated_as_absent() {
        let cfg = resolve_settings(&sources(
            &[(ENV_BASE_URL, "")],
            &[("base_url", "https://file.edgex.internal")],
        ))
        .unwrap();
        assert_eq!(cfg.base_url, "https://file.edgex.internal");
    }

    #[test]
    fn account_id_alias_chain() {
        // primary env beats alias env beats file primary beats file alias
        let all = resolve_settings(&sources(
            &[(ENV_ACCOUNT_ID, "1"), (ENV_API_ID, "2")],
            &[("account_id", "3"), ("api_id", "4")],
        ))
        .unwrap();
        assert_eq!(all.account_id, 1);

        let alias_env = resolve_settings(&sources(
            &[(ENV_API_ID, "2")],
            &[("account_id", "3"), ("api_id", "4")],
        ))
        .unwrap();
        assert_eq!(alias_env.account_id, 2);

        // file legs need sources built without the helper's account env var
        let file_primary = resolve_settings(&RawSettingSources::new(
            env(&[(ENV_STARK_PRIVATE_KEY, "0xdeadbeef")]),
            FileConfig::from_pairs(&[("account_id", "3"), ("api_id", "4")]),
        ))
        .unwrap();
        assert_eq!(file_primary.account_id, 3);

        let file_alias = resolve_settings(&RawSettingSources::new(
            env(&[(ENV_STARK_PRIVATE_KEY, "0xdeadbeef")]),
            FileConfig::from_pairs(&[("api_id", "4")]),
        ))
        .unwrap();
        assert_eq!(file_alias.account_id, 4);
    }

    #[test]
    fn missing_account_id_is_fatal() {
        let src = RawSettingSources::new(
            env(&[(ENV_STARK_PRIVATE_KEY, "0xdeadbeef")]),
            FileConfig::default(),
        );
        let err = resolve_settings(&src).unwrap_err();
        assert!(matches!(err, GridError::Config(_)), "got {err:?}");
        assert!(err.to_string().contains(ENV_ACCOUNT_ID));
    }

    #[test]
    fn non_integer_account_id_is_fatal() {
        let err = resolve_settings(&sources(&[(ENV_ACCOUNT_ID, "forty-two")], &[])).unwrap_err();
        assert!(matches!(err, GridError::Config(_)), "got {err:?}");
    }

    #[test]
    fn signing_key_has_no_file_fallback() {
        let src = RawSettingSources::new(
            env(&[(ENV_ACCOUNT_ID, "42")]),
            // a key in the file must never be honored
            FileConfig::from_pairs(&[("signing_key", "0xfromfile")]),
        );
        let err = resolve_settings(&src).unwrap_err();
        assert!(err.to_string().contains(ENV_STARK_PRIVATE_KEY));
    }

    #[test]
    fn signing_key_alias_accepted() {
        let cfg = resolve_settings(&sources(&[(ENV_L2_KEY, "0xalias")], &[])).unwrap();
        assert_eq!(cfg.signing_key.expose(), "0xalias");
    }

    #[test]
    fn symbol_chain_prefers_contract_id_env() {
        let cfg = resolve_settings(&sources(
            &[(ENV_CONTRACT_ID, "10000002"), (ENV_SYMBOL, "ETH-PERP")],
            &[("symbol", "SOL-PERP"), ("contract_id", "10000003")],
        ))
        .unwrap();
        assert_eq!(cfg.symbol, "10000002");

        let file_symbol = resolve_settings(&sources(
            &[],
            &[("symbol", "SOL-PERP"), ("contract_id", "10000003")],
        ))
        .unwrap();
        assert_eq!(file_symbol.symbol, "SOL-PERP");

        let default = resolve_settings(&sources(&[], &[])).unwrap();
        assert_eq!(default.symbol, DEFAULT_SYMBOL);
    }

    #[test]
    fn symbol_param_resolution() {
        let cfg = resolve_settings(&sources(&[(ENV_SYMBOL_PARAM, "instrumentId")], &[])).unwrap();
        assert_eq!(cfg.symbol_param_name, "instrumentId");
        let default = resolve_settings(&sources(&[], &[])).unwrap();
        assert_eq!(default.symbol_param_name, DEFAULT_SYMBOL_PARAM);
    }

    #[test]
    fn poll_interval_floor_and_fallback() {
        for (raw, expected) in [
            ("5.0", 5.0),
            ("1.5", 1.5),
            ("1.0", MIN_POLL_INTERVAL_SEC),
            ("0", MIN_POLL_INTERVAL_SEC),
            ("-3", MIN_POLL_INTERVAL_SEC),
            ("fast", DEFAULT_POLL_INTERVAL_SEC),
            ("inf", DEFAULT_POLL_INTERVAL_SEC),
            ("-inf", DEFAULT_POLL_INTERVAL_SEC),
            ("NaN", DEFAULT_POLL_INTERVAL_SEC),
            ("1e20", MAX_POLL_INTERVAL_SEC),
        ] {
            let cfg =
                resolve_settings(&sources(&[(ENV_POLL_INTERVAL_SEC, raw)], &[])).unwrap();
            assert_eq!(cfg.poll_interval_sec, expected, "raw={raw:?}");
        }
        let unset = resolve_settings(&sources(&[], &[])).unwrap();
        assert_eq!(unset.poll_interval_sec, DEFAULT_POLL_INTERVAL_SEC);
    }

    #[test]
    fn poll_interval_is_always_safe_for_duration() {
        // the engine feeds this straight into Duration::from_secs_f64, which
        // panics on huge or non-finite input
        for raw in ["inf", "-inf", "NaN", "1e20", "1e300", "999999999999999"] {
            let cfg = resolve_settings(&sources(&[(ENV_POLL_INTERVAL_SEC, raw)], &[])).unwrap();
            assert!(cfg.poll_interval_sec.is_finite(), "raw={raw:?}");
            assert!(cfg.poll_interval_sec <= MAX_POLL_INTERVAL_SEC, "raw={raw:?}");
            let _ = std::time::Duration::from_secs_f64(cfg.poll_interval_sec);
        }
    }

    #[test]
    fn poll_interval_from_file() {
        let cfg = resolve_settings(&sources(&[], &[("poll_interval_sec", "4")])).unwrap();
        assert_eq!(cfg.poll_interval_sec, 4.0);
    }

    #[test]
    fn auth_url_file_overrides_default() {
        let cfg = resolve_settings(&sources(
            &[],
            &[("auth_url", "https://auth.internal/check")],
        ))
        .unwrap();
        assert_eq!(cfg.auth_url, "https://auth.internal/check");
        let default = resolve_settings(&sources(&[], &[])).unwrap();
        assert_eq!(default.auth_url, DEFAULT_AUTH_URL);
    }

    #[test]
    fn invalid_base_url_rejected_during_resolution() {
        let err = resolve_settings(&sources(&[(ENV_BASE_URL, "pro.edgex.exchange")], &[]))
            .unwrap_err();
        assert!(matches!(err, GridError::InvalidEndpoint { .. }), "got {err:?}");
    }

    #[test]
    fn signing_key_debug_is_redacted() {
        let cfg = resolve_settings(&sources(&[], &[])).unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("0xdeadbeef"), "secret leaked: {rendered}");
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn file_config_ignores_nested_values() {
        let table: toml::Table = "base_url = \"https://file.edgex.internal\"\n[nested]\nx = 1\n"
            .parse()
            .unwrap();
        let file = FileConfig::from_table(table);
        assert_eq!(file.get("base_url"), Some("https://file.edgex.internal"));
        assert_eq!(file.get("nested"), None);
    }

    #[test]
    fn file_config_missing_file_is_empty() {
        let file = FileConfig::load("/nonexistent/edgex.toml").unwrap();
        assert!(file.get("base_url").is_none());
    }
}
