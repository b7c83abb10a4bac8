//! Configuration management: `Config.toml` plus `XGREET_*` environment
//! overrides, deserialized with per-field defaults so a minimal file (RPC
//! urls + contract address) is enough to run.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ChainSettings {
    pub rpc_url: String,
    /// WebSocket endpoint for log subscriptions; derived from `rpc_url`
    /// (http -> ws) when absent.
    #[serde(default)]
    pub ws_url: Option<String>,
    pub domain_id: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GreeterSettings {
    /// Destination-chain Greeter contract.
    pub address: String,
    #[serde(default = "default_blocks_lookback")]
    pub blocks_lookback: u64,
    #[serde(default = "default_max_blocks_per_call")]
    pub max_blocks_per_call: u64,
    #[serde(default = "default_max_retained_greetings")]
    pub max_retained_greetings: usize,
}

fn default_blocks_lookback() -> u64 {
    100_000
}
fn default_max_blocks_per_call() -> u64 {
    3_000
}
fn default_max_retained_greetings() -> usize {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct QuoteSettings {
    pub api_base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    1_000
}

#[derive(Debug, Deserialize, Clone)]
pub struct BalanceApiSettings {
    #[serde(default = "default_balance_api_base_url")]
    pub base_url: String,
    pub api_key: String,
    #[serde(default = "default_balance_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,
}

fn default_balance_api_base_url() -> String {
    "https://api.covalenthq.com/".to_string()
}
fn default_balance_cache_ttl_seconds() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub origin: ChainSettings,
    pub destination: ChainSettings,
    pub greeter: GreeterSettings,
    pub quote: QuoteSettings,
    #[serde(default)]
    pub balances: Option<BalanceApiSettings>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_file("Config.toml")
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path))
            // XGREET_QUOTE__API_KEY=... overrides quote.api_key
            .add_source(Environment::with_prefix("XGREET").separator("__"))
            .build()?;
        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
[origin]
rpc_url = "https://arb-mainnet-public.unifra.io"
domain_id = "1634886255"

[destination]
rpc_url = "https://polygon.llamarpc.com"
domain_id = "1886350457"

[greeter]
address = "0xb5Ed372Bb3413D5A3d384F73e44EB85618f41455"

[quote]
api_base_url = "https://quotes.example.com/"
"#;

    #[test]
    fn test_minimal_file_uses_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let settings = Settings::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(settings.greeter.blocks_lookback, 100_000);
        assert_eq!(settings.greeter.max_blocks_per_call, 3_000);
        assert_eq!(settings.greeter.max_retained_greetings, 10);
        assert_eq!(settings.quote.debounce_ms, 1_000);
        assert!(settings.quote.api_key.is_none());
        assert!(settings.balances.is_none());
        assert!(settings.destination.ws_url.is_none());
    }

    const EXPLICIT: &str = r#"
[origin]
rpc_url = "https://arb-mainnet-public.unifra.io"
domain_id = "1634886255"

[destination]
rpc_url = "https://polygon.llamarpc.com"
ws_url = "wss://polygon.llamarpc.com"
domain_id = "1886350457"

[greeter]
address = "0xb5Ed372Bb3413D5A3d384F73e44EB85618f41455"
max_blocks_per_call = 500

[quote]
api_base_url = "https://quotes.example.com/"
debounce_ms = 250

[balances]
api_key = "cqt_test"
"#;

    #[test]
    fn test_explicit_values_override_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(EXPLICIT.as_bytes()).unwrap();

        let settings = Settings::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(settings.quote.debounce_ms, 250);
        assert_eq!(
            settings.destination.ws_url.as_deref(),
            Some("wss://polygon.llamarpc.com")
        );
        assert_eq!(settings.greeter.max_blocks_per_call, 500);
        let balances = settings.balances.unwrap();
        assert_eq!(balances.api_key, "cqt_test");
        assert_eq!(balances.base_url, "https://api.covalenthq.com/");
    }
}
