use alloy_primitives::{Address, address};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// Decimals assumed for a token with no registry entry when formatting balances.
pub const DEFAULT_BALANCE_DECIMALS: u8 = 18;
/// Decimals assumed for an unregistered spend token (USDC-style).
pub const DEFAULT_SPEND_DECIMALS: u8 = 6;
/// Native-asset decimals on every supported chain.
pub const NATIVE_DECIMALS: u8 = 18;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub tokens: TokenRegistry,
}

/// Connection details for the blockchain node.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint used for balance reads and transaction submission.
    pub rpc_url: String,
    /// The chain the dashboard targets by default (Scroll mainnet).
    pub chain_id: u64,
    /// Symbol under which the native balance is reported.
    pub native_symbol: String,
}

/// Settings for the remote strategy-generation service.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub strategy_endpoint: String,
    /// Upper bound on a single generation request, in seconds.
    pub request_timeout_secs: u64,
}

/// Settings for the approval/execution workflow.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// The strategy contract. It is both the approval spender and the execution target.
    pub strategy_contract: Address,
    /// How long a single approval or execution step may stay in flight.
    pub step_timeout_secs: u64,
    /// Wait for each transaction to be mined and check its status before advancing.
    /// Execution is gas-estimated against chain state, so it needs the
    /// approval mined first; turn this off only against an instant-mining node.
    pub await_receipts: bool,
    pub default_spend_token: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// A bare level ("debug") or a full filter directive string.
    pub level: String,
    pub format: LogFormat,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
}

/// The chain-scoped token registry.
///
/// `chains` maps a chain id (as a string key, the way TOML tables are keyed) to
/// the token contracts deployed there; `decimals` is chain independent.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TokenRegistry {
    pub decimals: BTreeMap<String, u8>,
    pub chains: HashMap<String, BTreeMap<String, Address>>,
}

impl TokenRegistry {
    /// All tokens registered on a chain, in symbol order. Unknown chains have none.
    pub fn tokens_for_chain(&self, chain_id: u64) -> Vec<(String, Address)> {
        self.chains
            .get(&chain_id.to_string())
            .map(|tokens| tokens.iter().map(|(s, a)| (s.clone(), *a)).collect())
            .unwrap_or_default()
    }

    pub fn token_address(&self, chain_id: u64, symbol: &str) -> Option<Address> {
        self.chains
            .get(&chain_id.to_string())?
            .iter()
            .find(|(s, _)| s.eq_ignore_ascii_case(symbol))
            .map(|(_, a)| *a)
    }

    pub fn decimals(&self, symbol: &str) -> Option<u8> {
        self.decimals
            .iter()
            .find(|(s, _)| s.eq_ignore_ascii_case(symbol))
            .map(|(_, d)| *d)
    }

    /// Upper-cases every symbol so lookups and reported balances agree on spelling.
    pub(crate) fn normalize(&mut self) {
        self.decimals = std::mem::take(&mut self.decimals)
            .into_iter()
            .map(|(s, d)| (s.to_ascii_uppercase(), d))
            .collect();
        for tokens in self.chains.values_mut() {
            *tokens = std::mem::take(tokens)
                .into_iter()
                .map(|(s, a)| (s.to_ascii_uppercase(), a))
                .collect();
        }
    }
}

// --- Default Implementations ---
// These mirror the deployed Scroll setup so that a `config.toml` only needs to
// list what it changes.

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://rpc.scroll.io".to_string(),
            chain_id: 534352,
            native_symbol: "ETH".to_string(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            strategy_endpoint: "https://bulwark-scroll.onrender.com/api/generate-strategies"
                .to_string(),
            request_timeout_secs: 60,
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            strategy_contract: address!("0xbCfac93bbC5F93c37f3743792A372e9fe3979Ea6"),
            step_timeout_secs: 120,
            await_receipts: true,
            default_spend_token: "USDC".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            directory: None,
        }
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        let decimals = BTreeMap::from([
            ("USDC".to_string(), 6),
            ("ETH".to_string(), 18),
            ("SRC".to_string(), 18),
        ]);

        let scroll = BTreeMap::from([
            (
                "USDC".to_string(),
                address!("0x06eFdBFf2a14a7c8E15944D1F4A48F9F95F663A4"),
            ),
            (
                "SRC".to_string(),
                address!("0xd29687c813D741E2F938F4aC377128810E217b1b"),
            ),
        ]);
        let gnosis = BTreeMap::from([
            (
                "USDC".to_string(),
                address!("0x2a22f9c3b484c3629090FeED35F17Ff8F88f76F0"),
            ),
            (
                "SRC".to_string(),
                address!("0xcB444e90D8198415266c6a2724b7900fb12FC56E"),
            ),
        ]);

        Self {
            decimals,
            chains: HashMap::from([
                ("534352".to_string(), scroll),
                ("100".to_string(), gnosis),
            ]),
        }
    }
}
