use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_logging;
pub use settings::{
    ApiConfig, Config, DEFAULT_BALANCE_DECIMALS, DEFAULT_SPEND_DECIMALS, LogFormat, LoggingConfig,
    NATIVE_DECIMALS, NetworkConfig, TokenRegistry, WorkflowConfig,
};

/// Upper bound on token decimals we are willing to scale amounts by.
const MAX_TOKEN_DECIMALS: u8 = 36;

/// Loads the application configuration from `config.toml` in the working directory.
///
/// The file is optional: every section has defaults matching the Scroll deployment.
/// Environment variables prefixed with `BULWARK__` override file values, using `__`
/// as the nesting separator (e.g. `BULWARK__NETWORK__RPC_URL`).
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from("config.toml", false)
}

/// Loads configuration from an explicit file path.
pub fn load_config_from(path: impl AsRef<Path>, required: bool) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path.as_ref()).required(required))
        .add_source(
            config::Environment::with_prefix("BULWARK")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    let mut config = builder.try_deserialize::<Config>()?;
    config.tokens.normalize();
    validate(&config)?;

    Ok(config)
}

/// Rejects settings that would only fail later, deep inside a request.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.network.rpc_url.trim().is_empty() {
        return Err(ConfigError::invalid("network.rpc_url", "must not be empty"));
    }
    if config.api.strategy_endpoint.trim().is_empty() {
        return Err(ConfigError::invalid("api.strategy_endpoint", "must not be empty"));
    }
    if config.workflow.step_timeout_secs == 0 {
        return Err(ConfigError::invalid(
            "workflow.step_timeout_secs",
            "must be greater than 0",
        ));
    }
    if config.workflow.default_spend_token.trim().is_empty() {
        return Err(ConfigError::invalid(
            "workflow.default_spend_token",
            "must not be empty",
        ));
    }
    if let Some((symbol, decimals)) = config
        .tokens
        .decimals
        .iter()
        .find(|(_, d)| **d > MAX_TOKEN_DECIMALS)
    {
        return Err(ConfigError::invalid(
            format!("tokens.decimals.{symbol}"),
            format!("{decimals} exceeds the maximum of {MAX_TOKEN_DECIMALS}"),
        ));
    }
    Ok(())
}
