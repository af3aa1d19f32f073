use core_types::RiskLevel;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] configuration::error::ConfigError),

    #[error("Strategy service error: {0}")]
    Api(#[from] api_client::ApiError),

    #[error("Chain error: {0}")]
    Chain(#[from] chain::ChainError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] executor::WorkflowError),

    #[error("Invalid wallet address: '{0}'")]
    InvalidAddress(String),

    #[error("Balances are still loading")]
    BalancesLoading,

    #[error("No funds for allocation: every balance is zero")]
    NoFunds,

    #[error("Could not fetch any balance: {0}")]
    BalancesUnavailable(String),

    #[error("No strategy with risk level {0} in the current set")]
    StrategyNotFound(RiskLevel),

    #[error("Background task failed: {0}")]
    Task(String),
}
