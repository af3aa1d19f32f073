use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("Invalid address '{0}'")]
    InvalidAddress(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Signer error: {0}")]
    Signer(String),

    #[error("RPC call failed: {0}")]
    Rpc(String),

    #[error("Transaction submission failed: {0}")]
    Submission(String),

    #[error("Transaction {0} reverted")]
    Reverted(String),

    #[error("Amount conversion failed: {0}")]
    Units(String),
}
