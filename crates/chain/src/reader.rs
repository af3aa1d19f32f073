use crate::contracts::IERC20;
use crate::error::ChainError;
use alloy::primitives::{Address, U256};
use alloy::providers::{DynProvider, Provider};
use async_trait::async_trait;

/// Read access to on-chain balances.
#[async_trait]
pub trait TokenReader: Send + Sync {
    /// The native-asset balance of `owner`, in wei.
    async fn native_balance(&self, owner: Address) -> Result<U256, ChainError>;

    /// The ERC-20 balance of `owner` at `token`, in the token's base units.
    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, ChainError>;
}

/// A `TokenReader` backed by a JSON-RPC node.
#[derive(Clone)]
pub struct AlloyTokenReader {
    provider: DynProvider,
}

impl AlloyTokenReader {
    pub fn new(provider: DynProvider) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl TokenReader for AlloyTokenReader {
    async fn native_balance(&self, owner: Address) -> Result<U256, ChainError> {
        self.provider
            .get_balance(owner)
            .await
            .map_err(|e| ChainError::Rpc(format!("Native balance failed: {}", e)))
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, ChainError> {
        let contract = IERC20::new(token, self.provider.clone());
        contract
            .balanceOf(owner)
            .call()
            .await
            .map_err(|e| ChainError::Rpc(format!("Token balance for {} failed: {}", token, e)))
    }
}
