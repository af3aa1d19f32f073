use crate::contracts::{IERC20, IStrategyVault};
use crate::error::ChainError;
use alloy::network::Ethereum;
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{DynProvider, PendingTransactionBuilder};
use async_trait::async_trait;

/// Write access to the chain for the approval/execution workflow.
///
/// Each call returns once the transaction has been accepted by the node (or,
/// with receipt waiting enabled, once it has been mined successfully).
#[async_trait]
pub trait TransactionSender: Send + Sync {
    /// Submits `token.approve(spender, amount)`.
    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxHash, ChainError>;

    /// Submits `executeSimpleStrategy(amount)` on the strategy contract.
    ///
    /// `risk_level` identifies the selected strategy; the simple strategy entry
    /// point does not take it as an argument, so it is only recorded with the
    /// submission.
    async fn execute_strategy(
        &self,
        contract: Address,
        amount: U256,
        risk_level: u8,
    ) -> Result<TxHash, ChainError>;
}

/// A `TransactionSender` that signs with a local key through a wallet-enabled provider.
#[derive(Clone)]
pub struct AlloyTransactionSender {
    provider: DynProvider,
    await_receipts: bool,
}

impl AlloyTransactionSender {
    pub fn new(provider: DynProvider, await_receipts: bool) -> Self {
        Self {
            provider,
            await_receipts,
        }
    }

    async fn settle(&self, pending: PendingTransactionBuilder<Ethereum>) -> Result<TxHash, ChainError> {
        let tx_hash = *pending.tx_hash();
        if !self.await_receipts {
            return Ok(tx_hash);
        }

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| ChainError::Rpc(format!("Receipt for {} failed: {}", tx_hash, e)))?;
        if !receipt.status() {
            return Err(ChainError::Reverted(tx_hash.to_string()));
        }
        Ok(tx_hash)
    }
}

#[async_trait]
impl TransactionSender for AlloyTransactionSender {
    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxHash, ChainError> {
        let contract = IERC20::new(token, self.provider.clone());
        let pending = contract
            .approve(spender, amount)
            .send()
            .await
            .map_err(|e| ChainError::Submission(e.to_string()))?;
        tracing::info!(%token, %spender, %amount, tx = %pending.tx_hash(), "Approval submitted");
        self.settle(pending).await
    }

    async fn execute_strategy(
        &self,
        contract: Address,
        amount: U256,
        risk_level: u8,
    ) -> Result<TxHash, ChainError> {
        let vault = IStrategyVault::new(contract, self.provider.clone());
        let pending = vault
            .executeSimpleStrategy(amount)
            .send()
            .await
            .map_err(|e| ChainError::Submission(e.to_string()))?;
        tracing::info!(%contract, %amount, risk_level, tx = %pending.tx_hash(), "Strategy execution submitted");
        self.settle(pending).await
    }
}
