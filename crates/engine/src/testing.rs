//! In-memory doubles for the engine's three seams.

use api_client::{ApiError, StrategyClient};
use async_trait::async_trait;
use chain::{Address, ChainError, TokenReader, TransactionSender, TxHash, U256};
use core_types::{RiskLevel, Strategy, TokenBalances};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

pub const OWNER: &str = "0x1111111111111111111111111111111111111111";

pub fn strategy(level: u8) -> Strategy {
    Strategy {
        risk_level: RiskLevel(level),
        steps: Vec::new(),
        explanation: format!("risk {level}"),
        total_expected_apy: Decimal::from(level),
        risk_factors: Vec::new(),
    }
}

/// Serves canned balances keyed by token address; missing entries fail.
#[derive(Default)]
pub struct FakeReader {
    pub native: Option<U256>,
    pub tokens: HashMap<Address, U256>,
    pub reads: Mutex<usize>,
    /// Slows the native read down by this much.
    pub delay: Option<Duration>,
}

#[async_trait]
impl TokenReader for FakeReader {
    async fn native_balance(&self, _owner: Address) -> Result<U256, ChainError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        *self.reads.lock().unwrap() += 1;
        self.native
            .ok_or_else(|| ChainError::Rpc("native read failed".to_string()))
    }

    async fn token_balance(&self, token: Address, _owner: Address) -> Result<U256, ChainError> {
        *self.reads.lock().unwrap() += 1;
        self.tokens
            .get(&token)
            .copied()
            .ok_or_else(|| ChainError::Rpc(format!("{token} read failed")))
    }
}

/// Returns a fixed strategy list (or a 500) and records what it was asked.
#[derive(Default)]
pub struct FakeClient {
    pub response: Vec<Strategy>,
    pub fail: bool,
    pub requests: Mutex<Vec<(String, TokenBalances)>>,
}

impl FakeClient {
    pub fn returning(response: Vec<Strategy>) -> Self {
        Self {
            response,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl StrategyClient for FakeClient {
    async fn generate(
        &self,
        address: &str,
        balances: &TokenBalances,
    ) -> Result<Vec<Strategy>, ApiError> {
        self.requests
            .lock()
            .unwrap()
            .push((address.to_string(), balances.clone()));
        if self.fail {
            return Err(ApiError::Status {
                status: 500,
                body: "internal error".to_string(),
            });
        }
        Ok(self.response.clone())
    }
}

/// Accepts every submission and records it in order. With `hang_on_execute`
/// the execution call never completes.
#[derive(Default)]
pub struct FakeSender {
    pub calls: Mutex<Vec<&'static str>>,
    pub hang_on_execute: bool,
}

#[async_trait]
impl TransactionSender for FakeSender {
    async fn approve(
        &self,
        _token: Address,
        _spender: Address,
        _amount: U256,
    ) -> Result<TxHash, ChainError> {
        self.calls.lock().unwrap().push("approve");
        Ok(TxHash::repeat_byte(1))
    }

    async fn execute_strategy(
        &self,
        _contract: Address,
        _amount: U256,
        _risk_level: u8,
    ) -> Result<TxHash, ChainError> {
        self.calls.lock().unwrap().push("execute");
        if self.hang_on_execute {
            std::future::pending::<()>().await;
        }
        Ok(TxHash::repeat_byte(2))
    }
}
