use crate::error::EngineError;
use api_client::StrategyClient;
use core_types::{Strategy, TokenBalances};
use std::sync::Arc;
use store::StrategyStore;

/// Calls the generation service and, on success, replaces the strategy store.
#[derive(Clone)]
pub struct StrategyGenerator {
    client: Arc<dyn StrategyClient>,
    store: StrategyStore,
}

impl StrategyGenerator {
    pub fn new(client: Arc<dyn StrategyClient>, store: StrategyStore) -> Self {
        Self { client, store }
    }

    /// One request, no retry. A failure leaves the previous set in place.
    pub async fn generate(
        &self,
        address: &str,
        balances: &TokenBalances,
    ) -> Result<Arc<Vec<Strategy>>, EngineError> {
        let strategies = self.client.generate(address, balances).await?;
        tracing::info!(
            address,
            count = strategies.len(),
            levels = ?strategies.iter().map(|s| s.risk_level.0).collect::<Vec<_>>(),
            "Strategies generated"
        );
        self.store.set_strategies(strategies).await;
        Ok(self.store.strategies().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeClient, strategy};

    #[tokio::test]
    async fn failure_keeps_previous_set() {
        let store = StrategyStore::new();
        store.set_strategies(vec![strategy(1)]).await;
        let client = Arc::new(FakeClient {
            fail: true,
            ..Default::default()
        });
        let generator = StrategyGenerator::new(client, store.clone());

        let balances: TokenBalances = [("USDC", "10")].into_iter().collect();
        let err = generator.generate("0xABC", &balances).await.unwrap_err();

        assert!(matches!(
            err,
            EngineError::Api(api_client::ApiError::Status { status: 500, .. })
        ));
        assert_eq!(store.strategies().await.len(), 1);
    }
}
