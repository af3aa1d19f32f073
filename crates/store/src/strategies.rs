use core_types::{RiskLevel, Strategy};
use std::sync::Arc;
use tokio::sync::RwLock;

/// The session's cache of the most recently generated strategy set.
#[derive(Debug, Clone, Default)]
pub struct StrategyStore {
    inner: Arc<RwLock<Arc<Vec<Strategy>>>>,
}

impl StrategyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current list, in the order the service returned it.
    pub async fn strategies(&self) -> Arc<Vec<Strategy>> {
        Arc::clone(&*self.inner.read().await)
    }

    pub async fn set_strategies(&self, strategies: Vec<Strategy>) {
        *self.inner.write().await = Arc::new(strategies);
    }

    /// Looks up a strategy by its risk level, the selection key.
    pub async fn find(&self, risk_level: RiskLevel) -> Option<Strategy> {
        self.inner
            .read()
            .await
            .iter()
            .find(|s| s.risk_level == risk_level)
            .cloned()
    }

    pub async fn clear(&self) {
        *self.inner.write().await = Arc::new(Vec::new());
    }
}
