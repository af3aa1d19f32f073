use core_types::TokenBalances;
use std::sync::Arc;
use tokio::sync::RwLock;

/// An immutable view of the balance store at one point in time.
#[derive(Debug, Clone, Default)]
pub struct BalanceSnapshot {
    pub balances: Arc<TokenBalances>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// The session's cache of the latest balance mapping, loading flag, and error.
///
/// Cloning yields another handle to the same store. Only the balance source
/// writes to it; everything else reads snapshots.
#[derive(Debug, Clone, Default)]
pub struct BalanceStore {
    inner: Arc<RwLock<BalanceSnapshot>>,
}

impl BalanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> BalanceSnapshot {
        self.inner.read().await.clone()
    }

    pub async fn balances(&self) -> Arc<TokenBalances> {
        Arc::clone(&self.inner.read().await.balances)
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.read().await.is_loading
    }

    pub async fn error(&self) -> Option<String> {
        self.inner.read().await.error.clone()
    }

    /// Replaces the whole mapping; entries are never merged with the previous one.
    pub async fn set_balances(&self, balances: TokenBalances) {
        self.inner.write().await.balances = Arc::new(balances);
    }

    pub async fn set_loading(&self, is_loading: bool) {
        self.inner.write().await.is_loading = is_loading;
    }

    pub async fn set_error(&self, error: Option<String>) {
        self.inner.write().await.error = error;
    }

    /// Resets to the disconnected state: no balances, not loading, no error.
    pub async fn clear(&self) {
        *self.inner.write().await = BalanceSnapshot::default();
    }
}
