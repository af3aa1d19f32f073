use crate::error::EngineError;
use chain::{ChainError, TokenReader, U256, format_base_units, parse_address};
use configuration::{Config, DEFAULT_BALANCE_DECIMALS, NATIVE_DECIMALS, TokenRegistry};
use core_types::TokenBalances;
use futures::future::join_all;
use std::sync::Arc;
use store::BalanceStore;

/// Reads native and token balances for an account and writes them to a `BalanceStore`.
#[derive(Clone)]
pub struct BalanceSource {
    reader: Arc<dyn TokenReader>,
    tokens: TokenRegistry,
    native_symbol: String,
    store: BalanceStore,
}

impl BalanceSource {
    pub fn new(
        reader: Arc<dyn TokenReader>,
        tokens: TokenRegistry,
        native_symbol: impl Into<String>,
        store: BalanceStore,
    ) -> Self {
        Self {
            reader,
            tokens,
            native_symbol: native_symbol.into(),
            store,
        }
    }

    pub fn from_config(reader: Arc<dyn TokenReader>, config: &Config, store: BalanceStore) -> Self {
        Self::new(
            reader,
            config.tokens.clone(),
            config.network.native_symbol.clone(),
            store,
        )
    }

    /// Fetches every balance for `address` on `chain_id` and replaces the store's mapping.
    ///
    /// The loading flag is raised for the duration of the call. A single failed
    /// read degrades that token to `"0"`; only an unusable address or every
    /// read failing is reported as an error, which is also recorded in the store.
    ///
    /// The reads run on their own task, so dropping the returned future (a
    /// caller's timeout, say) still lets the fetch finish and lower the flag.
    pub async fn fetch(&self, address: &str, chain_id: u64) -> Result<TokenBalances, EngineError> {
        let source = self.clone();
        let address = address.to_string();
        tokio::spawn(async move { source.fetch_and_store(&address, chain_id).await })
            .await
            .map_err(|e| EngineError::Task(e.to_string()))?
    }

    async fn fetch_and_store(&self, address: &str, chain_id: u64) -> Result<TokenBalances, EngineError> {
        self.store.set_loading(true).await;
        let result = self.read_all(address, chain_id).await;

        match &result {
            Ok(balances) => {
                self.store.set_balances(balances.clone()).await;
                self.store.set_error(None).await;
                tracing::info!(address, chain_id, tokens = balances.len(), "Balances refreshed");
            }
            Err(e) => {
                self.store.set_error(Some(e.to_string())).await;
                tracing::warn!(address, chain_id, error = %e, "Balance fetch failed");
            }
        }

        self.store.set_loading(false).await;
        result
    }

    async fn read_all(&self, address: &str, chain_id: u64) -> Result<TokenBalances, EngineError> {
        let owner =
            parse_address(address).map_err(|_| EngineError::InvalidAddress(address.to_string()))?;

        let tokens = self.tokens.tokens_for_chain(chain_id);
        if tokens.is_empty() {
            tracing::debug!(chain_id, "No registered tokens; reading native balance only");
        }

        let native = self.reader.native_balance(owner);
        let erc20 = join_all(
            tokens
                .iter()
                .map(|(_, token)| self.reader.token_balance(*token, owner)),
        );
        let (native, erc20) = futures::join!(native, erc20);

        let mut balances = TokenBalances::new();
        let mut failures = 0usize;
        let mut last_error: Option<ChainError> = None;

        let mut record = |symbol: &str, decimals: u8, read: Result<U256, ChainError>| {
            let formatted = match read {
                Ok(raw) => format_base_units(raw, decimals),
                Err(e) => {
                    tracing::warn!(symbol, error = %e, "Balance read failed; reporting 0");
                    failures += 1;
                    last_error = Some(e);
                    "0".to_string()
                }
            };
            balances.insert(symbol, formatted);
        };

        record(&self.native_symbol, NATIVE_DECIMALS, native);
        for ((symbol, _), read) in tokens.iter().zip(erc20) {
            let decimals = self.tokens.decimals(symbol).unwrap_or(DEFAULT_BALANCE_DECIMALS);
            record(symbol, decimals, read);
        }

        let attempted = tokens.len() + 1;
        if failures == attempted {
            let reason = last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no balances read".to_string());
            return Err(EngineError::BalancesUnavailable(reason));
        }
        Ok(balances)
    }

    pub fn store(&self) -> &BalanceStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeReader, OWNER};
    use std::collections::HashMap;
    use std::time::Duration;

    fn registry() -> TokenRegistry {
        Config::default().tokens
    }

    fn source(reader: FakeReader) -> (BalanceSource, BalanceStore) {
        let store = BalanceStore::new();
        let source = BalanceSource::new(Arc::new(reader), registry(), "ETH", store.clone());
        (source, store)
    }

    #[tokio::test]
    async fn formats_each_balance_with_its_decimals() {
        let usdc = registry().token_address(534352, "USDC").unwrap();
        let src = registry().token_address(534352, "SRC").unwrap();
        let reader = FakeReader {
            native: Some(U256::from(1_500_000_000_000_000_000u128)),
            tokens: HashMap::from([(usdc, U256::from(1_000_300_000u64)), (src, U256::ZERO)]),
            ..Default::default()
        };
        let (source, store) = source(reader);

        let balances = source.fetch(OWNER, 534352).await.unwrap();

        assert_eq!(balances.get("ETH"), Some("1.5"));
        assert_eq!(balances.get("USDC"), Some("1000.3"));
        assert_eq!(balances.get("SRC"), Some("0"));
        assert_eq!(*store.balances().await, balances);
        assert!(!store.is_loading().await);
        assert!(store.error().await.is_none());
    }

    #[tokio::test]
    async fn one_failed_read_degrades_to_zero() {
        let usdc = registry().token_address(534352, "USDC").unwrap();
        let reader = FakeReader {
            native: Some(U256::ZERO),
            tokens: HashMap::from([(usdc, U256::from(5_000_000u64))]),
            ..Default::default()
        };
        let (source, store) = source(reader);

        let balances = source.fetch(OWNER, 534352).await.unwrap();

        assert_eq!(balances.get("USDC"), Some("5"));
        assert_eq!(balances.get("SRC"), Some("0"));
        assert!(store.error().await.is_none());
    }

    #[tokio::test]
    async fn every_read_failing_is_a_store_error() {
        let (source, store) = source(FakeReader::default());
        store.set_balances([("USDC", "7")].into_iter().collect()).await;

        let err = source.fetch(OWNER, 534352).await.unwrap_err();

        assert!(matches!(err, EngineError::BalancesUnavailable(_)));
        assert!(store.error().await.is_some());
        assert!(!store.is_loading().await);
        assert_eq!(store.balances().await.get("USDC"), Some("7"));
    }

    #[tokio::test]
    async fn bad_address_is_rejected_before_any_read() {
        let reader = Arc::new(FakeReader {
            native: Some(U256::ZERO),
            ..Default::default()
        });
        let store = BalanceStore::new();
        let source = BalanceSource::new(reader.clone(), registry(), "ETH", store.clone());

        for address in ["", "0xABC"] {
            let err = source.fetch(address, 534352).await.unwrap_err();
            assert!(matches!(err, EngineError::InvalidAddress(_)));
        }
        assert_eq!(*reader.reads.lock().unwrap(), 0);
        assert!(store.error().await.is_some());
    }

    #[tokio::test]
    async fn abandoned_fetch_still_clears_the_loading_flag() {
        let reader = FakeReader {
            native: Some(U256::from(1_000_000_000_000_000_000u128)),
            delay: Some(Duration::from_millis(100)),
            ..Default::default()
        };
        let (source, store) = source(reader);

        let abandoned = tokio::time::timeout(Duration::from_millis(20), source.fetch(OWNER, 1)).await;
        assert!(abandoned.is_err());
        assert!(store.is_loading().await);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!store.is_loading().await);
        assert_eq!(store.balances().await.get("ETH"), Some("1"));
    }

    #[tokio::test]
    async fn unknown_chain_reads_native_only() {
        let reader = FakeReader {
            native: Some(U256::from(2_000_000_000_000_000_000u128)),
            ..Default::default()
        };
        let (source, _) = source(reader);

        let balances = source.fetch(OWNER, 1).await.unwrap();

        assert_eq!(balances.len(), 1);
        assert_eq!(balances.get("ETH"), Some("2"));
    }
}
