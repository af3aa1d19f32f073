use crate::responses::{GenerateStrategiesRequest, GenerateStrategiesResponse};
use async_trait::async_trait;
use configuration::ApiConfig;
use core_types::{RiskLevel, Strategy, TokenBalances};
use std::collections::HashSet;
use std::time::Duration;

pub mod error;
pub mod responses;

pub use error::ApiError;

/// The abstract interface to the remote strategy-generation service.
/// The session uses this trait, so the HTTP implementation can be swapped
/// for an in-memory one in tests.
#[async_trait]
pub trait StrategyClient: Send + Sync {
    /// Asks the service for a ranked set of strategies for the given holdings.
    ///
    /// Exactly one request is made per call; failures are never retried here.
    async fn generate(
        &self,
        address: &str,
        balances: &TokenBalances,
    ) -> Result<Vec<Strategy>, ApiError>;
}

/// A concrete implementation of the `StrategyClient` over HTTPS.
#[derive(Clone)]
pub struct HttpStrategyClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpStrategyClient {
    pub fn new(api_config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(api_config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: api_config.strategy_endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl StrategyClient for HttpStrategyClient {
    async fn generate(
        &self,
        address: &str,
        balances: &TokenBalances,
    ) -> Result<Vec<Strategy>, ApiError> {
        if address.trim().is_empty() {
            return Err(ApiError::InvalidRequest(
                "address must not be empty".to_string(),
            ));
        }

        let body = GenerateStrategiesRequest { address, balances };
        tracing::info!(%address, tokens = balances.len(), "Requesting strategies");

        let response = self.client.post(&self.endpoint).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Strategy service returned an error");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        tracing::debug!(body = %text, "Strategy service response");
        parse_strategies(&text)
    }
}

/// Parses a success body and checks that every risk level appears only once,
/// since selection is keyed on it.
pub fn parse_strategies(text: &str) -> Result<Vec<Strategy>, ApiError> {
    let strategies = serde_json::from_str::<GenerateStrategiesResponse>(text)
        .map_err(|e| ApiError::Deserialization(e.to_string()))?
        .into_strategies();

    let mut seen: HashSet<RiskLevel> = HashSet::with_capacity(strategies.len());
    for strategy in &strategies {
        if !seen.insert(strategy.risk_level) {
            return Err(ApiError::InvalidData(format!(
                "duplicate risk level {} in generated strategies",
                strategy.risk_level
            )));
        }
    }

    Ok(strategies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    fn strategy_json(risk_level: u8) -> String {
        format!(
            r#"{{"risk_level": {risk_level}, "steps": [{{"protocol": "Aave", "action": "supply", "token": "USDC", "amount": 1000.3, "expected_apy": 3.5}}], "explanation": "tier {risk_level}", "total_expected_apy": 3.5, "risk_factors": []}}"#
        )
    }

    /// Serves exactly one HTTP response and hands back the raw request body.
    async fn serve_once(status_line: &'static str, body: String) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            let request_body = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break String::new();
                }
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if buf.len() >= header_end + 4 + content_length {
                        break String::from_utf8_lossy(&buf[header_end + 4..header_end + 4 + content_length])
                            .to_string();
                    }
                }
            };

            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            let _ = tx.send(request_body);
        });

        (format!("http://{addr}/api/generate-strategies"), rx)
    }

    fn client_for(endpoint: String) -> HttpStrategyClient {
        HttpStrategyClient::new(&ApiConfig {
            strategy_endpoint: endpoint,
            request_timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn posts_address_and_balances_and_keeps_order() {
        let body = format!("[{},{},{}]", strategy_json(1), strategy_json(3), strategy_json(5));
        let (endpoint, request_rx) = serve_once("HTTP/1.1 200 OK", body).await;
        let client = client_for(endpoint);

        let balances: TokenBalances = [("USDC", "1000.30")].into_iter().collect();
        let strategies = client.generate("0xABC", &balances).await.unwrap();

        let levels: Vec<u8> = strategies.iter().map(|s| s.risk_level.0).collect();
        assert_eq!(levels, vec![1, 3, 5]);

        let sent: serde_json::Value = serde_json::from_str(&request_rx.await.unwrap()).unwrap();
        assert_eq!(sent["address"], "0xABC");
        assert_eq!(sent["balances"]["USDC"], "1000.30");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error_with_the_code() {
        let (endpoint, _rx) =
            serve_once("HTTP/1.1 500 Internal Server Error", r#"{"detail":"boom"}"#.to_string()).await;
        let client = client_for(endpoint);

        let balances: TokenBalances = [("USDC", "5")].into_iter().collect();
        let err = client.generate("0xABC", &balances).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn empty_address_is_rejected_without_a_request() {
        let client = client_for("http://127.0.0.1:9/unused".to_string());
        let err = client.generate("", &TokenBalances::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }

    #[test]
    fn envelope_form_is_accepted() {
        let body = format!(
            r#"{{"strategies": [{}], "wallet": {{}}, "market_data": {{}}}}"#,
            strategy_json(1)
        );
        let strategies = parse_strategies(&body).unwrap();
        assert_eq!(strategies.len(), 1);
    }

    #[test]
    fn duplicate_risk_levels_are_invalid() {
        let body = format!("[{},{}]", strategy_json(3), strategy_json(3));
        assert!(matches!(parse_strategies(&body), Err(ApiError::InvalidData(_))));
    }

    #[test]
    fn malformed_body_is_a_deserialization_error() {
        assert!(matches!(
            parse_strategies("not json"),
            Err(ApiError::Deserialization(_))
        ));
    }

    #[test]
    fn error_type_is_reachable_from_the_crate_root() {
        let err: crate::ApiError = ApiError::Status {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert_eq!(err.status(), Some(502));
        assert!(crate::error::ApiError::InvalidData(String::new()).status().is_none());
    }
}
