use core_types::{Strategy, TokenBalances};
use serde::{Deserialize, Serialize};

/// The JSON body of `POST /api/generate-strategies`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateStrategiesRequest<'a> {
    pub address: &'a str,
    pub balances: &'a TokenBalances,
}

/// The body of a successful generation response.
///
/// The service documents a bare list, but its API layer can also wrap the list
/// together with wallet and market data; both shapes are accepted.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum GenerateStrategiesResponse {
    List(Vec<Strategy>),
    Envelope { strategies: Vec<Strategy> },
}

impl GenerateStrategiesResponse {
    pub fn into_strategies(self) -> Vec<Strategy> {
        match self {
            GenerateStrategiesResponse::List(strategies) => strategies,
            GenerateStrategiesResponse::Envelope { strategies } => strategies,
        }
    }
}
