use crate::balances::parse_amount;
use crate::enums::StrategyAction;
use crate::error::CoreError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The spend token used when a request does not name one.
pub const DEFAULT_SPEND_TOKEN: &str = "USDC";

/// The risk tier of a strategy. Within one generated set it is also the
/// strategy's identity, so selection is always done by risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskLevel(pub u8);

impl RiskLevel {
    /// The display name of the tier, for the tiers the service produces.
    pub fn title(&self) -> Option<&'static str> {
        match self.0 {
            1 => Some("Anchor"),
            3 => Some("Zenith"),
            5 => Some("Wildcard"),
            _ => None,
        }
    }

    pub fn description(&self) -> Option<&'static str> {
        match self.0 {
            1 => Some("Steady growth over time"),
            3 => Some("Balanced performance"),
            5 => Some("For risk-takers & degens"),
            _ => None,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One action within a strategy, e.g. "supply 500 USDC to Aave".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyStep {
    pub protocol: String,
    pub action: StrategyAction,
    pub token: String,
    pub amount: Decimal,
    /// Expected annualized yield of this step, in percent.
    pub expected_apy: Decimal,
}

/// A ranked bundle of supply/borrow actions as returned by the strategy service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub risk_level: RiskLevel,
    pub steps: Vec<StrategyStep>,
    pub explanation: String,
    pub total_expected_apy: Decimal,
    #[serde(default)]
    pub risk_factors: Vec<String>,
}

impl Strategy {
    /// The aggregate APY rendered with one decimal place, e.g. `"7.3%"`.
    pub fn apy_label(&self) -> String {
        let rounded = self
            .total_expected_apy
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
        format!("{:.1}%", rounded)
    }
}

/// A user's commitment to run one strategy with a given spend amount.
///
/// Consumed by a single approval/execution attempt and discarded once the
/// attempt reaches a terminal state.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionRequest {
    pub attempt_id: Uuid,
    pub strategy: Strategy,
    /// The spend amount as entered, in whole token units (e.g. "1000.5").
    pub amount: String,
    pub address: String,
    /// Symbol of the token being approved and spent.
    pub token: String,
}

impl ExecutionRequest {
    pub fn new(strategy: Strategy, amount: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            attempt_id: Uuid::new_v4(),
            strategy,
            amount: amount.into(),
            address: address.into(),
            token: DEFAULT_SPEND_TOKEN.to_string(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Parses the spend amount, rejecting anything that is not a positive number.
    pub fn parsed_amount(&self) -> Result<Decimal, CoreError> {
        let amount = parse_amount(&self.amount)
            .ok_or_else(|| CoreError::InvalidInput("amount".to_string(), self.amount.clone()))?;
        if amount <= Decimal::ZERO {
            return Err(CoreError::NonPositiveAmount(self.amount.clone()));
        }
        Ok(amount)
    }

    /// Runs every input check that must pass before any transaction is issued.
    pub fn validate(&self) -> Result<Decimal, CoreError> {
        if self.address.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "address".to_string(),
                "address must not be empty".to_string(),
            ));
        }
        self.parsed_amount()
    }
}
