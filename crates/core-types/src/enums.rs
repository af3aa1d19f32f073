use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of action a single strategy step performs on a lending protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyAction {
    Supply,
    Borrow,
}

impl fmt::Display for StrategyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyAction::Supply => write!(f, "supply"),
            StrategyAction::Borrow => write!(f, "borrow"),
        }
    }
}
