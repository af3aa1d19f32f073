pub mod balances;
pub mod enums;
pub mod error;
pub mod format;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use balances::{TokenBalances, ZERO_BALANCE_THRESHOLD};
pub use enums::StrategyAction;
pub use error::CoreError;
pub use format::{format_action, formatted_amount};
pub use structs::{ExecutionRequest, RiskLevel, Strategy, StrategyStep};
