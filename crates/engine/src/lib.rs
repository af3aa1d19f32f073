//! # Bulwark Engine
//!
//! Wires the building blocks into a dashboard session: the balance source
//! filling the balance store, generation filling the strategy store, and the
//! approval/execution workflow for the strategy the user picks.

pub mod balances;
pub mod error;
pub mod session;
pub mod strategies;

#[cfg(test)]
mod testing;

pub use balances::BalanceSource;
pub use error::EngineError;
pub use session::{Dashboard, Session};
pub use strategies::StrategyGenerator;
