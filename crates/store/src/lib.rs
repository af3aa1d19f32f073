//! # Bulwark Stores
//!
//! Session-scoped caches for the latest balances and generated strategies.
//! A store is an owned handle, created when a wallet connects and cleared when
//! it disconnects; components receive the handle they need instead of
//! reaching for a global.

pub mod balances;
pub mod strategies;

pub use balances::{BalanceSnapshot, BalanceStore};
pub use strategies::StrategyStore;
