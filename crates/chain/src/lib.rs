//! # Bulwark Chain Access
//!
//! Everything that talks to the blockchain node: provider construction, the
//! ERC-20 and strategy contract bindings, balance reads, and transaction
//! submission. Higher layers only see the `TokenReader` and
//! `TransactionSender` traits, so they can run against in-memory doubles.

pub mod contracts;
pub mod error;
pub mod provider;
pub mod reader;
pub mod sender;
pub mod units;

pub use alloy::primitives::{Address, TxHash, U256};
pub use error::ChainError;
pub use provider::{ConnectionFactory, parse_address};
pub use reader::{AlloyTokenReader, TokenReader};
pub use sender::{AlloyTransactionSender, TransactionSender};
pub use units::{format_base_units, to_base_units};
