//! # Bulwark Events
//!
//! This crate defines the event structures a dashboard session broadcasts to
//! whatever front-end is attached to it (the CLI today).
//!
//! As a Layer 0 crate, it depends only on `core-types` and provides the definitive
//! language for session state synchronization.

// Declare the modules that make up this crate.
pub mod messages;

// Re-export the core types to provide a clean public API.
pub use messages::{DashboardEvent, LogLevel, LogMessage, WorkflowPhase, WorkflowUpdate};
