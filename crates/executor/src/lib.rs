//! # Bulwark Executor Crate
//!
//! The approve-then-execute workflow that commits funds to a chosen strategy.
//!
//! ## Architectural Principles
//!
//! - **State vs. Effects Decoupling:** `ApprovalWorkflow` is a pure state machine.
//!   `transition` maps (state, event) to (next state, action) and never touches
//!   the network. `WorkflowRunner` performs the effects it asks for through a
//!   `TransactionSender` and feeds the outcomes back in as events.
//! - **Ordering by Construction:** execution is only ever requested by the
//!   transition out of `Approving`, and the runner holds the machine by `&mut`
//!   for the whole attempt, so a second concurrent start cannot be expressed.
//!
//! ## Public API
//!
//! - `ApprovalWorkflow`, `WorkflowState`, `WorkflowEvent`, `Effect`: the machine.
//! - `WorkflowRunner`, `WorkflowOutcome`: the async driver and its result.
//! - `WorkflowError`: requests and events the machine refuses.

pub mod error;
pub mod runner;
pub mod workflow;

pub use error::WorkflowError;
pub use runner::{WorkflowOutcome, WorkflowRunner};
pub use workflow::{
    Action, ApprovalWorkflow, Effect, PreparedRequest, Stage, WorkflowEvent, WorkflowFailure,
    WorkflowSettings, WorkflowState, transition,
};
