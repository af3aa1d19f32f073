use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("A workflow attempt is already in progress or finished (state: {0}); reset it first")]
    AlreadyStarted(String),

    #[error("Invalid execution request: {0}")]
    InvalidRequest(String),

    #[error("Token {symbol} is not registered on chain {chain_id}")]
    UnknownToken { symbol: String, chain_id: u64 },

    #[error("Cannot reset while a transaction is in flight (state: {0})")]
    InFlight(String),

    #[error("Event {event} is not valid in state {state}")]
    UnexpectedEvent { state: String, event: &'static str },

    #[error("The workflow produced no further action while not in a terminal state")]
    Stalled,
}
