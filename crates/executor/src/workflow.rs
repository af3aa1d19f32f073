use crate::error::WorkflowError;
use chain::{Address, TxHash, U256, to_base_units};
use configuration::{Config, DEFAULT_SPEND_DECIMALS, TokenRegistry};
use core_types::{ExecutionRequest, RiskLevel};
use events::WorkflowPhase;
use std::fmt;
use uuid::Uuid;

/// Which on-chain step of an attempt a failure or timeout belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Approval,
    Execution,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Approval => write!(f, "approval"),
            Stage::Execution => write!(f, "execution"),
        }
    }
}

/// Why an attempt ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowFailure {
    Approval(String),
    Execution(String),
    Timeout(Stage),
}

impl fmt::Display for WorkflowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowFailure::Approval(reason) => write!(f, "Approval failed: {}", reason),
            WorkflowFailure::Execution(reason) => write!(f, "Execution failed: {}", reason),
            WorkflowFailure::Timeout(stage) => write!(f, "Timed out waiting for {}", stage),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    Approving,
    Executing,
    Succeeded,
    Failed(WorkflowFailure),
}

impl WorkflowState {
    pub fn phase(&self) -> WorkflowPhase {
        match self {
            WorkflowState::Idle => WorkflowPhase::Idle,
            WorkflowState::Approving => WorkflowPhase::Approving,
            WorkflowState::Executing => WorkflowPhase::Executing,
            WorkflowState::Succeeded => WorkflowPhase::Succeeded,
            WorkflowState::Failed(_) => WorkflowPhase::Failed,
        }
    }

    /// True while a submission is outstanding.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, WorkflowState::Approving | WorkflowState::Executing)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowState::Succeeded | WorkflowState::Failed(_))
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowState::Idle => write!(f, "idle"),
            WorkflowState::Approving => write!(f, "approving"),
            WorkflowState::Executing => write!(f, "executing"),
            WorkflowState::Succeeded => write!(f, "succeeded"),
            WorkflowState::Failed(failure) => write!(f, "failed ({})", failure),
        }
    }
}

/// Inputs to the machine: the user's start/reset commands and the outcomes
/// of the submissions it asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    Start(ExecutionRequest),
    ApprovalSubmitted(TxHash),
    ApprovalFailed(String),
    ExecutionSubmitted(TxHash),
    ExecutionFailed(String),
    TimedOut,
    Reset,
}

impl WorkflowEvent {
    fn name(&self) -> &'static str {
        match self {
            WorkflowEvent::Start(_) => "start",
            WorkflowEvent::ApprovalSubmitted(_) => "approval-submitted",
            WorkflowEvent::ApprovalFailed(_) => "approval-failed",
            WorkflowEvent::ExecutionSubmitted(_) => "execution-submitted",
            WorkflowEvent::ExecutionFailed(_) => "execution-failed",
            WorkflowEvent::TimedOut => "timed-out",
            WorkflowEvent::Reset => "reset",
        }
    }
}

/// The abstract side effect of a transition, before request data is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SubmitApproval,
    SubmitExecution,
    ReportSuccess,
    ReportFailure,
    Clear,
    Nothing,
}

/// The transition table.
///
/// Pure: it only inspects the current state and the event, and either returns
/// the next state with the action to perform or rejects the event. Rejected
/// events leave the caller's state untouched.
pub fn transition(
    state: &WorkflowState,
    event: &WorkflowEvent,
) -> Result<(WorkflowState, Action), WorkflowError> {
    use WorkflowEvent as E;
    use WorkflowState as S;

    match (state, event) {
        (S::Idle, E::Start(_)) => Ok((S::Approving, Action::SubmitApproval)),
        (_, E::Start(_)) => Err(WorkflowError::AlreadyStarted(state.to_string())),

        (S::Approving, E::ApprovalSubmitted(_)) => Ok((S::Executing, Action::SubmitExecution)),
        (S::Approving, E::ApprovalFailed(reason)) => Ok((
            S::Failed(WorkflowFailure::Approval(reason.clone())),
            Action::ReportFailure,
        )),
        (S::Approving, E::TimedOut) => Ok((
            S::Failed(WorkflowFailure::Timeout(Stage::Approval)),
            Action::ReportFailure,
        )),

        (S::Executing, E::ExecutionSubmitted(_)) => Ok((S::Succeeded, Action::ReportSuccess)),
        (S::Executing, E::ExecutionFailed(reason)) => Ok((
            S::Failed(WorkflowFailure::Execution(reason.clone())),
            Action::ReportFailure,
        )),
        (S::Executing, E::TimedOut) => Ok((
            S::Failed(WorkflowFailure::Timeout(Stage::Execution)),
            Action::ReportFailure,
        )),

        (S::Approving | S::Executing, E::Reset) => {
            Err(WorkflowError::InFlight(state.to_string()))
        }
        (S::Idle, E::Reset) => Ok((S::Idle, Action::Nothing)),
        (S::Succeeded | S::Failed(_), E::Reset) => Ok((S::Idle, Action::Clear)),

        (_, event) => Err(WorkflowError::UnexpectedEvent {
            state: state.to_string(),
            event: event.name(),
        }),
    }
}

/// What the driver must do after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    SubmitApproval {
        token: Address,
        spender: Address,
        amount: U256,
    },
    SubmitExecution {
        contract: Address,
        amount: U256,
        risk_level: RiskLevel,
    },
    ReportSuccess {
        approval_tx: TxHash,
        execution_tx: TxHash,
    },
    ReportFailure(WorkflowFailure),
}

/// Chain-specific facts the machine needs to turn a request into submissions.
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub chain_id: u64,
    /// The strategy contract: approval spender and execution target.
    pub strategy_contract: Address,
    pub tokens: TokenRegistry,
}

impl WorkflowSettings {
    pub fn from_config(config: &Config, chain_id: u64) -> Self {
        Self {
            chain_id,
            strategy_contract: config.workflow.strategy_contract,
            tokens: config.tokens.clone(),
        }
    }
}

/// A validated request with its amount scaled to the spend token's base units.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub request: ExecutionRequest,
    pub token_address: Address,
    pub decimals: u8,
    pub amount: U256,
}

impl PreparedRequest {
    fn prepare(request: ExecutionRequest, settings: &WorkflowSettings) -> Result<Self, WorkflowError> {
        let amount = request
            .validate()
            .map_err(|e| WorkflowError::InvalidRequest(e.to_string()))?;
        chain::parse_address(&request.address)
            .map_err(|e| WorkflowError::InvalidRequest(e.to_string()))?;

        let token_address = settings
            .tokens
            .token_address(settings.chain_id, &request.token)
            .ok_or_else(|| WorkflowError::UnknownToken {
                symbol: request.token.clone(),
                chain_id: settings.chain_id,
            })?;
        let decimals = settings
            .tokens
            .decimals(&request.token)
            .unwrap_or(DEFAULT_SPEND_DECIMALS);
        let amount = to_base_units(amount, decimals)
            .map_err(|e| WorkflowError::InvalidRequest(e.to_string()))?;

        Ok(Self {
            request,
            token_address,
            decimals,
            amount,
        })
    }
}

/// The approve-then-execute state machine for one strategy attempt.
///
/// All mutation goes through `advance`, so a second start while an attempt is
/// live, an execution before its approval, or a reset mid-flight are rejected
/// as errors instead of being silently reordered.
#[derive(Debug, Clone)]
pub struct ApprovalWorkflow {
    settings: WorkflowSettings,
    state: WorkflowState,
    request: Option<PreparedRequest>,
    approval_tx: Option<TxHash>,
    execution_tx: Option<TxHash>,
}

impl ApprovalWorkflow {
    pub fn new(settings: WorkflowSettings) -> Self {
        Self {
            settings,
            state: WorkflowState::Idle,
            request: None,
            approval_tx: None,
            execution_tx: None,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn request(&self) -> Option<&PreparedRequest> {
        self.request.as_ref()
    }

    pub fn attempt_id(&self) -> Option<Uuid> {
        self.request.as_ref().map(|p| p.request.attempt_id)
    }

    pub fn approval_tx(&self) -> Option<TxHash> {
        self.approval_tx
    }

    pub fn execution_tx(&self) -> Option<TxHash> {
        self.execution_tx
    }

    /// Applies one event and returns the effect the driver must carry out.
    pub fn advance(&mut self, event: WorkflowEvent) -> Result<Effect, WorkflowError> {
        let (next, action) = transition(&self.state, &event)?;

        match event {
            WorkflowEvent::Start(request) => {
                self.request = Some(PreparedRequest::prepare(request, &self.settings)?);
            }
            WorkflowEvent::ApprovalSubmitted(tx) => self.approval_tx = Some(tx),
            WorkflowEvent::ExecutionSubmitted(tx) => self.execution_tx = Some(tx),
            _ => {}
        }

        let effect = self.effect_for(action, &next)?;
        tracing::debug!(from = %self.state, to = %next, "Workflow transition");
        self.state = next;
        Ok(effect)
    }

    fn effect_for(&mut self, action: Action, next: &WorkflowState) -> Result<Effect, WorkflowError> {
        let effect = match action {
            Action::SubmitApproval => {
                let prepared = self.request.as_ref().ok_or(WorkflowError::Stalled)?;
                Effect::SubmitApproval {
                    token: prepared.token_address,
                    spender: self.settings.strategy_contract,
                    amount: prepared.amount,
                }
            }
            Action::SubmitExecution => {
                let prepared = self.request.as_ref().ok_or(WorkflowError::Stalled)?;
                Effect::SubmitExecution {
                    contract: self.settings.strategy_contract,
                    amount: prepared.amount,
                    risk_level: prepared.request.strategy.risk_level,
                }
            }
            Action::ReportSuccess => match (self.approval_tx, self.execution_tx) {
                (Some(approval_tx), Some(execution_tx)) => Effect::ReportSuccess {
                    approval_tx,
                    execution_tx,
                },
                _ => return Err(WorkflowError::Stalled),
            },
            Action::ReportFailure => match next {
                WorkflowState::Failed(failure) => Effect::ReportFailure(failure.clone()),
                _ => return Err(WorkflowError::Stalled),
            },
            Action::Clear => {
                self.request = None;
                self.approval_tx = None;
                self.execution_tx = None;
                Effect::None
            }
            Action::Nothing => Effect::None,
        };
        Ok(effect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::Strategy;
    use rust_decimal::Decimal;

    const OWNER: &str = "0x1111111111111111111111111111111111111111";

    fn settings() -> WorkflowSettings {
        WorkflowSettings::from_config(&Config::default(), 534352)
    }

    fn strategy(level: u8) -> Strategy {
        Strategy {
            risk_level: RiskLevel(level),
            steps: Vec::new(),
            explanation: String::new(),
            total_expected_apy: Decimal::from(5),
            risk_factors: Vec::new(),
        }
    }

    fn request(amount: &str) -> ExecutionRequest {
        ExecutionRequest::new(strategy(3), amount, OWNER)
    }

    fn tx(byte: u8) -> TxHash {
        TxHash::repeat_byte(byte)
    }

    #[test]
    fn start_asks_for_approval_of_the_scaled_amount() {
        let settings = settings();
        let usdc = settings.tokens.token_address(534352, "USDC").unwrap();
        let mut workflow = ApprovalWorkflow::new(settings.clone());

        let effect = workflow.advance(WorkflowEvent::Start(request("1.5"))).unwrap();

        assert_eq!(
            effect,
            Effect::SubmitApproval {
                token: usdc,
                spender: settings.strategy_contract,
                amount: U256::from(1_500_000u64),
            }
        );
        assert_eq!(workflow.state(), &WorkflowState::Approving);
    }

    #[test]
    fn execution_is_only_requested_after_approval_is_submitted() {
        let mut workflow = ApprovalWorkflow::new(settings());
        workflow.advance(WorkflowEvent::Start(request("10"))).unwrap();

        let err = workflow
            .advance(WorkflowEvent::ExecutionSubmitted(tx(2)))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::UnexpectedEvent { .. }));
        assert_eq!(workflow.state(), &WorkflowState::Approving);

        let effect = workflow.advance(WorkflowEvent::ApprovalSubmitted(tx(1))).unwrap();
        assert!(matches!(
            effect,
            Effect::SubmitExecution { risk_level: RiskLevel(3), .. }
        ));
        assert_eq!(workflow.state(), &WorkflowState::Executing);

        let effect = workflow.advance(WorkflowEvent::ExecutionSubmitted(tx(2))).unwrap();
        assert_eq!(
            effect,
            Effect::ReportSuccess {
                approval_tx: tx(1),
                execution_tx: tx(2),
            }
        );
        assert_eq!(workflow.state(), &WorkflowState::Succeeded);
    }

    #[test]
    fn second_start_is_rejected_while_in_flight() {
        let mut workflow = ApprovalWorkflow::new(settings());
        workflow.advance(WorkflowEvent::Start(request("10"))).unwrap();
        let first = workflow.attempt_id();

        let err = workflow.advance(WorkflowEvent::Start(request("20"))).unwrap_err();
        assert!(matches!(err, WorkflowError::AlreadyStarted(_)));
        assert_eq!(workflow.attempt_id(), first);

        workflow.advance(WorkflowEvent::ApprovalSubmitted(tx(1))).unwrap();
        assert!(workflow.advance(WorkflowEvent::Start(request("20"))).is_err());
        assert_eq!(workflow.state(), &WorkflowState::Executing);
    }

    #[test]
    fn invalid_amounts_never_leave_idle() {
        for amount in ["0", "-5", "", "abc"] {
            let mut workflow = ApprovalWorkflow::new(settings());
            let err = workflow.advance(WorkflowEvent::Start(request(amount))).unwrap_err();
            assert!(matches!(err, WorkflowError::InvalidRequest(_)), "{amount}: {err:?}");
            assert_eq!(workflow.state(), &WorkflowState::Idle);
            assert!(workflow.request().is_none());
        }
    }

    #[test]
    fn amounts_finer_than_the_token_allows_are_rejected() {
        let mut workflow = ApprovalWorkflow::new(settings());
        let err = workflow
            .advance(WorkflowEvent::Start(request("1.0000001")))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidRequest(_)));
    }

    #[test]
    fn unregistered_token_is_rejected() {
        let mut workflow = ApprovalWorkflow::new(settings());
        let err = workflow
            .advance(WorkflowEvent::Start(request("1").with_token("DOGE")))
            .unwrap_err();
        assert_eq!(
            err,
            WorkflowError::UnknownToken {
                symbol: "DOGE".to_string(),
                chain_id: 534352,
            }
        );
    }

    #[test]
    fn approval_failure_ends_the_attempt_without_execution() {
        let mut workflow = ApprovalWorkflow::new(settings());
        workflow.advance(WorkflowEvent::Start(request("10"))).unwrap();

        let effect = workflow
            .advance(WorkflowEvent::ApprovalFailed("user rejected".to_string()))
            .unwrap();
        let failure = WorkflowFailure::Approval("user rejected".to_string());
        assert_eq!(effect, Effect::ReportFailure(failure.clone()));
        assert_eq!(workflow.state(), &WorkflowState::Failed(failure));

        let err = workflow
            .advance(WorkflowEvent::ApprovalSubmitted(tx(1)))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::UnexpectedEvent { .. }));
    }

    #[test]
    fn timeouts_record_the_stage() {
        let mut workflow = ApprovalWorkflow::new(settings());
        workflow.advance(WorkflowEvent::Start(request("10"))).unwrap();
        workflow.advance(WorkflowEvent::ApprovalSubmitted(tx(1))).unwrap();

        let effect = workflow.advance(WorkflowEvent::TimedOut).unwrap();
        assert_eq!(
            effect,
            Effect::ReportFailure(WorkflowFailure::Timeout(Stage::Execution))
        );
    }

    #[test]
    fn reset_from_terminal_clears_the_attempt() {
        let mut workflow = ApprovalWorkflow::new(settings());
        workflow.advance(WorkflowEvent::Start(request("10"))).unwrap();
        workflow
            .advance(WorkflowEvent::ApprovalFailed("rejected".to_string()))
            .unwrap();

        assert_eq!(workflow.advance(WorkflowEvent::Reset).unwrap(), Effect::None);
        assert_eq!(workflow.state(), &WorkflowState::Idle);
        assert!(workflow.request().is_none());
        assert!(workflow.approval_tx().is_none());

        workflow.advance(WorkflowEvent::Start(request("5"))).unwrap();
        assert_eq!(workflow.state(), &WorkflowState::Approving);
    }

    #[test]
    fn reset_is_rejected_mid_flight() {
        let mut workflow = ApprovalWorkflow::new(settings());
        workflow.advance(WorkflowEvent::Start(request("10"))).unwrap();

        let err = workflow.advance(WorkflowEvent::Reset).unwrap_err();
        assert!(matches!(err, WorkflowError::InFlight(_)));
        assert_eq!(workflow.state(), &WorkflowState::Approving);
    }

    #[test]
    fn transition_table_is_closed_over_terminal_states() {
        let succeeded = WorkflowState::Succeeded;
        for event in [
            WorkflowEvent::ApprovalSubmitted(tx(1)),
            WorkflowEvent::ExecutionFailed("x".to_string()),
            WorkflowEvent::TimedOut,
        ] {
            assert!(transition(&succeeded, &event).is_err());
        }
        assert_eq!(
            transition(&succeeded, &WorkflowEvent::Reset).unwrap(),
            (WorkflowState::Idle, Action::Clear)
        );
    }
}
