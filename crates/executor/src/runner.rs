use crate::error::WorkflowError;
use crate::workflow::{ApprovalWorkflow, Effect, WorkflowEvent, WorkflowFailure, WorkflowState};
use chain::{ChainError, TransactionSender, TxHash};
use chrono::Utc;
use core_types::{ExecutionRequest, RiskLevel};
use events::{DashboardEvent, WorkflowUpdate};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use uuid::Uuid;

/// How an attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowOutcome {
    Succeeded {
        approval_tx: TxHash,
        execution_tx: TxHash,
    },
    Failed(WorkflowFailure),
}

impl WorkflowOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, WorkflowOutcome::Succeeded { .. })
    }
}

/// Drives an `ApprovalWorkflow` against a `TransactionSender`.
///
/// Each submission is awaited under the step timeout; expiry is fed back to
/// the machine as `TimedOut`. Every state change is published as a
/// `DashboardEvent::WorkflowUpdate` when an event channel is attached, and
/// mirrored into a `watch` channel when one is attached, so observers can
/// read the current state without waiting for the attempt to finish.
#[derive(Clone)]
pub struct WorkflowRunner {
    sender: Arc<dyn TransactionSender>,
    step_timeout: Duration,
    events: Option<broadcast::Sender<DashboardEvent>>,
    state: Option<Arc<watch::Sender<WorkflowState>>>,
}

impl WorkflowRunner {
    pub fn new(sender: Arc<dyn TransactionSender>, step_timeout: Duration) -> Self {
        Self {
            sender,
            step_timeout,
            events: None,
            state: None,
        }
    }

    pub fn with_events(mut self, events: broadcast::Sender<DashboardEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_state_watch(mut self, state: Arc<watch::Sender<WorkflowState>>) -> Self {
        self.state = Some(state);
        self
    }

    /// Runs one attempt from `Start` to a terminal state.
    ///
    /// Errors are returned only for requests the machine refuses to start;
    /// on-chain failures and timeouts come back as `WorkflowOutcome::Failed`.
    pub async fn run(
        &self,
        workflow: &mut ApprovalWorkflow,
        request: ExecutionRequest,
    ) -> Result<WorkflowOutcome, WorkflowError> {
        let attempt_id = request.attempt_id;
        let risk_level = request.strategy.risk_level;

        let mut effect = workflow.advance(WorkflowEvent::Start(request))?;
        tracing::info!(%attempt_id, %risk_level, "Workflow started");
        self.publish(workflow, attempt_id, risk_level, None);

        loop {
            let event = match effect {
                Effect::SubmitApproval {
                    token,
                    spender,
                    amount,
                } => {
                    tracing::info!(%attempt_id, %token, %spender, %amount, "Requesting approval");
                    match self.step(self.sender.approve(token, spender, amount)).await {
                        Step::Done(tx) => WorkflowEvent::ApprovalSubmitted(tx),
                        Step::Failed(e) => WorkflowEvent::ApprovalFailed(e.to_string()),
                        Step::TimedOut => WorkflowEvent::TimedOut,
                    }
                }
                Effect::SubmitExecution {
                    contract,
                    amount,
                    risk_level,
                } => {
                    tracing::info!(%attempt_id, %contract, %amount, %risk_level, "Executing strategy");
                    let call = self.sender.execute_strategy(contract, amount, risk_level.0);
                    match self.step(call).await {
                        Step::Done(tx) => WorkflowEvent::ExecutionSubmitted(tx),
                        Step::Failed(e) => WorkflowEvent::ExecutionFailed(e.to_string()),
                        Step::TimedOut => WorkflowEvent::TimedOut,
                    }
                }
                Effect::ReportSuccess {
                    approval_tx,
                    execution_tx,
                } => {
                    tracing::info!(%attempt_id, %approval_tx, %execution_tx, "Workflow succeeded");
                    return Ok(WorkflowOutcome::Succeeded {
                        approval_tx,
                        execution_tx,
                    });
                }
                Effect::ReportFailure(failure) => {
                    tracing::warn!(%attempt_id, %failure, "Workflow failed");
                    return Ok(WorkflowOutcome::Failed(failure));
                }
                Effect::None => return Err(WorkflowError::Stalled),
            };

            let detail = match &event {
                WorkflowEvent::ApprovalSubmitted(tx) | WorkflowEvent::ExecutionSubmitted(tx) => {
                    Some(tx.to_string())
                }
                _ => None,
            };
            effect = workflow.advance(event)?;
            let detail = match &effect {
                Effect::ReportFailure(failure) => Some(failure.to_string()),
                _ => detail,
            };
            self.publish(workflow, attempt_id, risk_level, detail);
        }
    }

    async fn step<F>(&self, call: F) -> Step
    where
        F: Future<Output = Result<TxHash, ChainError>>,
    {
        match tokio::time::timeout(self.step_timeout, call).await {
            Ok(Ok(tx)) => Step::Done(tx),
            Ok(Err(e)) => Step::Failed(e),
            Err(_) => Step::TimedOut,
        }
    }

    fn publish(
        &self,
        workflow: &ApprovalWorkflow,
        attempt_id: Uuid,
        risk_level: RiskLevel,
        detail: Option<String>,
    ) {
        if let Some(state) = &self.state {
            state.send_replace(workflow.state().clone());
        }
        let Some(events) = &self.events else {
            return;
        };
        let update = WorkflowUpdate {
            timestamp: Utc::now(),
            attempt_id,
            risk_level,
            phase: workflow.state().phase(),
            detail,
        };
        // No subscribers is fine; the CLI may not be listening.
        let _ = events.send(DashboardEvent::WorkflowUpdate(update));
    }
}

enum Step {
    Done(TxHash),
    Failed(ChainError),
    TimedOut,
}
