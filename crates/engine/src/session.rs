use crate::balances::BalanceSource;
use crate::error::EngineError;
use crate::strategies::StrategyGenerator;
use api_client::StrategyClient;
use chain::{TokenReader, TransactionSender};
use configuration::Config;
use core_types::{ExecutionRequest, RiskLevel, Strategy, TokenBalances};
use events::{DashboardEvent, LogLevel, LogMessage};
use executor::{
    ApprovalWorkflow, WorkflowError, WorkflowOutcome, WorkflowRunner, WorkflowSettings,
    WorkflowState,
};
use std::sync::Arc;
use std::time::Duration;
use store::{BalanceStore, StrategyStore};
use tokio::sync::{Mutex, broadcast, watch};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Long-lived application state: configuration plus the shared clients.
#[derive(Clone)]
pub struct Dashboard {
    config: Config,
    reader: Arc<dyn TokenReader>,
    sender: Arc<dyn TransactionSender>,
    client: Arc<dyn StrategyClient>,
}

impl Dashboard {
    pub fn new(
        config: Config,
        reader: Arc<dyn TokenReader>,
        sender: Arc<dyn TransactionSender>,
        client: Arc<dyn StrategyClient>,
    ) -> Self {
        Self {
            config,
            reader,
            sender,
            client,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Opens a session for a connected wallet with fresh stores and event channel.
    pub fn connect(&self, address: impl Into<String>, chain_id: u64) -> Session {
        let address = address.into();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let balance_store = BalanceStore::new();
        let strategy_store = StrategyStore::new();

        let settings = WorkflowSettings::from_config(&self.config, chain_id);
        let (state, _) = watch::channel(WorkflowState::Idle);
        let state = Arc::new(state);
        let runner = WorkflowRunner::new(
            self.sender.clone(),
            Duration::from_secs(self.config.workflow.step_timeout_secs),
        )
        .with_events(events.clone())
        .with_state_watch(state.clone());

        tracing::info!(%address, chain_id, "Session opened");
        Session {
            balances: BalanceSource::from_config(
                self.reader.clone(),
                &self.config,
                balance_store.clone(),
            ),
            generator: StrategyGenerator::new(self.client.clone(), strategy_store.clone()),
            workflow: Mutex::new(ApprovalWorkflow::new(settings.clone())),
            state,
            default_spend_token: self.config.workflow.default_spend_token.clone(),
            address,
            chain_id,
            balance_store,
            strategy_store,
            settings,
            runner,
            events,
            selected: None,
        }
    }
}

/// The state of one connected wallet: its stores, its selection, and its workflow.
pub struct Session {
    address: String,
    chain_id: u64,
    balance_store: BalanceStore,
    strategy_store: StrategyStore,
    balances: BalanceSource,
    generator: StrategyGenerator,
    settings: WorkflowSettings,
    runner: WorkflowRunner,
    workflow: Mutex<ApprovalWorkflow>,
    state: Arc<watch::Sender<WorkflowState>>,
    default_spend_token: String,
    events: broadcast::Sender<DashboardEvent>,
    selected: Option<RiskLevel>,
}

impl Session {
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn balance_store(&self) -> &BalanceStore {
        &self.balance_store
    }

    pub fn strategy_store(&self) -> &StrategyStore {
        &self.strategy_store
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events.subscribe()
    }

    pub fn selected(&self) -> Option<RiskLevel> {
        self.selected
    }

    pub async fn refresh_balances(&self) -> Result<TokenBalances, EngineError> {
        let balances = self.balances.fetch(&self.address, self.chain_id).await?;
        self.publish(DashboardEvent::BalancesUpdated(balances.clone()));
        Ok(balances)
    }

    /// Generates strategies from whatever the balance store currently holds.
    ///
    /// Refuses while balances are loading, and never calls the service when
    /// every balance is zero.
    pub async fn generate_strategies(&self) -> Result<Arc<Vec<Strategy>>, EngineError> {
        let snapshot = self.balance_store.snapshot().await;
        if snapshot.is_loading {
            return Err(EngineError::BalancesLoading);
        }
        if snapshot.balances.all_zero() {
            tracing::warn!(address = %self.address, "No funds for allocation");
            self.publish(DashboardEvent::Log(LogMessage::new(
                LogLevel::Warn,
                "No funds for allocation",
            )));
            return Err(EngineError::NoFunds);
        }

        let strategies = self
            .generator
            .generate(&self.address, &snapshot.balances)
            .await?;
        self.publish(DashboardEvent::StrategiesGenerated(strategies.to_vec()));
        Ok(strategies)
    }

    /// Marks the strategy with `risk_level` as the user's choice.
    pub async fn select_strategy(&mut self, risk_level: RiskLevel) -> Result<Strategy, EngineError> {
        let strategy = self
            .strategy_store
            .find(risk_level)
            .await
            .ok_or(EngineError::StrategyNotFound(risk_level))?;
        self.selected = Some(risk_level);
        Ok(strategy)
    }

    /// Runs approval then execution for the strategy with `risk_level`.
    ///
    /// Each call starts from a fresh workflow; a call made while another
    /// attempt is still running is rejected without submitting anything.
    pub async fn execute(
        &self,
        risk_level: RiskLevel,
        amount: &str,
        token: Option<&str>,
    ) -> Result<WorkflowOutcome, EngineError> {
        let strategy = self
            .strategy_store
            .find(risk_level)
            .await
            .ok_or(EngineError::StrategyNotFound(risk_level))?;

        let mut workflow = self
            .workflow
            .try_lock()
            .map_err(|_| WorkflowError::AlreadyStarted(self.workflow_state().to_string()))?;
        *workflow = ApprovalWorkflow::new(self.settings.clone());
        self.state.send_replace(WorkflowState::Idle);

        let token = token.unwrap_or(&self.default_spend_token);
        let request = ExecutionRequest::new(strategy, amount, self.address.clone()).with_token(token);
        let outcome = self.runner.run(&mut workflow, request).await?;
        Ok(outcome)
    }

    /// The state of the most recent attempt, including one still in flight.
    pub fn workflow_state(&self) -> WorkflowState {
        self.state.borrow().clone()
    }

    /// Clears both stores and ends the session.
    pub async fn disconnect(self) {
        self.balance_store.clear().await;
        self.strategy_store.clear().await;
        tracing::info!(address = %self.address, "Session closed");
    }

    fn publish(&self, event: DashboardEvent) {
        let _ = self.events.send(event);
    }
}
