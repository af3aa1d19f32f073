use anyhow::{Context, bail};
use api_client::HttpStrategyClient;
use async_trait::async_trait;
use chain::{
    Address, AlloyTokenReader, AlloyTransactionSender, ChainError, ConnectionFactory,
    TransactionSender, TxHash, U256,
};
use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use configuration::{Config, LogFormat, init_logging, load_config_from};
use core_types::{RiskLevel, Strategy, TokenBalances, format_action, formatted_amount};
use engine::{Dashboard, Session};
use events::{DashboardEvent, WorkflowPhase};
use executor::WorkflowOutcome;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// The main entry point for the Bulwark dashboard CLI.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; PRIVATE_KEY may come from the environment.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = load_config_from(&cli.config, false)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    let _log_guard = init_logging(&config.logging);

    let chain_id = cli.chain_id.unwrap_or(config.network.chain_id);
    let (dashboard, signer) = build_dashboard(config)?;

    match cli.command {
        Commands::Balances(args) => {
            let session = dashboard.connect(resolve_address(args.address, signer)?, chain_id);
            handle_balances(&session).await
        }
        Commands::Strategies(args) => {
            let session = dashboard.connect(resolve_address(args.address, signer)?, chain_id);
            handle_strategies(&session, args.json).await
        }
        Commands::Execute(args) => {
            let Some(signer) = signer else {
                bail!("PRIVATE_KEY must be set to sign approval and execution transactions");
            };
            let session = dashboard.connect(signer.to_string(), chain_id);
            handle_execute(session, args).await
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// A DeFi dashboard: inspect balances, generate yield strategies, execute one.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Chain to operate on (defaults to `network.chain_id`).
    #[arg(long, global = true)]
    chain_id: Option<u64>,

    /// Overrides `logging.format`.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show native and token balances for an account.
    Balances(AccountArgs),
    /// Generate ranked strategies from the account's balances.
    Strategies(StrategiesArgs),
    /// Approve the spend and execute the strategy with the given risk level.
    Execute(ExecuteArgs),
}

#[derive(Parser)]
struct AccountArgs {
    /// Account to inspect (defaults to the PRIVATE_KEY account).
    #[arg(long)]
    address: Option<String>,
}

#[derive(Parser)]
struct StrategiesArgs {
    /// Account to generate for (defaults to the PRIVATE_KEY account).
    #[arg(long)]
    address: Option<String>,

    /// Print the raw strategy list as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct ExecuteArgs {
    /// Risk level of the generated strategy to execute (e.g. 1, 3, 5).
    #[arg(long)]
    risk_level: u8,

    /// Spend amount in whole token units (e.g. "250.5").
    #[arg(long)]
    amount: String,

    /// Symbol of the token to approve and spend (defaults to `workflow.default_spend_token`).
    #[arg(long)]
    token: Option<String>,
}

// ==============================================================================
// Wiring
// ==============================================================================

/// Stands in for a signer when no PRIVATE_KEY is configured, so read-only
/// commands still work.
struct MissingSigner;

#[async_trait]
impl TransactionSender for MissingSigner {
    async fn approve(&self, _: Address, _: Address, _: U256) -> Result<TxHash, ChainError> {
        Err(ChainError::Signer("PRIVATE_KEY is not set".to_string()))
    }

    async fn execute_strategy(&self, _: Address, _: U256, _: u8) -> Result<TxHash, ChainError> {
        Err(ChainError::Signer("PRIVATE_KEY is not set".to_string()))
    }
}

fn build_dashboard(config: Config) -> anyhow::Result<(Dashboard, Option<Address>)> {
    let read_provider = ConnectionFactory::http(&config.network.rpc_url)?;
    let reader = Arc::new(AlloyTokenReader::new(read_provider));
    let client = Arc::new(HttpStrategyClient::new(&config.api)?);

    let (sender, signer) = match std::env::var("PRIVATE_KEY") {
        Ok(key) if !key.trim().is_empty() => {
            let (provider, signer) =
                ConnectionFactory::http_with_signer(&config.network.rpc_url, key.trim())?;
            tracing::info!(%signer, "Loaded signing key");
            let sender = AlloyTransactionSender::new(provider, config.workflow.await_receipts);
            (Arc::new(sender) as Arc<dyn TransactionSender>, Some(signer))
        }
        _ => (Arc::new(MissingSigner) as Arc<dyn TransactionSender>, None),
    };

    Ok((Dashboard::new(config, reader, sender, client), signer))
}

fn resolve_address(explicit: Option<String>, signer: Option<Address>) -> anyhow::Result<String> {
    match (explicit, signer) {
        (Some(address), _) => Ok(address),
        (None, Some(signer)) => Ok(signer.to_string()),
        (None, None) => bail!("Pass --address or set PRIVATE_KEY"),
    }
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_balances(session: &Session) -> anyhow::Result<()> {
    let balances = session.refresh_balances().await?;
    print_balances(session.address(), &balances);
    Ok(())
}

async fn handle_strategies(session: &Session, json: bool) -> anyhow::Result<()> {
    let balances = session.refresh_balances().await?;
    if !json {
        print_balances(session.address(), &balances);
    }

    let strategies = session.generate_strategies().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(strategies.as_slice())?);
    } else {
        for strategy in strategies.iter() {
            print_strategy(strategy);
        }
    }
    Ok(())
}

async fn handle_execute(session: Session, args: ExecuteArgs) -> anyhow::Result<()> {
    session.refresh_balances().await?;
    session.generate_strategies().await?;
    let risk_level = RiskLevel(args.risk_level);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed}] {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(120));

    let mut updates = session.subscribe();
    let progress = spinner.clone();
    let render = tokio::spawn(async move {
        while let Ok(event) = updates.recv().await {
            if let DashboardEvent::WorkflowUpdate(update) = event {
                let message = match update.phase {
                    WorkflowPhase::Idle => "Idle".to_string(),
                    WorkflowPhase::Approving => "Waiting for approval...".to_string(),
                    WorkflowPhase::Executing => "Executing strategy...".to_string(),
                    WorkflowPhase::Succeeded => "Strategy executed".to_string(),
                    WorkflowPhase::Failed => {
                        format!("Failed: {}", update.detail.unwrap_or_default())
                    }
                };
                progress.set_message(message);
            }
        }
    });

    let result = session
        .execute(risk_level, &args.amount, args.token.as_deref())
        .await;
    session.disconnect().await;
    // The session's channel closes with it, which ends the render task.
    let _ = render.await;

    match result? {
        WorkflowOutcome::Succeeded {
            approval_tx,
            execution_tx,
        } => {
            spinner.finish_with_message(format!(
                "Strategy {} executed (approval {}, execution {})",
                risk_level, approval_tx, execution_tx
            ));
            Ok(())
        }
        WorkflowOutcome::Failed(failure) => {
            spinner.abandon_with_message(format!("Strategy {} failed", risk_level));
            bail!("{}", failure)
        }
    }
}

fn print_balances(address: &str, balances: &TokenBalances) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Token", "Balance"]);
    for (symbol, amount) in balances.iter() {
        table.add_row(vec![symbol.to_string(), formatted_amount(amount)]);
    }
    println!("Balances for {}", address);
    println!("{table}");
}

fn print_strategy(strategy: &Strategy) {
    let title = strategy.risk_level.title().unwrap_or("Strategy");
    println!();
    println!(
        "{} (risk {}) - APY {}",
        title,
        strategy.risk_level,
        strategy.apy_label()
    );
    if let Some(description) = strategy.risk_level.description() {
        println!("{}", description);
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Protocol", "Action", "Token", "Amount", "APY"]);
    for step in &strategy.steps {
        table.add_row(vec![
            step.protocol.clone(),
            format_action(&step.action.to_string()),
            step.token.clone(),
            formatted_amount(&step.amount.to_string()),
            format!("{:.1}%", step.expected_apy),
        ]);
    }
    println!("{table}");
    println!("{}", strategy.explanation);
    for factor in &strategy.risk_factors {
        println!("  ! {}", factor);
    }
}
