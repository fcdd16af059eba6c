//! Custody signing relay CLI.
//!
//! # Architecture Overview
//!
//! ```text
//!   CLI command
//!       │
//!       ▼
//!   ┌──────────────┐     ┌──────────────┐     ┌───────────────────┐
//!   │ claims       │────▶│ pool         │────▶│ signing           │──▶ custody API
//!   │ workflow /   │     │ SessionPool  │     │ payload → driver  │
//!   │ batch runner │     │ + sweeper    │     │ → decode          │
//!   └──────┬───────┘     └──────┬───────┘     └───────────────────┘
//!          │                    │
//!          ▼                    ▼
//!     claim API          ┌──────────────┐
//!                        │ ledger       │──▶ indexer
//!                        │ select →     │
//!                        │ assemble →   │
//!                        │ serialize    │
//!                        └──────────────┘
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use custody_relay::blockchain::{Chain, HttpIndexer};
use custody_relay::claims::{
    read_accounts, AllocationChecker, BatchOptions, BatchRunner, ClaimApi, ClaimOutcome, ClaimWorkflow,
    HttpClaimApi,
};
use custody_relay::config::{load_config, validate_config, RelayConfig};
use custody_relay::ledger::{CardanoSerializer, TransferRequest};
use custody_relay::lifecycle::Shutdown;
use custody_relay::observability::logging;
use custody_relay::pool::{CustodySessionFactory, PoolSweeper, SessionPool};
use custody_relay::signing::HttpRemoteSigner;

#[derive(Parser)]
#[command(name = "custody-relay")]
#[command(about = "Token claims and transfers through a remote custody signer", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the claimable allocation of an account
    Check {
        #[arg(long)]
        account: String,
        /// Custody asset id, e.g. ADA or ETH_TEST5
        #[arg(long)]
        asset: String,
    },
    /// Look up the allocation of every account in a CSV export
    Allocations {
        /// CSV with Account Id, Account Name, Asset Id, Claimable Amount
        #[arg(long)]
        input: PathBuf,
        /// Where to write the allocations CSV
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// List existing claims of an account
    History {
        #[arg(long)]
        account: String,
        #[arg(long)]
        asset: String,
    },
    /// Sign and submit a claim for one account
    Claim {
        #[arg(long)]
        account: String,
        #[arg(long)]
        asset: String,
        /// Address that receives the claimed tokens
        #[arg(long)]
        destination: String,
    },
    /// Build and sign a Cardano token transfer
    Transfer {
        #[arg(long)]
        account: String,
        #[arg(long)]
        recipient: String,
        /// Policy id followed by hex asset name
        #[arg(long)]
        token_unit: String,
        #[arg(long)]
        amount: u64,
        /// Submit the signed transaction through the indexer
        #[arg(long)]
        broadcast: bool,
    },
    /// Claim for every account in a CSV export
    Batch {
        /// CSV with Account Id, Account Name, Asset Id, Claimable Amount
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        destination: String,
        /// Where to write the CSV report after each batch
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

type Pool = SessionPool<CustodySessionFactory>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => {
            let config = RelayConfig::default();
            if let Err(errors) = validate_config(&config) {
                for e in &errors {
                    eprintln!("config: {}", e);
                }
                return Err("invalid default configuration".into());
            }
            config
        }
    };

    logging::init(&config.observability).map_err(|e| e.to_string())?;
    tracing::info!("custody-relay v{} starting", env!("CARGO_PKG_VERSION"));

    let signer = Arc::new(HttpRemoteSigner::new(&config.signer)?);
    let indexer = Arc::new(HttpIndexer::new(&config.indexer)?);
    let claims: Arc<dyn ClaimApi> = Arc::new(HttpClaimApi::new(&config.claims)?);
    let factory = CustodySessionFactory::new(&config, signer, indexer, Arc::new(CardanoSerializer));
    let pool = Arc::new(SessionPool::new(factory, &config.pool));

    let shutdown = Shutdown::new();
    let sweeper = PoolSweeper::new(pool.clone(), config.pool.sweep_interval());
    let sweeper_handle = tokio::spawn(sweeper.run(shutdown.subscribe()));

    let result = tokio::select! {
        result = execute(cli.command, &config, pool.clone(), claims) => result,
        _ = shutdown.trigger_on_ctrl_c() => Ok(()),
    };

    shutdown.trigger();
    let _ = sweeper_handle.await;
    let dropped = pool.shutdown();
    tracing::info!(sessions = dropped, "Shutdown complete");

    result
}

async fn execute(
    command: Commands,
    config: &RelayConfig,
    pool: Arc<Pool>,
    claims: Arc<dyn ClaimApi>,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Check { account, asset } => {
            let chain = Chain::from_asset_id(&asset)?;
            let address = session_address(&pool, &account, chain).await?;
            let allocation = claims.check_eligibility(chain, &address).await?;
            print_json(&serde_json::json!({
                "account": account,
                "chain": chain.as_str(),
                "address": address,
                "eligible": allocation.is_some(),
                "value": allocation.map(|a| a.value),
            }))?;
        }
        Commands::Allocations { input, report } => {
            let rows = read_accounts(&input)?;
            let workflow = ClaimWorkflow::new(pool, claims, config.claims.terms_hash.clone());
            let checker = AllocationChecker::new(workflow, BatchOptions::from(&config.claims));
            let report = checker.run(&rows, report.as_deref()).await?;
            print_json(&serde_json::json!({
                "checked": report.rows.len(),
                "found": report.found(),
                "skipped": report.skipped,
            }))?;
        }
        Commands::History { account, asset } => {
            let chain = Chain::from_asset_id(&asset)?;
            let address = session_address(&pool, &account, chain).await?;
            let history = claims.claim_history(chain, &address).await?;
            print_json(&serde_json::json!({
                "account": account,
                "chain": chain.as_str(),
                "address": address,
                "claims": history,
            }))?;
        }
        Commands::Claim { account, asset, destination } => {
            let chain = Chain::from_asset_id(&asset)?;
            let workflow = ClaimWorkflow::new(pool, claims, config.claims.terms_hash.clone());
            let outcome = workflow.process(&account, chain, &destination).await?;
            let body = match outcome {
                ClaimOutcome::Unclaimable => serde_json::json!({ "status": "unclaimable" }),
                ClaimOutcome::AlreadyClaimed { claims } => {
                    serde_json::json!({ "status": "already_claimed", "claims": claims })
                }
                ClaimOutcome::Claimed { amount, receipt } => {
                    serde_json::json!({ "status": "claimed", "amount": amount, "receipt": receipt })
                }
            };
            print_json(&body)?;
        }
        Commands::Transfer { account, recipient, token_unit, amount, broadcast } => {
            let request = TransferRequest {
                recipient,
                token_unit,
                token_amount: amount,
                fee: config.transfer.fee,
                recipient_min: config.transfer.recipient_min,
                change_min: config.transfer.change_min,
            };
            let session = pool.acquire(&account, Chain::Cardano).await?;
            let result = async {
                let signed = session.transfer(&request).await?;
                let submitted = if broadcast {
                    Some(session.broadcast(&signed).await?)
                } else {
                    None
                };
                Ok::<_, custody_relay::RelayError>((signed, submitted))
            }
            .await;
            pool.release(&account);

            let (signed, submitted) = result?;
            print_json(&serde_json::json!({
                "txHash": signed.tx_hash,
                "cbor": signed.cbor_hex,
                "submitted": submitted,
            }))?;
        }
        Commands::Batch { input, destination, report } => {
            let rows = read_accounts(&input)?;
            let workflow = ClaimWorkflow::new(pool, claims, config.claims.terms_hash.clone());
            let runner = BatchRunner::new(workflow, BatchOptions::from(&config.claims));
            let report = runner.run(&rows, &destination, report.as_deref()).await?;
            print_json(&report.totals)?;
        }
    }
    Ok(())
}

async fn session_address(
    pool: &Pool,
    account: &str,
    chain: Chain,
) -> Result<String, custody_relay::RelayError> {
    let session = pool.acquire(account, chain).await;
    pool.release(account);
    Ok(session?.address().to_string())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
