//! StashCraft CLI
//!
//! Regenerates merkle claim ledgers and inspects the files they leave behind.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use stashcraft_aggregator::{LedgerStore, RegenerateRequest, Regenerator};
use stashcraft_core::{
    checksum, hash_hex, parse_address, today_stamp, LedgerSnapshot, RewardRow,
};
use stashcraft_prover::verify_snapshot;
use stashcraft_settings::{default_settings_path, Settings};
use stashcraft_settlement::StashClient;

/// StashCraft - merkle claim ledger regeneration
#[derive(Parser)]
#[command(name = "stashcraft")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ledger root directory (overrides settings)
    #[arg(long, global = true)]
    ledger_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the next cycle's ledger, carrying over unclaimed amounts
    Regenerate {
        /// Distribution symbol (ledger sub-directory)
        #[arg(short, long)]
        symbol: String,

        /// Token contract address
        #[arg(short, long)]
        address: String,

        /// CSV file with `address,amount` rows
        #[arg(long)]
        csv: PathBuf,

        /// Cycle date stamp (YYYYMMDD), defaults to today in UTC
        #[arg(short, long)]
        date: Option<String>,

        /// JSON-RPC endpoint (overrides settings)
        #[arg(long)]
        rpc_url: Option<String>,
    },

    /// Check every proof of a ledger against its root
    Verify {
        /// Distribution symbol
        #[arg(short, long)]
        symbol: String,

        /// Archived cycle to check instead of latest.json
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Print one account's claim as JSON
    Proof {
        /// Distribution symbol
        #[arg(short, long)]
        symbol: String,

        /// Claimant address
        #[arg(long)]
        account: String,

        /// Archived cycle to read instead of latest.json
        #[arg(short, long)]
        date: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    stashcraft_logging::init(cli.verbose);

    let config_path = cli.config.clone().unwrap_or_else(default_settings_path);
    let settings = Settings::load_from(&config_path)
        .with_context(|| format!("loading settings from {}", config_path.display()))?;
    let ledger_root = cli
        .ledger_dir
        .clone()
        .unwrap_or_else(|| settings.ledger.root_dir.clone());
    debug!("Ledger root: {}", ledger_root.display());

    match cli.command {
        Commands::Regenerate {
            symbol,
            address,
            csv,
            date,
            rpc_url,
        } => {
            regenerate(&settings, &ledger_root, &symbol, &address, &csv, date, rpc_url).await?;
        }
        Commands::Verify { symbol, date } => {
            verify(&ledger_root, &symbol, date.as_deref())?;
        }
        Commands::Proof {
            symbol,
            account,
            date,
        } => {
            proof(&ledger_root, &symbol, &account, date.as_deref())?;
        }
    }

    Ok(())
}

// ============================================================================
// Regenerate
// ============================================================================

async fn regenerate(
    settings: &Settings,
    ledger_root: &Path,
    symbol: &str,
    address: &str,
    csv_path: &Path,
    date: Option<String>,
    rpc_url: Option<String>,
) -> Result<()> {
    let token = parse_address(address)?;
    let date = match date {
        Some(date) => date,
        None => today_stamp()?,
    };

    let rows = read_rows(csv_path)?;
    info!("Read {} rows from {}", rows.len(), csv_path.display());

    let mut stash = settings.oracle.stash_config()?;
    if let Some(url) = rpc_url {
        stash.rpc_url = url;
    }
    let oracle = StashClient::new(stash);
    let regenerator = Regenerator::new(oracle, LedgerStore::new(ledger_root, symbol));

    let outcome = regenerator
        .run(&RegenerateRequest {
            symbol: symbol.to_string(),
            token,
            date,
            rows,
        })
        .await?;

    let snapshot = &outcome.snapshot;
    println!("Ledger: {}", outcome.saved.latest.display());
    println!("Token:  {}", checksum(&snapshot.address));
    println!("Date:   {}", snapshot.date);
    println!(
        "Root:   {}",
        snapshot
            .merkle_root
            .as_ref()
            .map(hash_hex)
            .unwrap_or_else(|| "(empty)".to_string())
    );
    println!("Total:  {}", snapshot.total);
    println!("Claims: {}", snapshot.claims.len());
    println!(
        "Carried over: {} ({}), already claimed: {} ({})",
        outcome.carry_over.carried,
        outcome.carry_over.carried_amount,
        outcome.carry_over.claimed,
        outcome.carry_over.claimed_amount,
    );
    if let Some(archived) = &outcome.saved.archived {
        println!("Archived previous cycle to {}", archived.display());
    }

    Ok(())
}

/// Read `address,amount` rows. Fields are trimmed and blank lines skipped.
fn read_rows(path: &Path) -> Result<Vec<RewardRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let mut rows = Vec::new();
    for (line, record) in reader.deserialize::<RewardRow>().enumerate() {
        let row = record.with_context(|| format!("{}: row {}", path.display(), line + 1))?;
        rows.push(row);
    }
    Ok(rows)
}

// ============================================================================
// Inspection
// ============================================================================

fn open_ledger(ledger_root: &Path, symbol: &str, date: Option<&str>) -> Result<LedgerSnapshot> {
    let store = LedgerStore::new(ledger_root, symbol);
    match date {
        Some(date) => Ok(store.load_archive(date)?),
        None => store
            .load_latest()?
            .with_context(|| format!("no ledger at {}", store.latest_path().display())),
    }
}

fn verify(ledger_root: &Path, symbol: &str, date: Option<&str>) -> Result<()> {
    let snapshot = open_ledger(ledger_root, symbol, date)?;
    verify_snapshot(&snapshot)?;

    println!(
        "{} {}: {} claims verified against {}",
        snapshot.symbol,
        snapshot.date,
        snapshot.claims.len(),
        snapshot
            .merkle_root
            .as_ref()
            .map(hash_hex)
            .unwrap_or_else(|| "(empty)".to_string())
    );
    Ok(())
}

fn proof(ledger_root: &Path, symbol: &str, account: &str, date: Option<&str>) -> Result<()> {
    let snapshot = open_ledger(ledger_root, symbol, date)?;
    let account = parse_address(account)?;
    let Some(claim) = snapshot.claims.get(&account) else {
        bail!("{} has no claim in {} {}", checksum(&account), symbol, snapshot.date);
    };

    let output = serde_json::json!({
        "account": checksum(&account),
        "index": claim.index,
        "amount": claim.amount.to_string(),
        "proof": claim.proof.iter().map(hash_hex).collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
