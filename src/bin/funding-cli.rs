use clap::{Parser, Subcommand};
use std::path::PathBuf;

use funding_engine::config::loader::load_config;
use funding_engine::config::EngineConfig;
use funding_engine::custody::crypto::{MasterKey, SecretBox};
use funding_engine::ledger::amount::Amount;
use funding_engine::ledger::asset::Asset;
use funding_engine::ledger::envelope::TransactionEnvelope;
use funding_engine::ledger::horizon::HorizonClient;
use funding_engine::ledger::strkey;
use funding_engine::settlement::service::SettlementService;
use funding_engine::ledger::factory::TxFactory;

#[derive(Parser)]
#[command(name = "funding-cli")]
#[command(about = "Ops CLI for the funding engine", long_about = None)]
struct Cli {
    /// Path to the engine TOML config
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an issuer keypair and print the encrypted seed
    Keygen,
    /// Decode and pretty-print a base64 envelope
    DecodeEnvelope { envelope: String },
    /// Re-verify a payment hash against the ledger
    Verify {
        tx_hash: String,
        destination: String,
        amount: String,
        /// "native", "XLM" or "CODE:ISSUER"
        asset: String,
    },
    /// Fetch an account's sequence number and balances
    Account { account_id: String },
    /// Build an unsigned payment envelope and print its base64 wire form
    BuildPayment {
        source: String,
        destination: String,
        amount: String,
        #[arg(default_value = "native")]
        asset: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    funding_engine::observability::logging::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    let horizon = std::sync::Arc::new(HorizonClient::new(
        &config.network,
        config.timeouts.horizon_secs,
    )?);

    match cli.command {
        Commands::Keygen => {
            let master_key = MasterKey::from_config(&config.custody)?;
            let signing_key = ed25519_dalek::SigningKey::generate(&mut rand::rngs::OsRng);
            let public = strkey::encode_account_id(signing_key.verifying_key().as_bytes());
            let seed = strkey::encode_seed(&signing_key.to_bytes());
            let encrypted = SecretBox::encrypt(&master_key, seed.as_bytes())?.to_base64();
            println!("public_key:       {}", public);
            println!("encrypted_secret: {}", encrypted);
        }
        Commands::DecodeEnvelope { envelope } => {
            let decoded = TransactionEnvelope::from_base64(&envelope)?;
            println!("{}", serde_json::to_string_pretty(&decoded)?);
            println!("hash: {}", decoded.hash_hex());
        }
        Commands::Verify {
            tx_hash,
            destination,
            amount,
            asset,
        } => {
            let settlement = SettlementService::new(horizon, &config.retries);
            let verdict = settlement
                .verify_payment(
                    &tx_hash,
                    &destination,
                    Amount::parse(&amount)?,
                    &Asset::parse(&asset)?,
                )
                .await?;
            match verdict.error {
                None => println!("valid: settled payment matches"),
                Some(reason) => println!("invalid: {}", reason),
            }
        }
        Commands::Account { account_id } => {
            let account = horizon.load_account(&account_id).await?;
            println!("sequence: {}", account.sequence);
            for balance in &account.balances {
                match (&balance.asset_code, &balance.asset_issuer) {
                    (Some(code), Some(issuer)) => {
                        println!("{} {}:{}", balance.balance, code, issuer)
                    }
                    _ => println!("{} native", balance.balance),
                }
            }
        }
        Commands::BuildPayment {
            source,
            destination,
            amount,
            asset,
        } => {
            let factory = TxFactory::new(horizon, config.network.passphrase.clone());
            let envelope = factory
                .build_payment(
                    &source,
                    &destination,
                    Amount::parse(&amount)?,
                    Asset::parse(&asset)?,
                    None,
                )
                .await?;
            println!("{}", envelope.to_base64()?);
        }
    }

    Ok(())
}
