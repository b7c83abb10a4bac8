//! # Greeting Monitor
//!
//! CLI for the xGreet SDK: backfills the cross-chain greeting history from
//! destination-chain logs, optionally follows live updates, and optionally
//! runs a quote estimate for a payment amount.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin greeting_monitor -- --watch
//! cargo run --bin greeting_monitor -- --amount 1000000
//! ```
//!
//! Press Ctrl+C to stop gracefully when watching.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use ethers::types::{Address, U256};
use tokio::signal;

use xgreet_sdk::bridge_quoter::HttpBridgeQuoter;
use xgreet_sdk::{
    GreeterChainClient, GreetingSyncConfig, GreetingSyncService, QuoteInput, QuoteRefresher,
    Settings,
};

const ARBITRUM_USDT: &str = "0xFd086bC7CD5C481DCC9C85ebE478A1C0b69FCbb9";
const POLYGON_WETH: &str = "0x7ceB23fD6bC0adD59E62ac25578270cFf1b9f619";

#[derive(Parser, Debug)]
#[command(name = "greeting_monitor", about = "Backfill and watch cross-chain greetings")]
struct Args {
    /// Settings file
    #[arg(long, default_value = "Config.toml")]
    config: String,

    /// Keep following live GreetingUpdated events after the backfill
    #[arg(long)]
    watch: bool,

    /// Payment amount (origin asset base units) to quote, e.g. 1000000 for 1 USDT
    #[arg(long)]
    amount: Option<String>,

    /// Origin asset to pay with
    #[arg(long, default_value = ARBITRUM_USDT)]
    from_asset: String,

    /// Asset the destination contract is paid in
    #[arg(long, default_value = POLYGON_WETH)]
    to_asset: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    env_logger::init();

    let args = Args::parse();

    println!("🚀 Starting Greeting Monitor");
    println!("═══════════════════════════════════════════════════════════════════\n");

    // 1. Load settings
    let settings = Settings::from_file(&args.config)
        .with_context(|| format!("failed to load settings from {}", args.config))?;
    println!("✅ Settings loaded");

    // 2. Destination chain client (greeting history lives there)
    let greeter_address: Address = settings
        .greeter
        .address
        .parse()
        .context("invalid greeter contract address")?;
    let mut client = GreeterChainClient::new(&settings.destination.rpc_url, greeter_address)?;
    if let Some(ws_url) = &settings.destination.ws_url {
        client = client.with_ws_url(ws_url.clone());
    }
    let client = Arc::new(client);
    println!("✅ Chain client ready ({})", settings.destination.rpc_url);

    // 3. Backfill
    let service = GreetingSyncService::new(
        Arc::clone(&client),
        GreetingSyncConfig {
            blocks_lookback: settings.greeter.blocks_lookback,
            max_blocks_per_call: settings.greeter.max_blocks_per_call,
            max_retained: settings.greeter.max_retained_greetings,
        },
    );

    match service.backfill().await {
        Ok(_) => println!("✅ Backfill complete"),
        Err(e) => println!("⚠️ Backfill incomplete, showing partial history: {e:#}"),
    }

    println!("\n📜 Greeting history (most recent first):");
    for (i, greeting) in service.feed().snapshot().iter().enumerate() {
        println!("  {}. {}", i + 1, greeting);
    }

    // 4. Optional quote
    if let Some(amount) = &args.amount {
        run_quote(&settings, &args, amount).await?;
    }

    // 5. Optional live tail
    if args.watch {
        let watcher = service.start_tail_watcher().await?;
        let mut feed_rx = service.feed().subscribe();
        println!("\n👀 Watching for new greetings (Ctrl+C to stop)...");

        loop {
            tokio::select! {
                _ = signal::ctrl_c() => {
                    println!("\n🛑 Shutting down");
                    watcher.unsubscribe().await;
                    break;
                }
                changed = feed_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    if let Some(head) = feed_rx.borrow().first() {
                        println!("✨ New greeting: {head}");
                    }
                }
            }
        }
    }

    Ok(())
}

async fn run_quote(settings: &Settings, args: &Args, amount: &str) -> Result<()> {
    let amount_in = U256::from_dec_str(amount).context("invalid --amount")?;
    let from_asset: Address = args.from_asset.parse().context("invalid --from-asset")?;
    let to_asset: Address = args.to_asset.parse().context("invalid --to-asset")?;

    let quoter = Arc::new(HttpBridgeQuoter::new(
        &settings.quote.api_base_url,
        settings.quote.api_key.clone(),
    )?);
    let (refresher, mut errors) = QuoteRefresher::spawn(
        quoter,
        Duration::from_millis(settings.quote.debounce_ms),
    );

    println!("\n💱 Requesting quote for {amount} base units...");
    let mut quotes = refresher.quotes();
    refresher.submit(QuoteInput {
        origin_domain: settings.origin.domain_id.clone(),
        destination_domain: settings.destination.domain_id.clone(),
        from_asset,
        to_asset,
        amount_in,
    });

    tokio::select! {
        changed = quotes.changed() => {
            if changed.is_ok() {
                if let Some(quote) = quotes.borrow().clone() {
                    println!("  relayer fee: {} wei", quote.relayer_fee);
                    match quote.amount_out {
                        Some(out) => println!("  amount received: {out}"),
                        None => println!("  amount received: unavailable for this pair"),
                    }
                }
            }
        }
        Some(err) = errors.recv() => {
            println!("  ⚠️ quote failed: {err}");
        }
        _ = tokio::time::sleep(Duration::from_secs(30)) => {
            println!("  ⚠️ quote timed out");
        }
    }

    refresher.shutdown().await;
    Ok(())
}
