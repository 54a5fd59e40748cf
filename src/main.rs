use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

mod alert;
mod api;
mod config;
mod model;
mod price;
mod ui;
mod valuation;
mod withdraw;

use api::demo::DemoProvider;
use api::provider::PlatformProvider;
use api::rest::RestProvider;
use config::{Config, OperatingMode};
use model::withdrawal::{PayoutDetails, WithdrawalRequest};
use model::DashboardSnapshot;
use price::PriceOracle;

#[derive(Parser)]
#[command(name = "markinvest-console")]
#[command(about = "Terminal console for the MarkInvestment Bitcoin investment platform")]
struct Args {
    #[arg(long)]
    generate_config: bool,

    #[arg(short, long)]
    config: Option<String>,

    /// Render a single snapshot and exit instead of looping.
    #[arg(long)]
    once: bool,

    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Live dashboard (the default when no command is given)
    Dashboard,
    /// List the platform's investment plans
    Plans,
    /// Submit a withdrawal request
    Withdraw {
        #[arg(long)]
        amount_usd: Decimal,
        #[arg(long, value_enum)]
        method: PayoutMethodArg,
        /// Bitcoin destination address (bitcoin method)
        #[arg(long)]
        address: Option<String>,
        #[arg(long, default_value = "btc-mainnet")]
        network: String,
        /// Cash App cashtag, e.g. $satoshi (cashapp method)
        #[arg(long)]
        tag: Option<String>,
        /// PayPal account email (paypal method)
        #[arg(long)]
        email: Option<String>,
    },
    /// Show recent withdrawal requests
    Withdrawals,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PayoutMethodArg {
    Bitcoin,
    Cashapp,
    Paypal,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Warn)
            .init();
    }

    if args.generate_config {
        config::generate_sample_config()?;
        println!("✅ Sample configuration generated at config.toml");
        return Ok(());
    }

    let config = config::load_config(args.config.as_deref())?;

    match config.operating_mode {
        OperatingMode::Live => {
            info!("🚀 Starting in live mode against {}", config.api_base_url);
            let provider = RestProvider::new(&config)?;
            dispatch(provider, config, args).await
        }
        OperatingMode::Demo => {
            info!("🧪 Starting in demo mode with generated data");
            dispatch(DemoProvider::new(), config, args).await
        }
    }
}

async fn dispatch<P: PlatformProvider + Send + Sync + 'static>(
    provider: P,
    config: Config,
    args: Args,
) -> Result<()> {
    let provider = Arc::new(provider);
    let oracle = Arc::new(PriceOracle::new(&config)?);

    match args.command.unwrap_or(Command::Dashboard) {
        Command::Dashboard => {
            print_startup_banner();
            run_dashboard(provider, oracle, config, args.once).await
        }
        Command::Plans => show_plans(provider.as_ref(), &oracle).await,
        Command::Withdraw {
            amount_usd,
            method,
            address,
            network,
            tag,
            email,
        } => {
            let details = payout_details(method, address, network, tag, email)?;
            let request = WithdrawalRequest {
                amount_usd,
                details,
            };
            run_withdrawal(provider.as_ref(), &oracle, &config, request).await
        }
        Command::Withdrawals => show_withdrawals(provider.as_ref()).await,
    }
}

fn print_startup_banner() {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                     MARKINVESTMENT CONSOLE                   ║");
    println!("║                                                              ║");
    println!("║        BTC-denominated investment valuations, live ROI       ║");
    println!("║            progress and wallet status at a glance            ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

async fn run_dashboard<P: PlatformProvider + Send + Sync + 'static>(
    provider: Arc<P>,
    oracle: Arc<PriceOracle>,
    config: Config,
    once: bool,
) -> Result<()> {
    let mut interval = tokio::time::interval(Duration::from_millis(config.update_interval_ms));
    let mut update_counter: u64 = 0;

    info!("🔌 Backend status: {:?}", provider.status().await);
    info!(
        "📡 Starting refresh loop (interval: {}ms, once: {})",
        config.update_interval_ms, once
    );

    loop {
        interval.tick().await;
        update_counter += 1;

        let snapshot = refresh_snapshot(provider.as_ref(), &oracle).await;
        let alerts = alert::check_alerts(&snapshot, &config.alert_thresholds, Utc::now());

        print!("{}", ui::render(&snapshot, &alerts));

        if update_counter % 10 == 0 {
            info!(
                "📊 Refresh #{}: {} rows, price ${} (fallback: {})",
                update_counter,
                snapshot.rows.len(),
                snapshot.price.usd,
                snapshot.price.is_fallback
            );
        }

        if once {
            break;
        }
    }

    Ok(())
}

/// One refresh cycle. Wallet stats and the investment list are fetched
/// concurrently with no ordering between them; the price comes from the
/// shared oracle so every row on this cycle sees the same quote.
async fn refresh_snapshot<P: PlatformProvider + ?Sized>(
    provider: &P,
    oracle: &PriceOracle,
) -> DashboardSnapshot {
    let (wallet, investments) = tokio::join!(provider.wallet_stats(), provider.investments());
    let quote = oracle.spot().await;
    let now = Utc::now();

    let (rows, fetch_error) = match investments {
        Ok(raws) => (valuation::denominate_all(&raws, quote.usd, now), None),
        Err(e) => {
            error!("❌ Failed to fetch investments: {}", e);
            (Vec::new(), Some(e.to_string()))
        }
    };

    let wallet = match wallet {
        Ok(stats) => Some(stats),
        Err(e) => {
            error!("❌ Failed to fetch wallet stats: {}", e);
            None
        }
    };

    DashboardSnapshot {
        wallet,
        rows,
        price: quote,
        fetch_error,
        last_update: Some(now),
    }
}

async fn show_plans<P: PlatformProvider + ?Sized>(
    provider: &P,
    oracle: &PriceOracle,
) -> Result<()> {
    let plans = provider.plans().await?;
    let quote = oracle.spot().await;

    println!(
        "Investment plans (BTC minimums at ${}{}):",
        quote.usd,
        if quote.is_fallback { ", fallback price" } else { "" }
    );
    for plan in plans {
        println!(
            "  #{} {:<14} {:>3} days · {}% ROI · min ${} (≈ {} BTC) · {} · early withdrawal fee {} · {}",
            plan.id,
            plan.name,
            plan.duration_days,
            plan.roi_percentage.normalize(),
            plan.min_investment_usd,
            plan.min_investment_btc(quote.usd),
            plan.roi_payment,
            plan.early_withdrawal_fee,
            plan.category
        );
    }
    Ok(())
}

async fn run_withdrawal<P: PlatformProvider + ?Sized>(
    provider: &P,
    oracle: &PriceOracle,
    config: &Config,
    request: WithdrawalRequest,
) -> Result<()> {
    let quote = oracle.spot().await;
    let wallet = provider.wallet_stats().await?;

    if let Err(e) = withdraw::validate_withdrawal(
        &request,
        wallet.available_usd,
        &config.withdrawal_limits,
        &quote,
    ) {
        eprintln!("❌ Withdrawal rejected: {}", e);
        std::process::exit(1);
    }

    let record = provider.submit_withdrawal(&request).await?;
    println!(
        "✅ Withdrawal submitted: ${} via {} (status: {})",
        request.amount_usd,
        request.details.method(),
        record.status
    );
    Ok(())
}

async fn show_withdrawals<P: PlatformProvider + ?Sized>(provider: &P) -> Result<()> {
    let records = provider.recent_withdrawals().await?;
    if records.is_empty() {
        println!("No withdrawals yet.");
        return Ok(());
    }
    for record in records {
        let id = record
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "?".to_string());
        let amount = record
            .amount_usd
            .map(|a| format!("${}", a))
            .unwrap_or_else(|| "?".to_string());
        let mut line = format!(
            "  {} · {} · {} · {} {}",
            id,
            amount,
            record.payout_method.unwrap_or_else(|| "?".to_string()),
            record.status,
            record.created_at
        );
        if let Some(completed) = record.completed_at {
            line.push_str(&format!(" · completed {}", completed));
        }
        if let Some(tx) = record.transaction_id {
            line.push_str(&format!(" · tx {}", tx));
        }
        println!("{}", line);
    }
    Ok(())
}

fn payout_details(
    method: PayoutMethodArg,
    address: Option<String>,
    network: String,
    tag: Option<String>,
    email: Option<String>,
) -> Result<PayoutDetails> {
    match method {
        PayoutMethodArg::Bitcoin => {
            let address =
                address.ok_or_else(|| anyhow::anyhow!("--address is required for bitcoin"))?;
            Ok(PayoutDetails::Bitcoin { address, network })
        }
        PayoutMethodArg::Cashapp => {
            let tag = tag.ok_or_else(|| anyhow::anyhow!("--tag is required for cashapp"))?;
            Ok(PayoutDetails::CashApp { tag })
        }
        PayoutMethodArg::Paypal => {
            let email = email.ok_or_else(|| anyhow::anyhow!("--email is required for paypal"))?;
            Ok(PayoutDetails::PayPal { email })
        }
    }
}
