use clap::Parser;
use miette::{IntoDiagnostic, Result};
use payhub::application::context::{AppContext, Settings};
use payhub::application::repository::TRANSACTION_LIMIT_DEFAULT;
use payhub::domain::transaction::PaymentSource;
use payhub::telemetry;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Semicolon-separated price list (Product;Price;Currency)
    #[arg(long, env = "PRICES_CSV_PATH")]
    prices: PathBuf,

    /// JSON export of Stripe charges
    #[arg(long, env = "STRIPE_FEED")]
    stripe_feed: Option<PathBuf>,

    /// JSON export of Vipps payments
    #[arg(long, env = "VIPPS_FEED")]
    vipps_feed: Option<PathBuf>,

    /// JSON export of Zettle purchases
    #[arg(long, env = "ZETTLE_FEED")]
    zettle_feed: Option<PathBuf>,

    /// Number of transactions to print, newest first
    #[arg(long, default_value_t = TRANSACTION_LIMIT_DEFAULT)]
    limit: usize,

    /// Print a single transaction by its provider id instead of the latest ones
    #[arg(long)]
    id: Option<String>,

    /// Seconds between background fetches from each provider
    #[arg(long, default_value_t = 300)]
    poll_interval_secs: u64,

    /// Keep polling providers until interrupted
    #[arg(long)]
    watch: bool,
}

impl Cli {
    fn settings(&self) -> Settings {
        let feeds = [
            (PaymentSource::Stripe, &self.stripe_feed),
            (PaymentSource::Vipps, &self.vipps_feed),
            (PaymentSource::Zettle, &self.zettle_feed),
        ];
        feeds
            .into_iter()
            .filter_map(|(source, path)| path.as_ref().map(|p| (source, p)))
            .fold(Settings::new(&self.prices), |settings, (source, path)| {
                settings.with_feed(source, path)
            })
            .with_poll_interval(Duration::from_secs(self.poll_interval_secs))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();
    let cli = Cli::parse();

    let context = AppContext::build(&cli.settings()).await.into_diagnostic()?;

    // Every configured feed is read before anything is printed.
    if let Err(e) = context.service().refresh_cache().await {
        warn!(error = %e, "Initial cache refresh failed");
    }
    if cli.watch {
        context.start().await;
    }

    let output = if let Some(id) = &cli.id {
        context
            .service()
            .get_transaction_by_id(id)
            .await
            .and_then(|tx| Ok(serde_json::to_string_pretty(&tx)?))
    } else {
        context
            .service()
            .get_transactions(cli.limit)
            .await
            .and_then(|txs| Ok(serde_json::to_string_pretty(&txs)?))
    };

    let output = match output {
        Ok(output) => output,
        Err(e) => {
            context.shutdown().await;
            return Err(e).into_diagnostic();
        }
    };

    let stdout = io::stdout();
    writeln!(stdout.lock(), "{}", output).into_diagnostic()?;

    if cli.watch {
        info!("Watching providers, press Ctrl-C to stop");
        tokio::signal::ctrl_c().await.into_diagnostic()?;
    }

    context.shutdown().await;
    Ok(())
}
