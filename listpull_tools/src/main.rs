use clap::{Args, Parser, Subcommand};
use listpull_engine::db_types::EmailStatus;
use rust_decimal::Decimal;
use tcg_pricing::{AlertDirection, RepricingStrategy};

mod formatting;
mod price_tracking;
mod pricing;
mod queue;

#[derive(Parser, Debug)]
#[command(version, about = "Operator tools for the ListPull order server")]
pub struct Arguments {
    /// The SQLite database to use. Defaults to LP_DATABASE_URL.
    #[arg(short = 'd', long = "database-url", global = true)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the database if needed and apply any outstanding migrations
    Migrate,
    #[command(subcommand)]
    /// Inspect or tidy up the customer email queue
    Queue(QueueCommand),
    /// Reprice a TCGplayer inventory export and write an upload-ready CSV
    Reprice(RepriceParams),
    /// Check whether a price move would trigger a watch-list alert
    #[command(name = "price-alert")]
    PriceAlert(PriceAlertParams),
    #[command(subcommand)]
    /// Track market prices from JustTCG and manage the watch list
    Prices(PricesCommand),
}

#[derive(Debug, Subcommand)]
pub enum PricesCommand {
    /// Start tracking products by TCGplayer id, fetching their current prices
    Track {
        #[arg(required = true, num_args = 1..)]
        tcgplayer_ids: Vec<String>,
    },
    /// Fetch fresh prices for every tracked product, then check the price alerts
    Refresh,
    /// Search JustTCG for cards by name
    Search {
        /// pokemon, magic, onepiece or lorcana
        #[arg(short = 'g', long = "game", default_value = "magic")]
        game: String,
        #[arg(required = true, index = 1)]
        query: String,
    },
    /// Show the daily price history of a tracked product variant
    History {
        #[arg(required = true, index = 1)]
        product_id: i64,
        #[arg(short = 'v', long = "variant", default_value = "Normal")]
        variant: String,
    },
    /// Put a tracked product variant on the watch list
    Watch {
        #[arg(required = true, index = 1)]
        product_id: i64,
        #[arg(short = 'v', long = "variant", default_value = "Normal")]
        variant: String,
        #[arg(short = 'n', long = "notes")]
        notes: Option<String>,
    },
    /// Take an item off the watch list. Its alerts stop firing.
    Unwatch {
        #[arg(required = true, index = 1)]
        id: i64,
    },
    /// List the active watch list
    Watchlist,
    /// Add a price alert to a watch list item
    Alert {
        #[arg(required = true, index = 1)]
        watchlist_id: i64,
        /// The percentage move that fires the alert
        #[arg(short = 't', long = "threshold", default_value = "10")]
        threshold_pct: Decimal,
        /// up, down or both
        #[arg(short = 'r', long = "direction", default_value = "both")]
        direction: AlertDirection,
        /// Informational label for the alert's time window, e.g. 24h or 7d
        #[arg(short = 'w', long = "window")]
        window: Option<String>,
    },
    /// Check every armed alert against the latest prices
    CheckAlerts,
    /// List alerts that have fired, most recent first
    Alerts,
    /// Mark a fired alert as seen
    Ack {
        #[arg(required = true, index = 1)]
        id: i64,
    },
}

#[derive(Debug, Subcommand)]
pub enum QueueCommand {
    /// List email jobs, newest last
    List {
        /// Only show jobs with this status (pending, sent, failed)
        #[arg(short = 's', long = "status")]
        status: Option<EmailStatus>,
    },
    /// Show the details of a single email job
    Show {
        #[arg(required = true, index = 1)]
        id: i64,
    },
    /// Delete sent and failed jobs that are past the retention window
    Cleanup,
}

#[derive(Debug, Args)]
pub struct RepriceParams {
    /// The TCGplayer inventory export to reprice
    #[arg(required = true, index = 1)]
    input: String,
    /// Where to write the repriced CSV. Defaults to `repriced_inventory.csv`
    #[arg(short = 'o', long = "output", default_value = "repriced_inventory.csv")]
    output: String,
    /// match_low, undercut or match_market
    #[arg(short = 's', long = "strategy", default_value = "match_low")]
    strategy: RepricingStrategy,
    /// Percentage to undercut the TCG low price by, when using the undercut strategy
    #[arg(short = 'u', long = "undercut", default_value = "5")]
    undercut_pct: Decimal,
    /// Never price a listing below this
    #[arg(short = 'f', long = "floor")]
    floor_price: Option<Decimal>,
    /// Print the changes without writing the output file
    #[arg(long = "dry-run")]
    dry_run: bool,
}

#[derive(Debug, Args)]
pub struct PriceAlertParams {
    /// The previous market price
    #[arg(required = true, index = 1)]
    old_price: Decimal,
    /// The latest market price
    #[arg(required = true, index = 2)]
    new_price: Decimal,
    /// The percentage move that triggers the alert
    #[arg(short = 't', long = "threshold", default_value = "10")]
    threshold_pct: Decimal,
    /// up, down or both
    #[arg(short = 'r', long = "direction", default_value = "both")]
    direction: AlertDirection,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();
    let cli = Arguments::parse();
    let url = cli.database_url;
    match cli.command {
        Command::Migrate => queue::run_migrations(url).await,
        Command::Queue(cmd) => queue::handle_queue_command(url, cmd).await,
        Command::Reprice(params) => pricing::reprice_file(params),
        Command::PriceAlert(params) => pricing::print_price_alert(params),
        Command::Prices(cmd) => price_tracking::handle_prices_command(url, cmd).await,
    }
}
