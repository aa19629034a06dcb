use chrono::Utc;
use listpull_engine::{PriceTrackerApi, SqliteDatabase};
use tcg_pricing::justtcg::{JustTcgClient, JustTcgConfig};

use crate::{
    formatting::{format_fired_alerts, format_price_history, format_search_results, format_triggered, format_watchlist},
    queue::open_database,
    PricesCommand,
};

fn justtcg_client() -> JustTcgClient {
    let config = JustTcgConfig::new_from_env_or_default();
    if !config.is_enabled() {
        eprintln!("Set LP_JUSTTCG_API_KEY to fetch prices from JustTCG");
        std::process::exit(1);
    }
    match JustTcgClient::new(config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        },
    }
}

pub async fn handle_prices_command(url: Option<String>, command: PricesCommand) {
    if let PricesCommand::Search { game, query } = &command {
        return search(game, query).await;
    }
    let api = PriceTrackerApi::new(open_database(url).await);
    match command {
        PricesCommand::Track { tcgplayer_ids } => track(&api, &tcgplayer_ids).await,
        PricesCommand::Refresh => refresh(&api).await,
        // Handled above, without a database
        PricesCommand::Search { .. } => {},
        PricesCommand::History { product_id, variant } => match api.history(product_id, &variant).await {
            Ok(history) => println!("{}", format_price_history(&history)),
            Err(e) => eprintln!("Could not fetch the price history. {e}"),
        },
        PricesCommand::Watch { product_id, variant, notes } => {
            match api.watch(product_id, &variant, notes.as_deref(), Utc::now()).await {
                Ok(item) => println!("{product_id} ({variant}) is watch list item #{}", item.id),
                Err(e) => eprintln!("Could not watch {product_id}. {e}"),
            }
        },
        PricesCommand::Unwatch { id } => match api.unwatch(id).await {
            Ok(()) => println!("Watch list item #{id} removed"),
            Err(e) => eprintln!("Could not remove watch list item #{id}. {e}"),
        },
        PricesCommand::Watchlist => match api.watchlist().await {
            Ok(items) => println!("{}", format_watchlist(&items)),
            Err(e) => eprintln!("Could not fetch the watch list. {e}"),
        },
        PricesCommand::Alert { watchlist_id, threshold_pct, direction, window } => {
            match api.add_alert(watchlist_id, threshold_pct, direction, window.as_deref()).await {
                Ok(alert) => println!("Alert #{} fires on a {} move {direction}", alert.id, alert.threshold_bps),
                Err(e) => eprintln!("Could not add the alert. {e}"),
            }
        },
        PricesCommand::CheckAlerts => check_alerts(&api).await,
        PricesCommand::Alerts => match api.triggered_alerts().await {
            Ok(alerts) => println!("{}", format_fired_alerts(&alerts)),
            Err(e) => eprintln!("Could not fetch alerts. {e}"),
        },
        PricesCommand::Ack { id } => match api.acknowledge(id).await {
            Ok(()) => println!("Alert #{id} acknowledged"),
            Err(e) => eprintln!("Could not acknowledge alert #{id}. {e}"),
        },
    }
}

async fn search(game: &str, query: &str) {
    match justtcg_client().search_cards(game, query).await {
        Ok(cards) => println!("{}", format_search_results(&cards.data)),
        Err(e) => eprintln!("Search failed. {e}"),
    }
}

async fn track(api: &PriceTrackerApi<SqliteDatabase>, ids: &[String]) {
    let client = justtcg_client();
    match api.track(&client, ids, Utc::now()).await {
        Ok(summary) => println!("{} products tracked, {} errors", summary.updated, summary.errors),
        Err(e) => eprintln!("Could not track products. {e}"),
    }
}

async fn refresh(api: &PriceTrackerApi<SqliteDatabase>) {
    let client = justtcg_client();
    match api.refresh_prices(&client, Utc::now()).await {
        Ok(summary) => println!("{} products updated, {} errors", summary.updated, summary.errors),
        Err(e) => {
            eprintln!("Refresh failed. {e}");
            return;
        },
    }
    check_alerts(api).await;
}

async fn check_alerts(api: &PriceTrackerApi<SqliteDatabase>) {
    match api.check_alerts(Utc::now()).await {
        Ok(triggered) => println!("{}", format_triggered(&triggered)),
        Err(e) => eprintln!("Could not check alerts. {e}"),
    }
}
