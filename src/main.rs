mod config;
mod draft;
mod players;
mod store;
mod teams;
mod webhook;

use std::sync::Arc;

use tracing::info;

use config::Config;
use store::HttpPlayerStore;
use teams::TeamTable;
use webhook::AppState;

type Error = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    // a .env file is optional; real deployments set the variables directly
    if dotenv::dotenv().is_err() {
        info!("no .env file found, using process environment");
    }

    let config = Config::from_env()?;

    let teams = match &config.teams_file {
        Some(path) => TeamTable::load_from_file(path)?,
        None => TeamTable::builtin()?,
    };
    info!(teams = teams.len(), "loaded team table");

    let store = HttpPlayerStore::new(reqwest::Client::new(), &config.store_url)?;

    let state = AppState {
        signing_secret: Arc::from(config.signing_secret.as_str()),
        teams: Arc::new(teams),
        store: Arc::new(store),
    };

    webhook::start_webhook_server(state, config.port, &config.events_path).await?;
    Ok(())
}
