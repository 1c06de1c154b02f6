// src/main.rs
use bourse_data::api::{self, ApiSettings, AppContext};
use bourse_data::client::{watch_snapshots, MarketDataClient};
use bourse_data::config::Config;
use bourse_data::models::Snapshot;
use bourse_data::reference::ReferenceData;
use env_logger::{Builder, Env};
use log::{error, info};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task;

async fn log_snapshots(mut rx: mpsc::Receiver<Snapshot>) {
    while let Some(snapshot) = rx.recv().await {
        for sector in &snapshot.sectors {
            info!(
                "{}: {:+.2}% avg over {} stocks",
                sector.sector, sector.avg_change, sector.count
            );
        }
    }
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return;
        }
    };

    let reference = match &config.reference_file {
        Some(path) => match ReferenceData::from_json_file(path) {
            Ok(reference) => reference,
            Err(e) => {
                error!("Failed to load reference data: {}", e);
                return;
            }
        },
        None => ReferenceData::builtin(),
    };
    info!(
        "Serving {} stocks and {} funds",
        reference.stocks().len(),
        reference.funds().len()
    );

    let ctx = Arc::new(AppContext::new(reference, ApiSettings::from(&config)));
    let api = api::routes(ctx);

    if let Some(every) = config.watch_interval {
        let client = MarketDataClient::new(format!("http://{}/", config.bind_addr));
        let (tx, rx) = mpsc::channel(16);
        task::spawn(watch_snapshots(client, every, tx));
        task::spawn(log_snapshots(rx));
        info!("Watching snapshots every {:?}", every);
    }

    info!("Server running on http://{}", config.bind_addr);
    warp::serve(api).run(config.bind_addr).await;
}
