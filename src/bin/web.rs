use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::error;

use sonda::broker;
use sonda::db::Database;
use sonda::ingest;
use sonda::web::{self, AppState};

#[derive(Parser, Debug)]
#[command(name = "sonda-web")]
#[command(about = "Ingests probe readings and serves the live dashboard")]
struct Args {
    /// Path to the readings database
    #[arg(long, default_value = "sonda.sqlite3")]
    db: PathBuf,

    /// MQTT broker host
    #[arg(long, default_value = "localhost")]
    broker_host: String,

    /// MQTT broker port
    #[arg(long, default_value_t = 1883)]
    broker_port: u16,

    /// Address for the dashboard HTTP server
    #[arg(long, default_value = "0.0.0.0:5000")]
    listen: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();

    let db = Database::new(args.db).context("failed to open readings database")?;
    let live = ingest::live_channel();

    let (client, eventloop) =
        broker::async_client("sonda-web", &args.broker_host, args.broker_port);

    // The subscription loop runs beside the HTTP server; the only state they
    // share is the database handle and the live fan-out.
    tokio::spawn({
        let db = db.clone();
        let live = live.clone();
        async move {
            if let Err(err) = ingest::run(client, eventloop, db, live).await {
                // Ingest failure is fatal; never keep serving without it.
                error!("Ingest task failed: {err:#}");
                std::process::exit(1);
            }
        }
    });

    web::serve(&args.listen, AppState { db, live }).await
}
