use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::error;
use rumqttc::QoS;

use sonda::broker;
use sonda::reader::{run_publish_loop, DeviceSource, LineSource, SimulatedSource};
use sonda::wire::CHANNEL;

#[derive(Parser, Debug)]
#[command(name = "sonda-reader")]
#[command(about = "Publishes UART probe readings to the MQTT broker")]
struct Args {
    /// Serial device to read from; omit to emit simulated readings
    #[arg(short, long)]
    device: Option<PathBuf>,

    /// MQTT broker host
    #[arg(long, default_value = "localhost")]
    broker_host: String,

    /// MQTT broker port
    #[arg(long, default_value_t = 1883)]
    broker_port: u16,

    /// Seconds between simulated readings (ignored with --device)
    #[arg(long, default_value_t = 1)]
    simulate_interval: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();

    let (client, mut connection) =
        broker::sync_client("sonda-reader", &args.broker_host, args.broker_port);

    // Drive the network connection in the background so publishes from the
    // read loop never block on broker traffic.
    std::thread::spawn(move || {
        for notification in connection.iter() {
            if let Err(err) = notification {
                error!("MQTT connection error: {err}");
                std::thread::sleep(Duration::from_secs(1));
            }
        }
    });

    let mut source: Box<dyn LineSource> = match &args.device {
        Some(path) => Box::new(DeviceSource::open(path)?),
        None => Box::new(SimulatedSource::new(Duration::from_secs(
            args.simulate_interval,
        ))),
    };

    run_publish_loop(source.as_mut(), &mut |record| {
        client
            .publish(CHANNEL, QoS::AtMostOnce, false, record)
            .context("failed to publish record")
    })
}
