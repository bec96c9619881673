use std::sync::mpsc;
use std::time::Duration;
use anyhow::Result;
use log::info;
use crate::initialization::init;
use crate::triggers::{spawn_geolocation_feed, spawn_ticker};

mod chart;
mod config;
mod initialization;
mod logging;
mod macros;
mod manager_forecast;
mod models;
mod pipeline;
mod publish;
mod triggers;
mod worker;

fn main() -> Result<()> {
    // Load config and set up the worker. If initialization fails, we can't even log.
    let (config, mut worker) = init()
        .map_err(|e| anyhow::anyhow!("Initialization failed: {}", e))?;

    let (sender, receiver) = mpsc::channel();
    let interval = Duration::from_secs(config.refresh.interval_secs);
    let _ticker = spawn_ticker(sender.clone(), interval);
    let _feed = spawn_geolocation_feed(config.refresh.geolocation_feed.clone(), sender)?;
    info!("Refreshing every {:?}", interval);

    worker.run(receiver);

    Ok(())
}
