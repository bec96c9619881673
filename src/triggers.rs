use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use log::{info, warn};
use crate::models::Position;
use crate::pipeline::Trigger;

/// Starts a thread sending a tick right away and then once every interval.
/// The thread ends when the receiving side is gone.
///
/// # Arguments
///
/// * 'sender' - trigger channel
/// * 'interval' - time between ticks
pub fn spawn_ticker(sender: Sender<Trigger>, interval: Duration) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut n_intervals: u64 = 0;
        while sender.send(Trigger::Tick(n_intervals)).is_ok() {
            thread::sleep(interval);
            n_intervals += 1;
        }
    })
}

/// Starts a thread reading geolocation updates from a file, or stdin if no file is given
///
/// # Arguments
///
/// * 'feed' - path to the geolocation feed
/// * 'sender' - trigger channel
pub fn spawn_geolocation_feed(feed: Option<String>, sender: Sender<Trigger>) -> io::Result<JoinHandle<()>> {
    let reader: Box<dyn BufRead + Send> = match &feed {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };
    info!("Reading geolocation updates from {}", feed.as_deref().unwrap_or("stdin"));

    Ok(thread::spawn(move || {
        let count = read_positions(reader, &sender);
        info!("Geolocation feed closed after {} updates", count);
    }))
}

/// Sends one geolocation trigger per JSON line, e.g. `{"lat": 52.52, "lon": 13.40}`.
/// Blank lines are skipped, lines that fail to parse are logged and skipped.
/// Returns the number of triggers sent.
///
/// # Arguments
///
/// * 'reader' - line source
/// * 'sender' - trigger channel
pub fn read_positions<R: BufRead>(reader: R, sender: &Sender<Trigger>) -> usize {
    let mut count = 0;
    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!("error reading geolocation feed: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<Position>(&line) {
            Ok(position) => {
                if sender.send(Trigger::Geolocation(position)).is_err() {
                    break;
                }
                count += 1;
            }
            Err(e) => warn!("skipping geolocation update {:?}: {}", line, e),
        }
    }

    count
}
