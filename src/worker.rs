use std::sync::mpsc::Receiver;
use chrono::Utc;
use log::{debug, error, info};
use thiserror::Error;
use crate::manager_forecast::ForecastSource;
use crate::models::Position;
use crate::pipeline::{Pipeline, RefreshError, Trigger, Update};
use crate::publish::{Dashboard, PublishError, Publisher};

/// Runs refresh cycles serially and keeps the last good dashboard
pub struct Worker<S: ForecastSource> {
    pipeline: Pipeline<S>,
    publisher: Publisher,
    dashboard: Dashboard,
    last_position: Option<Position>,
}

impl<S: ForecastSource> Worker<S> {
    /// Returns a new worker
    ///
    /// # Arguments
    ///
    /// * 'pipeline' - the refresh pipeline
    /// * 'publisher' - where dashboards are written
    /// * 'fallback' - position to use until a geolocation update arrives
    pub fn new(pipeline: Pipeline<S>, publisher: Publisher, fallback: Option<Position>) -> Worker<S> {
        Worker {
            pipeline,
            publisher,
            dashboard: Dashboard::default(),
            last_position: fallback.filter(|p| p.coordinates().is_some()),
        }
    }

    /// Handles triggers until every sender is gone.
    /// A failed cycle is logged and the next trigger is awaited.
    ///
    /// # Arguments
    ///
    /// * 'receiver' - trigger channel
    pub fn run(&mut self, receiver: Receiver<Trigger>) {
        while let Ok(first) = receiver.recv() {
            let trigger = self.coalesce(first, &receiver);
            if let Err(e) = self.handle(trigger) {
                error!("Refresh cycle failed: {}", e);
            }
        }
        info!("Trigger channel closed, stopping");
    }

    /// Folds every trigger already queued behind `first` into one.
    /// The latest complete position wins, otherwise the latest tick, so a partial
    /// position never replaces a refresh that would have run.
    ///
    /// # Arguments
    ///
    /// * 'first' - the trigger that woke the worker
    /// * 'receiver' - trigger channel to drain
    fn coalesce(&self, first: Trigger, receiver: &Receiver<Trigger>) -> Trigger {
        let mut complete: Option<Position> = None;
        let mut tick: Option<u64> = None;
        let mut partial: Option<Position> = None;
        let mut folded = 0;

        for next in std::iter::once(first).chain(receiver.try_iter()) {
            folded += 1;
            match next {
                Trigger::Geolocation(p) if p.coordinates().is_some() => complete = Some(p),
                Trigger::Geolocation(p) => partial = Some(p),
                Trigger::Tick(n_intervals) => tick = Some(n_intervals),
            }
        }

        let trigger = match (complete, tick, partial) {
            (Some(p), _, _) => Trigger::Geolocation(p),
            (None, Some(n_intervals), _) => Trigger::Tick(n_intervals),
            (None, None, p) => Trigger::Geolocation(p.unwrap_or_default()),
        };
        if folded > 1 {
            info!("Coalesced {} queued triggers into {:?}", folded, trigger);
        }

        trigger
    }

    /// Keeps a complete position as the one to refresh for on later ticks
    ///
    fn remember(&mut self, position: &Position) {
        if position.coordinates().is_some() {
            self.last_position = Some(*position);
        }
    }

    /// Runs one refresh cycle and publishes the outcome.
    /// On failure the previous charts are kept and the error is published alongside them.
    ///
    /// # Arguments
    ///
    /// * 'trigger' - what started the cycle
    pub fn handle(&mut self, trigger: Trigger) -> Result<(), WorkerError> {
        let position = match trigger {
            Trigger::Geolocation(p) => {
                self.remember(&p);
                Some(p)
            }
            Trigger::Tick(n_intervals) => {
                debug!("Tick {}", n_intervals);
                self.last_position
            }
        };

        match self.pipeline.refresh(&trigger, position.as_ref()) {
            Ok(output) => {
                if output.geolocation_update == Update::Set(true) {
                    info!("Geolocation source asked to report now");
                }
                if !output.temperature.is_update() && !output.precipitation.is_update() {
                    return Ok(());
                }
                if let Update::Set(chart) = output.temperature {
                    self.dashboard.temperature = Some(chart);
                }
                if let Update::Set(chart) = output.precipitation {
                    self.dashboard.precipitation = Some(chart);
                }
                self.dashboard.position = position;
                self.dashboard.updated_at = Some(Utc::now());
                self.dashboard.error = None;
                self.publisher.publish(&self.dashboard)?;
                Ok(())
            }
            Err(e) => {
                error!("Refresh failed, keeping last good charts: {}", e);
                self.dashboard.error = Some(e.to_string());
                self.publisher.publish(&self.dashboard)?;
                Err(WorkerError::RefreshError(e))
            }
        }
    }
}

/// Error depicting errors that occur while running refresh cycles
///
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("error while refreshing: {0}")]
    RefreshError(#[from] RefreshError),
    #[error("error while publishing: {0}")]
    PublishError(#[from] PublishError),
}
