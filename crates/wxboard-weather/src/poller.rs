//! Background refresh loop.
//!
//! The poller runs on the tokio runtime and hands every finished summary to
//! the foreground through a `std::sync::mpsc` channel; the display surface is
//! only ever touched by whoever drains that channel.

use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::catalog::CoordinateLookup;
use crate::provider::WeatherSource;
use crate::types::{WeatherSummary, ERROR_NO_DATA};

/// Messages sent from the poller back to the foreground
#[derive(Debug, Clone, PartialEq)]
pub enum PollerMessage {
    /// Latest summary for one city
    Summary {
        city: String,
        summary: WeatherSummary,
    },
    /// Every tracked city has been dispatched for this cycle
    CycleComplete { cycle: u64, cities: usize },
}

/// Renders summaries; owned and driven by the foreground
pub trait DisplaySurface {
    /// Cities the surface shows, in display order
    fn cities(&self) -> Vec<String>;

    fn show(&mut self, city: &str, summary: &WeatherSummary);

    /// Called after a full refresh cycle has been applied
    fn cycle_complete(&mut self, _cycle: u64) {}
}

/// Apply one poller message to a surface
pub fn dispatch<D: DisplaySurface + ?Sized>(surface: &mut D, message: &PollerMessage) {
    match message {
        PollerMessage::Summary { city, summary } => surface.show(city, summary),
        PollerMessage::CycleComplete { cycle, .. } => surface.cycle_complete(*cycle),
    }
}

pub struct RefreshPoller<S, L> {
    source: Arc<S>,
    lookup: Arc<L>,
    cities: Vec<String>,
    interval: Duration,
    tx: Sender<PollerMessage>,
    cancel: CancellationToken,
}

impl<S: WeatherSource, L: CoordinateLookup> RefreshPoller<S, L> {
    pub fn new(
        source: Arc<S>,
        lookup: Arc<L>,
        cities: Vec<String>,
        interval: Duration,
        tx: Sender<PollerMessage>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source,
            lookup,
            cities,
            interval,
            tx,
            cancel,
        }
    }

    /// Start [`run`](Self::run) on the given runtime
    pub fn spawn(self, handle: &tokio::runtime::Handle) -> JoinHandle<()> {
        handle.spawn(self.run())
    }

    /// Refresh forever: one cycle, then sleep the full interval.
    ///
    /// Returns when the token is cancelled or the receiving side hangs up.
    pub async fn run(self) {
        tracing::info!(
            "Refresh poller started for {} cities every {:?}",
            self.cities.len(),
            self.interval
        );
        let mut cycle: u64 = 0;

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            cycle += 1;
            let Some(sent) = self.refresh_all().await else {
                tracing::debug!("Summary receiver closed, stopping poller");
                break;
            };

            if self.tx.send(PollerMessage::CycleComplete { cycle, cities: sent }).is_err() {
                break;
            }
            tracing::info!("Refresh cycle {} complete ({} cities)", cycle, sent);

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        tracing::info!("Refresh poller stopped after {} cycles", cycle);
    }

    /// Fetch and dispatch every tracked city once, in order.
    ///
    /// Returns the number of summaries sent, or `None` once the receiver is gone.
    pub async fn refresh_all(&self) -> Option<usize> {
        let mut sent = 0;

        for city in &self.cities {
            if self.cancel.is_cancelled() {
                break;
            }

            let summary = self.fetch_city(city).await;
            tracing::debug!(
                "{}: {} ({:?})",
                city,
                summary.condition,
                summary.temperature
            );

            let message = PollerMessage::Summary {
                city: city.clone(),
                summary,
            };
            if self.tx.send(message).is_err() {
                return None;
            }
            sent += 1;
        }

        Some(sent)
    }

    async fn fetch_city(&self, city: &str) -> WeatherSummary {
        let Some((latitude, longitude)) = self.lookup.coordinates_for(city) else {
            tracing::warn!("No coordinates for {}", city);
            return WeatherSummary::error(ERROR_NO_DATA);
        };

        // Own task so a panicking fetch only costs this city its summary
        let source = Arc::clone(&self.source);
        let task = tokio::spawn(async move { source.get_weather(latitude, longitude).await });

        match task.await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!("Weather task for {} failed: {}", city, e);
                WeatherSummary::error(format!("Unexpected error: {}", e))
            }
        }
    }
}
