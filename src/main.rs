mod dashboard;
mod setup;

use std::sync::{mpsc, Arc};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use wxboard_core::Config;
use wxboard_weather::{catalog, dispatch, DisplaySurface, RefreshPoller, WeatherService};

use crate::dashboard::TerminalDashboard;

fn main() -> Result<()> {
    wxboard_core::init()?;

    let config = match Config::load_validated() {
        Ok((config, _)) => config,
        Err(e) => {
            eprintln!("{}\n{}", e.user_message(), e);
            return Err(e.into());
        }
    };

    if let Err(e) = setup::ensure_catalog(&config.catalog.path) {
        tracing::error!("{:#}", e);
    }
    let cities = catalog::init_global(&config.catalog.path);

    let mut dashboard = TerminalDashboard::new(
        &config.ui,
        config.weather.temperature_unit.symbol(),
        cities.list_cities(),
    );
    dashboard.redraw();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("wxboard-tokio")
        .build()
        .context("Failed to create tokio runtime")?;

    let cancel = CancellationToken::new();
    let service = WeatherService::new(&config.weather)
        .context("Failed to create weather service")?
        .with_cancellation(cancel.clone());

    let (tx, rx) = mpsc::channel();
    let interval = Duration::from_secs(u64::from(config.weather.refresh_minutes) * 60);
    let poller = RefreshPoller::new(
        Arc::new(service),
        cities,
        dashboard.cities(),
        interval,
        tx,
        cancel.clone(),
    );
    let poller = poller.spawn(runtime.handle());

    runtime.spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, stopping refresh");
            cancel.cancel();
        }
    });

    tracing::info!("wxboard started");

    // Foreground: the dashboard is only touched here
    for message in rx {
        dispatch(&mut dashboard, &message);
    }

    runtime
        .block_on(poller)
        .context("Refresh poller panicked")?;

    tracing::info!("wxboard stopped");
    Ok(())
}
