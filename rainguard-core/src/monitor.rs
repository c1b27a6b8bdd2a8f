use anyhow::Result;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::decision;
use crate::model::{Coordinate, RainDecision, Summary};
use crate::notifier::{Dispatch, Notifier};
use crate::provider::{FetchError, WeatherProvider};

/// Wait before retrying after an unexpected tick failure.
pub const FALLBACK_DELAY: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Running,
    /// Terminal; reached only through an external interrupt.
    Stopped,
}

/// What a single tick produced.
#[derive(Debug)]
pub enum TickOutcome {
    /// Summary logged and decision dispatched to the controller.
    Completed { summary: Summary, dispatch: Dispatch },
    /// Current conditions were unavailable; no summary, no notification.
    Skipped(FetchError),
}

/// Drives fetch -> decide -> notify on a fixed cadence until interrupted.
///
/// Every collaborator failure is soft: a tick can be skipped or fall back to
/// "no rain", but only the shutdown signal ends the loop.
pub struct Monitor {
    provider: Box<dyn WeatherProvider>,
    notifier: Notifier,
    coordinate: Coordinate,
    interval: Duration,
    hours_ahead: u32,
    state: MonitorState,
}

impl Monitor {
    pub fn new(
        provider: Box<dyn WeatherProvider>,
        notifier: Notifier,
        coordinate: Coordinate,
        interval: Duration,
        hours_ahead: u32,
    ) -> Self {
        Self {
            provider,
            notifier,
            coordinate,
            interval,
            hours_ahead,
            state: MonitorState::Running,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// One fetch -> decide -> notify cycle at the given instant.
    ///
    /// The instant is injected so decisions are reproducible under test.
    /// Today's collaborators all fail soft inside the tick; an `Err` from
    /// here is the unexpected-failure path the driver answers with the
    /// shortened fallback delay.
    pub async fn run_one_tick(&mut self, now: DateTime<Utc>) -> Result<TickOutcome> {
        let conditions = match self.provider.current_conditions(&self.coordinate).await {
            Ok(conditions) => conditions,
            Err(e) => {
                warn!(error = %e, "current conditions unavailable, skipping tick");
                return Ok(TickOutcome::Skipped(e));
            }
        };

        // Independent fetch; failure here degrades to "assume no rain"
        // instead of losing the whole tick.
        let decision = match self.provider.forecast(&self.coordinate).await {
            Ok(forecast) => decision::analyze(&forecast, now, self.hours_ahead),
            Err(e) => {
                warn!(error = %e, "forecast unavailable, assuming no rain");
                RainDecision::NO_RAIN
            }
        };

        let summary = Summary::new(now, conditions, decision);
        log_summary(&summary);

        let dispatch = self.notifier.notify(decision.will_rain);

        Ok(TickOutcome::Completed { summary, dispatch })
    }

    /// Drive ticks until the shutdown signal fires (or its sender goes away).
    /// The controller link is released exactly once on the way out.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_mins = self.interval.as_secs() / 60,
            hours_ahead = self.hours_ahead,
            coordinate = %self.coordinate,
            "starting weather monitoring"
        );

        while self.state == MonitorState::Running {
            let tick = self.run_one_tick(Utc::now()).await;
            let delay = self.delay_after(&tick);

            if let Err(e) = &tick {
                error!(error = %e, retry_secs = delay.as_secs(), "tick failed, retrying");
            } else {
                info!(minutes = delay.as_secs() / 60, "next check scheduled");
            }

            tokio::select! {
                _ = shutdown.changed() => {
                    info!("interrupt received, stopping monitor");
                    self.state = MonitorState::Stopped;
                }
                () = tokio::time::sleep(delay) => {}
            }
        }

        self.notifier.close();
        info!("weather monitoring stopped");
    }

    fn delay_after(&self, tick: &Result<TickOutcome>) -> Duration {
        match tick {
            Ok(_) => self.interval,
            Err(_) => FALLBACK_DELAY,
        }
    }
}

fn log_summary(summary: &Summary) {
    let conditions = &summary.conditions;
    let decision = &summary.decision;

    let temperature = format!("{:.1}", conditions.temperature_c);
    info!(
        location = %conditions.location(),
        temperature_c = %temperature,
        humidity_pct = conditions.humidity_pct,
        conditions = %conditions.description,
        will_rain = decision.will_rain,
        "weather summary"
    );

    if decision.will_rain {
        let expected = format!("{:.1}", decision.amount_mm);
        info!(
            expected_mm = %expected,
            recommendation = decision.recommendation(),
            "rain expected within the look-ahead window"
        );
    }
}
