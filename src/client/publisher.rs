//! Preview publisher — a repeating timer scoped to one drawing gesture.
//!
//! `start` arms the timer when a gesture begins; `stop` drops it when the
//! gesture ends, so no tick can fire afterwards. While idle, `tick` never
//! resolves, which lets the client loop `select!` on it unconditionally.
//! The first tick fires one full period after `start`; a gesture shorter
//! than that publishes no preview at all.

use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

#[derive(Debug)]
pub struct PreviewPublisher {
    period: Duration,
    ticker: Option<Interval>,
}

impl PreviewPublisher {
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self { period, ticker: None }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.ticker.is_some()
    }

    /// Arm the timer. Restarting an active publisher resets its phase.
    pub fn start(&mut self) {
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.ticker = Some(ticker);
    }

    /// Cancel the timer. Returns whether it was running.
    pub fn stop(&mut self) -> bool {
        self.ticker.take().is_some()
    }

    /// Wait for the next period. Pending forever while stopped.
    pub async fn tick(&mut self) {
        match self.ticker.as_mut() {
            Some(ticker) => {
                ticker.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
#[path = "publisher_test.rs"]
mod tests;
