//! Grid engine run loop
//!
//! Host loop for the grid strategy: polls the exchange ticker at the resolved
//! interval and keeps quote telemetry flowing. Order ladder construction and
//! fill handling plug in behind this loop and are not part of this crate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::adapters::EdgeXAdapter;
use crate::error::Result;

pub struct GridEngine {
    adapter: EdgeXAdapter,
    symbol: String,
    symbol_param_name: String,
    poll_interval: Duration,
    shutdown: AtomicBool,
}

impl GridEngine {
    pub fn new(
        adapter: EdgeXAdapter,
        symbol: String,
        symbol_param_name: String,
        poll_interval_sec: f64,
    ) -> Self {
        Self {
            adapter,
            symbol,
            symbol_param_name,
            poll_interval: Duration::from_secs_f64(poll_interval_sec),
            shutdown: AtomicBool::new(false),
        }
    }

    /// Signal shutdown; the loop exits at its next shutdown check
    pub fn shutdown(&self) {
        info!("shutdown requested");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Main run loop; runs until shutdown. Transient fetch errors are logged
    /// and never abort the loop.
    pub async fn run(&self) -> Result<()> {
        info!(
            "grid engine starting: symbol={} poll_interval={:.1}s account_id={}",
            self.symbol,
            self.poll_interval.as_secs_f64(),
            self.adapter.account_id()
        );

        let mut ticks = tokio::time::interval(self.poll_interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut consecutive_failures: u32 = 0;

        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                info!("shutting down grid engine");
                break;
            }

            ticks.tick().await;

            match self
                .adapter
                .get_ticker(&self.symbol_param_name, &self.symbol)
                .await
            {
                Ok(ticker) => {
                    consecutive_failures = 0;
                    match ticker.mid_price() {
                        Some(mid) => info!(
                            "quote symbol={} mid={} bid={:?} ask={:?}",
                            ticker.symbol, mid, ticker.best_bid, ticker.best_ask
                        ),
                        None => debug!("quote symbol={} has no price yet", ticker.symbol),
                    }
                }
                Err(e) => {
                    consecutive_failures += 1;
                    warn!("quote fetch failed ({consecutive_failures} consecutive): {e}");
                }
            }
        }

        Ok(())
    }
}
