//! Scheduled expiry sweep: flips `active` subscriptions past their end
//! date to `expired` in one bulk statement. Runs on a detached tokio
//! task, decoupled from request handling, and again inline from the
//! subscription list endpoint as a safety net.

use std::env;
use std::time::Duration;

use sqlx::PgPool;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use worklane_database::repositories::billing;

use crate::errors::ServiceError;

const DEFAULT_INTERVAL_SECS: u64 = 24 * 60 * 60;

pub async fn expire_lapsed(pool: &PgPool) -> Result<u64, ServiceError> {
    Ok(billing::expire_lapsed(pool).await?)
}

fn sweep_interval() -> Duration {
    let secs = env::var("SWEEP_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_INTERVAL_SECS);
    Duration::from_secs(secs)
}

/// Spawns the sweep loop. The first tick fires immediately so a restart
/// catches up on anything that lapsed while the service was down.
pub fn spawn_scheduler(pool: PgPool) -> tokio::task::JoinHandle<()> {
    let period = sweep_interval();
    info!(period_secs = period.as_secs(), "starting expiry sweep scheduler");
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match billing::expire_lapsed(&pool).await {
                Ok(0) => {}
                Ok(swept) => info!(swept, "expiry sweep transitioned subscriptions"),
                Err(e) => error!("expiry sweep failed: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_defaults_to_daily() {
        std::env::remove_var("SWEEP_INTERVAL_SECS");
        assert_eq!(sweep_interval(), Duration::from_secs(86_400));
    }
}
