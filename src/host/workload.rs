use super::context::ServiceRun;
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Work executed inside the service runtime until it returns or `shutdown`
/// is cancelled
#[async_trait]
pub trait ServiceWorkload: Send + Sync + 'static {
    async fn run(&self, run: ServiceRun, shutdown: CancellationToken) -> Result<()>;
}

/// Keeps the service alive and logs a heartbeat at a fixed interval
pub struct HeartbeatWorkload {
    interval: Duration,
}

impl HeartbeatWorkload {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

#[async_trait]
impl ServiceWorkload for HeartbeatWorkload {
    async fn run(&self, run: ServiceRun, shutdown: CancellationToken) -> Result<()> {
        info!(
            run_id = %run.id,
            "Service '{}' up: socks5 {} -> {} (path prefix '{}', min idle {})",
            run.context.service_name,
            run.context.local_endpoint(),
            run.context.tunnel.remote_url,
            run.context.tunnel.http_upgrade_path_prefix,
            run.context.tunnel.connection_min_idle
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!(run_id = %run.id, "Heartbeat workload cancelled");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    let uptime = chrono::Utc::now() - run.started_at;
                    info!(
                        run_id = %run.id,
                        "Service '{}' alive for {}s",
                        run.context.service_name,
                        uptime.num_seconds()
                    );
                }
            }
        }
    }
}
