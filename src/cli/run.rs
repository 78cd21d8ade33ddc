//! Run command implementation

use crate::config::Config;
use crate::pipeline::PricePipeline;
use clap::Args;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(short, long)]
    pub duration_secs: Option<u64>,
}

impl RunArgs {
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let pipeline = PricePipeline::new(config);

        let _status = pipeline.subscribe_status(|status| {
            tracing::info!(%status, "Connection status");
        });
        let _snapshots = pipeline.subscribe_snapshot(|snapshot| {
            tracing::info!(
                price = %snapshot.price,
                bid = %snapshot.bid,
                ask = %snapshot.ask,
                change = %snapshot.change,
                change_percent = %snapshot.change_percent.round_dp(2),
                high = %snapshot.high_24h,
                low = %snapshot.low_24h,
                volume = %snapshot.volume_24h,
                live = snapshot.is_live,
                "Price update"
            );
        });

        pipeline.start();

        match self.duration_secs {
            Some(secs) => {
                tokio::select! {
                    result = tokio::signal::ctrl_c() => result?,
                    _ = tokio::time::sleep(Duration::from_secs(secs)) => {
                        tracing::info!(secs, "Run duration elapsed");
                    }
                }
            }
            None => tokio::signal::ctrl_c().await?,
        }

        pipeline.stop();

        let last = pipeline.snapshot();
        tracing::info!(
            price = %last.price,
            status = %pipeline.status(),
            last_error = ?pipeline.last_error(),
            "Price pipeline stopped"
        );
        Ok(())
    }
}
