use clap::Parser;
use gold_ticker::cli::{Cli, Commands};
use gold_ticker::config::Config;
use std::path::Path;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // A missing file means defaults; a broken one is an error
    let config = if Path::new(&cli.config).exists() {
        Config::load(&cli.config)?
    } else {
        eprintln!("Config file {} not found, using defaults", cli.config);
        Config::default()
    }
    .with_env_overrides();
    config.validate()?;

    gold_ticker::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting price stream");
            args.execute(config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!(
                "  Feed: {} {} (key {})",
                config.feed.endpoint,
                config.feed.symbol,
                config.masked_api_key()
            );
            println!(
                "  Reconnect: {}s, ping {}s",
                config.feed.reconnect_delay_secs, config.feed.ping_interval_secs
            );
            println!(
                "  Simulator: every {}ms, step ±{}, seed {:?}",
                config.simulator.interval_ms, config.simulator.max_step, config.simulator.seed
            );
            println!(
                "  Seed: price {} [{} - {}], volume {}",
                config.snapshot.price,
                config.snapshot.low_24h,
                config.snapshot.high_24h,
                config.snapshot.volume_24h
            );
            println!(
                "  Telemetry: log {} ({:?}), metrics port {:?}",
                config.telemetry.log_level, config.telemetry.log_format, config.telemetry.metrics_port
            );
        }
    }

    Ok(())
}
