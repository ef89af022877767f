use log::{error, info};
use tokio::sync::watch;

use telemetry_emitter::sensor::{LocalClock, ReadingGenerator};
use telemetry_emitter::{Emitter, EmitterConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    // Load configuration
    let config = match EmitterConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    info!(
        "Sensor {} sending to {} with key {} ({:?} framing)",
        config.sensor_id,
        config.endpoint(),
        config.private_key_path.display(),
        config.framing
    );

    let generator = ReadingGenerator::from_entropy(config.sensor_id, LocalClock::local());
    let mut emitter = Emitter::new(&config, generator);

    // Handle Ctrl+C gracefully
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Program terminated by user. Exiting gracefully."),
            Err(e) => {
                error!("Failed to listen for Ctrl+C: {}", e);
                // Keep the sender alive so the loop is not stopped
                std::future::pending::<()>().await;
            }
        }
        let _ = tx.send(true);
    });

    if let Err(e) = emitter.run(rx).await {
        error!("Fatal error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
