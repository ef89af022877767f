//! The emission loop: generate, sign, send, sleep
use log::{error, info, warn};
use rand::Rng;
use tokio::sync::watch;
use tokio::time::{sleep, Duration};

use crate::config::EmitterConfig;
use crate::error::{CycleError, SendError};
use crate::models::Reading;
use crate::protocol::{build_packet, Framing};
use crate::sensor::{Clock, ReadingGenerator};
use crate::signing::Signer;
use crate::transport::{send_packet, SendOptions};
use crate::utils::{backoff_delay, format_wire_timestamp};

/// Result of one successful emission cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub reading: Reading,
    pub packet_len: usize,
    pub writes: usize,
}

/// Running totals since startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitterStats {
    pub cycles: u64,
    pub sent: u64,
    pub failed: u64,
}

/// Drives emission cycles for a single sensor and endpoint
///
/// Cycles run strictly one after another; a send never overlaps the next
/// reading. Only the sensor id and endpoint survive across cycles.
pub struct Emitter<R, C> {
    generator: ReadingGenerator<R, C>,
    signer: Signer,
    server_ip: String,
    server_port: u16,
    send_options: SendOptions,
    framing: Framing,
    interval: Duration,
    max_backoff: Duration,
    connect_failures: u32,
    stats: EmitterStats,
}

impl<R: Rng, C: Clock> Emitter<R, C> {
    pub fn new(config: &EmitterConfig, generator: ReadingGenerator<R, C>) -> Self {
        Self {
            generator,
            signer: Signer::new(&config.private_key_path, config.key_policy),
            server_ip: config.server_ip.clone(),
            server_port: config.server_port,
            send_options: config.send_options,
            framing: config.framing,
            interval: config.send_interval,
            max_backoff: config.max_backoff,
            connect_failures: 0,
            stats: EmitterStats::default(),
        }
    }

    pub fn stats(&self) -> EmitterStats {
        self.stats
    }

    /// Run a single generate, sign, build, send sequence
    ///
    /// Any failure ends the cycle; the reading is dropped, not retried.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, CycleError> {
        let reading = self.generator.generate()?;
        let signature = self.signer.sign(&reading.encode())?;
        let packet = build_packet(&reading, &signature, self.framing)?;

        let report = send_packet(
            &packet,
            &self.server_ip,
            self.server_port,
            &self.send_options,
        )
        .await?;

        Ok(CycleReport {
            reading,
            packet_len: report.bytes,
            writes: report.writes,
        })
    }

    /// Delay before the next cycle, including any connect backoff
    pub fn next_delay(&self) -> Duration {
        self.interval
            .saturating_add(backoff_delay(self.interval, self.connect_failures, self.max_backoff))
    }

    /// Run cycles until `shutdown` turns true or its sender is dropped
    ///
    /// Per-cycle failures are logged and skipped. Only a fatal cycle error
    /// ends the loop with an error.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), CycleError> {
        info!(
            "Starting emission for sensor {} to {}:{} every {}s",
            self.generator.sensor_id(),
            self.server_ip,
            self.server_port,
            self.interval.as_secs()
        );

        while !*shutdown.borrow() {
            let outcome = self.run_cycle().await;
            self.record(&outcome);

            if let Err(e) = outcome {
                if e.is_fatal() {
                    error!("Stopping emission: {}", e);
                    return Err(e);
                }
            }

            let delay = self.next_delay();
            if delay > self.interval {
                warn!(
                    "{} consecutive connect failures, waiting {}s",
                    self.connect_failures,
                    delay.as_secs()
                );
            }

            tokio::select! {
                _ = sleep(delay) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!(
            "Emission stopped after {} cycles ({} sent, {} failed)",
            self.stats.cycles, self.stats.sent, self.stats.failed
        );
        Ok(())
    }

    fn record(&mut self, outcome: &Result<CycleReport, CycleError>) {
        self.stats.cycles += 1;

        match outcome {
            Ok(report) => {
                self.stats.sent += 1;
                self.connect_failures = 0;
                let r = &report.reading;
                info!(
                    "Sent reading: sensor={} time={} temp={:.2}°C pressure={:.2} hPa humidity={:.2}% ({} bytes)",
                    r.sensor_id,
                    format_wire_timestamp(r.timestamp),
                    r.temperature,
                    r.pressure,
                    r.humidity,
                    report.packet_len
                );
            }
            Err(e) => {
                self.stats.failed += 1;
                if e.is_connect_failure() {
                    self.connect_failures = self.connect_failures.saturating_add(1);
                } else {
                    self.connect_failures = 0;
                }
                log_failure(e, &self.server_ip, self.server_port);
            }
        }
    }
}

fn log_failure(e: &CycleError, host: &str, port: u16) {
    match e {
        CycleError::Clock(e) => error!("Reading skipped: {}", e),
        CycleError::Sign(e) => error!("Signing failed: {}", e),
        CycleError::Packet(e) => error!("Packet build failed: {}", e),
        CycleError::Send(e @ (SendError::Connect { .. } | SendError::ConnectTimeout { .. })) => {
            error!("Failed to connect to {}:{}: {}", host, port, e)
        }
        CycleError::Send(e) => error!("Failed to send data: {}", e),
    }
}
