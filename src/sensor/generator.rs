//! Simulated sensor sampling
use std::ops::RangeInclusive;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::ClockError;
use crate::models::Reading;
use crate::sensor::clock::Clock;
use crate::utils::encode_timestamp;

/// Inclusive sampling ranges for each measurement
///
/// Each range must have `start <= end`.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRanges {
    pub temperature: RangeInclusive<f32>, // °C
    pub pressure: RangeInclusive<f32>,    // hPa
    pub humidity: RangeInclusive<f32>,    // %
}

impl Default for MeasurementRanges {
    fn default() -> Self {
        Self {
            temperature: 20.0..=30.0,
            pressure: 990.0..=1025.0,
            humidity: 30.0..=70.0,
        }
    }
}

/// Produces fresh readings for a single sensor
///
/// The random source and clock are injected so tests can pin both.
pub struct ReadingGenerator<R, C> {
    sensor_id: i16,
    rng: R,
    clock: C,
    ranges: MeasurementRanges,
}

impl<C: Clock> ReadingGenerator<StdRng, C> {
    /// Generator seeded from OS entropy, for production use
    pub fn from_entropy(sensor_id: i16, clock: C) -> Self {
        Self::new(sensor_id, StdRng::from_entropy(), clock)
    }
}

impl<R: Rng, C: Clock> ReadingGenerator<R, C> {
    pub fn new(sensor_id: i16, rng: R, clock: C) -> Self {
        Self {
            sensor_id,
            rng,
            clock,
            ranges: MeasurementRanges::default(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_ranges(mut self, ranges: MeasurementRanges) -> Self {
        self.ranges = ranges;
        self
    }

    pub fn sensor_id(&self) -> i16 {
        self.sensor_id
    }

    /// Sample a new reading stamped with the current local time
    pub fn generate(&mut self) -> Result<Reading, ClockError> {
        let timestamp = encode_timestamp(&self.clock.now()?)?;

        Ok(Reading {
            sensor_id: self.sensor_id,
            timestamp,
            temperature: self.rng.gen_range(self.ranges.temperature.clone()),
            pressure: self.rng.gen_range(self.ranges.pressure.clone()),
            humidity: self.rng.gen_range(self.ranges.humidity.clone()),
        })
    }
}
