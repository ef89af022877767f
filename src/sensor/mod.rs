pub mod clock;
pub mod generator;

pub use clock::{Clock, FixedClock, LocalClock, ZonedClock};
pub use generator::{MeasurementRanges, ReadingGenerator};
