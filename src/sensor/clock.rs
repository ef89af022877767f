//! Wall-clock sources for reading timestamps
use chrono::{DateTime, Datelike, Local, TimeZone, Timelike, Utc};
use time::{Date, Month, PrimitiveDateTime, Time};

use crate::error::ClockError;

/// Source of the local wall-clock time
pub trait Clock {
    fn now(&self) -> Result<PrimitiveDateTime, ClockError>;
}

/// Wall clock in a time zone
///
/// The zone's UTC offset is looked up again for every reading, so a DST
/// change while running shows up in the next timestamp.
#[derive(Debug, Clone, Copy)]
pub struct ZonedClock<Tz> {
    zone: Tz,
}

/// Wall clock in the host's configured time zone
pub type LocalClock = ZonedClock<Local>;

impl ZonedClock<Local> {
    pub fn local() -> Self {
        Self { zone: Local }
    }
}

impl<Tz: TimeZone> ZonedClock<Tz> {
    pub fn new(zone: Tz) -> Self {
        Self { zone }
    }

    /// Wall-clock time in this zone at the given instant
    pub fn at(&self, instant: DateTime<Utc>) -> Result<PrimitiveDateTime, ClockError> {
        let local = instant.with_timezone(&self.zone).naive_local();
        let year = local.year();
        let unrepresentable = |_| ClockError { year };

        let month = Month::try_from(local.month() as u8).map_err(unrepresentable)?;
        let date = Date::from_calendar_date(year, month, local.day() as u8)
            .map_err(unrepresentable)?;
        let time = Time::from_hms(local.hour() as u8, local.minute() as u8, local.second() as u8)
            .map_err(unrepresentable)?;

        Ok(PrimitiveDateTime::new(date, time))
    }
}

impl<Tz: TimeZone> Clock for ZonedClock<Tz> {
    fn now(&self) -> Result<PrimitiveDateTime, ClockError> {
        self.at(Utc::now())
    }
}

/// Clock frozen at a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub PrimitiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> Result<PrimitiveDateTime, ClockError> {
        Ok(self.0)
    }
}
