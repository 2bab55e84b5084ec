//! Locally running calendar.
//!
//! [`LocalClock`] advances one second per tick, paced by its
//! [`DriftFilter`], and is realigned once per minute either by a decoded
//! [`TimeSample`] or, when the frame was unusable, by
//! [`LocalClock::start_new_minute`].

use core::fmt;

use crate::config::{MinuteBoundary, ReceiverConfig};
use crate::decoder::{TimeSample, TimeZone};
use crate::drift::DriftFilter;

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Number of days in `month` of the two-digit `year` (2000-based).
#[must_use]
pub const fn days_in_month(month: u8, year: u8) -> u8 {
    match month {
        2 if year % 4 == 0 => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Calendar and time-of-day fields.
///
/// Month, day, and weekday are zero until the first valid frame; in that
/// state only the time of day rolls over.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Calendar {
    pub year: u8,
    pub month: u8,
    pub day: u8,
    pub weekday: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub timezone_code: u8,
}

/// Calendar value handed to the display sink.
pub type ClockSnapshot = Calendar;

impl Calendar {
    /// Calendar before any synchronisation.
    #[must_use]
    pub const fn unset() -> Self {
        Self {
            year: 0,
            month: 0,
            day: 0,
            weekday: 0,
            hour: 0,
            minute: 0,
            second: 0,
            timezone_code: 0,
        }
    }

    /// Calendar matching `sample` at second zero.
    #[must_use]
    pub const fn from_sample(sample: &TimeSample) -> Self {
        Self {
            year: sample.year,
            month: sample.month,
            day: sample.day,
            weekday: sample.weekday,
            hour: sample.hour,
            minute: sample.minute,
            second: 0,
            timezone_code: sample.timezone_code,
        }
    }

    /// Returns the fields a transmitter would encode for this minute.
    #[must_use]
    pub const fn to_sample(&self) -> TimeSample {
        TimeSample {
            year: self.year,
            month: self.month,
            day: self.day,
            weekday: self.weekday,
            hour: self.hour,
            minute: self.minute,
            timezone_code: self.timezone_code,
        }
    }

    /// Returns `true` once a valid date has been applied.
    #[must_use]
    pub const fn is_date_known(&self) -> bool {
        self.month >= 1 && self.month <= 12 && self.day >= 1
    }

    #[must_use]
    pub fn full_year(&self) -> u16 {
        2_000 + u16::from(self.year)
    }

    #[must_use]
    pub const fn time_zone(&self) -> TimeZone {
        TimeZone::from_code(self.timezone_code)
    }

    #[must_use]
    pub fn month_label(&self) -> &'static str {
        label(&MONTH_LABELS, self.month)
    }

    #[must_use]
    pub fn weekday_label(&self) -> &'static str {
        label(&WEEKDAY_LABELS, self.weekday)
    }

    /// Advances by one second. Returns `true` when the minute rolled over.
    pub fn advance_second(&mut self) -> bool {
        if self.second >= 59 {
            self.second = 0;
            self.advance_minute();
            true
        } else {
            self.second += 1;
            false
        }
    }

    pub fn advance_minute(&mut self) {
        if self.minute >= 59 {
            self.minute = 0;
            self.advance_hour();
        } else {
            self.minute += 1;
        }
    }

    pub fn advance_hour(&mut self) {
        if self.hour >= 23 {
            self.hour = 0;
            self.advance_day();
        } else {
            self.hour += 1;
        }
    }

    pub fn advance_day(&mut self) {
        if !self.is_date_known() {
            return;
        }

        if (1..=7).contains(&self.weekday) {
            self.weekday = self.weekday % 7 + 1;
        }

        if self.day >= days_in_month(self.month, self.year) {
            self.day = 1;
            self.advance_month();
        } else {
            self.day += 1;
        }
    }

    fn advance_month(&mut self) {
        if self.month >= 12 {
            self.month = 1;
            self.year = (self.year + 1) % 100;
        } else {
            self.month += 1;
        }
    }
}

fn label(table: &[&'static str], one_based: u8) -> &'static str {
    usize::from(one_based)
        .checked_sub(1)
        .and_then(|index| table.get(index))
        .copied()
        .unwrap_or("---")
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:02} {} {} {:02}:{:02}:{:02} {}",
            self.weekday_label(),
            self.day,
            self.month_label(),
            self.full_year(),
            self.hour,
            self.minute,
            self.second,
            self.time_zone().label()
        )
    }
}

/// Result of one clock tick.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Tick {
    pub snapshot: ClockSnapshot,
    /// Sleep to request before the next tick.
    pub next_delay_ms: u32,
}

/// Owns the running calendar and the drift corrector that paces it.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalClock {
    calendar: Calendar,
    drift: DriftFilter,
    boundary: MinuteBoundary,
}

impl LocalClock {
    /// Creates an unset clock whose first tick is measured against `start_ms`.
    #[must_use]
    pub const fn new(config: &ReceiverConfig, start_ms: u64) -> Self {
        Self {
            calendar: Calendar::unset(),
            drift: DriftFilter::new(config.gains, start_ms),
            boundary: config.minute_boundary,
        }
    }

    #[must_use]
    pub const fn calendar(&self) -> Calendar {
        self.calendar
    }

    /// Delay to sleep before the next tick.
    #[must_use]
    pub const fn next_delay_ms(&self) -> u32 {
        self.drift.delay_ms()
    }

    /// Overwrites the calendar from a decoded frame and zeroes the seconds.
    pub fn resync(&mut self, sample: &TimeSample) -> ClockSnapshot {
        self.calendar = Calendar::from_sample(sample);
        self.calendar
    }

    /// Realigns on a minute marker whose frame could not be decoded.
    pub fn start_new_minute(&mut self) -> ClockSnapshot {
        if self.boundary == MinuteBoundary::AdvanceThenReset {
            self.calendar.advance_minute();
        }
        self.calendar.second = 0;
        self.calendar
    }

    /// Advances one second and measures the tick for the drift corrector.
    pub fn tick(&mut self, now_ms: u64) -> Tick {
        let next_delay_ms = self.drift.on_tick(now_ms);
        self.calendar.advance_second();
        Tick {
            snapshot: self.calendar,
            next_delay_ms,
        }
    }
}
