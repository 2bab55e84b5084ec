//! Frame validation and BCD extraction.
//!
//! A frame is accepted only when it is complete, carries the two fixed
//! markers, and passes the three even-parity groups. Fields are then read as
//! weighted sums over the BCD weight table, least significant bit first.

use core::fmt;

use crate::classifier::Symbol;
use crate::config::{MarkerPolicy, ReceiverConfig};
use crate::frame::Frame;

/// Weights applied to successive bits of a BCD field.
pub const BCD_WEIGHTS: [u8; 8] = [1, 2, 4, 8, 10, 20, 40, 80];

/// Bit range `[start, end)` within a frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FieldSpan {
    pub start: usize,
    pub end: usize,
}

impl FieldSpan {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.end - self.start
    }
}

pub const TIMEZONE_FIELD: FieldSpan = FieldSpan::new(17, 19);
pub const MINUTE_FIELD: FieldSpan = FieldSpan::new(21, 28);
pub const HOUR_FIELD: FieldSpan = FieldSpan::new(29, 35);
pub const DAY_FIELD: FieldSpan = FieldSpan::new(36, 42);
pub const WEEKDAY_FIELD: FieldSpan = FieldSpan::new(42, 45);
pub const MONTH_FIELD: FieldSpan = FieldSpan::new(45, 50);
pub const YEAR_FIELD: FieldSpan = FieldSpan::new(50, 58);

/// Minute bits plus parity bit 28.
pub const MINUTE_PARITY: FieldSpan = FieldSpan::new(21, 29);
/// Hour bits plus parity bit 35.
pub const HOUR_PARITY: FieldSpan = FieldSpan::new(29, 36);
/// Date bits plus parity bit 58.
pub const DATE_PARITY: FieldSpan = FieldSpan::new(36, 59);

/// Index of the always-zero start-of-minute bit.
pub const FRAME_START_BIT: usize = 0;
/// Index of the always-one start-of-time bit.
pub const TIME_START_BIT: usize = 20;

/// Time zone announced by bits 17 and 18.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TimeZone {
    /// Central European Summer Time, UTC+2.
    Cest,
    /// Central European Time, UTC+1.
    Cet,
    /// Neither or both bits set.
    Unknown,
}

impl TimeZone {
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            1 => TimeZone::Cest,
            2 => TimeZone::Cet,
            _ => TimeZone::Unknown,
        }
    }

    /// Offset from UTC in hours, when known.
    #[must_use]
    pub const fn utc_offset_hours(self) -> Option<i8> {
        match self {
            TimeZone::Cest => Some(2),
            TimeZone::Cet => Some(1),
            TimeZone::Unknown => None,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            TimeZone::Cest => "CEST",
            TimeZone::Cet => "CET",
            TimeZone::Unknown => "---",
        }
    }
}

/// Calendar fields decoded from one valid frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TimeSample {
    /// Two-digit year, 0..=99.
    pub year: u8,
    pub month: u8,
    pub day: u8,
    /// 1 = Monday .. 7 = Sunday.
    pub weekday: u8,
    pub hour: u8,
    pub minute: u8,
    pub timezone_code: u8,
}

impl TimeSample {
    #[must_use]
    pub const fn time_zone(&self) -> TimeZone {
        TimeZone::from_code(self.timezone_code)
    }
}

/// Structural or parity check that rejected a frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ParityCheck {
    FrameStart,
    TimeStart,
    Minute,
    Hour,
    Date,
}

impl ParityCheck {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            ParityCheck::FrameStart => "frame-start",
            ParityCheck::TimeStart => "time-start",
            ParityCheck::Minute => "minute-parity",
            ParityCheck::Hour => "hour-parity",
            ParityCheck::Date => "date-parity",
        }
    }
}

/// Reasons a frame could not be decoded.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DecodeError {
    /// Wrong number of symbols between markers.
    Incomplete { length: usize },
    /// Marker bit or parity group mismatch.
    Parity(ParityCheck),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Incomplete { length } => write!(f, "incomplete frame (size {length})"),
            DecodeError::Parity(check) => write!(f, "parity error ({})", check.label()),
        }
    }
}

/// Sums `weight[k] * bit[k]` over `bits`, using the first `bits.len()` weights.
///
/// Bits beyond the weight table are ignored.
#[must_use]
pub fn bcd_decode<I>(bits: I) -> u8
where
    I: IntoIterator<Item = bool>,
{
    bits.into_iter()
        .zip(BCD_WEIGHTS)
        .filter(|(bit, _)| *bit)
        .fold(0u8, |total, (_, weight)| total.wrapping_add(weight))
}

/// Encodes `value` into `width` bits, least significant weight first.
///
/// Returns `None` when `value` is not representable in that width.
#[must_use]
pub fn bcd_encode(value: u8, width: usize) -> Option<[bool; 8]> {
    let tens = value / 10;
    if width > BCD_WEIGHTS.len() || tens > 9 {
        return None;
    }

    let units = value % 10;
    let mut bits = [false; 8];
    for (index, bit) in bits.iter_mut().enumerate().take(width) {
        let digit = if index < 4 { units } else { tens };
        *bit = (digit >> (index % 4)) & 1 == 1;
    }

    (bcd_decode(bits.iter().take(width).copied()) == value).then_some(bits)
}

/// Even-parity predicate: `true` when `ones` is even.
#[must_use]
pub const fn even_parity(ones: usize) -> bool {
    ones % 2 == 0
}

fn field(frame: &Frame, span: FieldSpan) -> u8 {
    bcd_decode(
        frame.symbols()[span.start..span.end]
            .iter()
            .map(|symbol| symbol.is_one()),
    )
}

fn check_markers(frame: &Frame) -> Result<(), ParityCheck> {
    if frame.get(FRAME_START_BIT) != Some(Symbol::ZERO) {
        return Err(ParityCheck::FrameStart);
    }
    if frame.get(TIME_START_BIT) != Some(Symbol::ONE) {
        return Err(ParityCheck::TimeStart);
    }
    Ok(())
}

fn check_parity(frame: &Frame, policy: MarkerPolicy) -> Result<(), ParityCheck> {
    let groups = [
        (MINUTE_PARITY, ParityCheck::Minute),
        (HOUR_PARITY, ParityCheck::Hour),
        (DATE_PARITY, ParityCheck::Date),
    ];

    for (span, check) in groups {
        // Bit 58 never arrives when the marker drops the final bit.
        if check == ParityCheck::Date && policy == MarkerPolicy::DropFinalBit {
            continue;
        }
        if !even_parity(frame.count_ones(span.start, span.end)) {
            return Err(check);
        }
    }
    Ok(())
}

/// Validates `frame` and extracts its calendar fields.
///
/// # Errors
///
/// Returns [`DecodeError::Incomplete`] when the frame length differs from the
/// configured target, and [`DecodeError::Parity`] when a marker or parity
/// group fails.
pub fn decode(frame: &Frame, config: &ReceiverConfig) -> Result<TimeSample, DecodeError> {
    if !frame.is_complete(config.expected_frame_len()) {
        return Err(DecodeError::Incomplete {
            length: frame.len(),
        });
    }

    check_markers(frame).map_err(DecodeError::Parity)?;
    check_parity(frame, config.marker_policy).map_err(DecodeError::Parity)?;

    Ok(TimeSample {
        year: field(frame, YEAR_FIELD),
        month: field(frame, MONTH_FIELD),
        day: field(frame, DAY_FIELD),
        weekday: field(frame, WEEKDAY_FIELD),
        hour: field(frame, HOUR_FIELD),
        minute: field(frame, MINUTE_FIELD),
        timezone_code: field(frame, TIMEZONE_FIELD),
    })
}
