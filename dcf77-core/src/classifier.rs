//! Duration buckets that map edge timings onto protocol symbols.
//!
//! Only rising edges carry information: the low period that just ended is
//! `1000 ms - pulse`, so roughly 800 ms precedes a one and 900 ms precedes a
//! zero. The suppressed 59th second stretches that low period by a full
//! second, which folds the last data bit and the minute marker into a single
//! measurement. Guard gaps between the windows turn borderline timings into
//! [`Classification::Noise`] instead of a wrong bit.

use core::fmt;

use crate::config::{MARKER_ONE_WINDOW, MARKER_ZERO_WINDOW, ONE_WINDOW, ZERO_WINDOW};
use crate::edge::EdgeEvent;

/// Logical data bit.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Bit {
    Zero,
    One,
}

impl Bit {
    #[must_use]
    pub const fn from_bool(value: bool) -> Self {
        if value { Bit::One } else { Bit::Zero }
    }

    #[must_use]
    pub const fn is_one(self) -> bool {
        matches!(self, Bit::One)
    }
}

/// Entry stored in a frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Symbol {
    Data(Bit),
    EndOfMinute,
}

impl Symbol {
    pub const ZERO: Symbol = Symbol::Data(Bit::Zero);
    pub const ONE: Symbol = Symbol::Data(Bit::One);

    /// Returns `true` for a data one. The marker counts as neither value.
    #[must_use]
    pub const fn is_one(self) -> bool {
        matches!(self, Symbol::Data(Bit::One))
    }

    /// Single-character form used in logs and transcripts.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Symbol::Data(Bit::Zero) => '0',
            Symbol::Data(Bit::One) => '1',
            Symbol::EndOfMinute => '#',
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Result of classifying one low-period duration.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Classification {
    /// Duration outside every window; dropped without side effects.
    Noise,
    /// Regular second carrying one data bit.
    Data(Bit),
    /// Minute boundary; carries the final data bit of the minute.
    MinuteMarker(Bit),
}

/// Buckets a low-period duration.
#[must_use]
pub const fn classify_duration(duration_ms: u32) -> Classification {
    if ONE_WINDOW.contains(duration_ms) {
        Classification::Data(Bit::One)
    } else if ZERO_WINDOW.contains(duration_ms) {
        Classification::Data(Bit::Zero)
    } else if MARKER_ONE_WINDOW.contains(duration_ms) {
        Classification::MinuteMarker(Bit::One)
    } else if MARKER_ZERO_WINDOW.contains(duration_ms) {
        Classification::MinuteMarker(Bit::Zero)
    } else {
        Classification::Noise
    }
}

/// Classifies an edge; falling edges never produce a symbol.
#[must_use]
pub const fn classify(edge: &EdgeEvent) -> Classification {
    if edge.is_rising() {
        classify_duration(edge.duration_ms)
    } else {
        Classification::Noise
    }
}
