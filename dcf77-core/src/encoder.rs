//! Reference DCF77 transmitter.
//!
//! Produces the bit layout and edge timing a receiver observes for one
//! minute. The emulator uses it as its signal source and the tests use it to
//! build frames without spelling out sixty symbols by hand.

use crate::classifier::{Bit, Symbol};
use crate::decoder::{
    DATE_PARITY, DAY_FIELD, FRAME_START_BIT, FieldSpan, HOUR_FIELD, HOUR_PARITY, MINUTE_FIELD,
    MINUTE_PARITY, MONTH_FIELD, TIME_START_BIT, TIMEZONE_FIELD, TimeSample, WEEKDAY_FIELD,
    YEAR_FIELD, bcd_encode,
};
use crate::edge::Level;
use crate::frame::Frame;

/// Data bits transmitted in seconds 0..=58.
pub const DATA_BITS: usize = 59;
/// Length of one broadcast minute.
pub const MINUTE_MS: u64 = 60_000;

const ZERO_PULSE_MS: u64 = 100;
const ONE_PULSE_MS: u64 = 200;

fn write_field(bits: &mut [Bit; DATA_BITS], span: FieldSpan, value: u8) -> Option<()> {
    let encoded = bcd_encode(value, span.width())?;
    for (offset, bit) in encoded.iter().take(span.width()).enumerate() {
        bits[span.start + offset] = Bit::from_bool(*bit);
    }
    Some(())
}

fn write_parity(bits: &mut [Bit; DATA_BITS], span: FieldSpan) {
    let parity_index = span.end - 1;
    let ones = bits[span.start..parity_index]
        .iter()
        .filter(|bit| bit.is_one())
        .count();
    bits[parity_index] = Bit::from_bool(ones % 2 == 1);
}

/// Encodes `sample` into the 59 data bits of one minute.
///
/// Returns `None` when a field does not fit its BCD width.
#[must_use]
pub fn encode_bits(sample: &TimeSample) -> Option<[Bit; DATA_BITS]> {
    let mut bits = [Bit::Zero; DATA_BITS];
    bits[FRAME_START_BIT] = Bit::Zero;
    bits[TIME_START_BIT] = Bit::One;

    write_field(&mut bits, TIMEZONE_FIELD, sample.timezone_code)?;
    write_field(&mut bits, MINUTE_FIELD, sample.minute)?;
    write_field(&mut bits, HOUR_FIELD, sample.hour)?;
    write_field(&mut bits, DAY_FIELD, sample.day)?;
    write_field(&mut bits, WEEKDAY_FIELD, sample.weekday)?;
    write_field(&mut bits, MONTH_FIELD, sample.month)?;
    write_field(&mut bits, YEAR_FIELD, sample.year)?;

    write_parity(&mut bits, MINUTE_PARITY);
    write_parity(&mut bits, HOUR_PARITY);
    write_parity(&mut bits, DATE_PARITY);
    Some(bits)
}

/// Builds the frame a receiver assembles for `bits`: data then the marker.
#[must_use]
pub fn frame_from_bits(bits: &[Bit; DATA_BITS]) -> Frame {
    let mut frame = Frame::new();
    for bit in bits {
        frame.push(Symbol::Data(*bit));
    }
    frame.push(Symbol::EndOfMinute);
    frame
}

/// Encodes `sample` straight into a complete frame.
#[must_use]
pub fn encode_frame(sample: &TimeSample) -> Option<Frame> {
    encode_bits(sample).map(|bits| frame_from_bits(&bits))
}

/// Transitions of the demodulated signal for one broadcast minute.
///
/// Each second `s` in `0..=58` rises at `start_ms + s * 1000` and falls after
/// a 100 ms (zero) or 200 ms (one) pulse. Second 59 stays low.
#[derive(Clone, Debug)]
pub struct PulseTrain {
    bits: [Bit; DATA_BITS],
    start_ms: u64,
    index: usize,
}

impl PulseTrain {
    #[must_use]
    pub const fn new(bits: [Bit; DATA_BITS], start_ms: u64) -> Self {
        Self {
            bits,
            start_ms,
            index: 0,
        }
    }

    /// Start of the following minute.
    #[must_use]
    pub const fn end_ms(&self) -> u64 {
        self.start_ms + MINUTE_MS
    }
}

impl Iterator for PulseTrain {
    type Item = (Level, u64);

    fn next(&mut self) -> Option<Self::Item> {
        let second = self.index / 2;
        let bit = *self.bits.get(second)?;
        let rise_ms = self.start_ms + second as u64 * 1_000;
        let edge = if self.index % 2 == 0 {
            (Level::High, rise_ms)
        } else {
            let pulse = if bit.is_one() {
                ONE_PULSE_MS
            } else {
                ZERO_PULSE_MS
            };
            (Level::Low, rise_ms + pulse)
        };
        self.index += 1;
        Some(edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{Classification, classify};
    use crate::config::ReceiverConfig;
    use crate::decoder::decode;
    use crate::edge::EdgeTimer;
    use crate::frame::FrameAssembler;

    const SAMPLE: TimeSample = TimeSample {
        year: 24,
        month: 2,
        day: 29,
        weekday: 4,
        hour: 13,
        minute: 47,
        timezone_code: 2,
    };

    #[test]
    fn encoded_frame_decodes_back() {
        let frame = encode_frame(&SAMPLE).expect("sample fits");
        assert_eq!(frame.len(), 60);
        assert_eq!(decode(&frame, &ReceiverConfig::dcf77()), Ok(SAMPLE));
    }

    #[test]
    fn out_of_range_fields_are_rejected() {
        let sample = TimeSample {
            weekday: 9,
            ..SAMPLE
        };
        assert!(encode_bits(&sample).is_none());
    }

    #[test]
    fn pulse_train_feeds_a_receiver() {
        let bits = encode_bits(&SAMPLE).expect("sample fits");
        let mut timer = EdgeTimer::new(Level::Low);
        let mut assembler = FrameAssembler::new(ReceiverConfig::dcf77().marker_policy);

        let first = PulseTrain::new(bits, 0);
        let second = PulseTrain::new(bits, first.end_ms());
        let mut completed = None;

        for (level, at_ms) in first.chain(second) {
            let Some(edge) = timer.observe(level, at_ms) else {
                continue;
            };
            let step = assembler.accept(classify(&edge));
            if step.completed.is_some() {
                completed = step.completed;
            }
        }

        let frame = completed.expect("minute marker should close the frame");
        assert_eq!(decode(&frame, &ReceiverConfig::dcf77()), Ok(SAMPLE));
    }

    #[test]
    fn silent_second_stretches_the_low_period() {
        let bits = encode_bits(&SAMPLE).expect("sample fits");
        let train = PulseTrain::new(bits, 0);
        let last_fall = train.last().expect("train has edges");
        assert_eq!(last_fall.0, Level::Low);

        let low_ms = MINUTE_MS - last_fall.1;
        let edge = crate::edge::EdgeEvent::new(Level::High, u32::try_from(low_ms).unwrap());
        assert!(matches!(classify(&edge), Classification::MinuteMarker(_)));
    }
}
