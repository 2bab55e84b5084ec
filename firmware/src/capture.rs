//! Edge capture: settled levels in, symbols and frames out.

use dcf77_core::classifier::classify;
use dcf77_core::config::MarkerPolicy;
use dcf77_core::edge::{EdgeTimer, Level};
use dcf77_core::frame::{FrameAssembler, SymbolReport};
use heapless::Vec;

use crate::handoff::Signals;
use crate::telemetry;

/// Symbols appended by a single edge.
pub type Appended = Vec<SymbolReport, 2>;

/// Owns the live frame. Only the edge task touches it.
pub struct EdgeCapture {
    timer: EdgeTimer,
    assembler: FrameAssembler,
}

impl EdgeCapture {
    pub const fn new(initial: Level, policy: MarkerPolicy) -> Self {
        Self {
            timer: EdgeTimer::new(initial),
            assembler: FrameAssembler::new(policy),
        }
    }

    /// Feeds a debounced level sampled at `at_ms`.
    ///
    /// A completed frame is moved into `signals` before the decoder is woken.
    /// The returned symbols still have to be reported to the time keeper.
    pub fn on_level(&mut self, level: Level, at_ms: u64, signals: &Signals) -> Appended {
        let Some(edge) = self.timer.observe(level, at_ms) else {
            return Appended::new();
        };

        let step = self.assembler.accept(classify(&edge));
        if step.is_idle() {
            return Appended::new();
        }
        if let Some(frame) = step.completed {
            let length = frame.len();
            if signals.publish_frame(frame) {
                telemetry::log_frame_dropped(length);
            }
        }
        step.appended
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcf77_core::config::ReceiverConfig;
    use dcf77_core::decoder::{TimeSample, decode};
    use dcf77_core::encoder::{PulseTrain, encode_bits};

    const SAMPLE: TimeSample = TimeSample {
        year: 26,
        month: 10,
        day: 18,
        weekday: 7,
        hour: 9,
        minute: 15,
        timezone_code: 1,
    };

    #[test]
    fn pulse_train_produces_a_decodable_frame() {
        let signals = Signals::new();
        let config = ReceiverConfig::dcf77();
        let mut capture = EdgeCapture::new(Level::Low, config.marker_policy);
        let bits = encode_bits(&SAMPLE).expect("sample fits");

        let first = PulseTrain::new(bits, 0);
        let second = PulseTrain::new(bits, first.end_ms());
        let mut symbols = 0usize;
        for (level, at_ms) in first.chain(second) {
            symbols += capture.on_level(level, at_ms, &signals).len();
        }

        assert!(signals.frame_ready.is_set());
        let frame = signals.frame.take().expect("frame published");
        assert_eq!(decode(&frame, &config), Ok(SAMPLE));
        // One closed minute plus 58 bits of the unterminated second one.
        assert_eq!(symbols, 60 + 58);
    }

    #[test]
    fn unchanged_level_is_ignored() {
        let signals = Signals::new();
        let mut capture = EdgeCapture::new(Level::Low, MarkerPolicy::PushFinalBit);
        assert!(capture.on_level(Level::Low, 5, &signals).is_empty());
        assert!(!signals.frame_ready.is_set());
    }
}
