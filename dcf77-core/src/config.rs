//! Build-time receiver configuration.
//!
//! Every threshold the pipeline relies on lives here as a `const` so the
//! firmware and the emulator agree on timing without any runtime surface.
//! [`ReceiverConfig`] bundles the values that callers thread through the
//! assembler, decoder, and clock.

/// Half-open millisecond window `[start_ms, end_ms)`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Window {
    pub start_ms: u32,
    pub end_ms: u32,
}

impl Window {
    #[must_use]
    pub const fn new(start_ms: u32, end_ms: u32) -> Self {
        Self { start_ms, end_ms }
    }

    /// Returns `true` when `duration_ms` falls inside the window.
    #[must_use]
    pub const fn contains(&self, duration_ms: u32) -> bool {
        duration_ms >= self.start_ms && duration_ms < self.end_ms
    }
}

/// Low period preceding a 200 ms pulse (logical one).
pub const ONE_WINDOW: Window = Window::new(750, 850);
/// Low period preceding a 100 ms pulse (logical zero).
pub const ZERO_WINDOW: Window = Window::new(850, 950);
/// Silent second 59 following a logical one in second 58.
pub const MARKER_ONE_WINDOW: Window = Window::new(1_750, 1_850);
/// Silent second 59 following a logical zero in second 58.
pub const MARKER_ZERO_WINDOW: Window = Window::new(1_850, 1_950);

/// Minimum pulse width accepted by the edge input.
pub const DEBOUNCE_MS: u32 = 80;
/// Silence tolerated by the signal watchdog before it reports a timeout.
pub const WATCHDOG_TIMEOUT_MS: u32 = 2_000;

/// Nominal spacing between clock ticks.
pub const TICK_PERIOD_MS: u32 = 1_000;
/// Lower clamp for both the measured period and the computed delay.
pub const MIN_DELAY_MS: u32 = 10;
/// Upper clamp for both the measured period and the computed delay.
pub const MAX_DELAY_MS: u32 = 1_100;

/// Proportional gain of the drift corrector.
pub const PID_GAIN: f32 = 0.55;
/// Integral time constant (ms).
pub const PID_TI_MS: f32 = 3_000.0;
/// Derivative time constant (ms).
pub const PID_TD_MS: f32 = 10.0;
/// Derivative low-pass factor.
pub const PID_N: f32 = 10.0;
/// Sampling period of the corrector (ms), one clock tick.
pub const PID_TS_MS: f32 = 1_000.0;

/// Number of symbols in a complete frame when the final bit is kept.
pub const FRAME_SYMBOLS: usize = 60;

/// Handling of the data bit folded into the minute-marker duration.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MarkerPolicy {
    /// Append bit 58 before the end-of-minute symbol (60-symbol frames).
    PushFinalBit,
    /// Drop bit 58; frames close at 59 symbols and the date parity is lost.
    DropFinalBit,
}

impl MarkerPolicy {
    /// Frame length, marker included, expected under this policy.
    #[must_use]
    pub const fn expected_len(self) -> usize {
        match self {
            MarkerPolicy::PushFinalBit => FRAME_SYMBOLS,
            MarkerPolicy::DropFinalBit => FRAME_SYMBOLS - 1,
        }
    }
}

/// What the clock does when a minute marker arrives without a usable frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MinuteBoundary {
    /// Advance the minute (with rollover) and zero the seconds.
    AdvanceThenReset,
    /// Only zero the seconds.
    ResetOnly,
}

/// Gains for [`crate::drift::FilteredPid`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PidGains {
    pub gain: f32,
    pub ti_ms: f32,
    pub td_ms: f32,
    pub n: f32,
    pub ts_ms: f32,
}

impl PidGains {
    /// Experimentally tuned values for a cooperative scheduler.
    #[must_use]
    pub const fn nominal() -> Self {
        Self {
            gain: PID_GAIN,
            ti_ms: PID_TI_MS,
            td_ms: PID_TD_MS,
            n: PID_N,
            ts_ms: PID_TS_MS,
        }
    }
}

/// Configuration bundle threaded through the receiver.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ReceiverConfig {
    pub marker_policy: MarkerPolicy,
    pub minute_boundary: MinuteBoundary,
    pub gains: PidGains,
}

impl ReceiverConfig {
    /// Defaults matching the DCF77 transmitter and the latest firmware behaviour.
    #[must_use]
    pub const fn dcf77() -> Self {
        Self {
            marker_policy: MarkerPolicy::PushFinalBit,
            minute_boundary: MinuteBoundary::AdvanceThenReset,
            gains: PidGains::nominal(),
        }
    }

    /// Frame length the decoder requires before it looks at the payload.
    #[must_use]
    pub const fn expected_frame_len(&self) -> usize {
        self.marker_policy.expected_len()
    }
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self::dcf77()
    }
}

/// Configuration used by the firmware image.
pub const DEFAULT_CONFIG: ReceiverConfig = ReceiverConfig::dcf77();
