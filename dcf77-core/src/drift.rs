//! Tick-period correction.
//!
//! The clock task sleeps between ticks on a cooperative scheduler, so every
//! tick lands a little later than asked. [`DriftFilter`] measures the real
//! spacing of the previous tick, feeds `1000 - measured` into a
//! [`FilteredPid`], and uses the output as the next sleep.

use crate::config::{MAX_DELAY_MS, MIN_DELAY_MS, PidGains, TICK_PERIOD_MS};

/// PID corrector with a first-order low-pass on the derivative term.
///
/// Discretised with backward differences:
///
/// ```text
/// P[k] = G e[k]
/// I[k] = I[k-1] + G Ts / Ti e[k]
/// D[k] = Td / (Td + N Ts) D[k-1] + G Td N / (Td + N Ts) (e[k] - e[k-1])
/// u[k] = P[k] + I[k] + D[k]
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FilteredPid {
    gains: PidGains,
    min_output: f32,
    max_output: f32,
    integral: f32,
    derivative: f32,
    previous_error: f32,
}

impl FilteredPid {
    /// Creates a corrector whose integral and output stay in `[min_output, max_output]`.
    #[must_use]
    pub const fn new(gains: PidGains, min_output: f32, max_output: f32) -> Self {
        Self {
            gains,
            min_output,
            max_output,
            integral: 0.0,
            derivative: 0.0,
            previous_error: 0.0,
        }
    }

    /// Advances the corrector by one sample and returns the clamped output.
    pub fn update(&mut self, error: f32) -> f32 {
        let PidGains {
            gain,
            ti_ms,
            td_ms,
            n,
            ts_ms,
        } = self.gains;

        let proportional = gain * error;

        self.integral = (self.integral + gain * ts_ms / ti_ms * error)
            .clamp(self.min_output, self.max_output);

        let smoothing = td_ms / (td_ms + n * ts_ms);
        self.derivative = smoothing * self.derivative
            + gain * n * smoothing * (error - self.previous_error);
        self.previous_error = error;

        (proportional + self.integral + self.derivative).clamp(self.min_output, self.max_output)
    }
}

/// Feedback loop keeping the average tick period at one second.
#[derive(Clone, Debug, PartialEq)]
pub struct DriftFilter {
    pid: FilteredPid,
    last_tick_ms: u64,
    delay_ms: u32,
}

impl DriftFilter {
    /// Creates a filter whose first measurement is taken against `start_ms`.
    #[must_use]
    pub const fn new(gains: PidGains, start_ms: u64) -> Self {
        Self {
            pid: FilteredPid::new(gains, as_f32(MIN_DELAY_MS), as_f32(MAX_DELAY_MS)),
            last_tick_ms: start_ms,
            delay_ms: MIN_DELAY_MS,
        }
    }

    /// Sleep requested before the next tick.
    #[must_use]
    pub const fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    /// Records a tick at `now_ms` and returns the delay until the next one.
    pub fn on_tick(&mut self, now_ms: u64) -> u32 {
        let measured = clamp_period(now_ms.saturating_sub(self.last_tick_ms));
        self.last_tick_ms = now_ms;

        let error = as_f32(TICK_PERIOD_MS) - as_f32(measured);
        let output = self.pid.update(error);
        self.delay_ms = to_delay(output);
        self.delay_ms
    }
}

fn clamp_period(elapsed_ms: u64) -> u32 {
    let clamped = elapsed_ms.clamp(u64::from(MIN_DELAY_MS), u64::from(MAX_DELAY_MS));
    u32::try_from(clamped).unwrap_or(MAX_DELAY_MS)
}

#[allow(clippy::cast_precision_loss)]
const fn as_f32(value: u32) -> f32 {
    value as f32
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_delay(output: f32) -> u32 {
    let bounded = output.clamp(as_f32(MIN_DELAY_MS), as_f32(MAX_DELAY_MS));
    (bounded + 0.5) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(filter: &mut DriftFilter, periods: &[u64]) -> [u32; 16] {
        let mut out = [0u32; 16];
        let mut now = filter.last_tick_ms;
        for (slot, period) in out.iter_mut().zip(periods) {
            now += period;
            *slot = filter.on_tick(now);
        }
        out
    }

    #[test]
    fn replay_is_deterministic() {
        let periods = [
            1_100, 1_100, 640, 1_020, 1_004, 998, 1_003, 1_012, 990, 1_000, 1_007, 1_001, 5, 3_000,
            1_000, 999,
        ];

        let mut first = DriftFilter::new(PidGains::nominal(), 0);
        let mut second = DriftFilter::new(PidGains::nominal(), 0);

        assert_eq!(run(&mut first, &periods), run(&mut second, &periods));
        assert_eq!(first, second);
    }

    #[test]
    fn delay_stays_within_bounds() {
        let mut filter = DriftFilter::new(PidGains::nominal(), 0);
        let outputs = run(&mut filter, &[10; 16]);
        assert!(outputs.iter().all(|delay| (MIN_DELAY_MS..=MAX_DELAY_MS).contains(delay)));

        let outputs = run(&mut filter, &[60_000; 16]);
        assert!(outputs.iter().all(|delay| (MIN_DELAY_MS..=MAX_DELAY_MS).contains(delay)));
    }

    #[test]
    fn converges_under_constant_overhead() {
        // Each tick arrives `delay + 7 ms` after the previous one.
        let mut filter = DriftFilter::new(PidGains::nominal(), 0);
        let mut now = 0u64;
        let mut delay = filter.delay_ms();
        for _ in 0..200 {
            now += u64::from(delay) + 7;
            delay = filter.on_tick(now);
        }

        let period = delay + 7;
        assert!((995..=1_005).contains(&period), "settled period {period}");
    }

    #[test]
    fn integral_is_clamped() {
        let mut pid = FilteredPid::new(PidGains::nominal(), 10.0, 1_100.0);
        for _ in 0..100 {
            pid.update(990.0);
        }
        assert_eq!(pid.integral.to_bits(), 1_100.0f32.to_bits());

        for _ in 0..100 {
            pid.update(-5_000.0);
        }
        assert_eq!(pid.integral.to_bits(), 10.0f32.to_bits());
    }
}
