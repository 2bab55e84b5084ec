//! Edge events produced by the demodulator input.
//!
//! The receiver module drives its output high while the carrier is reduced,
//! so each second starts with a rising edge followed by a 100 ms or 200 ms
//! pulse. [`EdgeTimer`] turns settled level changes into [`EdgeEvent`]s that
//! carry the duration of the level that just ended.

/// Electrical level of the monitored input.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Level {
    High,
    Low,
}

impl Level {
    /// Helper converting a sampled pin state into a [`Level`].
    #[must_use]
    pub const fn from_high(is_high: bool) -> Self {
        if is_high { Level::High } else { Level::Low }
    }
}

/// One transition of the monitored input.
///
/// `level` is the level entered by the transition and `duration_ms` is how
/// long the previous level lasted.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct EdgeEvent {
    pub level: Level,
    pub duration_ms: u32,
}

impl EdgeEvent {
    #[must_use]
    pub const fn new(level: Level, duration_ms: u32) -> Self {
        Self { level, duration_ms }
    }

    /// Returns `true` for transitions back to the active (pulse) level.
    #[must_use]
    pub const fn is_rising(&self) -> bool {
        matches!(self.level, Level::High)
    }
}

/// Measures how long each level lasted between settled transitions.
#[derive(Clone, Debug)]
pub struct EdgeTimer {
    level: Level,
    last_change_ms: Option<u64>,
}

impl EdgeTimer {
    /// Creates a timer assuming the input idles at `initial`.
    #[must_use]
    pub const fn new(initial: Level) -> Self {
        Self {
            level: initial,
            last_change_ms: None,
        }
    }

    /// Current settled level.
    #[must_use]
    pub const fn level(&self) -> Level {
        self.level
    }

    /// Feeds a settled level sampled at `at_ms`.
    ///
    /// Returns `None` when the level did not change. The first transition
    /// after construction reports a zero duration since nothing was measured.
    pub fn observe(&mut self, level: Level, at_ms: u64) -> Option<EdgeEvent> {
        if level == self.level {
            return None;
        }

        let duration_ms = self
            .last_change_ms
            .map_or(0, |previous| saturating_millis(at_ms.saturating_sub(previous)));
        self.level = level;
        self.last_change_ms = Some(at_ms);
        Some(EdgeEvent::new(level, duration_ms))
    }
}

fn saturating_millis(elapsed: u64) -> u32 {
    u32::try_from(elapsed).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_duration_of_previous_level() {
        let mut timer = EdgeTimer::new(Level::Low);
        assert_eq!(
            timer.observe(Level::High, 500),
            Some(EdgeEvent::new(Level::High, 0))
        );
        assert_eq!(
            timer.observe(Level::Low, 700),
            Some(EdgeEvent::new(Level::Low, 200))
        );
        let rising = timer.observe(Level::High, 1_500).expect("rising edge");
        assert!(rising.is_rising());
        assert_eq!(rising.duration_ms, 800);
    }

    #[test]
    fn repeated_level_is_ignored() {
        let mut timer = EdgeTimer::new(Level::Low);
        assert!(timer.observe(Level::Low, 10).is_none());
        assert!(timer.observe(Level::High, 20).is_some());
        assert!(timer.observe(Level::High, 30).is_none());
        assert_eq!(timer.level(), Level::High);
    }
}
