use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use dcf77_core::classifier::{Bit, Symbol, classify};
use dcf77_core::clock::{Calendar, ClockSnapshot};
use dcf77_core::config::{DEBOUNCE_MS, DEFAULT_CONFIG, WATCHDOG_TIMEOUT_MS};
use dcf77_core::decoder::{DecodeError, TimeSample};
use dcf77_core::edge::{EdgeTimer, Level};
use dcf77_core::encoder::{DATA_BITS, MINUTE_MS, PulseTrain, encode_bits};
use dcf77_core::frame::{FrameAssembler, SymbolReport};
use dcf77_core::sink::StatusSink;
use dcf77_core::station::TimeKeeper;
use dcf77_core::status::{SignalHealth, SyncCause, TimeSyncHealth};

/// The receiver is switched on part way through the first broadcast minute.
pub const POWER_ON_MS: u64 = 23_000;
/// Upper bound of the scheduling overhead added to every clock tick.
pub const DEFAULT_JITTER_MS: u32 = 12;
pub const DEFAULT_MINUTES: u32 = 6;

/// Bit flipped in corrupted minutes (inside the minute field).
const CORRUPTED_BIT: usize = 24;
const GLITCH_OFFSET_MS: u64 = 500;
const GLITCH_WIDTH_MS: u64 = 15;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Scenario {
    /// Undisturbed signal.
    Clean,
    /// Minute 2, and every fourth minute after it, carries a minute-parity error.
    Parity,
    /// Three pulses missing in minute 2.
    Dropout,
    /// Carrier gone from minute 2 second 10 until minute 4.
    Outage,
    /// Short spikes between pulses that the debounce has to absorb.
    Noise,
}

impl Scenario {
    pub const ALL: [Scenario; 5] = [
        Scenario::Clean,
        Scenario::Parity,
        Scenario::Dropout,
        Scenario::Outage,
        Scenario::Noise,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Scenario::Clean => "clean",
            Scenario::Parity => "parity",
            Scenario::Dropout => "dropout",
            Scenario::Outage => "outage",
            Scenario::Noise => "noise",
        }
    }

    pub fn log_path(self) -> &'static str {
        match self {
            Scenario::Clean => "transcripts/dcf77-clean.log",
            Scenario::Parity => "transcripts/dcf77-parity.log",
            Scenario::Dropout => "transcripts/dcf77-dropout.log",
            Scenario::Outage => "transcripts/dcf77-outage.log",
            Scenario::Noise => "transcripts/dcf77-noise.log",
        }
    }

    pub fn header(self) -> &'static str {
        match self {
            Scenario::Clean => "DCF77 emulator transcript: clean signal",
            Scenario::Parity => "DCF77 emulator transcript: parity errors",
            Scenario::Dropout => "DCF77 emulator transcript: pulse dropout",
            Scenario::Outage => "DCF77 emulator transcript: carrier outage",
            Scenario::Noise => "DCF77 emulator transcript: spike noise",
        }
    }

    pub fn from_tag(tag: &str) -> Result<Self, String> {
        Scenario::ALL
            .into_iter()
            .find(|scenario| tag.eq_ignore_ascii_case(scenario.label()))
            .ok_or_else(|| format!("Unknown scenario `{tag}`"))
    }

    fn is_silent(self, minute: u32, second: u64) -> bool {
        match self {
            Scenario::Dropout => minute == 2 && (30..=32).contains(&second),
            Scenario::Outage => (minute == 2 && second >= 10) || minute == 3,
            Scenario::Clean | Scenario::Parity | Scenario::Noise => false,
        }
    }

    fn corrupts(self, minute: u32) -> bool {
        self == Scenario::Parity && minute % 4 == 2
    }

    fn has_glitch(self, second: u64) -> bool {
        self == Scenario::Noise && second % 5 == 3
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SimulationConfig {
    pub scenario: Scenario,
    pub minutes: u32,
    /// Calendar at the start of broadcast minute 0.
    pub start: Calendar,
    pub jitter_ms: u32,
    pub seed: u64,
}

impl SimulationConfig {
    pub fn new(scenario: Scenario) -> Self {
        Self {
            scenario,
            minutes: DEFAULT_MINUTES,
            start: Calendar {
                year: 26,
                month: 10,
                day: 18,
                weekday: 7,
                hour: 11,
                minute: 58,
                second: 0,
                timezone_code: 1,
            },
            jitter_ms: DEFAULT_JITTER_MS,
            seed: 0x00DC_F077,
        }
    }

    /// Time announced by broadcast minute `minute`: the minute that begins
    /// at its closing marker.
    pub fn announced(&self, minute: u32) -> Calendar {
        let mut calendar = self.start;
        for _ in 0..=minute {
            calendar.advance_minute();
        }
        calendar.second = 0;
        calendar
    }

    /// Simulated span: every configured minute plus the marker closing the last one.
    pub fn end_ms(&self) -> u64 {
        u64::from(self.minutes) * MINUTE_MS + 1_500
    }
}

/// Builds the demodulated edge train for the whole run, time ordered.
pub fn broadcast_edges(config: &SimulationConfig) -> Result<Vec<(u64, Level)>, String> {
    let mut edges = Vec::new();

    // One extra minute so the last configured minute gets its closing marker.
    for minute in 0..=config.minutes {
        let sample = config.announced(minute).to_sample();
        let mut bits = encode_bits(&sample)
            .ok_or_else(|| format!("minute {minute} does not fit the frame: {sample:?}"))?;
        if config.scenario.corrupts(minute) {
            flip(&mut bits, CORRUPTED_BIT);
        }

        let start_ms = u64::from(minute) * MINUTE_MS;
        for (level, at_ms) in PulseTrain::new(bits, start_ms) {
            let second = (at_ms - start_ms) / 1_000;
            if config.scenario.is_silent(minute, second) {
                continue;
            }
            edges.push((at_ms, level));
            if level == Level::Low && config.scenario.has_glitch(second) {
                let spike_ms = start_ms + second * 1_000 + GLITCH_OFFSET_MS;
                edges.push((spike_ms, Level::High));
                edges.push((spike_ms + GLITCH_WIDTH_MS, Level::Low));
            }
        }
    }

    Ok(edges)
}

fn flip(bits: &mut [Bit; DATA_BITS], index: usize) {
    bits[index] = Bit::from_bool(!bits[index].is_one());
}

/// Level of the edge train at `at_ms`.
fn level_at(edges: &[(u64, Level)], at_ms: u64) -> Level {
    let index = edges.partition_point(|(edge_ms, _)| *edge_ms <= at_ms);
    index
        .checked_sub(1)
        .and_then(|last| edges.get(last))
        .map_or(Level::Low, |(_, level)| *level)
}

/// Deterministic scheduling overhead (xorshift64).
#[derive(Clone, Debug)]
pub struct Jitter {
    state: u64,
    max_ms: u32,
}

impl Jitter {
    pub fn new(seed: u64, max_ms: u32) -> Self {
        Self {
            state: seed.max(1),
            max_ms,
        }
    }

    pub fn next_ms(&mut self) -> u64 {
        if self.max_ms == 0 {
            return 0;
        }
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state % (u64::from(self.max_ms) + 1)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SinkEvent {
    Signal(SignalHealth),
    TimeSync {
        health: TimeSyncHealth,
        cause: SyncCause,
        diagnostic: Option<usize>,
    },
    Symbol(Option<SymbolReport>),
    Tick(ClockSnapshot),
}

/// Buffers sink events until the event loop stamps them with virtual time.
#[derive(Default)]
pub struct EventLog {
    events: Vec<SinkEvent>,
}

impl EventLog {
    pub fn drain(&mut self) -> Vec<SinkEvent> {
        std::mem::take(&mut self.events)
    }
}

impl StatusSink for EventLog {
    fn on_signal_health(&mut self, health: SignalHealth) {
        self.events.push(SinkEvent::Signal(health));
    }

    fn on_time_sync_health(
        &mut self,
        health: TimeSyncHealth,
        cause: SyncCause,
        diagnostic: Option<usize>,
    ) {
        self.events.push(SinkEvent::TimeSync {
            health,
            cause,
            diagnostic,
        });
    }

    fn on_symbol(&mut self, report: Option<SymbolReport>) {
        self.events.push(SinkEvent::Symbol(report));
    }

    fn on_time_tick(&mut self, snapshot: &ClockSnapshot) {
        self.events.push(SinkEvent::Tick(*snapshot));
    }
}

/// End-of-run figures.
#[derive(Clone, Debug)]
pub struct Summary {
    pub decoded: Vec<TimeSample>,
    pub rejected: Vec<DecodeError>,
    pub signal: SignalHealth,
    pub time_sync: TimeSyncHealth,
    pub clock: ClockSnapshot,
    pub ticks: usize,
    /// Mean spacing of the most recent ticks.
    pub mean_tick_period_ms: Option<f64>,
    /// Every time-sync health the run went through, in order.
    pub sync_history: Vec<TimeSyncHealth>,
}

const PERIOD_WINDOW: usize = 60;

/// Runs one scenario through the receiver pipeline in virtual time.
pub struct Simulation {
    config: SimulationConfig,
    keeper: TimeKeeper<EventLog>,
    timer: EdgeTimer,
    assembler: FrameAssembler,
    jitter: Jitter,
    bits: String,
    tick_times: VecDeque<u64>,
    ticks: usize,
    decoded: Vec<TimeSample>,
    rejected: Vec<DecodeError>,
    sync_history: Vec<TimeSyncHealth>,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            keeper: TimeKeeper::new(DEFAULT_CONFIG, POWER_ON_MS, EventLog::default()),
            timer: EdgeTimer::new(Level::Low),
            assembler: FrameAssembler::new(DEFAULT_CONFIG.marker_policy),
            jitter: Jitter::new(config.seed, config.jitter_ms),
            bits: String::new(),
            tick_times: VecDeque::with_capacity(PERIOD_WINDOW + 1),
            ticks: 0,
            decoded: Vec::new(),
            rejected: Vec::new(),
            sync_history: Vec::new(),
            config,
        }
    }

    /// Drives the run to completion, handing each transcript line to `emit`
    /// with its virtual timestamp.
    pub fn run<W>(mut self, mut emit: W) -> io::Result<Summary>
    where
        W: FnMut(u64, &str) -> io::Result<()>,
    {
        let edges = broadcast_edges(&self.config)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
        let end_ms = self.config.end_ms();
        let debounce_ms = u64::from(DEBOUNCE_MS);
        let watchdog_ms = u64::from(WATCHDOG_TIMEOUT_MS);

        let mut upcoming = edges
            .iter()
            .copied()
            .skip_while(|(at_ms, _)| *at_ms < POWER_ON_MS)
            .peekable();
        let mut settling: Option<u64> = None;
        let mut watchdog_deadline = POWER_ON_MS + watchdog_ms;
        let mut next_tick =
            POWER_ON_MS + u64::from(self.keeper.clock().next_delay_ms()) + self.jitter.next_ms();

        emit(
            POWER_ON_MS,
            &format!(
                "POWER on, scenario={} minutes={}",
                self.config.scenario.label(),
                self.config.minutes
            ),
        )?;

        loop {
            let edge_at = match settling {
                Some(_) => None,
                None => upcoming.peek().map(|(at_ms, _)| *at_ms),
            };
            let sample_at = settling.map(|edge_ms| edge_ms + debounce_ms);
            let now = [edge_at, sample_at, Some(watchdog_deadline), Some(next_tick)]
                .into_iter()
                .flatten()
                .min()
                .unwrap_or(end_ms);
            if now > end_ms {
                break;
            }

            let mut lines = Vec::new();
            if edge_at == Some(now) {
                upcoming.next();
                settling = Some(now);
                watchdog_deadline = now + watchdog_ms;
            } else if let Some(edge_ms) = settling.filter(|_| sample_at == Some(now)) {
                settling = None;
                // Edges during the settle window are never seen by the input.
                while upcoming.next_if(|(at_ms, _)| *at_ms <= now).is_some() {}
                self.settled(level_at(&edges, now), edge_ms, &mut lines);
            } else if watchdog_deadline == now {
                self.keeper.signal_timeout();
                watchdog_deadline = now + watchdog_ms;
            } else {
                let delay_ms = self.keeper.tick(now);
                self.record_tick(now);
                next_tick = now + u64::from(delay_ms) + self.jitter.next_ms();
            }

            self.describe_events(&mut lines);
            for line in &lines {
                emit(now, line)?;
            }
        }

        let summary = self.summary();
        emit(
            end_ms,
            &format!(
                "DONE decoded={} rejected={} clock={} mean-tick={}",
                summary.decoded.len(),
                summary.rejected.len(),
                summary.clock,
                summary
                    .mean_tick_period_ms
                    .map_or_else(|| "n/a".to_string(), |ms| format!("{ms:.1}ms")),
            ),
        )?;
        Ok(summary)
    }

    fn settled(&mut self, level: Level, edge_ms: u64, lines: &mut Vec<String>) {
        let Some(edge) = self.timer.observe(level, edge_ms) else {
            return;
        };

        let step = self.assembler.accept(classify(&edge));
        for report in step.appended {
            self.keeper.symbol_received(report);
        }
        self.describe_events(lines);

        if let Some(frame) = step.completed {
            match self.keeper.minute_complete(&frame) {
                Ok(sample) => {
                    lines.push(format!("DEC  ok {}", describe_sample(&sample)));
                    self.decoded.push(sample);
                }
                Err(error) => {
                    lines.push(format!("DEC  rejected: {error}"));
                    self.rejected.push(error);
                }
            }
        }
    }

    fn record_tick(&mut self, now: u64) {
        self.ticks += 1;
        self.tick_times.push_back(now);
        if self.tick_times.len() > PERIOD_WINDOW + 1 {
            self.tick_times.pop_front();
        }
    }

    fn describe_events(&mut self, lines: &mut Vec<String>) {
        for event in self.keeper.sink_mut().drain() {
            match event {
                SinkEvent::Signal(health) => lines.push(format!("SIG  {health}")),
                SinkEvent::TimeSync {
                    health,
                    cause,
                    diagnostic,
                } => {
                    self.sync_history.push(health);
                    let detail = diagnostic.map_or_else(String::new, |size| format!(" size={size}"));
                    lines.push(format!("SYNC {health} cause={}{detail}", cause.label()));
                }
                SinkEvent::Symbol(Some(report)) => {
                    self.bits.push(report.symbol.as_char());
                    if report.symbol == Symbol::EndOfMinute {
                        lines.push(format!("BITS {}", self.bits));
                        self.bits.clear();
                    }
                }
                SinkEvent::Symbol(None) => {}
                SinkEvent::Tick(snapshot) => {
                    if snapshot.second == 0 {
                        lines.push(format!("CLK  {snapshot}"));
                    }
                }
            }
        }
    }

    fn summary(&self) -> Summary {
        Summary {
            decoded: self.decoded.clone(),
            rejected: self.rejected.clone(),
            signal: self.keeper.status().signal(),
            time_sync: self.keeper.status().time_sync(),
            clock: self.keeper.snapshot(),
            ticks: self.ticks,
            mean_tick_period_ms: mean_period(&self.tick_times),
            sync_history: self.sync_history.clone(),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean_period(times: &VecDeque<u64>) -> Option<f64> {
    let first = times.front()?;
    let last = times.back()?;
    let intervals = times.len().checked_sub(1).filter(|count| *count > 0)?;
    Some((last - first) as f64 / intervals as f64)
}

fn describe_sample(sample: &TimeSample) -> String {
    let zone = sample.time_zone();
    let offset = zone
        .utc_offset_hours()
        .map_or_else(String::new, |hours| format!(" (UTC+{hours})"));
    format!(
        "20{:02}-{:02}-{:02} {:02}:{:02} {}{offset}",
        sample.year,
        sample.month,
        sample.day,
        sample.hour,
        sample.minute,
        zone.label()
    )
}

pub struct TranscriptLogger {
    writer: BufWriter<std::fs::File>,
}

impl TranscriptLogger {
    pub fn new(path: &Path, header: &str) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut logger = Self {
            writer: BufWriter::new(file),
        };

        logger.write_header(header)?;
        Ok(logger)
    }

    fn write_header(&mut self, header: &str) -> io::Result<()> {
        writeln!(self.writer, "# {header}")?;
        writeln!(self.writer, "# Timestamps are virtual milliseconds since broadcast start")?;
        writeln!(self.writer)?;
        self.writer.flush()
    }

    pub fn append_line(&mut self, at_ms: u64, line: &str) -> io::Result<()> {
        writeln!(self.writer, "{}", format_line(at_ms, line))
    }

    pub fn finish(mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

pub fn format_line(at_ms: u64, line: &str) -> String {
    format!("[+{at_ms:>7} ms] {line}")
}
