use dcf77_core::classifier::{Bit, Classification, Symbol, classify, classify_duration};
use dcf77_core::config::{MarkerPolicy, ReceiverConfig};
use dcf77_core::decoder::{DecodeError, ParityCheck, TimeSample, decode};
use dcf77_core::edge::{EdgeEvent, Level};
use dcf77_core::frame::{Frame, FrameAssembler};

/// Minute 5, hour 2, 1 Jan 2011 (a Monday by weekday code), CET.
const SCENARIO: &str = concat!(
    "00000000000000000", // 0..=16, bit 0 is the frame start
    "01",                // 17..=18, time zone code 2
    "0",                 // 19
    "1",                 // 20, start of time
    "1010000",           // 21..=27, minute 5
    "0",                 // 28, minute parity
    "010000",            // 29..=34, hour 2
    "1",                 // 35, hour parity
    "100000",            // 36..=41, day 1
    "100",               // 42..=44, weekday 1
    "10000",             // 45..=49, month 1
    "10001000",          // 50..=57, year 11
    "1",                 // 58, date parity
);

fn scenario_frame() -> Frame {
    let mut frame = Frame::new();
    for c in SCENARIO.chars() {
        frame.push(Symbol::Data(Bit::from_bool(c == '1')));
    }
    frame.push(Symbol::EndOfMinute);
    frame
}

fn rising(duration_ms: u32) -> EdgeEvent {
    EdgeEvent::new(Level::High, duration_ms)
}

#[test]
fn reference_frame_decodes() {
    assert_eq!(SCENARIO.len(), 59);
    let frame = scenario_frame();
    assert_eq!(frame.len(), 60);

    let sample = decode(&frame, &ReceiverConfig::dcf77()).expect("reference frame is valid");
    assert_eq!(
        sample,
        TimeSample {
            year: 11,
            month: 1,
            day: 1,
            weekday: 1,
            hour: 2,
            minute: 5,
            timezone_code: 2,
        }
    );
}

#[test]
fn classifier_boundaries_are_closed_low_open_high() {
    let expectations = [
        (749, Classification::Noise),
        (750, Classification::Data(Bit::One)),
        (849, Classification::Data(Bit::One)),
        (850, Classification::Data(Bit::Zero)),
        (949, Classification::Data(Bit::Zero)),
        (950, Classification::Noise),
        (1_749, Classification::Noise),
        (1_750, Classification::MinuteMarker(Bit::One)),
        (1_849, Classification::MinuteMarker(Bit::One)),
        (1_850, Classification::MinuteMarker(Bit::Zero)),
        (1_949, Classification::MinuteMarker(Bit::Zero)),
        (1_950, Classification::Noise),
    ];

    for (duration, expected) in expectations {
        assert_eq!(classify_duration(duration), expected, "{duration} ms");
    }
    assert_eq!(classify(&EdgeEvent::new(Level::Low, 800)), Classification::Noise);
}

#[test]
fn low_durations_assemble_into_the_reference_frame() {
    let mut assembler = FrameAssembler::new(MarkerPolicy::PushFinalBit);
    let bits: Vec<bool> = SCENARIO.chars().map(|c| c == '1').collect();
    let (last, data) = bits.split_last().expect("scenario is not empty");

    // Low time before each rise is 1000 ms minus the previous pulse.
    for bit in data {
        let low = if *bit { 800 } else { 900 };
        let step = assembler.accept(classify(&rising(low)));
        assert!(step.completed.is_none());
    }

    let marker_low = if *last { 1_800 } else { 1_900 };
    let step = assembler.accept(classify(&rising(marker_low)));
    let frame = step.completed.expect("marker closes the frame");

    assert_eq!(frame, scenario_frame());
    assert!(decode(&frame, &ReceiverConfig::dcf77()).is_ok());
}

#[test]
fn broken_markers_are_parity_failures() {
    let mut symbols: Vec<Symbol> = scenario_frame().symbols().to_vec();
    symbols[0] = Symbol::ONE;
    assert_eq!(
        decode(&Frame::from_symbols(&symbols), &ReceiverConfig::dcf77()),
        Err(DecodeError::Parity(ParityCheck::FrameStart))
    );

    let mut symbols: Vec<Symbol> = scenario_frame().symbols().to_vec();
    symbols[20] = Symbol::ZERO;
    assert_eq!(
        decode(&Frame::from_symbols(&symbols), &ReceiverConfig::dcf77()),
        Err(DecodeError::Parity(ParityCheck::TimeStart))
    );
}

#[test]
fn each_parity_group_catches_a_single_flip() {
    let cases = [
        (24, ParityCheck::Minute),
        (31, ParityCheck::Hour),
        (47, ParityCheck::Date),
        (58, ParityCheck::Date),
    ];

    for (index, check) in cases {
        let mut symbols: Vec<Symbol> = scenario_frame().symbols().to_vec();
        symbols[index] = Symbol::Data(Bit::from_bool(!symbols[index].is_one()));
        assert_eq!(
            decode(&Frame::from_symbols(&symbols), &ReceiverConfig::dcf77()),
            Err(DecodeError::Parity(check)),
            "flip at {index}"
        );
    }
}

#[test]
fn extra_symbols_are_reported_as_incomplete() {
    let mut symbols: Vec<Symbol> = scenario_frame().symbols().to_vec();
    symbols.insert(10, Symbol::ZERO);
    symbols.insert(10, Symbol::ZERO);

    assert_eq!(
        decode(&Frame::from_symbols(&symbols), &ReceiverConfig::dcf77()),
        Err(DecodeError::Incomplete { length: 62 })
    );
}

#[test]
fn drop_policy_decodes_a_fifty_nine_symbol_frame() {
    let config = ReceiverConfig {
        marker_policy: MarkerPolicy::DropFinalBit,
        ..ReceiverConfig::dcf77()
    };

    let mut symbols: Vec<Symbol> = scenario_frame().symbols().to_vec();
    symbols.remove(58);
    let frame = Frame::from_symbols(&symbols);
    assert_eq!(frame.len(), 59);

    let sample = decode(&frame, &config).expect("frame without bit 58 is valid");
    assert_eq!((sample.hour, sample.minute, sample.year), (2, 5, 11));

    assert_eq!(
        decode(&scenario_frame(), &config),
        Err(DecodeError::Incomplete { length: 60 })
    );
}
