//! Frame accumulation between two minute markers.
//!
//! The assembler owns the live buffer. When a minute marker lands it moves
//! the filled buffer out as a [`Frame`] value and starts over, so whoever
//! decodes the frame never sees it change underneath them.

use heapless::Vec;

use crate::classifier::{Classification, Symbol};
use crate::config::{FRAME_SYMBOLS, MarkerPolicy};

/// Symbols collected for one minute, marker included.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Frame {
    symbols: Vec<Symbol, FRAME_SYMBOLS>,
    observed: usize,
}

impl Frame {
    /// Creates an empty frame.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            symbols: Vec::new(),
            observed: 0,
        }
    }

    /// Builds a frame from a slice, counting entries that do not fit.
    #[must_use]
    pub fn from_symbols(symbols: &[Symbol]) -> Self {
        let mut frame = Self::new();
        for symbol in symbols {
            frame.push(*symbol);
        }
        frame
    }

    /// Appends a symbol; entries past capacity are counted but not stored.
    pub fn push(&mut self, symbol: Symbol) {
        self.observed = self.observed.saturating_add(1);
        let _ = self.symbols.push(symbol);
    }

    /// Number of symbols received, including any that overflowed the buffer.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.observed
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.observed == 0
    }

    /// Returns `true` when every received symbol was stored.
    #[must_use]
    pub fn is_intact(&self) -> bool {
        self.observed == self.symbols.len()
    }

    /// Stored symbols in arrival order.
    #[must_use]
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<Symbol> {
        self.symbols.get(index).copied()
    }

    /// Last stored symbol.
    #[must_use]
    pub fn last(&self) -> Option<Symbol> {
        self.symbols.last().copied()
    }

    /// Returns `true` when the frame holds exactly `expected` symbols and the
    /// final one is the minute marker.
    #[must_use]
    pub fn is_complete(&self, expected: usize) -> bool {
        self.is_intact() && self.observed == expected && self.last() == Some(Symbol::EndOfMinute)
    }

    /// Counts the data ones stored in `range`.
    #[must_use]
    pub fn count_ones(&self, start: usize, end: usize) -> usize {
        let end = end.min(self.symbols.len());
        let start = start.min(end);
        self.symbols[start..end]
            .iter()
            .filter(|symbol| symbol.is_one())
            .count()
    }
}

/// Symbol appended to the live buffer, with its zero-based position.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SymbolReport {
    pub rank: usize,
    pub symbol: Symbol,
}

/// Outcome of feeding one classification into the assembler.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AssemblyStep {
    /// Symbols appended, in order. At most a data bit and the marker.
    pub appended: Vec<SymbolReport, 2>,
    /// Frame closed by a minute marker, detached from the live buffer.
    pub completed: Option<Frame>,
}

impl AssemblyStep {
    /// Returns `true` when the classification produced nothing.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.appended.is_empty() && self.completed.is_none()
    }
}

/// Accumulates classified symbols into frames.
#[derive(Clone, Debug)]
pub struct FrameAssembler {
    current: Frame,
    policy: MarkerPolicy,
}

impl FrameAssembler {
    #[must_use]
    pub const fn new(policy: MarkerPolicy) -> Self {
        Self {
            current: Frame::new(),
            policy,
        }
    }

    /// Live buffer, for diagnostics only.
    #[must_use]
    pub fn current(&self) -> &Frame {
        &self.current
    }

    /// Applies a classification to the live buffer.
    pub fn accept(&mut self, classification: Classification) -> AssemblyStep {
        let mut step = AssemblyStep::default();
        match classification {
            Classification::Noise => {}
            Classification::Data(bit) => {
                let _ = step.appended.push(self.append(Symbol::Data(bit)));
            }
            Classification::MinuteMarker(bit) => {
                if self.policy == MarkerPolicy::PushFinalBit {
                    let _ = step.appended.push(self.append(Symbol::Data(bit)));
                }
                let _ = step.appended.push(self.append(Symbol::EndOfMinute));
                step.completed = Some(core::mem::take(&mut self.current));
            }
        }
        step
    }

    fn append(&mut self, symbol: Symbol) -> SymbolReport {
        let rank = self.current.len();
        self.current.push(symbol);
        SymbolReport { rank, symbol }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Bit;

    #[test]
    fn marker_pushes_final_bit_and_detaches_frame() {
        let mut assembler = FrameAssembler::new(MarkerPolicy::PushFinalBit);
        for _ in 0..58 {
            let step = assembler.accept(Classification::Data(Bit::Zero));
            assert!(step.completed.is_none());
        }

        let step = assembler.accept(Classification::MinuteMarker(Bit::One));
        assert_eq!(step.appended.len(), 2);
        assert_eq!(
            step.appended[0],
            SymbolReport {
                rank: 58,
                symbol: Symbol::ONE
            }
        );
        assert_eq!(step.appended[1].symbol, Symbol::EndOfMinute);

        let frame = step.completed.expect("frame should close on marker");
        assert_eq!(frame.len(), 60);
        assert!(frame.is_complete(60));
        assert!(assembler.current().is_empty());
    }

    #[test]
    fn drop_policy_closes_at_fifty_nine() {
        let mut assembler = FrameAssembler::new(MarkerPolicy::DropFinalBit);
        for _ in 0..58 {
            assembler.accept(Classification::Data(Bit::One));
        }
        let step = assembler.accept(Classification::MinuteMarker(Bit::Zero));
        assert_eq!(step.appended.len(), 1);
        let frame = step.completed.expect("frame");
        assert!(frame.is_complete(59));
    }

    #[test]
    fn noise_leaves_buffer_untouched() {
        let mut assembler = FrameAssembler::new(MarkerPolicy::PushFinalBit);
        assert!(assembler.accept(Classification::Noise).is_idle());
        assert!(assembler.current().is_empty());
    }

    #[test]
    fn overflow_is_counted_but_not_stored() {
        let mut frame = Frame::new();
        for _ in 0..65 {
            frame.push(Symbol::ONE);
        }
        assert_eq!(frame.len(), 65);
        assert_eq!(frame.symbols().len(), FRAME_SYMBOLS);
        assert!(!frame.is_intact());
        assert!(!frame.is_complete(60));
    }

    #[test]
    fn short_frame_is_not_complete() {
        let frame = Frame::from_symbols(&[Symbol::ZERO, Symbol::ONE, Symbol::EndOfMinute]);
        assert_eq!(frame.len(), 3);
        assert!(!frame.is_complete(60));
        assert_eq!(frame.count_ones(0, 3), 1);
    }
}
