#![no_std]

// Signal-to-time pipeline for the DCF77 receiver.
//
// Everything here is executor-agnostic and free of the Rust standard library
// so the firmware and the host emulator drive the exact same decoding,
// status, and clock logic.

pub mod classifier;
pub mod clock;
pub mod config;
pub mod decoder;
pub mod drift;
pub mod edge;
pub mod encoder;
pub mod frame;
pub mod sink;
pub mod station;
pub mod status;
