//! Debug tracing hooks for acquisition and decoding.
//!
//! Both pipeline stages take a [`Trace`] sink instead of writing to a console,
//! so the decoder stays a pure function of its input. Pass `&mut ()` when no
//! tracing is wanted. With the `log` or `defmt` feature enabled, [`LogTrace`]
//! or [`DefmtTrace`] forward every event to that framework.

use crate::decoder::{BITS, Frame};
use crate::error::DecodeError;
use crate::line::Level;

/// Receiver for the intermediate values of a read.
///
/// Every hook defaults to doing nothing.
pub trait Trace {
    /// The wake pulse is about to be sent and `sample_count` levels polled.
    fn wake(&mut self, _sample_count: usize) {}

    /// Reading the line failed at `index`; the rest of the buffer is stale.
    fn read_failed(&mut self, _index: usize) {}

    /// The full capture handed to the decoder.
    fn samples(&mut self, _samples: &[Level]) {}

    /// A run of `level` lasting `run` samples just ended.
    fn edge(&mut self, _level: Level, _run: usize) {}

    /// The bit threshold and the low-run extremes it came from.
    fn threshold(&mut self, _shortest: usize, _longest: usize, _threshold: usize) {}

    /// The recorded high-run lengths, one per bit.
    fn bit_durations(&mut self, _durations: &[usize; BITS]) {}

    /// The assembled frame, before the checksum is checked.
    fn frame(&mut self, _frame: &Frame) {}

    /// The capture was rejected.
    fn decode_failed(&mut self, _error: &DecodeError) {}

    /// Attempt number `attempt` of a retrying read failed.
    fn attempt_failed(&mut self, _attempt: u32) {}
}

/// No-op sink.
impl Trace for () {}

impl<T: Trace + ?Sized> Trace for &mut T {
    fn wake(&mut self, sample_count: usize) {
        T::wake(self, sample_count)
    }

    fn read_failed(&mut self, index: usize) {
        T::read_failed(self, index)
    }

    fn samples(&mut self, samples: &[Level]) {
        T::samples(self, samples)
    }

    fn edge(&mut self, level: Level, run: usize) {
        T::edge(self, level, run)
    }

    fn threshold(&mut self, shortest: usize, longest: usize, threshold: usize) {
        T::threshold(self, shortest, longest, threshold)
    }

    fn bit_durations(&mut self, durations: &[usize; BITS]) {
        T::bit_durations(self, durations)
    }

    fn frame(&mut self, frame: &Frame) {
        T::frame(self, frame)
    }

    fn decode_failed(&mut self, error: &DecodeError) {
        T::decode_failed(self, error)
    }

    fn attempt_failed(&mut self, attempt: u32) {
        T::attempt_failed(self, attempt)
    }
}

/// Renders a capture as a compact string of `0` and `1` characters.
pub struct SampleDump<'a>(pub &'a [Level]);

impl core::fmt::Display for SampleDump<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        use core::fmt::Write;

        for level in self.0 {
            f.write_char(match level {
                Level::Low => '0',
                Level::High => '1',
            })?;
        }
        Ok(())
    }
}

/// Sink that forwards events to the `log` facade.
#[cfg(feature = "log")]
#[derive(Clone, Copy, Debug, Default)]
pub struct LogTrace;

#[cfg(feature = "log")]
impl Trace for LogTrace {
    fn wake(&mut self, sample_count: usize) {
        log::debug!("sending wake pulse, polling {} samples", sample_count);
    }

    fn read_failed(&mut self, index: usize) {
        log::warn!("failed to read data line at sample {}", index);
    }

    fn samples(&mut self, samples: &[Level]) {
        log::trace!("raw data ({}) = {}", samples.len(), SampleDump(samples));
    }

    fn edge(&mut self, level: Level, run: usize) {
        log::trace!("{:?} run of {}", level, run);
    }

    fn threshold(&mut self, shortest: usize, longest: usize, threshold: usize) {
        log::debug!(
            "threshold {} (low runs {}..={})",
            threshold,
            shortest,
            longest
        );
    }

    fn bit_durations(&mut self, durations: &[usize; BITS]) {
        log::debug!("bit durations: {:?}", durations);
    }

    fn frame(&mut self, frame: &Frame) {
        log::debug!("frame: {:?}", frame.bytes());
    }

    fn decode_failed(&mut self, error: &DecodeError) {
        log::warn!("{}", error);
    }

    fn attempt_failed(&mut self, attempt: u32) {
        log::info!("read attempt {} failed, backing off", attempt);
    }
}

/// Sink that forwards events to `defmt`.
#[cfg(feature = "defmt")]
#[derive(Clone, Copy, Debug, Default)]
pub struct DefmtTrace;

#[cfg(feature = "defmt")]
impl Trace for DefmtTrace {
    fn wake(&mut self, sample_count: usize) {
        defmt::debug!("sending wake pulse, polling {} samples", sample_count);
    }

    fn read_failed(&mut self, index: usize) {
        defmt::warn!("failed to read data line at sample {}", index);
    }

    fn samples(&mut self, samples: &[Level]) {
        defmt::trace!("raw data ({}) = {}", samples.len(), samples);
    }

    fn edge(&mut self, level: Level, run: usize) {
        defmt::trace!("{} run of {}", level, run);
    }

    fn threshold(&mut self, shortest: usize, longest: usize, threshold: usize) {
        defmt::debug!(
            "threshold {} (low runs {}..={})",
            threshold,
            shortest,
            longest
        );
    }

    fn bit_durations(&mut self, durations: &[usize; BITS]) {
        defmt::debug!("bit durations: {}", durations);
    }

    fn frame(&mut self, frame: &Frame) {
        defmt::debug!("frame: {}", frame);
    }

    fn decode_failed(&mut self, error: &DecodeError) {
        defmt::warn!("decode failed: {}", error);
    }

    fn attempt_failed(&mut self, attempt: u32) {
        defmt::info!("read attempt {} failed, backing off", attempt);
    }
}
