//! Turns a busy-polled capture into a validated [`Reading`].
//!
//! The sensor sends each bit as a ~50us low pulse followed by a high pulse of
//! ~27us (a `0`) or ~70us (a `1`). Polling gives no absolute time base, so the
//! lengths are only known in samples. The decoder therefore looks at the low
//! pulses of the same capture: the mean of the shortest and longest low run
//! becomes the threshold the high runs are compared with. This is coarse, and
//! the frame checksum is what catches a bad guess; the caller then simply
//! reads again.

use crate::error::DecodeError;
use crate::line::Level;
use crate::trace::Trace;

/// Number of bits in one sensor frame.
pub const BITS: usize = 40;

/// The five raw bytes of a frame: four data bytes and the checksum.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame([u8; 5]);

impl Frame {
    /// Wraps five raw bytes, checksum last.
    pub const fn new(bytes: [u8; 5]) -> Self {
        Frame(bytes)
    }

    /// Returns the raw bytes.
    pub const fn bytes(&self) -> [u8; 5] {
        self.0
    }

    /// Low byte of the sum of the four data bytes.
    pub fn checksum(&self) -> u8 {
        self.0[..4].iter().fold(0u8, |sum, v| sum.wrapping_add(*v))
    }

    /// Checks the checksum and converts the frame into physical units.
    pub fn validate(self) -> Result<Reading, DecodeError> {
        let computed = self.checksum();
        let expected = self.0[4];
        if computed != expected {
            return Err(DecodeError::ChecksumMismatch { expected, computed });
        }
        Ok(self.parse_data())
    }

    fn parse_data(&self) -> Reading {
        let [hum_hi, hum_lo, temp_hi, temp_lo, _] = self.0;

        match Family::detect(hum_hi) {
            Family::Dht22 => Reading {
                temperature: u16::from_be_bytes([temp_hi, temp_lo]) as f32 / 10.0,
                relative_humidity: u16::from_be_bytes([hum_hi, hum_lo]) as f32 / 10.0,
                family: Family::Dht22,
            },
            Family::Dht11 => Reading {
                temperature: temp_hi as f32,
                relative_humidity: hum_hi as f32,
                family: Family::Dht11,
            },
        }
    }
}

/// Data encoding used by the sensor that sent a frame.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Family {
    /// Whole percent in byte 0, whole degrees in byte 2.
    Dht11,
    /// Tenths of a percent in bytes 0-1, tenths of a degree in bytes 2-3.
    Dht22,
}

impl Family {
    /// Infers the encoding from the first humidity byte.
    ///
    /// 100.0% in tenths is 0x03E8, so a tenths encoding never puts more than
    /// 3 in the high byte. Anything larger has to be whole percent, assuming
    /// the air is never drier than 4%.
    pub fn detect(hum_hi: u8) -> Self {
        if hum_hi < 4 {
            Family::Dht22
        } else {
            Family::Dht11
        }
    }
}

/// Reading returned by the sensor.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    /// Temperature in degrees Celsius.
    pub temperature: f32,
    /// Relative humidity in percent.
    pub relative_humidity: f32,
    /// Encoding the values were decoded with.
    pub family: Family,
}

impl Reading {
    /// Temperature in degrees Fahrenheit.
    pub fn temperature_fahrenheit(&self) -> f32 {
        self.temperature * 1.8 + 32.0
    }
}

impl core::fmt::Display for Reading {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "Humidity: {:.1} % | Temperature: {:.1}°C",
            self.relative_humidity, self.temperature
        )
    }
}

/// Decodes a capture without tracing.
pub fn decode(samples: &[Level]) -> Result<Reading, DecodeError> {
    decode_traced(samples, &mut ())
}

/// Decodes a capture, reporting intermediate values to `trace`.
pub fn decode_traced<T: Trace + ?Sized>(
    samples: &[Level],
    trace: &mut T,
) -> Result<Reading, DecodeError> {
    trace.samples(samples);

    let result = scan(samples, trace).and_then(|frame| {
        trace.frame(&frame);
        frame.validate()
    });
    if let Err(e) = &result {
        trace.decode_failed(e);
    }
    result
}

/// Measures the pulses of one capture and assembles them into a frame.
fn scan<T: Trace + ?Sized>(samples: &[Level], trace: &mut T) -> Result<Frame, DecodeError> {
    let mut durations = [0usize; BITS];
    let mut found = 0;
    let mut shortest = samples.len();
    let mut longest = 0;

    let mut levels = samples.iter().copied().enumerate();
    let Some((_, mut current)) = levels.next() else {
        return Err(DecodeError::InsufficientBits { found });
    };
    // whatever precedes the first edge is left over from the wake sequence
    let mut last_edge = None;

    for (i, level) in levels {
        if level == current {
            continue;
        }
        if let Some(prev) = last_edge {
            let run = i - prev;
            trace.edge(current, run);
            match current {
                Level::Low => {
                    shortest = shortest.min(run);
                    longest = longest.max(run);
                }
                Level::High => {
                    durations[found] = run;
                    found += 1;
                    if found == BITS {
                        break;
                    }
                }
            }
        }
        last_edge = Some(i);
        current = level;
    }

    if found < BITS {
        return Err(DecodeError::InsufficientBits { found });
    }

    let threshold = (shortest + longest) / 2;
    trace.threshold(shortest, longest, threshold);
    trace.bit_durations(&durations);

    let mut data = [0u8; 5];
    for (i, duration) in durations.iter().enumerate() {
        data[i / 8] <<= 1;
        if *duration > threshold {
            data[i / 8] |= 1;
        }
    }
    Ok(Frame(data))
}
