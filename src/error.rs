use core::fmt;

/// Possible errors from the DHT driver.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq)]
pub enum DhtError<E> {
    /// The data line could not be configured or driven.
    Pin(E),
    /// The capture did not decode into a valid frame.
    Decode(DecodeError),
}

impl<E> From<E> for DhtError<E> {
    fn from(value: E) -> Self {
        Self::Pin(value)
    }
}

impl<E: fmt::Debug> fmt::Display for DhtError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pin(e) => write!(f, "data line error: {e:?}"),
            Self::Decode(e) => write!(f, "decode failed: {e}"),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for DhtError<E> {}

/// Reasons a capture is rejected by the decoder.
///
/// Both mean the capture is unusable and a fresh acquisition is needed.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// Fewer than 40 high pulses were found after the first edge.
    InsufficientBits {
        /// Number of high pulses that were recorded.
        found: usize,
    },
    /// The checksum byte did not match the sum of the data bytes.
    ChecksumMismatch {
        /// Checksum byte as transmitted.
        expected: u8,
        /// Low byte of the sum of the four data bytes.
        computed: u8,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientBits { found } => {
                write!(f, "only detected {found} of 40 bits")
            }
            Self::ChecksumMismatch { expected, computed } => {
                write!(f, "checksum mismatch: {computed} != {expected}")
            }
        }
    }
}

impl core::error::Error for DecodeError {}
