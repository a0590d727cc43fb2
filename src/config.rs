use core::num::NonZeroU32;

/// Capture length that reliably holds a whole frame on a Raspberry Pi class host.
pub const DEFAULT_SAMPLE_COUNT: usize = 6000;

/// Shortest low pulse the sensor reliably takes as a start request.
pub const MIN_WAKE_LOW_US: u32 = 1000;

/// Timing of the wake sequence.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// How long the line is held low to request a reading.
    ///
    /// Values below [`MIN_WAKE_LOW_US`] are raised to it when the pulse is sent.
    pub wake_low_us: u32,
    /// How long the line is driven high before it is handed to the sensor.
    pub settle_us: u32,
}

impl Config {
    /// Timing that works on a Raspberry Pi: 1.5 ms low, 30 us settle.
    pub const fn new() -> Self {
        Config {
            wake_low_us: 1500,
            settle_us: 30,
        }
    }

    /// Sets the start request length, raised to at least [`MIN_WAKE_LOW_US`].
    pub const fn with_wake_low_us(mut self, us: u32) -> Self {
        self.wake_low_us = if us < MIN_WAKE_LOW_US {
            MIN_WAKE_LOW_US
        } else {
            us
        };
        self
    }

    /// Sets how long the line stays driven high after the start request.
    pub const fn with_settle_us(mut self, us: u32) -> Self {
        self.settle_us = us;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// How a retrying read reacts to failed attempts.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Retry {
    /// Give up after this many attempts. `None` keeps trying forever.
    pub max_attempts: Option<NonZeroU32>,
    /// Pause between a failed attempt and the next one.
    pub backoff_ms: u32,
}

impl Retry {
    /// Retries forever, 5 seconds apart.
    pub const fn new() -> Self {
        Retry {
            max_attempts: None,
            backoff_ms: 5000,
        }
    }

    /// Gives up after `attempts` failed reads.
    pub const fn with_max_attempts(mut self, attempts: NonZeroU32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Sets the pause between attempts.
    pub const fn with_backoff_ms(mut self, ms: u32) -> Self {
        self.backoff_ms = ms;
        self
    }

    pub(crate) fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max.get())
    }
}

impl Default for Retry {
    fn default() -> Self {
        Self::new()
    }
}
