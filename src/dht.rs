use embedded_hal::delay::DelayNs;

use crate::config::{Config, Retry};
use crate::decoder::{Reading, decode_traced};
use crate::error::DhtError;
use crate::line::{DataLine, Level};
use crate::sampler::acquire;
use crate::trace::Trace;

/// Driver for a DHT11 or DHT22 sensor read without a hardware timer.
///
/// The driver owns the data line for its whole lifetime, so two captures can
/// never overlap. Each read is independent: the sample buffer is supplied by
/// the caller and nothing is remembered between reads.
pub struct Dht<L, D> {
    line: L,
    delay: D,
    config: Config,
}

/// Successful outcome of [`Dht::read_retrying`].
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measurement {
    pub reading: Reading,
    /// Number of captures it took, including the successful one.
    pub attempts: u32,
}

impl<L, D> Dht<L, D>
where
    L: DataLine,
    D: DelayNs,
{
    /// Creates a new instance of the driver with the default wake timing.
    ///
    /// # Arguments
    ///
    /// * `line` - The data line the sensor is connected to. Wrap an open-drain
    ///   pin in [`OpenDrain`](crate::OpenDrain) if it cannot switch direction.
    /// * `delay` - A delay provider implementing the `DelayNs` trait.
    pub fn new(line: L, delay: D) -> Self {
        Self::with_config(line, delay, Config::default())
    }

    /// Creates a new instance of the driver with custom wake timing.
    pub fn with_config(line: L, delay: D, config: Config) -> Self {
        Dht {
            line,
            delay,
            config,
        }
    }

    /// Returns the wake timing in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Wakes the sensor and records its answer into `samples`.
    ///
    /// See [`sampler::acquire`](crate::sampler::acquire).
    pub fn acquire(&mut self, samples: &mut [Level]) -> Result<usize, DhtError<L::Error>> {
        self.acquire_traced(samples, &mut ())
    }

    /// Same as [`acquire`](Self::acquire), reporting to `trace`.
    pub fn acquire_traced<T: Trace + ?Sized>(
        &mut self,
        samples: &mut [Level],
        trace: &mut T,
    ) -> Result<usize, DhtError<L::Error>> {
        acquire(&mut self.line, &mut self.delay, &self.config, samples, trace)
    }

    /// Performs one capture and decodes it.
    ///
    /// The buffer is cleared first, so a capture cut short by a failed read
    /// never decodes leftovers of an earlier one.
    ///
    /// # Returns
    ///
    /// * `Ok(Reading)` if the capture held a frame with a valid checksum.
    /// * `Err(DhtError)` if the line failed or the capture could not be decoded.
    ///   Either way the next attempt needs a fresh capture.
    pub fn read(&mut self, samples: &mut [Level]) -> Result<Reading, DhtError<L::Error>> {
        self.read_traced(samples, &mut ())
    }

    /// Same as [`read`](Self::read), reporting to `trace`.
    pub fn read_traced<T: Trace + ?Sized>(
        &mut self,
        samples: &mut [Level],
        trace: &mut T,
    ) -> Result<Reading, DhtError<L::Error>> {
        samples.fill(Level::Low);
        self.acquire_traced(samples, trace)?;
        decode_traced(samples, trace).map_err(DhtError::Decode)
    }

    /// Reads until a capture decodes or `retry` runs out of attempts.
    ///
    /// Every attempt is a fresh [`read`](Self::read) and the driver waits
    /// `retry.backoff_ms` after each failure. When the attempts run out, the
    /// error of the last one is returned.
    pub fn read_retrying(
        &mut self,
        samples: &mut [Level],
        retry: Retry,
    ) -> Result<Measurement, DhtError<L::Error>> {
        self.read_retrying_traced(samples, retry, &mut ())
    }

    /// Same as [`read_retrying`](Self::read_retrying), reporting to `trace`.
    pub fn read_retrying_traced<T: Trace + ?Sized>(
        &mut self,
        samples: &mut [Level],
        retry: Retry,
        trace: &mut T,
    ) -> Result<Measurement, DhtError<L::Error>> {
        let mut attempts = 0;
        loop {
            attempts += 1;

            match self.read_traced(samples, trace) {
                Ok(reading) => return Ok(Measurement { reading, attempts }),
                Err(e) => {
                    trace.attempt_failed(attempts);
                    if retry.exhausted(attempts) {
                        return Err(e);
                    }
                    self.delay.delay_ms(retry.backoff_ms);
                }
            }
        }
    }

    /// Gives back the data line and the delay provider.
    pub fn release(self) -> (L, D) {
        (self.line, self.delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::Family;
    use crate::decoder::tests::{waveform, with_checksum};
    use crate::error::DecodeError;
    use crate::line::OpenDrain;
    use crate::sampler::tests::ScriptedLine;
    use core::num::NonZeroU32;
    use embedded_hal_mock::eh1::delay::{CheckedDelay, NoopDelay, Transaction as DelayTx};
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTx,
    };

    const CAPTURE: usize = 2400;

    fn start_sequence() -> Vec<PinTx> {
        vec![
            // MCU initiates communication by pulling the data line low, then releasing it
            PinTx::set(PinState::Low),
            PinTx::set(PinState::High),
        ]
    }

    fn start_delays() -> Vec<DelayTx> {
        vec![DelayTx::delay_us(1500), DelayTx::delay_us(30)]
    }

    // Helper to turn a frame into the pin reads of one full capture
    fn capture(bytes: [u8; 5]) -> Vec<PinTx> {
        let mut levels = waveform(bytes, 20, 10, 30);
        levels.resize(CAPTURE, Level::High);

        start_sequence()
            .into_iter()
            .chain(levels.into_iter().map(|level| {
                PinTx::get(match level {
                    Level::High => PinState::High,
                    Level::Low => PinState::Low,
                })
            }))
            .collect()
    }

    #[derive(Default)]
    struct Attempts(Vec<u32>);

    impl Trace for Attempts {
        fn attempt_failed(&mut self, attempt: u32) {
            self.0.push(attempt);
        }
    }

    #[test]
    fn test_read_valid() {
        // Data to simulate: [0x01, 0x90, 0x00, 0xF6], checksum = 0x87
        let mut pin = PinMock::new(&capture([0x01, 0x90, 0x00, 0xF6, 0x87]));
        let delay_transactions = start_delays();
        let mut delay = CheckedDelay::new(&delay_transactions);

        let mut dht = Dht::new(OpenDrain::new(pin.clone()), &mut delay);
        let mut samples = [Level::Low; CAPTURE];
        let reading = dht.read(&mut samples).unwrap();

        assert_eq!(
            reading,
            Reading {
                relative_humidity: 40.0,
                temperature: 24.6,
                family: Family::Dht22,
            }
        );

        pin.done();
        delay.done();
    }

    #[test]
    fn test_read_invalid() {
        // Data to simulate: [0x01, 0x90, 0x00, 0xF6], checksum = 0x81 (wrong)
        let mut pin = PinMock::new(&capture([0x01, 0x90, 0x00, 0xF6, 0x81]));
        let delay_transactions = start_delays();
        let mut delay = CheckedDelay::new(&delay_transactions);

        let mut dht = Dht::new(OpenDrain::new(pin.clone()), &mut delay);
        let mut samples = [Level::Low; CAPTURE];

        assert_eq!(
            dht.read(&mut samples).unwrap_err(),
            DhtError::Decode(DecodeError::ChecksumMismatch {
                expected: 0x81,
                computed: 0x87,
            })
        );

        pin.done();
        delay.done();
    }

    #[test]
    fn test_read_after_interrupted_capture_fails() {
        let mut levels = waveform(with_checksum([45, 0, 22, 0]), 20, 10, 30);
        levels.resize(CAPTURE, Level::High);

        // one complete capture, then the line fails 5 samples into the next one
        let mut line = ScriptedLine::default();
        line.reads.extend(levels.iter().copied().map(Ok));
        line.reads.extend(levels[..5].iter().copied().map(Ok));
        line.reads.push_back(Err(()));

        let mut dht = Dht::new(&mut line, NoopDelay);
        let mut samples = [Level::Low; CAPTURE];

        let first = dht.read(&mut samples).unwrap();
        assert_eq!(first.relative_humidity, 45.0);
        assert_eq!(first.temperature, 22.0);

        assert!(matches!(
            dht.read(&mut samples).unwrap_err(),
            DhtError::Decode(DecodeError::InsufficientBits { .. })
        ));
        assert_eq!(&samples[..5], &levels[..5]);
        assert!(samples[5..].iter().all(|level| *level == Level::Low));
    }

    #[test]
    fn test_read_retrying_until_valid() {
        let mut expect = capture([45, 0, 22, 0, 1]);
        expect.extend(capture(with_checksum([45, 0, 22, 0])));
        let mut pin = PinMock::new(&expect);

        let mut delay_transactions = start_delays();
        delay_transactions.push(DelayTx::delay_ms(5000));
        delay_transactions.extend(start_delays());
        let mut delay = CheckedDelay::new(&delay_transactions);

        let mut dht = Dht::new(OpenDrain::new(pin.clone()), &mut delay);
        let mut samples = [Level::Low; CAPTURE];
        let mut attempts = Attempts::default();
        let measurement = dht
            .read_retrying_traced(&mut samples, Retry::default(), &mut attempts)
            .unwrap();

        assert_eq!(
            measurement,
            Measurement {
                reading: Reading {
                    relative_humidity: 45.0,
                    temperature: 22.0,
                    family: Family::Dht11,
                },
                attempts: 2,
            }
        );
        assert_eq!(attempts.0, vec![1]);

        pin.done();
        delay.done();
    }

    #[test]
    fn test_read_retrying_gives_up() {
        let mut expect = capture([45, 0, 22, 0, 1]);
        expect.extend(capture([45, 0, 22, 0, 2]));
        let mut pin = PinMock::new(&expect);

        // no backoff after the last attempt
        let mut delay_transactions = start_delays();
        delay_transactions.push(DelayTx::delay_ms(10));
        delay_transactions.extend(start_delays());
        let mut delay = CheckedDelay::new(&delay_transactions);

        let retry = Retry::new()
            .with_max_attempts(NonZeroU32::new(2).unwrap())
            .with_backoff_ms(10);
        let mut dht = Dht::new(OpenDrain::new(pin.clone()), &mut delay);
        let mut samples = [Level::Low; CAPTURE];

        assert_eq!(
            dht.read_retrying(&mut samples, retry).unwrap_err(),
            DhtError::Decode(DecodeError::ChecksumMismatch {
                expected: 2,
                computed: 67,
            })
        );

        pin.done();
        delay.done();
    }

    #[test]
    fn test_release_returns_parts() {
        let mut pin = PinMock::new(&[]);
        let delay_transactions: Vec<DelayTx> = vec![];
        let mut delay = CheckedDelay::new(&delay_transactions);

        let config = Config::new().with_wake_low_us(2000);
        let dht = Dht::with_config(OpenDrain::new(pin.clone()), &mut delay, config);
        assert_eq!(dht.config().wake_low_us, 2000);

        let (line, _) = dht.release();
        let _ = line.into_inner();

        pin.done();
        delay.done();
    }
}
