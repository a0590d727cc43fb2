//! Wakes the sensor and records the raw level stream it answers with.
//!
//! The datasheet asks the host to wait 40us after the start signal and then
//! time each pulse. Without a hardware timer, scheduling jitter makes that
//! miss the first edge, so the line is instead polled back to back as fast as
//! the host allows. The sample rate is whatever that loop sustains; the
//! decoder copes with it.

use embedded_hal::delay::DelayNs;

use crate::config::{Config, MIN_WAKE_LOW_US};
use crate::error::DhtError;
use crate::line::{DataLine, Direction, Level};
use crate::trace::Trace;

/// Releases the line when dropped, including on early returns.
struct Claimed<'a, L: DataLine + ?Sized>(&'a mut L);

impl<L: DataLine + ?Sized> Drop for Claimed<'_, L> {
    fn drop(&mut self) {
        self.0.release();
    }
}

/// Sends the wake pulse and fills `samples` with consecutive line levels.
///
/// Returns how many entries were written. A failed read ends the capture
/// early without an error: entries after it keep their previous content and
/// the decoder will reject the capture. Only configuring or driving the line
/// fails the acquisition.
pub fn acquire<L, D, T>(
    line: &mut L,
    delay: &mut D,
    config: &Config,
    samples: &mut [Level],
    trace: &mut T,
) -> Result<usize, DhtError<L::Error>>
where
    L: DataLine + ?Sized,
    D: DelayNs + ?Sized,
    T: Trace + ?Sized,
{
    trace.wake(samples.len());
    wake(line, delay, config)?;

    let mut line = Claimed(line);
    line.0.configure(Direction::Input)?;

    let mut captured = 0;
    for slot in samples.iter_mut() {
        match line.0.level() {
            Ok(level) => *slot = level,
            Err(_) => {
                trace.read_failed(captured);
                break;
            }
        }
        captured += 1;
    }
    Ok(captured)
}

/// Pulls the line low long enough to be noticed, then lets it settle high.
fn wake<L, D>(line: &mut L, delay: &mut D, config: &Config) -> Result<(), DhtError<L::Error>>
where
    L: DataLine + ?Sized,
    D: DelayNs + ?Sized,
{
    let mut line = Claimed(line);
    line.0.configure(Direction::Output)?;
    line.0.set_level(Level::Low)?;
    delay.delay_us(config.wake_low_us.max(MIN_WAKE_LOW_US));
    line.0.set_level(Level::High)?;
    delay.delay_us(config.settle_us);
    Ok(())
}
