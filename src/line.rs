//! The single data wire shared by the host and the sensor.

use embedded_hal::digital::{InputPin, OutputPin};

/// Logic level observed on, or driven onto, the data line.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Level {
    #[default]
    Low = 0,
    High = 1,
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level as u8
    }
}

/// Direction the data line is configured for.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// A GPIO line whose direction can be switched at runtime.
///
/// `embedded-hal` has no trait for reconfigurable pins, so platforms
/// implement this one directly or wrap an open-drain pin in [`OpenDrain`].
pub trait DataLine {
    /// Error reported by the underlying GPIO driver.
    type Error;

    /// Switches the line to input or output.
    fn configure(&mut self, direction: Direction) -> Result<(), Self::Error>;

    /// Drives the line. Only meaningful while configured as output.
    fn set_level(&mut self, level: Level) -> Result<(), Self::Error>;

    /// Samples the line. Only meaningful while configured as input.
    fn level(&mut self) -> Result<Level, Self::Error>;

    /// Gives up any direction request held on the line.
    ///
    /// Release cannot fail from the caller's point of view. An implementation
    /// that fails to let go should remember it, so the next [`configure`]
    /// retries and reports the error.
    ///
    /// [`configure`]: DataLine::configure
    fn release(&mut self);
}

impl<T: DataLine + ?Sized> DataLine for &mut T {
    type Error = T::Error;

    fn configure(&mut self, direction: Direction) -> Result<(), Self::Error> {
        T::configure(self, direction)
    }

    fn set_level(&mut self, level: Level) -> Result<(), Self::Error> {
        T::set_level(self, level)
    }

    fn level(&mut self) -> Result<Level, Self::Error> {
        T::level(self)
    }

    fn release(&mut self) {
        T::release(self)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Released,
    Driving(Level),
    Listening,
}

/// [`DataLine`] over an open-drain pin with an external pull-up.
///
/// Such a pin never has to change direction: driving it high lets go of the
/// wire and the pull-up (or the sensor) decides the level. Input mode and
/// releasing therefore both amount to "not pulling low".
pub struct OpenDrain<P> {
    pin: P,
    mode: Mode,
}

impl<P> OpenDrain<P> {
    /// Wraps a pin that is wired open-drain with a pull-up.
    pub fn new(pin: P) -> Self {
        OpenDrain {
            pin,
            mode: Mode::Released,
        }
    }

    /// Returns the wrapped pin.
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P, E> DataLine for OpenDrain<P>
where
    P: InputPin<Error = E> + OutputPin<Error = E>,
{
    type Error = E;

    fn configure(&mut self, direction: Direction) -> Result<(), E> {
        match direction {
            Direction::Output => {
                // an undriven open-drain line sits high
                if !matches!(self.mode, Mode::Driving(_)) {
                    self.mode = Mode::Driving(Level::High);
                }
            }
            Direction::Input => {
                if self.mode == Mode::Driving(Level::Low) {
                    self.pin.set_high()?;
                }
                self.mode = Mode::Listening;
            }
        }
        Ok(())
    }

    fn set_level(&mut self, level: Level) -> Result<(), E> {
        match level {
            Level::Low => self.pin.set_low()?,
            Level::High => self.pin.set_high()?,
        }
        self.mode = Mode::Driving(level);
        Ok(())
    }

    fn level(&mut self) -> Result<Level, E> {
        self.pin.is_high().map(Level::from)
    }

    fn release(&mut self) {
        match self.mode {
            // still pulling low on failure: the next configure retries and reports it
            Mode::Driving(Level::Low) if self.pin.set_high().is_err() => {}
            _ => self.mode = Mode::Released,
        }
    }
}
