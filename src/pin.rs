use crate::bus::Transport;
use crate::common::{write_bit, Channel, Register};
use crate::dev::pca9536::Pca9536;
use crate::{ComError, PortMutex};
use core::marker::PhantomData;
use embedded_hal::digital::{self as hal_digital, PinState};

/// Error returned by pin operations when the bus transaction failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    #[error("bus communication failed: {0}")]
    Com(#[from] ComError),
}

impl hal_digital::Error for PinError {
    fn kind(&self) -> hal_digital::ErrorKind {
        hal_digital::ErrorKind::Other
    }
}

/// Read-modify-write of one register which stops at the first failed transfer, so a failed read
/// is never written back.
fn update_reg<T, F>(drv: &mut Pca9536<T>, reg: Register, f: F) -> Result<(), ComError>
where
    T: Transport,
    F: FnOnce(u8) -> u8,
{
    let current = drv.read_reg(reg)?;
    drv.set_reg(reg, f(current));
    drv.check()
}

/// Representation of a PCA9536 channel.
///
/// `Pin` is not constructed directly, this type is created by wrapping the driver in a
/// [`SharedPca9536`][crate::SharedPca9536] and then getting access to all its pins using the
/// `.split()` method.
///
/// Unlike the raw driver, pin operations report every failed transfer, including a short register
/// read, as [`PinError`] and never write back a register value that was not read successfully.
pub struct Pin<'a, MODE, MUTEX> {
    channel: Channel,
    port_driver: &'a MUTEX,
    _m: PhantomData<MODE>,
}

impl<'a, MODE, MUTEX, T> Pin<'a, MODE, MUTEX>
where
    T: Transport,
    MUTEX: PortMutex<Port = Pca9536<T>>,
{
    pub(crate) fn new(channel: Channel, port_driver: &'a MUTEX) -> Self {
        Self {
            channel,
            port_driver,
            _m: PhantomData,
        }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    fn read_bit(&self, reg: Register) -> Result<bool, PinError> {
        let mask = self.channel.mask();
        let value = self.port_driver.lock(|drv| drv.read_reg(reg))?;
        Ok(value & mask != 0)
    }

    fn retype<M>(self) -> Pin<'a, M, MUTEX> {
        Pin {
            channel: self.channel,
            port_driver: self.port_driver,
            _m: PhantomData,
        }
    }

    pub fn into_input(self) -> Result<Pin<'a, crate::mode::Input, MUTEX>, PinError> {
        let mask = self.channel.mask();
        self.port_driver
            .lock(|drv| update_reg(drv, Register::Configuration, |r| r | mask))?;
        Ok(self.retype())
    }

    /// Switch to output, driving whatever level the output register holds.
    pub fn into_output(self) -> Result<Pin<'a, crate::mode::Output, MUTEX>, PinError> {
        let mask = self.channel.mask();
        self.port_driver
            .lock(|drv| update_reg(drv, Register::Configuration, |r| r & !mask))?;
        Ok(self.retype())
    }

    /// Switch to output and drive HIGH.
    pub fn into_output_high(self) -> Result<Pin<'a, crate::mode::Output, MUTEX>, PinError> {
        let mask = self.channel.mask();
        self.port_driver.lock(|drv| {
            // set state before switching direction to prevent glitch
            update_reg(drv, Register::Output, |r| r | mask)?;
            update_reg(drv, Register::Configuration, |r| r & !mask)
        })?;
        Ok(self.retype())
    }
}

impl<'a, MODE: crate::mode::HasInput, MUTEX, T> Pin<'a, MODE, MUTEX>
where
    T: Transport,
    MUTEX: PortMutex<Port = Pca9536<T>>,
{
    pub fn is_high(&self) -> Result<bool, PinError> {
        self.read_bit(Register::Input)
    }

    pub fn is_low(&self) -> Result<bool, PinError> {
        self.is_high().map(|b| !b)
    }

    /// Turn on hardware polarity inversion for this pin.
    pub fn into_inverted(mut self) -> Result<Self, PinError> {
        self.set_inverted(true)?;
        Ok(self)
    }

    /// Set hardware polarity inversion for this pin.
    pub fn set_inverted(&mut self, inverted: bool) -> Result<(), PinError> {
        let channel = self.channel;
        self.port_driver.lock(|drv| {
            update_reg(drv, Register::Polarity, |r| write_bit(r, channel, inverted))
        })?;
        Ok(())
    }

    pub fn is_inverted(&self) -> Result<bool, PinError> {
        self.read_bit(Register::Polarity)
    }
}

impl<'a, MODE: crate::mode::HasOutput, MUTEX, T> Pin<'a, MODE, MUTEX>
where
    T: Transport,
    MUTEX: PortMutex<Port = Pca9536<T>>,
{
    pub fn set_high(&mut self) -> Result<(), PinError> {
        self.set_state(PinState::High)
    }

    pub fn set_low(&mut self) -> Result<(), PinError> {
        self.set_state(PinState::Low)
    }

    pub fn set_state(&mut self, state: PinState) -> Result<(), PinError> {
        let channel = self.channel;
        let high = state == PinState::High;
        self.port_driver
            .lock(|drv| update_reg(drv, Register::Output, |r| write_bit(r, channel, high)))?;
        Ok(())
    }

    pub fn is_set_high(&self) -> Result<bool, PinError> {
        self.read_bit(Register::Output)
    }

    pub fn is_set_low(&self) -> Result<bool, PinError> {
        self.is_set_high().map(|b| !b)
    }

    pub fn toggle(&mut self) -> Result<(), PinError> {
        let mask = self.channel.mask();
        self.port_driver
            .lock(|drv| update_reg(drv, Register::Output, |r| r ^ mask))?;
        Ok(())
    }
}

impl<'a, MODE, MUTEX, T> hal_digital::ErrorType for Pin<'a, MODE, MUTEX>
where
    T: Transport,
    MUTEX: PortMutex<Port = Pca9536<T>>,
{
    type Error = PinError;
}

impl<'a, MODE: crate::mode::HasInput, MUTEX, T> hal_digital::InputPin for Pin<'a, MODE, MUTEX>
where
    T: Transport,
    MUTEX: PortMutex<Port = Pca9536<T>>,
{
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Pin::is_high(self)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Pin::is_low(self)
    }
}

impl<'a, MODE: crate::mode::HasOutput, MUTEX, T> hal_digital::OutputPin for Pin<'a, MODE, MUTEX>
where
    T: Transport,
    MUTEX: PortMutex<Port = Pca9536<T>>,
{
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Pin::set_low(self)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Pin::set_high(self)
    }
}

impl<'a, MODE: crate::mode::HasOutput, MUTEX, T> hal_digital::StatefulOutputPin
    for Pin<'a, MODE, MUTEX>
where
    T: Transport,
    MUTEX: PortMutex<Port = Pca9536<T>>,
{
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Pin::is_set_high(self)
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Pin::is_set_low(self)
    }

    fn toggle(&mut self) -> Result<(), Self::Error> {
        Pin::toggle(self)
    }
}
