//! Support for the PCA9536 "4-bit I2C-bus and SMBus I/O port"
use crate::bus::{I2cTransport, Transport, STATUS_SUCCESS};
use crate::common::{self, write_bit, Channel, Mode, Polarity, Register};
use crate::ComError;
use embedded_hal::digital::PinState;
use log::{debug, trace, warn};

/// Fixed bus address of the device.
pub const ADDRESS: u8 = 0x41;

const NUM_BYTES: usize = 1;

/// PCA9536 register driver.
///
/// All state lives on the device: every operation reads the registers it needs fresh from the
/// bus.  The only thing kept locally is the status of the most recent transaction, see
/// [`com_result()`][Self::com_result].
///
/// Operations never fail loudly.  Reads return `0`/`false`/the `0`-variant when the bus
/// transaction did not succeed, so a read result is only meaningful if `com_result()` is `0`
/// afterwards (or [`check()`][Self::check] returns `Ok`).
///
/// Single-pin writes are a read-modify-write over two transactions.  Nothing stops another bus
/// master from changing the register in between; wrap the driver in a
/// [`SharedPca9536`][crate::SharedPca9536] when several parts of the program need access.
pub struct Pca9536<T> {
    bus: T,
    com_result: u8,
}

impl<I2C> Pca9536<I2cTransport<I2C>>
where
    I2C: embedded_hal::i2c::I2c,
{
    pub fn new(i2c: I2C) -> Self {
        Self::with_transport(I2cTransport::new(i2c))
    }
}

impl<T: Transport> Pca9536<T> {
    pub fn with_transport(bus: T) -> Self {
        Self {
            bus,
            com_result: STATUS_SUCCESS,
        }
    }

    #[cfg(test)]
    pub(crate) fn bus(&self) -> &T {
        &self.bus
    }

    /// Give back the transport.  The device is left as it is.
    pub fn release(self) -> T {
        self.bus
    }

    /// Probe the device address.  Returns the bus status, `0` if the device acknowledged.
    ///
    /// The stored communication result is not touched.
    pub fn ping(&mut self) -> u8 {
        self.bus.begin_transaction(ADDRESS);
        self.bus.commit()
    }

    /// Status of the most recent transaction, `0` on success.
    pub fn com_result(&self) -> u8 {
        self.com_result
    }

    /// [`com_result()`][Self::com_result] as a `Result`.
    pub fn check(&self) -> Result<(), ComError> {
        match ComError::from_status(self.com_result) {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }

    fn init_call(&mut self, reg: Register) {
        self.bus.begin_transaction(ADDRESS);
        self.bus.write(reg.into());
    }

    fn end_call(&mut self) {
        self.com_result = self.bus.commit();
    }

    /// Read a whole register.  Returns `0` if the transfer failed.
    pub fn get_reg(&mut self, reg: Register) -> u8 {
        self.read_reg(reg).unwrap_or(0)
    }

    /// Read a whole register, failing if the value did not arrive.
    ///
    /// Updates the communication result exactly like [`get_reg()`][Self::get_reg].  A short read
    /// is an error even when the follow-up ping succeeds.
    pub(crate) fn read_reg(&mut self, reg: Register) -> Result<u8, ComError> {
        self.init_call(reg);
        self.end_call();
        if let Some(e) = ComError::from_status(self.com_result) {
            trace!("get_reg {:?}: pointer write failed ({})", reg, self.com_result);
            return Err(e);
        }

        self.bus.request_bytes(ADDRESS, NUM_BYTES);
        let available = self.bus.available();
        if available == NUM_BYTES {
            if let Some(value) = self.bus.read() {
                trace!("get_reg {:?} = {:#04x}", reg, value);
                return Ok(value);
            }
        }

        while self.bus.read().is_some() {}
        self.com_result = self.ping();
        warn!(
            "get_reg {:?}: expected {} byte, got {} (status after ping: {})",
            reg, NUM_BYTES, available, self.com_result
        );
        Err(ComError::from_status(self.com_result).unwrap_or(ComError::ShortRead))
    }

    /// Write a whole register.
    ///
    /// Writes to [`Register::Input`] are read-only on the device and are dropped without touching
    /// the bus.
    pub fn set_reg(&mut self, reg: Register, value: u8) {
        if reg == Register::Input {
            return;
        }
        self.init_call(reg);
        self.bus.write(value);
        self.end_call();
        trace!("set_reg {:?} = {:#04x} ({})", reg, value, self.com_result);
    }

    /// Read the bit of `channel` in `reg`.
    pub fn get_pin(&mut self, channel: Channel, reg: Register) -> bool {
        self.get_reg(reg) & channel.mask() != 0
    }

    /// Set or clear the bit of `channel` in `reg`, leaving the other bits as read from the device.
    pub fn set_pin(&mut self, channel: Channel, reg: Register, value: bool) {
        let current = self.get_reg(reg);
        self.set_reg(reg, write_bit(current, channel, value));
    }

    /// Set the bits of all four channels in `reg` with a single read-modify-write.
    ///
    /// `values[0]` goes to IO0, `values[3]` to IO3.
    pub fn set_pins(&mut self, reg: Register, values: [bool; 4]) {
        let current = self.get_reg(reg);
        let new = Channel::ALL
            .iter()
            .zip(values.iter())
            .fold(current, |r, (ch, v)| write_bit(r, *ch, *v));
        self.set_reg(reg, new);
    }

    pub fn mode(&mut self, channel: Channel) -> Mode {
        self.get_pin(channel, Register::Configuration).into()
    }

    pub fn set_mode(&mut self, channel: Channel, mode: Mode) {
        self.set_pin(channel, Register::Configuration, mode.into());
    }

    pub fn set_mode_all(&mut self, mode: Mode) {
        self.set_reg(Register::Configuration, mode.broadcast());
    }

    /// Level of a channel.
    ///
    /// For outputs this is the driven level from the output register, for inputs the sensed
    /// level from the input register.
    pub fn state(&mut self, channel: Channel) -> PinState {
        let reg = match self.mode(channel) {
            Mode::Input => Register::Input,
            Mode::Output => Register::Output,
        };
        PinState::from(self.get_pin(channel, reg))
    }

    /// Set the output level of a channel.
    ///
    /// Accepted for inputs as well; the level takes effect once the channel becomes an output.
    pub fn set_state(&mut self, channel: Channel, state: PinState) {
        self.set_pin(channel, Register::Output, state == PinState::High);
    }

    pub fn set_state_all(&mut self, state: PinState) {
        self.set_reg(Register::Output, common::state_broadcast(state));
    }

    /// Set the output levels of all four channels at once.
    pub fn set_states(&mut self, states: [PinState; 4]) {
        self.set_pins(Register::Output, states.map(|s| s == PinState::High));
    }

    /// Flip the output bit of `channel`, whatever its current mode.
    pub fn toggle_state(&mut self, channel: Channel) {
        let current = self.get_reg(Register::Output);
        self.set_reg(Register::Output, current ^ channel.mask());
    }

    /// Invert the whole output register.
    pub fn toggle_state_all(&mut self) {
        let current = self.get_reg(Register::Output);
        self.set_reg(Register::Output, !current);
    }

    pub fn polarity(&mut self, channel: Channel) -> Polarity {
        self.get_pin(channel, Register::Polarity).into()
    }

    pub fn set_polarity(&mut self, channel: Channel, polarity: Polarity) {
        self.set_pin(channel, Register::Polarity, polarity.into());
    }

    /// Set the polarity of every channel that is currently an input.
    ///
    /// Polarity bits of outputs keep their value.
    pub fn set_polarity_all(&mut self, polarity: Polarity) {
        let current = self.get_reg(Register::Polarity);
        let config = self.get_reg(Register::Configuration);
        self.set_reg(
            Register::Polarity,
            common::broadcast_polarity(current, config, polarity.broadcast()),
        );
    }

    /// Put the device back into its power-on configuration.
    ///
    /// All channels become non-inverted inputs with the output register set HIGH, and the
    /// register pointer is left at the input register.
    pub fn reset(&mut self) {
        debug!("resetting PCA9536");
        self.set_mode_all(Mode::Input);
        self.set_state_all(PinState::High);
        self.set_polarity_all(Polarity::NonInverted);
        self.init_call(Register::Input);
        self.end_call();
    }
}

/// A [`Pca9536`] behind a mutex, split into per-channel [`Pin`][crate::Pin] handles.
pub struct SharedPca9536<M>(M);

impl<I2C> SharedPca9536<core::cell::RefCell<Pca9536<I2cTransport<I2C>>>>
where
    I2C: embedded_hal::i2c::I2c,
{
    pub fn new(i2c: I2C) -> Self {
        Self::with_mutex(Pca9536::new(i2c))
    }
}

impl<T, M> SharedPca9536<M>
where
    T: Transport,
    M: crate::PortMutex<Port = Pca9536<T>>,
{
    pub fn with_mutex(driver: Pca9536<T>) -> Self {
        Self(crate::PortMutex::create(driver))
    }

    pub fn split(&mut self) -> Parts<'_, T, M> {
        Parts {
            io0: crate::Pin::new(Channel::Io0, &self.0),
            io1: crate::Pin::new(Channel::Io1, &self.0),
            io2: crate::Pin::new(Channel::Io2, &self.0),
            io3: crate::Pin::new(Channel::Io3, &self.0),
        }
    }

    /// Run `f` with exclusive access to the driver.
    pub fn lock<R, F: FnOnce(&mut Pca9536<T>) -> R>(&self, f: F) -> R {
        self.0.lock(f)
    }
}

pub struct Parts<'a, T, M = core::cell::RefCell<Pca9536<T>>>
where
    T: Transport,
    M: crate::PortMutex<Port = Pca9536<T>>,
{
    pub io0: crate::Pin<'a, crate::mode::Input, M>,
    pub io1: crate::Pin<'a, crate::mode::Input, M>,
    pub io2: crate::Pin<'a, crate::mode::Input, M>,
    pub io3: crate::Pin<'a, crate::mode::Input, M>,
}
