//! Driver for the PCA9536 4-bit I2C GPIO expander.
//!
//! [`Pca9536`] exposes the device registers directly (mode, state, polarity, toggle, reset) and
//! reports bus failures through [`Pca9536::com_result()`] instead of `Result`s.
//! [`SharedPca9536`] puts the driver behind a [`PortMutex`] and splits it into
//! `embedded-hal` pin handles which do return errors.
//!
//! ```
//! # use embedded_hal_mock::eh1::i2c::{Mock, Transaction};
//! # let mut i2c = Mock::new(&[
//! #     Transaction::write(0x41, vec![0x03, 0x00]),
//! #     Transaction::write(0x41, vec![0x01]),
//! #     Transaction::read(0x41, vec![0x0f]),
//! #     Transaction::write(0x41, vec![0x01, 0x0e]),
//! # ]);
//! use pca9536_driver::{Channel, Mode, Pca9536, PinState};
//!
//! let mut pca = Pca9536::new(i2c.clone());
//! pca.set_mode_all(Mode::Output);
//! pca.set_state(Channel::Io0, PinState::Low);
//! assert_eq!(pca.com_result(), 0);
//! # i2c.done();
//! ```
#![cfg_attr(not(any(test, feature = "std")), no_std)]

mod bus;
mod common;
pub mod dev;
mod mutex;
mod pin;

pub use bus::{
    ComError, I2cTransport, Transport, BUFFER_LENGTH, STATUS_ADDRESS_NACK, STATUS_DATA_NACK,
    STATUS_DATA_TOO_LONG, STATUS_OTHER, STATUS_SUCCESS, STATUS_TIMEOUT,
};
pub use common::{
    broadcast_polarity, mode, Channel, Mode, Polarity, Register, ALL_HIGH, ALL_INPUT,
    ALL_INVERTED, ALL_LOW, ALL_NON_INVERTED, ALL_OUTPUT,
};
pub use embedded_hal::digital::PinState;
pub use mutex::PortMutex;
pub use pin::{Pin, PinError};

pub use dev::pca9536::{Pca9536, SharedPca9536, ADDRESS};
