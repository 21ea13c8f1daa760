use embedded_hal::i2c::{self as hal_i2c, Error as _};
use heapless::{Deque, Vec};
use log::{trace, warn};

/// Size of the transmit and receive buffers of [`I2cTransport`].
pub const BUFFER_LENGTH: usize = 32;

/// Status code of a successful transaction.
pub const STATUS_SUCCESS: u8 = 0;
/// The transaction did not fit into the transmit buffer.
pub const STATUS_DATA_TOO_LONG: u8 = 1;
/// No device acknowledged the address.
pub const STATUS_ADDRESS_NACK: u8 = 2;
/// The device did not acknowledge a data byte.
pub const STATUS_DATA_NACK: u8 = 3;
/// Any other bus error.
pub const STATUS_OTHER: u8 = 4;
/// The transfer timed out.
pub const STATUS_TIMEOUT: u8 = 5;

/// Framed two-wire bus access as used by the driver.
///
/// A write transaction is `begin_transaction()`, any number of `write()` calls and a final
/// `commit()` which performs the transfer and returns a status code (`0` on success).  Reads are
/// requested with `request_bytes()` and then drained byte by byte with `read()`.
///
/// [`I2cTransport`] implements this for any `embedded-hal` I2C bus.  Custom implementations can
/// be handed to [`Pca9536::with_transport()`][crate::Pca9536::with_transport].
pub trait Transport {
    /// Start a new write transaction to the device at `address`.
    fn begin_transaction(&mut self, address: u8);

    /// Queue a byte for the current transaction.  Returns the number of bytes queued.
    fn write(&mut self, byte: u8) -> usize;

    /// Transfer the queued bytes and return the bus status.
    fn commit(&mut self) -> u8;

    /// Read up to `count` bytes from `address` into the receive buffer.
    ///
    /// Returns how many bytes were actually received.
    fn request_bytes(&mut self, address: u8, count: usize) -> usize;

    /// Number of received bytes not yet consumed by `read()`.
    fn available(&self) -> usize;

    /// Take the next received byte.
    fn read(&mut self) -> Option<u8>;
}

/// Named form of a non-zero bus status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ComError {
    #[error("data too long for the transmit buffer")]
    DataTooLong,
    #[error("address not acknowledged")]
    AddressNack,
    #[error("data not acknowledged")]
    DataNack,
    #[error("bus error (status {0})")]
    Other(u8),
    #[error("bus timeout")]
    Timeout,
    /// The device acknowledged but sent the wrong number of bytes.  Never stored as a status.
    #[error("register read returned the wrong number of bytes")]
    ShortRead,
}

impl ComError {
    /// `None` for [`STATUS_SUCCESS`], the matching error otherwise.
    pub fn from_status(status: u8) -> Option<Self> {
        match status {
            STATUS_SUCCESS => None,
            STATUS_DATA_TOO_LONG => Some(ComError::DataTooLong),
            STATUS_ADDRESS_NACK => Some(ComError::AddressNack),
            STATUS_DATA_NACK => Some(ComError::DataNack),
            STATUS_TIMEOUT => Some(ComError::Timeout),
            other => Some(ComError::Other(other)),
        }
    }

    pub fn status(&self) -> u8 {
        match self {
            ComError::DataTooLong => STATUS_DATA_TOO_LONG,
            ComError::AddressNack => STATUS_ADDRESS_NACK,
            ComError::DataNack => STATUS_DATA_NACK,
            ComError::Other(s) => *s,
            ComError::Timeout => STATUS_TIMEOUT,
            ComError::ShortRead => STATUS_OTHER,
        }
    }
}

fn status_from_kind(kind: hal_i2c::ErrorKind) -> u8 {
    match kind {
        hal_i2c::ErrorKind::NoAcknowledge(hal_i2c::NoAcknowledgeSource::Address) => {
            STATUS_ADDRESS_NACK
        }
        hal_i2c::ErrorKind::NoAcknowledge(hal_i2c::NoAcknowledgeSource::Data) => STATUS_DATA_NACK,
        _ => STATUS_OTHER,
    }
}

/// [`Transport`] on top of an `embedded-hal` [`I2c`][hal_i2c::I2c] bus.
///
/// Queued bytes go out as a single `I2c::write()` on `commit()`; an empty transaction becomes an
/// empty write, which is how the device is pinged.
pub struct I2cTransport<I2C> {
    i2c: I2C,
    address: Option<u8>,
    tx: Vec<u8, BUFFER_LENGTH>,
    overflow: bool,
    rx: Deque<u8, BUFFER_LENGTH>,
}

impl<I2C> I2cTransport<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            address: None,
            tx: Vec::new(),
            overflow: false,
            rx: Deque::new(),
        }
    }

    /// Give back the wrapped bus.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: hal_i2c::I2c> Transport for I2cTransport<I2C> {
    fn begin_transaction(&mut self, address: u8) {
        self.address = Some(address);
        self.tx.clear();
        self.overflow = false;
    }

    fn write(&mut self, byte: u8) -> usize {
        match self.tx.push(byte) {
            Ok(()) => 1,
            Err(_) => {
                self.overflow = true;
                0
            }
        }
    }

    fn commit(&mut self) -> u8 {
        let Some(address) = self.address.take() else {
            return STATUS_OTHER;
        };

        let status = if self.overflow {
            STATUS_DATA_TOO_LONG
        } else {
            match self.i2c.write(address, &self.tx) {
                Ok(()) => STATUS_SUCCESS,
                Err(e) => {
                    let status = status_from_kind(e.kind());
                    warn!("i2c write to {:#04x} failed: {:?} (status {})", address, e.kind(), status);
                    status
                }
            }
        };

        trace!("commit {:#04x} {:02x?} -> {}", address, self.tx.as_slice(), status);
        self.tx.clear();
        self.overflow = false;
        status
    }

    fn request_bytes(&mut self, address: u8, count: usize) -> usize {
        self.rx.clear();
        let count = count.min(BUFFER_LENGTH);
        if count == 0 {
            return 0;
        }

        let mut buf = [0x00; BUFFER_LENGTH];
        match self.i2c.read(address, &mut buf[..count]) {
            Ok(()) => {
                for &b in &buf[..count] {
                    // cannot overflow, count is clamped to the capacity
                    let _ = self.rx.push_back(b);
                }
                trace!("read {:#04x} {:02x?}", address, &buf[..count]);
                count
            }
            Err(e) => {
                warn!("i2c read from {:#04x} failed: {:?}", address, e.kind());
                0
            }
        }
    }

    fn available(&self) -> usize {
        self.rx.len()
    }

    fn read(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }
}
