use embedded_hal::digital::PinState;

/// Broadcast value putting every channel into output mode.
pub const ALL_OUTPUT: u8 = 0x00;
/// Broadcast value putting every channel into input mode.
pub const ALL_INPUT: u8 = 0x0F;
/// Broadcast value driving every output LOW.
pub const ALL_LOW: u8 = 0x00;
/// Broadcast value driving every output HIGH.
pub const ALL_HIGH: u8 = 0x0F;
/// Broadcast value clearing the inversion of every input.
pub const ALL_NON_INVERTED: u8 = 0x00;
/// Broadcast value inverting every input.
pub const ALL_INVERTED: u8 = 0x0F;

/// Register pointers of the device.
///
/// Each register is 8 bits wide but only the low nibble carries channel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    /// Sensed pin levels (read-only).
    Input = 0x00,
    /// Levels driven on pins configured as outputs.
    Output = 0x01,
    /// Inversion mask, applies to inputs only.
    Polarity = 0x02,
    /// Direction mask, `1` = input.
    Configuration = 0x03,
}

impl From<Register> for u8 {
    fn from(r: Register) -> u8 {
        r as u8
    }
}

/// One of the four I/O channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    Io0 = 0,
    Io1 = 1,
    Io2 = 2,
    Io3 = 3,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::Io0, Channel::Io1, Channel::Io2, Channel::Io3];

    /// Bit position of this channel inside a register.
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn mask(self) -> u8 {
        1 << self.index()
    }
}

impl TryFrom<u8> for Channel {
    type Error = u8;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Channel::Io0),
            1 => Ok(Channel::Io1),
            2 => Ok(Channel::Io2),
            3 => Ok(Channel::Io3),
            _ => Err(v),
        }
    }
}

/// Pin direction as stored in the configuration register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    Output = 0,
    Input = 1,
}

impl Mode {
    pub(crate) fn broadcast(self) -> u8 {
        match self {
            Mode::Output => ALL_OUTPUT,
            Mode::Input => ALL_INPUT,
        }
    }
}

impl From<bool> for Mode {
    fn from(bit: bool) -> Self {
        if bit {
            Mode::Input
        } else {
            Mode::Output
        }
    }
}

impl From<Mode> for bool {
    fn from(m: Mode) -> bool {
        m == Mode::Input
    }
}

/// Input inversion as stored in the polarity register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    NonInverted = 0,
    Inverted = 1,
}

impl Polarity {
    pub(crate) fn broadcast(self) -> u8 {
        match self {
            Polarity::NonInverted => ALL_NON_INVERTED,
            Polarity::Inverted => ALL_INVERTED,
        }
    }
}

impl From<bool> for Polarity {
    fn from(bit: bool) -> Self {
        if bit {
            Polarity::Inverted
        } else {
            Polarity::NonInverted
        }
    }
}

impl From<Polarity> for bool {
    fn from(p: Polarity) -> bool {
        p == Polarity::Inverted
    }
}

pub(crate) fn state_broadcast(state: PinState) -> u8 {
    match state {
        PinState::Low => ALL_LOW,
        PinState::High => ALL_HIGH,
    }
}

pub(crate) fn write_bit(reg: u8, channel: Channel, value: bool) -> u8 {
    if value {
        reg | channel.mask()
    } else {
        reg & !channel.mask()
    }
}

/// Compute the polarity register value for a broadcast polarity write.
///
/// Bits of channels configured as outputs (`0` in `config`) keep their value from
/// `polarity`, bits of input channels are taken from `value`.
pub fn broadcast_polarity(polarity: u8, config: u8, value: u8) -> u8 {
    (polarity & !config) | (value & config)
}

/// Pin Modes
pub mod mode {
    /// Trait for pin-modes which can be used to set a logic level.
    pub trait HasOutput {}
    /// Trait for pin-modes which can be used to read a logic level.
    pub trait HasInput {}

    /// Pin configured as an input.
    pub struct Input;
    impl HasInput for Input {}

    /// Pin configured as an output.
    pub struct Output;
    impl HasOutput for Output {}
}
