//! Connection settings and the integer-coded bus speed and sharing mode values.

use thiserror::Error;

/// Integer code for [`BusSpeed::Standard`].
pub const STANDARD_SPEED: i32 = BusSpeed::Standard as i32;
/// Integer code for [`BusSpeed::Fast`].
pub const FAST_SPEED: i32 = BusSpeed::Fast as i32;
/// Integer code for [`SharingMode::Exclusive`].
pub const EXCLUSIVE_MODE: i32 = SharingMode::Exclusive as i32;
/// Integer code for [`SharingMode::Shared`].
pub const SHARED_MODE: i32 = SharingMode::Shared as i32;

/// Clock rate class requested for transfers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum BusSpeed {
    /// 100 kbit/s ("Standard-mode").
    #[default]
    Standard = 0,
    /// 400 kbit/s ("Fast-mode").
    Fast = 1,
}

impl BusSpeed {
    /// Nominal bus clock rate in Hz.
    pub fn frequency(self) -> u32 {
        match self {
            BusSpeed::Standard => 100_000,
            BusSpeed::Fast => 400_000,
        }
    }
}

/// Whether other connections may be opened to the same target.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum SharingMode {
    /// The connection must be the sole owner of the target.
    #[default]
    Exclusive = 0,
    /// Other shared connections to the target are permitted.
    Shared = 1,
}

/// An integer did not correspond to any bus speed or sharing mode.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{code} is not a valid {kind} code")]
pub struct InvalidCode {
    /// Which setting was being decoded.
    pub kind: &'static str,
    /// The rejected integer.
    pub code: i32,
}

impl From<BusSpeed> for i32 {
    fn from(value: BusSpeed) -> i32 {
        value as i32
    }
}

impl TryFrom<i32> for BusSpeed {
    type Error = InvalidCode;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            STANDARD_SPEED => Ok(BusSpeed::Standard),
            FAST_SPEED => Ok(BusSpeed::Fast),
            code => Err(InvalidCode {
                kind: "bus speed",
                code,
            }),
        }
    }
}

impl From<SharingMode> for i32 {
    fn from(value: SharingMode) -> i32 {
        value as i32
    }
}

impl TryFrom<i32> for SharingMode {
    type Error = InvalidCode;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            EXCLUSIVE_MODE => Ok(SharingMode::Exclusive),
            SHARED_MODE => Ok(SharingMode::Shared),
            code => Err(InvalidCode {
                kind: "sharing mode",
                code,
            }),
        }
    }
}

/// Settings used to open an [`I2cDevice`].
///
/// [`I2cDevice`]: crate::I2cDevice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2cDeviceConfig {
    /// Which bus controller to open.
    pub controller_id: u32,
    /// Address of the target device on the bus.
    pub slave_address: u16,
    /// Requested bus speed. Defaults to [`BusSpeed::Standard`].
    pub bus_speed: BusSpeed,
    /// Requested sharing mode. Defaults to [`SharingMode::Exclusive`].
    pub sharing_mode: SharingMode,
}

impl I2cDeviceConfig {
    /// Settings for the given controller and target, at standard speed and in
    /// exclusive mode.
    pub fn new(controller_id: u32, slave_address: u16) -> Self {
        Self {
            controller_id,
            slave_address,
            bus_speed: BusSpeed::default(),
            sharing_mode: SharingMode::default(),
        }
    }

    /// Request a different bus speed.
    pub fn with_bus_speed(mut self, bus_speed: BusSpeed) -> Self {
        self.bus_speed = bus_speed;
        self
    }

    /// Request a different sharing mode.
    pub fn with_sharing_mode(mut self, sharing_mode: SharingMode) -> Self {
        self.sharing_mode = sharing_mode;
        self
    }
}
