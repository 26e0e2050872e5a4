#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
mod device;
pub mod driver;
mod error;
pub mod mcp2221;

pub use config::{
    BusSpeed, EXCLUSIVE_MODE, FAST_SPEED, I2cDeviceConfig, SHARED_MODE, STANDARD_SPEED,
    SharingMode,
};
pub use device::I2cDevice;
pub use error::{DriverError, Error};

/// Open a handle on MCP2221 controller `controller_id` for the target at
/// `slave_address`, at standard speed and in exclusive mode.
///
/// Use [`I2cDevice::open`] with an [`I2cDeviceConfig`] to choose another bus speed
/// or sharing mode.
///
/// # Errors
///
/// [`Error::Open`] if the connection cannot be opened.
pub fn device(controller_id: u32, slave_address: u16) -> Result<I2cDevice, Error> {
    I2cDevice::open(I2cDeviceConfig::new(controller_id, slave_address))
}
