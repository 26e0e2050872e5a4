//! The boundary between the device handle and a native I2C driver.
//!
//! A [`Driver`] opens [`Connection`]s; the connection performs the transfers.
//! [`I2cDevice`] wraps one connection and adds the open/closed bookkeeping, the
//! buffer sizing, and the strict-versus-partial distinction, so implementations of
//! these traits only need to move bytes and report what happened.
//!
//! [`I2cDevice`]: crate::I2cDevice
use crate::config::{BusSpeed, I2cDeviceConfig, SharingMode};
use crate::error::DriverError;

/// Longest device id, in bytes, that a connection may report.
pub const MAX_DEVICE_ID_LEN: usize = 256;

/// A native I2C driver that can open connections to bus targets.
pub trait Driver {
    /// The open connection type.
    type Connection: Connection;

    /// Open a connection to `config.slave_address` on controller
    /// `config.controller_id` with the requested speed and sharing mode.
    ///
    /// On failure any partially acquired resource must already be released.
    fn open(&self, config: &I2cDeviceConfig) -> Result<Self::Connection, DriverError>;
}

/// One open connection to a target on the bus.
///
/// Connections are not expected to be safe to use from several threads at once.
pub trait Connection {
    /// Read from the target into `buffer`, returning the number of bytes received.
    ///
    /// Returning fewer bytes than `buffer.len()` is not itself a failure.
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, DriverError>;

    /// Write all of `data` to the target.
    fn write(&mut self, data: &[u8]) -> Result<(), DriverError>;

    /// Write `data` to the target, returning how many bytes were accepted.
    fn write_partial(&mut self, data: &[u8]) -> Result<usize, DriverError>;

    /// Write all of `data`, then fill `buffer` from the target, as one transaction.
    fn write_read(&mut self, data: &[u8], buffer: &mut [u8]) -> Result<(), DriverError>;

    /// Write all of `data`, then read into `buffer`, returning the number of bytes
    /// received in the read phase.
    fn write_read_partial(&mut self, data: &[u8], buffer: &mut [u8])
    -> Result<usize, DriverError>;

    /// Platform-assigned identifier for this connection.
    fn device_id(&self) -> Result<String, DriverError>;

    /// Slave address in effect for this connection.
    fn slave_address(&self) -> Result<u16, DriverError>;

    /// Bus speed in effect for this connection.
    fn bus_speed(&self) -> Result<BusSpeed, DriverError>;

    /// Sharing mode in effect for this connection.
    fn sharing_mode(&self) -> Result<SharingMode, DriverError>;

    /// Release the connection.
    fn close(self);
}

#[cfg(test)]
pub(crate) mod stub;
