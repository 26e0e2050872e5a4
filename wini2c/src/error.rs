use thiserror::Error;

/// Problems when using an [`I2cDevice`].
///
/// Every operation on the handle reports failure through one of the first four
/// variants, which tell you _which kind_ of operation failed. Where the failure
/// came from the driver backend, the enclosed [`DriverError`] says why.
///
/// [`I2cDevice`]: crate::I2cDevice
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The handle has no open connection.
    ///
    /// Either it was never opened (see [`I2cDevice::default`]) or it has been
    /// released. No driver call was made.
    ///
    /// [`I2cDevice::default`]: crate::I2cDevice::default
    #[error("I2C device is not initialized")]
    NotInitialized,
    /// The connection could not be opened.
    #[error("could not open I2C device")]
    Open(#[source] DriverError),
    /// A read, write or write-read transfer failed.
    ///
    /// No partial data is returned alongside this error.
    #[error("I2C transfer failed")]
    Io(#[source] DriverError),
    /// A metadata query (device id, address, bus speed, sharing mode) failed.
    #[error("I2C device query failed")]
    Query(#[source] DriverError),
    /// An embedded-hal call addressed a target other than the one the handle is
    /// bound to.
    #[error("address {requested:#04X} does not match the device address {bound:#04X}")]
    AddressMismatch {
        /// Address passed to the embedded-hal method.
        requested: u8,
        /// Slave address the handle was opened with.
        bound: u16,
    },
    /// An embedded-hal transaction placed a read before a write.
    #[error("read-before-write transactions are not supported")]
    UnsupportedTransaction,
}

impl Error {
    /// The underlying driver failure, if there was one.
    pub fn driver_error(&self) -> Option<&DriverError> {
        match self {
            Error::Open(e) | Error::Io(e) | Error::Query(e) => Some(e),
            _ => None,
        }
    }
}

/// Failure reported by a driver backend.
///
/// Backends translate whatever their transport uses to signal failure into one
/// of these before returning, so no status codes leak past the driver boundary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DriverError {
    /// No controller exists with the given id.
    #[error("no I2C controller with id {0}")]
    ControllerNotFound(u32),
    /// The slave address is outside the range the controller can address.
    #[error("slave address {0:#X} is out of range for this controller")]
    AddressOutOfRange(u16),
    /// The target is already held by another connection under a sharing mode
    /// that conflicts with the one requested.
    #[error("slave address {0:#04X} is already held by another connection")]
    BusInUse(u16),
    /// The bus speed could not be changed because a transfer was in progress.
    #[error("bus speed could not be changed while a transfer was in progress")]
    CouldNotChangeSpeed,
    /// The target did not acknowledge its address.
    #[error("target did not acknowledge its address")]
    AddressNack,
    /// The I2C engine stayed busy through every retry.
    #[error("I2C engine busy")]
    EngineBusy,
    /// The I2C engine could not hand back data read from the target.
    #[error("I2C engine failed to read data from the target")]
    EngineReadError,
    /// The transfer is longer than the controller supports.
    #[error("transfer of {0} bytes exceeds the controller maximum")]
    TransferTooLong(usize),
    /// Fewer bytes were transferred than a strict operation requires.
    #[error("transfer moved {actual} of {expected} bytes")]
    ShortTransfer {
        /// Number of bytes requested.
        expected: usize,
        /// Number of bytes actually transferred.
        actual: usize,
    },
    /// The driver supplied a device id longer than [`MAX_DEVICE_ID_LEN`].
    ///
    /// [`MAX_DEVICE_ID_LEN`]: crate::driver::MAX_DEVICE_ID_LEN
    #[error("device id of {0} bytes exceeds the maximum length")]
    DeviceIdTooLong(usize),
    /// A command to the controller returned a non-success status code.
    #[error("command failed with status {0:#04X}")]
    CommandFailed(u8),
    /// The command code echoed by the controller was not the one written to it.
    #[error("command echo mismatch: sent {sent:#04X}, received {received:#04X}")]
    MismatchedCommandCodeEcho {
        /// Command code that was sent.
        sent: u8,
        /// Command code echoed back.
        received: u8,
    },
    /// The driver reported failure without further detail.
    #[error("driver reported failure")]
    Failure,
    /// The USB HID layer failed.
    #[error("USB HID error")]
    HidApi(#[from] hidapi::HidError),
}
