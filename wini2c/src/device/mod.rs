use log::debug;

use crate::config::{BusSpeed, I2cDeviceConfig, SharingMode};
use crate::driver::{Connection, Driver, MAX_DEVICE_ID_LEN};
use crate::error::{DriverError, Error};
use crate::mcp2221::{Mcp2221Connection, Mcp2221Driver};

mod i2c_eh;

/// Handle to one target device on an I2C bus.
///
/// # Quick start
///
/// Open a handle with [`I2cDevice::open`] (or the [`device`] shorthand) to use the
/// MCP2221 backend, or with [`I2cDevice::open_with`] to use another [`Driver`].
///
/// [`device`]: crate::device()
///
/// Each transfer comes in two flavours. The strict methods ([`read`], [`write`],
/// [`write_read`]) either move every byte or return [`Error::Io`]. The partial
/// methods ([`read_partial`], [`write_partial`], [`write_read_partial`]) accept a
/// short transfer and tell you how much actually moved.
///
/// [`read`]: I2cDevice::read
/// [`write`]: I2cDevice::write
/// [`write_read`]: I2cDevice::write_read
/// [`read_partial`]: I2cDevice::read_partial
/// [`write_partial`]: I2cDevice::write_partial
/// [`write_read_partial`]: I2cDevice::write_read_partial
///
/// # Open and closed handles
///
/// Every method first checks that the handle holds an open connection and returns
/// [`Error::NotInitialized`] without calling the driver if it does not. A handle is
/// closed if it came from [`I2cDevice::default`] or after [`I2cDevice::release`].
///
/// # Threads
///
/// The handle is not safe to use from several threads at once. Calls must be
/// serialized by the caller; there is no internal locking. (The MCP2221 connection
/// is `!Sync`, so the compiler enforces this for the default backend.)
#[derive(Debug)]
pub struct I2cDevice<C: Connection = Mcp2221Connection> {
    connection: Option<C>,
}

impl<C: Connection> Default for I2cDevice<C> {
    /// A handle that has never been opened.
    fn default() -> Self {
        Self { connection: None }
    }
}

impl I2cDevice {
    /// Open a handle on an MCP2221 bridge with the default USB vendor and product ID.
    ///
    /// `config.controller_id` selects among the attached bridges; see
    /// [`Mcp2221Driver::controllers`].
    ///
    /// # Errors
    ///
    /// [`Error::Open`] if the bridge cannot be found or opened, the address is not a
    /// 7-bit address, or the target is held under a conflicting sharing mode.
    pub fn open(config: I2cDeviceConfig) -> Result<Self, Error> {
        Self::open_with(&Mcp2221Driver::new(), config)
    }
}

impl<C: Connection> I2cDevice<C> {
    /// Open a handle using the given driver.
    ///
    /// # Errors
    ///
    /// [`Error::Open`] with the driver's reason if the connection cannot be opened.
    pub fn open_with<D>(driver: &D, config: I2cDeviceConfig) -> Result<Self, Error>
    where
        D: Driver<Connection = C>,
    {
        debug!(
            "opening I2C controller {} address {:#04X} ({:?}, {:?})",
            config.controller_id, config.slave_address, config.bus_speed, config.sharing_mode
        );
        let connection = driver.open(&config).map_err(Error::Open)?;
        Ok(Self {
            connection: Some(connection),
        })
    }

    /// True if the handle holds an open connection.
    pub fn is_open(&self) -> bool {
        self.connection.is_some()
    }

    /// Close the connection.
    ///
    /// Calling this on a closed handle does nothing. It is also called when the
    /// handle is dropped.
    pub fn release(&mut self) {
        if let Some(connection) = self.connection.take() {
            debug!("releasing I2C connection");
            connection.close();
        }
    }

    fn connection(&mut self) -> Result<&mut C, Error> {
        self.connection.as_mut().ok_or(Error::NotInitialized)
    }

    fn connection_ref(&self) -> Result<&C, Error> {
        self.connection.as_ref().ok_or(Error::NotInitialized)
    }

    ////////////////////////////////////////////////////////////////////////////////
    // Transfers
    ////////////////////////////////////////////////////////////////////////////////

    /// Read exactly `count` bytes from the target.
    ///
    /// A `count` of zero returns an empty vector without touching the bus.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the transfer fails or delivers fewer than `count` bytes, or
    /// if a buffer of `count` bytes cannot be allocated.
    pub fn read(&mut self, count: usize) -> Result<Vec<u8>, Error> {
        self.connection()?;
        let mut buffer = zeroed(count)?;
        self.read_into(&mut buffer)?;
        Ok(buffer)
    }

    /// Read up to `count` bytes from the target.
    ///
    /// The result is truncated to the number of bytes the driver delivered, which
    /// may be fewer than requested without that being an error.
    pub fn read_partial(&mut self, count: usize) -> Result<Vec<u8>, Error> {
        let connection = self.connection()?;
        if count == 0 {
            return Ok(Vec::new());
        }
        let mut buffer = zeroed(count)?;
        let read = connection.read(&mut buffer).map_err(Error::Io)?;
        buffer.truncate(read);
        Ok(buffer)
    }

    /// Write all of `data` to the target.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] unless the driver accepted every byte.
    pub fn write(&mut self, data: &[u8]) -> Result<(), Error> {
        self.connection()?.write(data).map_err(Error::Io)
    }

    /// Write `data` to the target and return how many bytes were accepted.
    ///
    /// The count is in `0..=data.len()`; a short write is not an error.
    pub fn write_partial(&mut self, data: &[u8]) -> Result<usize, Error> {
        let written = self.connection()?.write_partial(data).map_err(Error::Io)?;
        Ok(written.min(data.len()))
    }

    /// Write `data`, then read exactly `count` bytes, as a single transaction.
    ///
    /// With a `count` of zero only the write phase takes place.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if either phase fails. Nothing read is returned in that case.
    pub fn write_read(&mut self, data: &[u8], count: usize) -> Result<Vec<u8>, Error> {
        self.connection()?;
        let mut buffer = zeroed(count)?;
        self.write_read_into(data, &mut buffer)?;
        Ok(buffer)
    }

    /// Write `data`, then read up to `count` bytes, as a single transaction.
    ///
    /// The result is truncated to the number of bytes delivered by the read phase.
    pub fn write_read_partial(&mut self, data: &[u8], count: usize) -> Result<Vec<u8>, Error> {
        let connection = self.connection()?;
        if count == 0 {
            if !data.is_empty() {
                connection.write(data).map_err(Error::Io)?;
            }
            return Ok(Vec::new());
        }
        let mut buffer = zeroed(count)?;
        let read = connection
            .write_read_partial(data, &mut buffer)
            .map_err(Error::Io)?;
        buffer.truncate(read);
        Ok(buffer)
    }

    /// Strict read filling the whole of `buffer`.
    fn read_into(&mut self, buffer: &mut [u8]) -> Result<(), Error> {
        let connection = self.connection()?;
        if buffer.is_empty() {
            return Ok(());
        }
        let read = connection.read(buffer).map_err(Error::Io)?;
        if read < buffer.len() {
            return Err(Error::Io(DriverError::ShortTransfer {
                expected: buffer.len(),
                actual: read,
            }));
        }
        Ok(())
    }

    /// Strict write-read filling the whole of `buffer`.
    fn write_read_into(&mut self, data: &[u8], buffer: &mut [u8]) -> Result<(), Error> {
        let connection = self.connection()?;
        match (data.is_empty(), buffer.is_empty()) {
            (true, true) => Ok(()),
            (false, true) => connection.write(data).map_err(Error::Io),
            (_, false) => connection.write_read(data, buffer).map_err(Error::Io),
        }
    }

    ////////////////////////////////////////////////////////////////////////////////
    // Metadata
    ////////////////////////////////////////////////////////////////////////////////

    /// Platform-assigned identifier of the open connection.
    ///
    /// For the MCP2221 backend this is the USB HID device path.
    ///
    /// # Errors
    ///
    /// [`Error::Query`] if the driver cannot supply the id, or supplies one longer
    /// than [`MAX_DEVICE_ID_LEN`] bytes.
    pub fn device_id(&self) -> Result<String, Error> {
        let id = self.connection_ref()?.device_id().map_err(Error::Query)?;
        if id.len() > MAX_DEVICE_ID_LEN {
            return Err(Error::Query(DriverError::DeviceIdTooLong(id.len())));
        }
        Ok(id)
    }

    /// Slave address in effect for the open connection.
    pub fn slave_address(&self) -> Result<u16, Error> {
        self.connection_ref()?.slave_address().map_err(Error::Query)
    }

    /// Bus speed in effect for the open connection.
    ///
    /// This may differ from the speed requested if the driver normalized it.
    pub fn bus_speed(&self) -> Result<BusSpeed, Error> {
        self.connection_ref()?.bus_speed().map_err(Error::Query)
    }

    /// Sharing mode in effect for the open connection.
    pub fn sharing_mode(&self) -> Result<SharingMode, Error> {
        self.connection_ref()?.sharing_mode().map_err(Error::Query)
    }
}

impl<C: Connection> Drop for I2cDevice<C> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Zero-filled receive buffer of `count` bytes.
///
/// A count that cannot be allocated is reported as a transfer error rather than
/// aborting the process.
fn zeroed(count: usize) -> Result<Vec<u8>, Error> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(count)
        .map_err(|_| Error::Io(DriverError::TransferTooLong(count)))?;
    buffer.resize(count, 0);
    Ok(buffer)
}
