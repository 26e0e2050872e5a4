//! Recording driver used by the unit tests.
use std::cell::RefCell;
use std::rc::Rc;

use super::{Connection, Driver};
use crate::config::{BusSpeed, I2cDeviceConfig, SharingMode};
use crate::error::DriverError;

/// Number of times each driver entry point was called.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Calls {
    pub(crate) open: usize,
    pub(crate) close: usize,
    pub(crate) read: usize,
    pub(crate) write: usize,
    pub(crate) write_partial: usize,
    pub(crate) write_read: usize,
    pub(crate) write_read_partial: usize,
    /// Read phases actually started inside a write-read.
    pub(crate) read_phase: usize,
    pub(crate) query: usize,
}

impl Calls {
    pub(crate) fn transfers(&self) -> usize {
        self.read + self.write + self.write_partial + self.write_read + self.write_read_partial
    }
}

/// Driver whose connections read back `0, 1, 2, ...` and record what is written.
#[derive(Debug, Default, Clone)]
pub(crate) struct StubDriver {
    pub(crate) calls: Rc<RefCell<Calls>>,
    pub(crate) written: Rc<RefCell<Vec<u8>>>,
    pub(crate) fail_open: bool,
    pub(crate) fail_reads: bool,
    pub(crate) fail_writes: bool,
    /// Upper bound on bytes moved by a single read or write.
    pub(crate) limit: Option<usize>,
    /// Overrides the device id reported by connections.
    pub(crate) device_id: Option<String>,
}

impl StubDriver {
    pub(crate) fn calls(&self) -> Calls {
        self.calls.borrow().clone()
    }
}

impl Driver for StubDriver {
    type Connection = StubConnection;

    fn open(&self, config: &I2cDeviceConfig) -> Result<StubConnection, DriverError> {
        self.calls.borrow_mut().open += 1;
        if self.fail_open {
            return Err(DriverError::BusInUse(config.slave_address));
        }
        Ok(StubConnection {
            driver: self.clone(),
            config: *config,
        })
    }
}

#[derive(Debug)]
pub(crate) struct StubConnection {
    driver: StubDriver,
    config: I2cDeviceConfig,
}

impl StubConnection {
    fn allowed(&self, requested: usize) -> usize {
        self.driver.limit.map_or(requested, |limit| limit.min(requested))
    }

    fn fill(&self, buffer: &mut [u8]) -> Result<usize, DriverError> {
        if self.driver.fail_reads {
            return Err(DriverError::Failure);
        }
        self.driver.calls.borrow_mut().read_phase += 1;
        let n = self.allowed(buffer.len());
        for (i, byte) in buffer[..n].iter_mut().enumerate() {
            *byte = i as u8;
        }
        Ok(n)
    }

    fn accept(&self, data: &[u8]) -> Result<usize, DriverError> {
        if self.driver.fail_writes {
            return Err(DriverError::Failure);
        }
        let n = self.allowed(data.len());
        self.driver.written.borrow_mut().extend_from_slice(&data[..n]);
        Ok(n)
    }
}

impl Connection for StubConnection {
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, DriverError> {
        self.driver.calls.borrow_mut().read += 1;
        self.fill(buffer)
    }

    fn write(&mut self, data: &[u8]) -> Result<(), DriverError> {
        self.driver.calls.borrow_mut().write += 1;
        match self.accept(data)? {
            n if n == data.len() => Ok(()),
            _ => Err(DriverError::Failure),
        }
    }

    fn write_partial(&mut self, data: &[u8]) -> Result<usize, DriverError> {
        self.driver.calls.borrow_mut().write_partial += 1;
        self.accept(data)
    }

    fn write_read(&mut self, data: &[u8], buffer: &mut [u8]) -> Result<(), DriverError> {
        self.driver.calls.borrow_mut().write_read += 1;
        self.accept(data)?;
        match self.fill(buffer)? {
            n if n == buffer.len() => Ok(()),
            _ => Err(DriverError::Failure),
        }
    }

    fn write_read_partial(
        &mut self,
        data: &[u8],
        buffer: &mut [u8],
    ) -> Result<usize, DriverError> {
        self.driver.calls.borrow_mut().write_read_partial += 1;
        self.accept(data)?;
        self.fill(buffer)
    }

    fn device_id(&self) -> Result<String, DriverError> {
        self.driver.calls.borrow_mut().query += 1;
        Ok(self
            .driver
            .device_id
            .clone()
            .unwrap_or_else(|| format!("stub-i2c-{}", self.config.controller_id)))
    }

    fn slave_address(&self) -> Result<u16, DriverError> {
        self.driver.calls.borrow_mut().query += 1;
        Ok(self.config.slave_address)
    }

    fn bus_speed(&self) -> Result<BusSpeed, DriverError> {
        self.driver.calls.borrow_mut().query += 1;
        Ok(self.config.bus_speed)
    }

    fn sharing_mode(&self) -> Result<SharingMode, DriverError> {
        self.driver.calls.borrow_mut().query += 1;
        Ok(self.config.sharing_mode)
    }

    fn close(self) {
        self.driver.calls.borrow_mut().close += 1;
    }
}
