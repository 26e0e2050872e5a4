//! embedded_hal I2C trait implementations for the device handle.
use embedded_hal::i2c::{self, I2c, Operation, SevenBitAddress};

use super::I2cDevice;
use crate::driver::Connection;
use crate::error::{DriverError, Error};

impl i2c::Error for Error {
    fn kind(&self) -> i2c::ErrorKind {
        use embedded_hal::i2c::NoAcknowledgeSource::Address;
        match self.driver_error() {
            Some(DriverError::AddressNack) => i2c::ErrorKind::NoAcknowledge(Address),
            _ => i2c::ErrorKind::Other,
        }
    }
}

impl<C: Connection> i2c::ErrorType for I2cDevice<C> {
    type Error = Error;
}

/// Helper to chunk operations based on type (enum case).
fn same_operation_type(a: &Operation, b: &Operation) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

type Ops<'a, 'b, 'c> = &'a mut &'b mut [Operation<'c>];
type WritesReads<'a, 'b, 'c> = (Option<Ops<'a, 'b, 'c>>, Option<Ops<'a, 'b, 'c>>);

/// Split chunked operations into an optional run of writes and an optional run of
/// reads that follows it.
fn split_writes_reads<'a, 'b, 'c>(
    ops: &'a mut [&'b mut [Operation<'c>]],
) -> Result<WritesReads<'a, 'b, 'c>, Error> {
    match ops {
        [] => Ok((None, None)),
        [reads @ [Operation::Read(_), ..]] => Ok((None, Some(reads))),
        [writes @ [Operation::Write(_), ..]] => Ok((Some(writes), None)),
        [
            writes @ [Operation::Write(_), ..],
            reads @ [Operation::Read(_), ..],
        ] => Ok((Some(writes), Some(reads))),
        // Read-before-write, in any arrangement.
        _ => Err(Error::UnsupportedTransaction),
    }
}

impl<C: Connection> I2cDevice<C> {
    /// The handle is bound to one target, so reject calls addressed elsewhere.
    fn check_address(&self, address: SevenBitAddress) -> Result<(), Error> {
        let bound = self.slave_address()?;
        if u16::from(address) == bound {
            Ok(())
        } else {
            Err(Error::AddressMismatch {
                requested: address,
                bound,
            })
        }
    }
}

impl<C: Connection> I2c<SevenBitAddress> for I2cDevice<C> {
    /// Execute the provided operations on the I2C bus.
    ///
    /// <div class="warning">
    ///
    /// Only writes, reads, and writes followed by reads are supported. Transactions
    /// that place a read before a write return [`Error::UnsupportedTransaction`].
    ///
    /// </div>
    ///
    /// Adjacent buffers of the same kind are coalesced into a single transfer, so
    /// the data is copied once on the way in and once on the way out. Prefer the
    /// single-buffer methods where you can.
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.check_address(address)?;
        let mut chunked: Vec<&mut [Operation<'_>]> =
            operations.chunk_by_mut(same_operation_type).collect();
        let (writes, reads) = match split_writes_reads(chunked.as_mut_slice())? {
            (None, None) => return Ok(()),
            split => split,
        };

        let mut write_data = Vec::new();
        for op in writes.iter().flat_map(|ops| ops.iter()) {
            if let Operation::Write(buf) = op {
                write_data.extend_from_slice(buf);
            }
        }

        let Some(reads) = reads else {
            return I2cDevice::write(self, &write_data);
        };

        let read_length: usize = reads
            .iter()
            .map(|op| match op {
                Operation::Read(buf) => buf.len(),
                Operation::Write(_) => 0,
            })
            .sum();
        let mut our_buffer = vec![0u8; read_length];
        if write_data.is_empty() {
            self.read_into(&mut our_buffer)?;
        } else {
            self.write_read_into(&write_data, &mut our_buffer)?;
        }

        // Fill the caller's buffers one at a time from our buffer.
        let mut copied_so_far = 0;
        for op in reads.iter_mut() {
            if let Operation::Read(their_buffer) = op {
                let end = copied_so_far + their_buffer.len();
                their_buffer.copy_from_slice(&our_buffer[copied_so_far..end]);
                copied_so_far = end;
            }
        }
        Ok(())
    }

    fn read(&mut self, address: SevenBitAddress, read: &mut [u8]) -> Result<(), Self::Error> {
        self.check_address(address)?;
        self.read_into(read)
    }

    fn write(&mut self, address: SevenBitAddress, write: &[u8]) -> Result<(), Self::Error> {
        self.check_address(address)?;
        I2cDevice::write(self, write)
    }

    fn write_read(
        &mut self,
        address: SevenBitAddress,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.check_address(address)?;
        self.write_read_into(write, read)
    }
}

#[cfg(feature = "async")]
mod eh_async {
    use embedded_hal::i2c::{I2c as BlockingI2c, Operation};
    use embedded_hal_async::i2c::I2c as AsyncI2c;

    use crate::I2cDevice;
    use crate::driver::Connection;

    /// Delegates to the blocking implementation; transfers still block the caller.
    impl<C: Connection> AsyncI2c for I2cDevice<C> {
        async fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            BlockingI2c::transaction(self, address, operations)
        }

        async fn read(&mut self, address: u8, read: &mut [u8]) -> Result<(), Self::Error> {
            BlockingI2c::read(self, address, read)
        }

        async fn write(&mut self, address: u8, write: &[u8]) -> Result<(), Self::Error> {
            BlockingI2c::write(self, address, write)
        }

        async fn write_read(
            &mut self,
            address: u8,
            write: &[u8],
            read: &mut [u8],
        ) -> Result<(), Self::Error> {
            BlockingI2c::write_read(self, address, write, read)
        }
    }
}

#[cfg(test)]
mod test {
    use embedded_hal::i2c::{ErrorKind, I2c, NoAcknowledgeSource};

    use super::*;
    use crate::config::I2cDeviceConfig;
    use crate::driver::stub::{StubConnection, StubDriver};

    const ADDRESS: u8 = 0x26;

    fn open(driver: &StubDriver) -> I2cDevice<StubConnection> {
        I2cDevice::open_with(driver, I2cDeviceConfig::new(0, ADDRESS.into())).unwrap()
    }

    #[test]
    fn eh_read_fills_buffer() {
        let driver = StubDriver::default();
        let mut device = open(&driver);
        let mut buf = [0xFFu8; 4];
        I2c::read(&mut device, ADDRESS, &mut buf).unwrap();
        assert_eq!(buf, [0, 1, 2, 3]);
    }

    #[test]
    fn eh_wrong_address_rejected_before_transfer() {
        let driver = StubDriver::default();
        let mut device = open(&driver);
        let err = I2c::write(&mut device, 0x27, &[1]).unwrap_err();
        assert!(matches!(
            err,
            Error::AddressMismatch {
                requested: 0x27,
                bound: 0x26
            }
        ));
        assert_eq!(driver.calls().transfers(), 0);
    }

    #[test]
    fn eh_write_read_transaction_coalesces_buffers() {
        let driver = StubDriver::default();
        let mut device = open(&driver);
        let mut buf_1 = [0u8; 3];
        let mut buf_2 = [0u8; 2];
        device
            .transaction(
                ADDRESS,
                &mut [
                    Operation::Write(&[0x30]),
                    Operation::Write(&[10]),
                    Operation::Read(&mut buf_1),
                    Operation::Read(&mut buf_2),
                ],
            )
            .unwrap();
        assert_eq!(buf_1, [0, 1, 2]);
        assert_eq!(buf_2, [3, 4]);
        assert_eq!(*driver.written.borrow(), [0x30, 10]);
        assert_eq!(driver.calls().write_read, 1);
    }

    #[test]
    fn eh_write_transaction() {
        let driver = StubDriver::default();
        let mut device = open(&driver);
        device
            .transaction(
                ADDRESS,
                &mut [Operation::Write(&[0x40, 0x41]), Operation::Write(&[0x50])],
            )
            .unwrap();
        assert_eq!(*driver.written.borrow(), [0x40, 0x41, 0x50]);
        assert_eq!(driver.calls().write, 1);
    }

    #[test]
    fn eh_read_before_write_rejected() {
        let driver = StubDriver::default();
        let mut device = open(&driver);
        let mut buf = [0u8; 1];
        let err = device
            .transaction(
                ADDRESS,
                &mut [Operation::Read(&mut buf), Operation::Write(&[1])],
            )
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedTransaction));
        assert_eq!(driver.calls().transfers(), 0);
    }

    #[test]
    fn error_kinds() {
        use embedded_hal::i2c::Error as _;
        assert_eq!(
            Error::Io(DriverError::AddressNack).kind(),
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
        );
        assert_eq!(Error::NotInitialized.kind(), ErrorKind::Other);
    }
}
