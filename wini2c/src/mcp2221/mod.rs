//! Driver backend for the Microchip MCP2221(A) USB to I2C bridge.
//!
//! The bridge is spoken to with 64-byte USB HID reports through [`hidapi`]. Each
//! attached bridge is one I2C controller; controller ids are indexes into the list
//! of attached bridges ordered by HID path (see [`Mcp2221Driver::controllers`]).
//!
//! Only 7-bit addresses are supported, and a single transfer is limited to 65,535
//! bytes. Bus speed is set when a connection is opened, and applies to the whole
//! bridge.
use std::thread::sleep;
use std::time::Duration;

use hidapi::{DeviceInfo, HidApi, HidDevice, HidError};
use log::{debug, trace};

use crate::config::{BusSpeed, I2cDeviceConfig, SharingMode};
use crate::driver::{Connection, Driver};
use crate::error::DriverError;
use claims::Claim;
use commands::{I2cAddressing, McpCommand, ReadType, UsbReport, WriteType};
use status::I2cStatus;

mod claims;
mod commands;
mod status;

/// Microchip USB vendor ID.
pub const MICROCHIP_VID: u16 = 0x04D8;
/// Product ID of both the MCP2221 and MCP2221A.
pub const MCP2221_PID: u16 = 0x00DD;

/// Status byte returned for a successful command.
const COMMAND_SUCCESS: u8 = 0x00;
/// Largest transfer the bridge accepts in one command.
const MAX_TRANSFER: usize = u16::MAX as usize;
/// Data bytes carried by one write report.
const WRITE_CHUNK: usize = 60;

// The host can issue commands faster than the I2C engine completes them, so busy
// responses are retried a bounded number of times.
const MAX_RETRIES: u8 = 20;
// With a Pico test target, a 2ms delay gives the shortest overall time for long
// reads (compared to 1ms and 3ms).
const RETRY_DELAY: Duration = Duration::from_millis(2);

/// An attached MCP2221 bridge.
#[derive(Debug, Clone)]
pub struct ControllerInfo {
    /// Controller id to pass in [`I2cDeviceConfig::controller_id`].
    pub id: u32,
    /// USB HID device path, also reported as the connection's device id.
    pub path: String,
    /// USB product string, if the device reports one.
    pub product: Option<String>,
    /// USB serial number, if the device reports one.
    pub serial_number: Option<String>,
}

/// Opens connections through MCP2221 bridges.
#[derive(Debug, Clone, Copy)]
pub struct Mcp2221Driver {
    vendor_id: u16,
    product_id: u16,
}

impl Default for Mcp2221Driver {
    fn default() -> Self {
        Self::new()
    }
}

impl Mcp2221Driver {
    /// Driver for bridges with the default vendor and product ID.
    ///
    /// The default VID is 1240 (0x4D8) and PID 221 (0xDD) for both the original
    /// MCP2221 and the (more common) MCP2221A.
    pub fn new() -> Self {
        Self::with_vid_and_pid(MICROCHIP_VID, MCP2221_PID)
    }

    /// Driver for bridges whose USB VID or PID has been changed.
    pub fn with_vid_and_pid(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
        }
    }

    /// List the attached bridges, in controller id order.
    ///
    /// # Errors
    ///
    /// An error will be returned if the USB HID layer cannot enumerate devices.
    pub fn controllers(&self) -> Result<Vec<ControllerInfo>, DriverError> {
        let hidapi = HidApi::new()?;
        let controllers = self
            .bridges(&hidapi)
            .into_iter()
            .zip(0..)
            .map(|(info, id)| ControllerInfo {
                id,
                path: info.path().to_string_lossy().into_owned(),
                product: info.product_string().map(str::to_owned),
                serial_number: info.serial_number().map(str::to_owned),
            })
            .collect();
        Ok(controllers)
    }

    /// Attached bridges matching our VID and PID, ordered by path.
    fn bridges<'a>(&self, hidapi: &'a HidApi) -> Vec<&'a DeviceInfo> {
        let mut bridges: Vec<&DeviceInfo> = hidapi
            .device_list()
            .filter(|d| d.vendor_id() == self.vendor_id && d.product_id() == self.product_id)
            .collect();
        bridges.sort_by(|a, b| a.path().cmp(b.path()));
        bridges.dedup_by(|a, b| a.path() == b.path());
        bridges
    }
}

impl Driver for Mcp2221Driver {
    type Connection = Mcp2221Connection;

    fn open(&self, config: &I2cDeviceConfig) -> Result<Mcp2221Connection, DriverError> {
        let address = u8::try_from(config.slave_address)
            .ok()
            .filter(|a| *a <= 0x7F)
            .ok_or(DriverError::AddressOutOfRange(config.slave_address))?;

        let hidapi = HidApi::new()?;
        let bridges = self.bridges(&hidapi);
        let info = usize::try_from(config.controller_id)
            .ok()
            .and_then(|id| bridges.get(id))
            .ok_or(DriverError::ControllerNotFound(config.controller_id))?;
        let path = info.path().to_string_lossy().into_owned();

        // Dropping the claim on any failure below releases the target again.
        let claim = Claim::acquire(&path, address, config.sharing_mode)?;
        let connection = Mcp2221Connection {
            bridge: Bridge {
                inner: info.open_device(&hidapi)?,
                path,
                address,
            },
            sharing_mode: config.sharing_mode,
            _claim: claim,
        };
        connection.bridge.set_bus_speed(config.bus_speed)?;
        debug!(
            "opened {} for address {address:#04X} at {:?}",
            connection.bridge.path, config.bus_speed
        );
        Ok(connection)
    }
}

/// Connection to one target through an MCP2221 bridge.
///
/// The C hidapi library is not thread safe and the `hidapi` types are
/// appropriately `!Sync`, so this is too.
#[derive(Debug)]
pub struct Mcp2221Connection {
    bridge: Bridge<HidDevice>,
    sharing_mode: SharingMode,
    _claim: Claim,
}

/// Raw USB HID report exchange with a bridge.
pub(crate) trait Reports {
    /// Send one report, prefixed with its report number.
    fn write(&self, report: &[u8]) -> Result<usize, HidError>;
    /// Receive one report.
    fn read(&self, buffer: &mut [u8]) -> Result<usize, HidError>;
}

impl Reports for HidDevice {
    fn write(&self, report: &[u8]) -> Result<usize, HidError> {
        HidDevice::write(self, report)
    }

    fn read(&self, buffer: &mut [u8]) -> Result<usize, HidError> {
        HidDevice::read(self, buffer)
    }
}

/// Outcome of a chunked transfer: how many bytes moved, and whether it finished.
type Progress = (usize, Result<(), DriverError>);

/// All-or-nothing view of a transfer.
fn strict((_, result): Progress) -> Result<(), DriverError> {
    result
}

/// Accept a short transfer as long as something moved.
fn partial((transferred, result): Progress) -> Result<usize, DriverError> {
    match result {
        Ok(()) => Ok(transferred),
        Err(e) if transferred == 0 => Err(e),
        Err(e) => {
            debug!("transfer stopped after {transferred} bytes: {e}");
            Ok(transferred)
        }
    }
}

/// The MCP2221 command protocol for one target address.
#[derive(Debug)]
struct Bridge<H> {
    /// Underlying report device, a [`HidDevice`] outside of tests.
    inner: H,
    path: String,
    address: u8,
}

impl<H: Reports> Bridge<H> {
    ////////////////////////////////////////////////////////////////////////////////
    // USB report exchange with the MCP2221
    ////////////////////////////////////////////////////////////////////////////////

    /// Write the given command to the MCP and read the 64-byte response.
    fn transfer(&self, command: &UsbReport) -> Result<[u8; 64], DriverError> {
        let out_command_byte = command.command_code();
        let written = self.inner.write(&command.report_bytes())?;
        let mut read_buffer = [0u8; 64];
        let read = self.inner.read(&mut read_buffer)?;
        if written != 65 || read != 64 {
            return Err(DriverError::ShortTransfer {
                expected: 64,
                actual: read.min(written),
            });
        }

        let read_command_byte = read_buffer[0];
        if read_command_byte != out_command_byte {
            return Err(DriverError::MismatchedCommandCodeEcho {
                sent: out_command_byte,
                received: read_command_byte,
            });
        }

        let status_code = read_buffer[1];
        trace!("command {out_command_byte:#04X} status {status_code:#04X}");
        if status_code == COMMAND_SUCCESS {
            Ok(read_buffer)
        } else {
            // Prefer a command-specific error, else the general one with the code.
            command
                .check_error_code(status_code)
                .and(Err(DriverError::CommandFailed(status_code)))
        }
    }

    /// Read the I2C engine status.
    ///
    /// See section 3.1.1 of the datasheet.
    fn status(&self) -> Result<I2cStatus, DriverError> {
        let buf = self.transfer(&UsbReport::new(McpCommand::StatusSetParameters))?;
        Ok(I2cStatus::from_buffer(&buf))
    }

    /// Set the speed of the I2C bus.
    ///
    /// # Errors
    ///
    /// [`DriverError::CouldNotChangeSpeed`] if an ongoing I2C transfer prevented the
    /// device from setting the bus speed.
    fn set_bus_speed(&self, speed: BusSpeed) -> Result<(), DriverError> {
        let mut uc = UsbReport::new(McpCommand::StatusSetParameters);
        // When this value is put in this field, the device will take the next command
        // field and interpret it as the system clock divider that will give the
        // I2C/SMBus communication clock.
        uc.set_data_byte(3, 0x20);
        uc.set_data_byte(4, status::clock_divider(speed));
        let read_buffer = self.transfer(&uc)?;
        match read_buffer[3] {
            0x20 => Ok(()),
            0x21 => Err(DriverError::CouldNotChangeSpeed),
            code => Err(DriverError::CommandFailed(code)),
        }
    }

    /// Cancel current I2C transfer.
    ///
    /// The cancellation is only issued if the I2C engine is busy, as issuing it to
    /// an idle engine appears to put the engine into a busy state.
    fn cancel_transfer(&self) -> Result<(), DriverError> {
        if self.status()?.is_idle() {
            return Ok(());
        }
        debug!("cancelling I2C transfer on {}", self.path);
        let mut uc = UsbReport::new(McpCommand::StatusSetParameters);
        uc.set_data_byte(2, 0x10);
        self.transfer(&uc).map(drop)
    }

    /// Cancel the I2C transfer if the target device did not acknowledge its address.
    fn bail_for_nack(&self) -> Result<(), DriverError> {
        if self.status()?.target_acknowledged_address {
            Ok(())
        } else {
            self.cancel_transfer()?;
            Err(DriverError::AddressNack)
        }
    }

    /// Cancel a transfer abandoned part-way, keeping the original error.
    fn abandon(&self, error: DriverError) -> DriverError {
        if let Err(cancel_error) = self.cancel_transfer() {
            debug!("cancel after failed transfer also failed: {cancel_error}");
        }
        error
    }

    /// Issue `command`, retrying while the I2C engine reports busy.
    fn transfer_with_retries(&self, command: &UsbReport) -> Result<[u8; 64], DriverError> {
        let mut retries = MAX_RETRIES;
        loop {
            match self.transfer(command) {
                Err(DriverError::EngineBusy) if retries > 0 => {
                    retries -= 1;
                    sleep(RETRY_DELAY);
                }
                result => return result,
            }
        }
    }

    ////////////////////////////////////////////////////////////////////////////////
    // I2C transfers
    ////////////////////////////////////////////////////////////////////////////////

    /// Read from the target into `read_buffer`.
    ///
    /// Starts the read with the command for `read_type`, then collects the data
    /// with I2C Get Data until the buffer is full or the engine fails. Responses
    /// without data count against the same retry budget as read errors, and the
    /// budget is refilled whenever data arrives.
    ///
    /// # Datasheet
    ///
    /// See section 3.1.8 (normal read), 3.1.9 (repeated start) and 3.1.10 (get data).
    fn i2c_read(&self, read_buffer: &mut [u8], read_type: ReadType) -> Progress {
        if read_buffer.is_empty() {
            return (0, Ok(()));
        }
        let Ok(tx_len) = u16::try_from(read_buffer.len()) else {
            return (0, Err(DriverError::TransferTooLong(read_buffer.len())));
        };

        let mut read_command = UsbReport::new(read_type.into());
        let [tx_len_low, tx_len_high] = tx_len.to_le_bytes();
        read_command.set_data_byte(1, tx_len_low);
        read_command.set_data_byte(2, tx_len_high);
        read_command.set_data_byte(3, self.address.into_read_address());
        if let Err(e) = self
            .transfer_with_retries(&read_command)
            .and_then(|_| self.bail_for_nack())
        {
            return (0, Err(e));
        }

        let get_command = UsbReport::new(McpCommand::I2cGetData);
        let transfer_length = read_buffer.len();
        let mut read_so_far: usize = 0;
        let mut retries = MAX_RETRIES;

        while read_so_far < transfer_length {
            let error = match self.transfer(&get_command) {
                // 127 marks an error reading the data; 0 means none is ready yet.
                Ok(buffer) if buffer[3] == 127 || buffer[3] == 0 => DriverError::EngineReadError,
                Ok(buffer) => {
                    retries = MAX_RETRIES;
                    let data_length = usize::from(buffer[3])
                        .min(transfer_length - read_so_far)
                        .min(60);
                    read_buffer[read_so_far..read_so_far + data_length]
                        .copy_from_slice(&buffer[4..4 + data_length]);
                    read_so_far += data_length;
                    continue;
                }
                Err(e) => e,
            };
            match error {
                DriverError::EngineReadError if retries > 0 => {
                    // The engine hasn't caught up with us yet.
                    retries -= 1;
                    sleep(RETRY_DELAY);
                }
                e => return (read_so_far, Err(self.abandon(e))),
            }
        }

        (read_so_far, Ok(()))
    }

    /// Write `write_buffer` to the target in 60-byte reports.
    ///
    /// The address acknowledgement is checked after the first report only; the
    /// MCP2221 will happily take writes for a missing target.
    ///
    /// # Datasheet
    ///
    /// See section 3.1.5 (normal write) and 3.1.7 (no STOP).
    fn i2c_write(&self, write_buffer: &[u8], write_type: WriteType) -> Progress {
        if write_buffer.is_empty() {
            return (0, self.probe_address());
        }
        let Ok([tx_len_low, tx_len_high]) =
            u16::try_from(write_buffer.len()).map(u16::to_le_bytes)
        else {
            return (0, Err(DriverError::TransferTooLong(write_buffer.len())));
        };

        let mut command = UsbReport::new(write_type.into());
        command.set_data_byte(1, tx_len_low);
        command.set_data_byte(2, tx_len_high);
        command.set_data_byte(3, self.address.into_write_address());

        let mut written = 0;
        for (idx, chunk) in write_buffer.chunks(WRITE_CHUNK).enumerate() {
            command.write_buffer[4..4 + chunk.len()].copy_from_slice(chunk);
            let result = self.transfer_with_retries(&command).and_then(|_| {
                if idx == 0 {
                    self.bail_for_nack()
                } else {
                    Ok(())
                }
            });
            match result {
                Ok(()) => written += chunk.len(),
                Err(DriverError::AddressNack) => return (0, Err(DriverError::AddressNack)),
                Err(e) => return (written, Err(self.abandon(e))),
            }
        }

        (written, Ok(()))
    }

    /// Check the target acknowledges its address, without writing any data.
    fn probe_address(&self) -> Result<(), DriverError> {
        let mut command = UsbReport::new(McpCommand::I2cWriteData);
        command.set_data_byte(3, self.address.into_write_address());
        self.transfer_with_retries(&command)?;
        // The write was submitted, doesn't mean the target is there.
        let acknowledged = self.status()?.target_acknowledged_address;
        // Clean up any incomplete transfer.
        self.cancel_transfer()?;
        if acknowledged {
            Ok(())
        } else {
            Err(DriverError::AddressNack)
        }
    }

    /// Write without STOP, then read with repeated-START.
    ///
    /// An empty `data` skips the write phase. The read phase only starts if the
    /// whole write phase succeeded.
    fn i2c_write_read(&self, data: &[u8], buffer: &mut [u8]) -> Progress {
        if buffer.len() > MAX_TRANSFER {
            return (0, Err(DriverError::TransferTooLong(buffer.len())));
        }
        if data.is_empty() {
            return self.i2c_read(buffer, ReadType::Normal);
        }
        if buffer.is_empty() {
            return (0, strict(self.i2c_write(data, WriteType::Normal)));
        }
        if let Err(e) = strict(self.i2c_write(data, WriteType::NoStop)) {
            return (0, Err(e));
        }
        self.i2c_read(buffer, ReadType::RepeatedStart)
    }
}

impl Connection for Mcp2221Connection {
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, DriverError> {
        partial(self.bridge.i2c_read(buffer, ReadType::Normal))
    }

    fn write(&mut self, data: &[u8]) -> Result<(), DriverError> {
        strict(self.bridge.i2c_write(data, WriteType::Normal))
    }

    fn write_partial(&mut self, data: &[u8]) -> Result<usize, DriverError> {
        partial(self.bridge.i2c_write(data, WriteType::Normal))
    }

    fn write_read(&mut self, data: &[u8], buffer: &mut [u8]) -> Result<(), DriverError> {
        strict(self.bridge.i2c_write_read(data, buffer))
    }

    fn write_read_partial(
        &mut self,
        data: &[u8],
        buffer: &mut [u8],
    ) -> Result<usize, DriverError> {
        partial(self.bridge.i2c_write_read(data, buffer))
    }

    fn device_id(&self) -> Result<String, DriverError> {
        Ok(self.bridge.path.clone())
    }

    fn slave_address(&self) -> Result<u16, DriverError> {
        Ok(self.bridge.address.into())
    }

    fn bus_speed(&self) -> Result<BusSpeed, DriverError> {
        Ok(self.bridge.status()?.bus_speed())
    }

    fn sharing_mode(&self) -> Result<SharingMode, DriverError> {
        Ok(self.sharing_mode)
    }

    fn close(self) {
        debug!(
            "closing {} address {:#04X}",
            self.bridge.path, self.bridge.address
        );
    }
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;

    /// Scripted stand-in for a bridge, answering each report as the chip would.
    #[derive(Debug, Default)]
    struct FakeHid {
        state: RefCell<FakeState>,
    }

    #[derive(Debug, Default)]
    struct FakeState {
        response: Option<[u8; 64]>,
        /// Target never acknowledges its address.
        nack: bool,
        /// Index of the write report to reject.
        fail_write: Option<usize>,
        write_reports: usize,
        /// Length byte of each Get Data response; an empty queue answers with
        /// the engine read error code.
        get_data: VecDeque<u8>,
        next_byte: u8,
        engine_busy: bool,
        cancels: usize,
    }

    impl Reports for FakeHid {
        fn write(&self, report: &[u8]) -> Result<usize, HidError> {
            let mut state = self.state.borrow_mut();
            let mut response = [0u8; 64];
            response[0] = report[1];
            match report[1] {
                0x90 | 0x94 => {
                    if state.fail_write == Some(state.write_reports) {
                        response[1] = 0x02;
                    } else {
                        state.engine_busy = true;
                    }
                    state.write_reports += 1;
                }
                0x91 | 0x93 => state.engine_busy = true,
                0x40 => match state.get_data.pop_front() {
                    Some(length) => {
                        response[3] = length;
                        if length != 127 {
                            for byte in &mut response[4..4 + usize::from(length)] {
                                *byte = state.next_byte;
                                state.next_byte = state.next_byte.wrapping_add(1);
                            }
                        }
                    }
                    None => response[1] = 0x41,
                },
                0x10 => {
                    if report[3] == 0x10 {
                        state.cancels += 1;
                        state.engine_busy = false;
                    }
                    if report[4] == 0x20 {
                        response[3] = 0x20;
                    }
                    response[8] = if state.engine_busy { 0x55 } else { 0x00 };
                    response[20] = if state.nack { 0x40 } else { 0x00 };
                }
                _ => response[1] = 0xFF,
            }
            state.response = Some(response);
            Ok(report.len())
        }

        fn read(&self, buffer: &mut [u8]) -> Result<usize, HidError> {
            match self.state.borrow_mut().response.take() {
                Some(response) => {
                    buffer[..64].copy_from_slice(&response);
                    Ok(64)
                }
                None => Ok(0),
            }
        }
    }

    fn scripted(state: FakeState) -> Bridge<FakeHid> {
        Bridge {
            inner: FakeHid {
                state: RefCell::new(state),
            },
            path: String::from("fake"),
            address: 0x26,
        }
    }

    #[test]
    fn partial_accepts_short_transfer() {
        assert_eq!(partial((5, Ok(()))).unwrap(), 5);
        assert_eq!(partial((3, Err(DriverError::EngineReadError))).unwrap(), 3);
        assert!(matches!(
            partial((0, Err(DriverError::AddressNack))),
            Err(DriverError::AddressNack)
        ));
    }

    #[test]
    fn strict_rejects_short_transfer() {
        assert!(strict((60, Err(DriverError::EngineBusy))).is_err());
        assert!(strict((60, Ok(()))).is_ok());
    }

    #[test]
    fn default_driver_uses_microchip_ids() {
        let driver = Mcp2221Driver::default();
        assert_eq!(driver.vendor_id, 0x04D8);
        assert_eq!(driver.product_id, 0x00DD);
    }

    #[test]
    fn set_bus_speed_accepted() {
        let bridge = scripted(FakeState::default());
        assert!(bridge.set_bus_speed(BusSpeed::Fast).is_ok());
    }

    #[test]
    fn write_sent_in_chunks() {
        let bridge = scripted(FakeState::default());
        let (written, result) = bridge.i2c_write(&[0xAA; 150], WriteType::Normal);
        assert!(result.is_ok());
        assert_eq!(written, 150);
        assert_eq!(bridge.inner.state.borrow().write_reports, 3);
    }

    #[test]
    fn failed_chunk_reports_bytes_already_accepted() {
        let bridge = scripted(FakeState {
            fail_write: Some(2),
            ..Default::default()
        });
        let progress = bridge.i2c_write(&[0xAA; 150], WriteType::Normal);
        assert!(matches!(
            progress,
            (120, Err(DriverError::CommandFailed(0x02)))
        ));
        assert_eq!(partial(progress).unwrap(), 120);
        assert_eq!(bridge.inner.state.borrow().cancels, 1);

        let bridge = scripted(FakeState {
            fail_write: Some(1),
            ..Default::default()
        });
        let progress = bridge.i2c_write(&[0xAA; 150], WriteType::Normal);
        assert!(strict(progress).is_err());
    }

    #[test]
    fn nack_on_first_chunk_moves_nothing() {
        let bridge = scripted(FakeState {
            nack: true,
            ..Default::default()
        });
        let progress = bridge.i2c_write(&[0xAA; 100], WriteType::Normal);
        assert!(matches!(progress, (0, Err(DriverError::AddressNack))));
        assert!(matches!(partial(progress), Err(DriverError::AddressNack)));
        let state = bridge.inner.state.borrow();
        assert_eq!(state.write_reports, 1);
        assert_eq!(state.cancels, 1);
    }

    #[test]
    fn read_collects_get_data_responses() {
        let bridge = scripted(FakeState {
            get_data: VecDeque::from([60, 40]),
            ..Default::default()
        });
        let mut buffer = [0u8; 100];
        let (read, result) = bridge.i2c_read(&mut buffer, ReadType::Normal);
        assert!(result.is_ok());
        assert_eq!(read, 100);
        assert_eq!(buffer[0], 0);
        assert_eq!(buffer[99], 99);
        assert_eq!(bridge.inner.state.borrow().cancels, 0);
    }

    #[test]
    fn repeated_read_error_marker_ends_transfer() {
        let mut get_data = VecDeque::from([30]);
        get_data.extend([127; MAX_RETRIES as usize + 1]);
        get_data.push_back(30);
        let bridge = scripted(FakeState {
            get_data,
            ..Default::default()
        });
        let mut buffer = [0u8; 60];
        let progress = bridge.i2c_read(&mut buffer, ReadType::Normal);
        assert!(matches!(progress, (30, Err(DriverError::EngineReadError))));
        let state = bridge.inner.state.borrow();
        assert_eq!(state.cancels, 1);
        // The last scripted response was never requested.
        assert_eq!(state.get_data.len(), 1);
    }

    #[test]
    fn empty_get_data_responses_end_transfer() {
        let bridge = scripted(FakeState {
            get_data: VecDeque::from([0; MAX_RETRIES as usize + 1]),
            ..Default::default()
        });
        let mut buffer = [0u8; 10];
        let progress = bridge.i2c_read(&mut buffer, ReadType::Normal);
        assert!(matches!(progress, (0, Err(DriverError::EngineReadError))));
        assert!(partial(progress).is_err());
    }

    #[test]
    fn read_error_marker_is_retried() {
        let bridge = scripted(FakeState {
            get_data: VecDeque::from([127, 0, 5]),
            ..Default::default()
        });
        let mut buffer = [0u8; 5];
        let (read, result) = bridge.i2c_read(&mut buffer, ReadType::Normal);
        assert!(result.is_ok());
        assert_eq!(read, 5);
        assert_eq!(buffer, [0, 1, 2, 3, 4]);
    }

    #[test]
    fn failed_write_phase_skips_read() {
        let bridge = scripted(FakeState {
            nack: true,
            get_data: VecDeque::from([5]),
            ..Default::default()
        });
        let mut buffer = [0u8; 5];
        let progress = bridge.i2c_write_read(&[0x89], &mut buffer);
        assert!(matches!(progress, (0, Err(DriverError::AddressNack))));
        assert_eq!(bridge.inner.state.borrow().get_data.len(), 1);
    }
}
