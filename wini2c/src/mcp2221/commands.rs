use crate::error::DriverError;

/// The subset of MCP2221 HID commands used for I2C transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum McpCommand {
    /// Poll for the status of the device, cancel an I2C transfer,
    /// or set the I2C bus speed.
    ///
    /// See section 3.1.1.
    StatusSetParameters,
    /// Request a read from an I2C target.
    ///
    /// The read data is not returned in response to this command, but to the
    /// Get Data command.
    I2cReadData,
    /// Request a read from an I2C target with a repeated START condition.
    I2cReadDataRepeatedStart,
    /// Read requested I2C data back from the MCP2221.
    ///
    /// See section 3.1.10 of the datasheet.
    I2cGetData,
    /// Write data to an I2C target.
    ///
    /// See section 3.1.5 of the datasheet.
    I2cWriteData,
    /// Write data to an I2C target without a STOP condition.
    ///
    /// See section 3.1.7 of the datasheet.
    I2cWriteDataNoStop,
}

impl McpCommand {
    /// Command code written to byte 0 of the outgoing buffer.
    fn code(self) -> u8 {
        match self {
            McpCommand::StatusSetParameters => 0x10,
            McpCommand::I2cReadData => 0x91,
            McpCommand::I2cReadDataRepeatedStart => 0x93,
            McpCommand::I2cGetData => 0x40,
            McpCommand::I2cWriteData => 0x90,
            McpCommand::I2cWriteDataNoStop => 0x94,
        }
    }

    /// Check error code for command-specific errors.
    ///
    /// The I2cEngineBusy error codes are particular important as they signal
    /// that we should attempt a command again.
    fn check_error_code(self, code: u8) -> Result<(), DriverError> {
        match (code, self) {
            (
                0x01,
                Self::I2cWriteData
                | Self::I2cWriteDataNoStop
                | Self::I2cReadData
                | Self::I2cReadDataRepeatedStart,
            ) => Err(DriverError::EngineBusy),
            (0x41, Self::I2cGetData) => Err(DriverError::EngineReadError),
            (_, _) => Ok(()),
        }
    }
}

/// Which read command to issue.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ReadType {
    /// START, address, data, STOP.
    Normal,
    /// Repeated-START after a write with no STOP.
    RepeatedStart,
}

impl From<ReadType> for McpCommand {
    fn from(value: ReadType) -> Self {
        match value {
            ReadType::Normal => McpCommand::I2cReadData,
            ReadType::RepeatedStart => McpCommand::I2cReadDataRepeatedStart,
        }
    }
}

/// Which write command to issue.
#[derive(Debug, Clone, Copy)]
pub(crate) enum WriteType {
    /// START, address, data, STOP.
    Normal,
    /// START, address, data, and no STOP, ahead of a repeated-START read.
    NoStop,
}

impl From<WriteType> for McpCommand {
    fn from(value: WriteType) -> Self {
        match value {
            WriteType::Normal => McpCommand::I2cWriteData,
            WriteType::NoStop => McpCommand::I2cWriteDataNoStop,
        }
    }
}

/// Conversion of a 7-bit address into the 8-bit form placed on the bus.
pub(crate) trait I2cAddressing {
    /// Shift the address left and set the R/W bit for a read.
    fn into_read_address(self) -> u8;
    /// Shift the address left and clear the R/W bit for a write.
    fn into_write_address(self) -> u8;
}

impl I2cAddressing for u8 {
    fn into_read_address(self) -> u8 {
        (self << 1) | 1
    }

    fn into_write_address(self) -> u8 {
        self << 1
    }
}

pub(crate) struct UsbReport {
    /// Underlying HID command.
    command: McpCommand,
    /// Outgoing buffer sized to match those in the datasheet.
    ///
    /// The actual outgoing buffer will be 65 bytes, as the HidApi crate requires
    /// the USB HID report number to be prepended to the data bytes.
    pub(crate) write_buffer: [u8; 64],
}

impl UsbReport {
    pub(crate) fn new(command: McpCommand) -> Self {
        let mut buf = [0u8; 64];
        buf[0] = command.code();
        Self {
            command,
            write_buffer: buf,
        }
    }

    pub(crate) fn command_code(&self) -> u8 {
        self.write_buffer[0]
    }

    pub(crate) fn report_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[1..65].copy_from_slice(&self.write_buffer);
        out
    }

    /// Check for a command-specific error.
    pub(crate) fn check_error_code(&self, code: u8) -> Result<(), DriverError> {
        self.command.check_error_code(code)
    }

    /// Write a single data byte in the outgoing USB report.
    ///
    /// Command at index 0 cannot be overwritten with this method.
    pub(crate) fn set_data_byte(&mut self, byte_index: usize, value: u8) {
        assert!(byte_index < 64, "Byte index {byte_index} too large.");
        assert!(byte_index != 0, "Cannot write to command byte index.");
        self.write_buffer[byte_index] = value;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn report_is_prefixed_with_report_number() {
        let mut report = UsbReport::new(McpCommand::I2cWriteDataNoStop);
        report.set_data_byte(3, 0x26u8.into_write_address());
        let bytes = report.report_bytes();
        assert_eq!(bytes[0], 0x00);
        assert_eq!(bytes[1], 0x94);
        assert_eq!(bytes[4], 0x4C);
        assert_eq!(report.command_code(), 0x94);
    }

    #[test]
    fn read_address_sets_rw_bit() {
        assert_eq!(0x26u8.into_read_address(), 0x4D);
        assert_eq!(0x7Fu8.into_write_address(), 0xFE);
    }

    #[test]
    fn busy_codes_are_command_specific() {
        let write = UsbReport::new(WriteType::Normal.into());
        assert!(matches!(
            write.check_error_code(0x01),
            Err(DriverError::EngineBusy)
        ));
        let get = UsbReport::new(McpCommand::I2cGetData);
        assert!(matches!(
            get.check_error_code(0x41),
            Err(DriverError::EngineReadError)
        ));
        assert!(get.check_error_code(0x01).is_ok());
    }

    #[test]
    #[should_panic(expected = "Cannot write to command byte index.")]
    fn command_byte_is_protected() {
        UsbReport::new(McpCommand::StatusSetParameters).set_data_byte(0, 0xFF);
    }
}
