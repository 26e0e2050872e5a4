//! I2C engine status read from the MCP2221.

use bit_field::BitField;

use crate::config::BusSpeed;

/// 12 MHz internal clock.
const MCP_CLOCK: u32 = 12_000_000;

/// Clock divider for the given bus speed.
///
/// The `-2` part is from Note 1 in Table 3-1 in the datasheet.
pub(crate) fn clock_divider(speed: BusSpeed) -> u8 {
    (MCP_CLOCK / speed.frequency() - 2) as u8
}

/// Bus speed nearest to the rate set by the given clock divider.
pub(crate) fn speed_from_divider(divider: u8) -> BusSpeed {
    let midpoint =
        (u16::from(clock_divider(BusSpeed::Standard)) + u16::from(clock_divider(BusSpeed::Fast)))
            / 2;
    if u16::from(divider) <= midpoint {
        BusSpeed::Fast
    } else {
        BusSpeed::Standard
    }
}

/// I2C portion of the Status/Set Parameters response.
///
/// Bytes are numbered from 0 through 63 and correspond to table 3-2 in section
/// 3.1.1 of the datasheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct I2cStatus {
    /// Internal I2C state machine value (byte 8). Zero when idle.
    pub(crate) communication_state: u8,
    /// Length of the transfer requested (bytes 9 & 10).
    pub(crate) transfer_requested_length: u16,
    /// Number of bytes already transferred (bytes 11 & 12).
    pub(crate) transfer_completed_length: u16,
    /// Current clock divider (byte 14).
    pub(crate) clock_divider: u8,
    /// Whether the target acknowledged its address (byte 20, bit 6, inverted).
    pub(crate) target_acknowledged_address: bool,
}

impl I2cStatus {
    pub(crate) fn from_buffer(buf: &[u8; 64]) -> Self {
        Self {
            communication_state: buf[8],
            transfer_requested_length: u16::from_le_bytes([buf[9], buf[10]]),
            transfer_completed_length: u16::from_le_bytes([buf[11], buf[12]]),
            clock_divider: buf[14],
            // Note that this is being inverted: 0 means ACK received.
            target_acknowledged_address: !buf[20].get_bit(6),
        }
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.communication_state == 0x00
    }

    pub(crate) fn bus_speed(&self) -> BusSpeed {
        speed_from_divider(self.clock_divider)
    }
}
