use crate::i2c::{BusSpeed, I2cCommand, SharingMode};
use crate::util;

use clap::Parser;

/// Read and write an I2C device through an MCP2221 USB to I2C bridge
///
/// Each attached MCP2221 is one I2C controller, numbered from 0 in the order
/// shown by the list command. Only 7-bit addresses are supported, and a single
/// transfer can be at most 65,535 bytes.
///
/// Transfers are strict by default: every byte must move or the command fails.
/// Pass --partial to accept a short transfer instead.
#[derive(Debug, Parser)]
#[command(version, about)]
pub(crate) struct Cli {
    /// Device vendor ID in hexadecimal
    #[arg(short, long = "vid", default_value = "0x4D8", value_parser = util::u16_from_hex, env = "WINI2C_VID")]
    pub(crate) vid: u16,
    /// Device product ID in hexadecimal
    #[arg(short, long = "pid", default_value = "0xDD", value_parser = util::u16_from_hex, env = "WINI2C_PID")]
    pub(crate) pid: u16,
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Debug, Parser)]
pub(crate) enum Commands {
    /// List attached MCP2221 controllers
    List,
    /// Perform I2C transfers with one device
    Device {
        #[command(flatten)]
        target: Target,
        #[command(subcommand)]
        command: I2cCommand,
    },
}

/// Which device to open, and how.
#[derive(Debug, clap::Args)]
pub(crate) struct Target {
    /// Controller id
    #[arg(short, long, default_value_t = 0, env = "WINI2C_CONTROLLER")]
    pub(crate) controller: u32,
    /// 7-bit device address in hexadecimal
    #[arg(short, long, value_parser = util::u16_from_hex)]
    pub(crate) address: u16,
    /// Bus clock speed
    #[arg(long, value_enum, default_value_t)]
    pub(crate) bus_speed: BusSpeed,
    /// Whether other connections to the device are allowed
    #[arg(long, value_enum, default_value_t)]
    pub(crate) sharing_mode: SharingMode,
}

impl Target {
    pub(crate) fn config(&self) -> wini2c::I2cDeviceConfig {
        wini2c::I2cDeviceConfig::new(self.controller, self.address)
            .with_bus_speed(self.bus_speed.into())
            .with_sharing_mode(self.sharing_mode.into())
    }
}
