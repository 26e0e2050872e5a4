use anyhow::Context;
use clap::Parser;
use wini2c::I2cDevice;

use crate::util::{self, hex_bytes};

#[derive(Debug, Parser)]
#[command(flatten_help = true)]
pub(crate) enum I2cCommand {
    /// Read bytes from the device
    Read {
        /// Number of bytes to read
        #[arg(default_value_t = 1)]
        count: usize,
        /// Accept fewer bytes than requested
        #[arg(long)]
        partial: bool,
    },
    /// Write bytes to the device
    Write {
        /// Bytes to write, in hexadecimal
        #[arg(required = true, value_parser = util::u8_from_hex)]
        data: Vec<u8>,
        /// Accept a short write and print how many bytes were written
        #[arg(long)]
        partial: bool,
    },
    /// Write bytes, then read from the device without a Stop in between
    WriteRead {
        /// Bytes to write, in hexadecimal
        #[arg(required = true, value_parser = util::u8_from_hex)]
        data: Vec<u8>,
        /// Number of bytes to read
        #[arg(short, long, default_value_t = 1)]
        count: usize,
        /// Accept fewer bytes than requested
        #[arg(long)]
        partial: bool,
    },
    /// Print the device id, address, bus speed and sharing mode
    Info,
}

/// Bus speed as accepted on the command line.
#[derive(Debug, Default, Clone, Copy, clap::ValueEnum)]
pub(crate) enum BusSpeed {
    /// 100kbps "standard" mode
    #[default]
    Standard,
    /// 400kbps "fast" mode
    Fast,
}

impl From<BusSpeed> for wini2c::BusSpeed {
    fn from(value: BusSpeed) -> wini2c::BusSpeed {
        match value {
            BusSpeed::Standard => wini2c::BusSpeed::Standard,
            BusSpeed::Fast => wini2c::BusSpeed::Fast,
        }
    }
}

/// Sharing mode as accepted on the command line.
#[derive(Debug, Default, Clone, Copy, clap::ValueEnum)]
pub(crate) enum SharingMode {
    /// Sole owner of the device
    #[default]
    Exclusive,
    /// Other shared connections allowed
    Shared,
}

impl From<SharingMode> for wini2c::SharingMode {
    fn from(value: SharingMode) -> wini2c::SharingMode {
        match value {
            SharingMode::Exclusive => wini2c::SharingMode::Exclusive,
            SharingMode::Shared => wini2c::SharingMode::Shared,
        }
    }
}

pub(crate) fn action(device: &mut I2cDevice, command: I2cCommand) -> anyhow::Result<()> {
    match command {
        I2cCommand::Read { count, partial } => {
            let data = if partial {
                device.read_partial(count)
            } else {
                device.read(count)
            }
            .with_context(|| format!("reading {count} bytes"))?;
            println!("{}", hex_bytes(&data));
        }
        I2cCommand::Write {
            data,
            partial: false,
        } => {
            device
                .write(&data)
                .with_context(|| format!("writing {} bytes", data.len()))?;
        }
        I2cCommand::Write {
            data,
            partial: true,
        } => {
            let written = device
                .write_partial(&data)
                .with_context(|| format!("writing {} bytes", data.len()))?;
            println!("{written}");
        }
        I2cCommand::WriteRead {
            data,
            count,
            partial,
        } => {
            let read = if partial {
                device.write_read_partial(&data, count)
            } else {
                device.write_read(&data, count)
            }
            .with_context(|| format!("writing {} bytes then reading {count}", data.len()))?;
            println!("{}", hex_bytes(&read));
        }
        I2cCommand::Info => {
            println!("Device id:     {}", device.device_id()?);
            println!("Slave address: {:#04X}", device.slave_address()?);
            println!("Bus speed:     {:?}", device.bus_speed()?);
            println!("Sharing mode:  {:?}", device.sharing_mode()?);
        }
    }
    Ok(())
}
