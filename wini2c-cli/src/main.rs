use anyhow::Context;
use clap::Parser;
use wini2c::I2cDevice;
use wini2c::mcp2221::Mcp2221Driver;

use cli::Commands;

mod cli;
mod i2c;
mod util;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = cli::Cli::parse();
    let driver = Mcp2221Driver::with_vid_and_pid(cli.vid, cli.pid);
    match cli.command {
        Commands::List => {
            for controller in driver.controllers()? {
                println!(
                    "{}: {} ({}, serial {})",
                    controller.id,
                    controller.path,
                    controller.product.as_deref().unwrap_or("unknown product"),
                    controller.serial_number.as_deref().unwrap_or("unknown"),
                );
            }
        }
        Commands::Device { target, command } => {
            let config = target.config();
            log::debug!("{config:?}");
            let mut device = I2cDevice::open_with(&driver, config).with_context(|| {
                format!(
                    "opening address {:#04X} on controller {}",
                    config.slave_address, config.controller_id
                )
            })?;
            i2c::action(&mut device, command)?;
        }
    }
    Ok(())
}
