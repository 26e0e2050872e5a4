//! Read temperature, humidity and serial number from an SHT4x sensor.
//!
//! The [SHT40, SHT41, SHT43 and SHT45][sht] are temperature and humidity sensors made
//! by Sensirion that share an I2C interface. You may wish to read this example
//! alongside section 4 of the SHT4x datasheet.
//!
//! [sht]: https://sensirion.com/products/catalog/SHT40
use std::time::Duration;

/// Most SHT4x parts have the same 0x44 address.
const ADDRESS: u16 = 0x44;

/// SHT4x command code for a high precision (high repeatability) reading.
const HIGH_PRECISION_READING: u8 = 0xFD;

/// SHT4x command code for reading the sensor serial number.
const SERIAL_NUMBER: u8 = 0x89;

fn main() -> Result<(), wini2c::Error> {
    // First attached MCP2221, standard speed, exclusive.
    let mut sensor = wini2c::device(0, ADDRESS)?;

    sensor.write(&[HIGH_PRECISION_READING])?;

    // The SHT4x becomes unresponsive during readings, which would show up as an
    // address NACK if we read straight away.
    std::thread::sleep(Duration::from_millis(10));

    // Six bytes: u16 temperature, CRC, u16 humidity, CRC. Both MSB first.
    let reading = sensor.read(6)?;
    let temp_reading = u16::from_be_bytes([reading[0], reading[1]]);
    let humidity_reading = u16::from_be_bytes([reading[3], reading[4]]);

    // The serial number is fetched with a write-read (no STOP between the two
    // phases), with the same [d, d, CRC, d, d, CRC] layout.
    let serial = sensor.write_read(&[SERIAL_NUMBER], 6)?;
    let serial = u32::from_be_bytes([serial[0], serial[1], serial[3], serial[4]]);

    println!(
        "Sensor {serial} on {}:    {:.2}°C    {:.2}% humidity",
        sensor.device_id()?,
        celsius_from_reading(temp_reading),
        humidity_from_reading(humidity_reading)
    );

    Ok(())
}

/// Convert an SHT4x temperature reading to Celsius (section 4.6 of the datasheet).
fn celsius_from_reading(reading: u16) -> f32 {
    let reading = f32::from(reading);
    -45.0 + 175.0 * (reading / 65_535.0)
}

/// Convert an SHT4x humidity reading to % relative humidity (%RH).
fn humidity_from_reading(reading: u16) -> f32 {
    let reading = f32::from(reading);
    -6.0 + 125.0 * (reading / 65_535.0)
}
