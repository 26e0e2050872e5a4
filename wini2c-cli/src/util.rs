/// Strip an optional `0x` prefix from a hexadecimal string.
fn strip_hex_prefix(value: &str) -> &str {
    if value.to_ascii_lowercase().starts_with("0x") {
        &value[2..]
    } else {
        value
    }
}

pub(crate) fn u16_from_hex(value: &str) -> Result<u16, std::num::ParseIntError> {
    u16::from_str_radix(strip_hex_prefix(value), 16)
}

pub(crate) fn u8_from_hex(value: &str) -> Result<u8, std::num::ParseIntError> {
    u8::from_str_radix(strip_hex_prefix(value), 16)
}

/// Format bytes as space-separated two-digit hex.
pub(crate) fn hex_bytes(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}
