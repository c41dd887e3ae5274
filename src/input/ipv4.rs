//! Dotted-quad <-> integer conversion for IPv4 addresses
//!
//! Addresses are packed most-significant octet first, so `1.2.3.4`
//! becomes `0x01020304`.

use super::ExtractError;

/// Convert a dotted-quad IPv4 address into its 32-bit integer form
///
/// Each of the four octets must be a decimal number in `[0, 255]`.
pub fn ip_to_int(ip_address: &str) -> Result<u32, ExtractError> {
    let mut value: u32 = 0;
    let mut octets = 0;

    for part in ip_address.split('.') {
        octets += 1;
        if octets > 4 {
            return Err(ExtractError::InvalidOctet(ip_address.to_string()));
        }
        value = value * 256 + parse_octet(part, ip_address)?;
    }

    if octets != 4 {
        return Err(ExtractError::InvalidOctet(ip_address.to_string()));
    }

    Ok(value)
}

/// Convert a 32-bit integer back into dotted-quad notation
///
/// Exact inverse of [`ip_to_int`] for every `u32`.
pub fn int_to_ip(value: u32) -> String {
    let first = (value / (256 * 256 * 256)) % 256;
    let second = (value / (256 * 256)) % 256;
    let third = (value / 256) % 256;
    let fourth = value % 256;

    format!("{}.{}.{}.{}", first, second, third, fourth)
}

fn parse_octet(part: &str, ip_address: &str) -> Result<u32, ExtractError> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ExtractError::InvalidOctet(ip_address.to_string()));
    }

    match part.parse::<u32>() {
        Ok(octet) if octet <= 255 => Ok(octet),
        _ => Err(ExtractError::InvalidOctet(ip_address.to_string())),
    }
}
