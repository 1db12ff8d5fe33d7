use anyhow::{Context, Result};
use spacelink_core::crc::crc16;

/// Print and return the CRC16 of the hex-encoded bytes
pub fn execute(input: &str) -> Result<u16> {
    let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    let data = hex::decode(&cleaned).with_context(|| format!("Invalid hex input: {}", input))?;

    let crc = crc16(&data);
    println!("CRC16 over {} bytes: {:#06X}", data.len(), crc);

    Ok(crc)
}
