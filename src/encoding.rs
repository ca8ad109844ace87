use super::*;

/// Bitcoin CompactSize: one byte below 0xFD, otherwise a marker byte followed
/// by the value in 2, 4, or 8 little-endian bytes.
pub(crate) fn var_uint(n: u64) -> Vec<u8> {
    match n {
        0..=0xFC => vec![n as u8],
        0xFD..=0xFFFF => {
            let mut v = vec![0xFD];
            v.extend_from_slice(&(n as u16).to_le_bytes());
            v
        }
        0x1_0000..=0xFFFF_FFFF => {
            let mut v = vec![0xFE];
            v.extend_from_slice(&(n as u32).to_le_bytes());
            v
        }
        _ => {
            let mut v = vec![0xFF];
            v.extend_from_slice(&n.to_le_bytes());
            v
        }
    }
}

/// `varint(len(bytes)) ‖ bytes`
pub(crate) fn bytes_with_length_header(bytes: &[u8]) -> Vec<u8> {
    let mut v = var_uint(bytes.len() as u64);
    v.extend_from_slice(bytes);
    v
}

/// Reverse the byte order of a hex string.
pub(crate) fn reverse_hex_bytes(hex_str: &str) -> Result<String> {
    let mut bytes = hex::decode(hex_str).context("invalid hex")?;
    bytes.reverse();
    Ok(hex::encode(bytes))
}

/// Reverse each 4-byte word internally, preserving word order. This is the
/// transformation the Stratum wire applies to the previous block hash.
pub(crate) fn reverse_hex_4bytes(hex_str: &str) -> Result<String> {
    let bytes = hex::decode(hex_str).context("invalid hex")?;
    ensure!(
        bytes.len() % 4 == 0,
        "hex length {} is not a multiple of 4 bytes",
        bytes.len()
    );

    let mut swapped = Vec::with_capacity(bytes.len());
    for word in bytes.chunks_exact(4) {
        swapped.extend(word.iter().rev());
    }

    Ok(hex::encode(swapped))
}
