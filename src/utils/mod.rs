pub mod bitmap;
pub mod color;

/// Reads a NUL-terminated ASCII name out of a fixed-size slot.
pub(crate) fn name_ascii(raw: &[u8]) -> &str {
    let null_pos = raw.iter().position(|&c| c == 0).unwrap_or(raw.len());
    std::str::from_utf8(&raw[..null_pos]).unwrap_or("")
}
