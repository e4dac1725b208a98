//! Length header stored in the reserved bytes of an encoded BMP container.
//!
//! Offset 6 of a BMP file starts two reserved 16-bit fields that decoders ignore. The
//! embedded message length is written there as a little-endian `u32`. These functions work on
//! the final encoded bytes, so they must run after the image has been written out.

use crate::error::{Result, WatermarkError};

/// Byte offset of the length field from the start of the file.
pub const LENGTH_OFFSET: usize = 6;
/// Size of the length field in bytes.
pub const LENGTH_SIZE: usize = 4;

fn field_end(file_bytes: &[u8]) -> Result<usize> {
    let end = LENGTH_OFFSET + LENGTH_SIZE;
    if file_bytes.len() < end {
        return Err(WatermarkError::HeaderTooShort(file_bytes.len()));
    }
    Ok(end)
}

/// Writes `length` into the reserved header field and returns the patched buffer.
pub fn embed_length(mut file_bytes: Vec<u8>, length: u32) -> Result<Vec<u8>> {
    let end = field_end(&file_bytes)?;
    file_bytes[LENGTH_OFFSET..end].copy_from_slice(&length.to_le_bytes());
    Ok(file_bytes)
}

/// True unless the reserved header field is all zero. Buffers too short to hold it count as unmarked.
pub fn detect_embedding(file_bytes: &[u8]) -> bool {
    file_bytes
        .get(LENGTH_OFFSET..LENGTH_OFFSET + LENGTH_SIZE)
        .is_some_and(|field| field.iter().any(|b| *b != 0))
}

/// Reads the reserved header field as a little-endian `u32`.
pub fn extract_length(file_bytes: &[u8]) -> Result<u32> {
    let end = field_end(file_bytes)?;
    let mut field = [0u8; LENGTH_SIZE];
    field.copy_from_slice(&file_bytes[LENGTH_OFFSET..end]);
    Ok(u32::from_le_bytes(field))
}
