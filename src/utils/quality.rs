use image::{ImageBuffer, Pixel};

use crate::dct::PixelPlane;
use crate::error::{Result, WatermarkError};
use crate::utils::convert::{Channel, extract_channel};

const MAX_INTENSITY: f64 = 255.0;

fn dims(plane: &PixelPlane) -> (u32, u32) {
    let (rows, cols) = plane.dim();
    (cols as u32, rows as u32)
}

/// Peak signal-to-noise ratio in decibels between two planes of equal shape.
///
/// Identical (or empty) planes give `f64::INFINITY`.
pub fn psnr(original: &PixelPlane, modified: &PixelPlane) -> Result<f64> {
    if original.dim() != modified.dim() {
        return Err(WatermarkError::DimensionMismatch {
            source_dims: dims(original),
            target_dims: dims(modified),
        });
    }
    if original.is_empty() {
        return Ok(f64::INFINITY);
    }

    let squared_error: f64 = original
        .iter()
        .zip(modified.iter())
        .map(|(a, b)| {
            let diff = f64::from(*a) - f64::from(*b);
            diff * diff
        })
        .sum();
    let mse = squared_error / original.len() as f64;

    if mse == 0.0 {
        return Ok(f64::INFINITY);
    }
    Ok(10.0 * (MAX_INTENSITY * MAX_INTENSITY / mse).log10())
}

/// PSNR of one color component of two images.
pub fn channel_psnr<P>(
    original: &ImageBuffer<P, Vec<u8>>,
    modified: &ImageBuffer<P, Vec<u8>>,
    channel: Channel,
) -> Result<f64>
where
    P: Pixel<Subpixel = u8>,
{
    psnr(
        &extract_channel(original, channel)?,
        &extract_channel(modified, channel)?,
    )
}
