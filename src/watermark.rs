//! Embedding and extraction of a bit message in the block DCT of one color channel.
//!
//! One bit goes into each 8x8 block, visited in raster order. The carrier is the block's
//! largest-magnitude AC coefficient: bit 0 adds `alpha` to it, bit 1 subtracts `alpha`.
//!
//! Two extractors are provided:
//! - [`extract_self_contained`] reads a single image, decoding each block from the sign of its
//!   own largest AC coefficient. The message length comes from the container header.
//! - [`extract_differential`] compares the coefficients of the original image against a
//!   watermarked copy, at the position the embedder chose from the original.

use image::{DynamicImage, ImageBuffer, Pixel};
use log::{debug, warn};
use std::cmp::Ordering;

use crate::config::validate_alpha;
use crate::dct::{BLOCK_SIZE, BlockTransform, PixelPlane, block_grid, raster_blocks};
use crate::error::{Result, WatermarkError};
use crate::message::Message;
use crate::selector::{coefficient_at, coefficient_at_mut, select_max_ac};
use crate::utils::convert::{Channel, extract_channel, merge_channel};

/// Upper bound on decoded bits in [`MessageLength::Forced`] mode.
pub const FORCED_LENGTH_CAP: usize = u32::MAX as usize;

/// How many bits the differential extractor should decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLength {
    /// Stop after this many bits.
    Known(usize),
    /// Keep decoding until the blocks run out, up to [`FORCED_LENGTH_CAP`].
    Forced,
}

impl MessageLength {
    fn limit(self) -> usize {
        match self {
            MessageLength::Known(len) => len,
            MessageLength::Forced => FORCED_LENGTH_CAP,
        }
    }
}

/// Result of an embedding: the watermarked image and how many bits it carries.
///
/// `bits_embedded` is smaller than the message length when the image ran out of blocks.
#[derive(Debug, Clone)]
pub struct Embedded<I> {
    pub image: I,
    pub bits_embedded: usize,
}

fn warn_on_trailing_pixels(plane: &PixelPlane) {
    let (height, width) = plane.dim();
    if width % BLOCK_SIZE != 0 || height % BLOCK_SIZE != 0 {
        warn!(
            "{width}x{height} is not a multiple of the block size, trailing pixels are ignored"
        );
    }
}

/// Hides `message` in the `channel` plane of `image`, one bit per block.
///
/// # Arguments
/// * `image` - An 8-bit RGB or RGBA image, left untouched
/// * `message` - The bits to embed
/// * `alpha` - Embedding strength, the amount added to or subtracted from each carrier coefficient
/// * `channel` - The color component to modify
///
/// # Returns
/// * `Ok(Embedded)` with a new image whose other channels (and alpha) equal the input
/// * `Err(WatermarkError)` for an invalid alpha or a pixel layout without three color channels
pub fn embed<P>(
    image: &ImageBuffer<P, Vec<u8>>,
    message: &Message,
    alpha: f64,
    channel: Channel,
) -> Result<Embedded<ImageBuffer<P, Vec<u8>>>>
where
    P: Pixel<Subpixel = u8>,
{
    validate_alpha(alpha)?;
    let plane = extract_channel(image, channel)?;
    warn_on_trailing_pixels(&plane);

    let transform = BlockTransform::new();
    let mut coeffs = transform.transform(&plane);
    let (blocks_x, blocks_y) = block_grid(plane.ncols(), plane.nrows());

    let mut bits_embedded = 0;
    for (block_coords, &bit) in raster_blocks(blocks_x, blocks_y).zip(message.bits()) {
        let position = select_max_ac(&coeffs, block_coords)?;
        let coeff = coefficient_at_mut(&mut coeffs, block_coords, position)?;
        if bit == 0 {
            *coeff += alpha;
        } else {
            *coeff -= alpha;
        }
        bits_embedded += 1;
    }

    if bits_embedded < message.len() {
        warn!(
            "Image capacity is {} bits, only the first {bits_embedded} of {} were embedded",
            blocks_x * blocks_y,
            message.len()
        );
    }
    debug!("Embedded {bits_embedded} bits into the {channel} channel with alpha {alpha}");

    let reconstructed = transform.inverse_transform(&coeffs);
    let image = merge_channel(image, &reconstructed, channel)?;

    Ok(Embedded {
        image,
        bits_embedded,
    })
}

/// [`embed`] for a decoded image of any format.
///
/// RGB8 and RGBA8 images keep their layout; anything else is converted to RGBA8 first.
pub fn embed_dynamic(
    image: &DynamicImage,
    message: &Message,
    alpha: f64,
    channel: Channel,
) -> Result<Embedded<DynamicImage>> {
    let (image, bits_embedded) = match image {
        DynamicImage::ImageRgb8(buffer) => {
            let embedded = embed(buffer, message, alpha, channel)?;
            (DynamicImage::ImageRgb8(embedded.image), embedded.bits_embedded)
        }
        DynamicImage::ImageRgba8(buffer) => {
            let embedded = embed(buffer, message, alpha, channel)?;
            (DynamicImage::ImageRgba8(embedded.image), embedded.bits_embedded)
        }
        other => {
            let embedded = embed(&other.to_rgba8(), message, alpha, channel)?;
            (DynamicImage::ImageRgba8(embedded.image), embedded.bits_embedded)
        }
    };

    Ok(Embedded {
        image,
        bits_embedded,
    })
}

/// Decodes up to `message_len` bits from a single watermarked image.
///
/// For each block in raster order the largest AC coefficient of this image is located; a
/// negative value reads as 1, anything else as 0. The result is capped at the image capacity.
pub fn extract_self_contained<P>(
    image: &ImageBuffer<P, Vec<u8>>,
    message_len: usize,
    channel: Channel,
) -> Result<Message>
where
    P: Pixel<Subpixel = u8>,
{
    let plane = extract_channel(image, channel)?;
    let coeffs = BlockTransform::new().transform(&plane);
    let (blocks_x, blocks_y) = block_grid(plane.ncols(), plane.nrows());

    let wanted = message_len.min(blocks_x * blocks_y);
    if wanted < message_len {
        warn!("Requested {message_len} bits but the image only holds {wanted}");
    }

    let mut bits = Vec::with_capacity(wanted);
    for block_coords in raster_blocks(blocks_x, blocks_y).take(wanted) {
        let position = select_max_ac(&coeffs, block_coords)?;
        let value = coefficient_at(&coeffs, block_coords, position)?;
        bits.push(u8::from(value < 0.0));
    }

    debug!("Decoded {} bits from a single image", bits.len());
    Ok(Message::from_decoded(bits))
}

/// Decodes a message by comparing `target` against the unmodified `source`.
///
/// The carrier position of each block is chosen from the source coefficients. A source value
/// above the target's decodes to 1, below to 0. Equal values mean the block is unmarked and
/// yield no bit.
///
/// # Returns
/// * `Ok(Message)` with at most `length` bits; `Known(0)` yields an empty message
/// * `Err(WatermarkError::DimensionMismatch)` if the images differ in size
/// * `Err(WatermarkError::IdenticalCoefficients)` if bits were requested but none decoded
pub fn extract_differential<P>(
    source: &ImageBuffer<P, Vec<u8>>,
    target: &ImageBuffer<P, Vec<u8>>,
    length: MessageLength,
    channel: Channel,
) -> Result<Message>
where
    P: Pixel<Subpixel = u8>,
{
    if source.dimensions() != target.dimensions() {
        return Err(WatermarkError::DimensionMismatch {
            source_dims: source.dimensions(),
            target_dims: target.dimensions(),
        });
    }

    let limit = length.limit();
    if limit == 0 {
        return Ok(Message::default());
    }

    let transform = BlockTransform::new();
    let source_plane = extract_channel(source, channel)?;
    let source_coeffs = transform.transform(&source_plane);
    let target_coeffs = transform.transform(&extract_channel(target, channel)?);
    let (blocks_x, blocks_y) = block_grid(source_plane.ncols(), source_plane.nrows());

    let mut bits = match length {
        MessageLength::Known(len) => Vec::with_capacity(len.min(blocks_x * blocks_y)),
        MessageLength::Forced => Vec::new(),
    };

    for block_coords in raster_blocks(blocks_x, blocks_y) {
        if bits.len() >= limit {
            break;
        }
        let position = select_max_ac(&source_coeffs, block_coords)?;
        let original = coefficient_at(&source_coeffs, block_coords, position)?;
        let marked = coefficient_at(&target_coeffs, block_coords, position)?;

        match original.partial_cmp(&marked) {
            Some(Ordering::Greater) => bits.push(1),
            Some(Ordering::Less) => bits.push(0),
            _ => {}
        }
    }

    if bits.is_empty() {
        return Err(WatermarkError::IdenticalCoefficients);
    }

    debug!("Decoded {} bits by comparison with the source", bits.len());
    Ok(Message::from_decoded(bits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Rgb, RgbImage, Rgba, RgbaImage};

    // Gradient whose blue values stay well inside 0..=255 after embedding with alpha 10.
    fn create_gradient_rgb_image(width: u32, height: u32) -> RgbImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            let b = 60 + ((x * 3 + y * 5) % 120) as u8;
            Rgb([(x % 256) as u8, (y % 256) as u8, b])
        })
    }

    fn create_flat_rgb_image(width: u32, height: u32, value: u8) -> RgbImage {
        ImageBuffer::from_pixel(width, height, Rgb([value, value, value]))
    }

    #[test]
    fn test_single_gray_block_scenario() {
        let image = create_flat_rgb_image(8, 8, 128);
        let message = Message::from_bits(vec![1]).unwrap();

        let embedded = embed(&image, &message, 0.5, Channel::Blue).unwrap();
        assert_eq!(embedded.bits_embedded, 1);

        let extracted =
            extract_differential(&image, &embedded.image, MessageLength::Known(1), Channel::Blue)
                .unwrap();
        assert_eq!(extracted.bits(), &[1]);
    }

    #[test]
    fn test_differential_roundtrip() {
        let image = create_gradient_rgb_image(64, 64);
        let message = Message::random_seeded(64, 3);

        let embedded = embed(&image, &message, 10.0, Channel::Blue).unwrap();
        assert_eq!(embedded.bits_embedded, 64);

        let extracted = extract_differential(
            &image,
            &embedded.image,
            MessageLength::Known(message.len()),
            Channel::Blue,
        )
        .unwrap();
        assert_eq!(extracted, message);
    }

    #[test]
    fn test_roundtrip_on_each_channel() {
        let image: RgbaImage = ImageBuffer::from_fn(32, 16, |x, y| {
            Rgba([
                70 + (x * 2 + y) as u8,
                90 + (x + y * 3) as u8,
                50 + (x * 4) as u8,
                255,
            ])
        });
        let message: Message = "10110010".parse().unwrap();

        for channel in [Channel::Red, Channel::Green, Channel::Blue] {
            let embedded = embed(&image, &message, 12.0, channel).unwrap();
            let extracted = extract_differential(
                &image,
                &embedded.image,
                MessageLength::Known(8),
                channel,
            )
            .unwrap();
            assert_eq!(extracted, message, "channel {channel}");
        }
    }

    #[test]
    fn test_capacity_truncation() {
        let image = create_gradient_rgb_image(16, 16);
        let message: Message = "011011".parse().unwrap();

        let embedded = embed(&image, &message, 10.0, Channel::Blue).unwrap();
        assert_eq!(embedded.bits_embedded, 4);

        let extracted =
            extract_differential(&image, &embedded.image, MessageLength::Known(6), Channel::Blue)
                .unwrap();
        assert_eq!(extracted.bits(), &message.bits()[..4]);
    }

    #[test]
    fn test_only_selected_channel_changes() {
        let image: RgbaImage =
            ImageBuffer::from_fn(24, 16, |x, y| Rgba([x as u8, y as u8, 100 + x as u8, 77]));
        let message = Message::random_seeded(6, 11);

        let embedded = embed(&image, &message, 10.0, Channel::Blue).unwrap();
        assert_ne!(embedded.image, image);
        for (x, y, pixel) in embedded.image.enumerate_pixels() {
            let original = image.get_pixel(x, y);
            assert_eq!(pixel[0], original[0]);
            assert_eq!(pixel[1], original[1]);
            assert_eq!(pixel[3], 77);
        }
    }

    #[test]
    fn test_unused_blocks_stay_identical() {
        let image = create_gradient_rgb_image(64, 64);
        let message = Message::random_seeded(8, 5);

        let embedded = embed(&image, &message, 10.0, Channel::Blue).unwrap();
        // Blocks 8.. are the second row of blocks onwards.
        for y in 8..64 {
            for x in 0..64 {
                assert_eq!(embedded.image.get_pixel(x, y), image.get_pixel(x, y));
            }
        }

        let forced =
            extract_differential(&image, &embedded.image, MessageLength::Forced, Channel::Blue)
                .unwrap();
        assert_eq!(forced, message);
    }

    #[test]
    fn test_trailing_pixels_are_untouched() {
        let image = create_gradient_rgb_image(20, 12);
        let message: Message = "10".parse().unwrap();

        let embedded = embed(&image, &message, 10.0, Channel::Blue).unwrap();
        assert_eq!(embedded.bits_embedded, 2);
        for (x, y, pixel) in embedded.image.enumerate_pixels() {
            if x >= 16 || y >= 8 {
                assert_eq!(pixel, image.get_pixel(x, y));
            }
        }
    }

    #[test]
    fn test_identical_images_report_no_message() {
        let image = create_gradient_rgb_image(32, 32);
        for len in [1, 16, 1000] {
            assert_eq!(
                extract_differential(&image, &image, MessageLength::Known(len), Channel::Blue)
                    .unwrap_err(),
                WatermarkError::IdenticalCoefficients
            );
        }
        assert_eq!(
            extract_differential(&image, &image, MessageLength::Forced, Channel::Blue)
                .unwrap_err(),
            WatermarkError::IdenticalCoefficients
        );
    }

    #[test]
    fn test_zero_length_is_an_empty_message() {
        let image = create_gradient_rgb_image(16, 16);
        let extracted =
            extract_differential(&image, &image, MessageLength::Known(0), Channel::Blue).unwrap();
        assert!(extracted.is_empty());
    }

    #[test]
    fn test_dimension_mismatch() {
        let source = create_gradient_rgb_image(16, 16);
        let target = create_gradient_rgb_image(16, 24);
        assert_eq!(
            extract_differential(&source, &target, MessageLength::Known(1), Channel::Blue)
                .unwrap_err(),
            WatermarkError::DimensionMismatch {
                source_dims: (16, 16),
                target_dims: (16, 24),
            }
        );
    }

    #[test]
    fn test_self_contained_roundtrip() {
        let image = create_flat_rgb_image(32, 32, 128);
        let message: Message = "1101001011".parse().unwrap();

        let embedded = embed(&image, &message, 40.0, Channel::Blue).unwrap();
        let extracted = extract_self_contained(&embedded.image, message.len(), Channel::Blue)
            .unwrap();
        assert_eq!(extracted, message);
    }

    #[test]
    fn test_self_contained_is_capped_at_capacity() {
        let image = create_flat_rgb_image(16, 8, 90);
        let extracted = extract_self_contained(&image, 10, Channel::Red).unwrap();
        assert_eq!(extracted.len(), 2);
    }

    #[test]
    fn test_invalid_inputs() {
        let image = create_flat_rgb_image(8, 8, 128);
        let message: Message = "1".parse().unwrap();
        assert_eq!(
            embed(&image, &message, -1.0, Channel::Blue).unwrap_err(),
            WatermarkError::InvalidAlpha(-1.0)
        );

        let gray = GrayImage::new(8, 8);
        assert_eq!(
            embed(&gray, &message, 1.0, Channel::Blue).unwrap_err(),
            WatermarkError::UnsupportedPixelLayout(1)
        );
    }

    #[test]
    fn test_embed_dynamic_keeps_layout() {
        let rgb = DynamicImage::ImageRgb8(create_gradient_rgb_image(16, 16));
        let message: Message = "01".parse().unwrap();

        let embedded = embed_dynamic(&rgb, &message, 10.0, Channel::Blue).unwrap();
        assert!(matches!(embedded.image, DynamicImage::ImageRgb8(_)));
        assert_eq!(embedded.bits_embedded, 2);

        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(16, 16, image::Luma([100])));
        let embedded = embed_dynamic(&gray, &message, 10.0, Channel::Blue).unwrap();
        assert!(matches!(embedded.image, DynamicImage::ImageRgba8(_)));
    }
}
