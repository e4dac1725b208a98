//! BMP container I/O and the header-based embed/extract pipeline.

use image::{DynamicImage, ImageFormat};
use log::debug;
use std::fs;
use std::io::Cursor;
use std::path::Path;

use crate::config::WatermarkConfig;
use crate::error::{Result, WatermarkError};
use crate::message::Message;
use crate::metadata;
use crate::utils::convert::Channel;
use crate::watermark::{self, Embedded};

/// Load image from bytes (supports BMP and PNG)
pub fn load_image_from_bytes(bytes: &[u8]) -> Result<DynamicImage> {
    Ok(image::load_from_memory(bytes)?)
}

/// Save image to BMP bytes
pub fn save_image_to_bytes(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Bmp)?;
    Ok(buf)
}

pub fn read_image(path: impl AsRef<Path>) -> Result<DynamicImage> {
    load_image_from_bytes(&fs::read(path)?)
}

/// Embeds `message`, encodes the result as BMP and records the embedded length in its header.
///
/// The header is patched after encoding, since the encoder would otherwise reset it.
pub fn embed_to_bmp(
    image: &DynamicImage,
    message: &Message,
    config: &WatermarkConfig,
) -> Result<Embedded<Vec<u8>>> {
    let embedded = watermark::embed_dynamic(image, message, config.alpha, config.channel)?;
    let length = u32::try_from(embedded.bits_embedded)
        .map_err(|_| WatermarkError::LengthOverflow(embedded.bits_embedded))?;

    let bytes = save_image_to_bytes(&embedded.image)?;
    let bytes = metadata::embed_length(bytes, length)?;
    debug!("Encoded {} BMP bytes carrying {length} bits", bytes.len());

    Ok(Embedded {
        image: bytes,
        bits_embedded: embedded.bits_embedded,
    })
}

/// Reads the length header of a BMP container and decodes that many bits from its pixels.
///
/// Returns `Ok(None)` when the header shows no embedding.
pub fn extract_from_bmp(bytes: &[u8], channel: Channel) -> Result<Option<Message>> {
    if !metadata::detect_embedding(bytes) {
        debug!("Length header is empty, no embedding detected");
        return Ok(None);
    }

    let length = metadata::extract_length(bytes)?;
    debug!("Length header announces {length} bits");
    let image = load_image_from_bytes(bytes)?;
    let message = watermark::extract_self_contained(&image.to_rgba8(), length as usize, channel)?;

    Ok(Some(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb, RgbImage};

    fn create_flat_image(width: u32, height: u32) -> DynamicImage {
        let buffer: RgbImage = ImageBuffer::from_pixel(width, height, Rgb([120, 128, 128]));
        DynamicImage::ImageRgb8(buffer)
    }

    fn strong_config() -> WatermarkConfig {
        WatermarkConfig::new(Channel::Blue, 40.0).unwrap()
    }

    #[test]
    fn test_bmp_roundtrip_is_lossless() {
        let image = create_flat_image(16, 8);
        let bytes = save_image_to_bytes(&image).unwrap();
        assert_eq!(&bytes[..2], b"BM");
        assert!(!metadata::detect_embedding(&bytes));

        let decoded = load_image_from_bytes(&bytes).unwrap();
        assert_eq!(decoded.to_rgb8(), image.to_rgb8());
    }

    #[test]
    fn test_embed_and_extract_through_container() {
        let image = create_flat_image(32, 24);
        let message: Message = "100110".parse().unwrap();

        let embedded = embed_to_bmp(&image, &message, &strong_config()).unwrap();
        assert_eq!(embedded.bits_embedded, 6);
        assert_eq!(metadata::extract_length(&embedded.image).unwrap(), 6);

        let extracted = extract_from_bmp(&embedded.image, Channel::Blue).unwrap();
        assert_eq!(extracted, Some(message));
    }

    #[test]
    fn test_header_records_truncated_length() {
        let image = create_flat_image(16, 16);
        let message = Message::random_seeded(9, 1);

        let embedded = embed_to_bmp(&image, &message, &strong_config()).unwrap();
        assert_eq!(embedded.bits_embedded, 4);
        assert_eq!(metadata::extract_length(&embedded.image).unwrap(), 4);

        let extracted = extract_from_bmp(&embedded.image, Channel::Blue)
            .unwrap()
            .unwrap();
        assert_eq!(extracted.bits(), &message.bits()[..4]);
    }

    #[test]
    fn test_unmarked_container() {
        let bytes = save_image_to_bytes(&create_flat_image(16, 16)).unwrap();
        assert_eq!(extract_from_bmp(&bytes, Channel::Blue).unwrap(), None);
    }

    #[test]
    fn test_empty_message_leaves_header_clear() {
        let image = create_flat_image(16, 16);
        let embedded = embed_to_bmp(&image, &Message::default(), &strong_config()).unwrap();
        assert_eq!(embedded.bits_embedded, 0);
        assert!(!metadata::detect_embedding(&embedded.image));
    }

    #[test]
    fn test_read_image_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("marked.bmp");
        let message: Message = "01".parse().unwrap();

        let embedded = embed_to_bmp(&create_flat_image(16, 8), &message, &strong_config()).unwrap();
        fs::write(&path, &embedded.image).unwrap();

        let image = read_image(&path).unwrap();
        assert_eq!(image.width(), 16);
        assert_eq!(
            extract_from_bmp(&fs::read(&path).unwrap(), Channel::Blue).unwrap(),
            Some(message)
        );
    }

    #[test]
    fn test_garbage_bytes() {
        let mut bytes = vec![0u8; 32];
        bytes[6] = 1;
        assert!(matches!(
            extract_from_bmp(&bytes, Channel::Blue),
            Err(WatermarkError::ImageError(_))
        ));
        assert!(matches!(
            read_image("/nonexistent/carrier.bmp"),
            Err(WatermarkError::IoError(_))
        ));
    }
}
