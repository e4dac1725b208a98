use image::{ImageBuffer, Pixel};
use ndarray::Array2;
use std::fmt;
use std::str::FromStr;

use crate::dct::PixelPlane;
use crate::error::{Result, WatermarkError};

/// Color component whose plane carries the watermark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Channel {
    Red,
    Green,
    #[default]
    Blue,
}

impl Channel {
    /// Subpixel index of this component in an RGB(A) pixel.
    pub fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::Red => "red",
            Channel::Green => "green",
            Channel::Blue => "blue",
        };
        f.write_str(name)
    }
}

impl FromStr for Channel {
    type Err = WatermarkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "red" | "r" => Ok(Channel::Red),
            "green" | "g" => Ok(Channel::Green),
            "blue" | "b" => Ok(Channel::Blue),
            other => Err(WatermarkError::InvalidConfig(format!(
                "unknown channel '{other}', expected red, green or blue"
            ))),
        }
    }
}

fn check_layout<P: Pixel<Subpixel = u8>>() -> Result<()> {
    if P::CHANNEL_COUNT < 3 {
        return Err(WatermarkError::UnsupportedPixelLayout(P::CHANNEL_COUNT));
    }
    Ok(())
}

/// Copies one color component of an 8-bit RGB(A) image into a plane of shape `(height, width)`.
pub fn extract_channel<P>(image: &ImageBuffer<P, Vec<u8>>, channel: Channel) -> Result<PixelPlane>
where
    P: Pixel<Subpixel = u8>,
{
    check_layout::<P>()?;
    let (width, height) = image.dimensions();
    let index = channel.index();

    Ok(Array2::from_shape_fn(
        (height as usize, width as usize),
        |(y, x)| image.get_pixel(x as u32, y as u32).channels()[index],
    ))
}

/// Writes `plane` into one color component of a copy of `original`.
///
/// Pixels outside the plane, the other components and alpha keep their original values.
pub fn merge_channel<P>(
    original: &ImageBuffer<P, Vec<u8>>,
    plane: &PixelPlane,
    channel: Channel,
) -> Result<ImageBuffer<P, Vec<u8>>>
where
    P: Pixel<Subpixel = u8>,
{
    check_layout::<P>()?;
    let index = channel.index();
    let mut out_img = original.clone();

    for (x, y, pixel) in out_img.enumerate_pixels_mut() {
        if let Some(value) = plane.get((y as usize, x as usize)) {
            pixel.channels_mut()[index] = *value;
        }
    }

    Ok(out_img)
}
