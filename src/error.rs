use thiserror::Error;

/// The central error type for all operations in the dctmark_engine.
#[derive(Error, Debug)]
pub enum WatermarkError {
    #[error("Image dimensions differ: source is {source_dims:?}, target is {target_dims:?}")]
    DimensionMismatch {
        source_dims: (u32, u32),
        target_dims: (u32, u32),
    },

    #[error("Coefficients are identical: no message found")]
    IdenticalCoefficients,

    #[error("Block position {0:?} out of bounds")]
    BlockOutOfBounds((usize, usize)),

    #[error("Message length {0} does not fit the 32-bit length header")]
    LengthOverflow(usize),

    #[error("Invalid message bit {value:#04x} at index {index}")]
    InvalidMessageBit { index: usize, value: u8 },

    #[error("Embedding strength must be a finite, non-negative number, got {0}")]
    InvalidAlpha(f64),

    #[error("Image needs at least 3 color channels, got {0}")]
    UnsupportedPixelLayout(u8),

    #[error("Container of {0} bytes is too short to hold the length header")]
    HeaderTooShort(usize),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Image processing error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// Manually implement PartialEq for WatermarkError
impl PartialEq for WatermarkError {
    fn eq(&self, other: &Self) -> bool {
        use WatermarkError::*;
        match (self, other) {
            (
                DimensionMismatch {
                    source_dims: s1,
                    target_dims: t1,
                },
                DimensionMismatch {
                    source_dims: s2,
                    target_dims: t2,
                },
            ) => s1 == s2 && t1 == t2,
            (IdenticalCoefficients, IdenticalCoefficients) => true,
            (BlockOutOfBounds(b1), BlockOutOfBounds(b2)) => b1 == b2,
            (LengthOverflow(l1), LengthOverflow(l2)) => l1 == l2,
            (
                InvalidMessageBit {
                    index: i1,
                    value: v1,
                },
                InvalidMessageBit {
                    index: i2,
                    value: v2,
                },
            ) => i1 == i2 && v1 == v2,
            // NaN alphas compare by bit pattern so an error always equals itself
            (InvalidAlpha(a1), InvalidAlpha(a2)) => a1.to_bits() == a2.to_bits(),
            (UnsupportedPixelLayout(c1), UnsupportedPixelLayout(c2)) => c1 == c2,
            (HeaderTooShort(l1), HeaderTooShort(l2)) => l1 == l2,
            (InvalidConfig(s1), InvalidConfig(s2)) => s1 == s2,
            // Foreign errors cannot be compared directly, match on the variant only.
            (ImageError(_), ImageError(_)) => true,
            (IoError(_), IoError(_)) => true,
            _ => false,
        }
    }
}

/// A centralized result type for our library.
pub type Result<T> = std::result::Result<T, WatermarkError>;
