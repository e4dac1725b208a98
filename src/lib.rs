//! Hides a bit message in the block DCT of one color channel of an image.
//!
//! The engine is built from a block transform ([`dct`]), a coefficient selector
//! ([`selector`]), the embedder and extractors ([`watermark`]) and a codec for the length
//! header kept in the BMP container ([`metadata`]).

pub mod config;
pub mod dct;
pub mod error;
pub mod image_handler;
pub mod message;
pub mod metadata;
pub mod selector;
pub mod watermark;

pub mod utils {
    pub mod convert;
    pub mod quality;
}

pub use config::WatermarkConfig;
pub use error::{Result, WatermarkError};
pub use message::Message;
pub use metadata::{detect_embedding, embed_length, extract_length};
pub use utils::convert::Channel;
pub use watermark::{
    Embedded, MessageLength, embed, embed_dynamic, extract_differential, extract_self_contained,
};
