//! The bit sequence hidden in an image.
//!
//! Each bit is stored as a byte holding exactly `0x00` or `0x01`.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, WatermarkError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Message {
    bits: Vec<u8>,
}

impl Message {
    /// Builds a message from bit bytes, rejecting anything but `0x00` and `0x01`.
    pub fn from_bits(bits: Vec<u8>) -> Result<Self> {
        if let Some((index, &value)) = bits.iter().enumerate().find(|(_, b)| **b > 1) {
            return Err(WatermarkError::InvalidMessageBit { index, value });
        }
        Ok(Self { bits })
    }

    /// Wraps bits produced by a decoder, which only ever emits 0 or 1.
    pub(crate) fn from_decoded(bits: Vec<u8>) -> Self {
        debug_assert!(bits.iter().all(|b| *b <= 1));
        Self { bits }
    }

    /// A random message of `len` bits from the thread-local generator.
    pub fn random(len: usize) -> Self {
        Self::random_with(&mut rand::rng(), len)
    }

    /// A reproducible random message of `len` bits.
    pub fn random_seeded(len: usize, seed: u64) -> Self {
        Self::random_with(&mut ChaCha8Rng::seed_from_u64(seed), len)
    }

    fn random_with<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Self {
        let bits = (0..len).map(|_| u8::from(rng.random_bool(0.5))).collect();
        Self { bits }
    }

    pub fn bits(&self) -> &[u8] {
        &self.bits
    }

    pub fn into_bits(self) -> Vec<u8> {
        self.bits
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }
}

impl AsRef<[u8]> for Message {
    fn as_ref(&self) -> &[u8] {
        &self.bits
    }
}

/// Parses a string of `0` and `1` characters.
impl FromStr for Message {
    type Err = WatermarkError;

    fn from_str(s: &str) -> Result<Self> {
        let bits = s
            .chars()
            .enumerate()
            .map(|(index, c)| match c {
                '0' => Ok(0),
                '1' => Ok(1),
                other => Err(WatermarkError::InvalidMessageBit {
                    index,
                    value: u8::try_from(other).unwrap_or(u8::MAX),
                }),
            })
            .collect::<Result<Vec<u8>>>()?;
        Ok(Self { bits })
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in &self.bits {
            write!(f, "{bit}")?;
        }
        Ok(())
    }
}
