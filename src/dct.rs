//! Block-wise Discrete Cosine Transform over single-channel planes.
//!
//! Every non-overlapping 8x8 tile of a plane is transformed independently with the
//! orthonormal type-II DCT:
//!
//! ```text
//! F(k,l) = sqrt(Ck) * sqrt(Cl) * sum_i sum_j P(i,j) * cos((2i+1)πk/16) * cos((2j+1)πl/16)
//! Ck = 1/8 if k = 0, else 2/8
//! ```
//!
//! The 2D transform is computed separably (rows, then columns) with 8-point transforms
//! planned by rustdct. The inverse goes back to bytes by truncation, which is the lossy
//! channel an embedded bit has to survive.
//!
//! Only whole blocks are transformed. Trailing rows and columns that do not fill a
//! block are left out of the coefficient plane.

use ndarray::{Array2, s};
use rustdct::{Dct2, Dct3, DctPlanner, TransformType2And3};
use std::sync::Arc;

// --- Constants ---
/// The size of the square blocks the plane is processed in.
pub const BLOCK_SIZE: usize = 8;

/// Values this close below an integer are snapped up to it before truncation.
/// Floating-point residue of the cosine sums would otherwise turn an exact 128 into 127.
const SNAP_EPSILON: f64 = 1e-9;

/// A rectangular grid of 8-bit intensities, indexed `[[row, col]]`.
pub type PixelPlane = Array2<u8>;

/// A grid of real-valued transform coefficients, indexed `[[row, col]]`.
pub type CoefficientPlane = Array2<f64>;

/// Number of whole blocks along each axis as `(blocks_x, blocks_y)`.
pub fn block_grid(width: usize, height: usize) -> (usize, usize) {
    (width / BLOCK_SIZE, height / BLOCK_SIZE)
}

/// Number of bits a plane of the given size can carry, one per block.
pub fn capacity(width: usize, height: usize) -> usize {
    let (blocks_x, blocks_y) = block_grid(width, height);
    blocks_x * blocks_y
}

/// Block coordinates `(block_x, block_y)` in raster order: a row of blocks, then the next.
pub fn raster_blocks(blocks_x: usize, blocks_y: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..blocks_y).flat_map(move |block_y| (0..blocks_x).map(move |block_x| (block_x, block_y)))
}

/// Normalisation factor `sqrt(Ck)` for frequency index `k`.
fn scale(k: usize) -> f64 {
    if k == 0 {
        (1.0 / BLOCK_SIZE as f64).sqrt()
    } else {
        (2.0 / BLOCK_SIZE as f64).sqrt()
    }
}

/// Converts a reconstructed intensity back to a byte: clamp, snap, truncate.
fn reconstruct_pixel(value: f64) -> u8 {
    let clamped = value.clamp(0.0, 255.0);
    (clamped + SNAP_EPSILON).trunc().min(255.0) as u8
}

/// Forward and inverse 8x8 block DCT sharing one planned 8-point transform.
#[derive(Clone)]
pub struct BlockTransform {
    dct: Arc<dyn TransformType2And3<f64>>,
}

impl Default for BlockTransform {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockTransform {
    pub fn new() -> Self {
        let mut planner = DctPlanner::new();
        Self {
            dct: planner.plan_dct2(BLOCK_SIZE),
        }
    }

    /// Transforms one row-major 8x8 block of intensities into coefficients in place.
    pub fn forward_block(&self, block: &mut [f64; BLOCK_SIZE * BLOCK_SIZE]) {
        for row in block.chunks_exact_mut(BLOCK_SIZE) {
            self.dct.process_dct2(row);
        }

        let mut column = [0.0; BLOCK_SIZE];
        for l in 0..BLOCK_SIZE {
            for (i, value) in column.iter_mut().enumerate() {
                *value = block[i * BLOCK_SIZE + l];
            }
            self.dct.process_dct2(&mut column);
            for (k, value) in column.iter().enumerate() {
                block[k * BLOCK_SIZE + l] = scale(k) * scale(l) * value;
            }
        }
    }

    /// Transforms one row-major 8x8 block of coefficients back to real intensities in place.
    pub fn inverse_block(&self, block: &mut [f64; BLOCK_SIZE * BLOCK_SIZE]) {
        // DCT-III halves the zero-frequency input, so those terms are doubled up front.
        for k in 0..BLOCK_SIZE {
            for l in 0..BLOCK_SIZE {
                let mut weight = scale(k) * scale(l);
                if k == 0 {
                    weight *= 2.0;
                }
                if l == 0 {
                    weight *= 2.0;
                }
                block[k * BLOCK_SIZE + l] *= weight;
            }
        }

        for row in block.chunks_exact_mut(BLOCK_SIZE) {
            self.dct.process_dct3(row);
        }

        let mut column = [0.0; BLOCK_SIZE];
        for j in 0..BLOCK_SIZE {
            for (k, value) in column.iter_mut().enumerate() {
                *value = block[k * BLOCK_SIZE + j];
            }
            self.dct.process_dct3(&mut column);
            for (i, value) in column.iter().enumerate() {
                block[i * BLOCK_SIZE + j] = *value;
            }
        }
    }

    /// Applies the forward DCT to every whole block of `plane`.
    ///
    /// The result covers the block-aligned region only, so its shape is
    /// `(height / 8 * 8, width / 8 * 8)`.
    pub fn transform(&self, plane: &PixelPlane) -> CoefficientPlane {
        let (blocks_x, blocks_y) = block_grid(plane.ncols(), plane.nrows());
        let mut coeffs = Array2::zeros((blocks_y * BLOCK_SIZE, blocks_x * BLOCK_SIZE));
        let mut block = [0.0; BLOCK_SIZE * BLOCK_SIZE];

        for (block_x, block_y) in raster_blocks(blocks_x, blocks_y) {
            let (x_offset, y_offset) = (block_x * BLOCK_SIZE, block_y * BLOCK_SIZE);
            let region = s![
                y_offset..y_offset + BLOCK_SIZE,
                x_offset..x_offset + BLOCK_SIZE
            ];

            for (value, pixel) in block.iter_mut().zip(plane.slice(region).iter()) {
                *value = f64::from(*pixel);
            }
            self.forward_block(&mut block);
            for (coeff, value) in coeffs.slice_mut(region).iter_mut().zip(block.iter()) {
                *coeff = *value;
            }
        }

        coeffs
    }

    /// Applies the inverse DCT to every block of `coeffs`, truncating each pixel to a byte.
    pub fn inverse_transform(&self, coeffs: &CoefficientPlane) -> PixelPlane {
        let (blocks_x, blocks_y) = block_grid(coeffs.ncols(), coeffs.nrows());
        let mut plane = Array2::zeros((blocks_y * BLOCK_SIZE, blocks_x * BLOCK_SIZE));
        let mut block = [0.0; BLOCK_SIZE * BLOCK_SIZE];

        for (block_x, block_y) in raster_blocks(blocks_x, blocks_y) {
            let (x_offset, y_offset) = (block_x * BLOCK_SIZE, block_y * BLOCK_SIZE);
            let region = s![
                y_offset..y_offset + BLOCK_SIZE,
                x_offset..x_offset + BLOCK_SIZE
            ];

            for (value, coeff) in block.iter_mut().zip(coeffs.slice(region).iter()) {
                *value = *coeff;
            }
            self.inverse_block(&mut block);
            for (pixel, value) in plane.slice_mut(region).iter_mut().zip(block.iter()) {
                *pixel = reconstruct_pixel(*value);
            }
        }

        plane
    }
}

/// Forward block DCT of a whole plane with a freshly planned transform.
pub fn transform(plane: &PixelPlane) -> CoefficientPlane {
    BlockTransform::new().transform(plane)
}

/// Inverse block DCT of a whole coefficient plane with a freshly planned transform.
pub fn inverse_transform(coeffs: &CoefficientPlane) -> PixelPlane {
    BlockTransform::new().inverse_transform(coeffs)
}
