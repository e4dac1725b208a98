//! Deterministic choice of the coefficient that carries a block's bit.
//!
//! The embedder and the differential extractor both call [`select_max_ac`] on the
//! coefficients of the unmodified image, so they always agree on the position.

use crate::dct::{BLOCK_SIZE, CoefficientPlane};
use crate::error::{Result, WatermarkError};

/// Finds the AC coefficient with the largest magnitude inside one block.
///
/// The block is scanned row-major and the DC term `(0,0)` is skipped. Comparison is
/// `>=`, so among equal magnitudes the one scanned last wins; an all-zero block yields `(7,7)`.
///
/// # Arguments
/// * `coeffs` - The coefficient plane produced by the forward transform
/// * `block_coords` - The (x, y) coordinates of the block (in block units)
///
/// # Returns
/// * `Ok((row, col))` of the selected coefficient, relative to the block's top-left corner
/// * `Err(WatermarkError::BlockOutOfBounds)` if the block lies outside the plane
pub fn select_max_ac(
    coeffs: &CoefficientPlane,
    block_coords: (usize, usize),
) -> Result<(usize, usize)> {
    let (x_offset, y_offset) = block_offset(coeffs, block_coords)?;

    let mut best = (0, 1);
    let mut best_magnitude = f64::NEG_INFINITY;
    for row in 0..BLOCK_SIZE {
        for col in 0..BLOCK_SIZE {
            if row == 0 && col == 0 {
                continue;
            }
            let magnitude = coeffs[[y_offset + row, x_offset + col]].abs();
            if magnitude >= best_magnitude {
                best = (row, col);
                best_magnitude = magnitude;
            }
        }
    }

    Ok(best)
}

/// Reads the coefficient at `position` (row, col) inside the given block.
pub fn coefficient_at(
    coeffs: &CoefficientPlane,
    block_coords: (usize, usize),
    position: (usize, usize),
) -> Result<f64> {
    let index = locate(coeffs, block_coords, position)?;
    Ok(coeffs[index])
}

/// Mutable access to the coefficient at `position` (row, col) inside the given block.
pub fn coefficient_at_mut(
    coeffs: &mut CoefficientPlane,
    block_coords: (usize, usize),
    position: (usize, usize),
) -> Result<&mut f64> {
    let index = locate(coeffs, block_coords, position)?;
    Ok(&mut coeffs[index])
}

/// Plane index of `position` inside the block; positions past the block edge are rejected.
fn locate(
    coeffs: &CoefficientPlane,
    block_coords: (usize, usize),
    position: (usize, usize),
) -> Result<[usize; 2]> {
    let (x_offset, y_offset) = block_offset(coeffs, block_coords)?;
    let (row, col) = position;
    if row >= BLOCK_SIZE || col >= BLOCK_SIZE {
        return Err(WatermarkError::BlockOutOfBounds(block_coords));
    }
    Ok([y_offset + row, x_offset + col])
}

fn block_offset(coeffs: &CoefficientPlane, block_coords: (usize, usize)) -> Result<(usize, usize)> {
    let (block_x, block_y) = block_coords;
    let x_offset = block_x * BLOCK_SIZE;
    let y_offset = block_y * BLOCK_SIZE;

    if x_offset + BLOCK_SIZE > coeffs.ncols() || y_offset + BLOCK_SIZE > coeffs.nrows() {
        return Err(WatermarkError::BlockOutOfBounds(block_coords));
    }

    Ok((x_offset, y_offset))
}
