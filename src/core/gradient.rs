// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! 3x3 smoothing and gradient filters.
//!
//! Borders are handled by replicating the closest pixel.
//! The `_depth` variants are aware of invalid depths (0):
//! they never spread an invalid value onto a valid pixel.

use nalgebra::DMatrix;

use crate::core::frame::is_valid_depth;
use crate::misc::type_aliases::Float;

/// 1D Gaussian kernel, applied in both directions.
const GAUSSIAN: [Float; 3] = [0.25, 0.5, 0.25];

/// Sobel derivative kernel, normalized so that gradients are in units per pixel.
const SOBEL_DIFF: [Float; 3] = [-0.5, 0.0, 0.5];
/// Sobel smoothing kernel.
const SOBEL_SMOOTH: [Float; 3] = [0.25, 0.5, 0.25];

/// Pixel value with replicated borders.
#[inline]
#[allow(clippy::cast_possible_wrap)]
#[allow(clippy::cast_sign_loss)]
fn at(mat: &DMatrix<Float>, row: isize, col: isize) -> Float {
    let (nb_rows, nb_cols) = mat.shape();
    let r = row.max(0).min(nb_rows as isize - 1) as usize;
    let c = col.max(0).min(nb_cols as isize - 1) as usize;
    mat[(r, c)]
}

/// Apply a function to the 3x3 neighborhood of every pixel.
/// The function receives the center value and the 3x3 values, indexed `[dy][dx]`.
#[allow(clippy::cast_possible_wrap)]
fn map_3x3<F>(mat: &DMatrix<Float>, f: F) -> DMatrix<Float>
where
    F: Fn(Float, &[[Float; 3]; 3]) -> Float,
{
    let (nb_rows, nb_cols) = mat.shape();
    DMatrix::from_fn(nb_rows, nb_cols, |r, c| {
        let mut block = [[0.0; 3]; 3];
        for (dy, line) in block.iter_mut().enumerate() {
            for (dx, value) in line.iter_mut().enumerate() {
                *value = at(mat, r as isize + dy as isize - 1, c as isize + dx as isize - 1);
            }
        }
        f(mat[(r, c)], &block)
    })
}

/// 3x3 Gaussian smoothing.
pub fn gaussian(mat: &DMatrix<Float>) -> DMatrix<Float> {
    map_3x3(mat, |_, block| {
        let mut sum = 0.0;
        for (dy, line) in block.iter().enumerate() {
            for (dx, value) in line.iter().enumerate() {
                sum += GAUSSIAN[dy] * GAUSSIAN[dx] * value;
            }
        }
        sum
    })
}

/// 3x3 Gaussian smoothing of a depth map.
///
/// Invalid pixels stay invalid.
/// Invalid neighbors, and neighbors further than `edge_threshold` from the center depth,
/// are ignored and the remaining weights renormalized.
pub fn gaussian_depth(depth: &DMatrix<Float>, edge_threshold: Float) -> DMatrix<Float> {
    map_3x3(depth, |center, block| {
        if !is_valid_depth(center) {
            return 0.0;
        }
        let mut sum = 0.0;
        let mut total_weight = 0.0;
        for (dy, line) in block.iter().enumerate() {
            for (dx, &value) in line.iter().enumerate() {
                if is_valid_depth(value) && (value - center).abs() <= edge_threshold {
                    let weight = GAUSSIAN[dy] * GAUSSIAN[dx];
                    sum += weight * value;
                    total_weight += weight;
                }
            }
        }
        // The center itself always contributes, total_weight > 0.
        sum / total_weight
    })
}

/// Horizontal and vertical Sobel gradients.
pub fn sobel(mat: &DMatrix<Float>) -> (DMatrix<Float>, DMatrix<Float>) {
    let grad_x = map_3x3(mat, |_, block| sobel_x(block));
    let grad_y = map_3x3(mat, |_, block| sobel_y(block));
    (grad_x, grad_y)
}

/// Horizontal and vertical Sobel gradients of a depth map.
/// The gradient is 0 wherever the 3x3 neighborhood contains an invalid depth.
pub fn sobel_depth(depth: &DMatrix<Float>) -> (DMatrix<Float>, DMatrix<Float>) {
    let with_holes = |f: fn(&[[Float; 3]; 3]) -> Float| {
        move |_: Float, block: &[[Float; 3]; 3]| {
            if block.iter().flatten().all(|&z| is_valid_depth(z)) {
                f(block)
            } else {
                0.0
            }
        }
    };
    let grad_x = map_3x3(depth, with_holes(sobel_x));
    let grad_y = map_3x3(depth, with_holes(sobel_y));
    (grad_x, grad_y)
}

fn sobel_x(block: &[[Float; 3]; 3]) -> Float {
    let mut sum = 0.0;
    for (dy, line) in block.iter().enumerate() {
        for (dx, value) in line.iter().enumerate() {
            sum += SOBEL_SMOOTH[dy] * SOBEL_DIFF[dx] * value;
        }
    }
    sum
}

fn sobel_y(block: &[[Float; 3]; 3]) -> Float {
    let mut sum = 0.0;
    for (dy, line) in block.iter().enumerate() {
        for (dx, value) in line.iter().enumerate() {
            sum += SOBEL_DIFF[dy] * SOBEL_SMOOTH[dx] * value;
        }
    }
    sum
}

// TESTS #############################################################

#[cfg(test)]
mod tests {

    use super::*;

    /// Linear ramp `value = a * x + b * y + c`.
    fn ramp(nb_rows: usize, nb_cols: usize, a: Float, b: Float, c: Float) -> DMatrix<Float> {
        DMatrix::from_fn(nb_rows, nb_cols, |y, x| a * x as Float + b * y as Float + c)
    }

    #[test]
    fn gaussian_keeps_constant_images() {
        let mat = DMatrix::repeat(5, 4, 0.5);
        approx::assert_relative_eq!(gaussian(&mat), mat, epsilon = 1e-6);
    }

    #[test]
    fn sobel_of_a_ramp_is_its_slope() {
        let mat = ramp(6, 7, 0.1, -0.3, 1.0);
        let (gx, gy) = sobel(&mat);
        // Away from the replicated borders.
        for y in 1..5 {
            for x in 1..6 {
                approx::assert_relative_eq!(gx[(y, x)], 0.1, epsilon = 1e-5);
                approx::assert_relative_eq!(gy[(y, x)], -0.3, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn gaussian_depth_never_invalidates_valid_pixels() {
        #[rustfmt::skip]
        let depth = DMatrix::from_row_slice(3, 3, &[
            0.0, 1.0, 1.0,
            1.0, 1.0, 0.0,
            1.0, 0.0, 1.0,
        ]);
        let smoothed = gaussian_depth(&depth, 0.1);
        for (raw, smooth) in depth.iter().zip(smoothed.iter()) {
            if *raw > 0.0 {
                approx::assert_relative_eq!(*smooth, 1.0, epsilon = 1e-6);
            } else {
                assert_eq!(*smooth, 0.0);
            }
        }
    }

    #[test]
    fn gaussian_depth_preserves_edges() {
        let depth = DMatrix::from_fn(3, 4, |_, x| if x < 2 { 1.0 } else { 3.0 });
        let smoothed = gaussian_depth(&depth, 0.1);
        approx::assert_relative_eq!(smoothed, depth, epsilon = 1e-6);
    }

    #[test]
    fn sobel_depth_is_zero_next_to_holes() {
        let mut depth = ramp(5, 5, 0.01, 0.0, 1.0);
        depth[(2, 2)] = 0.0;
        let (gx, _) = sobel_depth(&depth);
        assert_eq!(gx[(1, 1)], 0.0);
        assert_eq!(gx[(3, 3)], 0.0);
        approx::assert_relative_eq!(gx[(0, 2)], 0.01, epsilon = 1e-5);
    }
}
