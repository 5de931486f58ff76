// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Helper functions to generate multi-resolution matrices.

use nalgebra::{DMatrix, Scalar};

use crate::core::frame;
use crate::misc::type_aliases::{Float, Levels};

/// Recursively generate a pyramid of matrices where each level
/// is half the previous resolution, computed with the mean of each 2x2 block.
pub fn mean_pyramid(max_levels: usize, mat: DMatrix<Float>) -> Levels<DMatrix<Float>> {
    limited_sequence(max_levels, mat, |m| halve(m, |a, b, c, d| 0.25 * (a + b + c + d)))
}

/// Same as `mean_pyramid` but for depth maps.
/// Only valid depths are averaged, a 2x2 block without any valid depth stays invalid.
pub fn depth_pyramid(max_levels: usize, mat: DMatrix<Float>) -> Levels<DMatrix<Float>> {
    limited_sequence(max_levels, mat, |m| halve(m, mean_valid_depth))
}

/// Recursively apply a function transforming the matrix
/// until it's not possible anymore or the max number of levels is reached.
/// Using max_levels = 0 has the same effect than max_levels = 1 since it always has
/// at least one matrix (the initial one).
pub fn limited_sequence<F, T>(max_levels: usize, mat: DMatrix<T>, f: F) -> Levels<DMatrix<T>>
where
    F: Fn(&DMatrix<T>) -> Option<DMatrix<T>>,
    T: Scalar,
{
    let mut pyr = vec![mat];
    while pyr.len() < max_levels {
        match pyr.last().and_then(|m| f(m)) {
            Some(new_mat) => pyr.push(new_mat),
            None => break,
        }
    }
    pyr
}

/// Halve the resolution of a matrix by applying a function to each 2x2 block.
/// If one size of the matrix is < 2 then this function returns None.
/// If one size is odd, its last line/column is dropped.
pub fn halve<F, T, U>(mat: &DMatrix<T>, f: F) -> Option<DMatrix<U>>
where
    F: Fn(T, T, T, T) -> U,
    T: Scalar + Copy,
    U: Scalar,
{
    let (r, c) = mat.shape();
    let half_r = r / 2;
    let half_c = c / 2;
    if half_r == 0 || half_c == 0 {
        None
    } else {
        let half_mat = DMatrix::<U>::from_fn(half_r, half_c, |i, j| {
            let a = mat[(2 * i, 2 * j)];
            let b = mat[(2 * i + 1, 2 * j)];
            let c = mat[(2 * i, 2 * j + 1)];
            let d = mat[(2 * i + 1, 2 * j + 1)];
            f(a, b, c, d)
        });
        Some(half_mat)
    }
}

/// Mean of the valid depths in a 2x2 block, 0 if none is valid.
fn mean_valid_depth(a: Float, b: Float, c: Float, d: Float) -> Float {
    let (sum, count) = [a, b, c, d]
        .iter()
        .filter(|&&z| frame::is_valid_depth(z))
        .fold((0.0, 0.0), |(sum, count), &z| (sum + z, count + 1.0));
    if count > 0.0 {
        sum / count
    } else {
        0.0
    }
}

// TESTS #############################################################
