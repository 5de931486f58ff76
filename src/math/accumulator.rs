// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Helper types to accumulate (sum) a lot of values.

use crate::misc::type_aliases::{Float, Mat6d, Vec21d, Vec6, Vec6d};

/// Number of independent entries of a symmetric 6x6 matrix.
pub const PACKED_LEN: usize = 21;

/// Index of entry `(i, j)` with `i <= j` in the packed upper triangle.
/// Entries are stored row after row: `(0,0), (0,1), ..., (0,5), (1,1), ...`.
#[inline]
pub fn packed_index(i: usize, j: usize) -> usize {
    debug_assert!(i <= j && j < 6);
    i * 6 - i * (i + 1) / 2 + j
}

/// Accumulator of the Gauss-Newton normal equations `JtJ * delta = -Jtr`.
///
/// Keeps the packed upper triangle of `JtJ` (21 values), `Jtr` (6 values),
/// the total squared residual and the number of inlier pixels.
/// Values are summed in f64 even though jacobians and residuals are f32.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalEquations {
    jtj: Vec21d,
    jtr: Vec6d,
    loss: f64,
    inliers: usize,
}

impl Default for NormalEquations {
    fn default() -> Self {
        Self::new()
    }
}

impl NormalEquations {
    /// Initialize with zeros.
    #[inline]
    pub fn new() -> Self {
        Self {
            jtj: Vec21d::zeros(),
            jtr: Vec6d::zeros(),
            loss: 0.0,
            inliers: 0,
        }
    }

    /// Add another `NormalEquations`.
    #[inline]
    pub fn add(&mut self, other: &Self) {
        self.jtj += other.jtj;
        self.jtr += other.jtr;
        self.loss += other.loss;
        self.inliers += other.inliers;
    }

    /// Add a term vv^t to the packed `JtJ`.
    #[inline]
    pub fn add_vec(&mut self, vec: &Vec6) {
        let mut index = 0_usize;
        for i in 0..6 {
            let data_i = f64::from(vec[i]);
            for j in i..6 {
                self.jtj[index] += data_i * f64::from(vec[j]);
                index += 1;
            }
        }
    }

    /// Add one linearized residual: its jacobian row and its value.
    #[inline]
    pub fn add_residual(&mut self, jacobian: &Vec6, residual: Float) {
        self.add_vec(jacobian);
        let r = f64::from(residual);
        for i in 0..6 {
            self.jtr[i] += f64::from(jacobian[i]) * r;
        }
        self.loss += r * r;
    }

    /// Count one more pixel as inlier.
    #[inline]
    pub fn count_inlier(&mut self) {
        self.inliers += 1;
    }

    /// Packed upper triangle of `JtJ`.
    pub fn packed_jtj(&self) -> &Vec21d {
        &self.jtj
    }

    /// Expand the packed `JtJ` into a full symmetric matrix.
    pub fn jtj(&self) -> Mat6d {
        let mut mat = Mat6d::zeros();
        let mut index = 0_usize;
        for i in 0..6 {
            for j in i..6 {
                mat[(i, j)] = self.jtj[index];
                mat[(j, i)] = self.jtj[index];
                index += 1;
            }
        }
        mat
    }

    pub fn jtr(&self) -> &Vec6d {
        &self.jtr
    }

    /// Sum of the weighted squared residuals.
    pub fn loss(&self) -> f64 {
        self.loss
    }

    pub fn inliers(&self) -> usize {
        self.inliers
    }
}

// TESTS #############################################################
