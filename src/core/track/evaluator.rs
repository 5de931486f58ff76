// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Correspondence search and linearization of the photometric and geometric residuals.
//!
//! Each source pixel with a valid depth is back projected, moved by the current
//! source-to-target transform and projected into the target image.
//! A valid correspondence yields two residuals,
//! `sqrt(1 - sigma) * (I_t(p') - I_s(p))` and `sqrt(sigma) * (D_t(p') - z')`,
//! linearized with respect to a left-multiplied twist `(w, v)` on the transform.

use nalgebra::DMatrix;

use crate::core::{
    camera::Intrinsics,
    config::OdometryConfig,
    frame::is_valid_depth,
    pyramid::{Gradients, PyramidLevel},
};
use crate::math::accumulator::NormalEquations;
use crate::misc::type_aliases::{Float, Iso3, Point2, Point3, Vec6};

/// Linearized residuals of one valid correspondence.
#[derive(Debug, Clone, PartialEq)]
pub struct Linearization {
    /// Coordinates of the match in the target image.
    pub target: Point2,
    pub intensity_jacobian: Vec6,
    pub intensity_residual: Float,
    pub depth_jacobian: Vec6,
    pub depth_residual: Float,
}

/// Diagnostic record of one valid correspondence.
#[derive(Debug, Clone, PartialEq)]
pub struct Correspondence {
    /// `(x, y)` coordinates of the source pixel.
    pub source: (usize, usize),
    /// Sub-pixel coordinates of the match in the target image.
    pub target: Point2,
    pub intensity_residual: Float,
    pub depth_residual: Float,
}

/// Evaluator of the residuals at one pyramid level.
pub struct Evaluator<'a> {
    source: &'a PyramidLevel,
    target: &'a PyramidLevel,
    gradients: &'a Gradients,
    intrinsics: &'a Intrinsics,
    min_depth: Float,
    max_depth: Float,
    max_depth_diff: Float,
    depth_weight: Float,
    intensity_weight: Float,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        config: &OdometryConfig,
        intrinsics: &'a Intrinsics,
        source: &'a PyramidLevel,
        target: &'a PyramidLevel,
        gradients: &'a Gradients,
    ) -> Self {
        Self {
            source,
            target,
            gradients,
            intrinsics,
            min_depth: config.min_depth,
            max_depth: config.max_depth,
            max_depth_diff: config.max_depth_diff,
            depth_weight: config.depth_weight(),
            intensity_weight: config.intensity_weight(),
        }
    }

    /// Number of rows of the source image.
    pub fn nb_rows(&self) -> usize {
        self.source.height()
    }

    /// Linearize the residuals of the source pixel `(x, y)`.
    /// Returns `None` if the pixel has no valid correspondence.
    #[allow(clippy::many_single_char_names)]
    #[allow(clippy::cast_precision_loss)]
    pub fn linearize(&self, transform: &Iso3, x: usize, y: usize) -> Option<Linearization> {
        let source_depth = self.source.depth[(y, x)];
        if !self.in_depth_range(source_depth) {
            return None;
        }
        let source_point = self
            .intrinsics
            .back_project(Point2::new(x as Float, y as Float), source_depth);
        let point = transform * source_point;
        let target = self.intrinsics.project(&point)?;
        let sample = Bilinear::at(target, self.target.width(), self.target.height())?;

        // Target depth must be valid at the four interpolated pixels.
        if !sample.all(&self.target.depth, |z| self.in_depth_range(z)) {
            return None;
        }
        let target_depth = sample.interpolate(&self.target.depth);
        let depth_diff = target_depth - point.z;
        if depth_diff.abs() > self.max_depth_diff {
            return None;
        }
        let intensity_diff =
            sample.interpolate(&self.target.intensity) - self.source.intensity[(y, x)];

        let gradients = self.gradients;
        let intensity_jacobian = self.intensity_weight
            * self.point_jacobian(
                &point,
                sample.interpolate(&gradients.intensity_x),
                sample.interpolate(&gradients.intensity_y),
            );
        let depth_jacobian = self.depth_weight
            * (self.point_jacobian(
                &point,
                sample.interpolate(&gradients.depth_x),
                sample.interpolate(&gradients.depth_y),
            ) - z_jacobian(&point));

        Some(Linearization {
            target,
            intensity_jacobian,
            intensity_residual: self.intensity_weight * intensity_diff,
            depth_jacobian,
            depth_residual: self.depth_weight * depth_diff,
        })
    }

    /// Accumulate the contributions of all the pixels of one source row.
    pub fn accumulate_row(&self, transform: &Iso3, y: usize, accum: &mut NormalEquations) {
        for x in 0..self.source.width() {
            if let Some(lin) = self.linearize(transform, x, y) {
                accum.add_residual(&lin.intensity_jacobian, lin.intensity_residual);
                accum.add_residual(&lin.depth_jacobian, lin.depth_residual);
                accum.count_inlier();
            }
        }
    }

    /// Materialize all valid correspondences, for inspection purposes.
    pub fn correspondences(&self, transform: &Iso3) -> Vec<Correspondence> {
        let (nb_rows, nb_cols) = self.source.depth.shape();
        (0..nb_rows)
            .flat_map(|y| (0..nb_cols).map(move |x| (x, y)))
            .filter_map(|(x, y)| {
                self.linearize(transform, x, y).map(|lin| Correspondence {
                    source: (x, y),
                    target: lin.target,
                    intensity_residual: lin.intensity_residual,
                    depth_residual: lin.depth_residual,
                })
            })
            .collect()
    }

    fn in_depth_range(&self, depth: Float) -> bool {
        is_valid_depth(depth) && depth >= self.min_depth && depth <= self.max_depth
    }

    /// Jacobian of `g . proj(exp(xi) * point)` at `xi = 0`,
    /// where `g = (gu, gv)` is an image gradient at the projected point.
    fn point_jacobian(&self, point: &Point3, gu: Float, gv: Float) -> Vec6 {
        let (fx, fy) = self.intrinsics.focal;
        let inv_z = 1.0 / point.z;
        let c0 = gu * fx * inv_z;
        let c1 = gv * fy * inv_z;
        let c2 = -(c0 * point.x + c1 * point.y) * inv_z;
        Vec6::new(
            point.y * c2 - point.z * c1, //
            point.z * c0 - point.x * c2, //  angular velocity terms
            point.x * c1 - point.y * c0, //
            c0,                          //
            c1,                          //  linear velocity terms
            c2,                          //
        )
    }
}

/// Jacobian of the `z` coordinate of `exp(xi) * point` at `xi = 0`.
fn z_jacobian(point: &Point3) -> Vec6 {
    Vec6::new(point.y, -point.x, 0.0, 0.0, 0.0, 1.0)
}

/// Bilinear interpolation coefficients of a sub-pixel position.
struct Bilinear {
    u_0: usize,
    v_0: usize,
    u_1: usize,
    v_1: usize,
    a: Float,
    b: Float,
}

impl Bilinear {
    /// Return `None` if the point falls outside of the pixel footprint of the image,
    /// that is `[-0.5, width - 0.5) x [-0.5, height - 0.5)`.
    /// Points within half a pixel of the border sample the border pixels,
    /// like the filters replicating their border.
    #[allow(clippy::cast_possible_truncation)]
    #[allow(clippy::cast_sign_loss)]
    #[allow(clippy::cast_precision_loss)]
    fn at(point: Point2, width: usize, height: usize) -> Option<Self> {
        let (x, y) = (point.x, point.y);
        let inside = x >= -0.5
            && x < width as Float - 0.5
            && y >= -0.5
            && y < height as Float - 0.5;
        if !inside {
            return None;
        }
        let x = x.max(0.0).min((width - 1) as Float);
        let y = y.max(0.0).min((height - 1) as Float);
        let u = x.floor();
        let v = y.floor();
        let u_0 = u as usize;
        let v_0 = v as usize;
        Some(Self {
            u_0,
            v_0,
            u_1: (u_0 + 1).min(width - 1),
            v_1: (v_0 + 1).min(height - 1),
            a: x - u,
            b: y - v,
        })
    }

    fn corners(&self) -> [(usize, usize); 4] {
        [
            (self.v_0, self.u_0),
            (self.v_1, self.u_0),
            (self.v_0, self.u_1),
            (self.v_1, self.u_1),
        ]
    }

    fn all<F: Fn(Float) -> bool>(&self, image: &DMatrix<Float>, predicate: F) -> bool {
        self.corners().iter().all(|&idx| predicate(image[idx]))
    }

    fn interpolate(&self, image: &DMatrix<Float>) -> Float {
        let [vu_00, vu_10, vu_01, vu_11] = self.corners();
        let (a, b) = (self.a, self.b);
        (1.0 - b) * (1.0 - a) * image[vu_00]
            + b * (1.0 - a) * image[vu_10]
            + (1.0 - b) * a * image[vu_01]
            + b * a * image[vu_11]
    }
}

// TESTS #############################################################
