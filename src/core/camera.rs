// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Pinhole camera intrinsics and their multi-resolution versions.

use serde::{Deserialize, Serialize};

use crate::misc::type_aliases::{Float, Levels, Mat3, Point2, Point3};

/// Intrinsic parameters of a pinhole camera, without skew.
#[derive(PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Intrinsics {
    /// Focal lengths `(fx, fy)` in pixels.
    pub focal: (Float, Float),
    /// Principal point `(cx, cy)` in pixels.
    pub principal_point: (Float, Float),
}

impl Intrinsics {
    /// Parameters of the PrimeSense sensors at 640x480.
    pub fn prime_sense_default() -> Self {
        Self {
            focal: (525.0, 525.0),
            principal_point: (319.5, 239.5),
        }
    }

    /// Calibration matrix.
    #[rustfmt::skip]
    pub fn matrix(&self) -> Mat3 {
        let (fx, fy) = self.focal;
        let (cx, cy) = self.principal_point;
        Mat3::new(
            fx,  0.0, cx,
            0.0, fy,  cy,
            0.0, 0.0, 1.0,
        )
    }

    /// Intrinsics of all the levels of a pyramid,
    /// each level being derived from the previous one with `half_res`.
    pub fn multi_res(self, n: usize) -> Levels<Self> {
        std::iter::successors(Some(self), |previous| Some(previous.half_res()))
            .take(n)
            .collect()
    }

    /// Intrinsics of the image at half the resolution.
    pub fn half_res(&self) -> Self {
        let (fx, fy) = self.focal;
        let (cx, cy) = self.principal_point;
        Self {
            focal: (0.5 * fx, 0.5 * fy),
            principal_point: (0.5 * cx, 0.5 * cy),
        }
    }

    /// Project a 3D point in camera coordinates onto the image plane.
    /// Returns `None` for points that are not in front of the camera.
    pub fn project(&self, point: &Point3) -> Option<Point2> {
        if point.z <= 0.0 {
            return None;
        }
        let inv_z = 1.0 / point.z;
        Some(Point2::new(
            self.focal.0 * point.x * inv_z + self.principal_point.0,
            self.focal.1 * point.y * inv_z + self.principal_point.1,
        ))
    }

    /// Back project a pixel with a known depth into a 3D point in camera coordinates.
    pub fn back_project(&self, point: Point2, depth: Float) -> Point3 {
        Point3::new(
            (point.x - self.principal_point.0) * depth / self.focal.0,
            (point.y - self.principal_point.1) * depth / self.focal.1,
            depth,
        )
    }
}

// TESTS #############################################################
