// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Type aliases for common types used all over the code base.

use nalgebra as na;

/// Images, points and transforms are computed in f32.
pub type Float = f32;

/// A point with two Float coordinates.
pub type Point2 = na::Point2<Float>;
/// A point with three Float coordinates.
pub type Point3 = na::Point3<Float>;

/// A vector with three Float coordinates.
pub type Vec3 = na::Vector3<Float>;
/// A vector with six Float coordinates.
pub type Vec6 = na::Vector6<Float>;

/// A 3x3 matrix of Floats.
pub type Mat3 = na::Matrix3<Float>;
/// A 4x4 matrix of Floats.
pub type Mat4 = na::Matrix4<Float>;

/// A 6x6 matrix of f64, used for the normal equations.
pub type Mat6d = na::Matrix6<f64>;
/// A vector with six f64 coordinates, used for the normal equations.
pub type Vec6d = na::Vector6<f64>;
/// Packed upper triangular part of a symmetric 6x6 matrix.
pub type Vec21d = na::SVector<f64, 21>;

/// A direct 3D isometry, also known as rigid body motion.
pub type Iso3 = na::Isometry3<Float>;

/// Type alias to easily spot vectors that are indexed over multi-resolution levels.
/// Level 0 is always the full resolution.
pub type Levels<T> = Vec<T>;
