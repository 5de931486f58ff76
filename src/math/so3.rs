// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Rotations and their angular velocities.
//!
//! An angular velocity `w = (w1, w2, w3)` is the rotation part of a twist,
//! which this crate stores first: `xi = (w1, w2, w3, v1, v2, v3)`.
//! Its direction is the rotation axis and its norm the angle in radians.
//! Rotations are unit quaternions.
//!
//! References: Sophus <https://github.com/strasdat/Sophus>
//! and Ethan Eade, "Lie groups for 2D and 3D transformations" <http://ethaneade.com/lie.pdf>.

use nalgebra::{Quaternion, UnitQuaternion};

use crate::misc::type_aliases::{Float, Mat3, Vec3};

/// Below this angle, trigonometric ratios are replaced by their Taylor expansions.
pub const EPSILON_TAYLOR_SERIES: Float = 1e-2;
pub const EPSILON_TAYLOR_SERIES_2: Float = EPSILON_TAYLOR_SERIES * EPSILON_TAYLOR_SERIES;

/// Cross product matrix of `w`: `hat(w) * p == w.cross(&p)`.
#[rustfmt::skip]
pub fn hat(w: Vec3) -> Mat3 {
    Mat3::new(
         0.0,  -w.z,   w.y,
         w.z,   0.0,  -w.x,
        -w.y,   w.x,   0.0,
    )
}

/// `hat(w) * hat(w)`, expanded. Used by the left jacobian of SE3.
#[rustfmt::skip]
pub fn hat_2(w: Vec3) -> Mat3 {
    let (xx, yy, zz) = (w.x * w.x, w.y * w.y, w.z * w.z);
    let (xy, xz, yz) = (w.x * w.y, w.x * w.z, w.y * w.z);
    Mat3::new(
        -yy - zz,   xy,        xz,
         xy,       -xx - zz,   yz,
         xz,        yz,       -xx - yy,
    )
}

/// Angular velocity of a cross product matrix.
/// Only the lower triangle is read, symmetry is not checked.
pub fn vee(mat: Mat3) -> Vec3 {
    Vec3::new(mat.m32, mat.m13, mat.m21)
}

/// Rotation of angle `|w|` around the axis `w`.
pub fn exp(w: Vec3) -> UnitQuaternion<Float> {
    let theta_2 = w.norm_squared();
    // cos(theta / 2) and sin(theta / 2) / theta.
    let (cos_half, sinc_half) = if theta_2 < EPSILON_TAYLOR_SERIES_2 {
        (1.0 - theta_2 / 8.0, 0.5 - theta_2 / 48.0)
    } else {
        let theta = theta_2.sqrt();
        ((0.5 * theta).cos(), (0.5 * theta).sin() / theta)
    };
    UnitQuaternion::from_quaternion(Quaternion::from_parts(cos_half, sinc_half * w))
}

/// Angular velocity `w` with `|w| <= pi` such that `exp(w) == rotation`.
pub fn log(rotation: UnitQuaternion<Float>) -> Vec3 {
    // q and -q are the same rotation, pick the one with a non negative real part.
    let (real, imag) = if rotation.scalar() < 0.0 {
        (-rotation.scalar(), -rotation.imag())
    } else {
        (rotation.scalar(), rotation.imag())
    };
    let imag_norm_2 = imag.norm_squared();
    if imag_norm_2 < EPSILON_TAYLOR_SERIES_2 {
        (2.0 / real) * imag
    } else {
        let imag_norm = imag_norm_2.sqrt();
        (2.0 * imag_norm.atan2(real) / imag_norm) * imag
    }
}

// TESTS #############################################################
