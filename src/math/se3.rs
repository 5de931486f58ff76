// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Lie algebra/group functions for 3D rigid body motion.
//!
//! Twists are ordered rotation first: `(w1, w2, w3, v1, v2, v3)`,
//! which is also the column order of the odometry jacobians.
//!
//! Interesting reads:
//! - Sophus c++ library: <https://github.com/strasdat/Sophus>
//! - Ethan Eade course on Lie Groups for 2D and 3D transformations:
//!     - details: <http://ethaneade.com/lie.pdf>
//!     - summary: <http://ethaneade.com/lie_groups.pdf>

use nalgebra::Translation3;

use crate::math::so3::{self, EPSILON_TAYLOR_SERIES_2};
use crate::misc::type_aliases::{Float, Iso3, Mat3, Mat4, Vec3, Vec6};

const _1_6: Float = 1.0 / 6.0;
const _1_12: Float = 1.0 / 12.0;
const _1_24: Float = 1.0 / 24.0;
const _1_120: Float = 1.0 / 120.0;
const _1_720: Float = 1.0 / 720.0;

/// Parameterization of a twist (element of se3).
pub type Twist = Vec6;

/// Retrieve the angular velocity part of the twist parameterization.
pub fn angular_velocity(xi: Twist) -> Vec3 {
    Vec3::new(xi[0], xi[1], xi[2])
}

/// Retrieve the linear velocity part of the twist parameterization.
pub fn linear_velocity(xi: Twist) -> Vec3 {
    Vec3::new(xi[3], xi[4], xi[5])
}

/// Hat operator.
/// Goes from se3 parameters to se3 element (4x4 matrix).
#[rustfmt::skip]
pub fn hat(xi: Twist) -> Mat4 {
    let w1 = xi[0];
    let w2 = xi[1];
    let w3 = xi[2];
    Mat4::new(
         0.0,  -w3,    w2,   xi[3],
         w3,    0.0,  -w1,   xi[4],
        -w2,    w1,    0.0,  xi[5],
         0.0,   0.0,   0.0,  0.0,
    )
}

/// Vee operator. Inverse of hat operator.
/// Warning! does not check that the given top left 3x3 sub-matrix is skew-symmetric.
pub fn vee(mat: Mat4) -> Twist {
    Vec6::new(mat.m32, mat.m13, mat.m21, mat.m14, mat.m24, mat.m34)
}

/// Compute the exponential map from Lie algebra se3 to Lie group SE3.
/// Goes from se3 parameterization to SE3 element (rigid body motion).
pub fn exp(xi: Twist) -> Iso3 {
    let xi_w = angular_velocity(xi);
    let xi_v = linear_velocity(xi);
    let theta_2 = xi_w.norm_squared();
    let (coef_omega, coef_omega_2) = if theta_2 < EPSILON_TAYLOR_SERIES_2 {
        (0.5 - _1_24 * theta_2, _1_6 - _1_120 * theta_2) // TAYLOR
    } else {
        let theta = theta_2.sqrt();
        (
            (1.0 - theta.cos()) / theta_2,
            (theta - theta.sin()) / (theta * theta_2),
        )
    };
    let v = Mat3::identity() + coef_omega * so3::hat(xi_w) + coef_omega_2 * so3::hat_2(xi_w);
    Iso3::from_parts(Translation3::from(v * xi_v), so3::exp(xi_w))
}

/// Compute the logarithm map from the Lie group SE3 to the Lie algebra se3.
/// Inverse of the exponential map.
pub fn log(iso: Iso3) -> Twist {
    let w = so3::log(iso.rotation);
    let theta_2 = w.norm_squared();
    let coef_omega_2 = if theta_2 < EPSILON_TAYLOR_SERIES_2 {
        _1_12 + _1_720 * theta_2 // TAYLOR
    } else {
        let theta = theta_2.sqrt();
        let half_theta = 0.5 * theta;
        (1.0 - half_theta * half_theta.cos() / half_theta.sin()) / theta_2
    };
    let v_inv = Mat3::identity() - 0.5 * so3::hat(w) + coef_omega_2 * so3::hat_2(w);
    let xi_v = v_inv * iso.translation.vector;
    Vec6::new(w[0], w[1], w[2], xi_v[0], xi_v[1], xi_v[2])
}

// TESTS #############################################################

#[cfg(test)]
mod tests {

    use super::*;
    use nalgebra::UnitQuaternion;
    use quickcheck::TestResult;

    // Round trips on bounded random inputs stay around 1e-4.
    const EPSILON_ROUNDTRIP_APPROX: Float = 1e-4;

    #[test]
    fn exp_log_round_trip() {
        let xi = Vec6::zeros();
        assert_eq!(xi, log(exp(xi)));
    }

    #[test]
    fn exp_of_pure_translation() {
        let xi = Vec6::new(0.0, 0.0, 0.0, 0.1, -0.2, 0.3);
        let motion = exp(xi);
        assert_eq!(motion.rotation, UnitQuaternion::identity());
        approx::assert_relative_eq!(motion.translation.vector, Vec3::new(0.1, -0.2, 0.3));
    }

    #[test]
    fn exp_rotation_comes_first() {
        let xi = Vec6::new(0.0, 0.0, 0.3, 0.0, 0.0, 0.0);
        let motion = exp(xi);
        approx::assert_relative_eq!(motion.rotation.angle(), 0.3, epsilon = 1e-6);
        approx::assert_relative_eq!(motion.translation.vector, Vec3::zeros());
    }

    #[test]
    fn exp_matches_first_order_hat_for_small_twists() {
        let xi = Vec6::new(1e-4, -2e-4, 3e-4, 1e-3, 2e-3, -1e-3);
        let first_order = Mat4::identity() + hat(xi);
        approx::assert_relative_eq!(exp(xi).to_homogeneous(), first_order, epsilon = 2e-6);
    }

    // PROPERTY TESTS ################################################

    #[quickcheck_macros::quickcheck]
    fn hat_vee_roundtrip(w1: Float, w2: Float, w3: Float, v1: Float, v2: Float, v3: Float) -> bool {
        let xi = Vec6::new(w1, w2, w3, v1, v2, v3);
        xi.iter().any(|x| !x.is_finite()) || xi == vee(hat(xi))
    }

    #[quickcheck_macros::quickcheck]
    fn log_exp_round_trip(
        t1: Float,
        t2: Float,
        t3: Float,
        a1: Float,
        a2: Float,
        a3: Float,
    ) -> TestResult {
        if [t1, t2, t3, a1, a2, a3].iter().any(|x| !x.is_finite()) {
            return TestResult::discard();
        }
        let rigid_motion = gen_rigid_motion(t1 % 2.0, t2 % 2.0, t3 % 2.0, a1, a2, a3);
        TestResult::from_bool(approx::relative_eq!(
            rigid_motion,
            exp(log(rigid_motion)),
            epsilon = EPSILON_ROUNDTRIP_APPROX
        ))
    }

    // GENERATORS ####################################################

    fn gen_rigid_motion(t1: Float, t2: Float, t3: Float, a1: Float, a2: Float, a3: Float) -> Iso3 {
        let translation = Translation3::from(Vec3::new(t1, t2, t3));
        let rotation = UnitQuaternion::from_euler_angles(a1 % 1.0, a2 % 1.0, a3 % 1.0);
        Iso3::from_parts(translation, rotation)
    }
}
