// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Synthetic RGB-D frames of a textured tilted plane, for tests.

use nalgebra::DMatrix;

use crate::core::{camera::Intrinsics, config::OdometryConfig, frame::RgbdFrame};
use crate::misc::type_aliases::{Float, Iso3, Point2, Point3, Vec3};

pub const WIDTH: usize = 128;
pub const HEIGHT: usize = 96;

/// The plane is `{ X | n . X = PLANE_OFFSET }` in the reference camera frame.
const PLANE_NORMAL: [Float; 3] = [0.2, -0.1, 1.0];
const PLANE_OFFSET: Float = 1.5;

pub fn intrinsics() -> Intrinsics {
    Intrinsics {
        focal: (100.0, 100.0),
        principal_point: (64.0, 48.0),
    }
}

/// Configuration with one level per iteration count.
pub fn synthetic_config(iterations_per_level: Vec<usize>) -> OdometryConfig {
    OdometryConfig {
        nb_levels: iterations_per_level.len(),
        iterations_per_level,
        max_depth_diff: 0.07,
        ..OdometryConfig::default()
    }
}

/// Smooth intensity painted on the plane, in [0.05, 0.95].
pub fn texture(point: &Point3) -> Float {
    0.5 + 0.2 * (9.0 * point.x + 1.3).sin()
        + 0.2 * (7.0 * point.y - 0.4).cos()
        + 0.05 * (5.0 * (point.x + point.y)).sin()
}

/// Render the plane seen by a camera whose pose in the reference frame is `camera_to_reference`.
#[allow(clippy::cast_precision_loss)]
pub fn render(camera_to_reference: &Iso3) -> RgbdFrame {
    let intrinsics = intrinsics();
    let normal = Vec3::from(PLANE_NORMAL);
    let center = camera_to_reference.translation.vector;
    let mut depth = DMatrix::zeros(HEIGHT, WIDTH);
    let mut intensity = DMatrix::zeros(HEIGHT, WIDTH);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            // Ray with a unit z coordinate, so that its scale is the depth.
            let ray = intrinsics
                .back_project(Point2::new(x as Float, y as Float), 1.0)
                .coords;
            let ray_reference = camera_to_reference.rotation * ray;
            let z = (PLANE_OFFSET - normal.dot(&center)) / normal.dot(&ray_reference);
            depth[(y, x)] = z;
            intensity[(y, x)] = texture(&Point3::from(center + z * ray_reference));
        }
    }
    RgbdFrame::new(depth, intensity).unwrap()
}

/// Source and target frames of a known source-to-target motion,
/// the target camera being the reference.
pub fn tilted_plane_pair(source_to_target: &Iso3) -> (Intrinsics, RgbdFrame, RgbdFrame) {
    (
        intrinsics(),
        render(source_to_target),
        render(&Iso3::identity()),
    )
}

/// Fronto-parallel plane without any texture.
pub fn textureless_frame() -> RgbdFrame {
    RgbdFrame::new(
        DMatrix::repeat(HEIGHT, WIDTH, 1.5),
        DMatrix::repeat(HEIGHT, WIDTH, 0.5),
    )
    .unwrap()
}

/// RMS distance between the source points moved by `estimate` and by `truth`.
#[allow(clippy::cast_precision_loss)]
pub fn rms_distance(source: &RgbdFrame, intrinsics: &Intrinsics, estimate: &Iso3, truth: &Iso3) -> Float {
    let mut sum = 0.0;
    let mut count = 0;
    for y in (0..source.height()).step_by(4) {
        for x in (0..source.width()).step_by(4) {
            let z = source.depth()[(y, x)];
            if z > 0.0 {
                let point = intrinsics.back_project(Point2::new(x as Float, y as Float), z);
                sum += (estimate * point - truth * point).norm_squared();
                count += 1;
            }
        }
    }
    (sum / count as Float).sqrt()
}
