// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Dense multi-scale RGB-D odometry.
//!
//! Estimates the rigid transform between two RGB-D frames by jointly minimizing
//! photometric (intensity) and geometric (depth) reprojection errors,
//! from the coarsest to the finest level of image pyramids.
//!
//! ```ignore
//! use rgbd_odometry_rs::core::{camera::Intrinsics, config::OdometryConfig};
//! use rgbd_odometry_rs::core::track::odometry::RgbdOdometry;
//!
//! let mut odometry = RgbdOdometry::new(OdometryConfig::default(), Intrinsics::prime_sense_default())?;
//! odometry.initialize(&source_frame, &target_frame)?;
//! let estimate = odometry.compute_multi_scale()?;
//! println!("{}", estimate.matrix());
//! ```

pub mod core;
pub mod math;
pub mod misc;

#[cfg(test)]
pub(crate) mod test_utils;
