// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Frame to frame tracking of a stream of RGB-D frames.
//!
//! Each new frame is registered (as source) against the previous one (as target),
//! and the camera pose is chained: `pose <- pose * T_source_to_target`.
//! Poses are expressed in the frame of the first camera.

use log::warn;

use crate::core::{
    camera::Intrinsics,
    config::{ConfigError, OdometryConfig},
    error::{FrameError, OdometryError},
    frame::RgbdFrame,
    pyramid::FramePyramid,
    track::{
        odometry::{Estimate, Failure, RgbdOdometry},
        reduction::{Parallel, Reduction},
    },
};
use crate::misc::type_aliases::Iso3;

/// Outcome of tracking one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The first frame defines the origin.
    First,
    Tracked(Estimate),
    /// The odometry failed and the previous pose was kept for this frame.
    Lost(Failure),
}

/// Tracker chaining pairwise odometry estimates.
pub struct Tracker<R: Reduction = Parallel> {
    odometry: RgbdOdometry<R>,
    previous: Option<FramePyramid>,
    pose: Iso3,
    trajectory: Vec<Iso3>,
}

impl Tracker<Parallel> {
    pub fn new(config: OdometryConfig, intrinsics: Intrinsics) -> Result<Self, ConfigError> {
        Ok(Self::with_odometry(RgbdOdometry::new(config, intrinsics)?))
    }
}

impl<R: Reduction> Tracker<R> {
    pub fn with_odometry(odometry: RgbdOdometry<R>) -> Self {
        Self {
            odometry,
            previous: None,
            pose: Iso3::identity(),
            trajectory: Vec::new(),
        }
    }

    /// Pose of the last tracked frame.
    pub fn pose(&self) -> Iso3 {
        self.pose
    }

    /// Poses of all the tracked frames, in order.
    pub fn trajectory(&self) -> &[Iso3] {
        &self.trajectory
    }

    /// Track a new frame.
    ///
    /// A frame rejected with an error is not part of the trajectory,
    /// and the next frame is tracked against the last accepted one.
    pub fn track(&mut self, frame: &RgbdFrame) -> Result<Step, OdometryError> {
        let current = FramePyramid::build(frame, self.odometry.config().nb_levels)?.with_gradients();
        let previous = match self.previous.take() {
            Some(previous) => previous,
            None => {
                self.previous = Some(current);
                self.trajectory.push(self.pose);
                return Ok(Step::First);
            }
        };

        let (width, height) = current.size();
        let (expected_width, expected_height) = previous.size();
        if (width, height) != (expected_width, expected_height) {
            self.previous = Some(previous);
            return Err(FrameError::IncompatibleSize {
                width,
                height,
                expected_width,
                expected_height,
            }
            .into());
        }

        self.odometry
            .initialize_pyramids(current, previous, Iso3::identity())?;
        let result = self.odometry.compute_multi_scale();
        // The current frame is the target of the next one.
        self.previous = self.odometry.release().map(|(source, _)| source);

        let step = match result {
            Ok(estimate) => {
                self.pose *= estimate.transform;
                Step::Tracked(estimate)
            }
            Err(failure) => {
                warn!(
                    "frame {} lost, keeping the previous pose: {}",
                    self.trajectory.len(),
                    failure.error
                );
                Step::Lost(failure)
            }
        };
        self.trajectory.push(self.pose);
        Ok(step)
    }
}

// TESTS #############################################################
