// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error types of the odometry.

use thiserror::Error;

use crate::core::config::ConfigError;

/// Malformed or mismatched input images.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    #[error("frame has no pixel ({width}x{height})")]
    Empty { width: usize, height: usize },
    #[error("depth is {depth_width}x{depth_height} but intensity is {intensity_width}x{intensity_height}")]
    SizeMismatch {
        depth_width: usize,
        depth_height: usize,
        intensity_width: usize,
        intensity_height: usize,
    },
    #[error("a {width}x{height} frame cannot be downsampled into {nb_levels} pyramid levels")]
    TooSmall {
        nb_levels: usize,
        width: usize,
        height: usize,
    },
    #[error("frame is {width}x{height} but {expected_width}x{expected_height} was expected")]
    IncompatibleSize {
        width: usize,
        height: usize,
        expected_width: usize,
        expected_height: usize,
    },
    #[error("pyramid has {nb_levels} levels but {expected} were expected")]
    LevelsMismatch { nb_levels: usize, expected: usize },
}

/// Reasons for the linear system of one iteration to be unsolvable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    /// Not enough valid correspondences to constrain the 6 degrees of freedom.
    #[error("degenerate system with only {inliers} valid correspondences")]
    Degenerate { inliers: usize },
    #[error("singular normal equations")]
    Singular,
    #[error("ill-conditioned normal equations (condition number {condition:e})")]
    IllConditioned { condition: f64 },
}

/// Errors of the multi-scale odometry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OdometryError {
    #[error("invalid frame: {0}")]
    Frame(#[from] FrameError),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("odometry must be initialized with a frame pair first")]
    NotInitialized,
    #[error("level {level} does not exist in a pyramid of {nb_levels} levels")]
    InvalidLevel { level: usize, nb_levels: usize },
    #[error("no solution at level {level}, iteration {iteration}: {source}")]
    Solve {
        level: usize,
        iteration: usize,
        source: SolveError,
    },
}
