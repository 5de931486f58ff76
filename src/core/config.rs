// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Configuration of the multi-scale RGB-D odometry.

use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use thiserror::Error;

use crate::misc::type_aliases::Float;

/// Invalid configuration values, or a configuration file that cannot be loaded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("at least one pyramid level is required")]
    NoLevel,
    #[error("{nb_iterations} iteration counts given for {nb_levels} pyramid levels")]
    IterationsMismatch {
        nb_levels: usize,
        nb_iterations: usize,
    },
    #[error("depth range [{min_depth}, {max_depth}] is empty or negative")]
    DepthRange { min_depth: Float, max_depth: Float },
    #[error("maximum depth difference must be positive, got {0}")]
    DepthDiff(Float),
    #[error("sigma must be in [0, 1], got {0}")]
    Sigma(Float),
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },
    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}

/// Configuration of the odometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OdometryConfig {
    /// Number of levels in the multi-resolution pyramids of images.
    pub nb_levels: usize,
    /// Fixed number of iterations at each level, from the coarsest to the finest.
    pub iterations_per_level: Vec<usize>,
    /// Target depths closer than this are not used.
    pub min_depth: Float,
    /// Target depths further than this are not used.
    pub max_depth: Float,
    /// Maximum depth difference between a warped source point and its target match.
    pub max_depth_diff: Float,
    /// Trade-off between depth (sigma) and intensity (1 - sigma) residuals.
    pub sigma: Float,
    /// An iteration with fewer valid correspondences is degenerate.
    pub min_inliers: usize,
    /// Normal equations with a higher (estimated) condition number are rejected.
    pub max_condition_number: f64,
}

impl Default for OdometryConfig {
    fn default() -> Self {
        Self {
            nb_levels: 3,
            iterations_per_level: vec![20, 10, 5],
            min_depth: 0.0,
            max_depth: 4.0,
            max_depth_diff: 0.03,
            sigma: 0.5,
            min_inliers: 6,
            max_condition_number: 1e12,
        }
    }
}

impl OdometryConfig {
    /// Check the consistency of all the parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nb_levels == 0 {
            return Err(ConfigError::NoLevel);
        }
        if self.iterations_per_level.len() != self.nb_levels {
            return Err(ConfigError::IterationsMismatch {
                nb_levels: self.nb_levels,
                nb_iterations: self.iterations_per_level.len(),
            });
        }
        if !(self.min_depth >= 0.0 && self.min_depth < self.max_depth) {
            return Err(ConfigError::DepthRange {
                min_depth: self.min_depth,
                max_depth: self.max_depth,
            });
        }
        if !(self.max_depth_diff > 0.0) {
            return Err(ConfigError::DepthDiff(self.max_depth_diff));
        }
        if !(0.0..=1.0).contains(&self.sigma) {
            return Err(ConfigError::Sigma(self.sigma));
        }
        Ok(())
    }

    /// Number of iterations to run at a given level (0 is the finest).
    pub fn iterations_at_level(&self, level: usize) -> usize {
        self.iterations_per_level[self.nb_levels - 1 - level]
    }

    /// Weight applied to the depth residuals and jacobians.
    pub fn depth_weight(&self) -> Float {
        self.sigma.sqrt()
    }

    /// Weight applied to the intensity residuals and jacobians.
    pub fn intensity_weight(&self) -> Float {
        (1.0 - self.sigma).sqrt()
    }
}

/// Read and validate a JSON configuration file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<OdometryConfig, ConfigError> {
    let path = path.as_ref();
    let data = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let config: OdometryConfig = serde_json::from_str(&data).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    config.validate()?;
    Ok(config)
}

// TESTS #############################################################
