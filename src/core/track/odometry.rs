// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Multi-scale dense RGB-D odometry between two frames.
//!
//! The source-to-target transform is refined from the coarsest pyramid level
//! to the finest, with a fixed number of Gauss-Newton iterations per level.
//! Each increment is applied on the left of the current estimate:
//! `T <- exp(delta) * T`.

use log::{debug, warn};
use thiserror::Error;

use crate::core::{
    camera::Intrinsics,
    config::{ConfigError, OdometryConfig},
    error::{FrameError, OdometryError},
    frame::RgbdFrame,
    pyramid::FramePyramid,
    track::{
        evaluator::{Correspondence, Evaluator},
        reduction::{self, Parallel, Reduction},
        solver::{self, SolverParams},
    },
};
use crate::misc::type_aliases::{Iso3, Levels, Mat4};

/// State of the odometry for the current frame pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No frame pair.
    Idle,
    /// Pyramids are ready, waiting for `compute_multi_scale`.
    Initializing,
    RunningLevel { level: usize, iteration: usize },
    Done,
    Failed,
}

/// Diagnostic of one iteration, evaluated before applying its increment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationReport {
    /// Sum of the weighted squared residuals.
    pub loss: f64,
    pub inliers: usize,
}

impl IterationReport {
    /// Loss per valid correspondence.
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_loss(&self) -> f64 {
        if self.inliers == 0 {
            0.0
        } else {
            self.loss / self.inliers as f64
        }
    }
}

/// Diagnostic of all the iterations run at one pyramid level.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelReport {
    pub level: usize,
    pub iterations: Vec<IterationReport>,
    /// Estimate at the end of this level.
    pub transform: Iso3,
}

/// Result of the odometry: the source-to-target transform and the iterations trace,
/// from the coarsest level to the finest.
#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    pub transform: Iso3,
    pub trace: Vec<LevelReport>,
}

impl Estimate {
    /// 4x4 homogeneous source-to-target matrix.
    pub fn matrix(&self) -> Mat4 {
        self.transform.to_homogeneous()
    }

    /// Loss of every iteration, grouped by level.
    pub fn losses(&self) -> Vec<Vec<f64>> {
        self.trace
            .iter()
            .map(|level| level.iterations.iter().map(|it| it.loss).collect())
            .collect()
    }
}

/// An aborted odometry attempt, with the best estimate found before the abort.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("odometry aborted: {error}")]
pub struct Failure {
    #[source]
    pub error: OdometryError,
    pub best: Estimate,
}

/// Dense RGB-D odometry, parameterized by the reduction strategy.
pub struct RgbdOdometry<R: Reduction = Parallel> {
    config: OdometryConfig,
    intrinsics_multires: Levels<Intrinsics>,
    solver_params: SolverParams,
    reduction: R,
    pyramids: Option<(FramePyramid, FramePyramid)>,
    seed: Iso3,
    transform: Iso3,
    phase: Phase,
}

impl RgbdOdometry<Parallel> {
    /// Create an odometry with a validated configuration
    /// and the intrinsics of the full resolution images.
    pub fn new(config: OdometryConfig, intrinsics: Intrinsics) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            intrinsics_multires: intrinsics.multi_res(config.nb_levels),
            solver_params: SolverParams {
                min_inliers: config.min_inliers,
                max_condition_number: config.max_condition_number,
            },
            config,
            reduction: Parallel,
            pyramids: None,
            seed: Iso3::identity(),
            transform: Iso3::identity(),
            phase: Phase::Idle,
        })
    }
}

impl<R: Reduction> RgbdOdometry<R> {
    /// Change the reduction strategy.
    pub fn with_reduction<S: Reduction>(self, reduction: S) -> RgbdOdometry<S> {
        RgbdOdometry {
            config: self.config,
            intrinsics_multires: self.intrinsics_multires,
            solver_params: self.solver_params,
            reduction,
            pyramids: self.pyramids,
            seed: self.seed,
            transform: self.transform,
            phase: self.phase,
        }
    }

    pub fn config(&self) -> &OdometryConfig {
        &self.config
    }

    /// Intrinsics at a given level (0 is the full resolution).
    pub fn intrinsics(&self, level: usize) -> Option<&Intrinsics> {
        self.intrinsics_multires.get(level)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current source-to-target estimate.
    pub fn transform(&self) -> Iso3 {
        self.transform
    }

    /// Prepare a new frame pair, starting from the identity transform.
    pub fn initialize(&mut self, source: &RgbdFrame, target: &RgbdFrame) -> Result<(), OdometryError> {
        self.initialize_with_seed(source, target, Iso3::identity())
    }

    /// Prepare a new frame pair, starting from a given source-to-target transform.
    pub fn initialize_with_seed(
        &mut self,
        source: &RgbdFrame,
        target: &RgbdFrame,
        seed: Iso3,
    ) -> Result<(), OdometryError> {
        self.release();
        let nb_levels = self.config.nb_levels;
        let source = FramePyramid::build(source, nb_levels)?;
        let target = FramePyramid::build(target, nb_levels)?.with_gradients();
        self.initialize_pyramids(source, target, seed)
    }

    /// Prepare a new pair of already built pyramids.
    /// Gradients of the target pyramid are computed if missing.
    pub fn initialize_pyramids(
        &mut self,
        source: FramePyramid,
        mut target: FramePyramid,
        seed: Iso3,
    ) -> Result<(), OdometryError> {
        self.release();
        let expected = self.config.nb_levels;
        for pyramid in &[&source, &target] {
            if pyramid.nb_levels() != expected {
                return Err(FrameError::LevelsMismatch {
                    nb_levels: pyramid.nb_levels(),
                    expected,
                }
                .into());
            }
        }
        let (width, height) = source.size();
        let (expected_width, expected_height) = target.size();
        if (width, height) != (expected_width, expected_height) {
            return Err(FrameError::IncompatibleSize {
                width,
                height,
                expected_width,
                expected_height,
            }
            .into());
        }
        target.compute_gradients();
        self.pyramids = Some((source, target));
        self.seed = seed;
        self.transform = seed;
        self.phase = Phase::Initializing;
        Ok(())
    }

    /// Give back the `(source, target)` pyramids of the current pair, if any.
    pub fn release(&mut self) -> Option<(FramePyramid, FramePyramid)> {
        self.phase = Phase::Idle;
        self.pyramids.take()
    }

    /// Run the coarse-to-fine estimation of the source-to-target transform.
    ///
    /// Can only be called once per initialized frame pair.
    /// The first failure to solve an iteration aborts the whole computation.
    pub fn compute_multi_scale(&mut self) -> Result<Estimate, Failure> {
        let (source, target) = match (&self.pyramids, self.phase) {
            (Some((source, target)), Phase::Initializing) => (source, target),
            _ => {
                return Err(Failure {
                    error: OdometryError::NotInitialized,
                    best: Estimate {
                        transform: self.transform,
                        trace: Vec::new(),
                    },
                })
            }
        };

        let mut transform = self.seed;
        let mut trace = Vec::with_capacity(self.config.nb_levels);
        for level in (0..self.config.nb_levels).rev() {
            let target_level = target.level(level);
            let gradients = match target_level.gradients() {
                Some(gradients) => gradients,
                None => {
                    return Err(Failure {
                        error: OdometryError::NotInitialized,
                        best: Estimate { transform, trace },
                    })
                }
            };
            let evaluator = Evaluator::new(
                &self.config,
                &self.intrinsics_multires[level],
                source.level(level),
                target_level,
                gradients,
            );

            let mut iterations = Vec::new();
            for iteration in 0..self.config.iterations_at_level(level) {
                self.phase = Phase::RunningLevel { level, iteration };
                let equations = reduction::normal_equations(&self.reduction, &evaluator, &transform);
                let report = IterationReport {
                    loss: equations.loss(),
                    inliers: equations.inliers(),
                };
                debug!(
                    "level {}, iteration {}: loss {:.6e}, avg loss {:.6e}, inliers {}",
                    level,
                    iteration,
                    report.loss,
                    report.avg_loss(),
                    report.inliers
                );
                iterations.push(report);

                match solver::solve(&self.solver_params, &equations) {
                    Ok(delta) => transform = delta * transform,
                    Err(error) => {
                        warn!(
                            "odometry aborted at level {}, iteration {}: {}",
                            level, iteration, error
                        );
                        trace.push(LevelReport {
                            level,
                            iterations,
                            transform,
                        });
                        self.transform = transform;
                        self.phase = Phase::Failed;
                        return Err(Failure {
                            error: OdometryError::Solve {
                                level,
                                iteration,
                                source: error,
                            },
                            best: Estimate { transform, trace },
                        });
                    }
                }
            }
            trace.push(LevelReport {
                level,
                iterations,
                transform,
            });
        }

        self.transform = transform;
        self.phase = Phase::Done;
        Ok(Estimate { transform, trace })
    }

    /// Valid correspondences at one level for the current estimate.
    pub fn correspondences(&self, level: usize) -> Result<Vec<Correspondence>, OdometryError> {
        let (source, target) = self.pyramids.as_ref().ok_or(OdometryError::NotInitialized)?;
        let nb_levels = source.nb_levels();
        if level >= nb_levels {
            return Err(OdometryError::InvalidLevel { level, nb_levels });
        }
        let target_level = target.level(level);
        let gradients = target_level
            .gradients()
            .ok_or(OdometryError::NotInitialized)?;
        let evaluator = Evaluator::new(
            &self.config,
            &self.intrinsics_multires[level],
            source.level(level),
            target_level,
            gradients,
        );
        Ok(evaluator.correspondences(&self.transform))
    }
}

// TESTS #############################################################
