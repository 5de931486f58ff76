// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Multi-resolution pyramids of RGB-D frames.

use itertools::izip;
use nalgebra::DMatrix;

use crate::core::{error::FrameError, frame::RgbdFrame, gradient, multires};
use crate::misc::type_aliases::{Float, Levels};

/// Depth neighbors further than this (in meters) are not blended by the smoothing.
pub const DEPTH_EDGE_THRESHOLD: Float = 0.1;

/// Horizontal and vertical gradients of one pyramid level.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradients {
    pub intensity_x: DMatrix<Float>,
    pub intensity_y: DMatrix<Float>,
    pub depth_x: DMatrix<Float>,
    pub depth_y: DMatrix<Float>,
}

/// Smoothed depth and intensity at one resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct PyramidLevel {
    pub depth: DMatrix<Float>,
    pub intensity: DMatrix<Float>,
    gradients: Option<Gradients>,
}

impl PyramidLevel {
    pub fn width(&self) -> usize {
        self.depth.ncols()
    }

    pub fn height(&self) -> usize {
        self.depth.nrows()
    }

    /// Gradients are only available for target pyramids.
    pub fn gradients(&self) -> Option<&Gradients> {
        self.gradients.as_ref()
    }

    fn compute_gradients(&mut self) {
        if self.gradients.is_none() {
            let (intensity_x, intensity_y) = gradient::sobel(&self.intensity);
            let (depth_x, depth_y) = gradient::sobel_depth(&self.depth);
            self.gradients = Some(Gradients {
                intensity_x,
                intensity_y,
                depth_x,
                depth_y,
            });
        }
    }
}

/// Pyramid of an RGB-D frame, level 0 being the full resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePyramid {
    levels: Levels<PyramidLevel>,
}

impl FramePyramid {
    /// Build `nb_levels` levels by repeatedly halving the frame resolution.
    /// Every level is smoothed with a 3x3 Gaussian (validity preserving for depth).
    pub fn build(frame: &RgbdFrame, nb_levels: usize) -> Result<Self, FrameError> {
        let too_small = FrameError::TooSmall {
            nb_levels,
            width: frame.width(),
            height: frame.height(),
        };
        if nb_levels == 0 {
            return Err(too_small);
        }
        let depth_multires = multires::depth_pyramid(nb_levels, frame.depth().clone());
        let intensity_multires = multires::mean_pyramid(nb_levels, frame.intensity().clone());
        if depth_multires.len() < nb_levels {
            return Err(too_small);
        }
        let levels = izip!(&depth_multires, &intensity_multires)
            .map(|(depth, intensity)| PyramidLevel {
                depth: gradient::gaussian_depth(depth, DEPTH_EDGE_THRESHOLD),
                intensity: gradient::gaussian(intensity),
                gradients: None,
            })
            .collect();
        Ok(Self { levels })
    }

    /// Compute the gradients required by a pyramid used as odometry target.
    pub fn with_gradients(mut self) -> Self {
        self.compute_gradients();
        self
    }

    /// Compute the gradients of all levels, if not already done.
    pub fn compute_gradients(&mut self) {
        self.levels.iter_mut().for_each(PyramidLevel::compute_gradients);
    }

    pub fn has_gradients(&self) -> bool {
        self.levels.iter().all(|level| level.gradients.is_some())
    }

    pub fn nb_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn level(&self, level: usize) -> &PyramidLevel {
        &self.levels[level]
    }

    pub fn levels(&self) -> &[PyramidLevel] {
        &self.levels
    }

    /// `(width, height)` at full resolution.
    pub fn size(&self) -> (usize, usize) {
        (self.levels[0].width(), self.levels[0].height())
    }
}

// TESTS #############################################################
