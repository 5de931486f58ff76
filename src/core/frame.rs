// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! RGB-D frames, the raw input of the odometry.
//!
//! Matrices are indexed as `(row, column)`, i.e. `(y, x)`,
//! so a `width x height` image is a matrix with `height` rows.

use image::{GrayImage, ImageBuffer, Luma, RgbImage};
use nalgebra::DMatrix;
use num_traits::AsPrimitive;

use crate::core::error::FrameError;
use crate::misc::interop;
use crate::misc::type_aliases::Float;

/// A depth value is valid if it is finite and strictly positive.
/// Invalid depths are stored as 0.
#[inline]
pub fn is_valid_depth(depth: Float) -> bool {
    depth > 0.0 && depth.is_finite()
}

/// Gray level in [0,1] of an RGB color.
pub fn intensity_from_rgb((r, g, b): (u8, u8, u8)) -> Float {
    (0.299 * Float::from(r) + 0.587 * Float::from(g) + 0.114 * Float::from(b)) / 255.0
}

/// A metric depth map and its registered intensity image.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbdFrame {
    depth: DMatrix<Float>,
    intensity: DMatrix<Float>,
}

impl RgbdFrame {
    /// Create a frame from a depth map in meters and an intensity image in [0,1].
    /// Non-finite and negative depths are replaced by the invalid value 0.
    pub fn new(depth: DMatrix<Float>, intensity: DMatrix<Float>) -> Result<Self, FrameError> {
        let (height, width) = depth.shape();
        let (intensity_height, intensity_width) = intensity.shape();
        if width == 0 || height == 0 {
            return Err(FrameError::Empty { width, height });
        }
        if (width, height) != (intensity_width, intensity_height) {
            return Err(FrameError::SizeMismatch {
                depth_width: width,
                depth_height: height,
                intensity_width,
                intensity_height,
            });
        }
        let depth = depth.map(|z| if is_valid_depth(z) { z } else { 0.0 });
        Ok(Self { depth, intensity })
    }

    /// Create a frame from raw sensor values.
    ///
    /// Depth values are divided by `depth_scale` (5000.0 for the TUM RGB-D dataset)
    /// and depths further than `depth_trunc` meters are invalidated.
    /// Gray levels are normalized into [0,1].
    pub fn from_raw<T>(
        depth: &DMatrix<T>,
        depth_scale: Float,
        depth_trunc: Float,
        gray: &DMatrix<u8>,
    ) -> Result<Self, FrameError>
    where
        T: AsPrimitive<Float> + nalgebra::Scalar,
    {
        let intensity = gray.map(|g| Float::from(g) / 255.0);
        Self::new(scale_depth(depth, depth_scale, depth_trunc), intensity)
    }

    /// Same as `from_raw` but with an RGB color image.
    pub fn from_raw_rgb<T>(
        depth: &DMatrix<T>,
        depth_scale: Float,
        depth_trunc: Float,
        color: &DMatrix<(u8, u8, u8)>,
    ) -> Result<Self, FrameError>
    where
        T: AsPrimitive<Float> + nalgebra::Scalar,
    {
        let intensity = color.map(intensity_from_rgb);
        Self::new(scale_depth(depth, depth_scale, depth_trunc), intensity)
    }

    /// Create a frame from a 16 bits depth image and an RGB image.
    pub fn from_images(
        depth: &ImageBuffer<Luma<u16>, Vec<u16>>,
        color: &RgbImage,
        depth_scale: Float,
        depth_trunc: Float,
    ) -> Result<Self, FrameError> {
        Self::from_raw_rgb(
            &interop::matrix_from_depth_image(depth),
            depth_scale,
            depth_trunc,
            &interop::rgb_matrix_from_image(color),
        )
    }

    /// Create a frame from a 16 bits depth image and a gray image.
    pub fn from_gray_image(
        depth: &ImageBuffer<Luma<u16>, Vec<u16>>,
        gray: GrayImage,
        depth_scale: Float,
        depth_trunc: Float,
    ) -> Result<Self, FrameError> {
        Self::from_raw(
            &interop::matrix_from_depth_image(depth),
            depth_scale,
            depth_trunc,
            &interop::matrix_from_image(gray),
        )
    }

    pub fn width(&self) -> usize {
        self.depth.ncols()
    }

    pub fn height(&self) -> usize {
        self.depth.nrows()
    }

    /// Depth map in meters, 0 where unknown.
    pub fn depth(&self) -> &DMatrix<Float> {
        &self.depth
    }

    /// Intensity image in [0,1].
    pub fn intensity(&self) -> &DMatrix<Float> {
        &self.intensity
    }
}

fn scale_depth<T>(depth: &DMatrix<T>, depth_scale: Float, depth_trunc: Float) -> DMatrix<Float>
where
    T: AsPrimitive<Float> + nalgebra::Scalar,
{
    depth.map(|raw| {
        let z = raw.as_() / depth_scale;
        if z > depth_trunc {
            0.0
        } else {
            z
        }
    })
}

// TESTS #############################################################
