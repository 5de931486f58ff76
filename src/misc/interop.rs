// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Interoperability conversions between the image and matrix types.

use image::{GrayImage, ImageBuffer, Luma, RgbImage};
use nalgebra::DMatrix;

/// Convert a `GrayImage` into an `u8` matrix.
pub fn matrix_from_image(img: GrayImage) -> DMatrix<u8> {
    let (width, height) = img.dimensions();
    DMatrix::from_row_slice(height as usize, width as usize, &img.into_raw())
}

/// Convert a 16 bits gray image (typically a depth map) into an `u16` matrix.
pub fn matrix_from_depth_image(img: &ImageBuffer<Luma<u16>, Vec<u16>>) -> DMatrix<u16> {
    let (width, height) = img.dimensions();
    DMatrix::from_row_slice(height as usize, width as usize, img.as_raw())
}

/// Convert an `RgbImage` into an `(u8,u8,u8)` matrix.
///
/// Performs a transposition to accomodate for the
/// row major image into the column major matrix.
pub fn rgb_matrix_from_image(img: &RgbImage) -> DMatrix<(u8, u8, u8)> {
    let (width, height) = img.dimensions();
    DMatrix::from_fn(height as usize, width as usize, |y, x| {
        let [r, g, b] = img.get_pixel(x as u32, y as u32).0;
        (r, g, b)
    })
}

// TESTS #############################################################

#[cfg(test)]
mod tests {

    use super::*;
    use image::Rgb;

    #[test]
    fn gray_image_is_transposed() {
        let img = GrayImage::from_fn(3, 2, |x, y| Luma([(10 * x + 100 * y) as u8]));
        let mat = matrix_from_image(img);
        assert_eq!(mat.shape(), (2, 3));
        assert_eq!(mat[(1, 2)], 120);
        assert_eq!(mat[(0, 1)], 10);
    }

    #[test]
    fn depth_image_keeps_16_bits() {
        let img = ImageBuffer::from_fn(2, 2, |x, y| Luma([40000_u16 + (x + 2 * y) as u16]));
        let mat = matrix_from_depth_image(&img);
        assert_eq!(mat[(1, 0)], 40002);
        assert_eq!(mat[(0, 1)], 40001);
    }

    #[test]
    fn rgb_image_is_transposed() {
        let img = RgbImage::from_fn(2, 1, |x, _| Rgb([x as u8, 7, 9]));
        let mat = rgb_matrix_from_image(&img);
        assert_eq!(mat.shape(), (1, 2));
        assert_eq!(mat[(0, 1)], (1, 7, 9));
    }
}
