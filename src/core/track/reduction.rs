// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Reduction of the per-pixel contributions into one set of normal equations.
//!
//! Every source row is accumulated into its own partial sum,
//! and partial sums are added in row order.
//! The result is thus identical for all implementations of `Reduction`,
//! whatever the number of threads.

use rayon::prelude::*;

use crate::core::track::evaluator::Evaluator;
use crate::math::accumulator::NormalEquations;
use crate::misc::type_aliases::Iso3;

/// Strategy used to sum the contributions of all the rows of an image.
pub trait Reduction {
    /// Sum the contributions of rows `0..nb_rows`.
    /// `accumulate_row(y, accum)` adds the contributions of row `y` into `accum`.
    fn reduce<F>(&self, nb_rows: usize, accumulate_row: F) -> NormalEquations
    where
        F: Fn(usize, &mut NormalEquations) + Sync + Send;
}

/// Single threaded reduction.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequential;

/// Multi-threaded reduction on the rayon thread pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct Parallel;

impl Reduction for Sequential {
    fn reduce<F>(&self, nb_rows: usize, accumulate_row: F) -> NormalEquations
    where
        F: Fn(usize, &mut NormalEquations) + Sync + Send,
    {
        (0..nb_rows)
            .map(|y| row_sum(&accumulate_row, y))
            .fold(NormalEquations::new(), merge)
    }
}

impl Reduction for Parallel {
    fn reduce<F>(&self, nb_rows: usize, accumulate_row: F) -> NormalEquations
    where
        F: Fn(usize, &mut NormalEquations) + Sync + Send,
    {
        // Collecting keeps the row order, the final sum is done sequentially.
        let partial_sums: Vec<NormalEquations> = (0..nb_rows)
            .into_par_iter()
            .map(|y| row_sum(&accumulate_row, y))
            .collect();
        partial_sums.into_iter().fold(NormalEquations::new(), merge)
    }
}

/// Normal equations of all the valid correspondences for a given transform.
pub fn normal_equations<R: Reduction>(
    reduction: &R,
    evaluator: &Evaluator,
    transform: &Iso3,
) -> NormalEquations {
    reduction.reduce(evaluator.nb_rows(), |y, accum| {
        evaluator.accumulate_row(transform, y, accum)
    })
}

fn row_sum<F: Fn(usize, &mut NormalEquations)>(accumulate_row: &F, y: usize) -> NormalEquations {
    let mut accum = NormalEquations::new();
    accumulate_row(y, &mut accum);
    accum
}

fn merge(mut total: NormalEquations, partial: NormalEquations) -> NormalEquations {
    total.add(&partial);
    total
}

// TESTS #############################################################

#[cfg(test)]
mod tests {

    use super::*;
    use crate::core::pyramid::FramePyramid;
    use crate::math::se3;
    use crate::misc::type_aliases::{Float, Vec6};
    use crate::test_utils;

    /// Arbitrary but reproducible row contributions.
    #[allow(clippy::cast_precision_loss)]
    fn pseudo_row(y: usize, accum: &mut NormalEquations) {
        for x in 0..17 {
            let t = (y * 17 + x) as Float;
            let jac = Vec6::new(t.sin(), t.cos(), 0.1 * t, 1.0 / (1.0 + t), -0.3, (0.7 * t).sin());
            accum.add_residual(&jac, (1.3 * t).cos());
            accum.count_inlier();
        }
    }

    #[test]
    fn empty_image_reduces_to_zero() {
        assert_eq!(Parallel.reduce(0, pseudo_row), NormalEquations::new());
        assert_eq!(Sequential.reduce(0, pseudo_row), NormalEquations::new());
    }

    #[test]
    fn parallel_and_sequential_are_identical() {
        let sequential = Sequential.reduce(300, pseudo_row);
        let parallel = Parallel.reduce(300, pseudo_row);
        assert_eq!(sequential, parallel);
        assert_eq!(parallel.inliers(), 300 * 17);
    }

    #[test]
    fn parallel_is_deterministic() {
        let first = Parallel.reduce(500, pseudo_row);
        for _ in 0..5 {
            assert_eq!(Parallel.reduce(500, pseudo_row), first);
        }
    }

    #[test]
    fn reduction_of_a_real_frame_pair() {
        let motion = se3::exp(Vec6::new(0.0, 0.003, 0.0, 0.01, 0.0, 0.0));
        let (intrinsics, source, target) = test_utils::tilted_plane_pair(&motion);
        let config = test_utils::synthetic_config(vec![1]);
        let source = FramePyramid::build(&source, 1).unwrap();
        let target = FramePyramid::build(&target, 1).unwrap().with_gradients();
        let target_level = target.level(0);
        let evaluator = Evaluator::new(
            &config,
            &intrinsics,
            source.level(0),
            target_level,
            target_level.gradients().unwrap(),
        );
        let transform = Iso3::identity();
        let sequential = normal_equations(&Sequential, &evaluator, &transform);
        let parallel = normal_equations(&Parallel, &evaluator, &transform);
        assert_eq!(sequential, parallel);
        assert!(parallel.inliers() > 0);
        assert!(parallel.loss() > 0.0);
    }
}
