// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Resolution of the Gauss-Newton normal equations of one iteration.

use nalgebra::Cholesky;

use crate::core::error::SolveError;
use crate::math::{accumulator::NormalEquations, se3};
use crate::misc::type_aliases::{Iso3, Vec6, Vec6d};

/// Thresholds deciding whether a system can be trusted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverParams {
    /// Systems with fewer valid correspondences are degenerate.
    pub min_inliers: usize,
    /// Systems with a higher condition number are rejected.
    pub max_condition_number: f64,
}

/// Solve `JtJ * delta = -Jtr` for the twist increment `delta` (rotation first).
pub fn solve_twist(params: &SolverParams, equations: &NormalEquations) -> Result<Vec6d, SolveError> {
    let inliers = equations.inliers();
    if inliers < params.min_inliers.max(1) {
        return Err(SolveError::Degenerate { inliers });
    }

    let jtj = equations.jtj();
    let eigenvalues = jtj.symmetric_eigenvalues();
    let lambda_min = eigenvalues.min();
    let lambda_max = eigenvalues.max();
    if !(lambda_min > 0.0 && lambda_max.is_finite()) {
        return Err(SolveError::IllConditioned {
            condition: f64::INFINITY,
        });
    }
    let condition = lambda_max / lambda_min;
    if condition > params.max_condition_number {
        return Err(SolveError::IllConditioned { condition });
    }

    let delta = Cholesky::new(jtj)
        .ok_or(SolveError::Singular)?
        .solve(&(-*equations.jtr()));
    if delta.iter().all(|x| x.is_finite()) {
        Ok(delta)
    } else {
        Err(SolveError::Singular)
    }
}

/// Solve the normal equations and map the twist increment to a rigid transform.
pub fn solve(params: &SolverParams, equations: &NormalEquations) -> Result<Iso3, SolveError> {
    let delta: Vec6 = solve_twist(params, equations)?.cast();
    Ok(se3::exp(delta))
}

// TESTS #############################################################

#[cfg(test)]
mod tests {

    use super::*;
    use crate::misc::type_aliases::Float;

    const PARAMS: SolverParams = SolverParams {
        min_inliers: 6,
        max_condition_number: 1e12,
    };

    /// Normal equations of the linear problem `J * delta = b`, one inlier per row.
    fn linear_problem(rows: &[(Vec6, Float)]) -> NormalEquations {
        let mut equations = NormalEquations::new();
        for (jac, b) in rows {
            // residual r = J * 0 - b
            equations.add_residual(jac, -b);
            equations.count_inlier();
        }
        equations
    }

    fn canonical_rows(delta: &Vec6) -> Vec<(Vec6, Float)> {
        (0..6)
            .map(|i| {
                let mut jac = Vec6::zeros();
                jac[i] = 1.0 + i as Float;
                jac[(i + 1) % 6] = 0.5;
                (jac, jac.dot(delta))
            })
            .collect()
    }

    #[test]
    fn recovers_the_least_squares_solution() {
        let delta = Vec6::new(0.01, -0.02, 0.005, 0.1, 0.0, -0.05);
        let equations = linear_problem(&canonical_rows(&delta));
        let solution = solve_twist(&PARAMS, &equations).unwrap();
        approx::assert_relative_eq!(solution, delta.cast::<f64>(), epsilon = 1e-6);
    }

    #[test]
    fn solution_is_mapped_by_the_exponential() {
        let delta = Vec6::new(0.01, -0.02, 0.005, 0.1, 0.0, -0.05);
        let equations = linear_problem(&canonical_rows(&delta));
        let transform = solve(&PARAMS, &equations).unwrap();
        approx::assert_relative_eq!(
            transform.to_homogeneous(),
            se3::exp(delta).to_homogeneous(),
            epsilon = 1e-5
        );
    }

    #[test]
    fn too_few_inliers_is_degenerate() {
        let equations = linear_problem(&canonical_rows(&Vec6::zeros())[..5]);
        assert_eq!(
            solve(&PARAMS, &equations),
            Err(SolveError::Degenerate { inliers: 5 })
        );
        assert_eq!(
            solve(&PARAMS, &NormalEquations::new()),
            Err(SolveError::Degenerate { inliers: 0 })
        );
    }

    #[test]
    fn rank_deficient_system_is_rejected() {
        // Only the translation along z is constrained.
        let jac = Vec6::new(0.0, 0.0, 0.0, 0.0, 0.0, 1.0);
        let equations = linear_problem(&[(jac, 0.1); 10]);
        match solve(&PARAMS, &equations) {
            Err(SolveError::IllConditioned { .. }) | Err(SolveError::Singular) => (),
            other => panic!("unexpected solver result: {:?}", other),
        }
    }

    #[test]
    fn condition_number_threshold() {
        let delta = Vec6::new(0.01, -0.02, 0.005, 0.1, 0.0, -0.05);
        let mut rows = canonical_rows(&delta);
        // Make one direction much weaker than the others.
        rows[2].0 *= 1e-4;
        rows[2].1 *= 1e-4;
        let equations = linear_problem(&rows);
        let strict = SolverParams {
            max_condition_number: 1e3,
            ..PARAMS
        };
        assert!(matches!(
            solve(&strict, &equations),
            Err(SolveError::IllConditioned { .. })
        ));
        assert!(solve(&PARAMS, &equations).is_ok());
    }
}
