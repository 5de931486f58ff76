// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Pairwise registration of RGB-D frames and frame to frame tracking.

pub mod evaluator;
pub mod odometry;
pub mod reduction;
pub mod sequential;
pub mod solver;
