#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Threaded Mandelbrot renderer
//!
//! The Mandelbrot set is embarrassingly parallel: every pixel is a
//! point on the complex plane, and the number of iterations it takes
//! that point to escape depends on nothing but the point itself.  That
//! makes it a good vehicle for looking at how work gets divided among
//! threads, because the only interesting question left is *which*
//! thread computes *which* rows.
//!
//! Two static policies are provided.  Block partitioning hands each
//! thread one contiguous band of rows; it is simple, but the rows near
//! the middle of the set are far more expensive than the rows at the
//! edges, so some threads finish long before others.  Interleaved
//! partitioning hands thread `t` every row `r` with `r % n == t`, which
//! spreads the expensive rows evenly and is the default.
//!
//! Each worker writes only the rows it was assigned, so the output
//! buffer is split into disjoint row slices up front and no locking is
//! needed while rendering.

extern crate crossbeam;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate itertools;
#[macro_use]
extern crate log;
extern crate num;
extern crate num_cpus;

pub mod dispatch;
pub mod kernel;
pub mod planes;
pub mod planner;
pub mod report;

pub use dispatch::{run_mandelbrot, DispatchError, Dispatcher, ThreadCount, MAX_THREADS};
pub use planes::{ImageSpec, PlaneMapper, Viewport};
pub use planner::{Partition, WorkAssignment};
pub use report::{LogReporter, Phase, Reporter, Silent};
