// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Structured, cell-centred meshes for the electrostatic solver
//!
//! The mesher owns the geometry of the problem (cell counts, physical bounds and
//! periodicity) and the storage for cell-centred scalar fields. Each field carries
//! a fixed number of ghost layers which are used to hold boundary values and to
//! exchange halos across periodic directions.

mod face;
mod field;
mod generate;
mod grid;

pub use face::*;
pub use field::*;
pub use generate::*;
pub use grid::*;

/// The spatial dimension of every mesh produced by this crate
pub const SPACEDIM: usize = 3;

/// Trait for the geometry provider consumed by the solver kernels.
///
/// The solver only ever reads cell sizes, bounds and periodicity, so anything
/// able to answer these questions can stand in for the concrete `Grid`.
pub trait StructuredMesh {
    /// Number of valid cells along each axis
    fn n_cell(&self) -> [usize; SPACEDIM];
    /// Uniform cell size along each axis
    fn cell_size(&self) -> [f64; SPACEDIM];
    /// Lower corner of the physical domain
    fn prob_lo(&self) -> [f64; SPACEDIM];
    /// Upper corner of the physical domain
    fn prob_hi(&self) -> [f64; SPACEDIM];
    /// Whether the domain wraps along each axis
    fn periodicity(&self) -> [bool; SPACEDIM];

    fn is_periodic(&self, axis: usize) -> bool {
        self.periodicity()[axis]
    }

    fn number_of_cells(&self) -> usize {
        self.n_cell().iter().product()
    }
}

impl StructuredMesh for Grid {
    fn n_cell(&self) -> [usize; SPACEDIM] {
        self.n_cell
    }
    fn cell_size(&self) -> [f64; SPACEDIM] {
        let dx = self.dx();
        [dx.x, dx.y, dx.z]
    }
    fn prob_lo(&self) -> [f64; SPACEDIM] {
        [self.prob_lo.x, self.prob_lo.y, self.prob_lo.z]
    }
    fn prob_hi(&self) -> [f64; SPACEDIM] {
        [self.prob_hi.x, self.prob_hi.y, self.prob_hi.z]
    }
    fn periodicity(&self) -> [bool; SPACEDIM] {
        self.periodicity
    }
}
