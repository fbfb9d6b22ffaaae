//! Linear operators for the variable-coefficient Poisson problem
//!
//! A [`LinearOperator`] solves
//!
//! $ (A \alpha - B \nabla \cdot (\beta \nabla)) x = f $
//!
//! for a cell-centred `x`. The coefficient `beta` is supplied at cell centres and
//! averaged onto faces by the operator, boundary data is read from the ghost cells
//! of a potential at configuration time.
//!
//! Two implementations are provided. [`PlainOperator`] covers the whole box, while
//! [`EmbeddedOperator`] removes the cells covered by an embedded body and imposes a
//! Dirichlet value on its surface. Both assemble a seven-point stencil into a
//! `CsrMatrix` and solve it with a Jacobi-preconditioned conjugate gradient.

mod assembler;
mod embedded;
mod krylov;
mod plain;

pub use embedded::*;
pub use plain::*;

use crate::boundary::BoundaryClassification;
use crate::LinearSolveError;
use ferrostat_mesher::Field;

/// Stopping criteria of a linear solve
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SolveTolerances {
    /// Target reduction of the residual norm relative to the norm of the right-hand side
    pub relative: f64,
    /// Target residual norm, ignored when zero
    pub absolute: f64,
}

impl Default for SolveTolerances {
    fn default() -> Self {
        Self {
            relative: crate::constants::LINEAR_RELATIVE_TOLERANCE,
            absolute: crate::constants::LINEAR_ABSOLUTE_TOLERANCE,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LinearSolveReport {
    pub iterations: usize,
    /// Final residual norm relative to the norm of the right-hand side
    pub residual: f64,
}

pub trait LinearOperator {
    /// Records the boundary types, the cell-centred coefficient `beta_cc` and the
    /// boundary data held in the ghost cells of `boundary_values`.
    ///
    /// `beta_cc` must have its ghost cells filled.
    fn configure(
        &mut self,
        boundaries: &BoundaryClassification,
        beta_cc: &Field,
        boundary_values: &Field,
    ) -> Result<(), LinearSolveError>;

    /// Sets the scalars `A` and `B`
    fn set_scalars(&mut self, a: f64, b: f64);

    /// Sets the cell-centred mass coefficient `alpha`
    fn set_mass_coefficient(&mut self, alpha: &Field);

    /// Solves for `x` using the valid cells of `x` as the initial guess.
    ///
    /// On success the valid cells of `x` hold the solution and its ghost cells are
    /// consistent with the boundary conditions.
    fn solve(
        &mut self,
        x: &mut Field,
        rhs: &Field,
        tolerances: SolveTolerances,
    ) -> Result<LinearSolveReport, LinearSolveError>;
}
