// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Self-consistent electrostatics for ferroelectric heterostructures
//!
//! This crate solves the generalised Poisson equation
//!
//! $ -\nabla \cdot (\epsilon \nabla \phi) = \rho_{SC}(\phi) - \nabla \cdot (R^T P) $
//!
//! on a cell-centred structured grid. The source is the bound charge of a rotated
//! polarization field in the ferroelectric and the free carrier charge in the
//! semiconductor. The carrier charge depends nonlinearly on the potential, so each
//! pass of the self-consistent loop linearises it with a finite-difference Newton
//! step and hands the resulting linear problem to a [`LinearOperator`].
//!
//! The crate owns the orchestration and the per-cell kernels. The linear solver,
//! the carrier statistics and the boundary expressions are consumed through traits
//! so that alternative implementations can be dropped in.

pub mod boundary;
mod closure;
pub mod constants;
mod electric_field;
mod error;
mod expression;
mod materials;
mod newton;
pub mod operator;
mod permittivity;
mod rotation;
mod settings;
mod solve;
mod source;
mod steady_state;
mod stencil;

pub use closure::*;
pub use electric_field::*;
pub use error::*;
pub use expression::*;
pub use materials::*;
pub use newton::*;
pub use permittivity::*;
pub use rotation::*;
pub use settings::*;
pub use solve::*;
pub use source::*;
pub use steady_state::*;
pub use stencil::*;

/// The number of ghost layers carried by every field handed to the solver
pub const N_GHOST: usize = 1;
