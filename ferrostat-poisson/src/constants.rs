//! # Constants
//!
//! Physical constants and the fixed numerical parameters of the solver

pub const BOLTZMANN: f64 = 1.380649e-23; // The Boltzmann constant in J / K
pub const ELECTRON_CHARGE: f64 = 1.602176634e-19; // Single electron charge in C
pub const EPSILON_0: f64 = 8.8541878128e-12; // Permitivitty of free space in F / m

/// Relative L1 change of the potential below which the self-consistent loop stops
pub const SELF_CONSISTENT_TOLERANCE: f64 = 1e-5;
/// Number of passes after which the self-consistent loop warns that it is slow to converge
pub const SOFT_ITERATION_CAP: usize = 20;
/// Relative residual reduction requested from the linear solver
pub const LINEAR_RELATIVE_TOLERANCE: f64 = 1e-10;
/// Absolute residual requested from the linear solver, zero disables the test
pub const LINEAR_ABSOLUTE_TOLERANCE: f64 = 0.;
