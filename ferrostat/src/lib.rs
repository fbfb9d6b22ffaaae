// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Ferrostat computes the electrostatics of ferroelectric gate stacks
//!
//! # Overview
//! A stack of ferroelectric, dielectric and semiconductor layers is meshed on a
//! structured grid. The bound charge of the (possibly rotated) ferroelectric
//! polarization and the free carriers of the semiconductor enter the Poisson
//! equation, which is solved self-consistently for each bias applied to the top
//! contact.
//!
//! # Usage
//! Ferrostat is distributed as a binary crate and is intended to be run from the
//! command line. Solver settings are read from `.config/default.toml`, the structure
//! is described in a separate `.toml` file:
//!
//! ```toml
//! voltage_offsets = [0.0, 0.5, 1.0]
//!
//! [[layers]]
//! thickness = 10.0
//! material = "Semiconductor"
//! acceptor_density = 1e23
//!
//! [[layers]]
//! thickness = 1.0
//! material = "Dielectric"
//!
//! [[layers]]
//! thickness = 5.0
//! material = "Ferroelectric"
//! polarization = [0.0, 0.0, 0.2]
//! ```
//!
//! Layers are stacked from the bottom contact upwards, thicknesses are in units of
//! the configured `unit_size`.

#![warn(missing_docs)]

/// The command line application, configuration and tracing
pub mod app;

/// Deserialization of the layer stack and construction of the material fields
pub mod device;
