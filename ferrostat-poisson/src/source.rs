// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Assembly of the Poisson right-hand side
//!
//! The source in a semiconductor cell is the free charge density supplied by the
//! carrier closure. Dielectric cells carry no charge. Everywhere else the source is
//! the bound charge of the rotated polarization, `-sum_m sum_n R[m][n] d_n P_m`,
//! with derivatives taken by [`masked_derivative`]. The polarization drops to zero
//! across a ferroelectric interface, so the surface charge of a uniformly polarized
//! slab appears in the cells on either end of it.

use crate::{masked_derivative, MaterialFields, Polarization, Region, RotationConvention};
use ferrostat_mesher::{Field, StructuredMesh, SPACEDIM};

/// Everything needed to assemble the right-hand side, apart from the charge density
#[derive(Debug)]
pub struct PoissonSource<'a> {
    cell_size: [f64; SPACEDIM],
    periodicity: [bool; SPACEDIM],
    materials: &'a MaterialFields,
    polarization: &'a Polarization,
    convention: RotationConvention,
}

impl<'a> PoissonSource<'a> {
    pub fn new<M: StructuredMesh>(
        mesh: &M,
        materials: &'a MaterialFields,
        polarization: &'a Polarization,
        convention: RotationConvention,
    ) -> Self {
        Self {
            cell_size: mesh.cell_size(),
            periodicity: mesh.periodicity(),
            materials,
            polarization,
            convention,
        }
    }

    pub fn materials(&self) -> &MaterialFields {
        self.materials
    }

    pub fn periodicity(&self) -> [bool; SPACEDIM] {
        self.periodicity
    }

    /// Bound charge `-div(R^T P)` at a cell
    fn bound_charge(&self, i: isize, j: isize, k: isize) -> f64 {
        let rotation = self.materials.angles.rotation_at(i, j, k, self.convention);
        let mask = &self.materials.mask;
        let mut divergence = 0.;
        for (m, component) in self.polarization.components.iter().enumerate() {
            for n in 0..SPACEDIM {
                divergence += rotation[(m, n)]
                    * masked_derivative(component, mask, i, j, k, n, self.cell_size[n]);
            }
        }
        -divergence
    }

    /// Writes the right-hand side into every valid cell of `rhs`, ghosts are not touched
    pub fn assemble(&self, rho: &Field, rhs: &mut Field) {
        debug_assert!(rhs.same_box(rho));
        rhs.fill_valid(|i, j, k| match self.materials.region_at(i, j, k) {
            Region::Semiconductor => rho.get(i, j, k),
            Region::Dielectric => 0.,
            Region::Ferroelectric | Region::Spacer => self.bound_charge(i, j, k),
        });
    }
}
