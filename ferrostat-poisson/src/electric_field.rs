//! Electric field in the rotated frame of each cell
//!
//! `E_m = -sum_n R[m][n] d_n phi`. Derivatives along x and y are central
//! differences. Along a bounded z axis the ghost cell of the outermost layer holds
//! the face value, which lies half a cell from the cell centre, so the outermost
//! cells use the three-point stencil for unequal spacings.

use crate::{central_derivative, nonuniform_derivative, AngleFields, RotationConvention};
use ferrostat_mesher::{Field, StructuredMesh, SPACEDIM};

#[derive(Clone, Debug)]
pub struct ElectricField {
    pub components: [Field; SPACEDIM],
}

impl ElectricField {
    /// The largest field magnitude over the valid cells, in V / m
    pub fn max_magnitude(&self) -> f64 {
        let [ex, ey, ez] = &self.components;
        ndarray::Zip::from(ex.valid())
            .and(ey.valid())
            .and(ez.valid())
            .fold(0., |acc: f64, x, y, z| {
                acc.max((x * x + y * y + z * z).sqrt())
            })
    }
}

fn z_derivative(phi: &Field, i: isize, j: isize, k: isize, nz: isize, dz: f64, bounded: bool) -> f64 {
    if !bounded {
        return central_derivative(phi, i, j, k, 2, dz);
    }
    let h_lower = if k == 0 { 0.5 * dz } else { dz };
    let h_upper = if k == nz - 1 { 0.5 * dz } else { dz };
    nonuniform_derivative(
        phi.get(i, j, k - 1),
        phi.get(i, j, k),
        phi.get(i, j, k + 1),
        h_lower,
        h_upper,
    )
}

/// Reconstructs the electric field from a potential whose ghost cells are filled
#[tracing::instrument(name = "Electric field", level = "debug", skip_all)]
pub fn reconstruct_electric_field<M: StructuredMesh>(
    phi: &Field,
    mesh: &M,
    angles: &AngleFields,
    convention: RotationConvention,
) -> ElectricField {
    let cell_size = mesh.cell_size();
    let nz = mesh.n_cell()[2] as isize;
    let bounded_z = !mesh.is_periodic(2);

    let gradient = |i, j, k| {
        [
            central_derivative(phi, i, j, k, 0, cell_size[0]),
            central_derivative(phi, i, j, k, 1, cell_size[1]),
            z_derivative(phi, i, j, k, nz, cell_size[2], bounded_z),
        ]
    };

    let components = [0, 1, 2].map(|m| {
        let mut component = phi.zeros_like();
        component.fill_valid(|i, j, k| {
            let rotation = angles.rotation_at(i, j, k, convention);
            let gradient = gradient(i, j, k);
            -(0..SPACEDIM)
                .map(|n| rotation[(m, n)] * gradient[n])
                .sum::<f64>()
        });
        component
    });

    ElectricField { components }
}
