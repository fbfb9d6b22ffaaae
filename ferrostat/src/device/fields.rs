use super::{Device, Layer, Material};
use ferrostat_mesher::{Face, Field, LayeredGrid};
use ferrostat_poisson::{
    operator::EmbeddedBoundary, AngleFields, MaterialFields, Polarization, N_GHOST,
};

/// Every cell field derived from the layer stack
#[derive(Clone, Debug)]
pub struct DeviceFields {
    /// Mask, t-phase flags and orientation of each cell
    pub materials: MaterialFields,
    /// Polarization of each cell, zero outside the ferroelectric
    pub polarization: Polarization,
    /// `Nd - Na` in m^-3
    pub net_doping: Field,
    /// One in cells belonging to a metal layer
    pub covered: Field,
}

/// Fills every valid cell with the value of the layer it belongs to, then extends the
/// field into the ghost layers
fn layer_field<F>(stack: &LayeredGrid, device: &Device, value: F) -> Field
where
    F: Fn(&Layer) -> f64 + Send + Sync,
{
    let grid = stack.grid();
    let mut field = Field::from_fn(grid, N_GHOST, |_, _, k| {
        value(&device[stack.nearest_layer(k)])
    });
    for face in Face::all() {
        field.extrapolate_into_ghost_layer(face);
    }
    field.fill_boundary(grid.periodicity());
    field
}

impl DeviceFields {
    /// Builds the fields of `device` meshed on `stack`
    pub fn build(device: &Device, stack: &LayeredGrid) -> Self {
        let mask = layer_field(stack, device, |layer| layer.material.region().mask_value());
        let tphase = layer_field(stack, device, |layer| {
            match layer.material == Material::Ferroelectric && layer.tphase {
                true => 1.,
                false => 0.,
            }
        });
        let angles = AngleFields {
            alpha: layer_field(stack, device, |layer| layer.angles[0]),
            beta: layer_field(stack, device, |layer| layer.angles[1]),
            theta: layer_field(stack, device, |layer| layer.angles[2]),
        };
        let polarization = Polarization {
            components: [0, 1, 2].map(|m| layer_field(stack, device, |layer| layer.polarization[m])),
        };
        let net_doping = layer_field(stack, device, |layer| {
            layer.donor_density - layer.acceptor_density
        });
        let covered = layer_field(stack, device, |layer| match layer.material {
            Material::Metal => 1.,
            _ => 0.,
        });

        Self {
            materials: MaterialFields {
                mask,
                tphase,
                angles,
            },
            polarization,
            net_doping,
            covered,
        }
    }

    /// The metal layers as an embedded body at zero potential
    pub fn embedded_boundary(&self) -> EmbeddedBoundary {
        EmbeddedBoundary::new(self.covered.clone())
    }
}
