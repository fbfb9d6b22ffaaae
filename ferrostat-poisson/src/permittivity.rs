use crate::boundary::{BoundaryClassification, OperatorBoundary};
use crate::constants::EPSILON_0;
use crate::{MaterialFields, MaterialParameters, Region};
use ferrostat_mesher::{Face, Field, SPACEDIM};

/// Builds the cell-centred permittivity `beta_cc` in F / m.
///
/// Interior cells take the constant of their material class, spacer cells behave as
/// dielectric. Ghost cells are then filled so the operator can average across
/// boundary faces: periodic halos are exchanged first, after which the ghost layer of
/// every non-periodic face copies the adjacent interior value. Faces are processed
/// in x, y, z order.
pub fn initialise_permittivity(
    materials: &MaterialFields,
    parameters: &MaterialParameters,
    boundaries: &BoundaryClassification,
) -> Field {
    let mut beta = materials.mask.zeros_like();
    beta.fill_valid(|i, j, k| {
        let relative = match materials.region_at(i, j, k) {
            Region::Ferroelectric if materials.is_tphase(i, j, k) => parameters.epsilon_fe_tphase,
            Region::Ferroelectric => parameters.epsilon_fe,
            Region::Dielectric | Region::Spacer => parameters.epsilon_de,
            Region::Semiconductor => parameters.epsilon_si,
        };
        relative * EPSILON_0
    });

    let periodicity: [bool; SPACEDIM] = [0, 1, 2].map(|axis| boundaries.is_periodic(axis));
    beta.fill_boundary(periodicity);

    for axis in 0..SPACEDIM {
        for face in Face::all().filter(|face| face.axis == axis) {
            if boundaries.get(face) != OperatorBoundary::Periodic {
                beta.extrapolate_into_ghost_layer(face);
            }
        }
    }
    beta
}
