//! Free carrier densities as a function of the potential
//!
//! The self-consistent loop only needs a closure which maps the potential to the
//! charge density in the semiconductor. It calls the closure once per pass on the
//! solved potential and once more on the perturbed potential of the Newton step.

use crate::constants::ELECTRON_CHARGE;
use crate::{BandParameters, CarrierError, Region};
use ferrostat_mesher::Field;

/// Charge, electron and hole densities on the grid
#[derive(Clone, Debug, PartialEq)]
pub struct Carriers {
    /// Net charge density in C / m^3
    pub rho: Field,
    /// Electron density in m^-3
    pub electrons: Field,
    /// Hole density in m^-3
    pub holes: Field,
}

impl Carriers {
    pub fn zeros_like(template: &Field) -> Self {
        Self {
            rho: template.zeros_like(),
            electrons: template.zeros_like(),
            holes: template.zeros_like(),
        }
    }
}

pub trait CarrierDensity {
    /// Recomputes the densities in every valid cell from `phi`.
    ///
    /// Cells outside the semiconductor carry no free charge. On failure `carriers`
    /// is left as it was.
    fn update(&self, phi: &Field, mask: &Field, carriers: &mut Carriers) -> Result<(), CarrierError>;
}

/// Non-degenerate statistics measured from the intrinsic level
///
/// `n = ni exp(phi / Vt)` and `p = ni exp(-phi / Vt)`, with a fixed background of
/// ionised donors and acceptors.
#[derive(Clone, Debug)]
pub struct BoltzmannCarriers {
    intrinsic_density: f64,
    thermal_voltage: f64,
    /// `Nd - Na` in m^-3
    net_doping: Field,
}

impl BoltzmannCarriers {
    pub fn new(band: &BandParameters, net_doping: Field) -> Self {
        Self {
            intrinsic_density: band.intrinsic_density(),
            thermal_voltage: band.thermal_voltage(),
            net_doping,
        }
    }

    pub fn intrinsic_density(&self) -> f64 {
        self.intrinsic_density
    }
}

impl CarrierDensity for BoltzmannCarriers {
    fn update(&self, phi: &Field, mask: &Field, carriers: &mut Carriers) -> Result<(), CarrierError> {
        let (ni, vt) = (self.intrinsic_density, self.thermal_voltage);
        let is_semiconductor =
            |i, j, k| Region::from_mask(mask.get(i, j, k)) == Region::Semiconductor;

        let mut electrons = phi.zeros_like();
        electrons.fill_valid(|i, j, k| match is_semiconductor(i, j, k) {
            true => ni * (phi.get(i, j, k) / vt).exp(),
            false => 0.,
        });
        let mut holes = phi.zeros_like();
        holes.fill_valid(|i, j, k| match is_semiconductor(i, j, k) {
            true => ni * (-phi.get(i, j, k) / vt).exp(),
            false => 0.,
        });
        let mut rho = phi.zeros_like();
        rho.fill_valid(|i, j, k| match is_semiconductor(i, j, k) {
            true => {
                ELECTRON_CHARGE
                    * (holes.get(i, j, k) - electrons.get(i, j, k) + self.net_doping.get(i, j, k))
            }
            false => 0.,
        });

        if let Some(((i, j, k), _)) = rho
            .valid()
            .indexed_iter()
            .find(|(_, value)| !value.is_finite())
        {
            let (i, j, k) = (i as isize, j as isize, k as isize);
            return Err(CarrierError::NonFinite {
                i,
                j,
                k,
                potential: phi.get(i, j, k),
            });
        }

        *carriers = Carriers {
            rho,
            electrons,
            holes,
        };
        Ok(())
    }
}
