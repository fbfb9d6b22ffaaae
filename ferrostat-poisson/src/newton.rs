//! Finite-difference linearisation of the charge density
//!
//! Around the current potential the source is approximated as
//! `RHS(phi') = RHS(phi) + alpha (phi' - phi)`, with `alpha` the one-sided difference
//! quotient of the source under a uniform shift of the potential by `delta`. The
//! linear operator then solves `(-alpha - div(beta grad)) phi' = RHS(phi) - alpha phi`.

use crate::{CarrierDensity, CarrierError, Carriers, PoissonSource};
use ferrostat_mesher::Field;
use ndarray::Zip;

/// Computes `alpha = (RHS(phi + delta) - RHS(phi)) / delta` in every valid cell.
///
/// `rhs` must hold the source assembled at `phi`. The closure is evaluated on a
/// scratch set of carriers, so the caller's densities are not modified.
pub fn newton_coefficient<C: CarrierDensity>(
    source: &PoissonSource,
    closure: &C,
    phi: &Field,
    rhs: &Field,
    delta: f64,
) -> Result<Field, CarrierError> {
    let mut shifted = phi.clone();
    shifted.plus(delta);

    let mut carriers = Carriers::zeros_like(phi);
    closure.update(&shifted, &source.materials().mask, &mut carriers)?;

    let mut shifted_rhs = rhs.zeros_like();
    source.assemble(&carriers.rho, &mut shifted_rhs);

    Ok(Field::lin_comb(1. / delta, &shifted_rhs, -1. / delta, rhs))
}

/// Moves the linear part of the source to the left-hand side, `rhs -= alpha * phi`
pub fn apply_newton_correction(rhs: &mut Field, phi: &Field, alpha: &Field) {
    Zip::from(rhs.valid_mut())
        .and(phi.valid())
        .and(alpha.valid())
        .par_for_each(|rhs, &phi, &alpha| *rhs -= alpha * phi);
}

#[cfg(test)]
mod test {
    use super::{apply_newton_correction, newton_coefficient};
    use crate::{
        AngleFields, CarrierDensity, CarrierError, Carriers, MaterialFields, Polarization,
        PoissonSource, RotationConvention,
    };
    use approx::assert_relative_eq;
    use ferrostat_mesher::{create_unit_cube_grid, Field};

    /// `rho = a phi^2 + c phi + b` in every semiconductor cell
    struct Polynomial {
        curvature: f64,
        slope: f64,
        offset: f64,
    }

    impl CarrierDensity for Polynomial {
        fn update(&self, phi: &Field, mask: &Field, carriers: &mut Carriers) -> Result<(), CarrierError> {
            carriers.rho.fill_valid(|i, j, k| match mask.get(i, j, k) >= 2. {
                true => {
                    let phi = phi.get(i, j, k);
                    self.curvature * phi * phi + self.slope * phi + self.offset
                }
                false => 0.,
            });
            Ok(())
        }
    }

    fn coefficient_for(closure: &Polynomial, delta: f64) -> Field {
        let grid = create_unit_cube_grid(4);
        let mask = Field::from_fn(&grid, 1, |_, _, k| if k < 2 { 2. } else { 1. });
        let materials = MaterialFields {
            tphase: mask.zeros_like(),
            angles: AngleFields::aligned(&mask),
            mask,
        };
        let polarization = Polarization::zeros(&materials.mask);
        let source = PoissonSource::new(&grid, &materials, &polarization, RotationConvention::Euler);

        let phi = Field::from_fn(&grid, 1, |i, j, k| 0.1 * (i - j + k) as f64);
        let mut carriers = Carriers::zeros_like(&phi);
        closure.update(&phi, &materials.mask, &mut carriers).unwrap();
        let mut rhs = phi.zeros_like();
        source.assemble(&carriers.rho, &mut rhs);

        newton_coefficient(&source, closure, &phi, &rhs, delta).unwrap()
    }

    #[test]
    fn coefficient_is_the_slope_of_a_linear_charge_density() {
        let closure = Polynomial {
            curvature: 0.,
            slope: -3.5,
            offset: 0.25,
        };
        for delta in [1e-1, 1e-3, 1e-5] {
            let alpha = coefficient_for(&closure, delta);
            assert_relative_eq!(alpha.get(1, 2, 0), -3.5, epsilon = 1e-9);
            assert_relative_eq!(alpha.get(3, 0, 1), -3.5, epsilon = 1e-9);
            // Dielectric cells do not depend on the potential
            assert_eq!(alpha.get(1, 2, 3), 0.);
        }
    }

    #[test]
    fn coefficient_converges_to_the_derivative_as_delta_shrinks() {
        let closure = Polynomial {
            curvature: 2.,
            slope: -1.,
            offset: 0.,
        };
        // phi = 0.1 * (3 - 0 + 1) at cell (3, 0, 1)
        let exact = 2. * 2. * 0.4 - 1.;
        let errors = [1e-1, 1e-2, 1e-3, 1e-4]
            .map(|delta| (coefficient_for(&closure, delta).get(3, 0, 1) - exact).abs());
        for pair in errors.windows(2) {
            assert!(pair[1] < pair[0], "{errors:?}");
        }
        assert!(errors[3] < 1e-3);
    }

    #[test]
    fn correction_subtracts_the_linear_part() {
        let grid = create_unit_cube_grid(2);
        let mut rhs = Field::from_element(&grid, 1, 1.);
        let phi = Field::from_element(&grid, 1, 2.);
        let alpha = Field::from_element(&grid, 1, -0.5);
        apply_newton_correction(&mut rhs, &phi, &alpha);
        assert_relative_eq!(rhs.get(0, 1, 0), 2.);
        assert_relative_eq!(rhs.get(-1, 0, 0), 1.);
    }
}
