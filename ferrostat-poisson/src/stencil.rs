//! Finite-difference derivatives of cell-centred fields
//!
//! All stencils read the immediate neighbours of a cell, so ghost layers must be
//! filled before they are called on cells adjacent to the domain boundary.

use crate::Region;
use ferrostat_mesher::Field;

#[inline]
fn neighbours(i: isize, j: isize, k: isize, axis: usize) -> [(isize, isize, isize); 2] {
    match axis {
        0 => [(i - 1, j, k), (i + 1, j, k)],
        1 => [(i, j - 1, k), (i, j + 1, k)],
        _ => [(i, j, k - 1), (i, j, k + 1)],
    }
}

/// Second-order central difference of `field` along `axis`
pub fn central_derivative(field: &Field, i: isize, j: isize, k: isize, axis: usize, h: f64) -> f64 {
    let [(im, jm, km), (ip, jp, kp)] = neighbours(i, j, k, axis);
    (field.get(ip, jp, kp) - field.get(im, jm, km)) / (2. * h)
}

/// Derivative of a quantity that only lives in the ferroelectric.
///
/// Outside the ferroelectric the quantity is zero, so the derivative vanishes there.
/// In a ferroelectric cell a neighbour of any other region contributes a zero value,
/// which places the jump of the quantity at the interface into the cell next to it.
pub fn masked_derivative(
    field: &Field,
    mask: &Field,
    i: isize,
    j: isize,
    k: isize,
    axis: usize,
    h: f64,
) -> f64 {
    if Region::from_mask(mask.get(i, j, k)) != Region::Ferroelectric {
        return 0.;
    }
    let [(im, jm, km), (ip, jp, kp)] = neighbours(i, j, k, axis);
    let lower = Region::from_mask(mask.get(im, jm, km)) == Region::Ferroelectric;
    let upper = Region::from_mask(mask.get(ip, jp, kp)) == Region::Ferroelectric;

    match (lower, upper) {
        (true, true) => (field.get(ip, jp, kp) - field.get(im, jm, km)) / (2. * h),
        (false, true) => field.get(i, j, k) / h,
        (true, false) => -field.get(i, j, k) / h,
        (false, false) => 0.,
    }
}

/// Derivative at a cell whose upper neighbour lies `h_upper` away and lower
/// neighbour `h_lower` away.
///
/// This is the second-order three-point stencil on a non-uniform grid. It reduces
/// to the central difference when the spacings agree.
pub fn nonuniform_derivative(lower: f64, centre: f64, upper: f64, h_lower: f64, h_upper: f64) -> f64 {
    let (h1, h2) = (h_lower, h_upper);
    (h1 * h1 * upper - h2 * h2 * lower - (h1 * h1 - h2 * h2) * centre) / (h1 * h2 * (h1 + h2))
}

#[cfg(test)]
mod test {
    use super::{central_derivative, masked_derivative, nonuniform_derivative};
    use approx::assert_relative_eq;
    use ferrostat_mesher::{create_unit_cube_grid, Field};

    #[test]
    fn nonuniform_stencil_is_exact_for_quadratics() {
        let f = |x: f64| 3. * x * x - 2. * x + 1.;
        let (h1, h2) = (0.1, 0.05);
        let x0 = 0.4;
        let derivative = nonuniform_derivative(f(x0 - h1), f(x0), f(x0 + h2), h1, h2);
        assert_relative_eq!(derivative, 6. * x0 - 2., epsilon = 1e-12);

        let central = nonuniform_derivative(f(x0 - h1), f(x0), f(x0 + h1), h1, h1);
        assert_relative_eq!(central, (f(x0 + h1) - f(x0 - h1)) / (2. * h1), epsilon = 1e-12);
    }

    #[test]
    fn masked_derivative_sees_zero_outside_the_ferroelectric() {
        let grid = create_unit_cube_grid(4);
        let h = 0.25;
        let p = Field::from_fn(&grid, 1, |_, _, k| (k * k) as f64 + 1.);
        // Ferroelectric for 1 <= k <= 2, dielectric elsewhere
        let mut mask = Field::from_fn(&grid, 1, |_, _, k| match k {
            1..=2 => 0.,
            _ => 1.,
        });
        for face in ferrostat_mesher::Face::all() {
            mask.extrapolate_into_ghost_layer(face);
        }

        // Lower neighbour is dielectric: the step up from zero
        assert_relative_eq!(masked_derivative(&p, &mask, 1, 1, 1, 2, h), 2. / h);
        // Upper neighbour is dielectric: the step down to zero
        assert_relative_eq!(masked_derivative(&p, &mask, 1, 1, 2, 2, h), -5. / h);
        // Both dielectric cells around the slab
        assert_relative_eq!(masked_derivative(&p, &mask, 1, 1, 0, 2, h), 0.);
        assert_relative_eq!(masked_derivative(&p, &mask, 1, 1, 3, 2, h), 0.);
        // Laterally every neighbour is ferroelectric
        assert_relative_eq!(masked_derivative(&p, &mask, 1, 1, 1, 0, h), 0.);
    }

    #[test]
    fn masked_derivative_is_central_inside_the_ferroelectric() {
        let grid = create_unit_cube_grid(4);
        let p = Field::from_fn(&grid, 1, |_, _, k| 3. * k as f64);
        let mask = Field::zeros(&grid, 1);
        assert_relative_eq!(masked_derivative(&p, &mask, 2, 2, 2, 2, 0.5), 6.);
    }

    #[test]
    fn central_derivative_is_exact_for_linear_fields() {
        let grid = create_unit_cube_grid(5);
        let field = Field::from_fn(&grid, 1, |i, _, _| 2. * i as f64);
        assert_relative_eq!(central_derivative(&field, 2, 2, 2, 0, 0.2), 10.);
        assert_relative_eq!(central_derivative(&field, 2, 2, 2, 1, 0.2), 0.);
    }
}
