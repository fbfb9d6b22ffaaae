//! Writing boundary values into the ghost layer of the potential
//!
//! The linear operator reads Dirichlet and Neumann data from the ghost cells of the
//! potential at configuration time, so these passes have to run before
//! [`LinearOperator::configure`](crate::operator::LinearOperator::configure).

use super::{BoundaryConditions, BoundaryValue};
use crate::{Arity, BandParameters, ConfigurationError, ContactParameters, ExpressionEvaluator};
use ferrostat_mesher::{Face, Field, Grid, Side, SPACEDIM};

/// Sets the ghost layer of every constant-valued face to its declared value
pub fn fill_constant_boundaries(phi: &mut Field, grid: &Grid, conditions: &BoundaryConditions) {
    for (face, spec) in conditions.faces() {
        if let BoundaryValue::Constant(value) = spec.value {
            for (i, j, k) in grid.ghost_layer(face) {
                phi.set(i, j, k, value);
            }
        }
    }
}

/// Compiles the expression of every function-valued face.
///
/// This runs before any ghost cell is written so that a missing expression leaves
/// the potential untouched.
pub fn compile_boundary_expressions<'a, E: ExpressionEvaluator>(
    conditions: &BoundaryConditions,
    evaluator: &'a E,
    arity: Arity,
) -> Result<Vec<(Face, crate::CompiledExpression<'a>)>, ConfigurationError> {
    conditions
        .faces()
        .filter_map(|(face, spec)| match &spec.value {
            BoundaryValue::Function(name) => Some((face, name)),
            _ => None,
        })
        .map(|(face, name)| {
            evaluator
                .compile(name, arity)
                .map(|expression| (face, expression))
                .map_err(|source| ConfigurationError::MissingExpression { face, source })
        })
        .collect()
}

/// Evaluates the expression of every function-valued face at the centres of its ghost cells
///
/// When `time` is given the expressions are compiled for `(x, y, z, t)`, otherwise for
/// `(x, y, z)`.
pub fn fill_function_boundaries<E: ExpressionEvaluator>(
    phi: &mut Field,
    grid: &Grid,
    conditions: &BoundaryConditions,
    evaluator: &E,
    time: Option<f64>,
) -> Result<(), ConfigurationError> {
    let arity = match time {
        Some(_) => Arity::SpaceTime,
        None => Arity::Space,
    };
    let expressions = compile_boundary_expressions(conditions, evaluator, arity)?;

    let mut arguments = [0.; SPACEDIM + 1];
    arguments[SPACEDIM] = time.unwrap_or_default();
    for (face, expression) in expressions {
        for (i, j, k) in grid.ghost_layer(face) {
            let centre = grid.cell_centre(i, j, k);
            arguments[..SPACEDIM].copy_from_slice(&[centre.x, centre.y, centre.z]);
            phi.set(
                i,
                j,
                k,
                expression(&arguments[..arity.number_of_arguments()]),
            );
        }
    }
    Ok(())
}

/// Imposes the contact potentials on the z faces of the stack.
///
/// Every ghost cell below the stack, edges and corners included, is set to the low
/// contact potential. Every ghost cell above it is set to the applied potential
/// shifted by the difference between the metal work function and the semiconductor
/// reference potential. Periodic halos are refreshed afterwards. Nothing happens when
/// the contact rule is disabled.
pub fn apply_contact_rule(
    phi: &mut Field,
    grid: &Grid,
    contacts: &ContactParameters,
    band: &BandParameters,
) {
    if !contacts.enabled {
        return;
    }
    let [nx, ny, nz] = grid.n_cell();
    let high = contacts.high_boundary_value(band);
    for side in Side::ALL {
        let (k, value) = match side {
            Side::Low => (-1, contacts.low_potential),
            Side::High => (nz as isize, high),
        };
        for j in -1..=ny as isize {
            for i in -1..=nx as isize {
                phi.set(i, j, k, value);
            }
        }
    }
    phi.fill_boundary(grid.periodicity());
}

#[cfg(test)]
mod test {
    use super::{apply_contact_rule, fill_constant_boundaries, fill_function_boundaries};
    use crate::boundary::{BoundaryConditions, BoundarySpec, BoundaryValue};
    use crate::{BandParameters, ConfigurationError, ContactParameters, ExpressionTable};
    use approx::assert_relative_eq;
    use ferrostat_mesher::{Field, Grid};
    use nalgebra::Point3;

    fn bounded_grid() -> Grid {
        Grid::new([4, 3, 5], Point3::origin(), Point3::new(4., 3., 5.), [false; 3])
    }

    fn conditions(low_x: BoundaryValue, low_z: BoundaryValue) -> BoundaryConditions {
        BoundaryConditions::from_table(vec![
            vec![
                BoundarySpec::dirichlet(low_x),
                BoundarySpec::neumann(BoundaryValue::Homogeneous),
                BoundarySpec::dirichlet(low_z),
            ],
            vec![
                BoundarySpec::dirichlet(BoundaryValue::Homogeneous),
                BoundarySpec::neumann(BoundaryValue::Homogeneous),
                BoundarySpec::dirichlet(BoundaryValue::Constant(9.)),
            ],
        ])
        .unwrap()
    }

    fn silicon() -> BandParameters {
        BandParameters {
            bandgap: 1.12,
            affinity: 4.05,
            conduction_band_dos: 2.8e25,
            valence_band_dos: 1.04e25,
            temperature: 300.,
        }
    }

    #[test]
    fn constant_faces_fill_their_whole_ghost_layer() {
        let grid = bounded_grid();
        let mut phi = Field::zeros(&grid, 1);
        let conditions = conditions(BoundaryValue::Constant(0.7), BoundaryValue::Homogeneous);
        fill_constant_boundaries(&mut phi, &grid, &conditions);

        for j in 0..3 {
            for k in 0..5 {
                assert_eq!(phi.get(-1, j, k), 0.7);
                // The high-x face is homogeneous
                assert_eq!(phi.get(4, j, k), 0.);
            }
        }
        assert_eq!(phi.get(0, 0, 5), 9.);
        // Valid cells are untouched
        assert_eq!(phi.norm0(), 0.);
    }

    #[test]
    fn function_faces_are_evaluated_at_ghost_centres() {
        let grid = bounded_grid();
        let mut phi = Field::zeros(&grid, 1);
        let conditions = conditions(BoundaryValue::Function("ramp".into()), BoundaryValue::Homogeneous);
        let table = ExpressionTable::new().with_space_expression("ramp", |x, y, z| x + 10. * y + 100. * z);
        fill_function_boundaries(&mut phi, &grid, &conditions, &table, None).unwrap();

        // Ghost centres of the low-x face sit at x = -0.5
        assert_relative_eq!(phi.get(-1, 0, 0), -0.5 + 5. + 50.);
        assert_relative_eq!(phi.get(-1, 2, 4), -0.5 + 25. + 450.);

        let table = ExpressionTable::new()
            .with_space_time_expression("ramp", |x, _, _, t| x * t);
        fill_function_boundaries(&mut phi, &grid, &conditions, &table, Some(4.)).unwrap();
        assert_relative_eq!(phi.get(-1, 1, 1), -2.);
    }

    #[test]
    fn missing_expressions_leave_the_potential_untouched() {
        let grid = bounded_grid();
        let mut phi = Field::from_element(&grid, 1, 3.);
        let conditions = conditions(
            BoundaryValue::Function("ramp".into()),
            BoundaryValue::Function("absent".into()),
        );
        let table = ExpressionTable::new().with_space_expression("ramp", |x, _, _| x);
        let result = fill_function_boundaries(&mut phi, &grid, &conditions, &table, None);
        assert!(matches!(
            result,
            Err(ConfigurationError::MissingExpression { .. })
        ));
        assert_eq!(phi, Field::from_element(&grid, 1, 3.));
    }

    #[test]
    fn contact_rule_overrides_declared_z_values() {
        let grid = bounded_grid();
        let band = silicon();
        let mut phi = Field::zeros(&grid, 1);
        let conditions = conditions(BoundaryValue::Homogeneous, BoundaryValue::Constant(-3.));
        fill_constant_boundaries(&mut phi, &grid, &conditions);
        assert_eq!(phi.get(1, 1, -1), -3.);

        let contacts = ContactParameters {
            low_potential: 0.1,
            high_potential: 0.4,
            work_function: Some(band.reference_potential() + 0.25),
            enabled: true,
        };
        apply_contact_rule(&mut phi, &grid, &contacts, &band);

        for i in -1..=4 {
            for j in -1..=3 {
                assert_relative_eq!(phi.get(i, j, -1), 0.1);
                assert_relative_eq!(phi.get(i, j, 5), 0.15, epsilon = 1e-12);
            }
        }

        let mut untouched = Field::zeros(&grid, 1);
        fill_constant_boundaries(&mut untouched, &grid, &conditions);
        let disabled = ContactParameters {
            enabled: false,
            ..contacts
        };
        apply_contact_rule(&mut untouched, &grid, &disabled, &band);
        assert_eq!(untouched.get(1, 1, -1), -3.);
        assert_eq!(untouched.get(1, 1, 5), 9.);
    }
}
