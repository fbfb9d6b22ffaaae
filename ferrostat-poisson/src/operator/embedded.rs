//! An operator with an embedded conducting body
//!
//! Cells flagged as covered are removed from the problem and held at the surface
//! potential of the body. The regular cells next to them see the surface as a
//! Dirichlet boundary half a cell away, the same treatment as a Dirichlet face of
//! the box.

use super::plain::CellOperator;
use super::{LinearOperator, LinearSolveReport, SolveTolerances};
use crate::boundary::BoundaryClassification;
use crate::{ConfigurationError, LinearSolveError};
use ferrostat_mesher::{Field, Grid};

/// Geometry and surface data of an embedded body
#[derive(Clone, Debug)]
pub struct EmbeddedBoundary {
    /// One in covered cells, zero elsewhere
    covered: Field,
    /// Potential of the body, zero when absent
    surface_potential: Option<Field>,
}

impl EmbeddedBoundary {
    pub fn new(covered: Field) -> Self {
        Self {
            covered,
            surface_potential: None,
        }
    }

    pub fn with_surface_potential(mut self, surface_potential: Field) -> Self {
        self.surface_potential = Some(surface_potential);
        self
    }

    pub fn is_covered(&self, i: isize, j: isize, k: isize) -> bool {
        self.covered.get(i, j, k) == 1.
    }

    pub fn surface_value(&self, i: isize, j: isize, k: isize) -> f64 {
        self.surface_potential
            .as_ref()
            .map_or(0., |potential| potential.get(i, j, k))
    }

    pub fn number_of_covered_cells(&self) -> usize {
        self.covered.valid().iter().filter(|&&value| value == 1.).count()
    }

    fn check_shape(&self, grid: &Grid) -> Result<(), ConfigurationError> {
        let expected = grid.n_cell();
        for field in std::iter::once(&self.covered).chain(self.surface_potential.as_ref()) {
            if field.n_cell() != expected {
                return Err(ConfigurationError::FieldShape {
                    expected,
                    found: field.n_cell(),
                });
            }
        }
        Ok(())
    }
}

/// A linear operator with an embedded body held at a fixed potential
#[derive(Clone, Debug)]
pub struct EmbeddedOperator {
    inner: CellOperator,
    embedded: EmbeddedBoundary,
}

impl EmbeddedOperator {
    pub fn new(grid: &Grid, embedded: EmbeddedBoundary) -> Result<Self, ConfigurationError> {
        embedded.check_shape(grid)?;
        tracing::debug!(
            "Embedded body covers {} of {} cells",
            embedded.number_of_covered_cells(),
            grid.number_of_cells()
        );
        Ok(Self {
            inner: CellOperator::new(grid),
            embedded,
        })
    }

    pub fn with_maximum_iterations(mut self, maximum_iterations: usize) -> Self {
        self.inner.set_maximum_iterations(maximum_iterations);
        self
    }

    pub fn with_verbosity(mut self, verbosity: usize) -> Self {
        self.inner.set_verbosity(verbosity);
        self
    }

    pub fn embedded_boundary(&self) -> &EmbeddedBoundary {
        &self.embedded
    }

    pub fn grid(&self) -> &Grid {
        self.inner.grid()
    }
}

impl LinearOperator for EmbeddedOperator {
    fn configure(
        &mut self,
        boundaries: &BoundaryClassification,
        beta_cc: &Field,
        boundary_values: &Field,
    ) -> Result<(), LinearSolveError> {
        self.inner
            .configure(boundaries, beta_cc, boundary_values, Some(&self.embedded))
    }

    fn set_scalars(&mut self, a: f64, b: f64) {
        self.inner.set_scalars(a, b)
    }

    fn set_mass_coefficient(&mut self, alpha: &Field) {
        self.inner.set_mass_coefficient(alpha)
    }

    #[tracing::instrument(name = "Embedded operator solve", level = "debug", skip_all)]
    fn solve(
        &mut self,
        x: &mut Field,
        rhs: &Field,
        tolerances: SolveTolerances,
    ) -> Result<LinearSolveReport, LinearSolveError> {
        self.inner.solve(x, rhs, tolerances)
    }
}

#[cfg(test)]
mod test {
    use super::{EmbeddedBoundary, EmbeddedOperator};
    use crate::boundary::{BoundaryClassification, OperatorBoundary};
    use crate::operator::{LinearOperator, PlainOperator, SolveTolerances};
    use crate::ConfigurationError;
    use approx::assert_relative_eq;
    use ferrostat_mesher::{create_unit_cube_grid, Face, Field, Grid, Side};
    use nalgebra::Point3;

    fn column() -> (Grid, BoundaryClassification) {
        let grid = Grid::new(
            [2, 2, 8],
            Point3::origin(),
            Point3::new(1., 1., 1.),
            [true, true, false],
        );
        let boundaries = BoundaryClassification::uniform(OperatorBoundary::Periodic)
            .with_face(Face::new(Side::Low, 2), OperatorBoundary::Dirichlet)
            .with_face(Face::new(Side::High, 2), OperatorBoundary::Neumann);
        (grid, boundaries)
    }

    #[test]
    fn mismatched_fields_are_rejected() {
        let grid = create_unit_cube_grid(3);
        let other = create_unit_cube_grid(4);
        let embedded = EmbeddedBoundary::new(Field::zeros(&other, 1));
        assert!(matches!(
            EmbeddedOperator::new(&grid, embedded),
            Err(ConfigurationError::FieldShape { .. })
        ));
    }

    #[test]
    fn covered_cells_hold_the_surface_potential() {
        let (grid, boundaries) = column();
        // A conducting slab over the top three layers at 2 V
        let covered = Field::from_fn(&grid, 1, |_, _, k| if k >= 5 { 1. } else { 0. });
        let surface = Field::from_element(&grid, 1, 2.);
        let embedded = EmbeddedBoundary::new(covered).with_surface_potential(surface);
        assert_eq!(embedded.number_of_covered_cells(), 12);

        let mut operator = EmbeddedOperator::new(&grid, embedded).unwrap();
        let beta = Field::from_element(&grid, 1, 1.);
        // Grounded bottom face
        operator.configure(&boundaries, &beta, &beta.zeros_like()).unwrap();
        operator.set_scalars(0., 1.);
        let mut x = Field::zeros(&grid, 1);
        let rhs = x.zeros_like();
        operator
            .solve(
                &mut x,
                &rhs,
                SolveTolerances {
                    relative: 1e-12,
                    absolute: 0.,
                },
            )
            .unwrap();

        for k in 5..8 {
            assert_relative_eq!(x.get(1, 0, k), 2., epsilon = 1e-10);
        }
        // Linear between the grounded face at z = 0 and the body surface at z = 5 / 8
        for k in 0..5 {
            let z = (k as f64 + 0.5) / 8.;
            assert_relative_eq!(x.get(0, 1, k), 2. * z / 0.625, epsilon = 1e-9);
        }
    }

    #[test]
    fn an_empty_body_matches_the_plain_operator() {
        let (grid, boundaries) = column();
        let embedded = EmbeddedBoundary::new(Field::zeros(&grid, 1));
        let mut embedded_operator = EmbeddedOperator::new(&grid, embedded).unwrap();
        let mut plain_operator = PlainOperator::new(&grid);

        let mut beta = Field::from_fn(&grid, 1, |_, _, k| 1. + k as f64);
        for face in Face::all() {
            beta.extrapolate_into_ghost_layer(face);
        }
        beta.fill_boundary(grid.periodicity());
        let rhs = Field::from_fn(&grid, 1, |i, _, k| (i + k) as f64);
        let values = Field::from_element(&grid, 1, 0.5);

        let mut results = Vec::new();
        for operator in [
            &mut embedded_operator as &mut dyn LinearOperator,
            &mut plain_operator as &mut dyn LinearOperator,
        ] {
            operator.configure(&boundaries, &beta, &values).unwrap();
            operator.set_scalars(0., 1.);
            let mut x = Field::zeros(&grid, 1);
            operator.solve(&mut x, &rhs, SolveTolerances::default()).unwrap();
            results.push(x);
        }
        for (embedded, plain) in results[0].valid().iter().zip(results[1].valid().iter()) {
            assert_relative_eq!(embedded, plain, epsilon = 1e-8);
        }
    }
}
