use super::assembler::{AssembledStencil, CellLayout};
use super::krylov::{conjugate_gradient, KrylovSettings};
use super::{EmbeddedBoundary, LinearOperator, LinearSolveReport, SolveTolerances};
use crate::boundary::{BoundaryClassification, OperatorBoundary};
use crate::LinearSolveError;
use ferrostat_mesher::{Face, Field, Grid, StructuredMesh, SPACEDIM};
use nalgebra::DVector;

/// The machinery shared by the plain and embedded operators
#[derive(Clone, Debug)]
pub(crate) struct CellOperator {
    grid: Grid,
    layout: CellLayout,
    configured: Option<Configured>,
    a: f64,
    b: f64,
    alpha: Option<DVector<f64>>,
    maximum_iterations: Option<usize>,
    verbosity: usize,
}

#[derive(Clone, Debug)]
struct Configured {
    stencil: AssembledStencil,
    boundaries: BoundaryClassification,
    /// Snapshot of the boundary data, the caller zeroes its potential before each solve
    boundary_values: Field,
}

impl CellOperator {
    pub(crate) fn new(grid: &Grid) -> Self {
        Self {
            grid: grid.clone(),
            layout: CellLayout {
                n_cell: grid.n_cell(),
                cell_size: grid.cell_size(),
            },
            configured: None,
            a: 0.,
            b: 1.,
            alpha: None,
            maximum_iterations: None,
            verbosity: 0,
        }
    }

    pub(crate) fn grid(&self) -> &Grid {
        &self.grid
    }

    pub(crate) fn set_maximum_iterations(&mut self, maximum_iterations: usize) {
        self.maximum_iterations = Some(maximum_iterations);
    }

    pub(crate) fn set_verbosity(&mut self, verbosity: usize) {
        self.verbosity = verbosity;
    }

    pub(crate) fn configure(
        &mut self,
        boundaries: &BoundaryClassification,
        beta_cc: &Field,
        boundary_values: &Field,
        embedded: Option<&EmbeddedBoundary>,
    ) -> Result<(), LinearSolveError> {
        let stencil =
            AssembledStencil::assemble(self.layout, boundaries, beta_cc, boundary_values, embedded)?;
        self.configured = Some(Configured {
            stencil,
            boundaries: *boundaries,
            boundary_values: boundary_values.clone(),
        });
        Ok(())
    }

    pub(crate) fn set_scalars(&mut self, a: f64, b: f64) {
        self.a = a;
        self.b = b;
    }

    pub(crate) fn set_mass_coefficient(&mut self, alpha: &Field) {
        self.alpha = Some(self.gather(alpha));
    }

    fn gather(&self, field: &Field) -> DVector<f64> {
        DVector::from_iterator(
            self.layout.number_of_unknowns(),
            (0..self.layout.number_of_unknowns()).map(|row| {
                let [i, j, k] = self.layout.cell(row);
                field.get(i, j, k)
            }),
        )
    }

    pub(crate) fn solve(
        &mut self,
        x: &mut Field,
        rhs: &Field,
        tolerances: SolveTolerances,
    ) -> Result<LinearSolveReport, LinearSolveError> {
        let configured = self.configured.as_ref().ok_or(LinearSolveError::Unconfigured)?;
        let (matrix, system_rhs) =
            configured
                .stencil
                .system(self.a, self.b, self.alpha.as_ref(), &self.gather(rhs))?;

        let mut solution = self.gather(x);
        let settings = KrylovSettings {
            tolerances,
            maximum_iterations: self
                .maximum_iterations
                .unwrap_or(10 * self.layout.number_of_unknowns()),
            verbosity: self.verbosity,
        };
        let report = conjugate_gradient(&matrix, &system_rhs, &mut solution, &settings)?;
        if self.verbosity > 0 {
            tracing::debug!(
                "Linear solve converged in {} iterations, relative residual {:e}",
                report.iterations,
                report.residual
            );
        }

        for (row, value) in solution.iter().enumerate() {
            let [i, j, k] = self.layout.cell(row);
            x.set(i, j, k, *value);
        }
        write_boundary_ghosts(x, &self.grid, &configured.boundaries, &configured.boundary_values);
        Ok(report)
    }
}

/// Sets the ghost cells of a solution so they agree with the boundary conditions
fn write_boundary_ghosts(
    x: &mut Field,
    grid: &Grid,
    boundaries: &BoundaryClassification,
    boundary_values: &Field,
) {
    let cell_size = grid.cell_size();
    for face in Face::all() {
        let boundary = boundaries.get(face);
        if boundary == OperatorBoundary::Periodic {
            continue;
        }
        let h = cell_size[face.axis];
        let outward = face.side.outward() as f64;
        for (i, j, k) in grid.ghost_layer(face) {
            let mut interior = [i, j, k];
            interior[face.axis] -= face.side.outward();
            let [ii, jj, kk] = interior;
            let value = match boundary {
                OperatorBoundary::Dirichlet => boundary_values.get(i, j, k),
                OperatorBoundary::Neumann => x.get(ii, jj, kk),
                OperatorBoundary::InhomogeneousNeumann => {
                    x.get(ii, jj, kk) + outward * boundary_values.get(i, j, k) * h
                }
                OperatorBoundary::Periodic => unreachable!("periodic faces are skipped"),
            };
            x.set(i, j, k, value);
        }
    }
    let periodicity: [bool; SPACEDIM] = [0, 1, 2].map(|axis| boundaries.is_periodic(axis));
    x.fill_boundary(periodicity);
}

/// A linear operator covering every cell of the grid
#[derive(Clone, Debug)]
pub struct PlainOperator {
    inner: CellOperator,
}

impl PlainOperator {
    pub fn new(grid: &Grid) -> Self {
        Self {
            inner: CellOperator::new(grid),
        }
    }

    /// Overrides the iteration budget of the Krylov solver, ten sweeps per unknown by default
    pub fn with_maximum_iterations(mut self, maximum_iterations: usize) -> Self {
        self.inner.set_maximum_iterations(maximum_iterations);
        self
    }

    pub fn with_verbosity(mut self, verbosity: usize) -> Self {
        self.inner.set_verbosity(verbosity);
        self
    }

    pub fn grid(&self) -> &Grid {
        self.inner.grid()
    }
}

impl LinearOperator for PlainOperator {
    fn configure(
        &mut self,
        boundaries: &BoundaryClassification,
        beta_cc: &Field,
        boundary_values: &Field,
    ) -> Result<(), LinearSolveError> {
        self.inner.configure(boundaries, beta_cc, boundary_values, None)
    }

    fn set_scalars(&mut self, a: f64, b: f64) {
        self.inner.set_scalars(a, b)
    }

    fn set_mass_coefficient(&mut self, alpha: &Field) {
        self.inner.set_mass_coefficient(alpha)
    }

    #[tracing::instrument(name = "Plain operator solve", level = "debug", skip_all)]
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
    use super::PlainOperator;
    use crate::boundary::{BoundaryClassification, OperatorBoundary};
    use crate::operator::{LinearOperator, SolveTolerances};
    use crate::LinearSolveError;
    use approx::assert_relative_eq;
    use ferrostat_mesher::{Face, Field, Grid, Side};
    use nalgebra::Point3;

    /// A column of `nz` cells, periodic in x and y, Dirichlet at both ends of z
    fn column(nz: usize) -> (Grid, BoundaryClassification) {
        let grid = Grid::new(
            [2, 2, nz],
            Point3::origin(),
            Point3::new(1., 1., 1.),
            [true, true, false],
        );
        let boundaries = BoundaryClassification::uniform(OperatorBoundary::Periodic)
            .with_face(Face::new(Side::Low, 2), OperatorBoundary::Dirichlet)
            .with_face(Face::new(Side::High, 2), OperatorBoundary::Dirichlet);
        (grid, boundaries)
    }

    fn tolerances() -> SolveTolerances {
        SolveTolerances {
            relative: 1e-12,
            absolute: 0.,
        }
    }

    #[test]
    fn solving_before_configuring_is_an_error() {
        let (grid, _) = column(4);
        let mut operator = PlainOperator::new(&grid);
        let mut x = Field::zeros(&grid, 1);
        let rhs = x.zeros_like();
        assert!(matches!(
            operator.solve(&mut x, &rhs, tolerances()),
            Err(LinearSolveError::Unconfigured)
        ));
    }

    #[test]
    fn laplace_between_two_plates_is_linear() {
        let nz = 10;
        let (grid, boundaries) = column(nz);
        let beta = Field::from_element(&grid, 1, 2.);
        let mut values = Field::zeros(&grid, 1);
        for i in -1..=2 {
            for j in -1..=2 {
                values.set(i, j, -1, 1.);
                values.set(i, j, nz as isize, 3.);
            }
        }

        let mut operator = PlainOperator::new(&grid);
        operator.configure(&boundaries, &beta, &values).unwrap();
        operator.set_scalars(0., 1.);
        let mut x = Field::zeros(&grid, 1);
        let rhs = x.zeros_like();
        operator.solve(&mut x, &rhs, tolerances()).unwrap();

        let h = 1. / nz as f64;
        for k in 0..nz as isize {
            let z = (k as f64 + 0.5) * h;
            assert_relative_eq!(x.get(0, 1, k), 1. + 2. * z, epsilon = 1e-9);
        }
        // Ghosts hold the face values and wrap in the periodic directions
        assert_relative_eq!(x.get(0, 0, -1), 1.);
        assert_relative_eq!(x.get(1, 0, nz as isize), 3.);
        assert_relative_eq!(x.get(-1, 0, 3), x.get(1, 0, 3));
    }

    #[test]
    fn uniform_source_gives_a_parabola() {
        let nz = 16;
        let (grid, boundaries) = column(nz);
        let beta = Field::from_element(&grid, 1, 1.);
        let values = Field::zeros(&grid, 1);
        let mut operator = PlainOperator::new(&grid);
        operator.configure(&boundaries, &beta, &values).unwrap();
        operator.set_scalars(0., 1.);

        let mut x = Field::zeros(&grid, 1);
        let rhs = Field::from_element(&grid, 1, 2.);
        operator.solve(&mut x, &rhs, tolerances()).unwrap();

        // -phi'' = 2 with phi = 0 on the faces is phi = z (1 - z), which the
        // cell-centred scheme reproduces up to the face treatment
        let h = 1. / nz as f64;
        for k in 0..nz as isize {
            let z = (k as f64 + 0.5) * h;
            assert_relative_eq!(x.get(1, 1, k), z * (1. - z), epsilon = 2. * h * h);
        }
    }

    #[test]
    fn mass_term_shifts_the_solution() {
        let (grid, _) = column(3);
        let boundaries = BoundaryClassification::uniform(OperatorBoundary::Periodic)
            .with_face(Face::new(Side::Low, 2), OperatorBoundary::Neumann)
            .with_face(Face::new(Side::High, 2), OperatorBoundary::Neumann);
        let beta = Field::from_element(&grid, 1, 1.);
        let mut operator = PlainOperator::new(&grid);
        operator.configure(&boundaries, &beta, &beta.zeros_like()).unwrap();

        // (A alpha) x = f with A = -1 and a uniform alpha = -4 gives x = f / 4
        operator.set_scalars(-1., 1.);
        operator.set_mass_coefficient(&Field::from_element(&grid, 1, -4.));
        let mut x = Field::zeros(&grid, 1);
        let rhs = Field::from_element(&grid, 1, 2.);
        operator.solve(&mut x, &rhs, tolerances()).unwrap();

        assert_relative_eq!(x.get(0, 0, 1), 0.5, epsilon = 1e-10);
        // Homogeneous Neumann ghosts mirror the interior
        assert_relative_eq!(x.get(0, 0, -1), x.get(0, 0, 0));
        assert_relative_eq!(x.get(0, 0, 3), x.get(0, 0, 2));
    }
}
