//! Global assembly of the seven-point stencil
//!
//! The potential-independent part of the operator, `-div(beta grad)` together with
//! the boundary contributions, is assembled once when the operator is configured.
//! Each solve rescales it by `B` and adds `A alpha` on the diagonal, reusing the
//! sparsity pattern.

use super::EmbeddedBoundary;
use crate::boundary::{BoundaryClassification, OperatorBoundary};
use crate::LinearSolveError;
use ferrostat_mesher::{Face, Field, Side, SPACEDIM};
use nalgebra::DVector;
use nalgebra_sparse::{pattern::SparsityPattern, CsrMatrix};
use rayon::prelude::*;

/// Geometry of the unknowns, cell `(i, j, k)` is row `i + nx (j + ny k)`
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct CellLayout {
    pub(crate) n_cell: [usize; SPACEDIM],
    pub(crate) cell_size: [f64; SPACEDIM],
}

impl CellLayout {
    pub(crate) fn number_of_unknowns(&self) -> usize {
        self.n_cell.iter().product()
    }

    pub(crate) fn cell(&self, row: usize) -> [isize; SPACEDIM] {
        let [nx, ny, _] = self.n_cell;
        [
            (row % nx) as isize,
            ((row / nx) % ny) as isize,
            (row / (nx * ny)) as isize,
        ]
    }

    pub(crate) fn row(&self, cell: [isize; SPACEDIM]) -> usize {
        let [nx, ny, _] = self.n_cell;
        cell[0] as usize + nx * (cell[1] as usize + ny * cell[2] as usize)
    }
}

/// The contribution of one cell to the global system
struct RowEntries {
    columns: Vec<(usize, f64)>,
    source: f64,
    fixed: Option<f64>,
}

/// The assembled, potential-independent part of the operator
#[derive(Debug, Clone)]
pub(crate) struct AssembledStencil {
    pattern: SparsityPattern,
    /// Values of `-div(beta grad)` in the order of `pattern`
    stiffness: Vec<f64>,
    /// Position of the diagonal entry of each row in `stiffness`
    diagonal: Vec<usize>,
    /// Contribution of inhomogeneous boundary data to the right-hand side
    boundary_source: DVector<f64>,
    /// Rows held at a fixed value, the cells covered by an embedded body
    fixed: Vec<Option<f64>>,
}

impl AssembledStencil {
    pub(crate) fn assemble(
        layout: CellLayout,
        boundaries: &BoundaryClassification,
        beta: &Field,
        boundary_values: &Field,
        embedded: Option<&EmbeddedBoundary>,
    ) -> Result<Self, LinearSolveError> {
        let rows = (0..layout.number_of_unknowns())
            .into_par_iter()
            .map(|row| row_entries(layout, row, boundaries, beta, boundary_values, embedded))
            .collect::<Vec<_>>();

        let n = rows.len();
        let mut offsets = Vec::with_capacity(n + 1);
        let mut column_indices = Vec::with_capacity(7 * n);
        let mut stiffness = Vec::with_capacity(7 * n);
        let mut diagonal = Vec::with_capacity(n);
        let mut boundary_source = DVector::zeros(n);
        let mut fixed = Vec::with_capacity(n);

        offsets.push(0);
        for (row, mut entries) in rows.into_iter().enumerate() {
            // Merge repeated columns, which arise when a periodic axis has fewer than three cells
            entries.columns.sort_by_key(|&(column, _)| column);
            let mut merged: Vec<(usize, f64)> = Vec::with_capacity(entries.columns.len());
            for (column, value) in entries.columns {
                match merged.last_mut() {
                    Some((last, total)) if *last == column => *total += value,
                    _ => merged.push((column, value)),
                }
            }
            for (column, value) in merged {
                if column == row {
                    diagonal.push(column_indices.len());
                }
                column_indices.push(column);
                stiffness.push(value);
            }
            offsets.push(column_indices.len());
            boundary_source[row] = entries.source;
            fixed.push(entries.fixed);
        }

        let pattern = SparsityPattern::try_from_offsets_and_indices(n, n, offsets, column_indices)?;

        Ok(Self {
            pattern,
            stiffness,
            diagonal,
            boundary_source,
            fixed,
        })
    }

    /// Builds `A alpha - B div(beta grad)` and the matching right-hand side
    pub(crate) fn system(
        &self,
        a: f64,
        b: f64,
        alpha: Option<&DVector<f64>>,
        rhs: &DVector<f64>,
    ) -> Result<(CsrMatrix<f64>, DVector<f64>), LinearSolveError> {
        let mut values = self.stiffness.iter().map(|value| b * value).collect::<Vec<_>>();
        let mut system_rhs = rhs + &self.boundary_source * b;

        for (row, fixed) in self.fixed.iter().enumerate() {
            let diagonal = self.diagonal[row];
            match fixed {
                Some(value) => {
                    values[diagonal] = 1.;
                    system_rhs[row] = *value;
                }
                None => {
                    if let Some(alpha) = alpha {
                        values[diagonal] += a * alpha[row];
                    }
                }
            }
        }

        let matrix = CsrMatrix::try_from_pattern_and_values(self.pattern.clone(), values)?;
        Ok((matrix, system_rhs))
    }
}

fn row_entries(
    layout: CellLayout,
    row: usize,
    boundaries: &BoundaryClassification,
    beta: &Field,
    boundary_values: &Field,
    embedded: Option<&EmbeddedBoundary>,
) -> RowEntries {
    let cell = layout.cell(row);
    let [i, j, k] = cell;

    if let Some(embedded) = embedded {
        if embedded.is_covered(i, j, k) {
            return RowEntries {
                columns: vec![(row, 1.)],
                source: 0.,
                fixed: Some(embedded.surface_value(i, j, k)),
            };
        }
    }

    let beta_centre = beta.get(i, j, k);
    let mut diagonal = 0.;
    let mut source = 0.;
    let mut columns = Vec::with_capacity(7);

    for axis in 0..SPACEDIM {
        let h = layout.cell_size[axis];
        let n = layout.n_cell[axis] as isize;
        for side in Side::ALL {
            let face = Face::new(side, axis);
            let mut neighbour = cell;
            neighbour[axis] += side.outward();
            let [ni, nj, nk] = neighbour;
            let beta_face = 0.5 * (beta_centre + beta.get(ni, nj, nk));
            let inside = (0..n).contains(&neighbour[axis]);

            if inside || boundaries.get(face) == OperatorBoundary::Periodic {
                neighbour[axis] = neighbour[axis].rem_euclid(n);
                let [ni, nj, nk] = neighbour;
                match embedded {
                    Some(embedded) if embedded.is_covered(ni, nj, nk) => {
                        let coefficient = 2. * beta_centre / (h * h);
                        diagonal += coefficient;
                        source += coefficient * embedded.surface_value(ni, nj, nk);
                    }
                    _ => {
                        let coefficient = beta_face / (h * h);
                        diagonal += coefficient;
                        columns.push((layout.row(neighbour), -coefficient));
                    }
                }
                continue;
            }

            let value = boundary_values.get(ni, nj, nk);
            match boundaries.get(face) {
                // The boundary value sits on the face, half a cell from the centre
                OperatorBoundary::Dirichlet => {
                    let coefficient = 2. * beta_face / (h * h);
                    diagonal += coefficient;
                    source += coefficient * value;
                }
                OperatorBoundary::Neumann => {}
                // The boundary value is the derivative along the axis
                OperatorBoundary::InhomogeneousNeumann => {
                    source += side.outward() as f64 * beta_face * value / h;
                }
                OperatorBoundary::Periodic => unreachable!("periodic faces wrap"),
            }
        }
    }
    columns.push((row, diagonal));

    RowEntries {
        columns,
        source,
        fixed: None,
    }
}
