//! Jacobi-preconditioned conjugate gradient for symmetric positive definite systems

use super::{LinearSolveReport, SolveTolerances};
use crate::LinearSolveError;
use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;

#[derive(Copy, Clone, Debug)]
pub(crate) struct KrylovSettings {
    pub(crate) tolerances: SolveTolerances,
    pub(crate) maximum_iterations: usize,
    pub(crate) verbosity: usize,
}

fn inverse_diagonal(matrix: &CsrMatrix<f64>) -> DVector<f64> {
    DVector::from_iterator(
        matrix.nrows(),
        (0..matrix.nrows()).map(|i| {
            let row = matrix.row(i);
            let diagonal = row
                .col_indices()
                .iter()
                .zip(row.values())
                .find(|(&j, _)| j == i)
                .map(|(_, &value)| value)
                .unwrap_or(0.);
            if diagonal != 0. {
                1. / diagonal
            } else {
                1.
            }
        }),
    )
}

/// Solves `matrix x = rhs`, starting from the incoming `x`
#[tracing::instrument(name = "Conjugate gradient", level = "debug", skip_all)]
pub(crate) fn conjugate_gradient(
    matrix: &CsrMatrix<f64>,
    rhs: &DVector<f64>,
    x: &mut DVector<f64>,
    settings: &KrylovSettings,
) -> Result<LinearSolveReport, LinearSolveError> {
    let rhs_norm = rhs.norm();
    if rhs_norm == 0. {
        x.fill(0.);
        return Ok(LinearSolveReport {
            iterations: 0,
            residual: 0.,
        });
    }
    let target = (settings.tolerances.relative * rhs_norm).max(settings.tolerances.absolute);

    let preconditioner = inverse_diagonal(matrix);
    let mut residual = rhs - matrix * &*x;
    let mut z = residual.component_mul(&preconditioner);
    let mut direction = z.clone();
    let mut rz = residual.dot(&z);

    let mut residual_norm = residual.norm();
    for iteration in 0..settings.maximum_iterations {
        if residual_norm <= target {
            return Ok(LinearSolveReport {
                iterations: iteration,
                residual: residual_norm / rhs_norm,
            });
        }
        let q = matrix * &direction;
        let curvature = direction.dot(&q);
        if curvature <= 0. {
            tracing::warn!("Conjugate gradient broke down, the operator is not positive definite");
            break;
        }
        let step = rz / curvature;
        x.axpy(step, &direction, 1.);
        residual.axpy(-step, &q, 1.);
        residual_norm = residual.norm();

        z = residual.component_mul(&preconditioner);
        let rz_next = residual.dot(&z);
        direction.axpy(1., &z, rz_next / rz);
        rz = rz_next;

        if settings.verbosity > 1 {
            tracing::trace!(
                "Iteration {}: relative residual {:e}",
                iteration + 1,
                residual_norm / rhs_norm
            );
        }
    }

    if residual_norm <= target {
        return Ok(LinearSolveReport {
            iterations: settings.maximum_iterations,
            residual: residual_norm / rhs_norm,
        });
    }
    Err(LinearSolveError::NotConverged {
        iterations: settings.maximum_iterations,
        residual: residual_norm / rhs_norm,
    })
}

#[cfg(test)]
mod test {
    use super::{conjugate_gradient, KrylovSettings};
    use crate::operator::SolveTolerances;
    use crate::LinearSolveError;
    use approx::assert_relative_eq;
    use nalgebra::DVector;
    use nalgebra_sparse::{CooMatrix, CsrMatrix};
    use rand::Rng;

    fn laplacian(n: usize, shift: f64) -> CsrMatrix<f64> {
        let mut coo = CooMatrix::new(n, n);
        for i in 0..n {
            coo.push(i, i, 2. + shift);
            if i > 0 {
                coo.push(i, i - 1, -1.);
            }
            if i + 1 < n {
                coo.push(i, i + 1, -1.);
            }
        }
        CsrMatrix::from(&coo)
    }

    fn settings(maximum_iterations: usize) -> KrylovSettings {
        KrylovSettings {
            tolerances: SolveTolerances {
                relative: 1e-12,
                absolute: 0.,
            },
            maximum_iterations,
            verbosity: 0,
        }
    }

    #[test]
    fn solves_a_random_spd_system() {
        let n = 40;
        let matrix = laplacian(n, 0.1);
        let mut rng = rand::thread_rng();
        let expected = DVector::from_fn(n, |_, _| rng.gen::<f64>() - 0.5);
        let dense = nalgebra_sparse::convert::serial::convert_csr_dense(&matrix);
        let rhs: DVector<f64> = &dense * &expected;

        let mut x = DVector::zeros(n);
        let report = conjugate_gradient(&matrix, &rhs, &mut x, &settings(10 * n)).unwrap();
        assert!(report.iterations <= n + 1);
        assert_relative_eq!(x, expected, epsilon = 1e-9);
    }

    #[test]
    fn warm_start_at_the_solution_takes_no_steps() {
        let n = 30;
        let matrix = laplacian(n, 0.5);
        let expected = DVector::from_fn(n, |i, _| (i as f64 * 0.3).sin());
        let rhs: DVector<f64> = &matrix * &expected;
        let dense = nalgebra_sparse::convert::serial::convert_csr_dense(&matrix);
        assert_relative_eq!(rhs, &dense * &expected, epsilon = 1e-14);

        let mut x = expected.clone();
        let report = conjugate_gradient(&matrix, &rhs, &mut x, &settings(1)).unwrap();
        assert_eq!(report.iterations, 0);
        assert_eq!(x, expected);
    }

    #[test]
    fn zero_rhs_returns_zero_immediately() {
        let matrix = laplacian(5, 0.);
        let mut x = DVector::from_element(5, 3.);
        let report = conjugate_gradient(&matrix, &DVector::zeros(5), &mut x, &settings(1)).unwrap();
        assert_eq!(report.iterations, 0);
        assert_eq!(x, DVector::zeros(5));
    }

    #[test]
    fn exhausting_the_iteration_budget_is_an_error() {
        let n = 50;
        let matrix = laplacian(n, 0.);
        let rhs = DVector::from_element(n, 1.);
        let mut x = DVector::zeros(n);
        assert!(matches!(
            conjugate_gradient(&matrix, &rhs, &mut x, &settings(2)),
            Err(LinearSolveError::NotConverged { iterations: 2, .. })
        ));
    }
}
