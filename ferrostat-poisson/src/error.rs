use crate::Arity;
use ferrostat_mesher::Face;
use miette::Diagnostic;

#[derive(thiserror::Error, Debug, Diagnostic)]
/// Umbrella error for a self-consistent solve
pub enum ElectrostaticError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Carrier(#[from] CarrierError),
    #[error(transparent)]
    LinearSolve(#[from] LinearSolveError),
}

#[derive(thiserror::Error, Debug, Diagnostic)]
/// Problems with the problem definition, always raised before any field is written
pub enum ConfigurationError {
    #[error("the boundary table must have 2 rows of 3 faces, found rows of length {0:?}")]
    #[diagnostic(help("declare one entry for each of the x, y and z faces on the low and high side"))]
    BoundaryTableShape(Vec<usize>),
    #[error("face {face} is declared periodic but the grid is not periodic along its axis")]
    PeriodicFaceOnBoundedAxis { face: Face },
    #[error("the grid is periodic along the axis of face {face} but the face is declared {kind}")]
    BoundedFaceOnPeriodicAxis { face: Face, kind: String },
    #[error("periodic face {face} cannot carry a boundary value")]
    InhomogeneousPeriodicFace { face: Face },
    #[error("face {face} refers to an expression which cannot be used")]
    MissingExpression {
        face: Face,
        #[source]
        source: ExpressionError,
    },
    #[error("field covers {found:?} cells but the grid has {expected:?}")]
    FieldShape {
        expected: [usize; 3],
        found: [usize; 3],
    },
    #[error("{0}")]
    Setting(String),
}

#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum ExpressionError {
    #[error("no expression named `{0}` is registered")]
    Unknown(String),
    #[error("expression `{name}` takes {declared} but was requested for {requested}")]
    ArityMismatch {
        name: String,
        declared: Arity,
        requested: Arity,
    },
}

#[derive(thiserror::Error, Debug, Diagnostic)]
/// Failures of the carrier-density closure
pub enum CarrierError {
    #[error("carrier density is not finite at cell ({i}, {j}, {k}) where the potential is {potential}")]
    #[diagnostic(help("the potential may have diverged, try a smaller Newton perturbation"))]
    NonFinite {
        i: isize,
        j: isize,
        k: isize,
        potential: f64,
    },
}

#[derive(thiserror::Error, Debug, Diagnostic)]
/// Failures reported by a linear operator
pub enum LinearSolveError {
    #[error("the linear solve did not converge in {iterations} iterations, relative residual {residual:e}")]
    NotConverged { iterations: usize, residual: f64 },
    #[error("the linear operator was used before it was configured")]
    Unconfigured,
    #[error(transparent)]
    Pattern(#[from] nalgebra_sparse::pattern::SparsityPatternFormatError),
    #[error("the assembled matrix is malformed: {0}")]
    Construction(String),
}

impl From<nalgebra_sparse::SparseFormatError> for LinearSolveError {
    fn from(error: nalgebra_sparse::SparseFormatError) -> Self {
        Self::Construction(error.to_string())
    }
}

#[cfg(test)]
mod test {
    use super::{ElectrostaticError, LinearSolveError};
    use nalgebra_sparse::{SparseFormatError, SparseFormatErrorKind};

    fn assert_thread_safe<T: Send + Sync + 'static>() {}

    #[test]
    fn errors_can_be_sent_between_threads() {
        assert_thread_safe::<LinearSolveError>();
        assert_thread_safe::<ElectrostaticError>();
    }

    #[test]
    fn malformed_matrices_keep_their_message() {
        let error: LinearSolveError = SparseFormatError::from_kind_and_msg(
            SparseFormatErrorKind::InvalidStructure,
            "column indices are not sorted",
        )
        .into();
        assert!(matches!(error, LinearSolveError::Construction(_)));
        assert!(error.to_string().contains("column indices are not sorted"));
    }
}
