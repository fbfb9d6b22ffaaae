//! # Error
//! The error type for the bias sweep

use ferrostat_poisson::ElectrostaticError;
use miette::Diagnostic;

#[derive(thiserror::Error, Debug, Diagnostic)]
pub(crate) enum SweepError {
    #[error("the solve at bias point {step} ({bias} V) failed")]
    #[diagnostic(help("earlier bias points completed, their results were logged"))]
    BiasPoint {
        step: usize,
        bias: f64,
        #[source]
        source: ElectrostaticError,
    },
}

#[cfg(test)]
mod test {
    use super::SweepError;
    use ferrostat_poisson::{ElectrostaticError, LinearSolveError};

    #[test]
    fn sweep_errors_convert_into_reports() {
        let error = SweepError::BiasPoint {
            step: 2,
            bias: 0.75,
            source: ElectrostaticError::LinearSolve(LinearSolveError::Unconfigured),
        };
        let report: color_eyre::Report = error.into();
        assert!(report.to_string().contains("bias point 2"));
        assert!(report
            .chain()
            .any(|cause| cause.to_string().contains("before it was configured")));
    }
}
