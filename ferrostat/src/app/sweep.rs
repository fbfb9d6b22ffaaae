//! Drives the self-consistent solve through the bias points of a device
//!
//! The potential is carried from one bias point to the next as the starting guess,
//! and the steady-state monitor measures how far it moved between them.

use super::error::SweepError;
use ferrostat_poisson::{
    operator::LinearOperator, reconstruct_electric_field, setup_operator, CarrierDensity,
    ContactParameters, ElectrostaticState, ExpressionEvaluator, PoissonSource, ProblemDefinition,
    SelfConsistentLoopBuilder, SelfConsistentReport, SolverSettings, SteadyStateCheck,
    SteadyStateMonitor,
};

/// The outcome of the solve at a single applied bias
#[derive(Copy, Clone, Debug)]
pub(crate) struct BiasPoint {
    /// Potential applied to the high contact in V
    pub(crate) bias: f64,
    pub(crate) report: SelfConsistentReport,
    pub(crate) steady_state: SteadyStateCheck,
    /// Largest magnitude of the electric field in V / m
    pub(crate) max_electric_field: f64,
}

/// Solves the problem at each entry of `biases` in turn
///
/// For each point the high contact is set to the bias, the operator is prepared and
/// the self-consistent loop runs from the potential of the previous point.
#[tracing::instrument(name = "Bias sweep", skip_all, fields(points = biases.len()))]
pub(crate) fn run_bias_sweep<O, C, E>(
    operator: &mut O,
    problem: &ProblemDefinition<E>,
    source: &PoissonSource,
    closure: &C,
    settings: &SolverSettings,
    biases: &[f64],
) -> Result<Vec<BiasPoint>, SweepError>
where
    O: LinearOperator,
    C: CarrierDensity,
    E: ExpressionEvaluator,
{
    let mut state = ElectrostaticState::new(problem.materials.mask.zeros_like());
    let mut monitor = SteadyStateMonitor::new(&state.phi, settings.steady_state_tolerance);
    let mut points = Vec::with_capacity(biases.len());

    for (step, &bias) in biases.iter().enumerate() {
        let failed = |source| SweepError::BiasPoint { step, bias, source };
        let contacts = ContactParameters {
            high_potential: bias,
            ..*problem.contacts
        };
        let biased = ProblemDefinition {
            contacts: &contacts,
            ..*problem
        };
        let time = settings.time_dependent_boundaries.then(|| step as f64);
        setup_operator(operator, &biased, settings, &mut state.phi, time)
            .map_err(failed)?;

        let report = SelfConsistentLoopBuilder::new()
            .with_source(source)
            .with_closure(closure)
            .with_operator(operator)
            .with_settings(settings)
            .build()
            .run(&mut state)
            .map_err(failed)?;

        let steady_state = monitor.check(&state.phi, step + 1);
        let field = reconstruct_electric_field(
            &state.phi,
            problem.grid,
            &problem.materials.angles,
            settings.rotation_convention,
        );
        let max_electric_field = field.max_magnitude();

        tracing::info!(
            "Bias {bias} V: {} passes, relative change {:e}, max |E| {max_electric_field:e} V/m",
            report.iterations,
            report.error,
        );
        if !report.converged {
            tracing::warn!("Bias {bias} V did not converge");
        }

        points.push(BiasPoint {
            bias,
            report,
            steady_state,
            max_electric_field,
        });
    }

    if let Some(step) = monitor.steady_state_step() {
        tracing::info!("Potential stopped changing from bias point {step}");
    }
    Ok(points)
}
