// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The self-consistent Poisson loop
//!
//! Each pass assembles the source at the current potential, linearises the carrier
//! charge with a finite-difference Newton step, and solves the resulting linear
//! problem for a new potential. The carriers are then refreshed at the new potential
//! and the relative change of the potential decides whether another pass is needed.
//!
//! Before the loop runs, [`setup_operator`] prepares the operator: it classifies the
//! boundaries, builds the permittivity, writes boundary data into the ghost cells of
//! the potential and hands both to [`LinearOperator::configure`].

use crate::boundary::{
    apply_contact_rule, classify, compile_boundary_expressions, fill_constant_boundaries,
    fill_function_boundaries, BoundaryClassification, BoundaryConditions,
};
use crate::constants::{SELF_CONSISTENT_TOLERANCE, SOFT_ITERATION_CAP};
use crate::operator::{LinearOperator, SolveTolerances};
use crate::{
    apply_newton_correction, initialise_permittivity, newton_coefficient, Arity, BandParameters,
    CarrierDensity, Carriers, ConfigurationError, ContactParameters, ElectrostaticError,
    ExpressionEvaluator, MaterialFields, MaterialParameters, PoissonSource, SolverSettings,
};
use ferrostat_mesher::{Field, Grid, SPACEDIM};
use ndarray::Zip;

/// The potential together with the carrier densities it implies
#[derive(Clone, Debug)]
pub struct ElectrostaticState {
    pub phi: Field,
    pub carriers: Carriers,
}

impl ElectrostaticState {
    /// A state with the given potential and no carriers
    pub fn new(phi: Field) -> Self {
        let carriers = Carriers::zeros_like(&phi);
        Self { phi, carriers }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SelfConsistentReport {
    /// Number of passes taken
    pub iterations: usize,
    /// Relative L1 change of the potential over the final pass
    pub error: f64,
    pub converged: bool,
}

/// Everything that defines the electrostatic problem apart from the source terms
#[derive(Debug)]
pub struct ProblemDefinition<'a, E> {
    pub grid: &'a Grid,
    pub materials: &'a MaterialFields,
    pub material_parameters: &'a MaterialParameters,
    pub conditions: &'a BoundaryConditions,
    pub evaluator: &'a E,
    pub contacts: &'a ContactParameters,
    pub band: &'a BandParameters,
}

impl<'a, E> ProblemDefinition<'a, E> {
    fn check_shape(&self, field: &Field) -> Result<(), ConfigurationError> {
        let expected = self.grid.n_cell();
        if field.n_cell() != expected {
            return Err(ConfigurationError::FieldShape {
                expected,
                found: field.n_cell(),
            });
        }
        Ok(())
    }
}

/// Prepares `operator` for the self-consistent loop and returns the boundary
/// classification and the permittivity it was configured with.
///
/// Every check runs before anything is written, so on a configuration error both
/// `phi` and `operator` are unchanged. The ghost cells of `phi` are filled in order
/// with the constant boundary values, the function boundary values at `time` (or
/// without a time argument when `time` is `None`), the periodic halos and finally
/// the contact potentials on the z faces.
#[tracing::instrument(name = "Operator setup", level = "debug", skip_all)]
pub fn setup_operator<O, E>(
    operator: &mut O,
    problem: &ProblemDefinition<E>,
    settings: &SolverSettings,
    phi: &mut Field,
    time: Option<f64>,
) -> Result<(BoundaryClassification, Field), ElectrostaticError>
where
    O: LinearOperator,
    E: ExpressionEvaluator,
{
    settings.validate()?;
    problem.material_parameters.validate()?;
    problem.conditions.validate(problem.grid.periodicity())?;
    problem.check_shape(phi)?;
    problem.check_shape(&problem.materials.mask)?;
    let arity = match time {
        Some(_) => Arity::SpaceTime,
        None => Arity::Space,
    };
    compile_boundary_expressions(problem.conditions, problem.evaluator, arity)?;

    let classification = classify(problem.conditions);
    let beta = initialise_permittivity(
        problem.materials,
        problem.material_parameters,
        &classification,
    );

    if classification.flags.constant {
        fill_constant_boundaries(phi, problem.grid, problem.conditions);
    }
    if classification.flags.function {
        fill_function_boundaries(phi, problem.grid, problem.conditions, problem.evaluator, time)?;
    }
    let periodicity: [bool; SPACEDIM] = [0, 1, 2].map(|axis| classification.is_periodic(axis));
    phi.fill_boundary(periodicity);
    apply_contact_rule(phi, problem.grid, problem.contacts, problem.band);

    operator.configure(&classification, &beta, phi)?;
    Ok((classification, beta))
}

pub struct SelfConsistentLoopBuilder<RefSource, RefClosure, RefOperator, RefSettings> {
    source: RefSource,
    closure: RefClosure,
    operator: RefOperator,
    settings: RefSettings,
}

impl SelfConsistentLoopBuilder<(), (), (), ()> {
    pub fn new() -> Self {
        Self {
            source: (),
            closure: (),
            operator: (),
            settings: (),
        }
    }
}

impl Default for SelfConsistentLoopBuilder<(), (), (), ()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<RefSource, RefClosure, RefOperator, RefSettings>
    SelfConsistentLoopBuilder<RefSource, RefClosure, RefOperator, RefSettings>
{
    pub fn with_source<Source>(
        self,
        source: &Source,
    ) -> SelfConsistentLoopBuilder<&Source, RefClosure, RefOperator, RefSettings> {
        SelfConsistentLoopBuilder {
            source,
            closure: self.closure,
            operator: self.operator,
            settings: self.settings,
        }
    }

    pub fn with_closure<Closure>(
        self,
        closure: &Closure,
    ) -> SelfConsistentLoopBuilder<RefSource, &Closure, RefOperator, RefSettings> {
        SelfConsistentLoopBuilder {
            source: self.source,
            closure,
            operator: self.operator,
            settings: self.settings,
        }
    }

    pub fn with_operator<Operator>(
        self,
        operator: &mut Operator,
    ) -> SelfConsistentLoopBuilder<RefSource, RefClosure, &mut Operator, RefSettings> {
        SelfConsistentLoopBuilder {
            source: self.source,
            closure: self.closure,
            operator,
            settings: self.settings,
        }
    }

    pub fn with_settings(
        self,
        settings: &SolverSettings,
    ) -> SelfConsistentLoopBuilder<RefSource, RefClosure, RefOperator, &SolverSettings> {
        SelfConsistentLoopBuilder {
            source: self.source,
            closure: self.closure,
            operator: self.operator,
            settings,
        }
    }
}

impl<'a, C, O>
    SelfConsistentLoopBuilder<&'a PoissonSource<'a>, &'a C, &'a mut O, &'a SolverSettings>
where
    C: CarrierDensity,
    O: LinearOperator,
{
    pub fn build(self) -> SelfConsistentLoop<'a, C, O> {
        SelfConsistentLoop {
            source: self.source,
            closure: self.closure,
            operator: self.operator,
            settings: self.settings,
            tolerances: SolveTolerances::default(),
        }
    }
}

/// A configured self-consistent loop, generic over the carrier closure and the operator
pub struct SelfConsistentLoop<'a, C, O> {
    source: &'a PoissonSource<'a>,
    closure: &'a C,
    operator: &'a mut O,
    settings: &'a SolverSettings,
    tolerances: SolveTolerances,
}

/// Relative L1 change between two potentials, a vanishing potential which did not move has zero change
fn relative_change(phi: &Field, previous: &Field) -> f64 {
    let change = Zip::from(phi.valid())
        .and(previous.valid())
        .fold(0., |acc: f64, &phi, &previous| acc + (phi - previous).abs());
    if change == 0. {
        return 0.;
    }
    change / phi.norm1()
}

impl<'a, C, O> SelfConsistentLoop<'a, C, O>
where
    C: CarrierDensity,
    O: LinearOperator,
{
    /// Overrides the tolerances of the linear solves
    pub fn with_tolerances(mut self, tolerances: SolveTolerances) -> Self {
        self.tolerances = tolerances;
        self
    }

    /// Iterates until the relative change of the potential drops to the tolerance.
    ///
    /// The operator must have been prepared with [`setup_operator`]. On return the
    /// state holds the last potential and the carriers evaluated at it. Running out
    /// of passes is reported through `converged` rather than as an error.
    ///
    /// The first pass is measured against the incoming potential, so a warm start
    /// which already solves the problem converges after a single pass. On any error
    /// the state keeps the potential and carriers of the last completed pass.
    #[tracing::instrument(name = "Self-consistent loop", skip_all)]
    pub fn run(
        &mut self,
        state: &mut ElectrostaticState,
    ) -> Result<SelfConsistentReport, ElectrostaticError> {
        let materials = self.source.materials();
        let has_semiconductor = materials.contains_semiconductor();
        if !has_semiconductor {
            tracing::debug!("No semiconductor cells, a single pass is sufficient");
        }

        self.closure.update(&state.phi, &materials.mask, &mut state.carriers)?;
        let mut rhs = state.phi.zeros_like();
        // Receives each new potential, after the swap it holds the previous one
        let mut trial = state.phi.zeros_like();
        let mut iterations = 0;

        loop {
            iterations += 1;

            self.source.assemble(&state.carriers.rho, &mut rhs);
            let alpha = newton_coefficient(
                self.source,
                self.closure,
                &state.phi,
                &rhs,
                self.settings.newton_delta,
            )?;
            apply_newton_correction(&mut rhs, &state.phi, &alpha);

            self.operator.set_scalars(-1., 1.);
            self.operator.set_mass_coefficient(&alpha);
            trial.set_val(0.);
            self.operator.solve(&mut trial, &rhs, self.tolerances)?;
            trial.fill_boundary(self.source.periodicity());

            self.closure.update(&trial, &materials.mask, &mut state.carriers)?;
            std::mem::swap(&mut state.phi, &mut trial);

            let error = match has_semiconductor {
                true => relative_change(&state.phi, &trial),
                false => 0.,
            };
            tracing::info!("Pass {iterations}: relative change {error:e}");

            if error <= SELF_CONSISTENT_TOLERANCE {
                return Ok(SelfConsistentReport {
                    iterations,
                    error,
                    converged: true,
                });
            }
            if iterations == SOFT_ITERATION_CAP + 1 {
                tracing::warn!(
                    "Self-consistent loop has taken more than {SOFT_ITERATION_CAP} passes, relative change {error:e}"
                );
            }
            if iterations >= self.settings.hard_iteration_limit {
                tracing::warn!(
                    "Self-consistent loop stopped after {iterations} passes without converging"
                );
                return Ok(SelfConsistentReport {
                    iterations,
                    error,
                    converged: false,
                });
            }
        }
    }
}
