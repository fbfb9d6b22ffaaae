//! This module governs the high-level implementation of the simulation
mod configuration;
mod error;
mod sweep;
mod telemetry;

pub(crate) use configuration::Configuration;

use crate::device::{Device, DeviceFields};
use clap::{ArgEnum, Parser};
use ferrostat_mesher::create_layered_grid;
use ferrostat_poisson::{
    operator::{EmbeddedOperator, LinearOperator, PlainOperator},
    BoltzmannCarriers, ExpressionTable, PoissonSource, ProblemDefinition,
};
use std::path::PathBuf;
use sweep::run_bias_sweep;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct App {
    /// Path to the `.toml` description of the layer stack
    file_path: PathBuf,
    #[clap(arg_enum, short, long, default_value = "info")]
    log_level: LogLevel,
    /// Remove metal layers from the problem with an embedded boundary
    #[clap(long)]
    embedded: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ArgEnum)]
enum LogLevel {
    Trace,
    Info,
    Debug,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Boundary expressions which can be referred to by name in the configuration
fn builtin_expressions() -> ExpressionTable {
    ExpressionTable::new()
        .with_space_expression("ground", |_, _, _| 0.)
        .with_space_expression("lateral_ramp", |x, _, _| x * 1e8)
        .with_space_time_expression("time_ramp", |_, _, _, t| 0.1 * t)
}

/// Reads the configuration and the device, then solves the device at each of its bias points
pub fn run() -> color_eyre::Result<()> {
    let cli = App::parse();

    let (subscriber, _guard) = telemetry::get_subscriber(cli.log_level);
    telemetry::init_subscriber(subscriber)?;

    let config = Configuration::build()?;
    tracing::info!("Reading device from {:?}", cli.file_path);
    let device = Device::build(cli.file_path)?;
    device.validate()?;

    let stack = create_layered_grid(
        config.mesh.unit_size,
        &device.thicknesses(),
        config.mesh.cells_per_unit,
        config.mesh.lateral_size,
        config.mesh.cells_xy,
        config.mesh.periodicity,
    );
    let grid = stack.grid();
    tracing::info!(
        "Meshed {} layers on {:?} cells",
        stack.number_of_layers(),
        grid.n_cell()
    );

    let fields = DeviceFields::build(&device, &stack);
    let closure = BoltzmannCarriers::new(&config.band, fields.net_doping.clone());
    let source = PoissonSource::new(
        grid,
        &fields.materials,
        &fields.polarization,
        config.solver.rotation_convention,
    );
    let conditions = config.boundary_conditions()?;
    let evaluator = builtin_expressions();
    let problem = ProblemDefinition {
        grid,
        materials: &fields.materials,
        material_parameters: &config.materials,
        conditions: &conditions,
        evaluator: &evaluator,
        contacts: &config.contacts,
        band: &config.band,
    };

    match cli.embedded {
        true => {
            let embedded = fields.embedded_boundary();
            tracing::info!(
                "Embedding {} covered cells",
                embedded.number_of_covered_cells()
            );
            let mut operator = EmbeddedOperator::new(grid, embedded)?
                .with_verbosity(config.solver.verbosity);
            build_and_run(&mut operator, &problem, &source, &closure, &config, &device)
        }
        false => {
            let mut operator = PlainOperator::new(grid).with_verbosity(config.solver.verbosity);
            build_and_run(&mut operator, &problem, &source, &closure, &config, &device)
        }
    }
}

fn build_and_run<O: LinearOperator>(
    operator: &mut O,
    problem: &ProblemDefinition<ExpressionTable>,
    source: &PoissonSource,
    closure: &BoltzmannCarriers,
    config: &Configuration,
    device: &Device,
) -> color_eyre::Result<()> {
    let points = run_bias_sweep(
        operator,
        problem,
        source,
        closure,
        &config.solver,
        &device.voltage_offsets,
    )?;
    let unconverged = points
        .iter()
        .filter(|point| !point.report.converged)
        .count();
    tracing::info!(
        "Completed {} bias points, {unconverged} without convergence",
        points.len()
    );
    Ok(())
}

#[cfg(test)]
mod test {
    use super::builtin_expressions;
    use approx::assert_relative_eq;
    use ferrostat_poisson::{Arity, ExpressionEvaluator};

    #[test]
    fn builtin_expressions_compile_with_their_arity() {
        let table = builtin_expressions();
        let ground = table.compile("ground", Arity::Space).unwrap();
        assert_eq!(ground(&[1., 2., 3.]), 0.);
        let ramp = table.compile("time_ramp", Arity::SpaceTime).unwrap();
        assert_relative_eq!(ramp(&[0., 0., 0., 2.]), 0.2);
        assert!(table.compile("time_ramp", Arity::Space).is_err());
    }
}
