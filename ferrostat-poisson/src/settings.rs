//! Immutable parameter sets consumed by the solver kernels
//!
//! Every kernel receives the parameters it needs by reference, nothing is read
//! from global state. All structs deserialize from the application configuration.

use crate::constants::{BOLTZMANN, ELECTRON_CHARGE};
use crate::ConfigurationError;
use serde::Deserialize;

/// The parameterisation used to build the crystal-to-lab rotation
#[derive(Copy, Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RotationConvention {
    /// Full z-x-z Euler composition
    Euler,
    /// Composition of elementary rotations about the lab axes
    DirectionalCosine,
}

impl Default for RotationConvention {
    fn default() -> Self {
        Self::Euler
    }
}

/// Relative permittivities of the material classes
#[derive(Copy, Clone, Debug, Deserialize)]
pub struct MaterialParameters {
    pub epsilon_fe: f64,
    pub epsilon_fe_tphase: f64,
    pub epsilon_de: f64,
    pub epsilon_si: f64,
}

/// Band structure of the semiconductor
#[derive(Copy, Clone, Debug, Deserialize)]
pub struct BandParameters {
    /// Band gap in eV
    pub bandgap: f64,
    /// Electron affinity in eV
    pub affinity: f64,
    /// Effective conduction band density of states in m^-3
    pub conduction_band_dos: f64,
    /// Effective valence band density of states in m^-3
    pub valence_band_dos: f64,
    /// Lattice temperature in K
    pub temperature: f64,
}

impl BandParameters {
    /// Thermal voltage `kT / q` in V
    pub fn thermal_voltage(&self) -> f64 {
        BOLTZMANN * self.temperature / ELECTRON_CHARGE
    }

    /// The intrinsic level measured from the vacuum level, in V
    pub fn reference_potential(&self) -> f64 {
        self.affinity
            + 0.5 * self.bandgap
            + 0.5 * BOLTZMANN * self.temperature
                * (self.conduction_band_dos / self.valence_band_dos).ln()
                / ELECTRON_CHARGE
    }

    /// The intrinsic carrier density `sqrt(Nc Nv) exp(-Eg / 2 Vt)` in m^-3
    pub fn intrinsic_density(&self) -> f64 {
        (self.conduction_band_dos * self.valence_band_dos).sqrt()
            * (-self.bandgap / (2. * self.thermal_voltage())).exp()
    }
}

/// Potentials imposed on the bottom and top of the stack
#[derive(Copy, Clone, Debug, Deserialize)]
pub struct ContactParameters {
    /// Potential of the low-z ghost layer in V
    pub low_potential: f64,
    /// Applied potential of the high-z contact in V
    pub high_potential: f64,
    /// Metal work function in eV, the reference potential is used when absent
    #[serde(default)]
    pub work_function: Option<f64>,
    /// Whether the fixed z contact rule overrides the declared z boundary values
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl ContactParameters {
    /// The value written into the high-z ghost layer
    pub fn high_boundary_value(&self, band: &BandParameters) -> f64 {
        let reference = band.reference_potential();
        let metal = self.work_function.unwrap_or(reference);
        self.high_potential - (metal - reference)
    }
}

#[derive(Copy, Clone, Debug, Deserialize)]
pub struct SolverSettings {
    #[serde(default)]
    pub rotation_convention: RotationConvention,
    /// Potential perturbation used by the finite-difference Newton step, in V
    #[serde(default = "default_newton_delta")]
    pub newton_delta: f64,
    /// Verbosity of the linear solve, residuals are traced above 1
    #[serde(default)]
    pub verbosity: usize,
    /// Passes after which the self-consistent loop gives up and reports non-convergence
    #[serde(default = "default_hard_iteration_limit")]
    pub hard_iteration_limit: usize,
    /// Tolerance of the steady-state monitor
    #[serde(default = "default_steady_state_tolerance")]
    pub steady_state_tolerance: f64,
    /// Whether boundary expressions take time as a fourth argument
    #[serde(default)]
    pub time_dependent_boundaries: bool,
}

fn default_newton_delta() -> f64 {
    1e-6
}

fn default_hard_iteration_limit() -> usize {
    100
}

fn default_steady_state_tolerance() -> f64 {
    1e-5
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            rotation_convention: RotationConvention::default(),
            newton_delta: default_newton_delta(),
            verbosity: 0,
            hard_iteration_limit: default_hard_iteration_limit(),
            steady_state_tolerance: default_steady_state_tolerance(),
            time_dependent_boundaries: false,
        }
    }
}

impl SolverSettings {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.newton_delta.is_finite() || self.newton_delta == 0. {
            return Err(ConfigurationError::Setting(format!(
                "the Newton perturbation must be finite and non-zero, found {}",
                self.newton_delta
            )));
        }
        if self.hard_iteration_limit == 0 {
            return Err(ConfigurationError::Setting(
                "the hard iteration limit must allow at least one pass".into(),
            ));
        }
        if self.steady_state_tolerance <= 0. {
            return Err(ConfigurationError::Setting(format!(
                "the steady-state tolerance must be positive, found {}",
                self.steady_state_tolerance
            )));
        }
        Ok(())
    }
}

impl MaterialParameters {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let values = [
            ("epsilon_fe", self.epsilon_fe),
            ("epsilon_fe_tphase", self.epsilon_fe_tphase),
            ("epsilon_de", self.epsilon_de),
            ("epsilon_si", self.epsilon_si),
        ];
        match values.iter().find(|(_, value)| *value <= 0. || !value.is_finite()) {
            Some((name, value)) => Err(ConfigurationError::Setting(format!(
                "relative permittivity `{name}` must be strictly positive, found {value}"
            ))),
            None => Ok(()),
        }
    }
}
