use ferrostat_mesher::Field;
use ndarray::Zip;

/// The outcome of comparing the potential against the previous step
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SteadyStateCheck {
    /// `max |phi - phi_old| / max |phi_old|`, or the absolute change when `phi_old` vanishes
    pub max_phi_err: f64,
    /// Whether the change is below tolerance at a step past the first
    pub reached: bool,
}

/// Tracks the change of the potential between outer time or bias steps
#[derive(Clone, Debug)]
pub struct SteadyStateMonitor {
    phi_old: Field,
    tolerance: f64,
    steady_state_step: Option<usize>,
}

impl SteadyStateMonitor {
    /// A monitor whose reference potential is zero on the layout of `template`
    pub fn new(template: &Field, tolerance: f64) -> Self {
        Self {
            phi_old: template.zeros_like(),
            tolerance,
            steady_state_step: None,
        }
    }

    /// The first step at which the change dropped below tolerance
    pub fn steady_state_step(&self) -> Option<usize> {
        self.steady_state_step
    }

    pub fn check(&mut self, phi: &Field, step: usize) -> SteadyStateCheck {
        let change = Zip::from(phi.valid())
            .and(self.phi_old.valid())
            .fold(0., |acc: f64, &phi, &old| acc.max((phi - old).abs()));
        let reference = self.phi_old.norm0();
        let max_phi_err = if reference > 0. {
            change / reference
        } else {
            change
        };

        let reached = step > 1 && max_phi_err < self.tolerance;
        if reached && self.steady_state_step.is_none() {
            tracing::info!("Steady state reached at step {step}, max relative change {max_phi_err:e}");
            self.steady_state_step = Some(step);
        }

        self.phi_old.copy_valid_from(phi);
        SteadyStateCheck {
            max_phi_err,
            reached,
        }
    }
}
