use color_eyre::eyre::eyre;
use config::{Config, File};
use ferrostat_poisson::{
    boundary::{BoundaryConditions, BoundarySpec},
    BandParameters, ContactParameters, MaterialParameters, SolverSettings,
};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize)]
pub(crate) struct Configuration {
    pub(crate) mesh: MeshConfiguration,
    #[serde(default)]
    pub(crate) solver: SolverSettings,
    pub(crate) materials: MaterialParameters,
    pub(crate) band: BandParameters,
    pub(crate) contacts: ContactParameters,
    /// Two rows, low then high, of x, y and z faces
    pub(crate) boundaries: Vec<Vec<BoundarySpec>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MeshConfiguration {
    /// Length of one thickness unit of the device file, in m
    pub(crate) unit_size: f64,
    /// Cells along z per thickness unit
    pub(crate) cells_per_unit: usize,
    /// Cells along x and y
    pub(crate) cells_xy: [usize; 2],
    /// Lateral extent in thickness units
    pub(crate) lateral_size: f64,
    pub(crate) periodicity: [bool; 3],
}

impl MeshConfiguration {
    fn validate(&self) -> color_eyre::Result<()> {
        if self.unit_size <= 0. || self.lateral_size <= 0. {
            return Err(eyre!(
                "Mesh sizes must be positive, found unit size {} and lateral size {}",
                self.unit_size,
                self.lateral_size
            ));
        }
        if self.cells_per_unit == 0 || self.cells_xy.contains(&0) {
            return Err(eyre!("Every axis of the mesh needs at least one cell"));
        }
        Ok(())
    }
}

impl Configuration {
    pub(crate) fn build() -> color_eyre::Result<Self> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // The default settings for the simulation which we use in the general case
            .add_source(File::with_name(".config/default"))
            // The override settings which may be set by the user, optional
            .add_source(File::with_name(&format!(".config/{}", run_mode)).required(false))
            .build()?;

        let configuration: Self = s
            .try_deserialize()
            .map_err(|e| eyre!(format!("Failed to deserialize the config file: {:?}", e)))?;
        configuration.validate()?;
        Ok(configuration)
    }

    /// Checks every section, so a bad file fails before any field is built
    pub(crate) fn validate(&self) -> color_eyre::Result<()> {
        self.mesh.validate()?;
        self.solver.validate()?;
        self.materials.validate()?;
        self.boundary_conditions()?.validate(self.mesh.periodicity)?;
        Ok(())
    }

    pub(crate) fn boundary_conditions(&self) -> color_eyre::Result<BoundaryConditions> {
        Ok(BoundaryConditions::from_table(self.boundaries.clone())?)
    }
}
