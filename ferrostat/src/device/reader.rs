use super::Material;
use color_eyre::eyre::eyre;
use config::{Config, File};
use miette::Diagnostic;
use serde::Deserialize;
use std::{ops::Deref, path::PathBuf};

#[derive(Debug, Deserialize)]
/// A layer stack and the biases to sweep it through
pub struct Device {
    /// Potentials applied to the top contact, in V, visited in order
    pub voltage_offsets: Vec<f64>,
    /// Layers from the bottom contact upwards
    pub layers: Vec<Layer>,
}

impl Deref for Device {
    type Target = Vec<Layer>;

    fn deref(&self) -> &Self::Target {
        &self.layers
    }
}

#[derive(Debug, Deserialize)]
/// A single slab of the stack
pub struct Layer {
    /// Thickness along z in units of the configured unit size
    pub thickness: f64,
    /// Material class of the layer
    pub material: Material,
    /// Ionised acceptor density in m^-3
    #[serde(default)]
    pub acceptor_density: f64,
    /// Ionised donor density in m^-3
    #[serde(default)]
    pub donor_density: f64,
    /// Polarization in the frame of the layer, in C / m^2
    #[serde(default)]
    pub polarization: [f64; 3],
    /// Euler angles `[alpha, beta, theta]` of the layer frame, in degrees
    #[serde(default)]
    pub angles: [f64; 3],
    /// Whether a ferroelectric layer is in its alternate phase
    #[serde(default)]
    pub tphase: bool,
}

#[derive(thiserror::Error, Debug, Diagnostic)]
/// Problems with a layer stack which deserialized correctly
pub enum DeviceError {
    #[error("the device has no layers")]
    /// No layers were declared
    NoLayers,
    #[error("the device declares no voltage offsets")]
    #[diagnostic(help("add `voltage_offsets = [0.0]` to run a single unbiased solve"))]
    /// No bias points were declared
    NoBiasPoints,
    #[error("layer {index} has thickness {thickness}, thicknesses must be positive")]
    /// A layer is empty or inverted
    Thickness {
        /// Position of the layer in the stack
        index: usize,
        /// The offending thickness
        thickness: f64,
    },
    #[error("layer {index} is {material} but declares a polarization")]
    #[diagnostic(help("only ferroelectric layers can carry a polarization"))]
    /// A polarization was given for a material which cannot carry it
    Polarization {
        /// Position of the layer in the stack
        index: usize,
        /// Material of the layer
        material: Material,
    },
}

impl Device {
    /// Deserializes the device from the `.toml` file at `path`
    pub fn build(path: PathBuf) -> color_eyre::Result<Self> {
        let s = Config::builder().add_source(File::from(path)).build()?;
        s.try_deserialize()
            .map_err(|e| eyre!("Failed to deserialize device: {:?}", e))
    }

    /// Checks the stack is physically meaningful
    pub fn validate(&self) -> Result<(), DeviceError> {
        if self.layers.is_empty() {
            return Err(DeviceError::NoLayers);
        }
        if self.voltage_offsets.is_empty() {
            return Err(DeviceError::NoBiasPoints);
        }
        for (index, layer) in self.layers.iter().enumerate() {
            if layer.thickness <= 0. || !layer.thickness.is_finite() {
                return Err(DeviceError::Thickness {
                    index,
                    thickness: layer.thickness,
                });
            }
            if layer.material != Material::Ferroelectric
                && layer.polarization.iter().any(|&p| p != 0.)
            {
                return Err(DeviceError::Polarization {
                    index,
                    material: layer.material,
                });
            }
        }
        Ok(())
    }

    /// Layer thicknesses from the bottom up
    pub fn thicknesses(&self) -> Vec<f64> {
        self.layers.iter().map(|layer| layer.thickness).collect()
    }
}
