//! Controls the deserialization of the layer stack and the construction of the
//! cell fields the electrostatic solver consumes

/// Cell fields built from a meshed layer stack
mod fields;
/// The deserialization and storage of the `Device`
pub(crate) mod reader;

pub use fields::DeviceFields;
pub use reader::{Device, DeviceError, Layer};

use ferrostat_poisson::Region;

#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Deserialize)]
#[non_exhaustive]
/// Enum with all implemented material classes
///
/// As materials may be added in future this is labelled as `non_exhaustive`
pub enum Material {
    /// Carries a polarization, optionally in the alternate phase
    Ferroelectric,
    /// Linear insulator
    Dielectric,
    /// Hosts free carriers
    Semiconductor,
    /// Separates the ferroelectric from its neighbours without carrying charge
    Spacer,
    /// A conductor, removed from the problem when running with an embedded body
    Metal,
}

impl std::fmt::Display for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Material::Ferroelectric => write!(f, "ferroelectric"),
            Material::Dielectric => write!(f, "dielectric"),
            Material::Semiconductor => write!(f, "semiconductor"),
            Material::Spacer => write!(f, "spacer"),
            Material::Metal => write!(f, "metal"),
        }
    }
}

impl Material {
    /// The region the solver sees for this material
    ///
    /// Metal layers are dielectric to the plain operator, the embedded operator
    /// removes them altogether.
    pub fn region(&self) -> Region {
        match self {
            Material::Ferroelectric => Region::Ferroelectric,
            Material::Dielectric | Material::Metal => Region::Dielectric,
            Material::Semiconductor => Region::Semiconductor,
            Material::Spacer => Region::Spacer,
        }
    }
}
