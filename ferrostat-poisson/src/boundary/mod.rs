//! Boundary conditions of the potential
//!
//! The user declares one [`BoundarySpec`] per face of the box. Classification maps
//! the declaration onto the boundary types understood by the linear operator and
//! reports which of the filling passes in [`fill`] are needed.

mod fill;

pub use fill::*;

use crate::ConfigurationError;
use ferrostat_mesher::{Face, Side, SPACEDIM};
use serde::Deserialize;

#[derive(Copy, Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryKind {
    Dirichlet,
    Neumann,
    Periodic,
}

impl std::fmt::Display for BoundaryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            BoundaryKind::Dirichlet => write!(f, "Dirichlet"),
            BoundaryKind::Neumann => write!(f, "Neumann"),
            BoundaryKind::Periodic => write!(f, "periodic"),
        }
    }
}

/// The value imposed on a face.
///
/// For Dirichlet faces the value is the potential on the face, for Neumann faces it
/// is the derivative of the potential along the axis of the face.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryValue {
    Homogeneous,
    Constant(f64),
    /// The name of an expression resolved by an [`ExpressionEvaluator`](crate::ExpressionEvaluator)
    Function(String),
}

impl Default for BoundaryValue {
    fn default() -> Self {
        Self::Homogeneous
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct BoundarySpec {
    pub kind: BoundaryKind,
    #[serde(default)]
    pub value: BoundaryValue,
}

impl BoundarySpec {
    pub fn new(kind: BoundaryKind, value: BoundaryValue) -> Self {
        Self { kind, value }
    }

    pub fn periodic() -> Self {
        Self::new(BoundaryKind::Periodic, BoundaryValue::Homogeneous)
    }

    pub fn dirichlet(value: BoundaryValue) -> Self {
        Self::new(BoundaryKind::Dirichlet, value)
    }

    pub fn neumann(value: BoundaryValue) -> Self {
        Self::new(BoundaryKind::Neumann, value)
    }
}

/// A complete declaration, one entry for each of the six faces
#[derive(Clone, Debug, PartialEq)]
pub struct BoundaryConditions {
    faces: [[BoundarySpec; SPACEDIM]; 2],
}

impl BoundaryConditions {
    /// Builds the declaration from rows of `[x, y, z]` entries, low side first
    pub fn from_table(table: Vec<Vec<BoundarySpec>>) -> Result<Self, ConfigurationError> {
        let shape = table.iter().map(|row| row.len()).collect::<Vec<_>>();
        let rows = table
            .into_iter()
            .map(<[BoundarySpec; SPACEDIM]>::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ConfigurationError::BoundaryTableShape(shape.clone()))?;
        let faces = <[[BoundarySpec; SPACEDIM]; 2]>::try_from(rows)
            .map_err(|_| ConfigurationError::BoundaryTableShape(shape))?;
        Ok(Self { faces })
    }

    pub fn get(&self, face: Face) -> &BoundarySpec {
        &self.faces[face.side.index()][face.axis]
    }

    pub fn faces(&self) -> impl Iterator<Item = (Face, &BoundarySpec)> {
        Face::all().map(move |face| (face, self.get(face)))
    }

    /// Checks the declaration is consistent with the periodicity of the grid
    pub fn validate(&self, periodicity: [bool; SPACEDIM]) -> Result<(), ConfigurationError> {
        for (face, spec) in self.faces() {
            match (spec.kind, periodicity[face.axis]) {
                (BoundaryKind::Periodic, false) => {
                    return Err(ConfigurationError::PeriodicFaceOnBoundedAxis { face })
                }
                (BoundaryKind::Periodic, true) if spec.value != BoundaryValue::Homogeneous => {
                    return Err(ConfigurationError::InhomogeneousPeriodicFace { face })
                }
                (BoundaryKind::Dirichlet | BoundaryKind::Neumann, true) => {
                    return Err(ConfigurationError::BoundedFaceOnPeriodicAxis {
                        face,
                        kind: spec.kind.to_string(),
                    })
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Boundary types understood by the linear operator
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OperatorBoundary {
    /// The ghost cell holds the potential on the face
    Dirichlet,
    /// Zero normal derivative
    Neumann,
    /// The ghost cell holds the normal derivative along the axis on the face
    InhomogeneousNeumann,
    Periodic,
}

/// Which boundary filling passes a declaration requires
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct InhomogeneityFlags {
    pub constant: bool,
    pub function: bool,
}

impl InhomogeneityFlags {
    pub fn all_homogeneous(&self) -> bool {
        !(self.constant || self.function)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BoundaryClassification {
    types: [[OperatorBoundary; SPACEDIM]; 2],
    pub flags: InhomogeneityFlags,
}

impl BoundaryClassification {
    pub fn get(&self, face: Face) -> OperatorBoundary {
        self.types[face.side.index()][face.axis]
    }

    /// A classification with the same type on every face, and no inhomogeneity
    pub fn uniform(boundary: OperatorBoundary) -> Self {
        Self {
            types: [[boundary; SPACEDIM]; 2],
            flags: InhomogeneityFlags::default(),
        }
    }

    pub fn with_face(mut self, face: Face, boundary: OperatorBoundary) -> Self {
        self.types[face.side.index()][face.axis] = boundary;
        self
    }

    pub fn is_periodic(&self, axis: usize) -> bool {
        Side::ALL
            .iter()
            .all(|&side| self.get(Face::new(side, axis)) == OperatorBoundary::Periodic)
    }
}

/// Maps each declared face onto its operator boundary type
pub fn classify(conditions: &BoundaryConditions) -> BoundaryClassification {
    let mut classification = BoundaryClassification::uniform(OperatorBoundary::Periodic);
    for (face, spec) in conditions.faces() {
        let boundary = match (spec.kind, &spec.value) {
            (BoundaryKind::Dirichlet, _) => OperatorBoundary::Dirichlet,
            (BoundaryKind::Neumann, BoundaryValue::Homogeneous) => OperatorBoundary::Neumann,
            (BoundaryKind::Neumann, _) => OperatorBoundary::InhomogeneousNeumann,
            (BoundaryKind::Periodic, _) => OperatorBoundary::Periodic,
        };
        classification = classification.with_face(face, boundary);

        if spec.kind != BoundaryKind::Periodic {
            match spec.value {
                BoundaryValue::Constant(_) => classification.flags.constant = true,
                BoundaryValue::Function(_) => classification.flags.function = true,
                BoundaryValue::Homogeneous => {}
            }
        }
    }
    classification
}
