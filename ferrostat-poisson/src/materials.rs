use crate::AngleFields;
use ferrostat_mesher::Field;

/// The material class of a cell, decoded from the real-valued material mask
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Region {
    Ferroelectric,
    Dielectric,
    Semiconductor,
    /// Any other mask value, electrically a dielectric
    Spacer,
}

impl Region {
    pub fn from_mask(value: f64) -> Self {
        if value == 0. {
            Region::Ferroelectric
        } else if value == 1. {
            Region::Dielectric
        } else if value >= 2. {
            Region::Semiconductor
        } else {
            Region::Spacer
        }
    }

    pub fn mask_value(&self) -> f64 {
        match self {
            Region::Ferroelectric => 0.,
            Region::Dielectric => 1.,
            Region::Semiconductor => 2.,
            Region::Spacer => -1.,
        }
    }
}

/// Static description of the heterostructure, set up once before any solve
#[derive(Clone, Debug)]
pub struct MaterialFields {
    /// Material class of each cell, see [`Region::from_mask`]
    pub mask: Field,
    /// `1` marks the alternate ferroelectric phase
    pub tphase: Field,
    pub angles: AngleFields,
}

impl MaterialFields {
    pub fn region_at(&self, i: isize, j: isize, k: isize) -> Region {
        Region::from_mask(self.mask.get(i, j, k))
    }

    pub fn is_tphase(&self, i: isize, j: isize, k: isize) -> bool {
        self.tphase.get(i, j, k) == 1.
    }

    pub fn contains_semiconductor(&self) -> bool {
        contains_semiconductor(&self.mask)
    }
}

/// Whether any valid cell of `mask` is semiconductor
pub fn contains_semiconductor(mask: &Field) -> bool {
    mask.valid()
        .iter()
        .any(|&value| Region::from_mask(value) == Region::Semiconductor)
}

/// Crystal-frame polarization, owned by the caller and read-only to the solver
#[derive(Clone, Debug)]
pub struct Polarization {
    pub components: [Field; 3],
}

impl Polarization {
    pub fn zeros(template: &Field) -> Self {
        Self {
            components: [
                template.zeros_like(),
                template.zeros_like(),
                template.zeros_like(),
            ],
        }
    }
}
