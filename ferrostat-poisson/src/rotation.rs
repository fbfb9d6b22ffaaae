//! Crystal-to-lab rotations
//!
//! The polarization is stored in the crystal frame of each cell. The orientation of
//! the crystal is described by three angles in degrees, which are turned into a
//! rotation matrix `R` with one of two parameterisations. Row `m` of `R` maps
//! crystal component `m` onto the lab axes, so the lab-frame divergence of `P` is
//! `sum_m sum_n R[m][n] d_n P_m`.

use crate::RotationConvention;
use ferrostat_mesher::Field;
use nalgebra::Matrix3;

/// Orientation angles of one cell, in degrees
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct EulerAngles {
    pub alpha: f64,
    pub beta: f64,
    pub theta: f64,
}

impl EulerAngles {
    pub fn new(alpha: f64, beta: f64, theta: f64) -> Self {
        Self { alpha, beta, theta }
    }
}

pub fn rotation_matrix(angles: &EulerAngles, convention: RotationConvention) -> Matrix3<f64> {
    let (sa, ca) = angles.alpha.to_radians().sin_cos();
    let (sb, cb) = angles.beta.to_radians().sin_cos();
    let (st, ct) = angles.theta.to_radians().sin_cos();

    match convention {
        RotationConvention::Euler => Matrix3::new(
            ca * ct - cb * sa * st,
            sa * ct + cb * ca * st,
            sb * st,
            -cb * ct * sa - ca * st,
            cb * ca * ct - sa * st,
            sb * ct,
            sa * sb,
            -ca * sb,
            cb,
        ),
        RotationConvention::DirectionalCosine => Matrix3::new(
            cb * ct,
            sa * sb * ct - ca * st,
            ca * sb * ct + sa * st,
            cb * st,
            sb * sa * st + ca * ct,
            ca * sb * st - sa * ct,
            -sb,
            sa * cb,
            ca * cb,
        ),
    }
}

/// Per-cell orientation angles, in degrees
#[derive(Clone, Debug)]
pub struct AngleFields {
    pub alpha: Field,
    pub beta: Field,
    pub theta: Field,
}

impl AngleFields {
    /// All angles zero, so every cell is aligned with the lab frame under either convention
    pub fn aligned(template: &Field) -> Self {
        Self {
            alpha: template.zeros_like(),
            beta: template.zeros_like(),
            theta: template.zeros_like(),
        }
    }

    pub fn angles_at(&self, i: isize, j: isize, k: isize) -> EulerAngles {
        EulerAngles {
            alpha: self.alpha.get(i, j, k),
            beta: self.beta.get(i, j, k),
            theta: self.theta.get(i, j, k),
        }
    }

    pub fn rotation_at(
        &self,
        i: isize,
        j: isize,
        k: isize,
        convention: RotationConvention,
    ) -> Matrix3<f64> {
        rotation_matrix(&self.angles_at(i, j, k), convention)
    }
}
