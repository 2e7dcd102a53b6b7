//! Physical vessel parameters and the pressure-area law.

use std::f64::consts::PI;

use hf_core::{Real, ensure_finite, ensure_positive};

use crate::error::GraphResult;

/// Blood density in g/cm³ as used by the network data files.
pub const DEFAULT_BLOOD_DENSITY: Real = 1.028e-3;

/// Blood viscosity in poise.
pub const DEFAULT_BLOOD_VISCOSITY: Real = 4.5e-2;

/// Poisson ratio of the vessel wall (incompressible).
const POISSON_RATIO: Real = 0.5;

/// Wall stiffness `G0` from wall thickness, elastic modulus and reference area.
pub fn calculate_g0(wall_thickness: Real, elastic_modulus: Real, a0: Real) -> Real {
    PI.sqrt() * wall_thickness * elastic_modulus / ((1.0 - POISSON_RATIO.powi(2)) * a0.sqrt())
}

/// Physical data of a single macro-edge.
///
/// The derived quantities (`g0`, `a0`, `c0`) are computed once in
/// [`PhysicalData::set_from_data`] and stay consistent with the raw inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalData {
    pub elastic_modulus: Real,
    pub wall_thickness: Real,
    pub radius: Real,
    /// Vessel length.
    pub length: Real,
    /// Blood density.
    pub rho: Real,
    /// Velocity profile exponent.
    pub gamma: Real,
    /// Blood viscosity.
    pub viscosity: Real,
    /// Reference cross-section.
    pub a0: Real,
    /// Wall stiffness in `p(A) = G0 (sqrt(A/A0) - 1)`.
    pub g0: Real,
    /// Wave speed at rest, `sqrt(G0 / (2 rho))`.
    pub c0: Real,
}

impl PhysicalData {
    /// Derive the physical data from the raw vessel description.
    pub fn set_from_data(
        elastic_modulus: Real,
        wall_thickness: Real,
        rho: Real,
        gamma: Real,
        radius: Real,
        length: Real,
    ) -> GraphResult<Self> {
        let elastic_modulus = ensure_positive(elastic_modulus, "elastic modulus")?;
        let wall_thickness = ensure_positive(wall_thickness, "wall thickness")?;
        let rho = ensure_positive(rho, "density")?;
        let gamma = ensure_finite(gamma, "gamma")?;
        let radius = ensure_positive(radius, "radius")?;
        let length = ensure_positive(length, "vessel length")?;

        let a0 = PI * radius * radius;
        let g0 = ensure_positive(calculate_g0(wall_thickness, elastic_modulus, a0), "G0")?;
        let c0 = (g0 / (2.0 * rho)).sqrt();

        Ok(Self {
            elastic_modulus,
            wall_thickness,
            radius,
            length,
            rho,
            gamma,
            viscosity: DEFAULT_BLOOD_VISCOSITY,
            a0,
            g0,
            c0,
        })
    }

    /// Replace the viscosity; zero disables wall friction.
    pub fn with_viscosity(mut self, viscosity: Real) -> GraphResult<Self> {
        let viscosity = ensure_finite(viscosity, "viscosity")?;
        if viscosity < 0.0 {
            return Err(hf_core::HfError::NonPositive {
                what: "viscosity",
                value: viscosity,
            }
            .into());
        }
        self.viscosity = viscosity;
        Ok(self)
    }

    /// Proximal resistance `R1 = rho c0 / A0` seen by a lumped outflow element.
    pub fn characteristic_resistance(&self) -> Real {
        self.rho * self.c0 / self.a0
    }

    /// Friction coefficient `K_r` of the momentum source `-K_r Q / A`.
    pub fn friction_coefficient(&self) -> Real {
        2.0 * PI * (self.gamma + 2.0) * self.viscosity / self.rho
    }
}
