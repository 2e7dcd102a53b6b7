//! Characteristic variables, pressures and fluxes of the 1D vessel model.
//!
//! The system in `(Q, A)` has eigenvalues `Q/A -+ c(A)` with
//! `c(A) = c0 (A/A0)^(1/4)`. `W1` travels with the first (backward)
//! characteristic and `W2` with the second (forward) one.

use hf_core::Real;

use crate::physical::PhysicalData;

/// `4 c0 (A/A0)^(1/4)`, the part shared by both invariants.
#[inline]
fn wave_term(a: Real, data: &PhysicalData) -> Real {
    4.0 * data.c0 * (a / data.a0).powf(0.25)
}

/// Backward characteristic `W1 = -Q/A + 4 c0 (A/A0)^(1/4)`.
#[inline]
pub fn calculate_w1(q: Real, a: Real, data: &PhysicalData) -> Real {
    -q / a + wave_term(a, data)
}

/// Forward characteristic `W2 = Q/A + 4 c0 (A/A0)^(1/4)`.
#[inline]
pub fn calculate_w2(q: Real, a: Real, data: &PhysicalData) -> Real {
    q / a + wave_term(a, data)
}

/// Recover `(Q, A)` from the two characteristic values.
#[inline]
pub fn solve_w12(w1: Real, w2: Real, data: &PhysicalData) -> (Real, Real) {
    let a = data.a0 * ((w1 + w2) / (8.0 * data.c0)).powi(4);
    let q = 0.5 * a * (w2 - w1);
    (q, a)
}

/// Static pressure `p(A) = G0 (sqrt(A/A0) - 1)`.
#[inline]
pub fn static_pressure(a: Real, data: &PhysicalData) -> Real {
    data.g0 * ((a / data.a0).sqrt() - 1.0)
}

/// Total pressure `p(A) + rho/2 (Q/A)^2`.
#[inline]
pub fn total_pressure(q: Real, a: Real, data: &PhysicalData) -> Real {
    static_pressure(a, data) + 0.5 * data.rho * (q / a).powi(2)
}

/// Inverse of the pressure-area law.
#[inline]
pub fn area_from_pressure(p: Real, data: &PhysicalData) -> Real {
    data.a0 * (p / data.g0 + 1.0).powi(2)
}

/// Momentum flux `Q^2/A + G0 / (3 rho sqrt(A0)) A^(3/2)`.
#[inline]
pub fn momentum_flux(q: Real, a: Real, data: &PhysicalData) -> Real {
    q * q / a + data.g0 / (3.0 * data.rho * data.a0.sqrt()) * a.powf(1.5)
}

/// Physical flux `(F_Q, F_A)` of the conservation law.
#[inline]
pub fn physical_flux(q: Real, a: Real, data: &PhysicalData) -> (Real, Real) {
    (momentum_flux(q, a, data), q)
}

/// Local wave speed `c(A)`.
#[inline]
pub fn wave_speed(a: Real, data: &PhysicalData) -> Real {
    data.c0 * (a / data.a0).powf(0.25)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hf_core::{Tolerances, nearly_equal};

    fn data() -> PhysicalData {
        PhysicalData::set_from_data(4e5, 0.067, 1.028e-3, 9.0, 0.403, 42.2).unwrap()
    }

    #[test]
    fn invariants_invert_to_state() {
        let d = data();
        let (q, a) = (12.5, 1.1 * d.a0);
        let (q2, a2) = solve_w12(calculate_w1(q, a, &d), calculate_w2(q, a, &d), &d);
        let tol = Tolerances {
            abs: 1e-10,
            rel: 1e-10,
        };
        assert!(nearly_equal(q, q2, tol));
        assert!(nearly_equal(a, a2, tol));
    }

    #[test]
    fn rest_state_has_zero_pressure() {
        let d = data();
        assert_eq!(static_pressure(d.a0, &d), 0.0);
        assert_eq!(total_pressure(0.0, d.a0, &d), 0.0);
        assert_eq!(wave_speed(d.a0, &d), d.c0);
    }

    #[test]
    fn pressure_area_law_round_trip() {
        let d = data();
        for p in [-100.0, 0.0, 5.0, 1.2e4] {
            let a = area_from_pressure(p, &d);
            assert!((static_pressure(a, &d) - p).abs() < 1e-8 * (1.0 + p.abs()));
        }
    }

    #[test]
    fn momentum_flux_derivative_matches_pressure_gradient() {
        // d/dA of the pressure part equals A/rho dp/dA
        let d = data();
        let a = 1.3 * d.a0;
        let h = 1e-6 * a;
        let dflux = (momentum_flux(0.0, a + h, &d) - momentum_flux(0.0, a - h, &d)) / (2.0 * h);
        let dp = (static_pressure(a + h, &d) - static_pressure(a - h, &d)) / (2.0 * h);
        assert!((dflux - a / d.rho * dp).abs() < 1e-5 * dflux.abs());
    }
}
