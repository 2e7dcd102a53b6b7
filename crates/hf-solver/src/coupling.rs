//! Resolution of the coupling conditions at network vertices.
//!
//! All routines are pure functions of the measured boundary state. Flows
//! are signed in the orientation of the edge; `pointing_in` tells whether
//! the edge ends at the vertex (its right end touches the vertex) or starts
//! there. At a vertex, the characteristic leaving the edge towards the
//! vertex is `W2` if the edge points in and `W1` otherwise; the other one
//! enters the edge and is what every rule has to supply.

use hf_graph::formulas::{
    area_from_pressure, calculate_w1, calculate_w2, solve_w12, static_pressure, total_pressure,
};
use hf_graph::{CharacteristicParameters, FreeOutflowParameters, PhysicalData};
use nalgebra::{DMatrix, DVector};

use crate::error::{SolverError, SolverResult};
use crate::newton::{
    NewtonConfig, NewtonOutcome, ScalarNewtonConfig, damped_newton, newton_solve,
};

/// Derivative of `4 c0 (A/A0)^(1/4)` with respect to `A`.
#[inline]
fn wave_term_derivative(a: f64, data: &PhysicalData) -> f64 {
    data.c0 * a.powf(-0.75) / data.a0.powf(0.25)
}

#[inline]
fn wave_term(a: f64, data: &PhysicalData) -> f64 {
    4.0 * data.c0 * (a / data.a0).powf(0.25)
}

#[inline]
fn outgoing_invariant(q: f64, a: f64, pointing_in: bool, data: &PhysicalData) -> f64 {
    if pointing_in {
        calculate_w2(q, a, data)
    } else {
        calculate_w1(q, a, data)
    }
}

/// Combine the measured outgoing invariant with an imposed incoming one.
#[inline]
fn combine(outgoing: f64, incoming: f64, pointing_in: bool, data: &PhysicalData) -> (f64, f64) {
    if pointing_in {
        solve_w12(incoming, outgoing, data)
    } else {
        solve_w12(outgoing, incoming, data)
    }
}

/// Closed-form upwinding between two neighbouring micro-edges.
///
/// `W2` travels right and is taken from the left state, `W1` travels left
/// and is taken from the right state.
pub fn interior_upwind(q_l: f64, a_l: f64, q_r: f64, a_r: f64, data: &PhysicalData) -> (f64, f64) {
    let w2 = calculate_w2(q_l, a_l, data);
    let w1 = calculate_w1(q_r, a_r, data);
    solve_w12(w1, w2, data)
}

/// Area at a prescribed-inflow vertex.
///
/// `q_star` is the target flow already signed in edge orientation. The
/// area satisfies `W_out = +-q_star/A + 4 c0 (A/A0)^(1/4)` for the measured
/// outgoing invariant; the iteration starts at the measured area.
pub fn inflow_area(
    q: f64,
    a: f64,
    pointing_in: bool,
    q_star: f64,
    data: &PhysicalData,
    config: &ScalarNewtonConfig,
) -> NewtonOutcome {
    let w = outgoing_invariant(q, a, pointing_in, data);
    let sign = if pointing_in { 1.0 } else { -1.0 };
    let f = |x: f64| w - sign * q_star / x - wave_term(x, data);
    let df = |x: f64| sign * q_star / (x * x) - wave_term_derivative(x, data);
    damped_newton(f, df, a, config)
}

/// Upwinded state at a free outflow.
pub fn free_outflow(
    q: f64,
    a: f64,
    pointing_in: bool,
    params: &FreeOutflowParameters,
    data: &PhysicalData,
) -> (f64, f64) {
    let q_ref = params.reference_flow;
    let a_ref = params.reference_area.unwrap_or(data.a0);
    let outgoing = outgoing_invariant(q, a, pointing_in, data);
    let incoming = if pointing_in {
        calculate_w1(q_ref, a_ref, data)
    } else {
        calculate_w2(q_ref, a_ref, data)
    };
    combine(outgoing, incoming, pointing_in, data)
}

/// Result of the Windkessel outlet solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindkesselOutflow {
    /// Upwinded flow in edge orientation.
    pub q_up: f64,
    pub a_up: f64,
    /// Flow leaving the network into the lumped element.
    pub q_out: f64,
    pub outcome: NewtonOutcome,
}

/// Couple the edge to a lumped element with capillary pressure `p_c`.
///
/// The outflow through the proximal resistance `R1 = rho c0 / A0` is
/// `(p(A) - p_c) / R1`. Written in terms of the outgoing invariant the
/// condition reads the same for both orientations:
/// `W - (p(A) - p_c)/(A R1) - 4 c0 (A/A0)^(1/4) = 0`.
pub fn windkessel_outflow(
    q: f64,
    a: f64,
    pointing_in: bool,
    p_c: f64,
    data: &PhysicalData,
    config: &ScalarNewtonConfig,
) -> WindkesselOutflow {
    let w = outgoing_invariant(q, a, pointing_in, data);
    let r1 = data.characteristic_resistance();

    let f = |x: f64| w - (static_pressure(x, data) - p_c) / (x * r1) - wave_term(x, data);
    let df = |x: f64| {
        let p = static_pressure(x, data);
        let dp = data.g0 * 0.5 / (x * data.a0).sqrt();
        -dp / (x * r1) + (p - p_c) / (x * x * r1) - wave_term_derivative(x, data)
    };

    let outcome = damped_newton(f, df, a, config);
    let a_up = outcome.value;
    let q_out = (static_pressure(a_up, data) - p_c) / r1;
    let q_up = if pointing_in { q_out } else { -q_out };

    WindkesselOutflow {
        q_up,
        a_up,
        q_out,
        outcome,
    }
}

/// Impose a target `(p, q)` pair through the incoming characteristic.
pub fn characteristic_boundary(
    q: f64,
    a: f64,
    pointing_in: bool,
    params: &CharacteristicParameters,
    data: &PhysicalData,
) -> (f64, f64) {
    let a_star = area_from_pressure(params.pressure, data);
    // entering the network runs against the edge at its right end
    let q_star = if pointing_in == params.inflow {
        -params.flow
    } else {
        params.flow
    };
    let outgoing = outgoing_invariant(q, a, pointing_in, data);
    let incoming = if pointing_in {
        calculate_w1(q_star, a_star, data)
    } else {
        calculate_w2(q_star, a_star, data)
    };
    combine(outgoing, incoming, pointing_in, data)
}

/// Upwinded states of all edges meeting at an n-furcation.
#[derive(Debug, Clone, PartialEq)]
pub struct NfurcationSolution {
    pub q_up: Vec<f64>,
    pub a_up: Vec<f64>,
    pub converged: bool,
    pub iterations: usize,
    pub residual_norm: f64,
}

/// Nonlinear Riemann solve at a vertex joining `n >= 2` edges.
///
/// Unknowns are `[Q_0 .. Q_n-1, A_0 .. A_n-1]`. Rows `0..n` keep the
/// outgoing invariants, row `n` is mass conservation and the remaining rows
/// tie every total pressure to the one of edge 0. Rows are scaled so that
/// all residuals are of comparable magnitude.
pub fn solve_at_nfurcation(
    q: &[f64],
    a: &[f64],
    data: &[PhysicalData],
    pointing_in: &[bool],
    config: &NewtonConfig,
) -> SolverResult<NfurcationSolution> {
    let n = q.len();
    if a.len() != n || data.len() != n || pointing_in.len() != n {
        return Err(SolverError::SizeMismatch {
            what: "n-furcation inputs",
            expected: n,
            got: a.len().min(data.len()).min(pointing_in.len()),
        });
    }
    if n < 2 {
        return Err(SolverError::Numeric {
            what: format!("n-furcation needs at least two edges, got {n}"),
        });
    }

    let measured: Vec<f64> = (0..n)
        .map(|i| outgoing_invariant(q[i], a[i], pointing_in[i], &data[i]))
        .collect();
    let sign: Vec<f64> = pointing_in
        .iter()
        .map(|&inward| if inward { 1.0 } else { -1.0 })
        .collect();
    let flow_scale: f64 = data.iter().map(|d| d.a0 * d.c0).sum();
    let pressure_scale = data[0].g0;

    let residual = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
        let mut r = DVector::zeros(2 * n);
        for i in 0..n {
            let w = outgoing_invariant(x[i], x[n + i], pointing_in[i], &data[i]);
            r[i] = (w - measured[i]) / data[i].c0;
        }
        r[n] = (0..n).map(|i| sign[i] * x[i]).sum::<f64>() / flow_scale;
        let p0 = total_pressure(x[0], x[n], &data[0]);
        for i in 1..n {
            r[n + i] = (p0 - total_pressure(x[i], x[n + i], &data[i])) / pressure_scale;
        }
        Ok(r)
    };

    let jacobian = |x: &DVector<f64>| -> SolverResult<DMatrix<f64>> {
        let mut jac = DMatrix::zeros(2 * n, 2 * n);
        for i in 0..n {
            let (qi, ai) = (x[i], x[n + i]);
            let dwave = wave_term_derivative(ai, &data[i]);
            let (dq, da) = if pointing_in[i] {
                (1.0 / ai, -qi / (ai * ai) + dwave)
            } else {
                (-1.0 / ai, qi / (ai * ai) + dwave)
            };
            jac[(i, i)] = dq / data[i].c0;
            jac[(i, n + i)] = da / data[i].c0;
            jac[(n, i)] = sign[i] / flow_scale;
        }
        let (dq0, da0) = total_pressure_gradient(x[0], x[n], &data[0]);
        for i in 1..n {
            let (dqi, dai) = total_pressure_gradient(x[i], x[n + i], &data[i]);
            jac[(n + i, 0)] = dq0 / pressure_scale;
            jac[(n + i, n)] = da0 / pressure_scale;
            jac[(n + i, i)] = -dqi / pressure_scale;
            jac[(n + i, n + i)] = -dai / pressure_scale;
        }
        Ok(jac)
    };

    let admissible = |x: &DVector<f64>| (n..2 * n).all(|i| x[i] > 0.0);

    let x0 = DVector::from_iterator(2 * n, q.iter().chain(a.iter()).copied());
    let result = newton_solve(x0, residual, jacobian, admissible, config)?;

    Ok(NfurcationSolution {
        q_up: result.x.rows(0, n).iter().copied().collect(),
        a_up: result.x.rows(n, n).iter().copied().collect(),
        converged: result.converged,
        iterations: result.iterations,
        residual_norm: result.residual_norm,
    })
}

/// `(d/dQ, d/dA)` of `p(A) + rho/2 (Q/A)^2`.
#[inline]
fn total_pressure_gradient(q: f64, a: f64, data: &PhysicalData) -> (f64, f64) {
    let dq = data.rho * q / (a * a);
    let da = data.g0 / (2.0 * (a * data.a0).sqrt()) - data.rho * q * q / (a * a * a);
    (dq, da)
}
