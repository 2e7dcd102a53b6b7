//! Simulation runner and result recording.

use std::collections::BTreeMap;

use hf_core::VertexId;
use tracing::{debug, info};

use crate::error::{SimError, SimResult};
use crate::solver::ExplicitNonlinearFlowSolver;

/// Integrator selection for simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IntegratorType {
    /// Three-stage SSP Runge-Kutta (default, 3 flux evaluations per step).
    #[default]
    SspRk3,
    /// Forward Euler (1st-order, 1 flux evaluation per step).
    ForwardEuler,
}

/// Options for simulation runs.
#[derive(Clone, Debug)]
pub struct SimOptions {
    /// Fixed time step (seconds)
    pub dt: f64,
    /// Final simulation time (seconds)
    pub t_end: f64,
    /// Maximum number of steps (safety limit)
    pub max_steps: usize,
    /// Record every N-th step (decimation)
    pub record_every: usize,
    /// Integrator type (default: SSP-RK3)
    pub integrator: IntegratorType,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            dt: 5e-5,
            t_end: 1.0,
            max_steps: 1_000_000,
            record_every: 100,
            integrator: IntegratorType::default(),
        }
    }
}

/// Record of simulation results.
#[derive(Clone, Debug)]
pub struct SimRecord<S> {
    /// Time points (seconds)
    pub t: Vec<f64>,
    /// Snapshots
    pub x: Vec<S>,
}

/// Tip pressures of one rank over time.
pub type TipPressureRecord = SimRecord<BTreeMap<VertexId, f64>>;

/// Run a fixed-step simulation from the rest state, recording the owned
/// tip pressures.
///
/// Collective: every rank of the group runs the same steps.
pub fn run_sim(
    solver: &mut ExplicitNonlinearFlowSolver,
    opts: &SimOptions,
) -> SimResult<TipPressureRecord> {
    run_sim_with(solver, opts, |_, _, _| Ok(()))
}

/// Like [`run_sim`], calling `before_step(solver, t, dt)` at the start of
/// every step.
pub fn run_sim_with<F>(
    solver: &mut ExplicitNonlinearFlowSolver,
    opts: &SimOptions,
    mut before_step: F,
) -> SimResult<TipPressureRecord>
where
    F: FnMut(&mut ExplicitNonlinearFlowSolver, f64, f64) -> SimResult<()>,
{
    if !(opts.dt > 0.0) {
        return Err(SimError::InvalidArg {
            what: "dt must be positive",
        });
    }
    if opts.t_end < 0.0 {
        return Err(SimError::InvalidArg {
            what: "t_end must be non-negative",
        });
    }
    if opts.max_steps == 0 {
        return Err(SimError::InvalidArg {
            what: "max_steps must be positive",
        });
    }
    if opts.record_every == 0 {
        return Err(SimError::InvalidArg {
            what: "record_every must be positive",
        });
    }

    solver.set_integrator(opts.integrator);
    solver.set_initial_state();

    let num_steps = step_count(opts.t_end, opts.dt).min(opts.max_steps);
    let mut t = 0.0;
    let mut t_record = vec![t];
    let mut x_record = vec![solver.get_vessel_tip_pressures()?];
    info!(
        dt = opts.dt,
        t_end = opts.t_end,
        num_steps,
        integrator = ?opts.integrator,
        "starting run"
    );

    let mut step = 0;
    while step < num_steps {
        before_step(solver, t, opts.dt)?;
        solver.solve(opts.dt, t)?;
        step += 1;
        t = step as f64 * opts.dt;

        if step % opts.record_every == 0 {
            debug!(step, t, "recording tip pressures");
            t_record.push(t);
            x_record.push(solver.get_vessel_tip_pressures()?);
        }
    }

    // Always record final state
    if step % opts.record_every != 0 {
        t_record.push(t);
        x_record.push(solver.get_vessel_tip_pressures()?);
    }

    info!(steps = step, t, "run finished");
    Ok(SimRecord {
        t: t_record,
        x: x_record,
    })
}

/// Number of steps of size `dt` needed to reach `t_end`.
///
/// A quotient within rounding of a whole number counts as that number.
fn step_count(t_end: f64, dt: f64) -> usize {
    let ratio = t_end / dt;
    (ratio * (1.0 - 1e-12)).ceil().max(0.0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_count_ignores_rounding_of_whole_quotients() {
        assert_eq!(step_count(0.01, 5e-5), 200);
        assert_eq!(step_count(1.0, 0.1), 10);
        assert_eq!(step_count(0.3, 0.1), 3);
        assert_eq!(step_count(1e-2, 2.5e-4 / 16.0), 640);
    }

    #[test]
    fn step_count_rounds_partial_steps_up() {
        assert_eq!(step_count(0.0, 1e-3), 0);
        assert_eq!(step_count(1.05, 0.1), 11);
        assert_eq!(step_count(1e-3, 3e-4), 4);
    }
}
