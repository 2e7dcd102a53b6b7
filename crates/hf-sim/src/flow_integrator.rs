//! Accumulated outflow through the lumped tips.

use std::collections::BTreeMap;

use hf_core::VertexId;

use crate::error::{SimError, SimResult};
use crate::solver::ExplicitNonlinearFlowSolver;

/// Integrates the tip outflows over time, starting at `t_start`.
///
/// Outflow is sampled once per step at the step's start time and held
/// constant over the step.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowIntegrator {
    t_start: f64,
    window: f64,
    volumes: BTreeMap<VertexId, f64>,
}

impl FlowIntegrator {
    pub fn new(t_start: f64) -> Self {
        Self {
            t_start,
            window: 0.0,
            volumes: BTreeMap::new(),
        }
    }

    /// Add the outflow of the step `[t, t + tau]`. Steps starting before
    /// `t_start` are ignored.
    ///
    /// Collective, like [`ExplicitNonlinearFlowSolver::tip_outflows`]; all
    /// ranks have to call it for the same steps.
    pub fn update_flow(
        &mut self,
        solver: &mut ExplicitNonlinearFlowSolver,
        t: f64,
        tau: f64,
    ) -> SimResult<()> {
        if !(tau > 0.0) {
            return Err(SimError::InvalidArg {
                what: "tau must be positive",
            });
        }
        if t < self.t_start {
            return Ok(());
        }
        let outflows = solver.tip_outflows(t)?;
        self.add(&outflows, tau);
        Ok(())
    }

    /// Add constant flows held for `tau`.
    pub fn add(&mut self, flows: &BTreeMap<VertexId, f64>, tau: f64) {
        for (&v, &q) in flows {
            *self.volumes.entry(v).or_insert(0.0) += q * tau;
        }
        self.window += tau;
    }

    /// Volume that left through every tip so far.
    pub fn volumes(&self) -> &BTreeMap<VertexId, f64> {
        &self.volumes
    }

    /// Volume that left through the tips of all ranks.
    ///
    /// Collective; every rank has to call it.
    pub fn total_volume(&self, solver: &ExplicitNonlinearFlowSolver) -> SimResult<f64> {
        let local: f64 = self.volumes.values().sum();
        let sum = solver
            .evaluator()
            .communicator()
            .all_reduce_sum(vec![local])?;
        Ok(sum.first().copied().unwrap_or(0.0))
    }

    /// Length of the integrated time window.
    pub fn window(&self) -> f64 {
        self.window
    }

    /// Mean outflow over the window; empty before the first step.
    pub fn average_flows(&self) -> BTreeMap<VertexId, f64> {
        if self.window <= 0.0 {
            return BTreeMap::new();
        }
        self.volumes
            .iter()
            .map(|(&v, &volume)| (v, volume / self.window))
            .collect()
    }
}
