//! Explicit time-stepper of the network and its coupling interface.

use std::collections::BTreeMap;

use hf_core::{EdgeId, VertexId};
use hf_graph::formulas::static_pressure;
use hf_solver::upwind::{AREA, FLOW};
use hf_solver::{FlowUpwindEvaluator, SolverError};

use crate::error::{SimError, SimResult};
use crate::integrator::{ForwardEuler, Integrator, SspRk3};
use crate::model::TransientModel;
use crate::network::NetworkModel;
use crate::sim::IntegratorType;

/// Relative distance below which a position is treated as a micro-vertex.
const MICRO_VERTEX_TOLERANCE: f64 = 1e-12;

/// Advances the network solution of one rank with an explicit scheme.
///
/// `solve` and `tip_outflows` are collective: all ranks of the group must
/// call them in the same order.
pub struct ExplicitNonlinearFlowSolver {
    model: NetworkModel,
    u: Vec<f64>,
    integrator: IntegratorType,
}

impl ExplicitNonlinearFlowSolver {
    /// Solver starting from the rest state.
    pub fn new(evaluator: FlowUpwindEvaluator) -> SimResult<Self> {
        let model = NetworkModel::new(evaluator)?;
        let u = model.initial_state();
        Ok(Self {
            model,
            u,
            integrator: IntegratorType::default(),
        })
    }

    pub fn with_integrator(mut self, integrator: IntegratorType) -> Self {
        self.integrator = integrator;
        self
    }

    pub fn set_integrator(&mut self, integrator: IntegratorType) {
        self.integrator = integrator;
    }

    pub fn integrator(&self) -> IntegratorType {
        self.integrator
    }

    pub fn model(&self) -> &NetworkModel {
        &self.model
    }

    pub fn evaluator(&self) -> &FlowUpwindEvaluator {
        self.model.evaluator()
    }

    /// Global coefficient vector; only the owned entries are meaningful.
    pub fn solution(&self) -> &[f64] {
        &self.u
    }

    /// Reset every owned edge to `(Q = 0, A = A0)` and the tips to zero.
    pub fn set_initial_state(&mut self) {
        self.u = self.model.initial_state();
    }

    /// Advance the solution from `t` to `t + tau`.
    pub fn solve(&mut self, tau: f64, t: f64) -> SimResult<()> {
        if !(tau > 0.0) || !tau.is_finite() {
            return Err(SimError::InvalidArg {
                what: "tau must be positive and finite",
            });
        }
        self.u = match self.integrator {
            IntegratorType::SspRk3 => SspRk3.step(&mut self.model, t, &self.u, tau)?,
            IntegratorType::ForwardEuler => ForwardEuler.step(&mut self.model, t, &self.u, tau)?,
        };
        Ok(())
    }

    /// Static pressure and flow at the relative position `s` in `[0, 1]`
    /// along an owned edge.
    ///
    /// At an interior micro-vertex the result is the mean of the traces of
    /// the two neighbouring micro-edges, so it does not depend on the
    /// orientation of the edge.
    pub fn evaluate_1d_pq_values(&self, edge: EdgeId, s: f64) -> SimResult<(f64, f64)> {
        if !(0.0..=1.0).contains(&s) {
            return Err(SimError::InvalidArg {
                what: "relative position must lie in [0, 1]",
            });
        }
        let ev = self.model.evaluator();
        let rank = ev.rank();
        if !ev.partition().owns_edge(rank, edge) {
            return Err(SolverError::InactiveEdge { edge, rank }.into());
        }

        let data = ev.graph().edge(edge)?.physical_data()?;
        let local = ev.dof_map().edge(edge)?;
        let n = local.num_micro_edges();
        let x = s * n as f64;
        let fe = ev.fe();
        let trace = |m: usize, xi: f64| {
            let q = fe.evaluate(&self.u[local.dof_indices(m, FLOW)], xi);
            let a = fe.evaluate(&self.u[local.dof_indices(m, AREA)], xi);
            (q, a)
        };

        // interior micro-vertex
        let vertex = x.round();
        let on_vertex = (x - vertex).abs() <= MICRO_VERTEX_TOLERANCE * n as f64;
        if on_vertex && vertex > 0.0 && vertex < n as f64 {
            let k = vertex as usize;
            let (q_l, a_l) = trace(k - 1, 1.0);
            let (q_r, a_r) = trace(k, -1.0);
            let (p_l, p_r) = (static_pressure(a_l, data), static_pressure(a_r, data));
            return Ok((0.5 * (p_l + p_r), 0.5 * (q_l + q_r)));
        }

        let m = (x.floor() as usize).min(n - 1);
        let xi = 2.0 * (x - m as f64) - 1.0;
        let (q, a) = trace(m, xi);
        Ok((static_pressure(a, data), q))
    }

    /// First-level pressure of every owned Windkessel / vessel-tree tip.
    pub fn get_vessel_tip_pressures(&self) -> SimResult<BTreeMap<VertexId, f64>> {
        let dofs = self.model.evaluator().dof_map();
        self.model
            .tips()
            .map(|v| {
                let first = dofs.vertex(v)?.dof_indices().start;
                Ok((v, self.u[first]))
            })
            .collect()
    }

    /// Set the venous pressure of the listed tips.
    ///
    /// The map must name exactly the owned tips; nothing is changed if it
    /// does not.
    pub fn update_vessel_tip_pressures(&mut self, pressures: &BTreeMap<VertexId, f64>) -> SimResult<()> {
        let owned = self.model.venous_pressures();
        if pressures.len() != owned.len() {
            return Err(SimError::TipCount {
                expected: owned.len(),
                got: pressures.len(),
            });
        }
        if let Some(&vertex) = pressures.keys().find(|v| !owned.contains_key(v)) {
            self.model.evaluator().graph().vertex(vertex)?;
            return Err(SimError::NotATip { vertex });
        }
        for (v, &p) in pressures {
            if let Some(slot) = self.model.venous_pressures_mut().get_mut(v) {
                *slot = p;
            }
        }
        Ok(())
    }

    /// Flow leaving the network at every owned tip for the current solution
    /// at time `t`.
    pub fn tip_outflows(&mut self, t: f64) -> SimResult<BTreeMap<VertexId, f64>> {
        let tips: Vec<VertexId> = self.model.tips().collect();
        let ev = self.model.evaluator_mut();
        ev.init(t, &self.u)?;
        tips.into_iter()
            .map(|v| Ok((v, ev.get_outflow_at_leaf(t, v)?)))
            .collect()
    }
}
