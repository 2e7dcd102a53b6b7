//! Discontinuous Galerkin right-hand side of the vessel network.
//!
//! The state is the full global coefficient vector of the DOF map. A rank
//! only computes derivatives of the entries it owns: the coefficients of
//! its edges and the lumped states of its tips. All other entries of the
//! derivative are zero.

use std::collections::BTreeMap;
use std::sync::Arc;

use hf_core::{EdgeId, VertexId};
use hf_graph::BoundaryCondition;
use hf_graph::formulas::physical_flux;
use hf_solver::FlowUpwindEvaluator;
use hf_solver::upwind::{AREA, FLOW};

use crate::error::SimResult;
use crate::model::TransientModel;

/// Vessel network as a transient model for the explicit integrators.
pub struct NetworkModel {
    evaluator: FlowUpwindEvaluator,
    /// Venous pressure of every owned Windkessel / vessel-tree tip.
    venous_pressures: BTreeMap<VertexId, f64>,
    rest: Vec<f64>,
}

impl NetworkModel {
    pub fn new(evaluator: FlowUpwindEvaluator) -> SimResult<Self> {
        let graph = Arc::clone(evaluator.graph());
        let mut venous_pressures = BTreeMap::new();
        for v in evaluator.partition().owned_vertex_ids(evaluator.rank()) {
            if let Some(p_v) = graph.vertex(v)?.boundary().and_then(|bc| bc.venous_pressure()) {
                venous_pressures.insert(v, p_v);
            }
        }
        let rest = rest_state(&evaluator)?;
        Ok(Self {
            evaluator,
            venous_pressures,
            rest,
        })
    }

    pub fn evaluator(&self) -> &FlowUpwindEvaluator {
        &self.evaluator
    }

    pub(crate) fn evaluator_mut(&mut self) -> &mut FlowUpwindEvaluator {
        &mut self.evaluator
    }

    pub fn venous_pressures(&self) -> &BTreeMap<VertexId, f64> {
        &self.venous_pressures
    }

    pub(crate) fn venous_pressures_mut(&mut self) -> &mut BTreeMap<VertexId, f64> {
        &mut self.venous_pressures
    }

    /// Owned Windkessel and vessel-tree tips, sorted by id.
    pub fn tips(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.venous_pressures.keys().copied()
    }

    /// DG update of all micro-edges of one edge.
    ///
    /// On a micro-edge of length `h` with coefficients `c_k`:
    /// `dc_k/dt = (2k+1)/h [ int F P_k' - (F*_r - (-1)^k F*_l) + h/2 int S P_k ]`.
    fn edge_rhs(&self, t: f64, e: EdgeId, u: &[f64], du: &mut [f64]) -> SimResult<()> {
        let ev = &self.evaluator;
        let data = ev.graph().edge(e)?.physical_data()?;
        let local = ev.dof_map().edge(e)?;
        let n = local.num_micro_edges();
        let h = data.length / n as f64;
        let friction = data.friction_coefficient();

        let mut q_up = vec![0.0; n + 1];
        let mut a_up = vec![0.0; n + 1];
        ev.get_fluxes_on_macro_edge(t, e, u, &mut q_up, &mut a_up)?;

        let fe = ev.fe();
        let rule = fe.quadrature();
        let mut q_qp = vec![0.0; rule.len()];
        let mut a_qp = vec![0.0; rule.len()];

        for m in 0..n {
            let q_dofs = local.dof_indices(m, FLOW);
            let a_dofs = local.dof_indices(m, AREA);
            fe.evaluate_dof_at_quadrature_points(&u[q_dofs.clone()], &mut q_qp);
            fe.evaluate_dof_at_quadrature_points(&u[a_dofs.clone()], &mut a_qp);

            let (fq_l, fa_l) = physical_flux(q_up[m], a_up[m], data);
            let (fq_r, fa_r) = physical_flux(q_up[m + 1], a_up[m + 1], data);

            for k in 0..fe.num_basis_functions() {
                let parity = if k % 2 == 0 { 1.0 } else { -1.0 };
                let mut volume_q = 0.0;
                let mut volume_a = 0.0;
                let mut source_q = 0.0;
                for (qp, &w) in rule.weights().iter().enumerate() {
                    let (fq, fa) = physical_flux(q_qp[qp], a_qp[qp], data);
                    volume_q += w * fq * fe.dphi(qp)[k];
                    volume_a += w * fa * fe.dphi(qp)[k];
                    source_q += w * (-friction * q_qp[qp] / a_qp[qp]) * fe.phi(qp)[k];
                }
                let scale = (2.0 * k as f64 + 1.0) / h;
                du[q_dofs.start + k] =
                    scale * (volume_q - (fq_r - parity * fq_l) + 0.5 * h * source_q);
                du[a_dofs.start + k] = scale * (volume_a - (fa_r - parity * fa_l));
            }
        }
        Ok(())
    }

    /// Lumped circuit behind a Windkessel or vessel-tree tip.
    fn tip_rhs(&self, t: f64, v: VertexId, p_v: f64, u: &[f64], du: &mut [f64]) -> SimResult<()> {
        let ev = &self.evaluator;
        let vertex = ev.graph().vertex(v)?;
        let first = ev.dof_map().vertex(v)?.dof_indices().start;
        let q_out = ev.get_outflow_at_leaf(t, v)?;

        match vertex.boundary() {
            Some(BoundaryCondition::Windkessel(wk)) => {
                let p_c = u[first];
                du[first] = (q_out - (p_c - p_v) / wk.peripheral_resistance) / wk.capacitance;
            }
            Some(BoundaryCondition::VesselTree(tree)) => {
                let levels = tree.num_levels();
                let mut q_in = q_out;
                for k in 0..levels {
                    let p_k = u[first + k];
                    let p_next = if k + 1 < levels { u[first + k + 1] } else { p_v };
                    let q_k = (p_k - p_next) / tree.effective_resistance(k);
                    du[first + k] = (q_in - q_k) / tree.effective_capacitance(k);
                    q_in = q_k;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

impl TransientModel for NetworkModel {
    type State = Vec<f64>;

    /// `(Q = 0, A = A0)` on every owned edge, zero lumped pressures.
    fn initial_state(&self) -> Vec<f64> {
        self.rest.clone()
    }

    fn rhs(&mut self, t: f64, x: &Vec<f64>) -> SimResult<Vec<f64>> {
        self.evaluator.init(t, x)?;

        let mut du = vec![0.0; x.len()];
        let partition = Arc::clone(self.evaluator.partition());
        for &e in partition.owned_edge_ids(self.evaluator.rank()) {
            self.edge_rhs(t, e, x, &mut du)?;
        }
        for (&v, &p_v) in &self.venous_pressures {
            self.tip_rhs(t, v, p_v, x, &mut du)?;
        }
        Ok(du)
    }

    fn add(&self, a: &Vec<f64>, b: &Vec<f64>) -> Vec<f64> {
        a.iter().zip(b).map(|(x, y)| x + y).collect()
    }

    fn scale(&self, a: &Vec<f64>, scale: f64) -> Vec<f64> {
        a.iter().map(|x| scale * x).collect()
    }
}

fn rest_state(evaluator: &FlowUpwindEvaluator) -> SimResult<Vec<f64>> {
    let dofs = evaluator.dof_map();
    let graph = evaluator.graph();
    let mut u = vec![0.0; dofs.num_dof()];
    for &e in evaluator.partition().owned_edge_ids(evaluator.rank()) {
        let local = dofs.edge(e)?;
        let a0 = graph.edge(e)?.physical_data()?.a0;
        for m in 0..local.num_micro_edges() {
            u[local.dof_index(m, AREA, 0)] = a0;
        }
    }
    Ok(u)
}
