//! Upwind flux evaluation for 1D blood-flow networks.
//!
//! This crate computes, for a given discrete solution, numerically stable
//! fluxes at every micro-vertex of every vessel and resolves the coupling
//! at every graph vertex: n-furcations through a nonlinear Riemann solve,
//! leaves through their boundary condition (prescribed inflow, free
//! outflow, Windkessel, vessel tree, nonlinear characteristic).

pub mod coupling;
pub mod error;
pub mod fe;
pub mod newton;
pub mod upwind;

pub use coupling::{
    NfurcationSolution, WindkesselOutflow, characteristic_boundary, free_outflow, inflow_area,
    interior_upwind, solve_at_nfurcation, windkessel_outflow,
};
pub use error::{SolverError, SolverResult};
pub use fe::{BoundaryValues, FeTypeNetwork, QuadratureRule};
pub use newton::{NewtonConfig, NewtonOutcome, NewtonResult, ScalarNewtonConfig};
pub use upwind::{FlowUpwindEvaluator, UpwindState};
