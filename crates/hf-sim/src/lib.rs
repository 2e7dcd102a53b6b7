//! Explicit time integration of 1D blood-flow networks.
//!
//! Provides:
//! - Discontinuous Galerkin right-hand side of the vessel network
//! - Lumped Windkessel and vessel-tree tip dynamics
//! - Fixed-step SSP-RK3 and forward Euler integrators
//! - Coupling interface to external solvers (tip pressures)
//! - Outflow integration over a run

pub mod error;
pub mod flow_integrator;
pub mod integrator;
pub mod model;
pub mod network;
pub mod sim;
pub mod solver;

// Re-exports for public API
pub use error::{SimError, SimResult};
pub use flow_integrator::FlowIntegrator;
pub use integrator::{ForwardEuler, Integrator, SspRk3};
pub use model::TransientModel;
pub use network::NetworkModel;
pub use sim::{IntegratorType, SimOptions, SimRecord, TipPressureRecord, run_sim, run_sim_with};
pub use solver::ExplicitNonlinearFlowSolver;
