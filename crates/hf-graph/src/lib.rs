//! hf-graph: vessel network model for hemoflow.
//!
//! Provides:
//! - Arena storage for vertices and macro-edges (`GraphStorage`)
//! - Physical vessel data and the pressure-area law
//! - Boundary conditions as a closed sum type
//! - Characteristic (Riemann invariant) vessel formulas
//!
//! # Example
//!
//! ```
//! use hf_graph::{BoundaryCondition, FreeOutflowParameters, GraphStorage, InflowWaveform, PhysicalData};
//!
//! let mut graph = GraphStorage::new();
//! let v0 = graph.create_named_vertex("inlet").unwrap();
//! let v1 = graph.create_named_vertex("outlet").unwrap();
//! let e = graph.connect(v0, v1, 10).unwrap();
//! let data = PhysicalData::set_from_data(4e5, 0.067, 1.028e-3, 9.0, 0.403, 42.2).unwrap();
//! graph.attach_physical_data(e, data).unwrap();
//! graph
//!     .set_boundary(v0, BoundaryCondition::Inflow(InflowWaveform::Constant { value: 1.0 }))
//!     .unwrap();
//! graph
//!     .set_boundary(v1, BoundaryCondition::FreeOutflow(FreeOutflowParameters::default()))
//!     .unwrap();
//! graph.finalize_boundary_conditions().unwrap();
//!
//! assert!(graph.edge(e).unwrap().is_pointing_to(v1));
//! ```

pub mod boundary;
pub mod error;
pub mod formulas;
pub mod graph;
pub mod physical;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use boundary::{
    BoundaryCondition, CharacteristicParameters, FreeOutflowParameters, InflowWaveform,
    VertexKind, VesselTreeParameters, WindkesselParameters,
};
pub use error::{GraphError, GraphResult};
pub use graph::{Edge, GraphStorage, Point, Vertex};
pub use physical::{DEFAULT_BLOOD_DENSITY, DEFAULT_BLOOD_VISCOSITY, PhysicalData, calculate_g0};
