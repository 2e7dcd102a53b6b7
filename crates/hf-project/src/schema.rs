//! Network, boundary and run file schemas.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Vessel network description.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkDef {
    pub vertices: Vec<VertexDef>,
    pub vessels: Vec<VesselDef>,
    /// Blood density shared by all vessels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VertexDef {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VesselDef {
    pub id: u32,
    /// Vertex the vessel starts at; the vessel points away from it.
    pub left_vertex_id: u32,
    /// Vertex the vessel points to.
    pub right_vertex_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub vessel_length: f64,
    pub radius: f64,
    pub wall_thickness: f64,
    pub elastic_modulus: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gamma: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viscosity: Option<f64>,
    /// Number of micro-edges.
    pub number_edges: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedded_coords: Option<Vec<[f64; 3]>>,
}

/// Boundary conditions of named leaf vertices.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BoundaryDocument {
    #[serde(default)]
    pub vertices: Vec<BoundaryVertexDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoundaryVertexDef {
    pub name: String,
    #[serde(flatten)]
    pub kind: BoundaryKindDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoundaryKindDef {
    Inflow {
        waveform: WaveformDef,
    },
    FreeOutflow {
        #[serde(default)]
        reference_flow: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reference_area: Option<f64>,
    },
    Windkessel {
        /// Peripheral resistance.
        resistance: f64,
        capacitance: f64,
        #[serde(default)]
        venous_pressure: f64,
    },
    VesselTree {
        resistances: Vec<f64>,
        capacitances: Vec<f64>,
        furcation_number: u32,
        #[serde(default)]
        venous_pressure: f64,
    },
    Characteristic {
        pressure: f64,
        flow: f64,
        #[serde(default)]
        inflow: bool,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum WaveformDef {
    Constant {
        value: f64,
    },
    HeartBeat {
        amplitude: f64,
        #[serde(default = "default_period")]
        period: f64,
        #[serde(default = "default_systole")]
        systole: f64,
    },
    Tabulated {
        times: Vec<f64>,
        values: Vec<f64>,
        #[serde(default)]
        periodic: bool,
    },
}

fn default_period() -> f64 {
    1.0
}

fn default_systole() -> f64 {
    0.3
}

/// Settings of a simulation run.
///
/// Relative file paths are resolved against the directory of the run file
/// when it is loaded with [`crate::load_run_config`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    #[serde(default = "default_tau")]
    pub tau: f64,
    /// Interval between recorded tip pressures.
    #[serde(default = "default_tau_out")]
    pub tau_out: f64,
    #[serde(default = "default_t_end")]
    pub t_end: f64,
    #[serde(default)]
    pub t_start_averaging: f64,
    #[serde(default = "default_degree")]
    pub degree: usize,
    #[serde(default = "default_workers")]
    pub workers: usize,
    pub mesh_file: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary_file: Option<PathBuf>,
    /// Vertex that receives the heart beat inflow; keeps the boundary file's
    /// condition when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inlet_name: Option<String>,
    #[serde(default = "default_heart_amplitude")]
    pub heart_amplitude: f64,
}

impl RunConfig {
    pub fn new(mesh_file: impl Into<PathBuf>) -> Self {
        Self {
            tau: default_tau(),
            tau_out: default_tau_out(),
            t_end: default_t_end(),
            t_start_averaging: 0.0,
            degree: default_degree(),
            workers: default_workers(),
            mesh_file: mesh_file.into(),
            boundary_file: None,
            inlet_name: None,
            heart_amplitude: default_heart_amplitude(),
        }
    }

    /// Steps between two recorded states, at least one.
    pub fn output_interval(&self) -> usize {
        ((self.tau_out / self.tau).round() as usize).max(1)
    }
}

fn default_tau() -> f64 {
    2.5e-4 / 16.0
}

fn default_tau_out() -> f64 {
    1e-2
}

fn default_t_end() -> f64 {
    1e-2
}

fn default_degree() -> usize {
    2
}

fn default_workers() -> usize {
    1
}

fn default_heart_amplitude() -> f64 {
    485.0
}
