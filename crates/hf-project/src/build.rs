//! Conversion of validated files into a vessel network.

use std::collections::HashMap;

use hf_core::{EdgeId, VertexId};
use hf_graph::{
    BoundaryCondition, CharacteristicParameters, DEFAULT_BLOOD_DENSITY, FreeOutflowParameters,
    GraphStorage, InflowWaveform, PhysicalData, VesselTreeParameters, WindkesselParameters,
};
use tracing::debug;

use crate::ProjectResult;
use crate::schema::{BoundaryDocument, BoundaryKindDef, NetworkDef, RunConfig, WaveformDef};
use crate::validate::{ValidationError, validate_boundaries, validate_network};

const DEFAULT_GAMMA: f64 = 9.0;

impl From<&WaveformDef> for InflowWaveform {
    fn from(def: &WaveformDef) -> Self {
        match def {
            WaveformDef::Constant { value } => Self::Constant { value: *value },
            WaveformDef::HeartBeat {
                amplitude,
                period,
                systole,
            } => Self::HeartBeat {
                amplitude: *amplitude,
                period: *period,
                systole: *systole,
            },
            WaveformDef::Tabulated {
                times,
                values,
                periodic,
            } => Self::Tabulated {
                times: times.clone(),
                values: values.clone(),
                periodic: *periodic,
            },
        }
    }
}

impl From<&BoundaryKindDef> for BoundaryCondition {
    fn from(def: &BoundaryKindDef) -> Self {
        match def {
            BoundaryKindDef::Inflow { waveform } => Self::Inflow(waveform.into()),
            BoundaryKindDef::FreeOutflow {
                reference_flow,
                reference_area,
            } => Self::FreeOutflow(FreeOutflowParameters {
                reference_flow: *reference_flow,
                reference_area: *reference_area,
            }),
            BoundaryKindDef::Windkessel {
                resistance,
                capacitance,
                venous_pressure,
            } => Self::Windkessel(WindkesselParameters {
                peripheral_resistance: *resistance,
                capacitance: *capacitance,
                venous_pressure: *venous_pressure,
            }),
            BoundaryKindDef::VesselTree {
                resistances,
                capacitances,
                furcation_number,
                venous_pressure,
            } => Self::VesselTree(VesselTreeParameters {
                resistances: resistances.clone(),
                capacitances: capacitances.clone(),
                furcation_number: *furcation_number,
                venous_pressure: *venous_pressure,
            }),
            BoundaryKindDef::Characteristic {
                pressure,
                flow,
                inflow,
            } => Self::Characteristic(CharacteristicParameters {
                pressure: *pressure,
                flow: *flow,
                inflow: *inflow,
            }),
        }
    }
}

/// Create the vertices and vessels of a network, with physical data and
/// embeddings attached. Boundary conditions are not set and the graph is
/// not finalized.
pub fn build_graph(network: &NetworkDef) -> ProjectResult<GraphStorage> {
    validate_network(network)?;
    let rho = network.density.unwrap_or(DEFAULT_BLOOD_DENSITY);

    let mut graph = GraphStorage::new();
    let vertices: HashMap<u32, VertexId> = network
        .vertices
        .iter()
        .map(|v| Ok((v.id, graph.create_named_vertex(v.name.clone())?)))
        .collect::<ProjectResult<_>>()?;

    for vessel in &network.vessels {
        let endpoint = |id: u32| {
            vertices
                .get(&id)
                .copied()
                .ok_or_else(|| ValidationError::MissingReference {
                    id: id.to_string(),
                    context: format!("vessel {} endpoints", vessel.id),
                })
        };
        let left = endpoint(vessel.left_vertex_id)?;
        let right = endpoint(vessel.right_vertex_id)?;
        let edge: EdgeId = graph.connect(left, right, vessel.number_edges)?;
        if let Some(name) = &vessel.name {
            graph.rename_edge(edge, name.clone())?;
        }

        let mut data = PhysicalData::set_from_data(
            vessel.elastic_modulus,
            vessel.wall_thickness,
            rho,
            vessel.gamma.unwrap_or(DEFAULT_GAMMA),
            vessel.radius,
            vessel.vessel_length,
        )?;
        if let Some(mu) = vessel.viscosity {
            data = data.with_viscosity(mu)?;
        }
        graph.attach_physical_data(edge, data)?;

        if let Some(coords) = &vessel.embedded_coords {
            graph.attach_embedding(edge, coords.clone())?;
        }
    }

    debug!(
        vertices = graph.num_vertices(),
        vessels = graph.num_edges(),
        "built vessel network"
    );
    Ok(graph)
}

/// Set the boundary conditions listed in the document, replacing earlier
/// ones.
pub fn apply_boundaries(
    graph: &mut GraphStorage,
    network: &NetworkDef,
    boundaries: &BoundaryDocument,
) -> ProjectResult<()> {
    validate_boundaries(boundaries, network)?;
    for vertex in &boundaries.vertices {
        let id = graph.find_vertex_by_name(&vertex.name)?;
        graph.set_boundary(id, (&vertex.kind).into())?;
    }
    Ok(())
}

/// Load every file a run refers to and return the finalized network.
///
/// The inlet named in the run gets a heart beat inflow of the configured
/// amplitude, overriding the boundary file.
pub fn assemble(run: &RunConfig) -> ProjectResult<GraphStorage> {
    let network = crate::load_network(&run.mesh_file)?;
    let mut graph = build_graph(&network)?;
    if let Some(path) = &run.boundary_file {
        let boundaries = crate::load_boundaries(path)?;
        apply_boundaries(&mut graph, &network, &boundaries)?;
    }
    if let Some(inlet) = &run.inlet_name {
        let id = graph.find_vertex_by_name(inlet)?;
        let inflow = InflowWaveform::heart_beat(run.heart_amplitude);
        graph.set_boundary(id, BoundaryCondition::Inflow(inflow))?;
    }
    graph.finalize_boundary_conditions()?;
    Ok(graph)
}
