//! Validation of network, boundary and run files.

use std::collections::{HashMap, HashSet};

use crate::schema::{BoundaryDocument, BoundaryKindDef, NetworkDef, RunConfig, VesselDef, WaveformDef};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

fn invalid(field: String, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn positive(field: impl FnOnce() -> String, value: f64) -> Result<(), ValidationError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field(), value, "must be positive and finite"))
    }
}

fn finite(field: impl FnOnce() -> String, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field(), value, "must be finite"))
    }
}

pub fn validate_network(network: &NetworkDef) -> Result<(), ValidationError> {
    if network.vessels.is_empty() {
        return Err(invalid("vessels".to_string(), 0, "network has no vessels"));
    }
    if let Some(rho) = network.density {
        positive(|| "density".to_string(), rho)?;
    }

    let mut vertex_ids = HashSet::new();
    let mut names = HashSet::new();
    for vertex in &network.vertices {
        if !vertex_ids.insert(vertex.id) {
            return Err(ValidationError::DuplicateId {
                id: vertex.id.to_string(),
                context: "vertices".to_string(),
            });
        }
        if !names.insert(vertex.name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: vertex.name.clone(),
                context: "vertex names".to_string(),
            });
        }
    }

    let mut vessel_ids = HashSet::new();
    for vessel in &network.vessels {
        if !vessel_ids.insert(vessel.id) {
            return Err(ValidationError::DuplicateId {
                id: vessel.id.to_string(),
                context: "vessels".to_string(),
            });
        }
        validate_vessel(vessel, &vertex_ids)?;
    }

    Ok(())
}

fn validate_vessel(vessel: &VesselDef, vertex_ids: &HashSet<u32>) -> Result<(), ValidationError> {
    let id = vessel.id;
    for (end, vertex) in [("left", vessel.left_vertex_id), ("right", vessel.right_vertex_id)] {
        if !vertex_ids.contains(&vertex) {
            return Err(ValidationError::MissingReference {
                id: vertex.to_string(),
                context: format!("vessel {id} {end}_vertex_id"),
            });
        }
    }
    if vessel.left_vertex_id == vessel.right_vertex_id {
        return Err(invalid(
            format!("vessel {id} right_vertex_id"),
            vessel.right_vertex_id,
            "a vessel must connect two different vertices",
        ));
    }

    positive(|| format!("vessel {id} vessel_length"), vessel.vessel_length)?;
    positive(|| format!("vessel {id} radius"), vessel.radius)?;
    positive(|| format!("vessel {id} wall_thickness"), vessel.wall_thickness)?;
    positive(|| format!("vessel {id} elastic_modulus"), vessel.elastic_modulus)?;
    if let Some(gamma) = vessel.gamma {
        finite(|| format!("vessel {id} gamma"), gamma)?;
    }
    if let Some(mu) = vessel.viscosity {
        if !(mu >= 0.0) || !mu.is_finite() {
            return Err(invalid(format!("vessel {id} viscosity"), mu, "must be non-negative"));
        }
    }
    if vessel.number_edges == 0 {
        return Err(invalid(
            format!("vessel {id} number_edges"),
            0,
            "needs at least one micro-edge",
        ));
    }
    if let Some(coords) = &vessel.embedded_coords {
        if coords.len() < 2 {
            return Err(invalid(
                format!("vessel {id} embedded_coords"),
                coords.len(),
                "a polyline needs at least two points",
            ));
        }
    }
    Ok(())
}

/// Check a boundary document against the network it will be applied to.
///
/// Only named vertices of degree one may carry a boundary condition.
pub fn validate_boundaries(
    boundaries: &BoundaryDocument,
    network: &NetworkDef,
) -> Result<(), ValidationError> {
    let mut degree: HashMap<u32, usize> = HashMap::new();
    for vessel in &network.vessels {
        *degree.entry(vessel.left_vertex_id).or_default() += 1;
        *degree.entry(vessel.right_vertex_id).or_default() += 1;
    }
    let by_name: HashMap<&str, u32> = network
        .vertices
        .iter()
        .map(|v| (v.name.as_str(), v.id))
        .collect();

    let mut seen = HashSet::new();
    for vertex in &boundaries.vertices {
        let name = &vertex.name;
        let Some(id) = by_name.get(name.as_str()) else {
            return Err(ValidationError::MissingReference {
                id: name.clone(),
                context: "boundary vertices".to_string(),
            });
        };
        if !seen.insert(name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: name.clone(),
                context: "boundary vertices".to_string(),
            });
        }
        let d = degree.get(id).copied().unwrap_or(0);
        if d != 1 {
            return Err(invalid(
                format!("boundary '{name}'"),
                d,
                "boundary conditions need a vertex with exactly one vessel",
            ));
        }
        validate_boundary_kind(name, &vertex.kind)?;
    }
    Ok(())
}

fn validate_boundary_kind(name: &str, kind: &BoundaryKindDef) -> Result<(), ValidationError> {
    match kind {
        BoundaryKindDef::Inflow { waveform } => validate_waveform(name, waveform),
        BoundaryKindDef::FreeOutflow {
            reference_flow,
            reference_area,
        } => {
            finite(|| format!("boundary '{name}' reference_flow"), *reference_flow)?;
            if let Some(area) = reference_area {
                positive(|| format!("boundary '{name}' reference_area"), *area)?;
            }
            Ok(())
        }
        BoundaryKindDef::Windkessel {
            resistance,
            capacitance,
            venous_pressure,
        } => {
            positive(|| format!("boundary '{name}' resistance"), *resistance)?;
            positive(|| format!("boundary '{name}' capacitance"), *capacitance)?;
            finite(|| format!("boundary '{name}' venous_pressure"), *venous_pressure)
        }
        BoundaryKindDef::VesselTree {
            resistances,
            capacitances,
            furcation_number,
            venous_pressure,
        } => {
            if resistances.is_empty() || resistances.len() != capacitances.len() {
                return Err(invalid(
                    format!("boundary '{name}' capacitances"),
                    capacitances.len(),
                    "needs one capacitance per resistance and at least one level",
                ));
            }
            for &r in resistances {
                positive(|| format!("boundary '{name}' resistances"), r)?;
            }
            for &c in capacitances {
                positive(|| format!("boundary '{name}' capacitances"), c)?;
            }
            if *furcation_number == 0 {
                return Err(invalid(
                    format!("boundary '{name}' furcation_number"),
                    0,
                    "must be at least one",
                ));
            }
            finite(|| format!("boundary '{name}' venous_pressure"), *venous_pressure)
        }
        BoundaryKindDef::Characteristic { pressure, flow, .. } => {
            finite(|| format!("boundary '{name}' pressure"), *pressure)?;
            finite(|| format!("boundary '{name}' flow"), *flow)
        }
    }
}

fn validate_waveform(name: &str, waveform: &WaveformDef) -> Result<(), ValidationError> {
    match waveform {
        WaveformDef::Constant { value } => finite(|| format!("boundary '{name}' value"), *value),
        WaveformDef::HeartBeat {
            amplitude,
            period,
            systole,
        } => {
            finite(|| format!("boundary '{name}' amplitude"), *amplitude)?;
            positive(|| format!("boundary '{name}' period"), *period)?;
            positive(|| format!("boundary '{name}' systole"), *systole)?;
            if systole > period {
                return Err(invalid(
                    format!("boundary '{name}' systole"),
                    systole,
                    "systole must not exceed the period",
                ));
            }
            Ok(())
        }
        WaveformDef::Tabulated { times, values, .. } => {
            if times.is_empty() || times.len() != values.len() {
                return Err(invalid(
                    format!("boundary '{name}' values"),
                    values.len(),
                    "needs one value per time and at least one sample",
                ));
            }
            if times.windows(2).any(|w| !(w[1] > w[0])) {
                return Err(invalid(
                    format!("boundary '{name}' times"),
                    "[..]",
                    "times must increase strictly",
                ));
            }
            Ok(())
        }
    }
}

pub fn validate_run_config(run: &RunConfig) -> Result<(), ValidationError> {
    positive(|| "tau".to_string(), run.tau)?;
    positive(|| "tau_out".to_string(), run.tau_out)?;
    if !(run.t_end >= 0.0) || !run.t_end.is_finite() {
        return Err(invalid("t_end".to_string(), run.t_end, "must be non-negative"));
    }
    finite(|| "t_start_averaging".to_string(), run.t_start_averaging)?;
    finite(|| "heart_amplitude".to_string(), run.heart_amplitude)?;
    if run.workers == 0 {
        return Err(invalid("workers".to_string(), 0, "needs at least one worker"));
    }
    Ok(())
}
