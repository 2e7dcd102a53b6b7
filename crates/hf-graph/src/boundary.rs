//! Vertex classification and boundary condition parameters.

use std::f64::consts::PI;

use hf_core::Real;

/// Prescribed inflow as a function of time.
#[derive(Debug, Clone, PartialEq)]
pub enum InflowWaveform {
    /// Constant flow.
    Constant { value: Real },
    /// Half-sine during systole, zero during diastole, repeated every period.
    HeartBeat {
        amplitude: Real,
        period: Real,
        systole: Real,
    },
    /// Piecewise linear interpolation of `(times, values)`.
    Tabulated {
        times: Vec<Real>,
        values: Vec<Real>,
        periodic: bool,
    },
}

impl InflowWaveform {
    /// Heart beat with a one second period and 0.3 s systole.
    pub fn heart_beat(amplitude: Real) -> Self {
        Self::HeartBeat {
            amplitude,
            period: 1.0,
            systole: 0.3,
        }
    }

    /// Evaluate the inflow at time `t`.
    pub fn value(&self, t: Real) -> Real {
        match self {
            Self::Constant { value } => *value,
            Self::HeartBeat {
                amplitude,
                period,
                systole,
            } => {
                let t_in_period = t - (t / period).floor() * period;
                if t_in_period < *systole {
                    amplitude * (PI * t_in_period / systole).sin()
                } else {
                    0.0
                }
            }
            Self::Tabulated {
                times,
                values,
                periodic,
            } => interpolate(times, values, *periodic, t),
        }
    }

    pub(crate) fn check(&self) -> Result<(), String> {
        match self {
            Self::Constant { value } if !value.is_finite() => {
                Err("constant inflow must be finite".to_string())
            }
            Self::Constant { .. } => Ok(()),
            Self::HeartBeat {
                amplitude,
                period,
                systole,
            } => {
                if !amplitude.is_finite() {
                    Err("heart beat amplitude must be finite".to_string())
                } else if !(*period > 0.0) || !(*systole > 0.0) || systole > period {
                    Err(format!(
                        "heart beat needs 0 < systole <= period (systole={systole}, period={period})"
                    ))
                } else {
                    Ok(())
                }
            }
            Self::Tabulated { times, values, .. } => {
                if times.is_empty() || times.len() != values.len() {
                    return Err(format!(
                        "tabulated inflow needs matching non-empty tables ({} times, {} values)",
                        times.len(),
                        values.len()
                    ));
                }
                if times.windows(2).any(|w| !(w[1] > w[0])) {
                    return Err("tabulated inflow times must increase strictly".to_string());
                }
                Ok(())
            }
        }
    }
}

fn interpolate(times: &[Real], values: &[Real], periodic: bool, t: Real) -> Real {
    let (first, last) = (times[0], times[times.len() - 1]);
    let t = if periodic && last > first {
        let span = last - first;
        first + (t - first) - ((t - first) / span).floor() * span
    } else {
        t
    };
    if t <= first {
        return values[0];
    }
    if t >= last {
        return values[values.len() - 1];
    }
    // first index with times[i] > t; 1 <= i < len
    let i = times.partition_point(|&ti| ti <= t);
    let (t0, t1) = (times[i - 1], times[i]);
    let w = (t - t0) / (t1 - t0);
    (1.0 - w) * values[i - 1] + w * values[i]
}

/// Reference state the free outflow takes its incoming characteristic from.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FreeOutflowParameters {
    /// Flow of the undisturbed state.
    pub reference_flow: Real,
    /// Area of the undisturbed state; `None` means the vessel's `A0`.
    pub reference_area: Option<Real>,
}

/// Three-element Windkessel: proximal resistance from the vessel, then a
/// capacitor and a peripheral resistance draining to the venous pressure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindkesselParameters {
    pub peripheral_resistance: Real,
    pub capacitance: Real,
    pub venous_pressure: Real,
}

/// Chain of lumped RC levels; level `k` holds `furcation_number^k`
/// identical segments in parallel.
#[derive(Debug, Clone, PartialEq)]
pub struct VesselTreeParameters {
    pub resistances: Vec<Real>,
    pub capacitances: Vec<Real>,
    pub furcation_number: u32,
    pub venous_pressure: Real,
}

impl VesselTreeParameters {
    pub fn num_levels(&self) -> usize {
        self.resistances.len()
    }

    /// Resistance of level `k` with its parallel segments lumped together.
    pub fn effective_resistance(&self, level: usize) -> Real {
        self.resistances[level] / self.level_multiplicity(level)
    }

    /// Capacitance of level `k` with its parallel segments lumped together.
    pub fn effective_capacitance(&self, level: usize) -> Real {
        self.capacitances[level] * self.level_multiplicity(level)
    }

    fn level_multiplicity(&self, level: usize) -> Real {
        Real::from(self.furcation_number).powi(level as i32)
    }
}

/// Fixed target state imposed through the incoming characteristic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacteristicParameters {
    pub pressure: Real,
    /// Flow magnitude; enters the network if `inflow`, leaves it otherwise.
    pub flow: Real,
    pub inflow: bool,
}

/// Boundary condition of a leaf vertex.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryCondition {
    Inflow(InflowWaveform),
    FreeOutflow(FreeOutflowParameters),
    Windkessel(WindkesselParameters),
    VesselTree(VesselTreeParameters),
    Characteristic(CharacteristicParameters),
}

impl BoundaryCondition {
    /// Number of lumped state unknowns stored at the vertex.
    pub fn num_state_dofs(&self) -> usize {
        match self {
            Self::Windkessel(_) => 1,
            Self::VesselTree(tree) => tree.num_levels(),
            Self::Inflow(_) | Self::FreeOutflow(_) | Self::Characteristic(_) => 0,
        }
    }

    /// Short name used in logs and error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Inflow(_) => "inflow",
            Self::FreeOutflow(_) => "free_outflow",
            Self::Windkessel(_) => "windkessel",
            Self::VesselTree(_) => "vessel_tree",
            Self::Characteristic(_) => "characteristic",
        }
    }

    /// Venous pressure a lumped tip drains into.
    pub fn venous_pressure(&self) -> Option<Real> {
        match self {
            Self::Windkessel(wk) => Some(wk.venous_pressure),
            Self::VesselTree(tree) => Some(tree.venous_pressure),
            Self::Inflow(_) | Self::FreeOutflow(_) | Self::Characteristic(_) => None,
        }
    }

    pub(crate) fn check(&self) -> Result<(), String> {
        match self {
            Self::Inflow(waveform) => waveform.check(),
            Self::FreeOutflow(params) => match params.reference_area {
                Some(a) if !(a > 0.0) || !a.is_finite() => {
                    Err(format!("free outflow reference area must be positive, got {a}"))
                }
                _ if !params.reference_flow.is_finite() => {
                    Err("free outflow reference flow must be finite".to_string())
                }
                _ => Ok(()),
            },
            Self::Windkessel(wk) => {
                if !(wk.peripheral_resistance > 0.0) || !(wk.capacitance > 0.0) {
                    Err(format!(
                        "windkessel needs positive resistance and capacitance (R={}, C={})",
                        wk.peripheral_resistance, wk.capacitance
                    ))
                } else if !wk.venous_pressure.is_finite() {
                    Err("windkessel venous pressure must be finite".to_string())
                } else {
                    Ok(())
                }
            }
            Self::VesselTree(tree) => {
                if tree.resistances.is_empty() || tree.resistances.len() != tree.capacitances.len()
                {
                    Err(format!(
                        "vessel tree needs matching non-empty level lists ({} resistances, {} capacitances)",
                        tree.resistances.len(),
                        tree.capacitances.len()
                    ))
                } else if tree
                    .resistances
                    .iter()
                    .chain(&tree.capacitances)
                    .any(|v| !(*v > 0.0) || !v.is_finite())
                {
                    Err("vessel tree resistances and capacitances must be positive".to_string())
                } else if tree.furcation_number == 0 {
                    Err("vessel tree furcation number must be at least 1".to_string())
                } else {
                    Ok(())
                }
            }
            Self::Characteristic(c) => {
                if c.pressure.is_finite() && c.flow.is_finite() {
                    Ok(())
                } else {
                    Err("characteristic target must be finite".to_string())
                }
            }
        }
    }
}

/// Final classification of a vertex.
#[derive(Debug, Clone, PartialEq)]
pub enum VertexKind {
    /// Junction of two or more vessels.
    Inner,
    /// Leaf vertex with its boundary condition.
    Boundary(BoundaryCondition),
}
