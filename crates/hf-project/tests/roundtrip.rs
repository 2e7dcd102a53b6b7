use hf_project::*;

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(name)
}

fn two_vessels() -> NetworkDef {
    NetworkDef {
        vertices: vec![
            VertexDef {
                id: 10,
                name: "in".to_string(),
            },
            VertexDef {
                id: 20,
                name: "mid".to_string(),
            },
            VertexDef {
                id: 30,
                name: "out".to_string(),
            },
        ],
        vessels: vec![
            VesselDef {
                id: 0,
                left_vertex_id: 10,
                right_vertex_id: 20,
                name: Some("proximal".to_string()),
                vessel_length: 12.0,
                radius: 0.5,
                wall_thickness: 0.07,
                elastic_modulus: 4e5,
                gamma: Some(2.0),
                viscosity: None,
                number_edges: 6,
                embedded_coords: Some(vec![[0.0, 0.0, 0.0], [1.0, 2.0, 3.0]]),
            },
            VesselDef {
                id: 1,
                left_vertex_id: 20,
                right_vertex_id: 30,
                name: None,
                vessel_length: 8.0,
                radius: 0.45,
                wall_thickness: 0.06,
                elastic_modulus: 4e5,
                gamma: None,
                viscosity: Some(0.0),
                number_edges: 4,
                embedded_coords: None,
            },
        ],
        density: Some(1.05e-3),
    }
}

#[test]
fn roundtrip_network_json_and_yaml() {
    let network = two_vessels();
    for name in ["hf_project_roundtrip.json", "hf_project_roundtrip.yaml"] {
        let path = temp_path(name);
        save_network(&path, &network).unwrap();
        assert_eq!(load_network(&path).unwrap(), network);
    }
}

#[test]
fn roundtrip_boundaries_with_every_kind() {
    let boundaries = BoundaryDocument {
        vertices: vec![
            BoundaryVertexDef {
                name: "a".to_string(),
                kind: BoundaryKindDef::Inflow {
                    waveform: WaveformDef::Tabulated {
                        times: vec![0.0, 0.5, 1.0],
                        values: vec![0.0, 3.0, 0.0],
                        periodic: true,
                    },
                },
            },
            BoundaryVertexDef {
                name: "b".to_string(),
                kind: BoundaryKindDef::FreeOutflow {
                    reference_flow: 1.0,
                    reference_area: Some(0.5),
                },
            },
            BoundaryVertexDef {
                name: "c".to_string(),
                kind: BoundaryKindDef::Windkessel {
                    resistance: 100.0,
                    capacitance: 1e-3,
                    venous_pressure: 5.0,
                },
            },
            BoundaryVertexDef {
                name: "d".to_string(),
                kind: BoundaryKindDef::VesselTree {
                    resistances: vec![1.0, 2.0],
                    capacitances: vec![1e-4, 2e-4],
                    furcation_number: 2,
                    venous_pressure: 0.0,
                },
            },
            BoundaryVertexDef {
                name: "e".to_string(),
                kind: BoundaryKindDef::Characteristic {
                    pressure: 5.0,
                    flow: 4.0,
                    inflow: true,
                },
            },
        ],
    };
    for name in ["hf_project_boundaries.json", "hf_project_boundaries.yml"] {
        let path = temp_path(name);
        save_boundaries(&path, &boundaries).unwrap();
        assert_eq!(load_boundaries(&path).unwrap(), boundaries);
    }
}

#[test]
fn boundary_kind_is_read_from_the_type_tag() {
    let doc: BoundaryDocument = serde_yaml::from_str(
        "vertices:\n  - name: out\n    type: windkessel\n    resistance: 10.0\n    capacitance: 0.01\n",
    )
    .unwrap();
    assert_eq!(
        doc.vertices[0].kind,
        BoundaryKindDef::Windkessel {
            resistance: 10.0,
            capacitance: 0.01,
            venous_pressure: 0.0,
        }
    );

    let unknown = serde_yaml::from_str::<BoundaryDocument>(
        "vertices:\n  - name: out\n    type: resistor\n    resistance: 10.0\n",
    );
    assert!(unknown.is_err());
}

#[test]
fn run_config_defaults_fill_missing_fields() {
    let run: RunConfig = serde_yaml::from_str("mesh_file: net.json\n").unwrap();
    assert_eq!(run, RunConfig::new("net.json"));
    assert_eq!(run.degree, 2);
    assert_eq!(run.workers, 1);
    assert_eq!(run.output_interval(), 640);
}

#[test]
fn unknown_extension_is_rejected() {
    let path = temp_path("hf_project_network.txt");
    assert!(matches!(
        save_network(&path, &two_vessels()),
        Err(ProjectError::UnknownFormat { .. })
    ));
}

#[test]
fn invalid_network_is_not_saved() {
    let mut network = two_vessels();
    network.vessels[1].left_vertex_id = 99;
    let path = temp_path("hf_project_invalid.json");
    assert!(matches!(
        save_network(&path, &network),
        Err(ProjectError::Validation(ValidationError::MissingReference { .. }))
    ));
}
