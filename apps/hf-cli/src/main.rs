use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use clap::{Parser, Subcommand};
use hf_core::VertexId;
use hf_graph::GraphStorage;
use hf_partition::{
    Communicator, DofMap, LocalCommunicator, Partition, ThreadCommunicator, naive_partition,
};
use hf_project::{ProjectError, RunConfig};
use hf_sim::{
    ExplicitNonlinearFlowSolver, FlowIntegrator, SimError, SimOptions, TipPressureRecord,
    run_sim_with,
};
use hf_solver::FlowUpwindEvaluator;
use hf_solver::upwind::NUM_COMPONENTS;
use tracing::info;
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(name = "hf-cli")]
#[command(about = "HemoFlow CLI - 1D blood flow network simulation", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a network file and, optionally, its boundary conditions
    Validate {
        /// Path to the network JSON or YAML file
        mesh_file: PathBuf,
        /// Path to the boundary condition file
        #[arg(long)]
        boundary_file: Option<PathBuf>,
        /// Vertex receiving a heart beat inflow
        #[arg(long)]
        inlet_name: Option<String>,
    },
    /// Run a simulation described by a run file
    Run {
        /// Path to the run YAML file
        run_path: PathBuf,
        /// Time step in seconds
        #[arg(long)]
        tau: Option<f64>,
        /// Interval between recorded tip pressures in seconds
        #[arg(long)]
        tau_out: Option<f64>,
        /// End time in seconds
        #[arg(long)]
        t_end: Option<f64>,
        /// Time from which tip outflows are averaged
        #[arg(long)]
        t_start_averaging: Option<f64>,
        /// Polynomial degree of the flow discretization
        #[arg(long)]
        degree: Option<usize>,
        /// Number of worker threads
        #[arg(long)]
        workers: Option<usize>,
        /// Heart beat amplitude at the inlet
        #[arg(long)]
        heart_amplitude: Option<f64>,
        /// Write the tip pressure series to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error(transparent)]
    Sim(#[from] SimError),

    #[error("Graph error: {0}")]
    Graph(#[from] hf_graph::GraphError),

    #[error("Partition error: {0}")]
    Partition(#[from] hf_partition::PartitionError),

    #[error("Solver error: {0}")]
    Solver(#[from] hf_solver::SolverError),

    #[error("Worker {rank} panicked")]
    WorkerPanicked { rank: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

type CliResult<T> = Result<T, CliError>;

fn main() -> CliResult<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "info".into()),
        1 => tracing_subscriber::EnvFilter::new("debug"),
        _ => tracing_subscriber::EnvFilter::new("trace"),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Validate {
            mesh_file,
            boundary_file,
            inlet_name,
        } => cmd_validate(&mesh_file, boundary_file.as_deref(), inlet_name),
        Commands::Run {
            run_path,
            tau,
            tau_out,
            t_end,
            t_start_averaging,
            degree,
            workers,
            heart_amplitude,
            output,
        } => {
            let mut run = hf_project::load_run_config(&run_path)?;
            run.tau = tau.unwrap_or(run.tau);
            run.tau_out = tau_out.unwrap_or(run.tau_out);
            run.t_end = t_end.unwrap_or(run.t_end);
            run.t_start_averaging = t_start_averaging.unwrap_or(run.t_start_averaging);
            run.degree = degree.unwrap_or(run.degree);
            run.workers = workers.unwrap_or(run.workers);
            run.heart_amplitude = heart_amplitude.unwrap_or(run.heart_amplitude);
            hf_project::validate_run_config(&run).map_err(ProjectError::from)?;
            cmd_run(&run, output.as_deref())
        }
    }
}

fn cmd_validate(
    mesh_file: &Path,
    boundary_file: Option<&Path>,
    inlet_name: Option<String>,
) -> CliResult<()> {
    println!("Validating network: {}", mesh_file.display());
    let mut run = RunConfig::new(mesh_file);
    run.boundary_file = boundary_file.map(Path::to_path_buf);
    run.inlet_name = inlet_name;

    let graph = hf_project::assemble(&run)?;
    let tips = graph
        .vertices()
        .iter()
        .filter(|v| v.is_vessel_tip())
        .count();
    let micro_edges: usize = graph.edges().iter().map(|e| e.num_micro_edges()).sum();
    println!("✓ Network is valid");
    println!("  Vertices:    {}", graph.num_vertices());
    println!("  Vessels:     {}", graph.num_edges());
    println!("  Micro-edges: {}", micro_edges);
    println!("  Vessel tips: {}", tips);
    Ok(())
}

/// Everything one worker reports back after its run.
struct WorkerOutput {
    record: TipPressureRecord,
    flows: FlowIntegrator,
    total_volume: f64,
}

fn run_worker(
    comm: Box<dyn Communicator>,
    graph: Arc<GraphStorage>,
    partition: Arc<Partition>,
    dofs: Arc<DofMap>,
    run: &RunConfig,
) -> CliResult<WorkerOutput> {
    let evaluator = FlowUpwindEvaluator::new(comm, graph, partition, dofs)?;
    let mut solver = ExplicitNonlinearFlowSolver::new(evaluator)?;
    let opts = SimOptions {
        dt: run.tau,
        t_end: run.t_end,
        record_every: run.output_interval(),
        ..SimOptions::default()
    };
    let mut flows = FlowIntegrator::new(run.t_start_averaging);
    let record = run_sim_with(&mut solver, &opts, |solver, t, dt| {
        flows.update_flow(solver, t, dt)
    })?;
    let total_volume = flows.total_volume(&solver)?;
    Ok(WorkerOutput {
        record,
        flows,
        total_volume,
    })
}

fn cmd_run(run: &RunConfig, output: Option<&Path>) -> CliResult<()> {
    println!("Running simulation: {}", run.mesh_file.display());
    println!(
        "  tau = {:.3e} s, t_end = {:.3} s, degree = {}, workers = {}",
        run.tau, run.t_end, run.degree, run.workers
    );

    let started = Instant::now();
    let graph = Arc::new(hf_project::assemble(run)?);
    let partition = Arc::new(naive_partition(&graph, run.workers)?);
    let dofs = Arc::new(DofMap::create(&graph, NUM_COMPONENTS, run.degree)?);
    info!(num_dof = dofs.num_dof(), workers = run.workers, "network assembled");

    let outputs = if run.workers == 1 {
        vec![run_worker(
            Box::new(LocalCommunicator),
            Arc::clone(&graph),
            Arc::clone(&partition),
            Arc::clone(&dofs),
            run,
        )?]
    } else {
        thread::scope(|scope| {
            let handles: Vec<_> = ThreadCommunicator::group(run.workers)
                .into_iter()
                .map(|comm| {
                    let graph = Arc::clone(&graph);
                    let partition = Arc::clone(&partition);
                    let dofs = Arc::clone(&dofs);
                    scope.spawn(move || run_worker(Box::new(comm), graph, partition, dofs, run))
                })
                .collect();
            handles
                .into_iter()
                .enumerate()
                .map(|(rank, h)| h.join().map_err(|_| CliError::WorkerPanicked { rank })?)
                .collect::<CliResult<Vec<_>>>()
        })?
    };

    let (times, pressures) = merge_records(&outputs);
    let averages: BTreeMap<VertexId, f64> = outputs
        .iter()
        .flat_map(|o| o.flows.average_flows())
        .collect();
    let name = |v: VertexId| -> String {
        graph
            .vertex(v)
            .map(|vertex| vertex.name().to_string())
            .unwrap_or_else(|_| v.to_string())
    };

    println!("✓ Simulation completed in {:.2}s", started.elapsed().as_secs_f64());
    println!("  Recorded time points: {}", times.len());
    if let Some(first) = outputs.first() {
        println!(
            "  Outflow volume since t = {:.3} s: {:.5e}",
            run.t_start_averaging, first.total_volume
        );
    }
    if let Some(last) = pressures.last() {
        println!("\nVessel tips (final pressure, average outflow):");
        for (&v, &p) in last {
            match averages.get(&v) {
                Some(q) => println!("  {:<24} p = {:>12.5e}  q = {:>12.5e}", name(v), p, q),
                None => println!("  {:<24} p = {:>12.5e}", name(v), p),
            }
        }
    }

    if let Some(path) = output {
        write_csv(path, &times, &pressures, &name)?;
        println!("✓ Exported tip pressures to {}", path.display());
    }
    Ok(())
}

/// Combine the per-rank records; all ranks record at the same times.
fn merge_records(outputs: &[WorkerOutput]) -> (Vec<f64>, Vec<BTreeMap<VertexId, f64>>) {
    let times = outputs
        .first()
        .map(|o| o.record.t.clone())
        .unwrap_or_default();
    let pressures = (0..times.len())
        .map(|i| {
            outputs
                .iter()
                .filter_map(|o| o.record.x.get(i))
                .flat_map(|snapshot| snapshot.iter().map(|(&v, &p)| (v, p)))
                .collect()
        })
        .collect();
    (times, pressures)
}

fn write_csv(
    path: &Path,
    times: &[f64],
    pressures: &[BTreeMap<VertexId, f64>],
    name: &dyn Fn(VertexId) -> String,
) -> io::Result<()> {
    let tips: Vec<VertexId> = pressures
        .first()
        .map(|p| p.keys().copied().collect())
        .unwrap_or_default();

    let mut file = io::BufWriter::new(std::fs::File::create(path)?);
    write!(file, "time_s")?;
    for &v in &tips {
        write!(file, ",{}", name(v))?;
    }
    writeln!(file)?;
    for (t, snapshot) in times.iter().zip(pressures) {
        write!(file, "{}", t)?;
        for v in &tips {
            write!(file, ",{}", snapshot.get(v).copied().unwrap_or(f64::NAN))?;
        }
        writeln!(file)?;
    }
    file.flush()
}
