use std::{fs, path::PathBuf, process::ExitCode, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ringca::{
    evolve_sequential, parse_lattice, parse_table, Cell, Coordinator, Dim, Lattice,
    TransitionTable, View, DEFAULT_FRAME_DELAY,
};

/// Step a cellular automaton across a ring of workers.
#[derive(Parser, Debug)]
#[command(name = "ringca", version, about)]
struct Args {
    /// Transition table, one `<bitstring> <state>` per line.
    table: PathBuf,

    /// Initial configuration: the size, then the rows of states.
    config: PathBuf,

    /// Number of generations to run.
    generations: usize,

    /// Worker count, must divide the lattice size.
    #[arg(short = 'p', long, default_value_t = 1)]
    workers: usize,

    /// Lattice dimension, inferred from the configuration when omitted.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=2))]
    dim: Option<u8>,

    /// State for patterns the table leaves out. without it they are an error.
    #[arg(long, value_parser = parse_state)]
    fill_missing: Option<Cell>,

    /// Draw every generation to the terminal.
    #[arg(long)]
    render: bool,

    /// Pause between drawn generations.
    #[arg(long, default_value_t = DEFAULT_FRAME_DELAY.as_millis() as u64)]
    delay_ms: u64,

    /// Run the single-process engine instead of the worker ring.
    #[arg(long)]
    sequential: bool,

    /// More logging, repeat for more.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_state(text: &str) -> std::result::Result<Cell, String> {
    let mut chars = text.chars();
    match (chars.next().and_then(Cell::from_symbol), chars.next()) {
        (Some(cell), None) => Ok(cell),
        _ => Err(format!("`{text}` is not a state, expected 0 or 1")),
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(args: &Args) -> Result<(Lattice, TransitionTable)> {
    let config = fs::read_to_string(&args.config)
        .with_context(|| format!("could not open {}", args.config.display()))?;
    let dim = args.dim.and_then(Dim::from_rank);
    let lattice = parse_lattice(&config, dim)
        .with_context(|| format!("bad configuration file {}", args.config.display()))?;

    let table = fs::read_to_string(&args.table)
        .with_context(|| format!("could not open {}", args.table.display()))?;
    let table = parse_table(&table, lattice.dim(), args.fill_missing)
        .with_context(|| format!("bad transition table {}", args.table.display()))?;
    Ok((lattice, table))
}

fn simulate(args: &Args) -> Result<()> {
    let (lattice, table) = load(args)?;
    info!(
        size = lattice.size(),
        dim = ?lattice.dim(),
        workers = args.workers,
        generations = args.generations,
        "loaded"
    );

    let mut view = View::terminal(Duration::from_millis(args.delay_ms));
    let mut draw = |generation: usize, lattice: &Lattice| view.observe(generation, lattice);
    let observer: Option<&mut dyn FnMut(usize, &Lattice)> =
        if args.render { Some(&mut draw) } else { None };

    let result = if args.sequential {
        evolve_sequential(&lattice, &table, args.generations, observer)?
    } else {
        let coordinator = Coordinator::new(args.workers);
        coordinator.simulate_observed(&lattice, &table, args.generations, observer)?
    };

    if !args.render {
        print!("{result}");
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match simulate(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("[error] {err:#}");
            ExitCode::FAILURE
        }
    }
}
