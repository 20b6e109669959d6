//! Breadboard - DC circuit state engine
//!
//! Settles a bench description and prints every element's readout.
//!
//! # Usage
//!
//! ```bash
//! breadboard lamp.bench --toggle S1
//! breadboard lamp.bench --json > settled.json
//! ```

use std::io;
use std::path::PathBuf;

use breadboard_core::{
    circuit::Breadboard,
    dsl,
    error::{BreadboardError, Result},
    report::Report,
    SettleConfig, Settler, DEFAULT_MAX_ITERATIONS,
};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Educational breadboard circuit state engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the bench description file
    #[arg(value_name = "BENCH_FILE")]
    bench_file: PathBuf,

    /// Flip a switch before settling (repeatable)
    #[arg(short, long, value_name = "NAME")]
    toggle: Vec<String>,

    /// Maximum relaxation passes per settling attempt
    #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,

    /// Print the settled snapshot as JSON
    #[arg(long)]
    json: bool,

    /// Log settling progress
    #[arg(short, long)]
    verbose: bool,

    /// Log every propagation step
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // --debug > --verbose > RUST_LOG > "warn"
    let filter = if args.debug {
        EnvFilter::new("debug")
    } else if args.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(io::stderr)
                .with_filter(filter),
        )
        .init();

    // Parse and build the board
    let ast = dsl::parse_file(&args.bench_file)?;
    let mut bench = Breadboard::from_ast(ast)?;
    info!(
        path = %args.bench_file.display(),
        elements = bench.board.elements.len(),
        connections = bench.board.connections.len(),
        "loaded bench"
    );

    for name in &args.toggle {
        let id = bench
            .id_of(name)
            .ok_or_else(|| BreadboardError::UndeclaredElement {
                name: name.clone(),
                line: 0,
            })?;
        let closed = bench.board.toggle_switch(id)?;
        debug!(switch = %name, closed, "toggled");
    }

    // Settle
    let config = SettleConfig::new().with_max_iterations(args.max_iterations);
    let settlement = Settler::with_config(config).settle_board(&bench.board);

    // Report
    let report = Report::new(&bench, &settlement);
    let mut stdout = io::stdout().lock();
    if args.json {
        report.write_json(&mut stdout)?;
    } else {
        report.write_text(&mut stdout)?;
    }

    Ok(())
}
