use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use rexwarp_core::{
    AnalysisOptions, BatchInput, BatchOptions, DEFAULT_SNAP_TOLERANCE,
    diagnostics::init_tracing,
    expand_input, parse_input_arg,
    pipeline::process_batch,
};

#[derive(Debug, Parser)]
#[command(name = "rexwarp-cli")]
#[command(about = "Convert sliced WAV/RX2 audio into a dawproject or multisample archive")]
struct Cli {
    files: Vec<String>,

    #[arg(short = 'l', long)]
    list: Option<PathBuf>,

    #[arg(short = 'o', long, default_value = "Export.dawproject")]
    output: PathBuf,

    #[arg(short = 'b', long)]
    bpm: Option<f64>,

    #[arg(long)]
    multisample: bool,

    #[arg(long)]
    all_markers: bool,

    #[arg(long, default_value_t = DEFAULT_SNAP_TOLERANCE)]
    snap_tolerance: f64,

    #[arg(long)]
    decoder: Option<PathBuf>,

    #[arg(long)]
    report: Option<PathBuf>,

    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _telemetry = init_tracing(&cli.log_dir)?;

    let mut inputs = Vec::new();
    for arg in &cli.files {
        collect_input(&mut inputs, parse_input_arg(arg));
    }
    if let Some(list_path) = &cli.list {
        let content = std::fs::read_to_string(list_path)
            .with_context(|| format!("failed to read list file: {}", list_path.display()))?;
        for line in content.lines().map(str::trim).filter(|line| !line.is_empty()) {
            collect_input(&mut inputs, parse_input_arg(line));
        }
    }
    if inputs.is_empty() {
        anyhow::bail!("no input files given (see --help)");
    }

    let options = BatchOptions {
        analysis: AnalysisOptions {
            snap_tolerance: cli.snap_tolerance,
            keep_sixteenths: cli.all_markers,
        },
        bpm_override: cli.bpm,
        multisample: cli.multisample,
        decoder: cli.decoder,
    };

    process_batch(&inputs, &options, &cli.output, cli.report.as_deref())?;
    Ok(())
}

fn collect_input(inputs: &mut Vec<BatchInput>, parsed: BatchInput) {
    for path in expand_input(&parsed.path) {
        inputs.push(BatchInput {
            path,
            suggestion: parsed.suggestion,
        });
    }
}
