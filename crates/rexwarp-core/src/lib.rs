pub mod assets;
pub mod diagnostics;
pub mod export;
pub mod grid;
pub mod model;
pub mod pipeline;
pub mod registry;
pub mod report;
pub mod tempo;
pub mod time;

pub use assets::{decode_rx2, expand_input, read_onsets, read_wav_info, sidecar_path};
pub use diagnostics::{TelemetryGuard, init_tracing, init_tracing_with_options};
pub use export::{export_dawproject, export_multisample};
pub use grid::{GridFit, reconcile};
pub use model::{
    AnalysisOptions, AudioInfo, DEFAULT_BPM, DEFAULT_SNAP_TOLERANCE, GridModel, MAX_BPM, MIN_BPM,
    SliceTrack, WarpMarker,
};
pub use pipeline::{
    BatchInput, BatchOptions, BatchOutcome, PipelineError, parse_input_arg, process_batch,
    process_file,
};
pub use registry::{IdAllocator, TrackRegistry};
pub use report::{AnalysisReport, TrackSummary, generate_analysis_report, write_analysis_report};
pub use tempo::{estimate_bpm, estimate_swing};
