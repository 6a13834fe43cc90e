use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::{
    assets, export,
    model::AnalysisOptions,
    registry::TrackRegistry,
    report,
};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("missing slice sidecar: {0}")]
    MissingSidecar(PathBuf),
    #[error("unreadable audio file {path}: {source}")]
    UnreadableAudio {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },
    #[error("slice decoder failed: {0}")]
    DecoderFailed(String),
    #[error("archive export failed: {0}")]
    ExportFailed(String),
    #[error("io error: {0}")]
    Io(String),
}

impl From<anyhow::Error> for PipelineError {
    fn from(value: anyhow::Error) -> Self {
        Self::Io(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchInput {
    pub path: PathBuf,
    pub suggestion: Option<f64>,
}

impl BatchInput {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            suggestion: None,
        }
    }
}

#[must_use]
pub fn parse_input_arg(arg: &str) -> BatchInput {
    if let Some((path, bpm)) = arg.rsplit_once(':') {
        if let Ok(suggestion) = bpm.trim().parse::<f64>() {
            return BatchInput {
                path: PathBuf::from(path),
                suggestion: Some(suggestion),
            };
        }
    }
    BatchInput::new(arg)
}

#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub analysis: AnalysisOptions,
    pub bpm_override: Option<f64>,
    pub multisample: bool,
    pub decoder: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub analyzed: usize,
    pub skipped: usize,
}

#[instrument(skip(registry, options), fields(path = %input.path.display()))]
pub fn process_file(
    registry: &mut TrackRegistry,
    input: &BatchInput,
    options: &BatchOptions,
) -> Result<(), PipelineError> {
    let is_rx2 = input
        .path
        .extension()
        .and_then(|value| value.to_str())
        .is_some_and(|value| value.eq_ignore_ascii_case("rx2"));

    let wav_path = if is_rx2 {
        assets::decode_rx2(&input.path, options.decoder.as_deref())
            .map_err(|error| PipelineError::DecoderFailed(error.to_string()))?
    } else {
        input.path.clone()
    };

    let sidecar = assets::sidecar_path(&wav_path);
    if !sidecar.is_file() {
        return Err(PipelineError::MissingSidecar(sidecar));
    }

    let onsets = assets::read_onsets(&sidecar)?;
    let audio = assets::read_wav_info(&wav_path).map_err(|source| {
        PipelineError::UnreadableAudio {
            path: wav_path.clone(),
            source,
        }
    })?;

    if onsets.is_empty() {
        info!("sidecar holds no slices, degrading to an unwarped grid");
    }

    if options.multisample {
        export::export_multisample(&wav_path, &audio, &onsets)
            .map_err(|error| PipelineError::ExportFailed(error.to_string()))?;
    } else {
        registry.add_track(
            &wav_path,
            &onsets,
            audio,
            input.suggestion,
            &options.analysis,
        );
    }

    Ok(())
}

#[instrument(skip(inputs, options), fields(inputs = inputs.len(), output = %output_path.display()))]
pub fn process_batch(
    inputs: &[BatchInput],
    options: &BatchOptions,
    output_path: &Path,
    report_path: Option<&Path>,
) -> anyhow::Result<BatchOutcome> {
    let mut registry = TrackRegistry::new();
    let mut outcome = BatchOutcome::default();

    for input in inputs {
        match process_file(&mut registry, input, options) {
            Ok(()) => outcome.analyzed += 1,
            Err(error @ PipelineError::ExportFailed(_)) => return Err(error.into()),
            Err(error) => {
                warn!(path = %input.path.display(), %error, "skipping input");
                outcome.skipped += 1;
            }
        }
    }

    if !options.multisample {
        export::export_dawproject(&mut registry, options.bpm_override, output_path)?;
    }

    if let Some(path) = report_path {
        let analysis = report::generate_analysis_report(&registry, options.bpm_override);
        report::write_analysis_report(path, &analysis)?;
    }

    info!(
        analyzed = outcome.analyzed,
        skipped = outcome.skipped,
        "batch complete"
    );
    Ok(outcome)
}
