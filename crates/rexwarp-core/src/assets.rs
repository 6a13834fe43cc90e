use std::{
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::{Context, Result, bail};
use quick_xml::{Reader, events::Event};
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use crate::model::AudioInfo;

const DECODER_BINARY: &str = if cfg!(windows) { "rx2slices.exe" } else { "rx2slices" };

pub fn read_wav_info(path: &Path) -> Result<AudioInfo, hound::Error> {
    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let total_frames = u64::from(reader.duration());
    let duration_seconds = if spec.sample_rate == 0 {
        0.0
    } else {
        total_frames as f64 / f64::from(spec.sample_rate)
    };

    Ok(AudioInfo {
        duration_seconds,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        total_frames,
    })
}

#[must_use]
pub fn sidecar_path(wav_path: &Path) -> PathBuf {
    let stem = wav_path
        .file_stem()
        .map_or_else(String::new, |stem| stem.to_string_lossy().into_owned());
    wav_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(".slices")
        .join(format!("{stem}.slices"))
}

#[instrument(fields(path = %path.display()))]
pub fn read_onsets(path: &Path) -> Result<Vec<f64>> {
    let mut reader = Reader::from_file(path)
        .with_context(|| format!("failed to open slice sidecar: {}", path.display()))?;
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut onsets = Vec::new();
    loop {
        match reader
            .read_event_into(&mut buf)
            .with_context(|| format!("malformed slice sidecar: {}", path.display()))?
        {
            Event::Start(element) | Event::Empty(element)
                if element.name().as_ref() == b"slice" =>
            {
                for attribute in element.attributes() {
                    let attribute = attribute.with_context(|| {
                        format!("malformed slice attribute in {}", path.display())
                    })?;
                    if attribute.key.as_ref() == b"start" {
                        let value = attribute.unescape_value().with_context(|| {
                            format!("unreadable slice start in {}", path.display())
                        })?;
                        let start: f64 = value.trim().parse().with_context(|| {
                            format!("invalid slice start {value:?} in {}", path.display())
                        })?;
                        onsets.push(start);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    onsets.sort_by(f64::total_cmp);
    debug!(onsets = onsets.len(), "sidecar parsed");
    Ok(onsets)
}

#[instrument(fields(path = %path.display()))]
pub fn decode_rx2(path: &Path, decoder_override: Option<&Path>) -> Result<PathBuf> {
    let decoder = locate_decoder(decoder_override);
    let status = Command::new(&decoder)
        .arg(path)
        .status()
        .with_context(|| format!("failed to spawn slice decoder: {}", decoder.display()))?;

    if !status.success() {
        bail!(
            "slice decoder exited with status {status} for {}",
            path.display()
        );
    }

    Ok(path.with_extension("wav"))
}

#[must_use]
pub fn expand_input(path: &Path) -> Vec<PathBuf> {
    if !path.is_dir() {
        return vec![path.to_path_buf()];
    }

    let mut inputs = Vec::new();
    for entry in WalkDir::new(path).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                warn!(?error, "ignoring unreadable entry while expanding inputs");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let extension = entry
            .path()
            .extension()
            .and_then(|value| value.to_str())
            .map(str::to_ascii_lowercase);
        if matches!(extension.as_deref(), Some("rx2" | "wav")) {
            inputs.push(entry.path().to_path_buf());
        }
    }

    inputs.sort();
    debug!(directory = %path.display(), count = inputs.len(), "directory expanded");
    inputs
}

fn locate_decoder(decoder_override: Option<&Path>) -> PathBuf {
    if let Some(path) = decoder_override {
        return path.to_path_buf();
    }

    if let Ok(current_exe) = std::env::current_exe() {
        if let Some(dir) = current_exe.parent() {
            let sibling = dir.join(DECODER_BINARY);
            if sibling.is_file() {
                return sibling;
            }
        }
    }

    PathBuf::from(DECODER_BINARY)
}
