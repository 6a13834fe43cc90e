use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use quick_xml::{
    Writer,
    events::{BytesDecl, BytesEnd, BytesStart, Event},
};
use tracing::{info, instrument, warn};
use zip::{ZipWriter, write::SimpleFileOptions};

use crate::{
    model::{AudioInfo, BASE_MIDI_KEY, SliceTrack},
    registry::{IdAllocator, TrackRegistry},
};

const METADATA_STUB: &str =
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><MetaData/>"#;

#[instrument(skip(registry), fields(path = %output_path.display(), tracks = registry.tracks().len()))]
pub fn export_dawproject(
    registry: &mut TrackRegistry,
    bpm_override: Option<f64>,
    output_path: &Path,
) -> Result<()> {
    if registry.is_empty() {
        warn!("no tracks registered, skipping project export");
        return Ok(());
    }

    let global_bpm = registry.global_bpm(bpm_override);
    let (tracks, ids) = registry.split_mut();
    let project_xml = build_project_xml(tracks, ids, global_bpm)?;

    write_archive(output_path, |archive, options| {
        archive
            .start_file("metadata.xml", options)
            .context("failed to start metadata.xml entry")?;
        archive
            .write_all(METADATA_STUB.as_bytes())
            .context("failed to write metadata.xml")?;

        archive
            .start_file("project.xml", options)
            .context("failed to start project.xml entry")?;
        archive
            .write_all(&project_xml)
            .context("failed to write project.xml")?;

        for track in tracks {
            archive
                .start_file(format!("audio/{}", track.name), options)
                .with_context(|| format!("failed to start audio entry for {}", track.name))?;
            let mut source = File::open(&track.source_path).with_context(|| {
                format!("failed to open track audio: {}", track.source_path.display())
            })?;
            io::copy(&mut source, archive)
                .with_context(|| format!("failed to embed track audio for {}", track.name))?;
        }
        Ok(())
    })?;

    info!(global_bpm, "project archive written");
    Ok(())
}

#[instrument(skip(audio, onsets), fields(path = %wav_path.display(), zones = onsets.len()))]
pub fn export_multisample(wav_path: &Path, audio: &AudioInfo, onsets: &[f64]) -> Result<PathBuf> {
    let file_name = wav_path
        .file_name()
        .map_or_else(String::new, |name| name.to_string_lossy().into_owned());
    let instrument_name = wav_path
        .file_stem()
        .map_or_else(String::new, |stem| stem.to_string_lossy().into_owned());

    let document = build_multisample_xml(&instrument_name, &file_name, audio, onsets)?;
    let output_path = wav_path.with_extension("multisample");

    write_archive(&output_path, |archive, options| {
        archive
            .start_file("multisample.xml", options)
            .context("failed to start multisample.xml entry")?;
        archive
            .write_all(&document)
            .context("failed to write multisample.xml")?;

        archive
            .start_file(file_name.clone(), options)
            .with_context(|| format!("failed to start audio entry for {file_name}"))?;
        let mut source = File::open(wav_path)
            .with_context(|| format!("failed to open source audio: {}", wav_path.display()))?;
        io::copy(&mut source, archive).context("failed to embed source audio")?;
        Ok(())
    })?;

    info!(path = %output_path.display(), "multisample archive written");
    Ok(output_path)
}

fn build_project_xml(
    tracks: &[SliceTrack],
    ids: &mut IdAllocator,
    global_bpm: f64,
) -> Result<Vec<u8>> {
    let mut document = XmlTree::new();
    document.declaration()?;

    document.open("Project", &[("version", "1.0".into())])?;
    document.empty(
        "Application",
        &[
            ("name", "rexwarp".into()),
            ("version", env!("CARGO_PKG_VERSION").into()),
        ],
    )?;

    document.open("Transport", &[])?;
    document.empty(
        "Tempo",
        &[
            ("value", format_float(global_bpm)),
            ("id", "id0".into()),
            ("name", "Tempo".into()),
        ],
    )?;
    document.empty(
        "TimeSignature",
        &[
            ("denominator", "4".into()),
            ("numerator", "4".into()),
            ("id", "id1".into()),
        ],
    )?;
    document.close("Transport")?;

    document.open("Structure", &[])?;
    for track in tracks {
        document.open(
            "Track",
            &[
                ("contentType", "audio".into()),
                ("loaded", "true".into()),
                ("id", track.track_id.clone()),
                ("name", track.name.clone()),
            ],
        )?;
        document.open(
            "Channel",
            &[
                ("audioChannels", track.audio.channels.to_string()),
                ("destination", "master_chan".into()),
                ("id", track.channel_id.clone()),
            ],
        )?;
        document.empty(
            "Volume",
            &[
                ("value", "1.0".into()),
                ("id", ids.allocate()),
                ("name", "Volume".into()),
            ],
        )?;
        document.close("Channel")?;
        document.close("Track")?;
    }

    document.open(
        "Track",
        &[
            ("contentType", "audio notes".into()),
            ("loaded", "true".into()),
            ("id", "master_track".into()),
            ("name", "Master".into()),
        ],
    )?;
    document.empty(
        "Channel",
        &[
            ("audioChannels", "2".into()),
            ("role", "master".into()),
            ("id", "master_chan".into()),
        ],
    )?;
    document.close("Track")?;
    document.close("Structure")?;

    document.open("Arrangement", &[("id", "arr_id".into())])?;
    document.open("Lanes", &[("timeUnit", "beats".into())])?;
    for track in tracks {
        document.empty(
            "Lanes",
            &[("track", track.track_id.clone()), ("id", ids.allocate())],
        )?;
    }
    document.close("Lanes")?;
    document.close("Arrangement")?;

    document.open("Scenes", &[])?;
    document.open(
        "Scene",
        &[("id", "scene0".into()), ("name", "Scene 1".into())],
    )?;
    document.open("Lanes", &[("id", "lanes_id".into())])?;

    for track in tracks {
        let duration_beats = format_float(track.clip_length_beats);

        document.open(
            "ClipSlot",
            &[
                ("hasStop", "true".into()),
                ("track", track.track_id.clone()),
                ("id", ids.allocate()),
            ],
        )?;
        document.open(
            "Clip",
            &[
                ("time", "0.0".into()),
                ("duration", duration_beats.clone()),
                ("name", track.name.clone()),
            ],
        )?;
        document.open("Clips", &[])?;
        document.open(
            "Clip",
            &[
                ("time", format_float(-track.first_onset_offset)),
                ("duration", duration_beats.clone()),
                ("contentTimeUnit", "beats".into()),
            ],
        )?;
        document.open(
            "Warps",
            &[
                ("contentTimeUnit", "seconds".into()),
                ("timeUnit", "beats".into()),
            ],
        )?;
        document.open(
            "Audio",
            &[
                ("channels", track.audio.channels.to_string()),
                ("sampleRate", track.audio.sample_rate.to_string()),
                ("duration", format_float(track.audio.duration_seconds)),
                ("id", ids.allocate()),
            ],
        )?;
        document.empty("File", &[("path", format!("audio/{}", track.name))])?;
        document.close("Audio")?;

        for marker in &track.warp_markers {
            document.empty(
                "Warp",
                &[
                    ("time", format_float(marker.beat_position)),
                    ("contentTime", format_float(marker.seconds)),
                ],
            )?;
        }
        document.close("Warps")?;
        document.close("Clip")?;
        document.close("Clips")?;
        document.close("Clip")?;
        document.close("ClipSlot")?;
    }

    document.close("Lanes")?;
    document.close("Scene")?;
    document.close("Scenes")?;
    document.close("Project")?;

    Ok(document.into_bytes())
}

fn build_multisample_xml(
    instrument_name: &str,
    file_name: &str,
    audio: &AudioInfo,
    onsets: &[f64],
) -> Result<Vec<u8>> {
    let mut document = XmlTree::new();
    document.declaration()?;
    document.open("multisample", &[("name", instrument_name.into())])?;

    let stop_frame = format!("{:.3}", audio.total_frames as f64);
    let mut midi_key = BASE_MIDI_KEY;
    for &onset in onsets {
        let start_frame = format!("{:.3}", onset * f64::from(audio.sample_rate));
        document.open(
            "sample",
            &[
                ("file", file_name.into()),
                ("sample-start", start_frame.clone()),
                ("sample-stop", stop_frame.clone()),
                ("zone-logic", "always-play".into()),
            ],
        )?;
        document.empty(
            "key",
            &[
                ("high", midi_key.to_string()),
                ("low", midi_key.to_string()),
                ("root", "60".into()),
                ("track", "0.0000".into()),
            ],
        )?;
        document.empty(
            "loop",
            &[
                ("mode", "off".into()),
                ("start", start_frame),
                ("stop", stop_frame.clone()),
            ],
        )?;
        document.close("sample")?;
        midi_key = midi_key.saturating_add(1).min(127);
    }

    document.close("multisample")?;
    Ok(document.into_bytes())
}

fn write_archive<F>(output_path: &Path, populate: F) -> Result<()>
where
    F: FnOnce(&mut ZipWriter<&mut File>, SimpleFileOptions) -> Result<()>,
{
    let parent = match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("failed to create output directory: {}", parent.display()))?;

    let mut temp_file = tempfile::NamedTempFile::new_in(parent)
        .context("failed to create temp archive file")?;

    {
        let mut archive = ZipWriter::new(temp_file.as_file_mut());
        let options = SimpleFileOptions::default();
        populate(&mut archive, options)?;
        archive.finish().context("failed to finalize archive")?;
    }

    temp_file
        .persist(output_path)
        .map_err(|error| anyhow::anyhow!(error.error))
        .with_context(|| format!("failed to persist archive: {}", output_path.display()))?;
    Ok(())
}

fn format_float(value: f64) -> String {
    if value == 0.0 {
        return "0.0".to_string();
    }
    format!("{value:?}")
}

struct XmlTree {
    writer: Writer<Vec<u8>>,
}

impl XmlTree {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
        }
    }

    fn declaration(&mut self) -> Result<()> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .context("failed to write xml declaration")
    }

    fn open(&mut self, name: &str, attributes: &[(&str, String)]) -> Result<()> {
        self.writer
            .write_event(Event::Start(element(name, attributes)))
            .with_context(|| format!("failed to open element <{name}>"))
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, String)]) -> Result<()> {
        self.writer
            .write_event(Event::Empty(element(name, attributes)))
            .with_context(|| format!("failed to write element <{name}/>"))
    }

    fn close(&mut self, name: &str) -> Result<()> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .with_context(|| format!("failed to close element <{name}>"))
    }

    fn into_bytes(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}

fn element<'a>(name: &'a str, attributes: &'a [(&'a str, String)]) -> BytesStart<'a> {
    let mut start = BytesStart::new(name);
    for (key, value) in attributes {
        start.push_attribute((*key, value.as_str()));
    }
    start
}
