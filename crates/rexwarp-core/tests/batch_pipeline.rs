use std::path::{Path, PathBuf};

use rexwarp_core::{
    BatchInput, BatchOptions, PipelineError, TrackRegistry, parse_input_arg,
    pipeline::{process_batch, process_file},
    read_onsets, report::read_analysis_report, sidecar_path,
};

fn write_silent_wav(path: &Path, sample_rate: u32, frames: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("wav create should succeed");
    for _ in 0..frames {
        writer
            .write_sample(0_i16)
            .expect("wav sample write should succeed");
    }
    writer.finalize().expect("wav finalize should succeed");
}

fn write_sidecar(wav_path: &Path, onsets: &[f64]) {
    let sidecar = sidecar_path(wav_path);
    std::fs::create_dir_all(sidecar.parent().expect("sidecar has a parent"))
        .expect("sidecar directory should be creatable");

    let mut document = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<audio filename=\"x.wav\">\n",
    );
    for onset in onsets {
        document.push_str(&format!("  <slice start=\"{onset:.6}\" />\n"));
    }
    document.push_str("</audio>\n");
    std::fs::write(&sidecar, document).expect("sidecar write should succeed");
}

#[test]
fn input_arguments_parse_the_bpm_suffix_from_the_right() {
    assert_eq!(
        parse_input_arg("loop.wav:95.5"),
        BatchInput {
            path: PathBuf::from("loop.wav"),
            suggestion: Some(95.5),
        }
    );
    assert_eq!(parse_input_arg("loop.wav"), BatchInput::new("loop.wav"));
    assert_eq!(
        parse_input_arg("C:\\samples\\loop.wav"),
        BatchInput::new("C:\\samples\\loop.wav")
    );
    assert_eq!(
        parse_input_arg("loop.wav:fast"),
        BatchInput::new("loop.wav:fast")
    );
}

#[test]
fn sidecar_onsets_come_back_sorted() {
    let temp_dir = tempfile::tempdir().expect("tempdir should work");
    let wav_path = temp_dir.path().join("loop.wav");
    write_sidecar(&wav_path, &[0.45, 0.0, 0.15, 0.3]);

    let onsets = read_onsets(&sidecar_path(&wav_path)).expect("sidecar should parse");
    assert_eq!(onsets, vec![0.0, 0.15, 0.3, 0.45]);
}

#[test]
fn missing_sidecar_is_reported_per_file() {
    let temp_dir = tempfile::tempdir().expect("tempdir should work");
    let wav_path = temp_dir.path().join("orphan.wav");
    write_silent_wav(&wav_path, 44_100, 44_100);

    let mut registry = TrackRegistry::new();
    let result = process_file(
        &mut registry,
        &BatchInput::new(&wav_path),
        &BatchOptions::default(),
    );
    assert!(matches!(result, Err(PipelineError::MissingSidecar(_))));
    assert!(registry.is_empty());
}

#[test]
fn unreadable_audio_is_fatal_for_that_file_only() {
    let temp_dir = tempfile::tempdir().expect("tempdir should work");

    let broken = temp_dir.path().join("broken.wav");
    std::fs::write(&broken, b"not a wav at all").expect("broken wav write should succeed");
    write_sidecar(&broken, &[0.0, 0.15, 0.3]);

    let mut registry = TrackRegistry::new();
    let result = process_file(
        &mut registry,
        &BatchInput::new(&broken),
        &BatchOptions::default(),
    );
    assert!(matches!(
        result,
        Err(PipelineError::UnreadableAudio { .. })
    ));
    assert!(registry.is_empty());

    let good = temp_dir.path().join("good.wav");
    write_silent_wav(&good, 44_100, 52_920);
    write_sidecar(&good, &(0..8).map(|index| f64::from(index) * 0.15).collect::<Vec<_>>());

    let output = temp_dir.path().join("Export.dawproject");
    let inputs = vec![BatchInput::new(&broken), BatchInput::new(&good)];
    let outcome = process_batch(&inputs, &BatchOptions::default(), &output, None)
        .expect("batch should survive the unreadable file");

    assert_eq!(outcome.analyzed, 1);
    assert_eq!(outcome.skipped, 1);
    assert!(output.is_file());
}

#[test]
fn missing_decoder_binary_surfaces_as_a_decoder_failure() {
    let temp_dir = tempfile::tempdir().expect("tempdir should work");
    let rx2 = temp_dir.path().join("loop.rx2");
    std::fs::write(&rx2, b"CAT ").expect("rx2 stub write should succeed");

    let options = BatchOptions {
        decoder: Some(temp_dir.path().join("no-such-decoder")),
        ..BatchOptions::default()
    };
    let mut registry = TrackRegistry::new();
    let result = process_file(&mut registry, &BatchInput::new(&rx2), &options);

    assert!(matches!(result, Err(PipelineError::DecoderFailed(_))));
    assert!(registry.is_empty());
}

#[test]
fn batch_skips_bad_files_and_still_exports_the_rest() {
    let temp_dir = tempfile::tempdir().expect("tempdir should work");

    let good = temp_dir.path().join("good.wav");
    write_silent_wav(&good, 44_100, 52_920);
    write_sidecar(&good, &(0..8).map(|index| f64::from(index) * 0.15).collect::<Vec<_>>());

    let orphan = temp_dir.path().join("orphan.wav");
    write_silent_wav(&orphan, 44_100, 44_100);

    let output = temp_dir.path().join("Export.dawproject");
    let report = temp_dir.path().join("report.json");
    let inputs = vec![BatchInput::new(&good), BatchInput::new(&orphan)];

    let outcome = process_batch(
        &inputs,
        &BatchOptions::default(),
        &output,
        Some(report.as_path()),
    )
    .expect("batch should succeed despite the orphan");

    assert_eq!(outcome.analyzed, 1);
    assert_eq!(outcome.skipped, 1);
    assert!(output.is_file());

    let analysis = read_analysis_report(&report).expect("report should parse");
    assert_eq!(analysis.tracks.len(), 1);
    assert!((analysis.tracks[0].bpm - 100.0).abs() <= 0.1);
    assert!((analysis.global_bpm - 100.0).abs() <= 0.1);
}
