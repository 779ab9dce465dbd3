//! Full ingest -> identify round trip against an in-memory catalog,
//! exercising the end-to-end recognition scenarios without a live
//! Postgres instance.

use rand::Rng;

use sabi::catalog::InMemoryCatalog;
use sabi::config::Config;
use sabi::orchestrator;

fn write_sine_wav(path: &std::path::Path, freq: f32, seconds: f32, sample_rate: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let n = (seconds * sample_rate as f32) as usize;
    for i in 0..n {
        let t = i as f32 / sample_rate as f32;
        let sample = (t * freq * std::f32::consts::TAU).sin() * i16::MAX as f32 * 0.8;
        writer.write_sample(sample as i16).unwrap();
    }
    writer.finalize().unwrap();
}

fn write_wav_slice(path: &std::path::Path, freq: f32, sample_rate: u32, start_secs: f32, duration_secs: f32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let start = (start_secs * sample_rate as f32) as usize;
    let n = (duration_secs * sample_rate as f32) as usize;
    for i in start..start + n {
        let t = i as f32 / sample_rate as f32;
        let sample = (t * freq * std::f32::consts::TAU).sin() * i16::MAX as f32 * 0.8;
        writer.write_sample(sample as i16).unwrap();
    }
    writer.finalize().unwrap();
}

#[test]
fn self_identify_returns_zero_offset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.wav");
    write_sine_wav(&path, 1200.0, 8.0, 11025);

    let mut catalog = InMemoryCatalog::new();
    let cfg = Config::default();
    orchestrator::ingest_file(&mut catalog, &path, &cfg, None).unwrap();

    let recognition = orchestrator::identify(&mut catalog, &path, &cfg, None)
        .unwrap()
        .expect("expected a match");
    assert_eq!(recognition.record_name, "song");
    assert_eq!(recognition.offset, 0);
    assert_eq!(recognition.offset_seconds, 0.0);
}

#[test]
fn identifying_a_later_slice_reports_matching_positive_offset() {
    let dir = tempfile::tempdir().unwrap();
    let full_path = dir.path().join("song.wav");
    let sample_rate = 11025;
    write_sine_wav(&full_path, 1500.0, 10.0, sample_rate);

    let mut catalog = InMemoryCatalog::new();
    let cfg = Config::default();
    orchestrator::ingest_file(&mut catalog, &full_path, &cfg, None).unwrap();

    let mut rng = rand::rng();
    let start_secs = rng.random_range(1.0..4.0f32);

    let slice_path = dir.path().join("song_slice.wav");
    write_wav_slice(&slice_path, 1500.0, sample_rate, start_secs, 3.0);

    let recognition = orchestrator::identify(&mut catalog, &slice_path, &cfg, None)
        .unwrap()
        .expect("expected a match even from an offset slice");
    assert_eq!(recognition.record_name, "song");

    let expected_hops = (start_secs as f64 * sample_rate as f64 / cfg.hop() as f64).round();
    let expected_secs = expected_hops * cfg.hop() as f64 / sample_rate as f64;
    assert!(
        (recognition.offset_seconds - expected_secs).abs() < 0.25,
        "offset_seconds={} expected near {}",
        recognition.offset_seconds,
        expected_secs
    );
}

#[test]
fn unrelated_audio_does_not_match() {
    let dir = tempfile::tempdir().unwrap();
    let known_path = dir.path().join("known.wav");
    write_sine_wav(&known_path, 440.0, 6.0, 11025);

    let mut catalog = InMemoryCatalog::new();
    let cfg = Config::default();
    orchestrator::ingest_file(&mut catalog, &known_path, &cfg, None).unwrap();

    let unknown_path = dir.path().join("unknown.wav");
    write_sine_wav(&unknown_path, 3700.0, 6.0, 11025);

    let result = orchestrator::identify(&mut catalog, &unknown_path, &cfg, None).unwrap();
    assert!(result.is_none(), "unrelated tone should not match the catalog");
}

#[test]
fn reingesting_the_same_file_does_not_duplicate_the_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.wav");
    write_sine_wav(&path, 900.0, 5.0, 11025);

    let mut catalog = InMemoryCatalog::new();
    let cfg = Config::default();

    let first = orchestrator::ingest_file(&mut catalog, &path, &cfg, None).unwrap();
    assert!(first.is_some());
    let second = orchestrator::ingest_file(&mut catalog, &path, &cfg, None).unwrap();
    assert!(second.is_none());

    let records = catalog.list_fingerprinted_records().unwrap();
    assert_eq!(records.len(), 1);
}

#[test]
fn empty_query_produces_no_match_rather_than_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let known_path = dir.path().join("song.wav");
    write_sine_wav(&known_path, 900.0, 5.0, 11025);

    let mut catalog = InMemoryCatalog::new();
    let cfg = Config::default();
    orchestrator::ingest_file(&mut catalog, &known_path, &cfg, None).unwrap();

    // Fewer samples than NFFT: zero frames, zero peaks, zero hashes.
    let silent_path = dir.path().join("silence.wav");
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 11025,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&silent_path, spec).unwrap();
    for _ in 0..100 {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();

    let result = orchestrator::identify(&mut catalog, &silent_path, &cfg, None).unwrap();
    assert!(result.is_none());
}
