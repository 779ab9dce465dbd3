//! Decoder adapter: turns a file on disk into per-channel int16 PCM, its
//! sample rate, and the SHA-1 digest of its raw bytes.

use std::fs::File;
use std::path::Path;

use sha1::{Digest as _, Sha1};
use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::digest::FileDigest;
use crate::error::FingerprintError;

/// At least 1 MiB per chunk, so digesting doesn't require loading the whole
/// file into memory.
const DIGEST_CHUNK_SIZE: usize = 1 << 20;

/// Decoded result of one audio file: per-channel int16 samples at the
/// file's native sample rate, plus the digest of the raw file bytes.
pub struct DecodedAudio {
    pub channels: Vec<Vec<i16>>,
    pub sample_rate: u32,
    pub file_sha1: FileDigest,
}

/// Decode `path`, optionally truncating every channel to the first `limit`
/// seconds of audio.
pub fn decode_file(path: &Path, limit_secs: Option<f64>) -> Result<DecodedAudio, FingerprintError> {
    let file_sha1 = hash_file(path)?;
    let (channels, sample_rate) = decode_samples(path).map_err(|source| FingerprintError::Decode {
        path: path.display().to_string(),
        source,
    })?;

    let channels = match limit_secs {
        Some(limit) => {
            let max_frames = (limit * sample_rate as f64).round() as usize;
            channels
                .into_iter()
                .map(|mut c| {
                    c.truncate(max_frames);
                    c
                })
                .collect()
        }
        None => channels,
    };

    Ok(DecodedAudio {
        channels,
        sample_rate,
        file_sha1,
    })
}

/// Digest of a file's raw bytes, streamed in ≥1 MiB chunks. Exposed
/// separately from [`decode_file`] so the ingest orchestrator can check the
/// fingerprinted-digest skip set before paying for a full decode.
pub fn hash_file(path: &Path) -> Result<FileDigest, FingerprintError> {
    use std::io::Read;

    let mut file = File::open(path)?;
    let mut hasher = Sha1::new();
    let mut buf = vec![0u8; DIGEST_CHUNK_SIZE];

    loop {
        let read = file.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }

    Ok(FileDigest::from_bytes(hasher.finalize().into()))
}

fn decode_samples(path: &Path) -> anyhow::Result<(Vec<Vec<i16>>, u32)> {
    let file = File::open(path)?;
    let source = Box::new(file);
    let stream = MediaSourceStream::new(source, Default::default());

    let probe = symphonia::default::get_probe();
    let probed = probe.format(
        &Hint::new(),
        stream,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.sample_rate.is_some())
        .ok_or_else(|| anyhow::anyhow!("no decodable track found"))?;
    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.unwrap();

    let codec_registry = symphonia::default::get_codecs();
    let mut decoder = codec_registry.make(&track.codec_params, &DecoderOptions::default())?;

    let mut channels: Vec<Vec<i16>> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(_)) => break,
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder.decode(&packet)?;
        let spec = *decoded.spec();
        let num_channels = spec.channels.count();

        if channels.is_empty() {
            channels.resize(num_channels, Vec::new());
        }

        match decoded {
            AudioBufferRef::S16(buf) => {
                for ch in 0..num_channels {
                    channels[ch].extend_from_slice(buf.chan(ch));
                }
            }
            other => {
                let spec = *other.spec();
                let frames = other.frames();
                let mut sample_buf = symphonia::core::audio::SampleBuffer::<i16>::new(
                    frames as symphonia::core::units::Duration,
                    spec,
                );
                sample_buf.copy_interleaved_ref(other);
                let interleaved = sample_buf.samples();
                for frame in interleaved.chunks(num_channels) {
                    for (ch, &sample) in frame.iter().enumerate() {
                        channels[ch].push(sample);
                    }
                }
            }
        }
    }

    Ok((channels, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn write_sine_wav(path: &Path, freq: f32, seconds: f32, sample_rate: u32) {
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

    #[test]
    fn decodes_mono_wav_and_hashes_raw_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_sine_wav(&path, 1000.0, 1.0, 11025);

        let decoded = decode_file(&path, None).unwrap();
        assert_eq!(decoded.sample_rate, 11025);
        assert_eq!(decoded.channels.len(), 1);
        assert!(decoded.channels[0].len() >= 11025 - 1);

        let mut raw = Vec::new();
        File::open(&path).unwrap().read_to_end(&mut raw).unwrap();
        let mut hasher = Sha1::new();
        hasher.update(&raw);
        let expected = FileDigest::from_bytes(hasher.finalize().into());
        assert_eq!(decoded.file_sha1, expected);
    }

    #[test]
    fn duration_limit_truncates_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_sine_wav(&path, 1000.0, 5.0, 11025);

        let decoded = decode_file(&path, Some(2.0)).unwrap();
        let expected_frames = (2.0 * 11025.0) as usize;
        assert!((decoded.channels[0].len() as i64 - expected_frames as i64).abs() <= 1);
    }
}
