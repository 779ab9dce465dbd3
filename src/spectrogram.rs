//! Spectrogram computation: short-time FFT with a Hann window, 50% overlap,
//! one-sided log-magnitude output.

use ndarray::Array2;

use crate::config::Config;
use crate::fft::complex::Complex;
use crate::fft::fft;

/// `[freq_bin][time_frame]` log-magnitude (dB) matrix.
pub struct Spectrogram {
    pub data: Array2<f32>,
}

impl Spectrogram {
    pub fn freq_bins(&self) -> usize {
        self.data.shape()[0]
    }

    pub fn time_frames(&self) -> usize {
        self.data.shape()[1]
    }

    pub fn get(&self, freq_bin: usize, time_frame: usize) -> f32 {
        self.data[[freq_bin, time_frame]]
    }
}

/// `wₙ = 0.5·(1 − cos(2π n / (N−1)))`, n = 0..N-1.
fn hann_window(n: usize) -> Vec<f32> {
    if n == 1 {
        return vec![1.0];
    }
    let denom = (n - 1) as f32;
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / denom).cos()))
        .collect()
}

/// Compute a one-sided log-magnitude spectrogram of `samples` at `fs` Hz.
/// Frames whose starting sample would run past the end of `samples` are not
/// produced.
pub fn compute(samples: &[i16], fs: u32, cfg: &Config) -> Spectrogram {
    let nfft = cfg.nfft;
    let hop = cfg.hop();
    let window = hann_window(nfft);
    let window_sq_sum: f64 = window.iter().map(|&w| (w as f64) * (w as f64)).sum();
    // PSD scale = 1 / (fs * sum(w^2)).
    let scale = 1.0 / (fs as f64 * window_sq_sum);

    let num_bins = nfft / 2 + 1;
    let num_frames = if samples.len() >= nfft {
        (samples.len() - nfft) / hop + 1
    } else {
        0
    };

    let mut data = Array2::<f32>::zeros((num_bins, num_frames));

    for frame_idx in 0..num_frames {
        let start = frame_idx * hop;
        let frame_samples = &samples[start..start + nfft];

        let mut buf: Vec<Complex> = frame_samples
            .iter()
            .zip(window.iter())
            .map(|(&s, &w)| Complex::new(s as f32 * w, 0.0))
            .collect();
        buf.resize(nfft, Complex::new(0.0, 0.0));

        let spectrum = fft::forward(&buf);

        for (bin, slot) in spectrum.iter().take(num_bins).enumerate() {
            let mut power = slot.norm_sqr() as f64 * scale;
            // One-sided spectrum: double every bin except DC and Nyquist.
            if bin != 0 && bin != nfft / 2 {
                power *= 2.0;
            }

            let db = if power > 0.0 {
                10.0 * power.log10()
            } else {
                0.0
            };
            data[[bin, frame_idx]] = db as f32;
        }
    }

    Spectrogram { data }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hann_window_endpoints_are_zero() {
        let w = hann_window(4096);
        assert!(w[0].abs() < 1e-6);
        assert!((w[w.len() - 1]).abs() < 1e-5);
        // Midpoint of a Hann window is 1.0.
        let mid = w[w.len() / 2];
        assert!((mid - 1.0).abs() < 1e-3);
    }

    #[test]
    fn too_short_signal_produces_zero_frames() {
        let cfg = Config::default();
        let samples = vec![0i16; cfg.nfft - 1];
        let spec = compute(&samples, cfg.sample_rate_default, &cfg);
        assert_eq!(spec.time_frames(), 0);
    }

    #[test]
    fn silence_produces_zero_db_everywhere() {
        let cfg = Config::default();
        let samples = vec![0i16; cfg.nfft * 3];
        let spec = compute(&samples, cfg.sample_rate_default, &cfg);
        assert!(spec.time_frames() > 0);
        for v in spec.data.iter() {
            assert_eq!(*v, 0.0);
        }
    }

    #[test]
    fn pure_tone_has_energy_concentrated_near_expected_bin() {
        let cfg = Config::default();
        let fs = 11025u32;
        let freq = 1000.0f32;
        let n = cfg.nfft * 4;
        let samples: Vec<i16> = (0..n)
            .map(|i| {
                let t = i as f32 / fs as f32;
                ((t * freq * std::f32::consts::TAU).sin() * i16::MAX as f32 * 0.5) as i16
            })
            .collect();
        let spec = compute(&samples, fs, &cfg);
        assert!(spec.time_frames() > 0);

        let expected_bin = (freq * cfg.nfft as f32 / fs as f32).round() as usize;
        let mut max_bin = 0;
        let mut max_db = f32::MIN;
        for bin in 0..spec.freq_bins() {
            let v = spec.get(bin, 1);
            if v > max_db {
                max_db = v;
                max_bin = bin;
            }
        }
        assert!(
            (max_bin as i64 - expected_bin as i64).abs() <= 1,
            "expected peak near bin {expected_bin}, got {max_bin}"
        );
    }
}
