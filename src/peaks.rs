//! 2-D peak picker: local-maximum detection over a diamond neighborhood,
//! with spurious flat-zero maxima suppressed by XORing against an eroded
//! background mask.

use crate::config::Config;
use crate::spectrogram::Spectrogram;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub freq_bin: usize,
    pub time_frame: usize,
    pub amplitude_db: f32,
}

/// Offsets `(dy, dx)` within Manhattan distance `radius` of the origin, the
/// diamond produced by iterating a 3×3 cross structuring element `radius`
/// times via binary dilation.
fn diamond_offsets(radius: i32) -> Vec<(i32, i32)> {
    let mut offsets = Vec::new();
    for dy in -radius..=radius {
        let remaining = radius - dy.abs();
        for dx in -remaining..=remaining {
            offsets.push((dy, dx));
        }
    }
    offsets
}

/// scipy's default `mode='reflect'` boundary: `(d c b a | a b c d | d c b a)`.
fn reflect(i: i64, n: i64) -> usize {
    if n == 1 {
        return 0;
    }
    let period = 2 * n;
    let mut m = i % period;
    if m < 0 {
        m += period;
    }
    (if m < n { m } else { period - 1 - m }) as usize
}

pub fn find_peaks(spectrogram: &Spectrogram, cfg: &Config) -> Vec<Peak> {
    let h = spectrogram.freq_bins() as i64;
    let w = spectrogram.time_frames() as i64;
    if h == 0 || w == 0 {
        return Vec::new();
    }

    let offsets = diamond_offsets(cfg.peak_neighborhood);
    let mut peaks = Vec::new();

    for y in 0..h {
        for x in 0..w {
            let center = spectrogram.get(y as usize, x as usize);

            // local_max: center equals the max over the neighborhood under
            // reflect-boundary indexing (maximum_filter).
            let mut neighborhood_max = f32::MIN;
            for &(dy, dx) in &offsets {
                let ny = reflect(y + dy as i64, h);
                let nx = reflect(x + dx as i64, w);
                let v = spectrogram.get(ny, nx);
                if v > neighborhood_max {
                    neighborhood_max = v;
                }
            }
            let local_max = center == neighborhood_max;

            // eroded_background: every neighbor (border treated as True) is
            // itself zero.
            let mut eroded_background = true;
            for &(dy, dx) in &offsets {
                let ny = y + dy as i64;
                let nx = x + dx as i64;
                let neighbor_is_background = if ny < 0 || ny >= h || nx < 0 || nx >= w {
                    true
                } else {
                    spectrogram.get(ny as usize, nx as usize) == 0.0
                };
                if !neighbor_is_background {
                    eroded_background = false;
                    break;
                }
            }

            let is_peak = (local_max ^ eroded_background) && center > cfg.amp_min;
            if is_peak {
                peaks.push(Peak {
                    freq_bin: y as usize,
                    time_frame: x as usize,
                    amplitude_db: center,
                });
            }
        }
    }

    peaks
}
