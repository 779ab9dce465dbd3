//! Recursive radix-2 Cooley-Tukey FFT. Hand-rolled rather than pulled from a
//! crate, since NFFT is fixed at a power of two and the transform itself is
//! the whole of the job.

use std::f32::consts::PI;

use crate::fft::complex::Complex;

/// Forward FFT of a buffer whose length must be a power of two.
pub fn forward(buf: &[Complex]) -> Vec<Complex> {
    let n = buf.len();
    assert!(n.is_power_of_two(), "FFT length must be a power of two");

    let mut out = buf.to_vec();
    fft_in_place(&mut out);
    out
}

fn fft_in_place(buf: &mut [Complex]) {
    let n = buf.len();
    if n <= 1 {
        return;
    }

    let mut even: Vec<Complex> = Vec::with_capacity(n / 2);
    let mut odd: Vec<Complex> = Vec::with_capacity(n / 2);

    for (i, &sample) in buf.iter().enumerate() {
        if i % 2 == 0 {
            even.push(sample);
        } else {
            odd.push(sample);
        }
    }

    fft_in_place(&mut even);
    fft_in_place(&mut odd);

    // P(ω)  = Pₑ(ω²) + ω·Pₒ(ω²)
    // P(-ω) = Pₑ(ω²) - ω·Pₒ(ω²)
    // where ω = e^{-i·2π/n}; -ω^j = ω^{j + n/2}.
    for j in 0..n / 2 {
        let theta = (2.0 * PI * (j as f32)) / (n as f32);
        let twiddle = Complex::from_polar(1.0, -theta);

        let t = twiddle * odd[j];
        buf[j] = even[j] + t;
        buf[j + n / 2] = even[j] - t;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fft_of_dc_signal_concentrates_at_bin_zero() {
        let buf: Vec<Complex> = (0..64).map(|_| Complex::new(1.0, 0.0)).collect();
        let out = forward(&buf);
        assert!((out[0].re - 64.0).abs() < 1e-3);
        for bin in out.iter().skip(1) {
            assert!(bin.norm_sqr().sqrt() < 1e-2);
        }
    }

    #[test]
    fn fft_of_pure_tone_peaks_at_expected_bin() {
        let n = 256;
        let k = 10; // bin index of the tone
        let buf: Vec<Complex> = (0..n)
            .map(|i| {
                let phase = 2.0 * PI * (k as f32) * (i as f32) / (n as f32);
                Complex::new(phase.cos(), 0.0)
            })
            .collect();
        let out = forward(&buf);

        let mags: Vec<f32> = out.iter().map(|c| c.norm_sqr().sqrt()).collect();
        let max_bin = mags
            .iter()
            .enumerate()
            .take(n / 2)
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(max_bin, k);
    }
}
