//! Spectrogram/peak SVG dump used while debugging the pipeline by eye. Not
//! part of the recognition path; the spectrogram and peak picker produce
//! the data this just renders.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::peaks::Peak;
use crate::spectrogram::Spectrogram;

const WIDTH: f32 = 1920.0;
const HEIGHT: f32 = 1080.0;

pub fn write_heatmap_svg<P: AsRef<Path>>(
    spectrogram: &Spectrogram,
    peaks: &[Peak],
    output_path: P,
    record_name: &str,
) -> std::io::Result<()> {
    let freq_bins = spectrogram.freq_bins();
    let time_frames = spectrogram.time_frames();

    if freq_bins == 0 || time_frames == 0 {
        return write_placeholder_svg(output_path, "No spectrogram data");
    }

    let max_db = (0..freq_bins)
        .flat_map(|f| (0..time_frames).map(move |t| spectrogram.get(f, t)))
        .fold(f32::MIN, f32::max);

    if max_db <= 0.0 {
        return write_placeholder_svg(output_path, "No energy to visualize");
    }

    let padding_left = 80.0f32;
    let padding_right = 20.0f32;
    let padding_top = 60.0f32;
    let padding_bottom = 40.0f32;
    let plot_w = WIDTH - padding_left - padding_right;
    let plot_h = HEIGHT - padding_top - padding_bottom;

    let cell_w = plot_w / time_frames as f32;
    let cell_h = plot_h / freq_bins as f32;

    let mut cells = String::new();
    for t in 0..time_frames {
        for f in 0..freq_bins {
            let db = spectrogram.get(f, t);
            if db <= 0.0 {
                continue;
            }
            let normalized = (db / max_db).clamp(0.0, 1.0);
            let x = padding_left + t as f32 * cell_w;
            let y = padding_top + (freq_bins - 1 - f) as f32 * cell_h;
            cells.push_str(&format!(
                "<rect x='{x:.2}' y='{y:.2}' width='{w:.2}' height='{h:.2}' fill='{color}'/>\n",
                w = cell_w,
                h = cell_h,
                color = magnitude_to_color(normalized),
            ));
        }
    }

    let mut markers = String::new();
    for peak in peaks {
        let x = padding_left + peak.time_frame as f32 * cell_w + cell_w / 2.0;
        let y = padding_top + (freq_bins - 1 - peak.freq_bin) as f32 * cell_h + cell_h / 2.0;
        markers.push_str(&format!(
            "<circle cx='{x:.2}' cy='{y:.2}' r='2' fill='none' stroke='white' stroke-width='0.75'/>\n"
        ));
    }

    let title = format!(
        "<text x='{x}' y='{y}' fill='white' font-family='monospace' font-size='16' text-anchor='start'>{name}</text>",
        x = padding_left,
        y = padding_top - 20.0,
        name = svg_escape(record_name),
    );

    let svg = format!(
        "<svg xmlns='http://www.w3.org/2000/svg' width='{w}' height='{h}' viewBox='0 0 {w} {h}'>\n\
         <rect width='100%' height='100%' fill='black'/>\n{title}\n<g>\n{cells}</g>\n<g>\n{markers}</g>\n</svg>",
        w = WIDTH,
        h = HEIGHT,
    );

    let mut file = File::create(output_path)?;
    file.write_all(svg.as_bytes())
}

fn write_placeholder_svg<P: AsRef<Path>>(output_path: P, message: &str) -> std::io::Result<()> {
    let svg = format!(
        "<svg xmlns='http://www.w3.org/2000/svg' width='{w}' height='{h}' viewBox='0 0 {w} {h}'>\n  <rect width='100%' height='100%' fill='black'/>\n  <text x='{cx}' y='{cy}' fill='white' font-family='monospace' font-size='20' text-anchor='middle'>{msg}</text>\n</svg>",
        w = WIDTH,
        h = HEIGHT,
        cx = WIDTH / 2.0,
        cy = HEIGHT / 2.0,
        msg = svg_escape(message),
    );
    let mut f = File::create(output_path)?;
    f.write_all(svg.as_bytes())
}

fn magnitude_to_color(normalized_mag: f32) -> String {
    if normalized_mag <= 0.0 {
        return "#000000".to_string();
    }

    let clamped = normalized_mag.clamp(0.0, 1.0);

    if clamped < 0.2 {
        let intensity = (clamped / 0.2) * 0.3;
        format!("#{:02x}{:02x}{:02x}", 0, 0, (intensity * 255.0) as u8)
    } else if clamped < 0.4 {
        let intensity = ((clamped - 0.2) / 0.2) * 0.5 + 0.3;
        format!("#{:02x}{:02x}{:02x}", 0, 0, (intensity * 255.0) as u8)
    } else if clamped < 0.6 {
        let intensity = ((clamped - 0.4) / 0.2) * 0.5 + 0.5;
        let green = (intensity * 255.0) as u8;
        format!("#{:02x}{:02x}{:02x}", 0, green, 255)
    } else if clamped < 0.8 {
        let intensity = ((clamped - 0.6) / 0.2) * 0.5 + 0.5;
        let red = (intensity * 255.0) as u8;
        let blue = ((1.0 - intensity) * 255.0) as u8;
        format!("#{:02x}{:02x}{:02x}", red, 255, blue)
    } else {
        let intensity = ((clamped - 0.8) / 0.2) * 0.5 + 0.5;
        let green = ((1.0 - intensity) * 255.0) as u8;
        format!("#{:02x}{:02x}{:02x}", 255, green, 0)
    }
}

fn svg_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '&' => out.push_str("&amp;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn empty_spectrogram_writes_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.svg");
        let spec = spectrogram::compute(&[], 44100, &Config::default());
        write_heatmap_svg(&spec, &[], &path, "silence").unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("No spectrogram data") || contents.contains("No energy"));
    }

    use crate::spectrogram;

    #[test]
    fn tone_with_peaks_renders_markers() {
        let cfg = Config::default();
        let sample_rate = 11025;
        let n = sample_rate as usize * 2;
        let samples: Vec<i16> = (0..n)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                ((t * 1000.0 * std::f32::consts::TAU).sin() * i16::MAX as f32 * 0.8) as i16
            })
            .collect();
        let spec = spectrogram::compute(&samples, sample_rate, &cfg);
        let peaks = crate::peaks::find_peaks(&spec, &cfg);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.svg");
        write_heatmap_svg(&spec, &peaks, &path, "tone").unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("<svg"));
    }
}
