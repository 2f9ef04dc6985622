use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// STFT frame length in samples.
pub const FRAME_SIZE: usize = 2048;
/// Hop between successive frames.
pub const HOP_SIZE: usize = 512;

const MIN_TEMPO_BPM: f32 = 30.0;
const MAX_TEMPO_BPM: f32 = 300.0;
/// Center of the log-Gaussian tempo prior.
const TEMPO_PRIOR_BPM: f32 = 120.0;

/// Frames per second of the onset envelope at the given sample rate.
pub fn frame_rate(sample_rate: u32) -> f32 {
    sample_rate as f32 / HOP_SIZE as f32
}

/// Short-time spectrum analysis with a cached FFT plan and Hann window.
pub struct SpectralAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
}

impl SpectralAnalyzer {
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FRAME_SIZE);

        let window = (0..FRAME_SIZE)
            .map(|i| {
                let x = i as f32 / FRAME_SIZE as f32;
                0.5 - 0.5 * (2.0 * PI * x).cos()
            })
            .collect();

        Self { fft, window }
    }

    /// Mean spectral centroid in Hz across all frames. Silent frames are
    /// skipped; a fully silent signal yields 0.
    pub fn mean_spectral_centroid(&self, samples: &[f32], sample_rate: u32) -> f32 {
        let bin_hz = sample_rate as f32 / FRAME_SIZE as f32;
        let mut acc = 0.0f32;
        let mut frames = 0usize;

        for magnitudes in self.spectra(samples) {
            let total: f32 = magnitudes.iter().sum();
            if total <= f32::EPSILON {
                continue;
            }
            let weighted: f32 = magnitudes
                .iter()
                .enumerate()
                .map(|(bin, m)| bin as f32 * bin_hz * m)
                .sum();
            acc += weighted / total;
            frames += 1;
        }

        if frames == 0 {
            0.0
        } else {
            acc / frames as f32
        }
    }

    /// Onset strength envelope: half-wave rectified spectral flux between
    /// successive frames.
    pub fn onset_envelope(&self, samples: &[f32]) -> Vec<f32> {
        let spectra = self.spectra(samples);
        spectra
            .windows(2)
            .map(|pair| {
                pair[0]
                    .iter()
                    .zip(&pair[1])
                    .map(|(prev, cur)| (cur - prev).max(0.0))
                    .sum()
            })
            .collect()
    }

    fn spectra(&self, samples: &[f32]) -> Vec<Vec<f32>> {
        if samples.is_empty() {
            return Vec::new();
        }
        if samples.len() < FRAME_SIZE {
            return vec![self.frame_magnitudes(samples)];
        }

        let mut frames = Vec::new();
        let mut start = 0;
        while start + FRAME_SIZE <= samples.len() {
            frames.push(self.frame_magnitudes(&samples[start..start + FRAME_SIZE]));
            start += HOP_SIZE;
        }
        frames
    }

    fn frame_magnitudes(&self, frame: &[f32]) -> Vec<f32> {
        let mut buffer: Vec<Complex<f32>> = frame
            .iter()
            .zip(&self.window)
            .map(|(s, w)| Complex::new(s * w, 0.0))
            .collect();
        // Short frames are zero-padded to the FFT length
        buffer.resize(FRAME_SIZE, Complex::new(0.0, 0.0));

        self.fft.process(&mut buffer);

        buffer[..FRAME_SIZE / 2 + 1].iter().map(|c| c.norm()).collect()
    }
}

impl Default for SpectralAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Mean of per-frame RMS values over the whole signal.
pub fn mean_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let mut acc = 0.0f32;
    let mut frames = 0usize;
    let mut start = 0;
    while start < samples.len() {
        let end = (start + FRAME_SIZE).min(samples.len());
        let frame = &samples[start..end];
        let energy: f32 = frame.iter().map(|s| s * s).sum();
        acc += (energy / frame.len() as f32).sqrt();
        frames += 1;
        start += HOP_SIZE;
    }

    acc / frames as f32
}

/// Estimate tempo in BPM from an onset envelope via autocorrelation over the
/// 30-300 BPM lag range, weighted by a log-Gaussian prior centered at 120.
/// Returns 0.0 when no positively correlated lag exists.
pub fn estimate_tempo(onset_env: &[f32], frame_rate: f32) -> f32 {
    let min_lag = ((60.0 * frame_rate / MAX_TEMPO_BPM).ceil() as usize).max(1);
    let max_lag = (60.0 * frame_rate / MIN_TEMPO_BPM).floor() as usize;

    if onset_env.len() <= min_lag + 1 {
        return 0.0;
    }
    let max_lag = max_lag.min(onset_env.len() - 1);

    let mean = onset_env.iter().sum::<f32>() / onset_env.len() as f32;
    let centered: Vec<f32> = onset_env.iter().map(|v| v - mean).collect();

    let mut best_bpm = 0.0f32;
    let mut best_score = 0.0f32;
    for lag in min_lag..=max_lag {
        let pairs = centered.len() - lag;
        let correlation: f32 = (0..pairs)
            .map(|i| centered[i] * centered[i + lag])
            .sum::<f32>()
            / pairs as f32;
        if correlation <= 0.0 {
            continue;
        }

        let bpm = 60.0 * frame_rate / lag as f32;
        let octaves = (bpm / TEMPO_PRIOR_BPM).log2();
        let score = correlation * (-0.5 * octaves * octaves).exp();
        if score > best_score {
            best_score = score;
            best_bpm = bpm;
        }
    }

    best_bpm
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(sample_rate: u32, secs: f32, freq: f32, amplitude: f32) -> Vec<f32> {
        let total = (secs * sample_rate as f32) as usize;
        (0..total)
            .map(|i| amplitude * (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    /// Impulse train at the given BPM, clicks widened to a few samples so
    /// each one registers as a spectral flux spike.
    fn click_track(sample_rate: u32, secs: f32, bpm: f32) -> Vec<f32> {
        let total = (secs * sample_rate as f32) as usize;
        let period = (60.0 * sample_rate as f32 / bpm) as usize;
        let mut samples = vec![0.0f32; total];
        let mut pos = 0;
        while pos < total {
            for offset in 0..32.min(total - pos) {
                samples[pos + offset] = 1.0;
            }
            pos += period;
        }
        samples
    }

    #[test]
    fn rms_of_silence_is_zero() {
        assert_eq!(mean_rms(&vec![0.0; 8192]), 0.0);
    }

    #[test]
    fn rms_of_full_scale_is_one() {
        let rms = mean_rms(&vec![1.0; 8192]);
        assert!((rms - 1.0).abs() < 1e-6);
    }

    #[test]
    fn rms_of_unit_sine_is_inverse_sqrt_two() {
        let samples = sine(22_050, 1.0, 1000.0, 1.0);
        let rms = mean_rms(&samples);
        assert!((rms - 0.7071).abs() < 0.02, "rms was {}", rms);
    }

    #[test]
    fn centroid_of_silence_is_zero() {
        let analyzer = SpectralAnalyzer::new();
        assert_eq!(analyzer.mean_spectral_centroid(&vec![0.0; 8192], 22_050), 0.0);
    }

    #[test]
    fn centroid_tracks_sine_frequency() {
        let analyzer = SpectralAnalyzer::new();
        let samples = sine(22_050, 1.0, 1000.0, 0.5);
        let centroid = analyzer.mean_spectral_centroid(&samples, 22_050);
        assert!(
            (centroid - 1000.0).abs() < 75.0,
            "centroid was {} Hz",
            centroid
        );
    }

    #[test]
    fn onset_envelope_peaks_at_the_attack() {
        let analyzer = SpectralAnalyzer::new();
        let mut samples = vec![0.0f32; 11_025];
        samples.extend(sine(22_050, 1.5, 440.0, 0.5));
        let envelope = analyzer.onset_envelope(&samples);

        let (peak_idx, peak) = envelope
            .iter()
            .cloned()
            .enumerate()
            .fold((0, 0.0f32), |best, (i, v)| if v > best.1 { (i, v) } else { best });
        assert!(peak > 0.0);
        // The tone starts half a second in, around frame 18 of the envelope
        assert!((10..=30).contains(&peak_idx), "peak at frame {}", peak_idx);

        // Once the tone is steady the flux falls well below the attack
        let tail_max = envelope[40..].iter().cloned().fold(0.0f32, f32::max);
        assert!(tail_max < peak * 0.25);
    }

    #[test]
    fn tempo_of_click_track_is_recovered() {
        let analyzer = SpectralAnalyzer::new();
        let samples = click_track(22_050, 30.0, 120.0);
        let envelope = analyzer.onset_envelope(&samples);
        let bpm = estimate_tempo(&envelope, frame_rate(22_050));
        assert!((bpm - 120.0).abs() < 10.0, "estimated {} bpm", bpm);
    }

    #[test]
    fn tempo_of_flat_envelope_is_zero() {
        assert_eq!(estimate_tempo(&vec![0.0; 500], frame_rate(22_050)), 0.0);
        assert_eq!(estimate_tempo(&vec![1.0; 500], frame_rate(22_050)), 0.0);
    }

    #[test]
    fn tempo_of_short_envelope_is_zero() {
        assert_eq!(estimate_tempo(&[1.0, 0.0, 1.0], frame_rate(22_050)), 0.0);
    }
}
