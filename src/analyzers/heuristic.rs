use std::path::Path;

use crate::audio::decode::{decode_excerpt, DecodedAudio, ANALYSIS_SAMPLE_RATE, ANALYSIS_WINDOW_SECS};
use crate::audio::features::{estimate_tempo, frame_rate, mean_rms, SpectralAnalyzer};
use crate::{Mood, Result};

/// Scalar features the threshold rules operate on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioFeatures {
    pub tempo_bpm: f32,
    pub rms: f32,
    pub spectral_centroid_hz: f32,
}

/// Fallback mood classifier. Always produces a label for decodable input;
/// decode failures are surfaced as errors for the pipeline to degrade.
pub struct HeuristicAnalyzer {
    spectral: SpectralAnalyzer,
}

impl HeuristicAnalyzer {
    pub fn new() -> Self {
        Self {
            spectral: SpectralAnalyzer::new(),
        }
    }

    pub fn analyze(&self, path: impl AsRef<Path>) -> Result<Mood> {
        let path = path.as_ref();
        let audio = decode_excerpt(path, ANALYSIS_WINDOW_SECS, ANALYSIS_SAMPLE_RATE)?;
        log::debug!(
            "decoded {:.1}s of audio from {}",
            audio.duration_secs(),
            path.display()
        );

        let features = self.extract_features(&audio);
        log::debug!(
            "features: tempo={:.1}bpm rms={:.4} centroid={:.0}Hz",
            features.tempo_bpm,
            features.rms,
            features.spectral_centroid_hz
        );

        Ok(Self::classify_features(&features))
    }

    pub fn extract_features(&self, audio: &DecodedAudio) -> AudioFeatures {
        let onset_env = self.spectral.onset_envelope(&audio.samples);
        AudioFeatures {
            tempo_bpm: estimate_tempo(&onset_env, frame_rate(audio.sample_rate)),
            rms: mean_rms(&audio.samples),
            spectral_centroid_hz: self
                .spectral
                .mean_spectral_centroid(&audio.samples, audio.sample_rate),
        }
    }

    /// Fixed threshold rules, first match wins.
    pub fn classify_features(features: &AudioFeatures) -> Mood {
        if features.tempo_bpm >= 120.0 && features.rms > 0.02 {
            return Mood::Happy;
        }
        if features.tempo_bpm >= 110.0 && features.rms > 0.015 {
            return Mood::Energetic;
        }
        if features.tempo_bpm <= 75.0 && features.rms < 0.01 {
            return Mood::Sad;
        }
        if features.rms > 0.04 {
            return Mood::Angry;
        }
        if features.spectral_centroid_hz > 3500.0 {
            return Mood::Surprised;
        }
        if features.tempo_bpm < 90.0 && features.rms < 0.02 {
            return Mood::Calm;
        }
        Mood::Neutral
    }
}

impl Default for HeuristicAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
