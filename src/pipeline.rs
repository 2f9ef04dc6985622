use std::path::{Path, PathBuf};

use crate::analyzers::heuristic::HeuristicAnalyzer;
use crate::utils::diagnostics;
use crate::Mood;

#[cfg(feature = "tag-model")]
use crate::analyzers::tagger::{self, TagOutcome};

/// Availability of the optional tag-model stage, probed once at startup and
/// passed into the pipeline rather than re-checked per call.
pub struct TagModelCapability {
    model_path: Option<PathBuf>,
}

impl TagModelCapability {
    pub fn detect() -> Self {
        #[cfg(feature = "tag-model")]
        {
            Self {
                model_path: tagger::locate_model(),
            }
        }
        #[cfg(not(feature = "tag-model"))]
        {
            Self { model_path: None }
        }
    }

    pub fn disabled() -> Self {
        Self { model_path: None }
    }

    pub fn is_available(&self) -> bool {
        self.model_path.is_some()
    }

    pub fn model_path(&self) -> Option<&Path> {
        self.model_path.as_deref()
    }
}

/// Classify one audio file. The tag-model verdict wins when present; the
/// heuristic stage is unconditionally usable and decides otherwise.
pub fn classify(path: &Path, tag_model: &TagModelCapability) -> Mood {
    #[cfg(feature = "tag-model")]
    if let Some(model_path) = tag_model.model_path() {
        match tag_stage(path, model_path) {
            TagOutcome::Found(mood) => return mood,
            TagOutcome::Deferred => {
                log::debug!("tag model deferred, falling back to heuristics");
            }
        }
    }
    #[cfg(not(feature = "tag-model"))]
    let _ = tag_model;

    heuristic_stage(path)
}

/// Tag-model stage boundary: any error is reported as a diagnostic line and
/// collapses to a defer, never out of the stage.
#[cfg(feature = "tag-model")]
fn tag_stage(path: &Path, model_path: &Path) -> TagOutcome {
    use crate::analyzers::tagger::TagModelClassifier;

    let attempt =
        TagModelClassifier::load(model_path).and_then(|mut classifier| classifier.classify(path));

    match attempt {
        Ok(outcome) => outcome,
        Err(error) => {
            log::warn!("tag model stage failed: {}", error);
            diagnostics::emit_failure("tagger", &error);
            TagOutcome::Deferred
        }
    }
}

/// Heuristic stage boundary: errors degrade to `neutral` with a diagnostic
/// line; this stage never fails the process.
fn heuristic_stage(path: &Path) -> Mood {
    match HeuristicAnalyzer::new().analyze(path) {
        Ok(mood) => mood,
        Err(error) => {
            log::warn!("heuristic stage failed: {}", error);
            diagnostics::emit_failure("heuristic", &error);
            Mood::Neutral
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;
    use std::io::Write;

    fn write_sine_wav(path: &Path, sample_rate: u32, secs: f32, freq: f32) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        let total = (secs * sample_rate as f32) as usize;
        for i in 0..total {
            let t = i as f32 / sample_rate as f32;
            let sample = (0.5 * (2.0 * PI * freq * t).sin() * i16::MAX as f32) as i16;
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn unreadable_input_degrades_to_neutral() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.flac");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"this is not audio").unwrap();

        assert_eq!(heuristic_stage(&path), Mood::Neutral);
    }

    #[test]
    fn classify_without_tag_model_uses_heuristics() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_sine_wav(&path, 22_050, 2.0, 440.0);

        let mood = classify(&path, &TagModelCapability::disabled());
        assert!(Mood::all().contains(&mood));
    }

    #[test]
    fn classify_of_undecodable_input_is_neutral() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.mp3");
        std::fs::write(&path, b"junk").unwrap();

        let mood = classify(&path, &TagModelCapability::disabled());
        assert_eq!(mood, Mood::Neutral);
    }

    #[test]
    fn disabled_capability_reports_unavailable() {
        let capability = TagModelCapability::disabled();
        assert!(!capability.is_available());
        assert!(capability.model_path().is_none());
    }
}
