use std::env;
use std::path::{Path, PathBuf};

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;

use crate::analyzers::tag_map;
use crate::audio::decode::{decode_excerpt, ANALYSIS_WINDOW_SECS};
use crate::{Mood, MoodError, Result};

/// Fixed model identifier looked up under `models/`.
pub const MODEL_FILE: &str = "mtt_musicnn.onnx";
/// Environment override for the model location.
pub const MODEL_PATH_ENV: &str = "MOOD_ANALYZER_MODEL";

const MODEL_SAMPLE_RATE: u32 = 16_000;
const MODEL_INPUT_SECS: f64 = 3.0;
const BATCH_SIZE: usize = 1;

/// Tag vocabulary of the MagnaTagATune tagging model, in model output order.
pub const MODEL_TAGS: [&str; 50] = [
    "guitar",
    "classical",
    "slow",
    "techno",
    "strings",
    "drums",
    "electronic",
    "rock",
    "fast",
    "piano",
    "ambient",
    "beat",
    "violin",
    "vocal",
    "synth",
    "female",
    "indian",
    "opera",
    "male",
    "singing",
    "vocals",
    "no vocals",
    "harpsichord",
    "loud",
    "quiet",
    "flute",
    "woman",
    "male vocal",
    "no vocal",
    "pop",
    "soft",
    "sitar",
    "solo",
    "man",
    "classic",
    "choir",
    "voice",
    "new age",
    "dance",
    "male voice",
    "female vocal",
    "beats",
    "harp",
    "cello",
    "no voice",
    "weird",
    "country",
    "metal",
    "female voice",
    "choral",
];

/// Outcome of the tag-model stage: a confident mood, or an explicit defer to
/// the heuristic stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TagOutcome {
    Found(Mood),
    Deferred,
}

/// Locate the model file once at startup. `None` disables the stage for the
/// whole run.
pub fn locate_model() -> Option<PathBuf> {
    if let Ok(path) = env::var(MODEL_PATH_ENV) {
        let path = PathBuf::from(path);
        return path.is_file().then_some(path);
    }
    let fallback = PathBuf::from("models").join(MODEL_FILE);
    fallback.is_file().then_some(fallback)
}

pub struct TagModelClassifier {
    session: Session,
}

impl TagModelClassifier {
    pub fn load(model_path: &Path) -> Result<Self> {
        log::debug!("loading tag model from {}", model_path.display());
        let session = Session::builder()
            .map_err(|e| MoodError::Inference(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| MoodError::Inference(e.to_string()))?
            .commit_from_file(model_path)
            .map_err(|e| MoodError::Inference(format!("failed to load model: {}", e)))?;

        Ok(Self { session })
    }

    /// Run windowed inference over the file and map the strongest tag to a
    /// mood. Tags outside the keyword groups defer to the heuristic stage.
    pub fn classify(&mut self, path: impl AsRef<Path>) -> Result<TagOutcome> {
        let audio = decode_excerpt(path, ANALYSIS_WINDOW_SECS, MODEL_SAMPLE_RATE)?;

        let window_len = (MODEL_INPUT_SECS * MODEL_SAMPLE_RATE as f64) as usize;
        let mut summed = vec![0.0f32; MODEL_TAGS.len()];
        let mut windows = 0usize;

        for window in audio.samples.chunks_exact(window_len) {
            let probabilities = self.run_window(window)?;
            for (acc, p) in summed.iter_mut().zip(&probabilities) {
                *acc += p;
            }
            windows += 1;
        }

        if windows == 0 {
            log::debug!("audio shorter than the model input window, deferring");
            return Ok(TagOutcome::Deferred);
        }

        // Average across windows, then take the single strongest tag
        let mut best_idx = 0;
        let mut best_prob = f32::MIN;
        for (idx, total) in summed.iter().enumerate() {
            let avg = total / windows as f32;
            if avg > best_prob {
                best_prob = avg;
                best_idx = idx;
            }
        }

        let top_tag = MODEL_TAGS[best_idx];
        log::debug!("top tag over {} windows: {} (p={:.3})", windows, top_tag, best_prob);

        Ok(match tag_map::mood_for_tag(top_tag) {
            Some(mood) => TagOutcome::Found(mood),
            None => TagOutcome::Deferred,
        })
    }

    fn run_window(&mut self, window: &[f32]) -> Result<Vec<f32>> {
        let input = Array2::from_shape_vec((BATCH_SIZE, window.len()), window.to_vec())
            .map_err(|e| MoodError::Inference(e.to_string()))?;
        let tensor =
            Tensor::from_array(input).map_err(|e| MoodError::Inference(e.to_string()))?;

        let outputs = self
            .session
            .run(ort::inputs!["input" => tensor])
            .map_err(|e| MoodError::Inference(format!("inference failed: {}", e)))?;

        let output = outputs
            .iter()
            .next()
            .ok_or_else(|| MoodError::Inference("no output tensor".into()))?
            .1;

        let (_, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| MoodError::Inference(e.to_string()))?;

        if data.len() != MODEL_TAGS.len() {
            return Err(MoodError::Inference(format!(
                "unexpected output length {}, expected {}",
                data.len(),
                MODEL_TAGS.len()
            )));
        }

        Ok(data.to_vec())
    }
}
