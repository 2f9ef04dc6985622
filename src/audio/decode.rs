use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::{MoodError, Result};

/// Sample rate the heuristic stage analyzes at.
pub const ANALYSIS_SAMPLE_RATE: u32 = 22_050;
/// At most this much audio is decoded per invocation.
pub const ANALYSIS_WINDOW_SECS: f64 = 60.0;

#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode up to `max_secs` of an audio file, downmixed to mono and resampled
/// to `target_rate`.
pub fn decode_excerpt(path: impl AsRef<Path>, max_secs: f64, target_rate: u32) -> Result<DecodedAudio> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;

    // Create media source stream
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // Create hint to help with format detection
    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    // Probe the media source
    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| MoodError::UnsupportedFormat(e.to_string()))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| MoodError::UnsupportedFormat("no audio track found".into()))?;

    let track_id = track.id;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| MoodError::Decode("unknown sample rate".into()))?;

    let channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(2);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| MoodError::Decode(e.to_string()))?;

    // Interleaved samples; decoding stops once the cap is reached
    let interleaved_cap = (max_secs * sample_rate as f64) as usize * channels;
    let mut interleaved: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    while interleaved.len() < interleaved_cap {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => {
                log::warn!("error reading packet: {}", e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(e) => {
                // Skip corrupted packets
                log::warn!("error decoding packet: {}", e);
                continue;
            }
        };

        if sample_buf.is_none() {
            let spec = *decoded.spec();
            let duration = decoded.capacity() as u64;
            sample_buf = Some(SampleBuffer::new(duration, spec));
        }

        if let Some(buf) = sample_buf.as_mut() {
            buf.copy_interleaved_ref(decoded);
            interleaved.extend_from_slice(buf.samples());
        }
    }

    if interleaved.is_empty() {
        return Err(MoodError::Decode("no audio samples decoded".into()));
    }

    // The last packet can overshoot the cap
    interleaved.truncate(interleaved_cap);

    let mono = downmix_mono(&interleaved, channels);
    let samples = if sample_rate != target_rate {
        resample_linear(&mono, sample_rate, target_rate)
    } else {
        mono
    };

    Ok(DecodedAudio {
        samples,
        sample_rate: target_rate,
    })
}

fn downmix_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    let ratio = to_rate as f64 / from_rate as f64;
    let out_len = (samples.len() as f64 * ratio) as usize;

    (0..out_len)
        .map(|i| {
            let pos = i as f64 / ratio;
            let idx = pos.floor() as usize;
            let frac = pos - idx as f64;

            let s0 = samples.get(idx).copied().unwrap_or(0.0);
            let s1 = samples.get(idx + 1).copied().unwrap_or(s0);

            (s0 as f64 * (1.0 - frac) + s1 as f64 * frac) as f32
        })
        .collect()
}
