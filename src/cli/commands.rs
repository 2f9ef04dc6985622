use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mood-analyzer")]
#[command(version = "1.0")]
#[command(about = "Classify the mood of an audio file and print a JSON verdict", long_about = None)]
pub struct Cli {
    /// Path to the audio file to classify
    pub audio_file: Option<PathBuf>,
}
