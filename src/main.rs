use clap::Parser;
use serde_json::json;

use mood_analyzer::cli::commands::Cli;
use mood_analyzer::pipeline::{self, TagModelCapability};

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    // Argument and path validation happen before either stage runs; both
    // failures are fatal and keep stdout to a single JSON object.
    let Some(path) = cli.audio_file else {
        println!("{}", json!({ "error": "No audio file path provided" }));
        std::process::exit(1);
    };

    if !path.exists() {
        println!("{}", json!({ "error": "File not found" }));
        std::process::exit(1);
    }

    let tag_model = TagModelCapability::detect();
    log::debug!(
        "tag model stage {} for this run",
        if tag_model.is_available() { "enabled" } else { "disabled" }
    );

    let mood = pipeline::classify(&path, &tag_model);

    println!("{}", json!({ "mood": mood }));
}
