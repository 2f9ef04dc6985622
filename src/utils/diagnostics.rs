use std::fmt;

use serde_json::json;

/// Emit a stage-failure diagnostic as a JSON line on stdout. Diagnostics
/// precede the final verdict line and never replace it.
pub fn emit_failure(stage: &str, error: &dyn fmt::Display) {
    println!("{}", json!({ "error": format!("{} failed: {}", stage, error) }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_lines_are_well_formed_json() {
        // The helper prints; mirror its formatting here to pin the shape
        let line = json!({ "error": format!("{} failed: {}", "heuristic", "boom") }).to_string();
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["error"], "heuristic failed: boom");
        emit_failure("heuristic", &"boom");
    }
}
