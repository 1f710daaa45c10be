//! Reads text aloud by shelling out to the system speech synthesizer.
//! Failures are ignored; speech is a convenience, not a feature the UI
//! depends on.

use std::process::{Command, Stdio};

#[cfg(target_os = "macos")]
const DEFAULT_COMMAND: &str = "say";
#[cfg(not(target_os = "macos"))]
const DEFAULT_COMMAND: &str = "espeak";

pub fn speak(text: &str, command_override: Option<&str>) {
    let command = command_override.unwrap_or(DEFAULT_COMMAND);
    let _ = Command::new(command)
        .arg(text)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
}
