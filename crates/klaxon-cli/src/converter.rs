use std::io::{self, Read};
use std::path::Path;

use klaxon_core::action::{ActionLog, ActionType};
use klaxon_core::element::Locator;

/// Convert JSONL action logs to shell scripts that call `klaxon` CLI commands.
pub struct LogConverter;

impl LogConverter {
    pub fn convert_file(path: &Path) -> Result<String, io::Error> {
        let content = std::fs::read_to_string(path)?;
        Self::convert_str(&content)
    }

    pub fn convert_stdin() -> Result<String, io::Error> {
        let mut content = String::new();
        io::stdin().read_to_string(&mut content)?;
        Self::convert_str(&content)
    }

    fn convert_str(content: &str) -> Result<String, io::Error> {
        let mut lines = vec![
            "#!/usr/bin/env bash".to_string(),
            "set -euo pipefail".to_string(),
            String::new(),
        ];

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let log: ActionLog = serde_json::from_str(line).map_err(|e| {
                io::Error::new(io::ErrorKind::InvalidData, format!("Invalid JSONL: {}", e))
            })?;

            if let Some(cmd) = Self::action_to_command(&log.action, log.tag.as_deref()) {
                lines.push(cmd);
            }
        }

        Ok(lines.join("\n") + "\n")
    }

    fn action_to_command(action: &ActionType, tag: Option<&str>) -> Option<String> {
        let base = match action {
            ActionType::Navigate { url } => Some(format!("klaxon navigate {}", shell_escape(url))),
            ActionType::Click { locator } => {
                Some(format!("klaxon click {}", locator_args(locator, "id")))
            }
            ActionType::GetText { locator } => {
                Some(format!("klaxon text {}", locator_args(locator, "id")))
            }
            ActionType::SwitchFrame { locator } => {
                Some(format!("klaxon frame {}", locator_args(locator, "name")))
            }
            ActionType::SwitchDefault => Some("klaxon frame-default".to_string()),
            ActionType::DialogText => Some("klaxon dialog-text".to_string()),
            ActionType::AcceptDialog => Some("klaxon accept".to_string()),
            ActionType::DismissDialog => Some("klaxon dismiss".to_string()),
            ActionType::DialogKeys { text } => {
                Some(format!("klaxon dialog-keys {}", shell_escape(text)))
            }
            ActionType::WaitDialog { timeout_ms } => {
                Some(format!("klaxon wait-dialog -t {}", timeout_ms))
            }
            ActionType::WaitTitle { title, timeout_ms } => Some(format!(
                "klaxon wait-title {} -t {}",
                shell_escape(title),
                timeout_ms
            )),
            ActionType::GetTitle => Some("klaxon title".to_string()),
            ActionType::GetUrl => Some("klaxon url".to_string()),
            ActionType::ExecScript { script } => {
                Some(format!("klaxon exec {}", shell_escape(script)))
            }
            ActionType::BrowserInfo => Some("klaxon info".to_string()),
            ActionType::LogComment { message } => Some(format!("# {}", message)),
        };

        match (base, tag) {
            (Some(cmd), Some(tag)) if !cmd.starts_with('#') => Some(format!("{cmd}  # {tag}")),
            (base, _) => base,
        }
    }
}

/// Render a locator as CLI arguments, omitting `--by` when it matches the
/// subcommand's default strategy.
fn locator_args(locator: &Locator, default_strategy: &str) -> String {
    let value = shell_escape(locator.value());
    if locator.strategy() == default_strategy {
        value
    } else {
        format!("{} --by {}", value, locator.strategy())
    }
}

/// Quote a string for bash when it contains anything beyond plain
/// identifier-ish characters.
fn shell_escape(s: &str) -> String {
    let plain = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | ':'));
    if plain {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}
