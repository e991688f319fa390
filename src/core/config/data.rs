use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::feedback::ExchangeSettings;

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Feedback endpoint used instead of the form's own action
    pub endpoint: Option<String>,
    /// Path fragment appended to the endpoint (e.g. a section name)
    pub path_info: Option<String>,
    /// "Working" label used when the page supplies none
    pub working_label: Option<String>,
    /// Transcript file that records every exchange
    pub transcript_log: Option<String>,
    /// User-Agent header sent with feedback requests
    pub user_agent: Option<String>,
}

impl Config {
    pub fn exchange_settings(&self) -> ExchangeSettings {
        ExchangeSettings {
            endpoint: self.endpoint.clone().filter(|value| !value.is_empty()),
            path_info: self.path_info.clone().filter(|value| !value.is_empty()),
        }
    }

    pub fn user_agent_or_default(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("configure-feedback/{}", env!("CARGO_PKG_VERSION")))
    }

    /// Sets a key from the command line. Returns false for unknown keys.
    pub fn set_value(&mut self, key: &str, value: Option<String>) -> bool {
        let slot = match key {
            "endpoint" => &mut self.endpoint,
            "path-info" => &mut self.path_info,
            "working-label" => &mut self.working_label,
            "transcript-log" => &mut self.transcript_log,
            "user-agent" => &mut self.user_agent,
            _ => return false,
        };
        *slot = value;
        true
    }
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
