use crate::api::Field;
use crate::core::feedback::ExchangeOutcome;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Installs the stderr `tracing` subscriber. `RUST_LOG` picks the level and
/// defaults to `warn`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Plain-text transcript of feedback exchanges, appended to a file the user
/// chose.
pub struct TranscriptLog {
    file_path: Option<String>,
}

impl TranscriptLog {
    /// A transcript pointed at `log_file`, active immediately when a file is
    /// given.
    pub fn new(log_file: Option<String>) -> Result<Self, Box<dyn std::error::Error>> {
        let mut log = TranscriptLog { file_path: None };
        if let Some(path) = log_file {
            log.set_log_file(path)?;
        }
        Ok(log)
    }

    pub fn set_log_file(&mut self, path: String) -> Result<String, Box<dyn std::error::Error>> {
        self.test_file_access(&path)?;

        self.file_path = Some(path.clone());

        Ok(format!("Transcript enabled to: {path}"))
    }

    pub fn log_message(&self, content: &str) -> Result<(), Box<dyn std::error::Error>> {
        match &self.file_path {
            Some(path) => Self::write_to_log(path, content),
            None => Ok(()),
        }
    }

    /// Records the fields sent for exchange `exchange_id`.
    pub fn log_request(
        &self,
        exchange_id: u64,
        url: &str,
        fields: &[Field],
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut block = format!("> #{exchange_id} POST {url}");
        for field in fields {
            block.push_str(&format!("\n>   {} = {}", field.name, field.value));
        }
        self.log_message(&block)
    }

    /// Records how exchange `exchange_id` ended and what it surfaced.
    pub fn log_outcome(
        &self,
        exchange_id: u64,
        outcome: &ExchangeOutcome,
        errors: &[String],
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut block = format!("< #{exchange_id} {}", outcome.describe());
        for error in errors {
            block.push_str(&format!("\n<   error: {error}"));
        }
        self.log_message(&block)
    }

    fn write_to_log(file_path: &str, content: &str) -> Result<(), Box<dyn std::error::Error>> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;
        let mut writer = BufWriter::new(file);

        for line in content.lines() {
            writeln!(writer, "{line}")?;
        }
        // Blank line between blocks
        writeln!(writer)?;

        writer.flush()?;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.file_path.is_some()
    }

    pub fn get_status_string(&self) -> String {
        match &self.file_path {
            None => "disabled".to_string(),
            Some(path) => {
                let file_name = Path::new(path).file_name().unwrap_or_default().to_string_lossy();
                format!("active ({file_name})")
            }
        }
    }

    fn test_file_access(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn transcript_in(dir: &TempDir) -> (TranscriptLog, String) {
        let path = dir.path().join("exchanges.log").to_string_lossy().into_owned();
        let log = TranscriptLog::new(Some(path.clone())).expect("transcript opens");
        (log, path)
    }

    #[test]
    fn disabled_transcript_writes_nothing() {
        let log = TranscriptLog::new(None).expect("no file needed");
        assert!(!log.is_active());
        assert_eq!(log.get_status_string(), "disabled");
        log.log_message("ignored").expect("no-op");
    }

    #[test]
    fn exchange_blocks_are_appended() {
        let dir = TempDir::new().expect("temp dir");
        let (log, path) = transcript_in(&dir);
        assert!(log.is_active());
        assert_eq!(log.get_status_string(), "active (exchanges.log)");

        log.log_request(
            1,
            "http://wiki/bin/configure",
            &[Field::new("{Site}{Name}", "Wiki"), Field::new("action", "feedbackUI")],
        )
        .expect("log request");
        log.log_outcome(
            1,
            &ExchangeOutcome::HttpError {
                status_line: "500 Internal Server Error".to_string(),
                body: String::new(),
            },
            &["Feedback request failed".to_string()],
        )
        .expect("log outcome");

        let contents = std::fs::read_to_string(path).expect("read transcript");
        assert_eq!(
            contents,
            "> #1 POST http://wiki/bin/configure\n\
             >   {Site}{Name} = Wiki\n\
             >   action = feedbackUI\n\
             \n\
             < #1 http error 500 Internal Server Error\n\
             <   error: Feedback request failed\n\
             \n"
        );
    }
}
