use std::error::Error;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::cli::FeedbackArgs;
use crate::core::config::Config;
use crate::core::feedback::{ExchangeSettings, FeedbackClient};
use crate::page::apply::ApplySummary;
use crate::page::Page;
use crate::utils::logging::TranscriptLog;

/// What one exchange did to the page, as printed by `feedback --json`.
#[derive(Debug, Serialize)]
pub struct ExchangeReport {
    pub exchange_id: u64,
    pub url: String,
    pub outcome: String,
    pub summary: Option<ApplySummary>,
    pub errors: Vec<String>,
}

impl ExchangeReport {
    pub fn print(&self) {
        println!("Exchange #{} with {}: {}", self.exchange_id, self.url, self.outcome);
        if let Some(summary) = &self.summary {
            println!(
                "  {} status update(s), {} value update(s)",
                summary.status_updates, summary.value_updates
            );
        }
        for error in &self.errors {
            eprintln!("❌ {error}");
        }
    }
}

/// Flags win over configuration values.
pub fn exchange_settings(args: &FeedbackArgs, config: &Config) -> ExchangeSettings {
    let mut settings = config.exchange_settings();
    if let Some(endpoint) = args.endpoint.clone() {
        settings.endpoint = Some(endpoint);
    }
    if let Some(path_info) = args.path_info.clone() {
        settings.path_info = Some(path_info);
    }
    settings
}

/// The value the clicked control carries unless one is given explicitly.
fn control_value(page: &Page, args: &FeedbackArgs) -> String {
    if let Some(value) = &args.value {
        return value.clone();
    }
    page.forms
        .iter()
        .find_map(|form| form.control_by_id(&args.control))
        .map(|control| control.current_value())
        .unwrap_or_default()
}

/// Runs one exchange to completion. Ctrl+C cancels it silently.
///
/// Returns `false` when the exchange surfaced errors.
pub async fn run_feedback(
    args: FeedbackArgs,
    config: &Config,
    transcript: &TranscriptLog,
) -> Result<bool, Box<dyn Error>> {
    let mut page = Page::load_from_path(&args.page)?;
    if page.working_template.is_none() {
        page.working_template = config.working_label.clone();
    }

    let client = reqwest::Client::builder()
        .user_agent(config.user_agent_or_default())
        .build()?;
    let (mut feedback, mut rx) = FeedbackClient::new(client, exchange_settings(&args, config));

    let value = control_value(&page, &args);
    let cancel_token = CancellationToken::new();
    let submitted = feedback.submit_feedback(&mut page, &args.control, &value, cancel_token.clone())?;
    transcript.log_request(submitted.exchange_id, &submitted.url, &submitted.fields)?;

    let watcher = {
        let cancel_token = cancel_token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => cancel_token.cancel(),
                _ = cancel_token.cancelled() => {}
            }
        })
    };

    let mut reports = Vec::new();
    while feedback.pending_count() > 0 {
        let Some((exchange_id, outcome)) = rx.recv().await else {
            break;
        };
        let description = outcome.describe();
        let summary = feedback.handle_outcome(&mut page, exchange_id, outcome.clone());
        let errors = page.take_errors();
        transcript.log_outcome(exchange_id, &outcome, &errors)?;
        reports.push(ExchangeReport {
            exchange_id,
            url: submitted.url.clone(),
            outcome: description,
            summary,
            errors,
        });
    }
    // Stops the Ctrl+C watcher
    cancel_token.cancel();
    let _ = watcher.await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            report.print();
        }
        if transcript.is_active() {
            println!("Transcript: {}", transcript.get_status_string());
        }
    }

    if args.write {
        page.save_to_path(&args.page)?;
    }

    Ok(reports.iter().all(|report| report.errors.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{Control, ControlKind, Form};
    use std::path::PathBuf;

    fn args() -> FeedbackArgs {
        FeedbackArgs {
            page: PathBuf::from("page.toml"),
            control: "{Store}feedback".to_string(),
            value: None,
            endpoint: None,
            path_info: None,
            write: false,
            json: false,
        }
    }

    #[test]
    fn flags_override_config() {
        let config = Config {
            endpoint: Some("http://config/bin/configure".to_string()),
            path_info: Some("Store".to_string()),
            ..Default::default()
        };
        let mut args = args();
        args.path_info = Some("Mail".to_string());

        let settings = exchange_settings(&args, &config);
        assert_eq!(settings.endpoint.as_deref(), Some("http://config/bin/configure"));
        assert_eq!(settings.path_info.as_deref(), Some("Mail"));
    }

    #[test]
    fn control_value_defaults_to_the_control() {
        let page = Page {
            forms: vec![Form {
                id: "update".to_string(),
                action: String::new(),
                controls: vec![Control::new(ControlKind::Button, "{Store}feedback")
                    .with_id("{Store}feedback")
                    .with_value("Test connection")],
            }],
            ..Default::default()
        };
        let mut args = args();
        assert_eq!(control_value(&page, &args), "Test connection");

        args.value = Some("Explicit".to_string());
        assert_eq!(control_value(&page, &args), "Explicit");

        args.value = None;
        args.control = "missing".to_string();
        assert_eq!(control_value(&page, &args), "");
    }
}
