//! The feedback exchange: snapshot a form, post it, and reconcile the page
//! with the reply.
//!
//! The page is owned by a single event loop. [`FeedbackClient::submit_feedback`]
//! marks the triggering control as working and spawns the network task; the
//! task reports exactly one [`ExchangeOutcome`] back over a channel, and the
//! loop hands it to [`FeedbackClient::handle_outcome`] on a later turn.

use std::collections::HashMap;

use reqwest::header::CONTENT_TYPE;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::multipart::{self, new_boundary};
use crate::api::records::{classify, parse_records, Payload};
use crate::api::{
    FeedbackRequest, Field, FEEDBACK_REQUEST_HEADER, FEEDBACK_RESPONSE_HEADER, PROTOCOL_VERSION,
};
use crate::core::error::FeedbackError;
use crate::core::ui_state::EventDisposition;
use crate::page::apply::{apply_records, status_id, ApplySummary};
use crate::page::snapshot;
use crate::page::{Page, PageError};
use crate::utils::url::resolve_action_url;

/// What the network task observed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExchangeOutcome {
    /// No response at all: the request was abandoned or never answered.
    Cancelled,
    /// A response with a failure status.
    HttpError { status_line: String, body: String },
    /// A successful response; `protocol` is the echoed protocol header.
    Completed {
        protocol: Option<String>,
        body: String,
    },
}

impl ExchangeOutcome {
    /// One-line description for logs and transcripts.
    pub fn describe(&self) -> String {
        match self {
            ExchangeOutcome::Cancelled => "cancelled".to_string(),
            ExchangeOutcome::HttpError { status_line, .. } => format!("http error {status_line}"),
            ExchangeOutcome::Completed { protocol, body } => format!(
                "completed (protocol {}, {} bytes)",
                protocol.as_deref().unwrap_or("none"),
                body.len()
            ),
        }
    }
}

/// Where requests go, beyond what the form itself says.
#[derive(Clone, Debug, Default)]
pub struct ExchangeSettings {
    /// Replaces the form's `action` when set.
    pub endpoint: Option<String>,
    /// Appended to the resolved action URL.
    pub path_info: Option<String>,
}

pub struct ExchangeParams {
    pub client: reqwest::Client,
    pub url: String,
    pub request: FeedbackRequest,
    pub cancel_token: CancellationToken,
    pub exchange_id: u64,
}

/// Book-keeping for a request that has not completed yet.
#[derive(Clone, Debug)]
struct PendingExchange {
    form_id: String,
    indicator_id: String,
}

/// Returned by [`FeedbackClient::submit_feedback`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submitted {
    pub exchange_id: u64,
    pub url: String,
    /// Fields as they go on the wire, identification fields last.
    pub fields: Vec<Field>,
}

impl Submitted {
    /// The click that triggered the exchange never submits the form.
    pub fn disposition(&self) -> EventDisposition {
        EventDisposition::PreventDefault
    }
}

pub type OutcomeReceiver = mpsc::UnboundedReceiver<(u64, ExchangeOutcome)>;

pub struct FeedbackClient {
    client: reqwest::Client,
    settings: ExchangeSettings,
    tx: mpsc::UnboundedSender<(u64, ExchangeOutcome)>,
    pending: HashMap<u64, PendingExchange>,
    next_id: u64,
}

impl FeedbackClient {
    pub fn new(client: reqwest::Client, settings: ExchangeSettings) -> (Self, OutcomeReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let service = Self {
            client,
            settings,
            tx,
            pending: HashMap::new(),
            next_id: 0,
        };
        (service, rx)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Starts an exchange for the control `control_id`. Must be called from
    /// within a tokio runtime.
    ///
    /// Overlapping calls are independent; each gets its own outcome.
    pub fn submit_feedback(
        &mut self,
        page: &mut Page,
        control_id: &str,
        control_value: &str,
        cancel_token: CancellationToken,
    ) -> Result<Submitted, PageError> {
        let form = page.form_of_control(control_id)?;
        let form_id = form.id.clone();
        let action = self.settings.endpoint.as_deref().unwrap_or(&form.action);
        let url = resolve_action_url(&page.base_url, action, self.settings.path_info.as_deref())
            .map_err(|err| PageError::InvalidAction {
                form: form_id.clone(),
                message: err.to_string(),
            })?;
        let request = FeedbackRequest::new(snapshot::collect(form), control_id, control_value);

        let indicator_id = status_id(control_id);
        let label = page.working_label().to_string();
        page.set_status(&indicator_id, label, true);

        self.next_id += 1;
        let exchange_id = self.next_id;
        self.pending.insert(
            exchange_id,
            PendingExchange {
                form_id,
                indicator_id,
            },
        );
        debug!(exchange_id, %url, fields = request.snapshot.len(), "starting feedback exchange");

        let fields = request.fields().collect();
        self.spawn_exchange(ExchangeParams {
            client: self.client.clone(),
            url: url.clone(),
            request,
            cancel_token,
            exchange_id,
        });
        Ok(Submitted {
            exchange_id,
            url,
            fields,
        })
    }

    pub fn spawn_exchange(&self, params: ExchangeParams) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let ExchangeParams {
                client,
                url,
                request,
                cancel_token,
                exchange_id,
            } = params;

            let outcome = tokio::select! {
                outcome = perform_exchange(&client, &url, &request) => outcome,
                _ = cancel_token.cancelled() => ExchangeOutcome::Cancelled,
            };
            let _ = tx.send((exchange_id, outcome));
        });
    }

    /// Reconciles the page with the outcome of exchange `exchange_id`.
    ///
    /// Returns what the reply changed, or `None` when nothing was applied.
    pub fn handle_outcome(
        &mut self,
        page: &mut Page,
        exchange_id: u64,
        outcome: ExchangeOutcome,
    ) -> Option<ApplySummary> {
        let Some(pending) = self.pending.remove(&exchange_id) else {
            debug!(exchange_id, "outcome for unknown exchange");
            return None;
        };

        if outcome == ExchangeOutcome::Cancelled {
            debug!(exchange_id, "feedback exchange cancelled");
            return None;
        }

        page.set_status(&pending.indicator_id, "", false);

        match outcome {
            ExchangeOutcome::Cancelled => None,
            ExchangeOutcome::HttpError { status_line, body } => {
                page.show_error(FeedbackError::Http { status_line, body }.to_string());
                None
            }
            ExchangeOutcome::Completed { protocol, body } => {
                if protocol.as_deref() != Some(PROTOCOL_VERSION) {
                    debug!(exchange_id, ?protocol, "ignoring reply without feedback protocol header");
                    return None;
                }
                match classify(&body) {
                    Payload::Empty | Payload::Sentinel => None,
                    Payload::ErrorPage(html) => {
                        page.show_error(FeedbackError::ErrorPage(html.to_string()).to_string());
                        None
                    }
                    Payload::Records(records) => {
                        match apply_records(page, &pending.form_id, parse_records(records)) {
                            Ok(summary) => Some(summary),
                            Err(err) => {
                                page.show_error(err.to_string());
                                None
                            }
                        }
                    }
                }
            }
        }
    }
}

async fn perform_exchange(
    client: &reqwest::Client,
    url: &str,
    request: &FeedbackRequest,
) -> ExchangeOutcome {
    let boundary = new_boundary();
    let body = multipart::encode(request, &boundary);

    let response = match client
        .post(url)
        .header(CONTENT_TYPE, multipart::content_type(&boundary))
        .header(FEEDBACK_REQUEST_HEADER, PROTOCOL_VERSION)
        .body(body)
        .send()
        .await
    {
        Ok(response) => response,
        Err(err) => {
            debug!(error = %err, "feedback request got no response");
            return ExchangeOutcome::Cancelled;
        }
    };

    let status = response.status();
    let status_line = match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    };
    let protocol = response
        .headers()
        .get(FEEDBACK_RESPONSE_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = match response.text().await {
        Ok(body) => body,
        Err(err) => {
            debug!(error = %err, "failed to read feedback reply body");
            return ExchangeOutcome::HttpError {
                status_line,
                body: err.to_string(),
            };
        }
    };

    if status.is_success() {
        ExchangeOutcome::Completed { protocol, body }
    } else {
        ExchangeOutcome::HttpError { status_line, body }
    }
}
