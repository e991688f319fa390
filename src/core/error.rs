//! Errors that end up on the page's error surface.
//!
//! None of these are returned to the caller of an exchange: each is rendered
//! with [`fmt::Display`] and handed to [`crate::page::Page::show_error`].

use std::fmt;

use crate::api::records::RecordError;
use crate::utils::html::error_page_for_display;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackError {
    /// The server answered with a failure status.
    Http { status_line: String, body: String },
    /// The reply was a page rather than a record stream.
    ErrorPage(String),
    /// A record could not be decoded; later records were dropped.
    Record(RecordError),
    /// A select control has no option for a value the server sent.
    NoMatchingOption { field: String, value: String },
}

impl fmt::Display for FeedbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedbackError::Http { status_line, body } => {
                write!(f, "Feedback request failed: {status_line}<br />{body}")
            }
            FeedbackError::ErrorPage(body) => f.write_str(&error_page_for_display(body)),
            FeedbackError::Record(err) => write!(f, "Invalid feedback response: {err}"),
            FeedbackError::NoMatchingOption { field, value } => write!(
                f,
                "Invalid value \"{value}\" for {field}: no matching option"
            ),
        }
    }
}

impl std::error::Error for FeedbackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FeedbackError::Record(err) => Some(err),
            _ => None,
        }
    }
}
