//! `multipart/form-data` encoding for feedback requests.

use chrono::Utc;

use crate::api::{FeedbackRequest, Field};

const CRLF: &str = "\r\n";
const BOUNDARY_PREFIX: &str = "-----------------------------";

/// Builds a boundary token unique to one request: the current time in
/// milliseconds followed by a random integer.
pub fn new_boundary() -> String {
    let timestamp = Utc::now().timestamp_millis();
    format!("{BOUNDARY_PREFIX}{timestamp}{}", random_u32())
}

fn random_u32() -> u32 {
    let mut bytes = [0_u8; 4];
    match getrandom::fill(&mut bytes) {
        Ok(()) => u32::from_le_bytes(bytes),
        // Uniqueness still holds across requests through the timestamp.
        Err(_) => Utc::now().timestamp_subsec_nanos(),
    }
}

/// Value for the request's `Content-Type` header.
pub fn content_type(boundary: &str) -> String {
    format!("multipart/form-data; boundary={boundary}")
}

/// Escapes a field name for use inside the quoted `name` parameter.
fn escape_name(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for ch in name.chars() {
        match ch {
            '"' => escaped.push_str("%22"),
            '\r' => escaped.push_str("%0D"),
            '\n' => escaped.push_str("%0A"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn push_section(body: &mut String, boundary: &str, field: &Field) {
    body.push_str("--");
    body.push_str(boundary);
    body.push_str(CRLF);
    body.push_str("Content-Disposition: form-data; name=\"");
    body.push_str(&escape_name(&field.name));
    body.push('"');
    body.push_str(CRLF);
    body.push_str(CRLF);
    body.push_str(&field.value);
    body.push_str(CRLF);
}

/// Serializes every field of `request`, then the closing boundary.
pub fn encode(request: &FeedbackRequest, boundary: &str) -> Vec<u8> {
    let mut body = String::new();
    for field in request.fields() {
        push_section(&mut body, boundary, &field);
    }
    body.push_str("--");
    body.push_str(boundary);
    body.push_str("--");
    body.push_str(CRLF);
    body.into_bytes()
}
