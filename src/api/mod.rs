//! Wire-level types for the feedback exchange.
//!
//! A feedback request is the snapshot of a form plus three identification
//! fields, sent as `multipart/form-data`. The reply is either an opaque error
//! page or a record stream; see [`records`].

pub mod multipart;
pub mod records;

use serde::Serialize;

use crate::page::snapshot::FormSnapshot;

/// Header sent with every feedback request, carrying [`PROTOCOL_VERSION`].
pub const FEEDBACK_REQUEST_HEADER: &str = "X-Foswiki-FeedbackRequest";
/// Header a server must echo for its reply to be interpreted.
pub const FEEDBACK_RESPONSE_HEADER: &str = "X-Foswiki-FeedbackResponse";
pub const PROTOCOL_VERSION: &str = "V1.0";

pub const FIELD_FEEDBACK_REQUEST: &str = "FeedbackRequest";
pub const FIELD_FEEDBACK_BUTTON_VALUE: &str = "FeedbackButtonValue";
pub const FIELD_ACTION: &str = "action";
pub const FEEDBACK_ACTION: &str = "feedbackUI";

/// One `name=value` pair of a submitted form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    pub value: String,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A form snapshot tagged with the control that triggered it.
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackRequest {
    pub snapshot: FormSnapshot,
    pub control_id: String,
    pub control_value: String,
}

impl FeedbackRequest {
    pub fn new(
        snapshot: FormSnapshot,
        control_id: impl Into<String>,
        control_value: impl Into<String>,
    ) -> Self {
        Self {
            snapshot,
            control_id: control_id.into(),
            control_value: control_value.into(),
        }
    }

    /// All fields in transmission order: the snapshot first, then the
    /// identification fields.
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        let synthetic = [
            Field::new(FIELD_FEEDBACK_REQUEST, self.control_id.as_str()),
            Field::new(FIELD_FEEDBACK_BUTTON_VALUE, self.control_value.as_str()),
            Field::new(FIELD_ACTION, FEEDBACK_ACTION),
        ];
        self.snapshot.fields().iter().cloned().chain(synthetic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identification_fields_follow_snapshot() {
        let mut snapshot = FormSnapshot::default();
        snapshot.push("{Site}{Lang}", "en");
        let request = FeedbackRequest::new(snapshot, "{Site}{Lang}feedback", "Check");

        let names: Vec<String> = request.fields().map(|field| field.name).collect();
        assert_eq!(
            names,
            vec![
                "{Site}{Lang}",
                FIELD_FEEDBACK_REQUEST,
                FIELD_FEEDBACK_BUTTON_VALUE,
                FIELD_ACTION
            ]
        );

        let last = request.fields().last().expect("action field");
        assert_eq!(last.value, FEEDBACK_ACTION);
    }
}
