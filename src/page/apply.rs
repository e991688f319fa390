//! Applying reply records to the page.

use serde::Serialize;
use tracing::debug;

use crate::api::records::{Opcode, Record, RecordError};
use crate::core::error::FeedbackError;
use crate::page::selector::Selector;
use crate::page::{Control, ControlKind, Page, PageError};

/// Suffix of the element that displays feedback for a key.
pub const STATUS_SUFFIX: &str = "status";

/// Whether a server-supplied value counts as "on" for a checkable control.
pub fn is_true(value: &str) -> bool {
    matches!(value, "1" | "on" | "true")
}

pub fn status_id(key: &str) -> String {
    format!("{key}{STATUS_SUFFIX}")
}

/// Counts of what one reply changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ApplySummary {
    pub status_updates: usize,
    pub value_updates: usize,
    pub errors: usize,
}

/// Sets a control from the server's value list. Returns the values that no
/// option of a select matched.
fn set_control<'v>(control: &mut Control, values: &[&'v str]) -> Vec<&'v str> {
    let mut unmatched = Vec::new();
    match control.kind {
        ControlKind::SelectOne => {
            let wanted = values.first().copied().unwrap_or_default();
            match control.options.iter().position(|option| option.value == wanted) {
                Some(index) => {
                    for (i, option) in control.options.iter_mut().enumerate() {
                        option.selected = i == index;
                    }
                }
                None => unmatched.push(wanted),
            }
        }
        ControlKind::SelectMultiple => {
            for option in &mut control.options {
                option.selected = false;
            }
            for &wanted in values {
                match control
                    .options
                    .iter_mut()
                    .find(|option| option.value == wanted)
                {
                    Some(option) => option.selected = true,
                    None => unmatched.push(wanted),
                }
            }
        }
        ControlKind::Checkbox | ControlKind::Radio => {
            control.checked = is_true(&values.join(","));
        }
        _ => control.value = values.join(","),
    }
    unmatched
}

fn apply_value(
    page: &mut Page,
    form_id: &str,
    record: &Record,
    summary: &mut ApplySummary,
) -> Result<(), PageError> {
    let values = record.values();
    let mut unmatched = Vec::new();
    let form = page.form_mut(form_id)?;
    for control in form.controls_named_mut(&record.key) {
        unmatched.extend(set_control(control, &values));
        summary.value_updates += 1;
    }
    // Checking a radio unchecks the rest of its group, so the last one wins.
    if let Some(keep) = form.last_checked_radio(&record.key) {
        form.uncheck_other_radios(&record.key, keep);
    }
    debug!(
        selector = %Selector::name(record.key.as_str()),
        values = values.len(),
        "applied value update"
    );
    for value in unmatched {
        summary.errors += 1;
        page.show_error(
            FeedbackError::NoMatchingOption {
                field: record.key.clone(),
                value: value.to_string(),
            }
            .to_string(),
        );
    }
    Ok(())
}

/// Applies records in order. A malformed record is surfaced and ends
/// processing; an unmatched select value is surfaced and processing goes on.
pub fn apply_records<I>(page: &mut Page, form_id: &str, records: I) -> Result<ApplySummary, PageError>
where
    I: IntoIterator<Item = Result<Record, RecordError>>,
{
    let mut summary = ApplySummary::default();
    for record in records {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                summary.errors += 1;
                page.show_error(FeedbackError::Record(err).to_string());
                break;
            }
        };
        match record.opcode {
            Opcode::Status => {
                let id = status_id(&record.key);
                if page.update_status(&id, record.payload) {
                    debug!(selector = %Selector::id(id.as_str()), "applied status update");
                    summary.status_updates += 1;
                } else {
                    debug!(selector = %Selector::id(id.as_str()), "no such status element");
                }
            }
            Opcode::Value => apply_value(page, form_id, &record, &mut summary)?,
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::records::parse_records;
    use crate::page::snapshot::collect;
    use crate::page::{Form, SelectOption, StatusElement};

    fn page_with(controls: Vec<Control>) -> Page {
        Page {
            forms: vec![Form {
                id: "update".to_string(),
                action: "configure".to_string(),
                controls,
            }],
            ..Default::default()
        }
    }

    fn declare_status(page: &mut Page, key: &str) {
        page.status.insert(status_id(key), StatusElement::default());
    }

    #[test]
    fn truthy_values() {
        for value in ["1", "on", "true"] {
            assert!(is_true(value), "{value} should be true");
        }
        for value in ["0", "off", "false", "", "yes", "TRUE"] {
            assert!(!is_true(value), "{value} should be false");
        }
    }

    #[test]
    fn status_record_updates_only_the_status_element() {
        let mut page = page_with(vec![Control::new(ControlKind::Text, "A").with_value("keep")]);
        declare_status(&mut page, "A");
        let summary =
            apply_records(&mut page, "update", parse_records("\u{1}A\u{2}hello")).expect("applies");

        assert_eq!(summary.status_updates, 1);
        assert_eq!(summary.value_updates, 0);
        assert_eq!(page.status_element("Astatus").map(|s| s.html.as_str()), Some("hello"));
        assert_eq!(page.forms[0].controls[0].value, "keep");
    }

    #[test]
    fn multi_select_gets_exactly_the_listed_options() {
        let mut select = Control::new(ControlKind::SelectMultiple, "B").with_options(["x", "y", "z"]);
        select.options[2].selected = true;
        let mut page = page_with(vec![select]);

        apply_records(&mut page, "update", parse_records("\u{1}B\u{3}x\u{4}y")).expect("applies");

        let select = &page.forms[0].controls[0];
        assert_eq!(select.selected_values(), vec!["x", "y"]);
        assert_eq!(select.selected_index(), Some(0));
        assert!(page.errors.is_empty());
    }

    #[test]
    fn unmatched_select_values_are_surfaced_without_stopping() {
        let mut single = Control::new(ControlKind::SelectOne, "S").with_options(["a", "b"]);
        single.options[0].selected = true;
        let multi = Control::new(ControlKind::SelectMultiple, "M").with_options(["x"]);
        let mut page = page_with(vec![single, multi]);
        declare_status(&mut page, "T");

        let summary = apply_records(
            &mut page,
            "update",
            parse_records("{\u{1}S\u{3}nope\u{1}M\u{3}x\u{4}q\u{1}T\u{2}done"),
        )
        .expect("applies");

        assert_eq!(summary.errors, 2);
        assert_eq!(page.errors.len(), 2);
        assert!(page.errors[0].contains("nope"));
        assert!(page.errors[1].contains('q'));
        assert_eq!(page.forms[0].controls[0].selected_values(), vec!["a"]);
        assert_eq!(page.forms[0].controls[1].selected_values(), vec!["x"]);
        assert_eq!(page.status_element("Tstatus").map(|s| s.html.as_str()), Some("done"));
    }

    #[test]
    fn single_select_moves_selection() {
        let mut select = Control::new(ControlKind::SelectOne, "S").with_options(["a", "b"]);
        select.options[0] = SelectOption {
            selected: true,
            ..SelectOption::new("a")
        };
        let mut page = page_with(vec![select]);

        apply_records(&mut page, "update", parse_records("{\u{1}S\u{3}b")).expect("applies");
        assert_eq!(page.forms[0].controls[0].selected_index(), Some(1));
    }

    #[test]
    fn every_control_sharing_the_name_is_updated() {
        let mut page = page_with(vec![
            Control::new(ControlKind::Text, "{K}").with_value("old"),
            Control::new(ControlKind::Checkbox, "{K}").with_value("1"),
            Control::new(ControlKind::Text, "{Other}").with_value("same"),
        ]);

        let summary =
            apply_records(&mut page, "update", parse_records("{\u{1}{K}\u{3}on")).expect("applies");

        assert_eq!(summary.value_updates, 2);
        let controls = &page.forms[0].controls;
        assert_eq!(controls[0].value, "on");
        assert!(controls[1].checked);
        assert_eq!(controls[2].value, "same");
    }

    #[test]
    fn text_controls_receive_joined_values() {
        let mut page = page_with(vec![Control::new(ControlKind::Textarea, "L")]);
        apply_records(&mut page, "update", parse_records("{\u{1}L\u{3}a\u{4}b")).expect("applies");
        assert_eq!(page.forms[0].controls[0].value, "a,b");
    }

    #[test]
    fn malformed_record_halts_processing() {
        let mut page = page_with(vec![Control::new(ControlKind::Text, "A")]);
        declare_status(&mut page, "A");
        let summary = apply_records(
            &mut page,
            "update",
            parse_records("{\u{1}A\u{2}one\u{1}bad\u{1}A\u{3}never"),
        )
        .expect("applies");

        assert_eq!(summary.status_updates, 1);
        assert_eq!(summary.value_updates, 0);
        assert_eq!(page.errors.len(), 1);
        assert_eq!(page.forms[0].controls[0].value, "");
    }

    #[test]
    fn checkbox_cleared_by_falsy_value() {
        let mut checkbox = Control::new(ControlKind::Checkbox, "C");
        checkbox.checked = true;
        let mut page = page_with(vec![checkbox]);
        apply_records(&mut page, "update", parse_records("{\u{1}C\u{3}0")).expect("applies");
        assert!(!page.forms[0].controls[0].checked);
    }

    #[test]
    fn radio_group_keeps_a_single_checked_member() {
        let mut safe = Control::new(ControlKind::Radio, "{Mode}").with_value("safe");
        safe.checked = true;
        let mut page = page_with(vec![
            Control::new(ControlKind::Radio, "{Mode}").with_value("fast"),
            safe,
            Control::new(ControlKind::Radio, "{Other}").with_value("x"),
        ]);
        page.forms[0].controls[2].checked = true;

        apply_records(&mut page, "update", parse_records("{\u{1}{Mode}\u{3}1")).expect("applies");

        let checked: Vec<bool> = page.forms[0].controls.iter().map(|c| c.checked).collect();
        assert_eq!(checked, vec![false, true, true]);
        let snapshot = collect(&page.forms[0]);
        assert_eq!(snapshot.values_of("{Mode}").collect::<Vec<_>>(), vec!["safe"]);
    }

    #[test]
    fn status_record_without_element_is_a_no_op() {
        let mut page = page_with(vec![Control::new(ControlKind::Text, "A")]);
        let summary =
            apply_records(&mut page, "update", parse_records("\u{1}A\u{2}hello")).expect("applies");

        assert_eq!(summary.status_updates, 0);
        assert!(page.status.is_empty());
        assert!(page.errors.is_empty());
    }

    #[test]
    fn multi_select_listed_out_of_option_order() {
        let select = Control::new(ControlKind::SelectMultiple, "B").with_options(["x", "y", "z"]);
        let mut page = page_with(vec![select]);

        apply_records(&mut page, "update", parse_records("\u{1}B\u{3}y\u{4}x")).expect("applies");

        let select = &page.forms[0].controls[0];
        assert_eq!(select.selected_values(), vec!["x", "y"]);
        // Reported in option order, as a browser's getter does.
        assert_eq!(select.selected_index(), Some(0));
    }
}
