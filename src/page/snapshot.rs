use serde::Serialize;

use crate::api::Field;
use crate::page::{Control, ControlKind, Form};

/// The successful controls of a form, in document order. Names repeat for
/// multi-valued fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormSnapshot {
    fields: Vec<Field>,
}

impl FormSnapshot {
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push(Field::new(name, value));
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn values_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |field| field.name == name)
            .map(|field| field.value.as_str())
    }
}

/// Rewrites every line ending (`\r\n`, lone `\r`, lone `\n`) as `\r\n`.
pub fn normalize_newlines(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                normalized.push_str("\r\n");
            }
            '\n' => normalized.push_str("\r\n"),
            other => normalized.push(other),
        }
    }
    normalized
}

fn contribute(control: &Control, snapshot: &mut FormSnapshot) {
    let Some(name) = control.name.as_deref().filter(|name| !name.is_empty()) else {
        return;
    };
    if control.disabled || control.kind.is_excluded_from_submission() {
        return;
    }

    match control.kind {
        ControlKind::SelectOne | ControlKind::SelectMultiple => {
            for option in control
                .options
                .iter()
                .filter(|option| option.selected && !option.disabled)
            {
                snapshot.push(name, option.value.as_str());
            }
        }
        ControlKind::Checkbox | ControlKind::Radio => {
            if control.checked {
                snapshot.push(name, control.value.as_str());
            }
        }
        ControlKind::Textarea => snapshot.push(name, normalize_newlines(&control.value)),
        _ => snapshot.push(name, control.value.as_str()),
    }
}

/// Collects the successful controls of `form`.
pub fn collect(form: &Form) -> FormSnapshot {
    let mut snapshot = FormSnapshot::default();
    for control in &form.controls {
        contribute(control, &mut snapshot);
    }
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::SelectOption;

    fn form(controls: Vec<Control>) -> Form {
        Form {
            id: "update".to_string(),
            action: "configure".to_string(),
            controls,
        }
    }

    #[test]
    fn excluded_kinds_and_disabled_or_nameless_controls_are_skipped() {
        let mut disabled = Control::new(ControlKind::Text, "off").with_value("x");
        disabled.disabled = true;
        let mut nameless = Control::new(ControlKind::Text, "").with_value("x");
        nameless.name = None;
        let empty_name = Control::new(ControlKind::Hidden, "").with_value("y");

        let snapshot = collect(&form(vec![
            Control::new(ControlKind::File, "upload").with_value("a.txt"),
            Control::new(ControlKind::Submit, "save").with_value("Save"),
            Control::new(ControlKind::Reset, "reset").with_value("Reset"),
            disabled,
            nameless,
            empty_name,
            Control::new(ControlKind::Text, "kept").with_value("1"),
        ]));

        assert_eq!(snapshot.fields(), &[Field::new("kept", "1")]);
    }

    #[test]
    fn multi_select_contributes_each_enabled_selected_option() {
        let mut select = Control::new(ControlKind::SelectMultiple, "{Languages}");
        select.options = vec![
            SelectOption {
                selected: true,
                ..SelectOption::new("en")
            },
            SelectOption::new("fr"),
            SelectOption {
                selected: true,
                ..SelectOption::new("de")
            },
            SelectOption {
                selected: true,
                disabled: true,
                ..SelectOption::new("nl")
            },
        ];

        let snapshot = collect(&form(vec![select]));
        let values: Vec<&str> = snapshot.values_of("{Languages}").collect();
        assert_eq!(values, vec!["en", "de"]);
    }

    #[test]
    fn checkables_contribute_only_when_checked() {
        let mut on = Control::new(ControlKind::Checkbox, "{Enabled}").with_value("1");
        on.checked = true;
        let off = Control::new(ControlKind::Radio, "{Mode}").with_value("fast");
        let mut chosen = Control::new(ControlKind::Radio, "{Mode}").with_value("safe");
        chosen.checked = true;

        let snapshot = collect(&form(vec![on, off, chosen]));
        assert_eq!(
            snapshot.fields(),
            &[Field::new("{Enabled}", "1"), Field::new("{Mode}", "safe")]
        );
    }

    #[test]
    fn document_order_and_duplicate_names_are_kept() {
        let snapshot = collect(&form(vec![
            Control::new(ControlKind::Hidden, "dup").with_value("1"),
            Control::new(ControlKind::Text, "other").with_value("2"),
            Control::new(ControlKind::Hidden, "dup").with_value("3"),
        ]));
        let names: Vec<&str> = snapshot.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["dup", "other", "dup"]);
    }

    #[test]
    fn textarea_line_endings_are_normalized() {
        let area =
            Control::new(ControlKind::Textarea, "{Text}").with_value("a\nb\r\nc\rd\r\r\n");
        let snapshot = collect(&form(vec![area]));
        assert_eq!(snapshot.fields()[0].value, "a\r\nb\r\nc\r\nd\r\n\r\n");
    }

    #[test]
    fn normalize_newlines_is_idempotent() {
        for input in ["", "plain", "a\nb", "a\r\nb\rc", "\r\r\n\n\r"] {
            let once = normalize_newlines(input);
            assert_eq!(normalize_newlines(&once), once);
        }
    }

    #[test]
    fn text_values_are_not_normalized() {
        let text = Control::new(ControlKind::Text, "t").with_value("a\nb");
        let snapshot = collect(&form(vec![text]));
        assert_eq!(snapshot.fields()[0].value, "a\nb");
    }
}
