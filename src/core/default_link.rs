//! "Reset to default" links next to configuration fields.
//!
//! Each link toggles between two states: the first click puts the default
//! value into the field and remembers what was there, the second click puts
//! the remembered value back.

use serde::{Deserialize, Serialize};

use crate::core::ui_state::EventDisposition;
use crate::page::apply::is_true;
use crate::page::{ControlKind, Form};

pub const SET_DEFAULT_LABEL: &str = "use default";
pub const UNDO_DEFAULT_LABEL: &str = "undo";

/// Type of a configuration value, as named by the server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValueType {
    Url,
    Path,
    Urlpath,
    String,
    Boolean,
    Number,
    Selectclass,
    Select,
    Regex,
    Octal,
    Command,
    Password,
    Perl,
}

impl ValueType {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Url => "URL",
            ValueType::Path => "PATH",
            ValueType::Urlpath => "URLPATH",
            ValueType::String => "STRING",
            ValueType::Boolean => "BOOLEAN",
            ValueType::Number => "NUMBER",
            ValueType::Selectclass => "SELECTCLASS",
            ValueType::Select => "SELECT",
            ValueType::Regex => "REGEX",
            ValueType::Octal => "OCTAL",
            ValueType::Command => "COMMAND",
            ValueType::Password => "PASSWORD",
            ValueType::Perl => "PERL",
        }
    }
}

/// Replaces `#dd` escapes (two decimal digits) with the character of that
/// code.
pub fn decode(encoded: &str) -> String {
    let mut out = String::with_capacity(encoded.len());
    let mut rest = encoded;
    while let Some(pos) = rest.find('#') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let digits = after.get(..2).filter(|d| d.bytes().all(|b| b.is_ascii_digit()));
        match digits.and_then(|d| d.parse::<u8>().ok()) {
            Some(code) => {
                out.push(char::from(code));
                rest = &after[2..];
            }
            None => {
                out.push('#');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// How a value reads to a person: booleans as on/off, empty strings as `""`.
pub fn human_readable_value(value_type: ValueType, value: &str) -> String {
    match value_type {
        ValueType::Number => value.to_string(),
        ValueType::Boolean if is_true(value) => "on".to_string(),
        ValueType::Boolean => "off".to_string(),
        _ if value.is_empty() => "\"\"".to_string(),
        _ => value.replace("\\&quot;", ""),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultLink {
    /// Field name, `#dd`-encoded.
    pub name: String,
    pub value_type: ValueType,
    /// Default value, `#dd`-encoded.
    pub default_value: String,
    /// Value the field had before the default was applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<String>,
}

impl DefaultLink {
    pub fn field_name(&self) -> String {
        decode(&self.name)
    }

    pub fn label(&self) -> &'static str {
        if self.old_value.is_some() {
            UNDO_DEFAULT_LABEL
        } else {
            SET_DEFAULT_LABEL
        }
    }

    /// Fills a tooltip template, replacing `VALUE` and `TYPE`.
    pub fn tooltip(&self, template: &str) -> String {
        let value = human_readable_value(self.value_type, &decode(&self.default_value));
        template
            .replace("VALUE", &value)
            .replace("TYPE", self.value_type.as_str())
    }

    /// Applies the default (or restores the previous value) to the first
    /// control of `form` named by this link. Does nothing when the form has
    /// no such control.
    pub fn activate(&mut self, form: &mut Form) -> EventDisposition {
        let name = self.field_name();
        let Some(index) = form
            .controls
            .iter()
            .position(|control| control.name.as_deref() == Some(name.as_str()))
        else {
            return EventDisposition::PreventDefault;
        };
        let control = &mut form.controls[index];
        let value = self
            .old_value
            .clone()
            .unwrap_or_else(|| decode(&self.default_value));

        let previous = match control.kind {
            kind if kind.is_checkable() => {
                let previous = if control.checked { "1" } else { "0" };
                control.checked = is_true(&value);
                previous.to_string()
            }
            ControlKind::SelectOne => {
                let previous = control.current_value();
                let target = control.options.iter().position(|option| option.value == value);
                for (position, option) in control.options.iter_mut().enumerate() {
                    option.selected = Some(position) == target;
                }
                previous
            }
            _ => std::mem::replace(&mut control.value, value),
        };

        if control.kind == ControlKind::Radio && control.checked {
            form.uncheck_other_radios(&name, index);
        }

        self.old_value = match self.old_value {
            Some(_) => None,
            None => Some(previous),
        };
        EventDisposition::PreventDefault
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Control;

    fn link(name: &str, value_type: ValueType, default_value: &str) -> DefaultLink {
        DefaultLink {
            name: name.to_string(),
            value_type,
            default_value: default_value.to_string(),
            old_value: None,
        }
    }

    fn form(controls: Vec<Control>) -> Form {
        Form {
            id: "update".to_string(),
            action: String::new(),
            controls,
        }
    }

    #[test]
    fn decode_replaces_two_digit_codes() {
        assert_eq!(decode("#34quoted#34"), "\"quoted\"");
        assert_eq!(decode("a#3"), "a#3");
        assert_eq!(decode("#x1#35"), "#x1#");
        assert_eq!(decode("plain"), "plain");
    }

    #[test]
    fn readable_values() {
        assert_eq!(human_readable_value(ValueType::Number, ""), "");
        assert_eq!(human_readable_value(ValueType::Boolean, "1"), "on");
        assert_eq!(human_readable_value(ValueType::Boolean, "0"), "off");
        assert_eq!(human_readable_value(ValueType::String, ""), "\"\"");
        assert_eq!(human_readable_value(ValueType::Path, "a\\&quot;b"), "ab");
    }

    #[test]
    fn tooltip_fills_template() {
        let link = link("{Enabled}", ValueType::Boolean, "1");
        assert_eq!(link.tooltip("Default (TYPE): VALUE"), "Default (BOOLEAN): on");
    }

    #[test]
    fn text_field_round_trips_through_undo() {
        let mut form = form(vec![Control::new(ControlKind::Text, "{Dir}").with_value("/tmp/x")]);
        let mut link = link("{Dir}", ValueType::Path, "/var/lib");

        assert_eq!(link.label(), SET_DEFAULT_LABEL);
        assert_eq!(link.activate(&mut form), EventDisposition::PreventDefault);
        assert_eq!(form.controls[0].value, "/var/lib");
        assert_eq!(link.label(), UNDO_DEFAULT_LABEL);

        link.activate(&mut form);
        assert_eq!(form.controls[0].value, "/tmp/x");
        assert_eq!(link.label(), SET_DEFAULT_LABEL);
    }

    #[test]
    fn checkbox_and_select_defaults() {
        let mut select = Control::new(ControlKind::SelectOne, "{Store}").with_options(["Rcs", "Plain"]);
        select.options[1].selected = true;
        let mut form = form(vec![Control::new(ControlKind::Checkbox, "{On}"), select]);

        let mut checkbox_link = link("{On}", ValueType::Boolean, "1");
        checkbox_link.activate(&mut form);
        assert!(form.controls[0].checked);
        checkbox_link.activate(&mut form);
        assert!(!form.controls[0].checked);

        let mut select_link = link("{Store}", ValueType::Select, "Rcs");
        select_link.activate(&mut form);
        assert_eq!(form.controls[1].selected_index(), Some(0));
        select_link.activate(&mut form);
        assert_eq!(form.controls[1].selected_index(), Some(1));
    }

    #[test]
    fn missing_field_is_ignored() {
        let mut form = form(Vec::new());
        let mut link = link("{Gone}", ValueType::String, "x");
        link.activate(&mut form);
        assert_eq!(link.old_value, None);
    }

    #[test]
    fn checking_a_radio_default_unchecks_its_group() {
        let mut other = Control::new(ControlKind::Radio, "{Mode}").with_value("fast");
        other.checked = true;
        let mut form = form(vec![
            Control::new(ControlKind::Radio, "{Mode}").with_value("safe"),
            other,
        ]);
        let mut link = link("{Mode}", ValueType::Boolean, "1");

        link.activate(&mut form);
        assert!(form.controls[0].checked);
        assert!(!form.controls[1].checked);
    }
}
