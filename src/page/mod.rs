//! Typed model of the configure screen that the feedback exchange reads
//! from and writes to.
//!
//! A [`Page`] is normally loaded from a TOML description; field values on the
//! page are the only state that survives between exchanges.

pub mod apply;
pub mod selector;
pub mod snapshot;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::core::default_link::DefaultLink;

/// Fallback for the "working" label when the page has no template.
pub const DEFAULT_WORKING_LABEL: &str = "Working...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlKind {
    Text,
    Password,
    Hidden,
    Textarea,
    Checkbox,
    Radio,
    SelectOne,
    SelectMultiple,
    File,
    Submit,
    Reset,
    Button,
}

impl ControlKind {
    pub fn is_select(self) -> bool {
        matches!(self, ControlKind::SelectOne | ControlKind::SelectMultiple)
    }

    pub fn is_checkable(self) -> bool {
        matches!(self, ControlKind::Checkbox | ControlKind::Radio)
    }

    /// Kinds that never contribute to a submitted form.
    pub fn is_excluded_from_submission(self) -> bool {
        matches!(
            self,
            ControlKind::File | ControlKind::Submit | ControlKind::Reset
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub disabled: bool,
}

impl SelectOption {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: None,
            selected: false,
            disabled: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Control {
    pub kind: ControlKind,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub checked: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub options: Vec<SelectOption>,
}

impl Control {
    pub fn new(kind: ControlKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            id: None,
            name: Some(name.into()),
            value: String::new(),
            checked: false,
            disabled: false,
            options: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_options<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = values.into_iter().map(SelectOption::new).collect();
        self
    }

    /// Index of the first selected option, as a browser reports
    /// `selectedIndex`. `None` stands for `-1`.
    pub fn selected_index(&self) -> Option<usize> {
        self.options.iter().position(|option| option.selected)
    }

    pub fn selected_values(&self) -> Vec<&str> {
        self.options
            .iter()
            .filter(|option| option.selected)
            .map(|option| option.value.as_str())
            .collect()
    }

    /// The value a script would read from this control.
    pub fn current_value(&self) -> String {
        if self.kind.is_select() {
            self.selected_values()
                .first()
                .map(|value| value.to_string())
                .unwrap_or_default()
        } else {
            self.value.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
    pub id: String,
    /// Submission target, relative to [`Page::base_url`] or absolute.
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub controls: Vec<Control>,
}

impl Form {
    pub fn control_by_id(&self, id: &str) -> Option<&Control> {
        self.controls
            .iter()
            .find(|control| control.id.as_deref() == Some(id))
    }

    pub fn controls_named<'a, 'n>(
        &'a self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a Control> + use<'a, 'n> {
        self.controls
            .iter()
            .filter(move |control| control.name.as_deref() == Some(name))
    }

    pub fn controls_named_mut<'a, 'n>(
        &'a mut self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a mut Control> + use<'a, 'n> {
        self.controls
            .iter_mut()
            .filter(move |control| control.name.as_deref() == Some(name))
    }

    /// Unchecks every radio button named `name` except the control at
    /// `keep`. A radio group has at most one checked member.
    pub fn uncheck_other_radios(&mut self, name: &str, keep: usize) {
        for (index, control) in self.controls.iter_mut().enumerate() {
            if index != keep
                && control.kind == ControlKind::Radio
                && control.name.as_deref() == Some(name)
            {
                control.checked = false;
            }
        }
    }

    /// Index of the last checked radio named `name`.
    pub fn last_checked_radio(&self, name: &str) -> Option<usize> {
        self.controls.iter().rposition(|control| {
            control.kind == ControlKind::Radio
                && control.checked
                && control.name.as_deref() == Some(name)
        })
    }
}

/// A status display next to a field or feedback button.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusElement {
    #[serde(default)]
    pub html: String,
    /// Set while an exchange for this element is outstanding.
    #[serde(default)]
    pub pending: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    /// Base against which form actions are resolved.
    #[serde(default)]
    pub base_url: String,
    /// Localized label shown while an exchange is in flight.
    #[serde(default)]
    pub working_template: Option<String>,
    #[serde(default)]
    pub forms: Vec<Form>,
    /// Status elements keyed by element id.
    #[serde(default)]
    pub status: BTreeMap<String, StatusElement>,
    #[serde(default)]
    pub default_links: Vec<DefaultLink>,
    /// Anchors of the section menu tabs, e.g. `#Passwords$Security`.
    #[serde(default)]
    pub tabs: Vec<String>,
    /// Messages shown on the modal error surface, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

#[derive(Debug)]
pub enum PageError {
    Read { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
    Write(String),
    UnknownForm(String),
    ControlNotFound(String),
    InvalidAction { form: String, message: String },
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageError::Read { path, source } => {
                write!(f, "Failed to read page at {}: {}", path.display(), source)
            }
            PageError::Parse { path, source } => {
                write!(f, "Failed to parse page at {}: {}", path.display(), source)
            }
            PageError::Write(message) => write!(f, "Failed to write page: {message}"),
            PageError::UnknownForm(id) => write!(f, "No form with id '{id}'"),
            PageError::ControlNotFound(id) => write!(f, "No form has a control with id '{id}'"),
            PageError::InvalidAction { form, message } => {
                write!(f, "Form '{form}' has no usable action URL: {message}")
            }
        }
    }
}

impl std::error::Error for PageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PageError::Read { source, .. } => Some(source),
            PageError::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl Page {
    pub fn load_from_path(path: &Path) -> Result<Page, PageError> {
        let contents = fs::read_to_string(path).map_err(|source| PageError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| PageError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), PageError> {
        let contents =
            toml::to_string_pretty(self).map_err(|err| PageError::Write(err.to_string()))?;
        let parent = path.parent().filter(|dir| !dir.as_os_str().is_empty());
        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir),
            None => NamedTempFile::new(),
        }
        .map_err(|err| PageError::Write(err.to_string()))?;
        temp_file
            .write_all(contents.as_bytes())
            .map_err(|err| PageError::Write(err.to_string()))?;
        temp_file
            .persist(path)
            .map_err(|err| PageError::Write(err.to_string()))?;
        Ok(())
    }

    pub fn form(&self, id: &str) -> Result<&Form, PageError> {
        self.forms
            .iter()
            .find(|form| form.id == id)
            .ok_or_else(|| PageError::UnknownForm(id.to_string()))
    }

    pub fn form_mut(&mut self, id: &str) -> Result<&mut Form, PageError> {
        self.forms
            .iter_mut()
            .find(|form| form.id == id)
            .ok_or_else(|| PageError::UnknownForm(id.to_string()))
    }

    /// The form holding the control with `control_id`.
    pub fn form_of_control(&self, control_id: &str) -> Result<&Form, PageError> {
        self.forms
            .iter()
            .find(|form| form.control_by_id(control_id).is_some())
            .ok_or_else(|| PageError::ControlNotFound(control_id.to_string()))
    }

    pub fn working_label(&self) -> &str {
        self.working_template
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .unwrap_or(DEFAULT_WORKING_LABEL)
    }

    pub fn status_element(&self, id: &str) -> Option<&StatusElement> {
        self.status.get(id)
    }

    /// Replaces the contents of status element `id` if the page declares
    /// it. Returns false when there is no such element.
    pub fn update_status(&mut self, id: &str, html: impl Into<String>) -> bool {
        match self.status.get_mut(id) {
            Some(element) => {
                element.html = html.into();
                element.pending = false;
                true
            }
            None => false,
        }
    }

    /// Replaces (or creates) the status element `id`.
    pub fn set_status(&mut self, id: &str, html: impl Into<String>, pending: bool) {
        let element = self.status.entry(id.to_string()).or_default();
        element.html = html.into();
        element.pending = pending;
    }

    /// Puts `html` on the modal error surface.
    pub fn show_error(&mut self, html: impl Into<String>) {
        let html = html.into();
        tracing::warn!(error = %html, "feedback error surfaced");
        self.errors.push(html);
    }

    pub fn take_errors(&mut self) -> Vec<String> {
        std::mem::take(&mut self.errors)
    }
}
