//! Element lookups by id or by control name.
//!
//! Configuration keys such as `{Plugins}{Foo}{Enabled}` are full of
//! characters that mean something in a DOM query, so selectors are always
//! rendered from escaped names and parsed back before matching.

use std::fmt;

use crate::page::{Control, Page, StatusElement};

/// Characters that get a backslash in front of them.
const SPECIAL: &str = " !\"#$%&'()*+,./:;<=>?@[\\]^`{|}~";

/// Escapes `name` for use inside a selector. `:` becomes the hex escape
/// `\3a ` so that it cannot be read as a pseudo-class.
pub fn escape(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len() + 8);
    for ch in name.chars() {
        if ch == ':' {
            escaped.push_str("\\3a ");
        } else if SPECIAL.contains(ch) {
            escaped.push('\\');
            escaped.push(ch);
        } else {
            escaped.push(ch);
        }
    }
    escaped
}

/// Reverses [`escape`], including hex escapes of up to six digits.
pub fn unescape(text: &str) -> Result<String, SelectorError> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let Some(&next) = chars.peek() else {
            return Err(SelectorError::DanglingEscape(text.to_string()));
        };
        if next.is_ascii_hexdigit() {
            let mut digits = String::new();
            while digits.len() < 6 {
                match chars.peek() {
                    Some(c) if c.is_ascii_hexdigit() => {
                        digits.push(*c);
                        chars.next();
                    }
                    _ => break,
                }
            }
            if chars.peek() == Some(&' ') {
                chars.next();
            }
            let decoded = u32::from_str_radix(&digits, 16)
                .ok()
                .and_then(char::from_u32)
                .ok_or_else(|| SelectorError::BadHexEscape(digits.clone()))?;
            out.push(decoded);
        } else {
            out.push(next);
            chars.next();
        }
    }
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// `#<id>`
    Id(String),
    /// `[name="<name>"]`
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    Unsupported(String),
    DanglingEscape(String),
    BadHexEscape(String),
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorError::Unsupported(selector) => write!(f, "unsupported selector: {selector}"),
            SelectorError::DanglingEscape(selector) => {
                write!(f, "selector ends inside an escape: {selector}")
            }
            SelectorError::BadHexEscape(digits) => write!(f, "invalid hex escape: \\{digits}"),
        }
    }
}

impl std::error::Error for SelectorError {}

impl Selector {
    pub fn id(id: impl Into<String>) -> Self {
        Selector::Id(id.into())
    }

    pub fn name(name: impl Into<String>) -> Self {
        Selector::Name(name.into())
    }

    pub fn parse(text: &str) -> Result<Self, SelectorError> {
        let text = text.trim();
        if let Some(id) = text.strip_prefix('#') {
            return Ok(Selector::Id(unescape(id)?));
        }
        if let Some(inner) = text
            .strip_prefix("[name=\"")
            .and_then(|rest| rest.strip_suffix("\"]"))
        {
            return Ok(Selector::Name(unescape(inner)?));
        }
        Err(SelectorError::Unsupported(text.to_string()))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Id(id) => write!(f, "#{}", escape(id)),
            Selector::Name(name) => write!(f, "[name=\"{}\"]", escape(name)),
        }
    }
}

/// What a selector matched on a page.
#[derive(Debug)]
pub enum Matched<'a> {
    Status(&'a StatusElement),
    Controls(Vec<&'a Control>),
}

impl Page {
    /// Resolves a selector string. An id matches a status element first and
    /// then any control carrying that id.
    pub fn select(&self, selector: &str) -> Result<Option<Matched<'_>>, SelectorError> {
        let matched = match Selector::parse(selector)? {
            Selector::Id(id) => match self.status_element(&id) {
                Some(status) => Some(Matched::Status(status)),
                None => {
                    let controls: Vec<&Control> = self
                        .forms
                        .iter()
                        .filter_map(|form| form.control_by_id(&id))
                        .collect();
                    (!controls.is_empty()).then_some(Matched::Controls(controls))
                }
            },
            Selector::Name(name) => {
                let controls: Vec<&Control> = self
                    .forms
                    .iter()
                    .flat_map(|form| form.controls_named(&name))
                    .collect();
                (!controls.is_empty()).then_some(Matched::Controls(controls))
            }
        };
        Ok(matched)
    }
}
