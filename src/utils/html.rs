//! Cleanup of HTML error pages before they are shown in the error dialog.

/// True when `rest` (the text right after `<` or `</`) starts with tag
/// `name` as a whole word.
fn starts_with_tag(rest: &str, name: &str) -> bool {
    rest.get(..name.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(name))
        && rest[name.len()..]
            .chars()
            .next()
            .is_none_or(|c| c == '>' || c == '/' || c.is_ascii_whitespace())
}

/// Removes every opening and closing `name` tag, keeping their content.
fn strip_tag(text: &str, name: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('<') {
        let after = &rest[start + 1..];
        let tag_body = after.strip_prefix('/').unwrap_or(after);
        if starts_with_tag(tag_body, name) {
            if let Some(end) = after.find('>') {
                out.push_str(&rest[..start]);
                rest = &after[end + 1..];
                continue;
            }
        }
        out.push_str(&rest[..=start]);
        rest = after;
    }
    out.push_str(rest);
    out
}

/// Removes a whole element (tags and content), e.g. `<head>…</head>`.
fn remove_element(text: &str, name: &str) -> String {
    let lower = text.to_ascii_lowercase();
    let open = format!("<{name}");
    let close = format!("</{name}>");
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    while let Some(found) = lower[cursor..].find(&open) {
        let start = cursor + found;
        if !starts_with_tag(&text[start + 1..], name) {
            out.push_str(&text[cursor..start + 1]);
            cursor = start + 1;
            continue;
        }
        out.push_str(&text[cursor..start]);
        cursor = match lower[start..].find(&close) {
            Some(end) => start + end + close.len(),
            None => text.len(),
        };
    }
    out.push_str(&text[cursor..]);
    out
}

fn strip_doctype(text: &str) -> &str {
    let trimmed = text.trim_start();
    let is_doctype = trimmed
        .get(..9)
        .is_some_and(|head| head.eq_ignore_ascii_case("<!doctype"));
    if is_doctype {
        if let Some(end) = trimmed.find('>') {
            return &trimmed[end + 1..];
        }
    }
    trimmed
}

/// Strips the document wrapper (`<!DOCTYPE>`, `<html>`, `<head>`, `<body>`)
/// and turns line breaks into `<br />`.
pub fn error_page_for_display(body: &str) -> String {
    let without_doctype = strip_doctype(body);
    let without_head = remove_element(without_doctype, "head");
    let unwrapped = strip_tag(&strip_tag(&without_head, "html"), "body");
    unwrapped
        .trim()
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\n', "<br />")
}
