//! URL utilities for locating the feedback endpoint of a form.

use reqwest::Url;

/// The `url` crate's parse error, reached through `reqwest::Url`.
pub type ParseError = <Url as std::str::FromStr>::Err;

/// Normalize a URL by removing trailing slashes
///
/// # Examples
///
/// ```
/// use configure_feedback::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://wiki.example.com/bin/configure"), "http://wiki.example.com/bin/configure");
/// assert_eq!(normalize_base_url("http://wiki.example.com/bin/configure//"), "http://wiki.example.com/bin/configure");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Append a path fragment to a URL without doubling the slash between them.
///
/// An empty fragment leaves the URL untouched.
///
/// # Examples
///
/// ```
/// use configure_feedback::utils::url::append_path;
///
/// assert_eq!(
///     append_path("http://wiki.example.com/bin/configure", "/Sessions"),
///     "http://wiki.example.com/bin/configure/Sessions"
/// );
/// assert_eq!(append_path("http://wiki.example.com/bin/configure", ""), "http://wiki.example.com/bin/configure");
/// ```
pub fn append_path(url: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return url.to_string();
    }
    format!("{}/{}", normalize_base_url(url), path)
}

/// Resolve a form's `action` against the page URL and append `path_info`.
///
/// An empty action submits to the page itself, as a browser does.
pub fn resolve_action_url(
    base_url: &str,
    action: &str,
    path_info: Option<&str>,
) -> Result<String, ParseError> {
    let resolved = match Url::parse(action) {
        Ok(absolute) => absolute,
        Err(_) => Url::parse(base_url)?.join(action)?,
    };
    Ok(append_path(resolved.as_str(), path_info.unwrap_or_default()))
}
