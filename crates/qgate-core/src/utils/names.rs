//! Helpers for dotted names such as `os.path.join` or `abc.ABC`.

/// Extracts the last segment of a dotted name.
///
/// ```ignore
/// assert_eq!(last_segment("requests.get"), "get");
/// ```
#[must_use]
pub fn last_segment(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Extracts the first segment of a dotted name.
#[must_use]
pub fn root_segment(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

/// Whether an identifier is public (does not start with an underscore).
#[must_use]
pub fn is_public(name: &str) -> bool {
    !name.starts_with('_')
}
