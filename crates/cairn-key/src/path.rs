//! Dot-separated path algebra.
//!
//! Paths address nodes in a [`Section`](crate::Section) tree:
//! - The empty string is the document root
//! - Segments are joined with `.`, so `npc.0.name` is three levels deep
//! - Joining never produces a leading separator when the base is the root

/// Separator between path segments.
pub const SEPARATOR: char = '.';

/// Join a relative path onto a base path.
///
/// An empty `relative` returns `base` unchanged. An empty `base` (the root)
/// returns `relative` without a leading separator.
///
/// # Examples
///
/// ```
/// use cairn_key::path::join;
///
/// assert_eq!(join("npc", "name"), "npc.name");
/// assert_eq!(join("", "npc"), "npc");
/// assert_eq!(join("npc", ""), "npc");
/// ```
pub fn join(base: &str, relative: &str) -> String {
    if relative.is_empty() {
        return base.to_string();
    }
    if base.is_empty() {
        return relative.to_string();
    }
    let mut joined = String::with_capacity(base.len() + 1 + relative.len());
    joined.push_str(base);
    joined.push(SEPARATOR);
    joined.push_str(relative);
    joined
}

/// The last segment of a path, or the whole path if it has no separator.
pub fn name(path: &str) -> &str {
    path.rsplit(SEPARATOR).next().unwrap_or(path)
}

/// Split a path into its parent and final segment.
///
/// Returns `None` for the parent when the path has a single segment.
pub fn split_last(path: &str) -> (Option<&str>, &str) {
    match path.rsplit_once(SEPARATOR) {
        Some((parent, leaf)) => (Some(parent), leaf),
        None => (None, path),
    }
}
