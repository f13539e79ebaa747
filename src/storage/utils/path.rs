// Address helpers shared by the backends and the transfer manager
use std::path::{Component, Path};

/// Split a hierarchical-store address into its container and item parts.
///
/// `"fs/dir/file.txt"` becomes `("fs", "dir/file.txt")`; a bare container
/// name yields an empty item.
pub fn split_container(path: &str) -> (&str, &str) {
    let trimmed = path.trim_start_matches('/');
    match trimmed.split_once('/') {
        Some((container, item)) => (container, item.trim_matches('/')),
        None => (trimmed, ""),
    }
}

/// Return a new String that guarantees a trailing '/'.
pub fn ensure_trailing_slash(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

/// Directory path in the form OpenDAL listers expect: `/` for the root,
/// otherwise slash-terminated.
pub fn listing_dir(item: &str) -> String {
    let trimmed = item.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        ensure_trailing_slash(trimmed)
    }
}

/// Join a directory address and a relative path with a single '/'.
pub fn join_path(base: &str, relative: &str) -> String {
    let base = base.trim_end_matches('/');
    let relative = relative.trim_start_matches('/');
    if base.is_empty() {
        relative.to_string()
    } else {
        format!("{base}/{relative}")
    }
}

/// Path of a listed entry relative to the listing's base prefix, or `None`
/// if the entry does not lie under that prefix.
pub fn strip_listing_base<'a>(listed: &'a str, base: &str) -> Option<&'a str> {
    let listed = listed.trim_start_matches('/');
    let base = base.trim_matches('/');
    if base.is_empty() {
        return Some(listed);
    }
    listed
        .strip_prefix(base)
        .and_then(|rest| rest.strip_prefix('/'))
}

/// Extract a normalized basename from an address.
pub fn basename(path: &str) -> String {
    Path::new(path.trim_end_matches('/'))
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Rebuild a relative path using '/' separators, or `None` if any component
/// would step outside the directory it is resolved against.
pub fn to_slash_relative(path: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().to_string()),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(parts.join("/"))
}
