use std::collections::TryReserveError;

pub const SEPARATOR: char = '/';

/// A path is well formed when it has at least one segment and none of its
/// segments is empty (no leading, trailing or doubled separators).
pub fn is_well_formed(path: &str) -> bool {
    !path.is_empty() && path.split(SEPARATOR).all(|segment| !segment.is_empty())
}

/// Contract check performed by every public tree operation.
///
/// # Panics
///
/// Panics if `path` is not well formed.
pub(crate) fn assert_well_formed(path: &str) {
    assert!(
        is_well_formed(path),
        "malformed path {path:?}: expected non-empty segments separated by '{SEPARATOR}'"
    );
}

/// Builds `parent/name`, or just `name` without a parent.
pub fn join(parent: Option<&str>, name: &str) -> Result<String, TryReserveError> {
    let mut path = String::new();
    path.try_reserve_exact(parent.map_or(0, |parent| parent.len() + 1) + name.len())?;
    if let Some(parent) = parent {
        path.push_str(parent);
        path.push(SEPARATOR);
    }
    path.push_str(name);
    Ok(path)
}

/// True if `prefix` is `path` itself or one of its ancestors.
pub fn is_prefix_of(prefix: &str, path: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some("") => true,
        Some(rest) => rest.starts_with(SEPARATOR),
        None => false,
    }
}

/// True if `child` is exactly one segment below `parent`.
pub fn is_immediate_child(parent: &str, child: &str) -> bool {
    child
        .strip_prefix(parent)
        .and_then(|rest| rest.strip_prefix(SEPARATOR))
        .is_some_and(|name| !name.is_empty() && !name.contains(SEPARATOR))
}

/// The part of `path` below `ancestor`, without the joining separator.
///
/// `ancestor` must be a proper prefix of `path` in the sense of [`is_prefix_of`].
pub fn suffix_after<'a>(ancestor: &str, path: &'a str) -> &'a str {
    path.get(ancestor.len() + 1..).unwrap_or_default()
}

/// Path of the node one segment below `ancestor` on the way down to `path`.
pub fn next_step<'a>(ancestor: &str, path: &'a str) -> Option<&'a str> {
    if !is_prefix_of(ancestor, path) || ancestor.len() == path.len() {
        return None;
    }
    let start = ancestor.len() + 1;
    let end = path[start..]
        .find(SEPARATOR)
        .map_or(path.len(), |offset| start + offset);
    Some(&path[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case("a", true)]
    #[case("a/b/c", true)]
    #[case("dir with spaces/файл", true)]
    #[case("", false)]
    #[case("/a", false)]
    #[case("a/", false)]
    #[case("a//b", false)]
    #[case("/", false)]
    fn well_formed_paths(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(is_well_formed(path), expected);
    }

    #[test]
    #[should_panic(expected = "malformed path")]
    fn assert_well_formed_rejects_empty_segments() {
        assert_well_formed("a//b");
    }

    #[rstest]
    #[case(None, "a", "a")]
    #[case(Some("a"), "b", "a/b")]
    #[case(Some("a/b"), "c", "a/b/c")]
    fn join_builds_paths(#[case] parent: Option<&str>, #[case] name: &str, #[case] expected: &str) {
        let joined = join(parent, name).expect("Failed to join path");
        assert_eq!(joined, expected);
    }

    #[rstest]
    #[case("a", "a", true)]
    #[case("a", "a/b", true)]
    #[case("a/b", "a/b/c/d", true)]
    #[case("a", "ab", false)]
    #[case("a/b", "a", false)]
    #[case("x", "a/x", false)]
    fn prefix_is_segment_aligned(#[case] prefix: &str, #[case] path: &str, #[case] expected: bool) {
        assert_eq!(is_prefix_of(prefix, path), expected);
    }

    #[rstest]
    #[case("a", "a/b", true)]
    #[case("a/b", "a/b/c", true)]
    #[case("a", "a/b/c", false)]
    #[case("a", "a", false)]
    #[case("a", "ab", false)]
    #[case("a", "a/", false)]
    #[case("b", "a/b", false)]
    fn immediate_children(#[case] parent: &str, #[case] child: &str, #[case] expected: bool) {
        assert_eq!(is_immediate_child(parent, child), expected);
    }

    #[rstest]
    #[case("a", "a/b/c", Some("a/b"))]
    #[case("a/b", "a/b/c", Some("a/b/c"))]
    #[case("a", "a", None)]
    #[case("a", "ab/c", None)]
    fn next_step_descends_one_segment(
        #[case] ancestor: &str,
        #[case] path: &str,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(next_step(ancestor, path), expected);
    }

    #[test]
    fn suffix_after_strips_ancestor_and_separator() {
        assert_eq!(suffix_after("a/b", "a/b/c/d"), "c/d");
        assert_eq!(suffix_after("a", "a/e"), "e");
    }
}
