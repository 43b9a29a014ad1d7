//! Path and path-prefix rules shared by services, filesets and file exports.
//!
//! A path ending in `*` is a prefix: it covers every path starting with the
//! text before the `*`.

/// Returns the prefix of a wildcard path, or `None` for an exact path.
fn prefix_of(path: &str) -> Option<&str> {
    path.strip_suffix('*')
}

/// Returns true if `provided` satisfies the `required` path, exactly or as a prefix.
pub fn covers(provided: &str, required: &str) -> bool {
    provided == required || prefix_of(provided).is_some_and(|prefix| required.starts_with(prefix))
}

/// Describes how two paths overlap, if they do.
///
/// The message does not depend on argument order.
pub fn overlap(path: &str, other: &str) -> Option<String> {
    if path == other {
        return Some(format!("same path {path}"));
    }
    let forward = prefix_of(path).is_some_and(|prefix| other.starts_with(prefix));
    let backward = prefix_of(other).is_some_and(|prefix| path.starts_with(prefix));
    let (first, second) = match (forward, backward) {
        (true, false) => (path, other),
        (false, true) => (other, path),
        (true, true) => (path.min(other), path.max(other)),
        (false, false) => return None,
    };
    Some(format!("overlapping paths {first} and {second}"))
}

/// Collects every overlap between two path sets, sorted and deduplicated.
pub fn overlaps(paths: &[String], others: &[String]) -> Vec<String> {
    let mut found: Vec<String> = paths
        .iter()
        .flat_map(|path| others.iter().filter_map(move |other| overlap(path, other)))
        .collect();
    found.sort();
    found.dedup();
    found
}

/// Returns the required paths not covered by any provided path.
pub fn uncovered<'a>(required: &'a [String], provided: &[String]) -> Vec<&'a str> {
    required
        .iter()
        .filter(|path| !provided.iter().any(|candidate| covers(candidate, path)))
        .map(String::as_str)
        .collect()
}
