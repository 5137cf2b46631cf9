use regex::Regex;
use std::sync::LazyLock;

// Path separators, characters Windows refuses in names, and control chars.
static RE_INVALID_FILENAME_CHAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[/\\?<>:*|"\x00-\x1f]"#).unwrap());

/// Replace characters that are illegal in file and directory names.
///
/// Scoped to a single path segment: a title containing a separator never
/// produces a multi-segment path. An empty `replacement` removes the
/// offending characters.
pub fn sanitize(name: &str, replacement: &str) -> String {
    RE_INVALID_FILENAME_CHAR
        .replace_all(name, replacement)
        .into_owned()
}

/// Modify `candidate` as little as possible until `is_taken` rejects it.
///
/// Appends ` (N)` with the lowest N that works; the scope of "taken" is
/// whatever the closure closes over, typically one directory's claimed
/// entries.
pub fn uniquify(candidate: &str, is_taken: impl Fn(&str) -> bool) -> String {
    if !is_taken(candidate) {
        return candidate.to_string();
    }
    let mut n: u64 = 1;
    loop {
        let attempt = format!("{candidate} ({n})");
        if !is_taken(&attempt) {
            return attempt;
        }
        n += 1;
    }
}
