//! Base path policy

/// Normalize a user-supplied base path.
///
/// A leading `~` is expanded to the home directory and any run of trailing
/// `/` or `\` separators is stripped. An empty input stays empty; callers
/// decide what an empty base path means. A path made only of separators
/// keeps its first one so that `/` still names the filesystem root.
pub fn normalize(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let expanded = shellexpand::tilde(raw);
    let trimmed = expanded.trim_end_matches(['/', '\\']);

    if trimmed.is_empty() {
        expanded[..1].to_string()
    } else {
        trimmed.to_string()
    }
}
