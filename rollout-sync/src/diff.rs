//! Unified diff of a values-file edit.

use std::path::Path;

use similar::TextDiff;

/// `None` when the content did not change.
pub fn values_diff(path: &Path, before: &str, after: &str) -> Option<String> {
    let before = normalize_line_endings(before);
    let after = normalize_line_endings(after);
    if before == after {
        return None;
    }

    let old_header = format!("a/{}", path.display());
    let new_header = format!("b/{}", path.display());
    Some(
        TextDiff::from_lines(&before, &after)
            .unified_diff()
            .header(&old_header, &new_header)
            .context_radius(3)
            .to_string(),
    )
}

fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n")
}
