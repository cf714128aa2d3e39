//! Changelog accumulation.

/// Puts a freshly generated entry ahead of the existing changelog.
///
/// The previous document's top-level `# ` title stays at the top, once; a
/// title in the new entry is dropped in its favour. Without a previous
/// title the entry's own title is used.
pub fn prepend_changelog_entry(entry: &str, previous: &str) -> String {
    if previous.trim().is_empty() {
        return entry.to_string();
    }
    let (previous_title, previous_body) = split_title(previous);
    let (entry_title, entry_body) = split_title(entry);

    let mut out = String::new();
    if let Some(title) = previous_title.or(entry_title) {
        out.push_str(title);
        out.push_str("\n\n");
    }
    let entry_body = entry_body.trim();
    if !entry_body.is_empty() {
        out.push_str(entry_body);
        out.push_str("\n\n");
    }
    out.push_str(previous_body.trim());
    out.push('\n');
    out
}

fn split_title(text: &str) -> (Option<&str>, &str) {
    let text = text.trim_start();
    let end = text.find('\n').unwrap_or(text.len());
    let first = text[..end].trim_end();
    if first.starts_with("# ") {
        (Some(first), &text[end..])
    } else {
        (None, text)
    }
}
