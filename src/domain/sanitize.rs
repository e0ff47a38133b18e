//! Mapping of remote names to filesystem-safe local names.

/// Placeholder used when nothing usable is left of a name.
pub const UNNAMED: &str = "unnamed";

/// Characters reserved on at least one common filesystem.
const RESERVED: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Turn an arbitrary remote name into a single safe path component.
///
/// Control characters are dropped, reserved characters become `_`, and
/// surrounding whitespace is trimmed. A name consisting only of dots would
/// address the current or parent directory, so its dots become `_` too.
/// Never returns an empty string.
#[must_use]
pub fn sanitize(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if RESERVED.contains(&c) { '_' } else { c })
        .collect();

    let trimmed = cleaned.trim();

    if trimmed.is_empty() {
        UNNAMED.to_string()
    } else if trimmed.chars().all(|c| c == '.') {
        "_".repeat(trimmed.len())
    } else {
        trimmed.to_string()
    }
}
