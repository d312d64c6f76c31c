const TRUNCATED_MARKER: &str = "...";

pub const MAX_PREVIEW_BYTES: usize = 40;

/// One-line preview of a message body for progress output, flattened to a
/// single line and truncated on a char boundary.
pub fn message_preview(text: &str) -> String {
    let flat = text.replace(['\r', '\n'], " ");
    if flat.len() <= MAX_PREVIEW_BYTES {
        return flat;
    }
    let mut end = MAX_PREVIEW_BYTES;
    while end > 0 && !flat.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{TRUNCATED_MARKER}", &flat[..end])
}
