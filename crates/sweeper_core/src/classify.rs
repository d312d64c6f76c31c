use crate::{DayBoundary, Message};

/// Outcome of classifying one message against the retention policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Eligible for deletion: has text, no media, not dated today.
    Delete,
    /// Carries media; preserved regardless of date or text.
    KeepMedia,
    /// Dated today under the boundary's offset; preserved.
    KeepToday,
    /// Neither text nor media (system events and the like); preserved.
    KeepOther,
}

/// Classify a message. First match wins: the media check has strict priority
/// over the date check, which has priority over the text check.
///
/// Pure function of the message's own attributes and the boundary, so the
/// same inputs always classify the same way; statistics aggregation belongs
/// to the caller.
pub fn classify(message: &Message, boundary: &DayBoundary) -> Outcome {
    if message.has_media() {
        return Outcome::KeepMedia;
    }
    if boundary.is_today(message.date) {
        return Outcome::KeepToday;
    }
    if !message.has_text() {
        return Outcome::KeepOther;
    }
    Outcome::Delete
}
