//! Domain entities. Pure data structures, mapped from the chat-service
//! adapter; no IO types here.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a message, unique within its container.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct MessageId(pub i64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the group/channel whose history is scanned.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ContainerId(pub i64);

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Container metadata as resolved by the lookup call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInfo {
    pub id: ContainerId,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ContainerKind,
}

/// Classification of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    /// Private DM with a user.
    Private,
    /// Small group chat.
    Group,
    /// Supergroup (megagroup).
    Supergroup,
    /// Broadcast channel.
    Channel,
}

/// A single message from a container's history. Immutable once fetched;
/// owned by the source system, read-only to the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    /// Instant the message was sent, as delivered by the source.
    pub date: DateTime<Utc>,
    /// Textual body. `None` and the empty string both mean "no text".
    pub text: Option<String>,
    /// Media attached to the message, if any.
    pub media: Option<MediaKind>,
}

impl Message {
    pub fn has_media(&self) -> bool {
        self.media.is_some()
    }

    pub fn has_text(&self) -> bool {
        self.text.as_deref().is_some_and(|text| !text.is_empty())
    }
}

/// Mutually exclusive media kinds a message may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Video,
    Document,
    Audio,
    Voice,
    VideoNote,
    Sticker,
    Animation,
    /// Kinds the wire format may add later; still counts as media.
    #[serde(other)]
    Other,
}
