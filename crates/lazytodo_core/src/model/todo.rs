//! Todo record and title normalization.
//!
//! # Invariants
//! - `id` is assigned once at creation and never changes.
//! - `created_at` is set once; `updated_at` starts equal to it.
//! - Serialized field names match the persisted blob (`createdAt`, `updatedAt`).
//! - Timestamps always serialize with exactly three fractional digits
//!   (`2023-11-14T22:13:20.000Z`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable identifier for a todo; creation time in epoch milliseconds,
/// bumped when needed to stay unique.
pub type TodoId = i64;

/// One task item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    /// Display text; trimmed and non-empty.
    pub title: String,
    pub completed: bool,
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
    /// Reset on every successful edit or toggle.
    #[serde(with = "iso_millis")]
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// Creates an open todo with both timestamps set to `now`.
    ///
    /// Callers are expected to pass a title already accepted by
    /// [`normalize_title`].
    pub fn new(id: TodoId, title: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: title.into(),
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Flips completion state and stamps `updated_at`.
    pub fn toggle(&mut self, now: DateTime<Utc>) {
        self.completed = !self.completed;
        self.updated_at = now;
    }

    /// Replaces the title and stamps `updated_at`.
    pub fn rename(&mut self, title: impl Into<String>, now: DateTime<Utc>) {
        self.title = title.into();
        self.updated_at = now;
    }
}

/// Trims a user-supplied title.
///
/// Returns `None` when nothing but whitespace remains.
pub fn normalize_title(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// RFC 3339 timestamps pinned to millisecond precision with a `Z` suffix.
///
/// Reading accepts any RFC 3339 offset and converts it to UTC.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(de::Error::custom)
    }
}
