//! Guestbook entry domain model.
//!
//! # Responsibility
//! - Define the entry record: author, message, creation time, ratings.
//! - Provide the like/dislike toggles and viewer-relative rating reads.
//!
//! # Invariants
//! - `name` and `text` are never blank and never change after construction.
//! - `created_at` is stamped once at construction.
//! - A username is in at most one of `likers`/`dislikers` at any time.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier for a persisted entry.
///
/// Assigned by the persistence layer on first save; transient entries
/// carry no id yet.
pub type EntryId = Uuid;

/// One viewer's current relationship to an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    /// The viewer currently likes the entry.
    Liked,
    /// The viewer currently dislikes the entry.
    Disliked,
    /// The viewer has no active rating on the entry.
    Neutral,
}

/// Validation failure for entry state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValidationError {
    /// `name` is empty or whitespace-only.
    EmptyName,
    /// `text` is empty or whitespace-only.
    EmptyText,
    /// A rating set holds an empty or whitespace-only username.
    BlankUsername,
    /// The same username appears in both rating sets.
    ConflictingRating(String),
}

impl Display for EntryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name must not be empty"),
            Self::EmptyText => write!(f, "text must not be empty"),
            Self::BlankUsername => write!(f, "rating sets must not hold blank usernames"),
            Self::ConflictingRating(username) => write!(
                f,
                "username `{username}` cannot be in both likers and dislikers"
            ),
        }
    }
}

impl Error for EntryValidationError {}

/// A guestbook entry.
///
/// Fields are private: `name`, `text` and `created_at` are immutable after
/// construction, and the rating sets are only mutated through the
/// [`Entry::like`]/[`Entry::dislike`] toggles, which maintain the
/// one-axis-per-username invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EntryWire")]
pub struct Entry {
    /// `None` until the persistence layer assigns an id on first save.
    id: Option<EntryId>,
    name: String,
    text: String,
    /// Creation time in epoch milliseconds.
    created_at: i64,
    likers: BTreeSet<String>,
    dislikers: BTreeSet<String>,
}

impl Entry {
    /// Creates a new transient entry for the given author and message.
    ///
    /// # Errors
    /// - `EmptyName` / `EmptyText` when the respective argument is empty
    ///   or whitespace-only. Nothing is constructed on failure.
    pub fn new(
        name: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<Self, EntryValidationError> {
        let name = name.into();
        let text = text.into();
        if name.trim().is_empty() {
            return Err(EntryValidationError::EmptyName);
        }
        if text.trim().is_empty() {
            return Err(EntryValidationError::EmptyText);
        }

        Ok(Self {
            id: None,
            name,
            text,
            created_at: now_epoch_ms(),
            likers: BTreeSet::new(),
            dislikers: BTreeSet::new(),
        })
    }

    /// Rehydrates an entry from persisted row state.
    ///
    /// Persistence-only counterpart of the framework "materialize empty,
    /// then populate" pathway. Performs no validation itself: read paths
    /// must call [`Entry::validate`] on the result before handing it out.
    pub(crate) fn materialize(
        id: EntryId,
        name: String,
        text: String,
        created_at: i64,
        likers: BTreeSet<String>,
        dislikers: BTreeSet<String>,
    ) -> Self {
        Self {
            id: Some(id),
            name,
            text,
            created_at,
            likers,
            dislikers,
        }
    }

    /// Stamps the id assigned by the persistence layer on first save.
    pub(crate) fn assign_id(&mut self, id: EntryId) {
        self.id = Some(id);
    }

    /// Re-checks all entry invariants.
    ///
    /// Used by repository write paths before SQL and by read paths on
    /// rehydrated rows, so invalid persisted state is rejected instead of
    /// masked.
    pub fn validate(&self) -> Result<(), EntryValidationError> {
        if self.name.trim().is_empty() {
            return Err(EntryValidationError::EmptyName);
        }
        if self.text.trim().is_empty() {
            return Err(EntryValidationError::EmptyText);
        }
        for username in self.likers.iter().chain(self.dislikers.iter()) {
            if username.trim().is_empty() {
                return Err(EntryValidationError::BlankUsername);
            }
        }
        if let Some(username) = self.likers.intersection(&self.dislikers).next() {
            return Err(EntryValidationError::ConflictingRating(username.clone()));
        }
        Ok(())
    }

    /// Toggles `username` on the like axis.
    ///
    /// Present in `likers`: removed (un-like). Absent: removed from
    /// `dislikers` if there, then inserted into `likers`. Total, and
    /// self-inverse when applied twice with no intervening toggle.
    pub fn like(&mut self, username: &str) {
        if !self.likers.remove(username) {
            self.dislikers.remove(username);
            self.likers.insert(username.to_string());
        }
    }

    /// Toggles `username` on the dislike axis. Symmetric to [`Entry::like`].
    pub fn dislike(&mut self, username: &str) {
        if !self.dislikers.remove(username) {
            self.likers.remove(username);
            self.dislikers.insert(username.to_string());
        }
    }

    /// Returns the supplied viewer's current rating of this entry.
    ///
    /// The caller resolves the current principal and passes the username
    /// in; the entry never reads ambient authentication state.
    pub fn rating_for(&self, viewer: &str) -> Rating {
        if self.likers.contains(viewer) {
            Rating::Liked
        } else if self.dislikers.contains(viewer) {
            Rating::Disliked
        } else {
            Rating::Neutral
        }
    }

    /// Net rating: likers minus dislikers. `0` for an untouched entry.
    pub fn score(&self) -> i64 {
        self.likers.len() as i64 - self.dislikers.len() as i64
    }

    /// Persistence-assigned id, or `None` for a transient entry.
    pub fn id(&self) -> Option<EntryId> {
        self.id
    }

    /// Author display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Message body.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Creation time in epoch milliseconds.
    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// Usernames currently liking this entry.
    pub fn likers(&self) -> &BTreeSet<String> {
        &self.likers
    }

    /// Usernames currently disliking this entry.
    pub fn dislikers(&self) -> &BTreeSet<String> {
        &self.dislikers
    }
}

/// Raw wire shape for [`Entry`] deserialization.
///
/// Deserialization funnels through this struct and re-validates, so no
/// invalid entry can be built from external input.
#[derive(Deserialize)]
struct EntryWire {
    #[serde(default)]
    id: Option<EntryId>,
    name: String,
    text: String,
    created_at: i64,
    #[serde(default)]
    likers: BTreeSet<String>,
    #[serde(default)]
    dislikers: BTreeSet<String>,
}

impl TryFrom<EntryWire> for Entry {
    type Error = EntryValidationError;

    fn try_from(wire: EntryWire) -> Result<Self, Self::Error> {
        let entry = Entry {
            id: wire.id,
            name: wire.name,
            text: wire.text,
            created_at: wire.created_at,
            likers: wire.likers,
            dislikers: wire.dislikers,
        };
        entry.validate()?;
        Ok(entry)
    }
}

// Pre-epoch system clocks clamp to 0; construction only fails on blank input.
fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as i64)
}
