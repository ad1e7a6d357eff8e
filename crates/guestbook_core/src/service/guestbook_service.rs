//! Guestbook use-case service.
//!
//! # Responsibility
//! - Provide the entry points a web layer calls: sign, toggle ratings,
//!   read, list, remove.
//! - Guard principal usernames before they reach entity state.
//!
//! # Invariants
//! - Callers resolve the current principal and pass the username in;
//!   this layer never reads ambient authentication state.
//! - Entity toggles stay total; username shape is rejected here instead.
//! - Entry list is always sorted newest-first.

use crate::model::entry::{Entry, EntryId, EntryValidationError, Rating};
use crate::repo::entry_repo::{
    normalize_entry_limit, EntryListQuery, EntryRepository, RepoError, RepoResult,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

// Blank, whitespace-bearing, or oversized principal names never reach the
// rating sets.
static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._@-]{0,63}$").expect("valid username regex"));

/// Service error for guestbook use-cases.
#[derive(Debug)]
pub enum GuestbookServiceError {
    /// Entry input failed domain validation.
    Validation(EntryValidationError),
    /// Supplied principal username is not an acceptable identifier.
    InvalidPrincipal(String),
    /// Target entry does not exist.
    EntryNotFound(EntryId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for GuestbookServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidPrincipal(username) => write!(f, "invalid principal: `{username}`"),
            Self::EntryNotFound(id) => write!(f, "entry not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent entry state: {details}"),
        }
    }
}

impl Error for GuestbookServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for GuestbookServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::EntryNotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<EntryValidationError> for GuestbookServiceError {
    fn from(value: EntryValidationError) -> Self {
        Self::Validation(value)
    }
}

/// List result envelope used by service callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntriesListResult {
    /// List items sorted newest-first.
    pub items: Vec<Entry>,
    /// Effective normalized limit used by the query.
    pub applied_limit: u32,
}

/// Guestbook service facade over repository implementations.
pub struct GuestbookService<R: EntryRepository> {
    repo: R,
}

impl<R: EntryRepository> GuestbookService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Signs the guestbook: validates, persists, and returns the new entry.
    pub fn sign(
        &mut self,
        name: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<Entry, GuestbookServiceError> {
        let mut entry = Entry::new(name, text)?;
        let id = self.repo.create_entry(&mut entry)?;
        self.repo
            .get_entry(id)?
            .ok_or(GuestbookServiceError::InconsistentState(
                "created entry not found in read-back",
            ))
    }

    /// Toggles the principal's like on one entry and persists the result.
    ///
    /// Returns the updated entry.
    pub fn toggle_like(
        &mut self,
        id: EntryId,
        username: &str,
    ) -> Result<Entry, GuestbookServiceError> {
        validate_principal(username)?;
        let mut entry = self.load_entry(id)?;
        entry.like(username);
        self.repo.update_entry(&entry)?;
        Ok(entry)
    }

    /// Toggles the principal's dislike on one entry and persists the result.
    ///
    /// Returns the updated entry.
    pub fn toggle_dislike(
        &mut self,
        id: EntryId,
        username: &str,
    ) -> Result<Entry, GuestbookServiceError> {
        validate_principal(username)?;
        let mut entry = self.load_entry(id)?;
        entry.dislike(username);
        self.repo.update_entry(&entry)?;
        Ok(entry)
    }

    /// Returns the supplied viewer's rating of one entry.
    ///
    /// The web layer resolves the current principal and passes the
    /// username in.
    pub fn rating_for(
        &self,
        id: EntryId,
        viewer: &str,
    ) -> Result<Rating, GuestbookServiceError> {
        validate_principal(viewer)?;
        let entry = self.load_entry(id)?;
        Ok(entry.rating_for(viewer))
    }

    /// Gets one entry by id.
    pub fn get_entry(&self, id: EntryId) -> RepoResult<Option<Entry>> {
        self.repo.get_entry(id)
    }

    /// Lists entries newest-first with pagination.
    pub fn list_entries(
        &self,
        limit: Option<u32>,
        offset: u32,
    ) -> Result<EntriesListResult, GuestbookServiceError> {
        let applied_limit = normalize_entry_limit(limit);
        let query = EntryListQuery {
            limit: Some(applied_limit),
            offset,
        };
        let items = self.repo.list_entries(&query)?;
        Ok(EntriesListResult {
            items,
            applied_limit,
        })
    }

    /// Removes one entry through the persistence layer.
    pub fn remove_entry(&mut self, id: EntryId) -> Result<(), GuestbookServiceError> {
        self.repo.delete_entry(id)?;
        Ok(())
    }

    fn load_entry(&self, id: EntryId) -> Result<Entry, GuestbookServiceError> {
        self.repo
            .get_entry(id)?
            .ok_or(GuestbookServiceError::EntryNotFound(id))
    }
}

fn validate_principal(username: &str) -> Result<(), GuestbookServiceError> {
    if USERNAME_RE.is_match(username) {
        Ok(())
    } else {
        Err(GuestbookServiceError::InvalidPrincipal(username.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::validate_principal;

    #[test]
    fn principal_guard_accepts_plain_usernames() {
        assert!(validate_principal("bob").is_ok());
        assert!(validate_principal("jane.doe@example").is_ok());
    }

    #[test]
    fn principal_guard_rejects_blank_and_whitespace() {
        assert!(validate_principal("").is_err());
        assert!(validate_principal("   ").is_err());
        assert!(validate_principal("two words").is_err());
    }

    #[test]
    fn principal_guard_rejects_oversized_names() {
        let oversized = "a".repeat(65);
        assert!(validate_principal(&oversized).is_err());
    }
}
