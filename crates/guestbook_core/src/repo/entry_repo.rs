//! Entry repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over `entries` and `entry_ratings` storage.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths must call `Entry::validate()` before SQL mutations.
//! - Read paths must reject invalid persisted state instead of masking it.
//! - Rating rows are replaced as a whole in a single transaction.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::entry::{Entry, EntryId, EntryValidationError};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const ENTRIES_DEFAULT_LIMIT: u32 = 20;
const ENTRIES_LIMIT_MAX: u32 = 100;

const ENTRY_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    text,
    created_at
FROM entries";

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for entry persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(EntryValidationError),
    Db(DbError),
    NotFound(EntryId),
    InvalidData(String),
    /// Connection has not been migrated to the schema this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "entry not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted entry data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it through db::open_db"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "connection is missing required table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "table `{table}` is missing required column `{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EntryValidationError> for RepoError {
    fn from(value: EntryValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for listing entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryListQuery {
    /// Maximum rows to return. Defaults to 20 and clamps to 100.
    pub limit: Option<u32>,
    /// Number of rows to skip.
    pub offset: u32,
}

/// Repository interface for entry CRUD operations.
pub trait EntryRepository {
    /// Persists a transient entry, assigning and stamping its id.
    fn create_entry(&mut self, entry: &mut Entry) -> RepoResult<EntryId>;
    /// Persists rating-set changes of an already saved entry.
    fn update_entry(&mut self, entry: &Entry) -> RepoResult<()>;
    /// Gets one entry by id.
    fn get_entry(&self, id: EntryId) -> RepoResult<Option<Entry>>;
    /// Lists entries newest-first with pagination.
    fn list_entries(&self, query: &EntryListQuery) -> RepoResult<Vec<Entry>>;
    /// Deletes one entry; its rating rows cascade.
    fn delete_entry(&mut self, id: EntryId) -> RepoResult<()>;
}

/// SQLite-backed entry repository.
pub struct SqliteEntryRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteEntryRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl EntryRepository for SqliteEntryRepository<'_> {
    fn create_entry(&mut self, entry: &mut Entry) -> RepoResult<EntryId> {
        entry.validate()?;
        if let Some(id) = entry.id() {
            return Err(RepoError::InvalidData(format!(
                "entry {id} is already persisted"
            )));
        }

        let id: EntryId = Uuid::new_v4();
        let uuid = id.to_string();

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO entries (uuid, name, text, created_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![uuid.as_str(), entry.name(), entry.text(), entry.created_at()],
        )?;
        insert_ratings_in_tx(&tx, uuid.as_str(), entry)?;
        tx.commit()?;

        entry.assign_id(id);
        Ok(id)
    }

    fn update_entry(&mut self, entry: &Entry) -> RepoResult<()> {
        entry.validate()?;
        let Some(id) = entry.id() else {
            return Err(RepoError::InvalidData(
                "cannot update a transient entry without an id".to_string(),
            ));
        };
        let uuid = id.to_string();

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        // name/text/created_at are immutable; only rating state moves.
        let changed = tx.execute(
            "UPDATE entries
             SET updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [uuid.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        tx.execute(
            "DELETE FROM entry_ratings WHERE entry_uuid = ?1;",
            [uuid.as_str()],
        )?;
        insert_ratings_in_tx(&tx, uuid.as_str(), entry)?;
        tx.commit()?;

        Ok(())
    }

    fn get_entry(&self, id: EntryId) -> RepoResult<Option<Entry>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ENTRY_SELECT_SQL} WHERE uuid = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_entry_row(self.conn, row)?));
        }

        Ok(None)
    }

    fn list_entries(&self, query: &EntryListQuery) -> RepoResult<Vec<Entry>> {
        let mut sql = format!("{ENTRY_SELECT_SQL} ORDER BY created_at DESC, uuid ASC");
        let mut bind_values: Vec<Value> = Vec::new();

        let limit = normalize_entry_limit(query.limit);
        sql.push_str(" LIMIT ?");
        bind_values.push(Value::Integer(i64::from(limit)));
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut entries = Vec::new();

        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(self.conn, row)?);
        }

        Ok(entries)
    }

    fn delete_entry(&mut self, id: EntryId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM entries WHERE uuid = ?1;",
            [id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

/// Normalizes list limit according to the entries contract.
pub fn normalize_entry_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) => ENTRIES_DEFAULT_LIMIT,
        Some(value) if value > ENTRIES_LIMIT_MAX => ENTRIES_LIMIT_MAX,
        Some(value) => value,
        None => ENTRIES_DEFAULT_LIMIT,
    }
}

fn parse_entry_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Entry> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in entries.uuid"))
    })?;

    let (likers, dislikers) = load_ratings(conn, uuid_text.as_str())?;

    let entry = Entry::materialize(
        uuid,
        row.get("name")?,
        row.get("text")?,
        row.get("created_at")?,
        likers,
        dislikers,
    );
    entry.validate()?;
    Ok(entry)
}

fn load_ratings(
    conn: &Connection,
    entry_uuid: &str,
) -> RepoResult<(BTreeSet<String>, BTreeSet<String>)> {
    let mut stmt = conn.prepare(
        "SELECT username, rating
         FROM entry_ratings
         WHERE entry_uuid = ?1;",
    )?;
    let mut rows = stmt.query([entry_uuid])?;

    let mut likers = BTreeSet::new();
    let mut dislikers = BTreeSet::new();
    while let Some(row) = rows.next()? {
        let username: String = row.get("username")?;
        let rating: String = row.get("rating")?;
        match rating.as_str() {
            "like" => {
                likers.insert(username);
            }
            "dislike" => {
                dislikers.insert(username);
            }
            other => {
                return Err(RepoError::InvalidData(format!(
                    "invalid rating value `{other}` in entry_ratings.rating"
                )));
            }
        }
    }

    Ok((likers, dislikers))
}

fn insert_ratings_in_tx(tx: &Transaction<'_>, entry_uuid: &str, entry: &Entry) -> RepoResult<()> {
    let mut stmt = tx.prepare(
        "INSERT INTO entry_ratings (entry_uuid, username, rating)
         VALUES (?1, ?2, ?3);",
    )?;
    for username in entry.likers() {
        stmt.execute(params![entry_uuid, username.as_str(), "like"])?;
    }
    for username in entry.dislikers() {
        stmt.execute(params![entry_uuid, username.as_str(), "dislike"])?;
    }
    Ok(())
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in ["entries", "entry_ratings"] {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }

    for column in ["uuid", "name", "text", "created_at", "updated_at"] {
        if !table_has_column(conn, "entries", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "entries",
                column,
            });
        }
    }

    for column in ["entry_uuid", "username", "rating"] {
        if !table_has_column(conn, "entry_ratings", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "entry_ratings",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
