//! Errors raised by the record store and the views built on it.

use std::path::PathBuf;

use thiserror::Error;

use crate::record::Origin;

/// Everything that can go wrong in vitalrecords.
#[derive(Error, Debug)]
pub enum Error {
    // Records
    /// No record in `origin` carries `id`.
    #[error("{origin} record not found: {id}")]
    RecordNotFound { origin: Origin, id: String },

    /// `id` is already taken in `origin`.
    #[error("{origin} record already exists: {id}")]
    DuplicateRecord { origin: Origin, id: String },

    /// An edit could not be merged into the stored record.
    #[error("cannot apply edit: {0}")]
    InvalidPatch(String),

    /// A stored collection is not a JSON array, so it cannot be safely
    /// rewritten.
    #[error("stored {origin} records cannot be read: {message}")]
    UnreadableCollection { origin: Origin, message: String },

    #[error("unknown record type '{0}', expected 'birth' or 'death'")]
    InvalidOrigin(String),

    // Store
    /// The database file could not be opened.
    #[error("cannot open record store {path}: {source}")]
    DatabaseOpen {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("record store query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// The schema could not be brought up to date.
    #[error("schema upgrade failed: {message}")]
    DatabaseMigration { message: String },

    /// The directory holding the database could not be created.
    #[error("cannot create {path}: {source}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Configuration
    #[error("cannot read configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    #[error("bad configuration: {message}")]
    ConfigValidation { message: String },

    // Plumbing
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Stored or supplied JSON did not have the expected shape.
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A broken internal assumption.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    #[must_use]
    pub fn not_found(origin: Origin, id: impl ToString) -> Self {
        Self::RecordNotFound {
            origin,
            id: id.to_string(),
        }
    }

    #[must_use]
    pub fn duplicate(origin: Origin, id: impl ToString) -> Self {
        Self::DuplicateRecord {
            origin,
            id: id.to_string(),
        }
    }

    #[must_use]
    pub fn invalid_patch(message: impl Into<String>) -> Self {
        Self::InvalidPatch(message.into())
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// True when a lookup by identifier found nothing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RecordNotFound { .. })
    }

    /// True when a stored collection was refused because it is unreadable.
    #[must_use]
    pub fn is_unreadable(&self) -> bool {
        matches!(self, Self::UnreadableCollection { .. })
    }

    /// True when a registration collided with an existing identifier.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateRecord { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_collection_and_id() {
        let err = Error::not_found(Origin::Death, 7);
        assert_eq!(err.to_string(), "death record not found: 7");
        assert!(err.is_not_found());
        assert!(!err.is_duplicate());
    }

    #[test]
    fn test_duplicate_names_collection_and_id() {
        let err = Error::duplicate(Origin::Birth, "B-100");
        assert_eq!(err.to_string(), "birth record already exists: B-100");
        assert!(err.is_duplicate());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_invalid_origin_lists_choices() {
        let err = "marriage".parse::<Origin>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown record type 'marriage', expected 'birth' or 'death'"
        );
    }

    #[test]
    fn test_invalid_patch_message() {
        let err = Error::invalid_patch("cannot change id from 1 to 2");
        assert_eq!(err.to_string(), "cannot apply edit: cannot change id from 1 to 2");
    }

    #[test]
    fn test_unreadable_collection_names_origin() {
        let err = Error::UnreadableCollection {
            origin: Origin::Birth,
            message: "expected value at line 1 column 1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "stored birth records cannot be read: expected value at line 1 column 1"
        );
        assert!(err.is_unreadable());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_malformed_collection_maps_to_json() {
        let err: Error = serde_json::from_str::<Vec<i32>>("{\"id\":1}")
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::Json(_)));
        assert!(err.to_string().starts_with("malformed JSON"));
    }

    #[test]
    fn test_io_error_is_transparent() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "births.json missing");
        let err: Error = io.into();
        assert_eq!(err.to_string(), "births.json missing");
    }

    #[test]
    fn test_directory_create_keeps_source() {
        use std::error::Error as _;

        let err = Error::DirectoryCreate {
            path: PathBuf::from("/var/lib/vitalrecords"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/var/lib/vitalrecords"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_read_only_open_of_missing_file_is_query_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/vitalrecords/records.db",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            assert!(matches!(Error::from(sqlite_err), Error::DatabaseQuery(_)));
        }
    }
}
