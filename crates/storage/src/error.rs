#![forbid(unsafe_code)]

use rwm_core::paths::PathGuardError;

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Sql(rusqlite::Error),
    InvalidInput(&'static str),
    NotFound {
        entity: &'static str,
        id: String,
    },
    PathEscape(PathGuardError),
    NoFieldsToUpdate,
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) | Self::Sql(_) => "STORE_ERROR",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::PathEscape(_) => "PATH_ESCAPE",
            Self::NoFieldsToUpdate => "INVALID_UPDATE",
        }
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Sql(err) => write!(f, "sqlite: {err}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::PathEscape(err) => write!(f, "{err}"),
            Self::NoFieldsToUpdate => write!(f, "no mutable fields supplied for update"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sql(value)
    }
}

impl From<PathGuardError> for StoreError {
    fn from(value: PathGuardError) -> Self {
        Self::PathEscape(value)
    }
}
