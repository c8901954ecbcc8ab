use std::{fmt, io};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::ParseError as UrlParseError;

use serde_json::Error as JsonError;

use crate::entity::EntityKind;

/// A single dangling cross-reference discovered by the relationship
/// resolver. These are accumulated, never fail-fast, so one run reports
/// every problem in the input set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityError {
    /// Collection the missing identifier was expected in.
    pub collection: EntityKind,
    /// Identifier of the entity holding the dangling reference.
    pub entity_id: String,
    /// The identifier that failed to resolve.
    pub missing_id: String,
}

impl fmt::Display for IntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' references {} '{}' which does not exist",
            self.entity_id, self.collection, self.missing_id
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum CatenaError {
    #[error("Duplicate identifier: {0}")]
    Duplicate(String),
    /// Referential integrity failures. The build aborts only after the
    /// full list has been gathered.
    #[error("{} referential integrity error(s)", .0.len())]
    Integrity(Vec<IntegrityError>),
    /// A logic defect in the engine, never bad input: multiple structural
    /// owners, a path collision, or an unresolvable common ancestor.
    #[error("internal consistency fault: {0}")]
    Internal(String),
    /// A record rejected at the load boundary: an empty required
    /// reference set, or an identifier that yields no usable path
    /// segment. Bad input, unlike [`CatenaError::Internal`].
    #[error("Invalid record: {0}")]
    Invalid(String),
    #[error("File System error: {0}")]
    Io(String),
    #[error("Item Not Found: {0}")]
    NotFound(String),
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
}

impl From<io::Error> for CatenaError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => CatenaError::NotFound(format!("{x}")),
            _ => CatenaError::Io(format!("IOError: {x}")),
        }
    }
}

impl From<JsonError> for CatenaError {
    fn from(src: JsonError) -> CatenaError {
        CatenaError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<UrlParseError> for CatenaError {
    fn from(src: UrlParseError) -> CatenaError {
        CatenaError::Serialization(format!("Invalid URL: {src}"))
    }
}

impl From<fmt::Error> for CatenaError {
    fn from(x: fmt::Error) -> Self {
        CatenaError::Serialization(format!("{x}"))
    }
}
