//! Command-level use cases.
//!
//! # Responsibility
//! - Orchestrate locator, resolvers, identity, codec and store into the
//!   `add`, `list`, `show` and `close` operations.
//! - Keep the binary free of storage and encoding details.

use crate::codec::CodecError;
use crate::config::ConfigError;
use crate::resolve::priority::PriorityError;
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod item_service;

pub use item_service::{
    AddItemRequest, AddedItem, ClosedItem, ItemService, ListedItem, ShownContainer,
};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Use-case level error.
#[derive(Debug)]
pub enum ServiceError {
    Store(StoreError),
    Priority(PriorityError),
    Config(ConfigError),
    /// A container holds a record that cannot be decoded.
    Codec { path: PathBuf, source: CodecError },
    /// Subject is blank after trimming.
    EmptySubject,
    ItemNotFound(String),
    AmbiguousItem {
        token: String,
        candidates: Vec<String>,
    },
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Priority(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
            Self::Codec { path, source } => write!(f, "{}: {source}", path.display()),
            Self::EmptySubject => write!(f, "subject cannot be empty"),
            Self::ItemNotFound(token) => write!(f, "no item matches `{token}`"),
            Self::AmbiguousItem { token, candidates } => write!(
                f,
                "`{token}` matches several items: [{}]",
                candidates.join(", ")
            ),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Priority(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::Codec { source, .. } => Some(source),
            Self::EmptySubject => None,
            Self::ItemNotFound(_) => None,
            Self::AmbiguousItem { .. } => None,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<PriorityError> for ServiceError {
    fn from(value: PriorityError) -> Self {
        Self::Priority(value)
    }
}

impl From<ConfigError> for ServiceError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}
