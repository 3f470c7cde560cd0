//! Core domain logic for pb, a file-system todo tracker.
//! This crate is the single source of truth for store layout, record format
//! and token resolution.

pub mod codec;
pub mod config;
pub mod identity;
pub mod logging;
pub mod model;
pub mod resolve;
pub mod service;
pub mod store;

pub use codec::{CodecError, CodecResult, EncodedItem};
pub use config::{Config, ConfigError};
pub use identity::{
    resolve_identity, CommandRunner, IdentityDefaults, IdentitySource, SystemRunner, VcsIdentity,
    VcsKind,
};
pub use logging::{default_log_level, init_logging, level_for_verbosity, logging_status};
pub use model::item::{Identity, Item, NewItem, Priority};
pub use resolve::fuzzy::{fuzzy_match, resolve_choice, AmbiguityPolicy, MatchError};
pub use resolve::priority::PriorityError;
pub use service::{
    AddItemRequest, AddedItem, ClosedItem, ItemService, ListedItem, ServiceError, ServiceResult,
    ShownContainer,
};
pub use store::{ContainerRef, DirLocator, Store, StoreError, StoreResult, StoredLocation};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
