//! Item use-case service.
//!
//! # Responsibility
//! - Provide the `add`, `list`, `show` and `close` entry points.
//! - Own the per-invocation context: configuration, directory cache and the
//!   VCS command runner.
//!
//! # Invariants
//! - The store root is resolved at most once per service value.
//! - `list`, `show` and `close` never create the store.
//! - Every container read is decoded in full; undecodable containers are
//!   errors, empty ones are skipped.

use crate::codec;
use crate::config::{Config, ConfigError};
use crate::identity::{resolve_identity, CommandRunner};
use crate::model::item::{Identity, Item, NewItem, Priority};
use crate::resolve::fuzzy::AmbiguityPolicy;
use crate::resolve::priority;
use crate::service::{ServiceError, ServiceResult};
use crate::store::{ContainerRef, DirLocator, Store, StoreError, StoredLocation};
use chrono::{DateTime, FixedOffset, Local};
use log::info;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

/// Input for [`ItemService::add_item`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AddItemRequest {
    /// Category token; abbreviations are allowed.
    pub category: String,
    pub subject: String,
    /// Final body text, stored as given.
    pub body: String,
    /// Priority token; `None` uses the configured default.
    pub priority: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub revision: Option<String>,
    /// Creation time; `None` means now.
    pub created_at: Option<DateTime<FixedOffset>>,
    pub policy: AmbiguityPolicy,
}

/// Result of a successful add.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedItem {
    pub location: StoredLocation,
    /// Container path relative to the starting directory.
    pub relative_path: PathBuf,
    pub priority: Priority,
}

/// One row of `list` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedItem {
    pub category: String,
    /// Container file stem, usable as a `show`/`close` token.
    pub id: String,
    pub path: PathBuf,
    /// First message of the container.
    pub item: Item,
    /// Number of messages in the container.
    pub messages: usize,
}

/// Every message of one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShownContainer {
    pub container: ContainerRef,
    pub items: Vec<Item>,
}

/// Result of moving a container to the done category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedItem {
    pub from: ContainerRef,
    pub to: PathBuf,
}

/// Use-case service for one invocation.
pub struct ItemService<'r> {
    config: Config,
    locator: DirLocator,
    runner: &'r dyn CommandRunner,
    store: Option<Store>,
}

impl<'r> ItemService<'r> {
    pub fn new(config: Config, locator: DirLocator, runner: &'r dyn CommandRunner) -> Self {
        Self {
            config,
            locator,
            runner,
            store: None,
        }
    }

    /// Loads layered configuration from `config_paths` and builds a service.
    pub fn load(
        config_paths: &[PathBuf],
        locator: DirLocator,
        runner: &'r dyn CommandRunner,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(Config::load(config_paths)?, locator, runner))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Known category names, lower-cased and sorted.
    pub fn known_categories(&self) -> Vec<String> {
        self.config.known_categories()
    }

    /// Resolves the store root, creating it in the starting directory when
    /// `create` is set and no ancestor holds one.
    pub fn store(&mut self, create: bool) -> ServiceResult<Store> {
        if let Some(store) = &self.store {
            return Ok(store.clone());
        }
        let store = Store::open(&mut self.locator, &self.config.dirname, create)?;
        self.store = Some(store.clone());
        Ok(store)
    }

    /// Identity from the working tree's VCS, else configuration.
    pub fn identity(&mut self) -> Identity {
        let defaults = self.config.identity_defaults();
        resolve_identity(&mut self.locator, &defaults, self.runner)
    }

    /// Creates a new item.
    ///
    /// Overrides in `request` win over VCS and configured identity; VCS is
    /// not consulted at all when name, email and revision are all given.
    pub fn add_item(&mut self, request: &AddItemRequest) -> ServiceResult<AddedItem> {
        let started_at = Instant::now();
        let subject = request.subject.trim();
        if subject.is_empty() {
            return Err(ServiceError::EmptySubject);
        }

        let priority = match request.priority.as_deref() {
            Some(token) => priority::resolve(token, request.policy)?,
            None => self.config.default_priority(),
        };

        let store = self.store(true)?;
        let known = self.known_categories();
        let category_path = store.category_dir(&request.category, &known, request.policy)?;

        let (author_name, author_email, revision) =
            match (&request.name, &request.email, &request.revision) {
                (Some(name), Some(email), Some(revision)) => {
                    (name.clone(), email.clone(), Some(revision.clone()))
                }
                _ => {
                    let identity = self.identity();
                    (
                        request.name.clone().unwrap_or(identity.name),
                        request.email.clone().unwrap_or(identity.email),
                        request.revision.clone().or(identity.revision),
                    )
                }
            };

        let new_item = NewItem {
            subject: subject.to_string(),
            body: request.body.clone(),
            author_name,
            author_email,
            priority,
            revision,
            created_at: request
                .created_at
                .unwrap_or_else(|| Local::now().fixed_offset()),
        };
        let encoded = codec::encode(&new_item);
        let location = store.append(&category_path, &encoded)?;
        let relative_path = relative_to(&location.container, self.locator.start());

        info!(
            "event=item_add module=service status=ok path={} priority={} duration_ms={}",
            relative_path.display(),
            priority.name(),
            started_at.elapsed().as_millis()
        );
        Ok(AddedItem {
            location,
            relative_path,
            priority,
        })
    }

    /// Lists items whose subject or body contains every term.
    ///
    /// The done category is skipped unless `include_done` is set. Output is
    /// ordered by priority rank, then creation time, then subject.
    pub fn list_items(
        &mut self,
        terms: &[String],
        include_done: bool,
    ) -> ServiceResult<Vec<ListedItem>> {
        let store = self.store(false)?;
        let skip = (!include_done).then_some(self.config.done_category.as_str());
        let mut listed = Vec::new();

        for container in store.containers(skip)? {
            let items = read_container(&container.path)?;
            if !items.iter().any(|item| item.matches_terms(terms)) {
                continue;
            }
            let messages = items.len();
            let Some(first) = items.into_iter().next() else {
                continue;
            };
            listed.push(ListedItem {
                id: container.stem(),
                category: container.category,
                path: relative_to(&container.path, self.locator.start()),
                item: first,
                messages,
            });
        }

        listed.sort_by(|a, b| {
            a.item
                .priority
                .cmp(&b.item.priority)
                .then_with(|| a.item.created_at.cmp(&b.item.created_at))
                .then_with(|| a.item.subject.cmp(&b.item.subject))
        });
        info!(
            "event=item_list module=service status=ok terms={} include_done={} count={}",
            terms.len(),
            include_done,
            listed.len()
        );
        Ok(listed)
    }

    /// Returns every message of the container identified by `token`.
    pub fn show_item(&mut self, token: &str) -> ServiceResult<ShownContainer> {
        let container = self.find_container(token, false)?;
        let items = read_container(&container.path)?;
        Ok(ShownContainer { container, items })
    }

    /// Moves the container identified by `token` into the done category.
    pub fn close_item(&mut self, token: &str) -> ServiceResult<ClosedItem> {
        let container = self.find_container(token, true)?;
        let store = self.store(false)?;
        let known = self.known_categories();
        let done_dir = store.category_dir(
            &self.config.done_category,
            &known,
            AmbiguityPolicy::Fail,
        )?;
        let to = store.move_container(&container.path, &done_dir)?;
        info!(
            "event=item_close module=service status=ok id={} from={}",
            container.stem(),
            container.category
        );
        Ok(ClosedItem {
            from: container,
            to: relative_to(&to, self.locator.start()),
        })
    }

    /// Finds one container by file stem or message id.
    ///
    /// An exact stem wins; otherwise the token must be a unique prefix of a
    /// stem or of a message id (angle brackets ignored). Matching is
    /// case-insensitive.
    fn find_container(&mut self, token: &str, pending_only: bool) -> ServiceResult<ContainerRef> {
        let wanted = token
            .trim()
            .trim_start_matches('<')
            .trim_end_matches('>')
            .to_lowercase();
        if wanted.is_empty() {
            return Err(ServiceError::ItemNotFound(token.to_string()));
        }

        let store = self.store(false)?;
        let skip = pending_only.then_some(self.config.done_category.as_str());
        let containers = store.containers(skip)?;

        if let Some(exact) = containers
            .iter()
            .find(|container| container.stem().to_lowercase() == wanted)
        {
            return Ok(exact.clone());
        }

        let mut matches = Vec::new();
        for container in containers {
            let by_stem = container.stem().to_lowercase().starts_with(&wanted);
            let by_id = !by_stem
                && read_container(&container.path)?
                    .iter()
                    .any(|item| bare_message_id(&item.message_id).starts_with(&wanted));
            if by_stem || by_id {
                matches.push(container);
            }
        }

        match matches.len() {
            0 => Err(ServiceError::ItemNotFound(token.to_string())),
            1 => Ok(matches.remove(0)),
            _ => Err(ServiceError::AmbiguousItem {
                token: token.to_string(),
                candidates: matches
                    .iter()
                    .map(|container| format!("{}/{}", container.category, container.stem()))
                    .collect(),
            }),
        }
    }
}

fn read_container(path: &Path) -> ServiceResult<Vec<Item>> {
    let bytes = std::fs::read(path).map_err(|err| StoreError::io(path, err))?;
    codec::decode_container(&bytes).map_err(|source| ServiceError::Codec {
        path: path.to_path_buf(),
        source,
    })
}

fn bare_message_id(message_id: &str) -> String {
    message_id
        .trim()
        .trim_start_matches('<')
        .trim_end_matches('>')
        .to_lowercase()
}

/// Expresses `path` relative to `base`, climbing with `..` where needed.
fn relative_to(path: &Path, base: &Path) -> PathBuf {
    let path_parts: Vec<Component<'_>> = path.components().collect();
    let base_parts: Vec<Component<'_>> = base.components().collect();
    let common = path_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();
    if common == 0 {
        return path.to_path_buf();
    }

    let mut out = PathBuf::new();
    for _ in common..base_parts.len() {
        out.push("..");
    }
    for part in &path_parts[common..] {
        out.push(part.as_os_str());
    }
    out
}
