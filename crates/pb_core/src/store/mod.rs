//! File-system store: root discovery, category directories and containers.
//!
//! # Responsibility
//! - Resolve the single store root for one invocation.
//! - Map category tokens onto category directories.
//! - Append encoded items to per-item mbox containers under a lock.
//!
//! # Invariants
//! - Store layout is `<root>/<category>/<token>.mbox`.
//! - Nothing under the store root is ever deleted by core.
//! - Container writes are all-or-nothing at record granularity.

use crate::codec::EncodedItem;
use crate::resolve::fuzzy::{AmbiguityPolicy, MatchError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub mod category;
pub mod container;
pub mod locator;

pub use container::{StoredLocation, CONTAINER_SUFFIX};
pub use locator::DirLocator;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-layer error.
#[derive(Debug)]
pub enum StoreError {
    /// Store directory or category is absent.
    NotFound(String),
    /// A non-directory entry claims a category name.
    NameCollision(PathBuf),
    /// Several directories differ from the category only by case.
    DuplicateCategory {
        category: String,
        entries: Vec<String>,
    },
    /// Category token could not be resolved.
    Match(MatchError),
    /// File-system failure.
    Io { path: PathBuf, source: io::Error },
}

impl StoreError {
    pub(crate) fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(name) => write!(f, "`{name}` not found"),
            Self::NameCollision(path) => write!(
                f,
                "`{}` already exists and is not a directory",
                path.display()
            ),
            Self::DuplicateCategory { category, entries } => write!(
                f,
                "category `{category}` is ambiguous on disk: [{}]",
                entries.join(", ")
            ),
            Self::Match(err) => write!(f, "category {err}"),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Match(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::NotFound(_) => None,
            Self::NameCollision(_) => None,
            Self::DuplicateCategory { .. } => None,
        }
    }
}

impl From<MatchError> for StoreError {
    fn from(value: MatchError) -> Self {
        Self::Match(value)
    }
}

/// One container discovered while scanning the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRef {
    /// On-disk category directory name.
    pub category: String,
    pub path: PathBuf,
}

impl ContainerRef {
    /// File name without the container suffix.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Handle to a resolved store root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    /// Resolves the store named `dirname` through `locator`.
    pub fn open(locator: &mut DirLocator, dirname: &str, create: bool) -> StoreResult<Self> {
        Ok(Self {
            root: locator.locate(dirname, create)?,
        })
    }

    /// Wraps an already known store root.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a category token and creates its directory when absent.
    pub fn category_dir(
        &self,
        token: &str,
        known: &[String],
        policy: AmbiguityPolicy,
    ) -> StoreResult<PathBuf> {
        category::resolve_or_create(&self.root, token, known, policy)
    }

    /// Appends an encoded item to its container in `category_path`.
    pub fn append(&self, category_path: &Path, item: &EncodedItem) -> StoreResult<StoredLocation> {
        container::append(category_path, item)
    }

    /// Lists every container, optionally skipping one category
    /// (compared case-insensitively).
    ///
    /// Ordering is deterministic: category name, then file name.
    pub fn containers(&self, skip_category: Option<&str>) -> StoreResult<Vec<ContainerRef>> {
        let skip = skip_category.map(str::to_lowercase);
        let mut out = Vec::new();
        for (category, dir) in sorted_entries(&self.root)? {
            if !dir.is_dir() || skip.as_deref() == Some(category.to_lowercase().as_str()) {
                continue;
            }
            for (file_name, path) in sorted_entries(&dir)? {
                if path.is_file() && file_name.ends_with(CONTAINER_SUFFIX) {
                    out.push(ContainerRef {
                        category: category.clone(),
                        path,
                    });
                }
            }
        }
        Ok(out)
    }

    /// Moves a container into another category directory.
    pub fn move_container(&self, container: &Path, dest_dir: &Path) -> StoreResult<PathBuf> {
        container::move_to(container, dest_dir)
    }
}

/// Directory entries as `(name, path)`, sorted by name.
pub(crate) fn sorted_entries(dir: &Path) -> StoreResult<Vec<(String, PathBuf)>> {
    let reader = fs::read_dir(dir).map_err(|err| StoreError::io(dir, err))?;
    let mut entries = Vec::new();
    for entry in reader {
        let entry = entry.map_err(|err| StoreError::io(dir, err))?;
        entries.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
    }
    entries.sort();
    Ok(entries)
}
