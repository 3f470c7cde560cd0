//! Upward directory discovery with per-name memoization.
//!
//! # Responsibility
//! - Find a named directory in the starting directory or any ancestor.
//! - Optionally create it in the starting directory when no ancestor has it.
//!
//! # Invariants
//! - Only directories match; files with the same name are walked past.
//! - A name resolved once is never walked again by the same locator.
//! - Creation happens in the starting directory, never at the root.

use crate::store::{StoreError, StoreResult};
use log::info;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory locator owned by one command context.
#[derive(Debug, Clone)]
pub struct DirLocator {
    start: PathBuf,
    cache: HashMap<String, PathBuf>,
}

impl DirLocator {
    /// Creates a locator that walks upward from `start`.
    ///
    /// `start` should be absolute; the CLI passes the working directory.
    pub fn new(start: impl Into<PathBuf>) -> Self {
        Self {
            start: start.into(),
            cache: HashMap::new(),
        }
    }

    /// Creates a locator rooted at the process working directory.
    pub fn from_current_dir() -> StoreResult<Self> {
        let cwd = std::env::current_dir().map_err(|err| StoreError::io(".", err))?;
        Ok(Self::new(cwd))
    }

    /// Directory the walk starts from.
    pub fn start(&self) -> &Path {
        &self.start
    }

    /// Returns the nearest `<ancestor-or-self>/<name>` directory.
    ///
    /// # Errors
    /// - [`StoreError::NotFound`] when no ancestor has it and `create` is false.
    /// - [`StoreError::Io`] when creation fails.
    pub fn locate(&mut self, name: &str, create: bool) -> StoreResult<PathBuf> {
        if let Some(cached) = self.cache.get(name) {
            return Ok(cached.clone());
        }

        let resolved = match walk_up(&self.start, name) {
            Some(found) => {
                if found.parent() != Some(self.start.as_path()) {
                    info!(
                        "event=store_locate module=store status=found name={} path={} walked_up=true",
                        name,
                        found.display()
                    );
                }
                found
            }
            None if create => {
                let created = self.start.join(name);
                info!(
                    "event=store_locate module=store status=created name={} path={}",
                    name,
                    created.display()
                );
                fs::create_dir(&created).map_err(|err| StoreError::io(&created, err))?;
                created
            }
            None => return Err(StoreError::NotFound(name.to_string())),
        };

        self.cache.insert(name.to_string(), resolved.clone());
        Ok(resolved)
    }

    /// Like [`DirLocator::locate`] without creation, mapping a miss to `None`.
    pub fn find(&mut self, name: &str) -> Option<PathBuf> {
        self.locate(name, false).ok()
    }
}

fn walk_up(start: &Path, name: &str) -> Option<PathBuf> {
    let mut location = Some(start);
    while let Some(dir) = location {
        let candidate = dir.join(name);
        if candidate.is_dir() {
            return Some(candidate);
        }
        location = dir.parent();
    }
    None
}
