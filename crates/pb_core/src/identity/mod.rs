//! Author identity derived from the working tree's version control.
//!
//! # Responsibility
//! - Detect which VCS (if any) owns the working directory.
//! - Query name, email and revision from that VCS.
//! - Fall back to configured defaults whenever a query is unavailable.
//!
//! # Invariants
//! - Detection order is fixed: Git, Bazaar, Mercurial, Subversion.
//! - Subversion is detected in the working directory only; the others walk
//!   upward like the store locator.
//! - Identity resolution never fails; revision is simply absent.

use crate::model::item::Identity;
use crate::store::DirLocator;
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

pub mod local;
pub mod runner;

pub use runner::{CommandRunner, SubprocessUnavailable, SystemRunner};

const GIT_USER_NAME: &[&str] = &["config", "--get", "user.name"];
const GIT_USER_EMAIL: &[&str] = &["config", "--get", "user.email"];
const GIT_REVISION: &[&str] = &["rev-parse", "HEAD"];
const BZR_WHOAMI: &[&str] = &["whoami"];
const BZR_REVISION: &[&str] = &["version-info", "--custom", "--template={revision_id}"];
const HG_USERNAME: &[&str] = &["showconfig", "ui.username"];
const HG_REVISION: &[&str] = &["parents", "--template", "{node}"];
const SVN_REVISION: &[&str] = &["info", "--show-item", "revision"];

static COMBINED_IDENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(.*?)\s*<\s*([^<>]*?)\s*>?\s*$").expect("valid combined identity regex")
});

/// Statically configured fallback identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityDefaults {
    pub name: String,
    pub email: String,
}

/// Closed set of supported version-control backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcsKind {
    Git,
    Bazaar,
    Mercurial,
    Subversion,
    None,
}

impl VcsKind {
    /// Backends in detection priority.
    pub const DETECTION_ORDER: [VcsKind; 4] = [
        VcsKind::Git,
        VcsKind::Bazaar,
        VcsKind::Mercurial,
        VcsKind::Subversion,
    ];

    /// Metadata directory that marks a working tree.
    pub fn marker(self) -> Option<&'static str> {
        match self {
            Self::Git => Some(".git"),
            Self::Bazaar => Some(".bzr"),
            Self::Mercurial => Some(".hg"),
            Self::Subversion => Some(".svn"),
            Self::None => None,
        }
    }

    pub fn executable(self) -> Option<&'static str> {
        match self {
            Self::Git => Some("git"),
            Self::Bazaar => Some("bzr"),
            Self::Mercurial => Some("hg"),
            Self::Subversion => Some("svn"),
            Self::None => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Git => "git",
            Self::Bazaar => "bazaar",
            Self::Mercurial => "mercurial",
            Self::Subversion => "subversion",
            Self::None => "none",
        }
    }

    /// Returns the first backend whose marker is visible from the locator.
    pub fn detect(locator: &mut DirLocator) -> VcsKind {
        let detected = Self::DETECTION_ORDER
            .into_iter()
            .find(|kind| kind.is_here(locator))
            .unwrap_or(VcsKind::None);
        info!(
            "event=vcs_detect module=identity status=ok kind={} dir={}",
            detected.as_str(),
            locator.start().display()
        );
        detected
    }

    fn is_here(self, locator: &mut DirLocator) -> bool {
        match (self, self.marker()) {
            (Self::Subversion, Some(marker)) => locator.start().join(marker).is_dir(),
            (_, Some(marker)) => locator.find(marker).is_some(),
            (_, None) => false,
        }
    }

    /// Query that reports name and email as one `name <email>` string.
    fn combined_query(self) -> Option<&'static [&'static str]> {
        match self {
            Self::Bazaar => Some(BZR_WHOAMI),
            Self::Mercurial => Some(HG_USERNAME),
            _ => None,
        }
    }

    fn revision_query(self) -> Option<&'static [&'static str]> {
        match self {
            Self::Git => Some(GIT_REVISION),
            Self::Bazaar => Some(BZR_REVISION),
            Self::Mercurial => Some(HG_REVISION),
            Self::Subversion => Some(SVN_REVISION),
            Self::None => None,
        }
    }
}

/// Capability shared by every identity backend.
pub trait IdentitySource {
    fn name(&self) -> String;
    fn email(&self) -> String;
    fn revision(&self) -> Option<String>;

    /// Collects all three values into an [`Identity`].
    fn identity(&self) -> Identity {
        Identity {
            name: self.name(),
            email: self.email(),
            revision: self.revision(),
        }
    }
}

/// VCS-backed identity source.
pub struct VcsIdentity<'r> {
    kind: VcsKind,
    dir: PathBuf,
    defaults: IdentityDefaults,
    runner: &'r dyn CommandRunner,
    combined: Option<(String, String)>,
}

impl<'r> VcsIdentity<'r> {
    /// Builds a source for `kind`, querying combined identities eagerly.
    pub fn new(
        kind: VcsKind,
        dir: impl Into<PathBuf>,
        defaults: IdentityDefaults,
        runner: &'r dyn CommandRunner,
    ) -> Self {
        let dir = dir.into();
        let combined = match (kind.executable(), kind.combined_query()) {
            (Some(program), Some(args)) => runner
                .output_of(&dir, program, args)
                .and_then(|text| parse_combined(&text)),
            _ => None,
        };
        Self {
            kind,
            dir,
            defaults,
            runner,
            combined,
        }
    }

    pub fn kind(&self) -> VcsKind {
        self.kind
    }

    fn query(&self, args: &[&str]) -> Option<String> {
        let program = self.kind.executable()?;
        self.runner.output_of(&self.dir, program, args)
    }
}

impl IdentitySource for VcsIdentity<'_> {
    fn name(&self) -> String {
        let queried = match self.kind {
            VcsKind::Git => self.query(GIT_USER_NAME),
            VcsKind::Bazaar | VcsKind::Mercurial => self.combined.as_ref().map(|(n, _)| n.clone()),
            VcsKind::Subversion | VcsKind::None => None,
        };
        queried.unwrap_or_else(|| self.defaults.name.clone())
    }

    fn email(&self) -> String {
        let queried = match self.kind {
            VcsKind::Git => self.query(GIT_USER_EMAIL),
            VcsKind::Bazaar | VcsKind::Mercurial => self.combined.as_ref().map(|(_, e)| e.clone()),
            VcsKind::Subversion | VcsKind::None => None,
        };
        queried.unwrap_or_else(|| self.defaults.email.clone())
    }

    fn revision(&self) -> Option<String> {
        self.query(self.kind.revision_query()?)
    }
}

/// Parses `Name <email>`, tolerating stray whitespace around the brackets.
///
/// Returns `None` unless both parts are non-empty.
pub fn parse_combined(text: &str) -> Option<(String, String)> {
    let caps = COMBINED_IDENTITY_RE.captures(text.trim())?;
    let name = caps.get(1)?.as_str().trim();
    let email = caps.get(2)?.as_str().trim();
    if name.is_empty() || email.is_empty() {
        return None;
    }
    Some((name.to_string(), email.to_string()))
}

/// Detects the backend visible from `locator` and resolves the identity.
pub fn resolve_identity(
    locator: &mut DirLocator,
    defaults: &IdentityDefaults,
    runner: &dyn CommandRunner,
) -> Identity {
    let kind = VcsKind::detect(locator);
    let dir: &Path = locator.start();
    VcsIdentity::new(kind, dir, defaults.clone(), runner).identity()
}
