//! Item domain model.
//!
//! # Responsibility
//! - Define the canonical todo record shared by codec, store and CLI.
//! - Define the fixed priority scale and the resolved author identity.
//!
//! # Invariants
//! - `Priority` rank is canonical; the name is only a display alias.
//! - `message_id` is never reused for another item.
//! - `revision` is optional everywhere; its absence is not an error.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Fixed, totally ordered priority scale.
///
/// Declaration order matches rank order, so derived `Ord` sorts
/// most urgent first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Highest,
    High,
    #[default]
    Normal,
    Low,
    Lowest,
}

impl Priority {
    /// Every priority in rank order.
    pub const ALL: [Priority; 5] = [
        Priority::Highest,
        Priority::High,
        Priority::Normal,
        Priority::Low,
        Priority::Lowest,
    ];

    /// Numeric rank, `1` (highest) to `5` (lowest).
    pub fn rank(self) -> u8 {
        match self {
            Self::Highest => 1,
            Self::High => 2,
            Self::Normal => 3,
            Self::Low => 4,
            Self::Lowest => 5,
        }
    }

    pub fn from_rank(rank: i64) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|priority| i64::from(priority.rank()) == rank)
    }

    /// Lower-case canonical name used for matching.
    pub fn name(self) -> &'static str {
        match self {
            Self::Highest => "highest",
            Self::High => "high",
            Self::Normal => "normal",
            Self::Low => "low",
            Self::Lowest => "lowest",
        }
    }

    /// Exact lookup by lower-case name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|priority| priority.name() == name)
    }

    /// Title-cased name for display.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Highest => "Highest",
            Self::High => "High",
            Self::Normal => "Normal",
            Self::Low => "Low",
            Self::Lowest => "Lowest",
        }
    }

    /// Record header rendering, e.g. `3 (Normal)`.
    pub fn header_value(self) -> String {
        format!("{} ({})", self.rank(), self.display_name())
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Resolved author identity for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
    /// Present only when a VCS backend reported one.
    pub revision: Option<String>,
}

/// Input for encoding a freshly authored item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    /// Single-line summary. Line breaks are folded to spaces on encode.
    pub subject: String,
    /// Free text, already passed through comment stripping.
    pub body: String,
    pub author_name: String,
    pub author_email: String,
    pub priority: Priority,
    pub revision: Option<String>,
    pub created_at: DateTime<FixedOffset>,
}

/// Decoded todo record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub subject: String,
    pub body: String,
    pub author_name: String,
    pub author_email: String,
    pub priority: Priority,
    pub created_at: DateTime<FixedOffset>,
    pub revision: Option<String>,
    pub message_id: String,
}

impl Item {
    /// Author rendered as `Name <email>`.
    pub fn author(&self) -> String {
        if self.author_name.is_empty() {
            format!("<{}>", self.author_email)
        } else {
            format!("{} <{}>", self.author_name, self.author_email)
        }
    }

    /// Case-insensitive match of every term against subject or body.
    pub fn matches_terms(&self, terms: &[String]) -> bool {
        let subject = self.subject.to_lowercase();
        let body = self.body.to_lowercase();
        terms.iter().all(|term| {
            let term = term.to_lowercase();
            subject.contains(&term) || body.contains(&term)
        })
    }
}
