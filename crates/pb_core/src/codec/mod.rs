//! Item encoding: filenames, editor bodies and mbox records.
//!
//! # Responsibility
//! - Turn a [`NewItem`](crate::model::item::NewItem) into a unique file
//!   token plus a self-describing mail record.
//! - Decode mail records back into [`Item`](crate::model::item::Item)s.
//!
//! # Invariants
//! - Encode then decode reproduces subject, author, priority, revision and
//!   body exactly.
//! - Filenames and message ids are fresh per encode, even for equal subjects.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod body;
pub mod filename;
pub mod mbox;

pub use body::{compose_template, strip_comments, IGNORE_MARKER};
pub use filename::subject_to_token;
pub use mbox::{decode, decode_container, encode};

/// Encoded item ready for [`Store::append`](crate::store::Store::append).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedItem {
    /// Container file name without suffix.
    pub filename: String,
    /// `Message-ID` header value, angle brackets included.
    pub message_id: String,
    /// Complete mbox record, From_ line through trailing blank line.
    pub record: Vec<u8>,
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Record decoding failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Input holds no message at all.
    Empty,
    MissingHeader(&'static str),
    InvalidHeader { name: &'static str, value: String },
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "record contains no message"),
            Self::MissingHeader(name) => write!(f, "record is missing `{name}` header"),
            Self::InvalidHeader { name, value } => {
                write!(f, "invalid `{name}` header value `{value}`")
            }
        }
    }
}

impl Error for CodecError {}
