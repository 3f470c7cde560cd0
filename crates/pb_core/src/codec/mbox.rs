//! mboxrd record encoding and decoding.
//!
//! # Responsibility
//! - Render one item as a From_ line, mail headers and a body.
//! - Split a container into messages and parse them back into items.
//!
//! # Invariants
//! - Body lines matching `^>*From ` gain one `>` on encode and lose one on
//!   decode, so an unquoted `From ` line always starts a new message.
//! - Every record ends with a blank separator line.
//! - Header values are single-line; line breaks are folded to spaces.

use crate::codec::filename::subject_to_token;
use crate::codec::{CodecError, CodecResult, EncodedItem};
use crate::identity::local::hostname;
use crate::model::item::{Item, NewItem, Priority};
use crate::resolve::priority::normalize;
use chrono::DateTime;
use once_cell::sync::Lazy;
use regex::Regex;

pub const HEAD_FROM: &str = "From";
pub const HEAD_SUBJECT: &str = "Subject";
pub const HEAD_DATE: &str = "Date";
pub const HEAD_MSG_ID: &str = "Message-ID";
pub const HEAD_PRIORITY: &str = "X-Priority";
pub const HEAD_REVISION: &str = "X-Revision";

const ENVELOPE_PREFIX: &str = "From ";
const ENVELOPE_DATE_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

static ADDRESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*(?:"((?:[^"\\]|\\.)*)"|([^<"]*?))\s*<\s*([^>]*?)\s*>\s*$"#)
        .expect("valid address regex")
});
static SPECIALS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\]\[\\()<>@,:;".]"#).expect("valid specials regex"));
static QUOTED_FROM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^>*From ").expect("valid quoted-from regex"));

/// Encodes a new item into a fresh filename token and an mbox record.
pub fn encode(item: &NewItem) -> EncodedItem {
    let subject = single_line(&item.subject);
    let filename = subject_to_token(&subject);
    let message_id = make_message_id(&subject, item.created_at.timestamp());

    let mut record = format!(
        "{ENVELOPE_PREFIX}{} {}\n",
        envelope_sender(&item.author_email),
        item.created_at.format(ENVELOPE_DATE_FORMAT)
    );
    push_header(&mut record, "MIME-Version", "1.0");
    push_header(&mut record, "Content-Type", "text/plain; charset=\"utf-8\"");
    push_header(&mut record, "Content-Transfer-Encoding", "8bit");
    push_header(
        &mut record,
        HEAD_FROM,
        &format_address(&single_line(&item.author_name), &single_line(&item.author_email)),
    );
    push_header(&mut record, HEAD_SUBJECT, &subject);
    push_header(&mut record, HEAD_DATE, &item.created_at.to_rfc2822());
    push_header(&mut record, HEAD_MSG_ID, &message_id);
    push_header(&mut record, HEAD_PRIORITY, &item.priority.header_value());
    if let Some(revision) = normalized_revision(item.revision.as_deref()) {
        push_header(&mut record, HEAD_REVISION, &revision);
    }
    record.push('\n');

    for line in item.body.split('\n') {
        if QUOTED_FROM_RE.is_match(line) {
            record.push('>');
        }
        record.push_str(line);
        record.push('\n');
    }
    record.push('\n');

    EncodedItem {
        filename,
        message_id,
        record: record.into_bytes(),
    }
}

/// Decodes the first message of `record`.
pub fn decode(record: &[u8]) -> CodecResult<Item> {
    let text = String::from_utf8_lossy(record);
    let first = split_messages(&text)
        .into_iter()
        .next()
        .ok_or(CodecError::Empty)?;
    parse_message(first)
}

/// Decodes every message of a container, in file order.
pub fn decode_container(bytes: &[u8]) -> CodecResult<Vec<Item>> {
    let text = String::from_utf8_lossy(bytes);
    split_messages(&text)
        .into_iter()
        .map(parse_message)
        .collect()
}

/// Revision as it is written to, and read back from, the header.
pub fn normalized_revision(revision: Option<&str>) -> Option<String> {
    revision
        .map(|value| single_line(value).trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Renders `name <email>`, quoting names with RFC 5322 specials or with
/// outer whitespace.
pub fn format_address(name: &str, email: &str) -> String {
    if name.is_empty() {
        return email.to_string();
    }
    if SPECIALS_RE.is_match(name) || name.trim() != name {
        let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{escaped}\" <{email}>")
    } else {
        format!("{name} <{email}>")
    }
}

/// Parses `name <email>`, `"quoted name" <email>` or a bare address.
pub fn parse_address(value: &str) -> (String, String) {
    match ADDRESS_RE.captures(value) {
        Some(caps) => {
            let name = match (caps.get(1), caps.get(2)) {
                (Some(quoted), _) => unescape_quoted(quoted.as_str()),
                (None, Some(plain)) => plain.as_str().trim().to_string(),
                (None, None) => String::new(),
            };
            let email = caps.get(3).map_or("", |m| m.as_str()).to_string();
            (name, email)
        }
        None => (String::new(), value.trim().to_string()),
    }
}

fn push_header(record: &mut String, name: &str, value: &str) {
    record.push_str(name);
    record.push_str(": ");
    record.push_str(value);
    record.push('\n');
}

fn single_line(value: &str) -> String {
    value
        .split(['\r', '\n'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn envelope_sender(email: &str) -> String {
    let compact: String = email.split_whitespace().collect();
    if compact.is_empty() {
        "MAILER-DAEMON".to_string()
    } else {
        compact
    }
}

fn make_message_id(subject: &str, unix_secs: i64) -> String {
    format!(
        "<{unix_secs}.{}.{}@{}>",
        std::process::id(),
        subject_to_token(subject),
        hostname()
    )
}

fn unescape_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Splits mbox text into message chunks, each without its From_ line.
///
/// Text with no From_ line at all is treated as one bare message.
fn split_messages(text: &str) -> Vec<&str> {
    let mut bounds: Vec<(usize, usize)> = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.starts_with(ENVELOPE_PREFIX) {
            bounds.push((offset, offset + line.len()));
        }
        offset += line.len();
    }

    if bounds.is_empty() {
        return if text.trim().is_empty() {
            Vec::new()
        } else {
            vec![text]
        };
    }

    bounds
        .iter()
        .enumerate()
        .map(|(index, &(_, content_start))| {
            let end = bounds
                .get(index + 1)
                .map_or(text.len(), |&(next_envelope, _)| next_envelope);
            &text[content_start..end]
        })
        .collect()
}

fn parse_message(chunk: &str) -> CodecResult<Item> {
    let mut headers: Vec<(String, String)> = Vec::new();
    let mut body_start = chunk.len();
    let mut offset = 0;

    for line in chunk.split_inclusive('\n') {
        offset += line.len();
        let bare = line.trim_end_matches(['\n', '\r']);
        if bare.is_empty() {
            body_start = offset;
            break;
        }
        if bare.starts_with([' ', '\t']) {
            if let Some((_, value)) = headers.last_mut() {
                value.push(' ');
                value.push_str(bare.trim());
            }
            continue;
        }
        if let Some((name, value)) = bare.split_once(':') {
            let value = value.strip_prefix(' ').unwrap_or(value);
            headers.push((name.trim().to_string(), value.to_string()));
        }
    }

    let header = |name: &str| find_header(&headers, name);

    let subject = header(HEAD_SUBJECT).ok_or(CodecError::MissingHeader(HEAD_SUBJECT))?;
    let from = header(HEAD_FROM).ok_or(CodecError::MissingHeader(HEAD_FROM))?;
    let (author_name, author_email) = parse_address(from);

    let date = header(HEAD_DATE).ok_or(CodecError::MissingHeader(HEAD_DATE))?;
    let created_at =
        DateTime::parse_from_rfc2822(date.trim()).map_err(|_| CodecError::InvalidHeader {
            name: HEAD_DATE,
            value: date.to_string(),
        })?;

    let message_id = header(HEAD_MSG_ID)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(CodecError::MissingHeader(HEAD_MSG_ID))?;

    let priority = header(HEAD_PRIORITY)
        .and_then(|value| value.split_whitespace().next())
        .map(|rank| normalize(rank, true).unwrap_or_default())
        .unwrap_or(Priority::Normal);

    let revision = normalized_revision(header(HEAD_REVISION));

    Ok(Item {
        subject: subject.to_string(),
        body: decode_body(&chunk[body_start..]),
        author_name,
        author_email,
        priority,
        created_at,
        revision,
        message_id: message_id.to_string(),
    })
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

fn decode_body(raw: &str) -> String {
    let mut raw = raw;
    for _ in 0..2 {
        raw = raw.strip_suffix('\n').unwrap_or(raw);
    }
    raw.split('\n')
        .map(|line| {
            if line.starts_with('>') && QUOTED_FROM_RE.is_match(line) {
                &line[1..]
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
