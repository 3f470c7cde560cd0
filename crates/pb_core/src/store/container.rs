//! Locked, all-or-nothing writes to mbox containers.
//!
//! # Responsibility
//! - Append one encoded record to a container under an exclusive lock.
//! - Move a container between category directories under the same lock.
//!
//! # Invariants
//! - The lock is released on every exit path via `ContainerLock::drop`.
//! - A failed append truncates the container back to its prior length.
//! - Records are separated by a blank line, as mbox readers expect.

use crate::codec::EncodedItem;
use crate::store::{StoreError, StoreResult};
use fs2::FileExt;
use log::{error, info};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Container file extension.
pub const CONTAINER_SUFFIX: &str = "mbox";

/// Where an appended item landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredLocation {
    pub container: PathBuf,
    pub message_id: String,
}

struct ContainerLock {
    file: File,
}

impl ContainerLock {
    fn acquire(path: &Path, create: bool) -> StoreResult<Self> {
        let file = OpenOptions::new()
            .create(create)
            .read(true)
            .append(true)
            .open(path)
            .map_err(|err| StoreError::io(path, err))?;
        file.lock_exclusive()
            .map_err(|err| StoreError::io(path, err))?;
        Ok(Self { file })
    }
}

impl Drop for ContainerLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// Appends `item` to `<category_path>/<item.filename>.mbox`.
pub fn append(category_path: &Path, item: &EncodedItem) -> StoreResult<StoredLocation> {
    let started_at = Instant::now();
    let container = category_path.join(format!("{}.{CONTAINER_SUFFIX}", item.filename));
    let mut lock = ContainerLock::acquire(&container, true)?;

    match write_record(&mut lock.file, &item.record) {
        Ok(()) => {
            info!(
                "event=item_append module=store status=ok path={} bytes={} duration_ms={}",
                container.display(),
                item.record.len(),
                started_at.elapsed().as_millis()
            );
            Ok(StoredLocation {
                container,
                message_id: item.message_id.clone(),
            })
        }
        Err(err) => {
            error!(
                "event=item_append module=store status=error path={} duration_ms={} error={}",
                container.display(),
                started_at.elapsed().as_millis(),
                err
            );
            Err(StoreError::io(&container, err))
        }
    }
}

/// Moves `container` into `dest_dir`, keeping its file name.
///
/// Fails with [`StoreError::NameCollision`] instead of overwriting.
pub fn move_to(container: &Path, dest_dir: &Path) -> StoreResult<PathBuf> {
    let file_name = container
        .file_name()
        .ok_or_else(|| StoreError::NotFound(container.display().to_string()))?;
    let dest = dest_dir.join(file_name);
    if dest.exists() {
        return Err(StoreError::NameCollision(dest));
    }

    let _lock = ContainerLock::acquire(container, false)?;
    fs::rename(container, &dest).map_err(|err| StoreError::io(&dest, err))?;
    info!(
        "event=item_move module=store status=ok from={} to={}",
        container.display(),
        dest.display()
    );
    Ok(dest)
}

fn write_record(file: &mut File, record: &[u8]) -> std::io::Result<()> {
    let before = file.metadata()?.len();
    let mut payload = Vec::with_capacity(record.len() + 2);
    payload.extend_from_slice(separator_for(file, before)?);
    payload.extend_from_slice(record);

    let written = file.write_all(&payload).and_then(|()| file.sync_data());
    roll_back_on_error(file, before, written)
}

/// Truncates `file` to `before` when `written` failed part way.
fn roll_back_on_error(
    file: &File,
    before: u64,
    written: std::io::Result<()>,
) -> std::io::Result<()> {
    if let Err(err) = written {
        let _ = file.set_len(before);
        return Err(err);
    }
    Ok(())
}

/// Bytes needed so the next record starts after a blank line.
fn separator_for(file: &mut File, len: u64) -> std::io::Result<&'static [u8]> {
    if len == 0 {
        return Ok(b"");
    }
    let tail_len = len.min(2);
    file.seek(SeekFrom::Start(len - tail_len))?;
    let mut tail = Vec::with_capacity(2);
    Read::by_ref(file).take(tail_len).read_to_end(&mut tail)?;
    Ok(match tail.as_slice() {
        b"\n\n" => b"",
        [.., b'\n'] => b"\n",
        _ => b"\n\n",
    })
}

#[cfg(test)]
mod tests {
    use super::{append, roll_back_on_error, write_record, CONTAINER_SUFFIX};
    use crate::codec::EncodedItem;
    use std::fs::{self, OpenOptions};
    use std::io::{self, Write};

    fn encoded(filename: &str, record: &str) -> EncodedItem {
        EncodedItem {
            filename: filename.to_string(),
            message_id: format!("<{filename}@test>"),
            record: record.as_bytes().to_vec(),
        }
    }

    #[test]
    fn second_append_lands_after_blank_line() {
        let temp = tempfile::tempdir().unwrap();
        append(temp.path(), &encoded("Item-1", "From a\n\nfirst\n")).unwrap();
        let location = append(temp.path(), &encoded("Item-1", "From b\n\nsecond\n\n")).unwrap();

        assert_eq!(
            location.container,
            temp.path().join(format!("Item-1.{CONTAINER_SUFFIX}"))
        );
        let content = fs::read_to_string(&location.container).unwrap();
        assert_eq!(content, "From a\n\nfirst\n\nFrom b\n\nsecond\n\n");
    }

    #[test]
    fn append_into_missing_directory_reports_io_error() {
        let temp = tempfile::tempdir().unwrap();
        let missing = temp.path().join("nope");
        let err = append(&missing, &encoded("X", "From a\n\n")).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn failed_write_truncates_partial_record() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join(format!("Item-2.{CONTAINER_SUFFIX}"));
        fs::write(&path, "From a\n\nfirst\n").unwrap();
        let before = fs::metadata(&path).unwrap().len();

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"\nFrom b\n\nsec").unwrap();
        let err = roll_back_on_error(&file, before, Err(io::Error::other("disk full")));

        assert_eq!(err.unwrap_err().to_string(), "disk full");
        assert_eq!(fs::metadata(&path).unwrap().len(), before);
        assert_eq!(fs::read_to_string(&path).unwrap(), "From a\n\nfirst\n");
    }

    #[test]
    fn write_through_read_only_handle_fails_without_growth() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join(format!("Item-3.{CONTAINER_SUFFIX}"));
        fs::write(&path, "From a\n\nfirst\n").unwrap();

        let mut file = OpenOptions::new().read(true).open(&path).unwrap();
        assert!(write_record(&mut file, b"From b\n\nsecond\n").is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "From a\n\nfirst\n");
    }
}
