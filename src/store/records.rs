//! CSV record collections
//!
//! Both the primary users collection and the discovered followers collection
//! are CSV files with a header row. Only the `user_id` column is consumed;
//! any other column is ignored.

use crate::store::traits::{RecordSink, StoreError, StoreResult};
use crate::Identifier;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Name of the identifier column
pub const USER_ID_FIELD: &str = "user_id";

#[derive(Debug, Deserialize)]
struct UserRecord {
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct UserRow<'a> {
    user_id: &'a str,
}

/// Reads every non-empty `user_id` of a collection in file order
///
/// Returns an empty list when the file does not exist. Rows are read
/// flexibly: a short row lacking the `user_id` field is skipped, not
/// rejected. Unreadable bytes (I/O errors, invalid UTF-8) are still errors.
fn read_identifiers(path: &Path) -> StoreResult<Vec<Identifier>> {
    if !path.exists() {
        tracing::debug!("Collection {} does not exist yet", path.display());
        return Ok(Vec::new());
    }

    let read_error = |source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(read_error)?;
    let mut identifiers = Vec::new();

    for (index, record) in reader.deserialize::<UserRecord>().enumerate() {
        let record = record.map_err(read_error)?;
        match record.user_id {
            Some(user_id) if !user_id.is_empty() => identifiers.push(user_id),
            _ => tracing::trace!("Skipping record {} without user_id", index + 1),
        }
    }

    Ok(identifiers)
}

/// Loads the set of identifiers recorded in a collection
///
/// # Arguments
///
/// * `path` - Path to the CSV collection
///
/// # Returns
///
/// * `Ok(HashSet)` - All identifiers, empty if the file does not exist
/// * `Err(StoreError)` - The file could not be read or is malformed
pub fn load_existing(path: &Path) -> StoreResult<HashSet<Identifier>> {
    Ok(read_identifiers(path)?.into_iter().collect())
}

/// Loads the ordered seed list from the primary collection
///
/// Keeps file order; a repeated identifier keeps its first position.
/// Identifiers with no path segment (such as `/`) cannot name a following
/// list and are dropped.
pub fn load_seed_list(path: &Path) -> StoreResult<Vec<Identifier>> {
    let mut seen = HashSet::new();
    Ok(read_identifiers(path)?
        .into_iter()
        .filter(|id| {
            let crawlable = !id.trim().trim_matches('/').trim().is_empty();
            if !crawlable {
                tracing::warn!("Ignoring seed {:?} without a user segment", id);
            }
            crawlable
        })
        .filter(|id| seen.insert(id.clone()))
        .collect())
}

/// Combines two identifier sets into one known set
pub fn union(mut a: HashSet<Identifier>, b: HashSet<Identifier>) -> HashSet<Identifier> {
    a.extend(b);
    a
}

/// Append-only writer for the discovered followers collection
pub struct FollowerLog {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl FollowerLog {
    /// Opens the collection for appending
    ///
    /// Missing parent directories are created. The header row is written when
    /// the file is new or empty. If a previous run died mid-record, the
    /// dangling line is terminated so the next row starts on its own line.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let existing_len = match fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        if existing_len > 0 && !ends_with_newline(path)? {
            tracing::warn!(
                "Collection {} ends with a partial record, starting a new line",
                path.display()
            );
            file.write_all(b"\n")?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if existing_len == 0 {
            writer
                .write_record([USER_ID_FIELD])
                .map_err(|source| StoreError::Write {
                    path: path.to_path_buf(),
                    source,
                })?;
            writer.flush()?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            writer,
        })
    }

    /// Location of the collection
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for FollowerLog {
    fn append(&mut self, identifier: &str) -> StoreResult<()> {
        self.writer
            .serialize(UserRow {
                user_id: identifier,
            })
            .map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })?;
        self.writer.flush()?;
        Ok(())
    }
}

fn ends_with_newline(path: &Path) -> StoreResult<bool> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
