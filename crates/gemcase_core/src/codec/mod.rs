//! Project file codec.
//!
//! # Responsibility
//! - Serialize the item store to a `.mdat` project file and read it back.
//! - Validate snapshot integrity (format version, id uniqueness, allocator
//!   position) before installing loaded data.
//!
//! # Invariants
//! - The id allocator position is part of the document, so ids are never
//!   reused across a save/load cycle.
//! - A load into an existing store replaces everything in one step and
//!   raises a single `Reset` notification.

use crate::model::item::Item;
use crate::store::ItemStore;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Conventional project file extension.
pub const PROJECT_EXTENSION: &str = "mdat";

const FORMAT_VERSION: u32 = 1;

pub type CodecResult<T> = Result<T, CodecError>;

/// Failures raised by project save/load.
#[derive(Debug)]
pub enum CodecError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    /// The file was written by a newer format revision.
    UnsupportedFormat { found: u32, supported: u32 },
    /// The document parsed but violates snapshot integrity rules.
    Corrupt(String),
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "project file i/o failed: {err}"),
            Self::Parse(err) => write!(f, "project file is not readable: {err}"),
            Self::UnsupportedFormat { found, supported } => write!(
                f,
                "project format revision {found} is newer than supported revision {supported}"
            ),
            Self::Corrupt(message) => write!(f, "corrupt project file: {message}"),
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::UnsupportedFormat { .. } | Self::Corrupt(_) => None,
        }
    }
}

impl From<std::io::Error> for CodecError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

#[derive(Serialize, Deserialize)]
struct ProjectDocument {
    format: u32,
    next_id: u64,
    items: Vec<Item>,
}

/// Writes the whole item set to `path`, overwriting any existing file.
pub fn save(store: &ItemStore, path: impl AsRef<Path>) -> CodecResult<()> {
    let path = path.as_ref();
    info!(
        "event=project_save module=codec status=start path={} items={}",
        path.display(),
        store.len()
    );

    let document = ProjectDocument {
        format: FORMAT_VERSION,
        next_id: store.next_id(),
        items: store.items().to_vec(),
    };

    let result = (|| -> CodecResult<()> {
        let file = fs::File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &document)?;
        writer.flush()?;
        Ok(())
    })();

    match &result {
        Ok(()) => info!(
            "event=project_save module=codec status=ok path={}",
            path.display()
        ),
        Err(err) => error!(
            "event=project_save module=codec status=error path={} error={err}",
            path.display()
        ),
    }
    result
}

fn read_document(path: &Path) -> CodecResult<ProjectDocument> {
    let file = fs::File::open(path)?;
    let document: ProjectDocument = serde_json::from_reader(BufReader::new(file))?;
    if document.format > FORMAT_VERSION {
        return Err(CodecError::UnsupportedFormat {
            found: document.format,
            supported: FORMAT_VERSION,
        });
    }
    let mut seen = HashSet::new();
    for item in &document.items {
        if !seen.insert(item.id) {
            return Err(CodecError::Corrupt(format!("duplicate item id {}", item.id)));
        }
        if item.id.0 >= document.next_id {
            return Err(CodecError::Corrupt(format!(
                "item id {} is not below the allocator position {}",
                item.id, document.next_id
            )));
        }
    }
    Ok(document)
}

/// Reads a project file into a fresh store.
pub fn load(path: impl AsRef<Path>) -> CodecResult<ItemStore> {
    let path = path.as_ref();
    match read_document(path) {
        Ok(document) => {
            info!(
                "event=project_load module=codec status=ok path={} items={}",
                path.display(),
                document.items.len()
            );
            Ok(ItemStore::from_parts(document.items, document.next_id))
        }
        Err(err) => {
            error!(
                "event=project_load module=codec status=error path={} error={err}",
                path.display()
            );
            Err(err)
        }
    }
}

/// Reads a project file into an existing store, replacing its contents.
///
/// Observers keep their subscriptions and receive one `Reset`.
pub fn load_into(store: &mut ItemStore, path: impl AsRef<Path>) -> CodecResult<()> {
    let path = path.as_ref();
    let document = read_document(path)?;
    info!(
        "event=project_load module=codec status=ok path={} items={} mode=replace",
        path.display(),
        document.items.len()
    );
    store.replace_all(document.items, document.next_id);
    Ok(())
}
