use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LibrisError, Result};
use crate::models::Book;
use crate::storage::migrations::{self, SchemaError, CURRENT_VERSION};

/// On-disk envelope, current schema.
#[derive(Serialize)]
struct LibraryFileRef<'a> {
    version: u32,
    books: &'a [Book],
}

#[derive(Deserialize)]
struct LibraryFile {
    books: Vec<Book>,
}

/// The whole collection as one JSON file.
///
/// Every save rewrites the file. With atomic writes on (the default) the
/// new content goes to a temp file in the same directory which is then
/// renamed over the target.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
    atomic: bool,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            atomic: true,
        }
    }

    pub fn with_atomic_writes(mut self, atomic: bool) -> Self {
        self.atomic = atomic;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load all books, upgrading older layouts on the way in.
    ///
    /// A missing file is an empty library.
    pub fn load(&self) -> Result<Vec<Book>> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "library file not found, starting empty");
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&self.path)?;
        let raw: serde_json::Value =
            serde_json::from_str(&contents).map_err(|e| LibrisError::corrupt(&self.path, e))?;

        let upgraded = migrations::upgrade(raw).map_err(|e| match e {
            SchemaError::Malformed(msg) => LibrisError::corrupt(&self.path, msg),
            SchemaError::TooNew { found, supported } => {
                LibrisError::UnsupportedSchema { found, supported }
            }
        })?;
        if !upgraded.applied.is_empty() {
            tracing::info!(
                path = %self.path.display(),
                from = upgraded.from_version,
                to = CURRENT_VERSION,
                "library file upgraded in memory; it is rewritten on the next save"
            );
        }

        let file: LibraryFile = serde_json::from_value(upgraded.document)
            .map_err(|e| LibrisError::corrupt(&self.path, e))?;

        tracing::debug!(path = %self.path.display(), count = file.books.len(), "loaded library");
        Ok(file.books)
    }

    /// Replace the file with `books`.
    ///
    /// An existing file keeps its permissions across an atomic replace.
    pub fn save(&self, books: &[Book]) -> Result<()> {
        let bytes = encode(books)?;
        let dir = self.parent_dir();
        fs::create_dir_all(dir)?;

        if self.atomic {
            let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
            tmp.write_all(&bytes)?;
            tmp.as_file().sync_all()?;
            if let Ok(meta) = fs::metadata(&self.path) {
                tmp.as_file().set_permissions(meta.permissions())?;
            }
            tmp.persist(&self.path).map_err(|e| e.error)?;
        } else {
            fs::write(&self.path, &bytes)?;
        }

        tracing::debug!(path = %self.path.display(), count = books.len(), "saved library");
        Ok(())
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

/// Pretty JSON with 4-space indentation.
fn encode(books: &[Book]) -> Result<Vec<u8>> {
    let file = LibraryFileRef {
        version: CURRENT_VERSION,
        books,
    };
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    file.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}
