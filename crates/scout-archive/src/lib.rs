//! Reading deploy archives (JARs) and exploded class directories.
//!
//! Binary targets package their transitive classes into a single deploy
//! archive. Resolution only needs best-effort entry lookups, so this crate
//! exposes a thin reader over either a zip file or an unpacked output
//! directory.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use zip::ZipArchive;

/// Maps a fully-qualified class name to its expected archive entry path.
///
/// Inner classes keep their `$` separators: `com.x.Foo$Inner` maps to
/// `com/x/Foo$Inner.class`.
pub fn class_entry_path(fqcn: &str) -> String {
    format!("{}.class", fqcn.replace('.', "/"))
}

/// A class file located inside a deploy archive or exploded directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLocation {
    pub archive: PathBuf,
    pub entry: String,
}

impl ClassLocation {
    pub fn new(archive: impl Into<PathBuf>, entry: impl Into<String>) -> Self {
        Self {
            archive: archive.into(),
            entry: entry.into(),
        }
    }

    /// Read the located class file.
    ///
    /// Returns `Ok(None)` when the entry has disappeared since it was located.
    pub fn read(&self) -> anyhow::Result<Option<Vec<u8>>> {
        Archive::new(&self.archive).read(&self.entry)
    }
}

#[derive(Clone, Debug)]
pub struct Archive {
    path: PathBuf,
}

impl Archive {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the archive contains an entry named `name`.
    pub fn contains(&self, name: &str) -> anyhow::Result<bool> {
        if self.path.is_dir() {
            return Ok(self.path.join(name).is_file());
        }

        let mut zip = self.open_zip()?;
        let result = match zip.by_name(name) {
            Ok(_) => Ok(true),
            Err(zip::result::ZipError::FileNotFound) => Ok(false),
            Err(err) => Err(err).with_context(|| {
                format!("failed to look up {} in zip {}", name, self.path.display())
            }),
        };
        result
    }

    /// Read a file from the archive.
    ///
    /// Returns `Ok(None)` when the file isn't present.
    pub fn read(&self, name: &str) -> anyhow::Result<Option<Vec<u8>>> {
        if self.path.is_dir() {
            let candidate = self.path.join(name);
            if !candidate.exists() {
                return Ok(None);
            }
            let mut buf = Vec::new();
            File::open(&candidate)
                .with_context(|| format!("failed to open {}", candidate.display()))?
                .read_to_end(&mut buf)
                .with_context(|| format!("failed to read {}", candidate.display()))?;
            return Ok(Some(buf));
        }

        let mut zip = self.open_zip()?;
        let result = match zip.by_name(name) {
            Ok(mut entry) => {
                let mut buf = Vec::new();
                entry.read_to_end(&mut buf).with_context(|| {
                    format!("failed to read {} from {}", name, self.path.display())
                })?;
                Ok(Some(buf))
            }
            Err(zip::result::ZipError::FileNotFound) => Ok(None),
            Err(err) => Err(err).with_context(|| {
                format!("failed to read {} from zip {}", name, self.path.display())
            }),
        };
        result
    }

    fn open_zip(&self) -> anyhow::Result<ZipArchive<File>> {
        let file = File::open(&self.path)
            .with_context(|| format!("failed to open archive {}", self.path.display()))?;
        ZipArchive::new(file)
            .with_context(|| format!("failed to read zip {}", self.path.display()))
    }
}
