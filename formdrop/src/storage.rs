//! Upload storage: target directory resolution, filename sanitizing and streamed writes.
//!
//! All uploads land beneath a single canonical storage root. A request either names a directory
//! (the route's path info) or gets the configured default; in both cases the directory is created
//! on demand and re-checked after canonicalization so a symlink cannot move it outside the root.
//!
//! Writes go to a hidden temporary file in the target directory and are renamed over the final
//! name once the body has been fully streamed and flushed. A failed upload therefore never leaves
//! a half-written file under the client's name, and concurrent uploads of the same name resolve to
//! whichever rename happens last.

use bytes::Bytes;
use futures::{Stream, StreamExt, pin_mut};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::errors::{Error, Result};

/// Returns the final component of a client-supplied filename.
///
/// Both `/` and `\` are treated as separators, so `C:\photos\cat.jpg` and `../../cat.jpg` both
/// yield `cat.jpg`. Returns `None` when nothing usable is left (`""`, `"."`, `".."`, a trailing
/// separator) or when the name contains NUL.
pub fn sanitize_filename(name: &str) -> Option<&str> {
    let base = name.rsplit(['/', '\\']).next()?;
    match base {
        "" | "." | ".." => None,
        b if b.contains('\0') => None,
        b => Some(b),
    }
}

/// True when `path` is non-empty and made only of normal segments (no root, `..` or `.`).
pub fn is_plain_relative(path: &Path) -> bool {
    let mut components = path.components().peekable();
    components.peek().is_some() && components.all(|c| matches!(c, Component::Normal(_)))
}

/// Shared storage handle, built once at startup.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
    default_dir: PathBuf,
    public_path: String,
    write_buffer_size: usize,
}

/// A directory that exists on disk and has been verified to lie within the storage root.
#[derive(Debug, Clone)]
pub struct TargetDirectory {
    /// Path relative to the storage root, as used in public URLs
    relative: PathBuf,
    canonical: PathBuf,
}

/// A file that has been completely written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Sanitized basename
    pub name: String,
    /// Canonical location on disk
    pub path: PathBuf,
    /// URL path under which the file is served
    pub url: String,
    pub bytes: u64,
}

impl Storage {
    /// Create the storage root if needed and pin it to its canonical path.
    pub fn new(config: &StorageConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.root).map_err(|e| Error::storage("create storage root", &config.root, e))?;
        let root = std::fs::canonicalize(&config.root).map_err(|e| Error::storage("resolve storage root", &config.root, e))?;

        info!(root = %root.display(), default_dir = %config.default_dir.display(), "Upload storage ready");

        Ok(Self {
            root,
            default_dir: config.default_dir.clone(),
            public_path: config.public_path.trim_end_matches('/').to_string(),
            write_buffer_size: config.write_buffer_size,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve (and create) the directory an upload should be written to.
    ///
    /// `requested` is the path info supplied with the request. `None`, or a value that is empty
    /// once surrounding slashes are trimmed, selects the default directory.
    #[instrument(skip(self), err)]
    pub async fn target_directory(&self, requested: Option<&str>) -> Result<TargetDirectory> {
        let relative = match requested.map(|r| r.trim_matches('/')).filter(|r| !r.is_empty()) {
            Some(requested) => {
                let candidate = PathBuf::from(requested);
                if requested.contains('\0') || !is_plain_relative(&candidate) {
                    return Err(Error::PathEscape {
                        name: requested.to_string(),
                    });
                }
                candidate
            }
            None => self.default_dir.clone(),
        };

        let path = self.root.join(&relative);
        fs::create_dir_all(&path)
            .await
            .map_err(|e| Error::storage("create upload directory", &path, e))?;

        let canonical = fs::canonicalize(&path)
            .await
            .map_err(|e| Error::storage("resolve upload directory", &path, e))?;

        if !canonical.starts_with(&self.root) {
            return Err(Error::PathEscape {
                name: relative.display().to_string(),
            });
        }

        debug!(directory = %canonical.display(), "Resolved upload directory");
        Ok(TargetDirectory { relative, canonical })
    }

    /// Stream `chunks` into `target` under the sanitized form of `filename`.
    ///
    /// Errors yielded by the stream are client errors (a broken multipart body); anything that
    /// goes wrong on disk is a storage error. Either way the temporary file is removed.
    #[instrument(skip(self, target, chunks), fields(directory = %target.canonical.display()), err)]
    pub async fn store<S, E>(&self, target: &TargetDirectory, filename: &str, chunks: S) -> Result<StoredFile>
    where
        S: Stream<Item = std::result::Result<Bytes, E>>,
        E: std::fmt::Display,
    {
        let name = sanitize_filename(filename).ok_or_else(|| Error::PathEscape {
            name: filename.to_string(),
        })?;
        let destination = target.resolve(name).await?;

        let partial = target.canonical.join(format!(".formdrop-{}.part", Uuid::new_v4()));
        let written = match self.write_chunks(&partial, chunks).await {
            Ok(written) => written,
            Err(e) => {
                discard(&partial).await;
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&partial, &destination).await {
            discard(&partial).await;
            return Err(Error::storage("move upload into place", &destination, e));
        }

        info!(file = name, bytes = written, "Stored upload");

        Ok(StoredFile {
            name: name.to_string(),
            url: target.url_for(&self.public_path, name),
            path: destination,
            bytes: written,
        })
    }

    async fn write_chunks<S, E>(&self, path: &Path, chunks: S) -> Result<u64>
    where
        S: Stream<Item = std::result::Result<Bytes, E>>,
        E: std::fmt::Display,
    {
        let file = fs::File::create(path)
            .await
            .map_err(|e| Error::storage("create upload file", path, e))?;
        let mut writer = BufWriter::with_capacity(self.write_buffer_size, file);

        pin_mut!(chunks);
        let mut written = 0u64;
        let mut chunk_number = 0u64;

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(|e| Error::BadRequest {
                message: format!("Failed to read file chunk: {e}"),
            })?;
            chunk_number += 1;
            written += chunk.len() as u64;

            debug!(chunk_number, chunk_size = chunk.len(), total_size = written, "Writing chunk");

            writer
                .write_all(&chunk)
                .await
                .map_err(|e| Error::storage("write upload", path, e))?;
        }

        writer.flush().await.map_err(|e| Error::storage("write upload", path, e))?;
        writer
            .into_inner()
            .sync_all()
            .await
            .map_err(|e| Error::storage("sync upload", path, e))?;

        Ok(written)
    }
}

impl TargetDirectory {
    #[cfg(test)]
    pub(crate) fn relative(&self) -> &Path {
        &self.relative
    }

    #[cfg(test)]
    pub(crate) fn canonical(&self) -> &Path {
        &self.canonical
    }

    /// Join a sanitized name onto this directory and confirm the result stays inside it.
    ///
    /// An existing entry is canonicalized as-is, so a symlink planted in the directory that points
    /// elsewhere is caught. A missing entry is resolved through its parent.
    async fn resolve(&self, name: &str) -> Result<PathBuf> {
        let candidate = self.canonical.join(name);

        let resolved = match fs::canonicalize(&candidate).await {
            Ok(resolved) => resolved,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let parent = candidate.parent().unwrap_or(&self.canonical);
                let parent = fs::canonicalize(parent)
                    .await
                    .map_err(|e| Error::storage("resolve upload path", parent, e))?;
                match candidate.file_name() {
                    Some(file_name) => parent.join(file_name),
                    None => return Err(Error::PathEscape { name: name.to_string() }),
                }
            }
            Err(e) => return Err(Error::storage("resolve upload path", &candidate, e)),
        };

        if resolved == self.canonical || !resolved.starts_with(&self.canonical) {
            return Err(Error::PathEscape { name: name.to_string() });
        }

        Ok(resolved)
    }

    fn url_for(&self, public_path: &str, name: &str) -> String {
        let mut url = public_path.to_string();
        for segment in self.relative.iter() {
            url.push('/');
            url.push_str(&segment.to_string_lossy());
        }
        url.push('/');
        url.push_str(name);
        url
    }
}

async fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path).await
        && e.kind() != ErrorKind::NotFound
    {
        tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial upload");
    }
}
