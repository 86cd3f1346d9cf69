//! Attachment directory management
//!
//! Uploads are written under a request-unique temporary name inside the
//! attachments directory and renamed to their final name once the request
//! has been validated. A staged file that is never committed is removed
//! when it is dropped.

use std::path::{Component, Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

/// Attachment storage error type
#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for attachment operations
pub type AttachmentResult<T> = Result<T, AttachmentError>;

/// The fixed directory attachments are sent from
#[derive(Debug, Clone)]
pub struct AttachmentStore {
    dir: PathBuf,
}

impl AttachmentStore {
    /// Create a store rooted at `dir`.
    ///
    /// A relative `dir` is anchored at the current working directory so
    /// that resolved paths mean the same thing to the messaging client.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let dir = match std::path::absolute(&dir) {
            Ok(absolute) => absolute,
            Err(e) => {
                warn!("Cannot make {:?} absolute: {}", dir, e);
                dir
            }
        };
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the directory if it does not exist yet
    pub async fn ensure_dir(&self) -> AttachmentResult<()> {
        fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Resolve a client-supplied local attachment name.
    ///
    /// A bare file name is looked up inside the directory. A name with a
    /// directory part is accepted only when that part is the directory
    /// itself. Returns `None` for anything else.
    pub fn resolve(&self, filename: &str) -> Option<PathBuf> {
        let path = Path::new(filename);
        let name = sanitize_filename(filename)?;

        match path.parent() {
            None => Some(self.dir.join(name)),
            Some(parent) if parent.as_os_str().is_empty() => Some(self.dir.join(name)),
            Some(parent) if parent == self.dir => Some(path.to_path_buf()),
            Some(_) => None,
        }
    }

    /// Open a new staging file for an upload
    pub async fn stage(&self) -> AttachmentResult<StagedUpload> {
        self.ensure_dir().await?;

        let path = self.dir.join(format!(".upload-{}", Uuid::new_v4()));
        let file = fs::File::create(&path).await?;
        debug!("Staging upload at {:?}", path);

        Ok(StagedUpload {
            path,
            file: Some(file),
            size: 0,
            committed: false,
        })
    }

    /// Move a staged upload to `<dir>/<filename>`, replacing any existing file
    pub async fn commit(
        &self,
        mut staged: StagedUpload,
        filename: &str,
    ) -> AttachmentResult<PathBuf> {
        if let Some(mut file) = staged.file.take() {
            file.flush().await?;
        }

        let destination = self.dir.join(filename);
        match fs::remove_file(&destination).await {
            Ok(()) => debug!("Replaced existing attachment {:?}", destination),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        fs::rename(&staged.path, &destination).await?;
        staged.committed = true;

        debug!(
            "Stored attachment {:?} ({} bytes)",
            destination, staged.size
        );
        Ok(destination)
    }
}

/// Upload being written to a temporary file
#[derive(Debug)]
pub struct StagedUpload {
    path: PathBuf,
    file: Option<fs::File>,
    size: usize,
    committed: bool,
}

impl StagedUpload {
    /// Append a chunk of the upload
    pub async fn write(&mut self, chunk: &[u8]) -> AttachmentResult<()> {
        if let Some(file) = self.file.as_mut() {
            file.write_all(chunk).await?;
            self.size += chunk.len();
        }
        Ok(())
    }

    /// Bytes written so far
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        self.file.take();
        if let Err(e) = std::fs::remove_file(&self.path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!("Failed to remove staged upload {:?}: {}", self.path, e);
        }
    }
}

/// Reduce a client-supplied name to its final path component.
///
/// Both `/` and `\` count as separators. Returns `None` when nothing
/// usable is left (`""`, `.`, `..`).
pub fn sanitize_filename(name: &str) -> Option<String> {
    let last = name.rsplit(['/', '\\']).next().unwrap_or("").trim();
    let mut components = Path::new(last).components();

    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) => Some(part.to_string_lossy().into_owned()),
        _ => None,
    }
}
