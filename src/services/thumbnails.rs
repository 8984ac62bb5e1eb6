use anyhow::{bail, Result};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

pub const THUMBNAIL_DIR: &str = "thumbnails";

/// URL prefix under which the upload directory is served.
pub const PUBLIC_PREFIX: &str = "storage";

/// Local-disk storage for post thumbnails.
#[derive(Debug, Clone)]
pub struct ThumbnailStore {
    root: PathBuf,
}

impl ThumbnailStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Writes an image and returns its path relative to the store root.
    pub fn store(&self, data: &[u8]) -> Result<String> {
        let Some(kind) = infer::get(data).filter(|k| k.matcher_type() == infer::MatcherType::Image)
        else {
            bail!("Refusing to store a thumbnail that is not an image");
        };

        let dir = self.root.join(THUMBNAIL_DIR);
        std::fs::create_dir_all(&dir)?;

        let filename = format!("{}.{}", Uuid::new_v4(), kind.extension());
        std::fs::write(dir.join(&filename), data)?;

        let relative = format!("{}/{}", THUMBNAIL_DIR, filename);
        tracing::debug!(path = %relative, bytes = data.len(), "Stored thumbnail");
        Ok(relative)
    }

    /// Best-effort removal. A file that is already gone counts as removed;
    /// any other failure is logged and reported as `false`.
    pub fn remove(&self, relative: &str) -> bool {
        let Some(path) = self.resolve(relative) else {
            tracing::warn!(path = relative, "Refusing to remove thumbnail outside storage root");
            return false;
        };

        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(path = relative, "Removed thumbnail");
                true
            }
            Err(e) if e.kind() == ErrorKind::NotFound => true,
            Err(e) => {
                tracing::warn!(path = relative, error = %e, "Failed to remove thumbnail");
                false
            }
        }
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.resolve(relative).is_some_and(|p| p.is_file())
    }

    fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let rel = Path::new(relative);
        let safe = !relative.is_empty()
            && rel
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        safe.then(|| self.root.join(rel))
    }
}

/// Absolute public URL for a stored thumbnail.
pub fn thumbnail_url(base_url: &str, relative: &str) -> String {
    format!(
        "{}/{}/{}",
        base_url.trim_end_matches('/'),
        PUBLIC_PREFIX,
        relative.trim_start_matches('/')
    )
}

/// Whether the bytes look like an image, judged by their magic number.
pub fn is_image(data: &[u8]) -> bool {
    infer::is_image(data)
}
