// src/media.rs

//! Media attached to authored questions.
//!
//! Selecting a file acquires a preview handle from a [`PreviewRegistry`].
//! The handle is released when the attachment is dropped: replacing the
//! file, removing the question, or throwing the draft away all release it.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use uuid::Uuid;

use crate::error::{AppError, FieldErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Audio,
}

impl MediaKind {
    /// Detects the kind from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp" | "svg" => Some(MediaKind::Image),
            "mp3" | "wav" | "ogg" | "m4a" | "aac" | "flac" => Some(MediaKind::Audio),
            _ => None,
        }
    }

    /// Same check for a media reference coming back from the API.
    pub fn from_reference(reference: &str) -> Option<Self> {
        Self::from_path(Path::new(reference))
    }
}

/// Tracks live preview handles.
#[derive(Debug, Default)]
pub struct PreviewRegistry {
    live: Mutex<HashSet<Uuid>>,
}

impl PreviewRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Validates a user-selected file and acquires a preview for it.
    pub fn attach(self: &Arc<Self>, path: impl Into<PathBuf>) -> Result<MediaAttachment, AppError> {
        let path = path.into();

        let mut errors = FieldErrors::new();
        let kind = MediaKind::from_path(&path);
        if kind.is_none() {
            errors.add("media", "Only image or audio files can be attached");
        } else if !path.is_file() {
            errors.add("media", format!("File not found: {}", path.display()));
        }
        errors.into_result()?;

        let id = Uuid::new_v4();
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);
        tracing::debug!("Acquired preview {} for {}", id, path.display());

        Ok(MediaAttachment {
            path,
            kind: kind.unwrap_or(MediaKind::Image),
            preview: PreviewHandle {
                id,
                registry: Arc::downgrade(self),
            },
        })
    }

    pub fn live_count(&self) -> usize {
        self.live.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn release(&self, id: &Uuid) {
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        tracing::debug!("Released preview {}", id);
    }
}

/// Scoped preview; released on drop.
pub struct PreviewHandle {
    id: Uuid,
    registry: Weak<PreviewRegistry>,
}

impl PreviewHandle {
    pub fn uri(&self) -> String {
        format!("blob:quizdesk/{}", self.id)
    }
}

impl fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PreviewHandle").field(&self.id).finish()
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.release(&self.id);
        }
    }
}

/// A local file picked for a question, with its live preview.
#[derive(Debug)]
pub struct MediaAttachment {
    path: PathBuf,
    kind: MediaKind,
    preview: PreviewHandle,
}

impl MediaAttachment {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn preview_uri(&self) -> String {
        self.preview.uri()
    }
}

impl PartialEq for MediaAttachment {
    fn eq(&self, other: &Self) -> bool {
        self.preview.id == other.preview.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(ext: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("quizdesk-{}.{}", Uuid::new_v4(), ext));
        std::fs::write(&path, b"fake media").unwrap();
        path
    }

    #[test]
    fn detects_kind_from_extension() {
        assert_eq!(MediaKind::from_path(Path::new("a/b.PNG")), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_reference("/uploads/x.mp3"), Some(MediaKind::Audio));
        assert_eq!(MediaKind::from_path(Path::new("notes.txt")), None);
        assert_eq!(MediaKind::from_path(Path::new("no_extension")), None);
    }

    #[test]
    fn previews_are_released_on_drop() {
        let registry = PreviewRegistry::new();
        let file = temp_file("jpg");

        let first = registry.attach(&file).unwrap();
        let second = registry.attach(&file).unwrap();
        assert_eq!(registry.live_count(), 2);
        assert_ne!(first.preview_uri(), second.preview_uri());

        drop(first);
        assert_eq!(registry.live_count(), 1);
        drop(second);
        assert_eq!(registry.live_count(), 0);

        std::fs::remove_file(file).ok();
    }

    #[test]
    fn rejects_unsupported_or_missing_files() {
        let registry = PreviewRegistry::new();
        let text = temp_file("txt");

        let err = registry.attach(&text).unwrap_err();
        assert!(err.field_errors().unwrap().contains("media"));

        let missing = std::env::temp_dir().join("quizdesk-does-not-exist.png");
        assert!(registry.attach(missing).is_err());
        assert_eq!(registry.live_count(), 0);

        std::fs::remove_file(text).ok();
    }
}
