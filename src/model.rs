//! Core data model.
//!
//! A screenshot event is a path the watcher saw appear. Once the file is
//! ready it becomes a [`Screenshot`] with its bytes; the summarizer turns
//! that into a [`Summary`] which the sink forwards.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Screenshot event
// ---------------------------------------------------------------------------

/// A new screenshot file reported by the watcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenshotEvent {
    /// Correlates log lines and spans for this screenshot.
    pub id: Uuid,
    pub path: PathBuf,
    pub detected_at: DateTime<Utc>,
}

impl ScreenshotEvent {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            path: path.into(),
            detected_at: Utc::now(),
        }
    }

    /// The file name, lossily converted for display.
    pub fn file_name(&self) -> String {
        file_name_of(&self.path)
    }
}

// ---------------------------------------------------------------------------
// Image format
// ---------------------------------------------------------------------------

/// Image formats the summarizer accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    /// Pick the format from the file extension. Unknown extensions are
    /// treated as PNG, which is what macOS writes by default.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("jpg") | Some("jpeg") => ImageFormat::Jpeg,
            _ => ImageFormat::Png,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }
}

// ---------------------------------------------------------------------------
// Screenshot
// ---------------------------------------------------------------------------

/// A screenshot whose file has finished writing.
#[derive(Debug, Clone)]
pub struct Screenshot {
    pub event: ScreenshotEvent,
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl Screenshot {
    pub fn new(event: ScreenshotEvent, bytes: Vec<u8>) -> Self {
        let format = ImageFormat::from_path(&event.path);
        Self {
            event,
            bytes,
            format,
        }
    }

    pub fn path(&self) -> &Path {
        &self.event.path
    }

    /// Short content hash: first 16 hex chars of the SHA-256 of the bytes.
    pub fn image_hash(&self) -> String {
        let digest = Sha256::digest(&self.bytes);
        hex::encode(digest)[..16].to_string()
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// LLM-generated description of one screenshot. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// The screenshot this summary was derived from.
    pub source_path: PathBuf,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Summary {
    pub fn new(source_path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            text: text.into(),
            created_at: Utc::now(),
        }
    }

    /// `created_at` in local time, formatted for humans.
    pub fn local_timestamp(&self) -> String {
        self.created_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }
}

// ---------------------------------------------------------------------------
// Delivery
// ---------------------------------------------------------------------------

/// How a sink disposed of a summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Photo plus caption reached the chat.
    Sent,
    /// Photo upload failed; a text-only message went through instead.
    SentTextOnly,
    /// Nothing reached the chat; the summary was written to this file.
    SavedLocally(PathBuf),
    /// Appended to the daily record. `signature` is the chain receipt when
    /// publication succeeded.
    Recorded {
        date: String,
        count: usize,
        signature: Option<String>,
    },
}

impl Delivery {
    /// Label used for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Delivery::Sent => "sent",
            Delivery::SentTextOnly => "sent_text_only",
            Delivery::SavedLocally(_) => "saved_locally",
            Delivery::Recorded {
                signature: Some(_), ..
            } => "recorded",
            Delivery::Recorded { signature: None, .. } => "recorded_unpublished",
        }
    }
}

pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
