//! Filesystem helpers for Parley: the data directory and local file attachments.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use parley_types::llm::Attachment;

/// Largest file accepted as an attachment.
pub const MAX_ATTACHMENT_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("{path} is {size} bytes, the limit is {MAX_ATTACHMENT_BYTES}")]
    TooLarge { path: String, size: u64 },
}

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `PARLEY_DATA_DIR` environment variable
/// 2. `~/.parley`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PARLEY_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".parley");
    }

    // Last resort: current directory
    PathBuf::from(".parley")
}

/// Create the data directory if needed and return it.
pub async fn ensure_data_dir(data_dir: &Path) -> Result<PathBuf, std::io::Error> {
    tokio::fs::create_dir_all(data_dir).await?;
    Ok(data_dir.to_path_buf())
}

/// MIME type for the file kinds the chat accepts, by extension.
pub fn mime_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "txt" | "md" => "text/plain",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => return None,
    };
    Some(mime)
}

/// Read a local file into an [`Attachment`].
///
/// Images are inlined as a base64 `data:` URL so vision models can see them;
/// other files travel as metadata only.
pub async fn load_attachment(path: &Path) -> Result<Attachment, AttachmentError> {
    let display = path.display().to_string();
    let mime_type = mime_type_for(path)
        .ok_or_else(|| AttachmentError::UnsupportedType(display.clone()))?;

    let metadata = tokio::fs::metadata(path).await.map_err(|source| AttachmentError::Io {
        path: display.clone(),
        source,
    })?;
    let size = metadata.len();
    if size > MAX_ATTACHMENT_BYTES {
        return Err(AttachmentError::TooLarge { path: display, size });
    }

    let base64 = if mime_type.starts_with("image/") {
        let bytes = tokio::fs::read(path).await.map_err(|source| AttachmentError::Io {
            path: display.clone(),
            source,
        })?;
        Some(format!("data:{mime_type};base64,{}", STANDARD.encode(bytes)))
    } else {
        None
    };

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or(display);

    Ok(Attachment {
        name,
        mime_type: mime_type.to_string(),
        size,
        base64,
        url: None,
    })
}
