use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::warn;

use crate::llm::ImagePayload;

/// Reads an image from disk and encodes it for the completion API.
///
/// Returns `None` when the file cannot be read; callers turn that into their
/// own error text.
pub async fn encode_image_file(path: impl AsRef<Path>) -> Option<ImagePayload> {
    let path = path.as_ref();
    match tokio::fs::read(path).await {
        Ok(bytes) => Some(ImagePayload {
            mime_type: mime_type_for(path).to_string(),
            data: STANDARD.encode(bytes),
        }),
        Err(error) => {
            warn!(
                event_name = "agent.image.read_failed",
                path = %path.display(),
                error = %error,
                "image could not be read"
            );
            None
        }
    }
}

fn mime_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}
