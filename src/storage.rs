//! Local persistence for uploaded images (prescriptions, rider identity
//! pictures, payment QR codes). Files get uuid names under a per-kind
//! subdirectory; the stored reference is `<kind>/<uuid>.<ext>`.

use std::{fs, path::Path};

use uuid::Uuid;

use crate::app_error::AppError;

/// Maximum accepted upload size (5MB).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

pub fn save_upload(
    uploads_dir: &str,
    kind: &str,
    data: &[u8],
    ext: &str,
) -> Result<String, AppError> {
    if data.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
    }
    if data.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::BadRequest(
            "Uploaded file exceeds the 5MB limit".to_string(),
        ));
    }

    let dir = Path::new(uploads_dir).join(kind);
    fs::create_dir_all(&dir)
        .map_err(|e| AppError::Other(anyhow::anyhow!("Failed to create upload dir: {e}")))?;

    let filename = format!("{}.{}", Uuid::new_v4(), ext);
    fs::write(dir.join(&filename), data)
        .map_err(|e| AppError::Other(anyhow::anyhow!("Failed to persist upload: {e}")))?;

    Ok(format!("{kind}/{filename}"))
}

/// File extension from the reported content type, defaulting to jpg.
pub fn extension_for(content_type: Option<&str>) -> &'static str {
    match content_type {
        Some("image/png") => "png",
        Some("image/webp") => "webp",
        Some("application/pdf") => "pdf",
        _ => "jpg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_oversized_uploads() {
        let dir = std::env::temp_dir().join("medimart-test-uploads");
        let dir = dir.to_string_lossy();
        assert!(save_upload(&dir, "prescriptions", &[], "jpg").is_err());
        let big = vec![0u8; MAX_UPLOAD_BYTES + 1];
        assert!(save_upload(&dir, "prescriptions", &big, "jpg").is_err());
    }

    #[test]
    fn saves_and_references_by_kind() {
        let dir = std::env::temp_dir().join("medimart-test-uploads");
        let reference = save_upload(&dir.to_string_lossy(), "riders", b"fake-bytes", "png").unwrap();
        assert!(reference.starts_with("riders/"));
        assert!(reference.ends_with(".png"));
        assert!(dir.join(&reference).exists());
    }
}
