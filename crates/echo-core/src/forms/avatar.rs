use std::path::Path;

use super::ValidationErrors;
use crate::api::ApiError;

/// Largest avatar the backend accepts (2 MiB)
pub const MAX_AVATAR_BYTES: usize = 2 * 1024 * 1024;

const ALLOWED_TYPES: &[&str] = &["image/png", "image/jpeg", "image/jpg", "image/gif"];

/// A validated avatar image ready to be sent as the `avatar` multipart part.
#[derive(Debug, Clone)]
pub struct AvatarUpload {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

impl AvatarUpload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self, ValidationErrors> {
        let content_type = content_type.into().to_ascii_lowercase();
        if !ALLOWED_TYPES.contains(&content_type.as_str()) {
            return Err(ValidationErrors::single(
                "avatar",
                "Only png, jpg, jpeg, gif files are allowed.",
            ));
        }
        if bytes.len() > MAX_AVATAR_BYTES {
            return Err(ValidationErrors::single("avatar", "File size must be less than 2MB."));
        }
        Ok(Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        })
    }

    /// Read an image from disk, inferring its type from the extension.
    ///
    /// The size is checked before the file is read.
    pub fn from_path(path: &Path) -> Result<Self, ApiError> {
        let content_type = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(content_type_for_extension)
            .ok_or_else(|| {
                ValidationErrors::single("avatar", "Only png, jpg, jpeg, gif files are allowed.")
            })?;

        let metadata = std::fs::metadata(path)
            .map_err(|e| ApiError::InvalidRequest(format!("{}: {}", path.display(), e)))?;
        if metadata.len() > MAX_AVATAR_BYTES as u64 {
            return Err(
                ValidationErrors::single("avatar", "File size must be less than 2MB.").into(),
            );
        }

        let bytes = std::fs::read(path)
            .map_err(|e| ApiError::InvalidRequest(format!("{}: {}", path.display(), e)))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("avatar")
            .to_string();

        Ok(Self::new(file_name, content_type, bytes)?)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub(crate) fn into_part(self) -> Result<reqwest::multipart::Part, ApiError> {
        reqwest::multipart::Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.content_type)
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid content type: {}", e)))
    }
}

fn content_type_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_unsupported_type() {
        let err = AvatarUpload::new("a.webp", "image/webp", vec![0; 10]).unwrap_err();
        assert_eq!(err.get("avatar"), Some("Only png, jpg, jpeg, gif files are allowed."));
    }

    #[test]
    fn test_rejects_oversized_file() {
        let err = AvatarUpload::new("big.png", "image/png", vec![0; MAX_AVATAR_BYTES + 1]).unwrap_err();
        assert_eq!(err.get("avatar"), Some("File size must be less than 2MB."));

        assert!(AvatarUpload::new("max.png", "image/png", vec![0; MAX_AVATAR_BYTES]).is_ok());
    }

    #[test]
    fn test_from_path_infers_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("me.JPG");
        std::fs::write(&path, b"\xff\xd8\xff").unwrap();

        let upload = AvatarUpload::from_path(&path).unwrap();
        assert_eq!(upload.file_name(), "me.JPG");
        assert_eq!(upload.content_type(), "image/jpeg");
        assert_eq!(upload.len(), 3);
    }

    #[test]
    fn test_from_path_errors() {
        let dir = tempfile::tempdir().unwrap();

        let err = AvatarUpload::from_path(&dir.path().join("notes.txt")).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = AvatarUpload::from_path(&dir.path().join("missing.png")).unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }
}
