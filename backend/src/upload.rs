use sha2::{Digest, Sha256};
use std::path::Path;

use crate::inference::ClassifyError;

const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// One user-supplied image, held only for the duration of a prediction.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, ClassifyError> {
        let file_name = file_name.into();
        Self::validate_extension(&file_name)?;
        Ok(Self { file_name, bytes })
    }

    pub fn from_path(path: &Path) -> Result<Self, ClassifyError> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::validate_extension(&file_name)?;
        let bytes = std::fs::read(path)?;
        Ok(Self { file_name, bytes })
    }

    pub fn validate_extension(file_name: &str) -> Result<(), ClassifyError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match extension {
            Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
            _ => Err(ClassifyError::UnsupportedExtension(file_name.to_string())),
        }
    }

    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.bytes);
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_extensions() {
        for name in ["sign.jpg", "sign.JPEG", "dir.v2/stop.Png"] {
            assert!(UploadedImage::validate_extension(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn test_rejected_extensions() {
        for name in ["sign.gif", "sign.webp", "README", "archive.png.zip", ".png"] {
            assert!(
                matches!(
                    UploadedImage::validate_extension(name),
                    Err(ClassifyError::UnsupportedExtension(_))
                ),
                "{name}"
            );
        }
    }

    #[test]
    fn test_digest_is_sha256_hex() {
        let upload = UploadedImage::new("empty.png", Vec::new()).unwrap();
        assert_eq!(
            upload.digest(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = UploadedImage::from_path(Path::new("no/such/sign.png"));
        assert!(matches!(result, Err(ClassifyError::Io(_))));
    }
}
