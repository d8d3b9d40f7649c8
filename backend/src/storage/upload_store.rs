use std::fs;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use sha2::{Digest, Sha256};

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Upload storage error: {0}")]
    Io(#[from] std::io::Error),
    #[error("File too large")]
    FileTooLarge,
}

/// Keeps uploaded leaf photos on disk, named by content hash.
#[derive(Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub const MAX_SIZE: usize = 20 * 1024 * 1024;

    pub fn new(dir: PathBuf) -> Result<Self, UploadError> {
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn calculate_image_hash(image_data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(image_data);
        hex::encode(hasher.finalize())
    }

    pub fn file_extension(image_data: &[u8]) -> &'static str {
        match image::guess_format(image_data) {
            Ok(ImageFormat::Jpeg) => "jpg",
            Ok(ImageFormat::Png) => "png",
            Ok(ImageFormat::WebP) => "webp",
            Ok(ImageFormat::Gif) => "gif",
            Ok(ImageFormat::Bmp) => "bmp",
            _ => "bin",
        }
    }

    pub fn validate_image_size(image_data: &[u8]) -> Result<(), UploadError> {
        if image_data.len() > Self::MAX_SIZE {
            return Err(UploadError::FileTooLarge);
        }
        Ok(())
    }

    /// Writes the image once and returns its file name. Re-uploads of the
    /// same bytes map to the same name.
    pub fn save(&self, image_data: &[u8]) -> Result<String, UploadError> {
        Self::validate_image_size(image_data)?;

        let file_name = format!(
            "{}.{}",
            Self::calculate_image_hash(image_data),
            Self::file_extension(image_data)
        );
        let path = self.dir.join(&file_name);
        if !path.exists() {
            fs::write(&path, image_data)?;
        }
        Ok(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn identical_uploads_share_a_name() {
        let dir = std::env::temp_dir().join(format!("uploads-{}", uuid::Uuid::new_v4()));
        let store = UploadStore::new(dir.clone()).unwrap();

        let first = store.save(PNG_MAGIC).unwrap();
        let second = store.save(PNG_MAGIC).unwrap();
        assert_eq!(first, second);
        assert!(first.ends_with(".png"));
        assert!(dir.join(&first).exists());
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn hash_is_hex_sha256() {
        let hash = UploadStore::calculate_image_hash(b"");
        assert_eq!(
            hash,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn unknown_bytes_get_generic_extension() {
        assert_eq!(UploadStore::file_extension(b"hello"), "bin");
    }
}
