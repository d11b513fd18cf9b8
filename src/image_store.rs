//! Storage for uploaded goal images.
//!
//! Uploads are best-effort: the goal endpoint logs a failed upload and saves
//! the goal without a picture, so implementations only need to report failure
//! accurately, not recover from it.

use std::{fs, path::PathBuf};

use crate::{Error, endpoints};

/// Turns raw image bytes into a publicly resolvable URL.
pub trait ImageStore {
    /// Store `bytes` under a name derived from `file_name` and return the URL
    /// the stored image can be fetched from.
    ///
    /// # Errors
    ///
    /// Returns [Error::ImageUpload] if the image could not be stored.
    fn store(&self, file_name: &str, bytes: &[u8]) -> Result<String, Error>;
}

/// An image store backed by a directory on the local filesystem.
///
/// Images are written to `{media_dir}/goal-images/{name}.png` and served
/// under the media route by the router's file service.
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    media_dir: PathBuf,
}

impl LocalImageStore {
    /// Create an image store that writes beneath `media_dir`.
    pub fn new(media_dir: PathBuf) -> Self {
        Self { media_dir }
    }
}

impl ImageStore for LocalImageStore {
    fn store(&self, file_name: &str, bytes: &[u8]) -> Result<String, Error> {
        let file_name = sanitize_file_name(file_name);

        let image_dir = self.media_dir.join("goal-images");
        fs::create_dir_all(&image_dir).map_err(|error| Error::ImageUpload(error.to_string()))?;

        fs::write(image_dir.join(format!("{file_name}.png")), bytes)
            .map_err(|error| Error::ImageUpload(error.to_string()))?;

        Ok(format!("{}/goal-images/{file_name}.png", endpoints::MEDIA))
    }
}

/// Reduce a user-supplied name to characters that are safe in a file name and
/// a URL path segment.
fn sanitize_file_name(file_name: &str) -> String {
    let sanitized: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        "goal".to_owned()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod local_image_store_tests {
    use std::fs;

    use super::{ImageStore, LocalImageStore, sanitize_file_name};

    fn get_test_media_dir(test_name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "piggybank_image_store_{test_name}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn store_writes_file_and_returns_media_url() {
        let media_dir = get_test_media_dir("store");
        let store = LocalImageStore::new(media_dir.clone());

        let url = store.store("Laptop", &[1, 2, 3]).unwrap();

        assert_eq!("/media/goal-images/Laptop.png", url);
        let written = fs::read(media_dir.join("goal-images").join("Laptop.png")).unwrap();
        assert_eq!(vec![1, 2, 3], written);
    }

    #[test]
    fn sanitize_replaces_path_separators() {
        assert_eq!("___etc_passwd", sanitize_file_name("../etc/passwd"));
        assert_eq!("Dream_Vacation", sanitize_file_name("Dream Vacation"));
        assert_eq!("goal", sanitize_file_name(""));
    }
}
