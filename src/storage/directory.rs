use crate::storage::traits::{ImageStore, StorageError, StorageResult};
use md5::{Digest, Md5};
use std::fs;
use std::path::PathBuf;

/// Length of the URL digest prefix used in file names
const HASH_PREFIX_LEN: usize = 8;

/// Writes images into a `<root>/<class>[/<subclass>]/` directory tree
///
/// File names are `<class>_<first 8 hex of md5(url)>.jpg`. Two different URLs
/// serving identical bytes therefore produce two files; the same URL always
/// maps to the same path.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Computes where an image would be stored, without touching the disk
    pub fn image_path(&self, image_url: &str, class_label: &str, subclass: Option<&str>) -> PathBuf {
        let mut dir = self.root.join(class_label);
        if let Some(subclass) = subclass {
            dir.push(subclass);
        }
        dir.join(format!("{}_{}.jpg", class_label, url_digest(image_url)))
    }
}

impl ImageStore for DirectoryStore {
    fn save(
        &self,
        bytes: &[u8],
        image_url: &str,
        class_label: &str,
        subclass: Option<&str>,
    ) -> StorageResult<PathBuf> {
        let path = self.image_path(image_url, class_label, subclass);

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| StorageError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        fs::write(&path, bytes).map_err(|source| StorageError::Write {
            path: path.clone(),
            source,
        })?;

        Ok(path)
    }
}

/// First eight hex characters of the MD5 digest of a URL
pub fn url_digest(url: &str) -> String {
    let digest = Md5::digest(url.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(HASH_PREFIX_LEN);
    hex
}
