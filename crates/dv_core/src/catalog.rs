//! Image catalog — where decoy images live.
//!
//! The resolver only needs "list the images directly under this folder";
//! everything else (tiers, padding, sampling) is resolver logic.  The
//! filesystem implementation maps folders onto subdirectories of a decoy
//! root.

use std::fs;
use std::path::PathBuf;

use crate::error::CoreError;
use crate::image::{is_image_file, ImageRef};

pub trait ImageCatalog: Send + Sync {
    /// Image files directly under `folder` (`None` = catalog root), as
    /// catalog-relative identifiers.  A missing folder yields an empty list.
    fn list(&self, folder: Option<&str>) -> Result<Vec<ImageRef>, CoreError>;
}

/// Catalog over a directory tree: `<root>/<category>/<file>` for category
/// folders, `<root>/<file>` for the untagged "classic" set.
pub struct FsCatalog {
    root: PathBuf,
}

impl FsCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ImageCatalog for FsCatalog {
    fn list(&self, folder: Option<&str>) -> Result<Vec<ImageRef>, CoreError> {
        let dir = match folder {
            Some(sub) => self.root.join(sub),
            None => self.root.clone(),
        };
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut images = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !is_image_file(name) {
                continue;
            }
            let id = match folder {
                Some(sub) => format!("{sub}/{name}"),
                None => name.to_string(),
            };
            images.push(ImageRef::new(id));
        }
        Ok(images)
    }
}
