//!
//! # Fetch request
//! One submitted url and the file it will be written to
//!

use std::path::{Path, PathBuf};

use url::Url;
use uuid::Uuid;

use crate::fetch::error::FetchError;

#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub id: Uuid,
    pub url: Url,
    pub destination: PathBuf,
}

impl FetchRequest {
    /// Parses `url` and derives a destination unique to this request:
    /// `<save_dir>/<prefix>-<id>[.<ext>]`
    pub fn new(url: &str, save_dir: &Path, prefix: &str) -> Result<Self, FetchError> {
        let url = Url::parse(url.trim()).map_err(|source| FetchError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        match url.scheme() {
            "http" | "https" => {}
            scheme => return Err(FetchError::UnsupportedScheme(scheme.to_string())),
        }

        let id = Uuid::new_v4();
        let file_name = match file_extension(&url) {
            Some(ext) => format!("{}-{}.{}", prefix, id.simple(), ext),
            None => format!("{}-{}", prefix, id.simple()),
        };

        Ok(Self {
            id,
            destination: save_dir.join(file_name),
            url,
        })
    }

    pub fn file_name(&self) -> String {
        self.destination
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Extension of the last path segment, query and fragment excluded
pub fn file_extension(url: &Url) -> Option<&str> {
    let segment = url.path_segments()?.last()?;
    let (_, ext) = segment.rsplit_once('.')?;

    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }

    Some(ext)
}
