//! Asset file access
//!
//! Clip files are opaque blobs to the mixer. This module only finds and
//! reads them, trying each configured search prefix in order.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// No candidate path could be opened
    #[error("Could not open {name} (tried {})", display_paths(.tried))]
    NotFound {
        /// Name the caller asked for
        name: String,
        /// Every path that was attempted, in order
        tried: Vec<PathBuf>,
    },

    /// File exists but could not be read
    #[error("IO error reading {path}: {source}")]
    IoError {
        /// Path that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Raw bytes of a located asset
#[derive(Debug, Clone)]
pub struct AssetBytes {
    /// Path the bytes were read from
    pub path: PathBuf,
    /// File contents
    pub bytes: Vec<u8>,
}

/// Search-path based file loader
#[derive(Debug, Clone, Default)]
pub struct AssetLoader {
    search_paths: Vec<PathBuf>,
}

impl AssetLoader {
    /// Create a loader with the given search prefixes
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    /// Search prefixes in the order they are tried
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Add a search prefix, tried after the existing ones
    pub fn add_search_path<P: Into<PathBuf>>(&mut self, path: P) {
        self.search_paths.push(path.into());
    }

    /// Candidate paths for `name`: every prefix joined with it, then the bare name
    pub fn candidates(&self, name: &str) -> Vec<PathBuf> {
        let mut candidates: Vec<PathBuf> = self
            .search_paths
            .iter()
            .map(|prefix| prefix.join(name))
            .collect();
        candidates.push(PathBuf::from(name));
        candidates
    }

    /// Read the first candidate that exists
    ///
    /// # Errors
    /// - `NotFound` if no candidate exists
    /// - `IoError` if a candidate exists but cannot be read
    pub fn read(&self, name: &str) -> Result<AssetBytes, AssetError> {
        let tried = self.candidates(name);

        for candidate in &tried {
            if !candidate.is_file() {
                log::debug!("Asset loader: no file at {}", candidate.display());
                continue;
            }
            return read_file(candidate).map(|bytes| AssetBytes {
                path: candidate.clone(),
                bytes,
            });
        }

        Err(AssetError::NotFound {
            name: name.to_string(),
            tried,
        })
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, AssetError> {
    fs::read(path).map_err(|source| AssetError::IoError {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_order() {
        let loader = AssetLoader::new(vec![PathBuf::from("a"), PathBuf::from("b")]);
        let candidates = loader.candidates("x.wav");
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("a").join("x.wav"),
                PathBuf::from("b").join("x.wav"),
                PathBuf::from("x.wav"),
            ]
        );
    }

    #[test]
    fn test_read_from_second_prefix() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(second.path().join("beep.wav"), b"RIFF").unwrap();

        let loader = AssetLoader::new(vec![first.path().to_path_buf(), second.path().to_path_buf()]);
        let asset = loader.read("beep.wav").unwrap();
        assert_eq!(asset.bytes, b"RIFF");
        assert_eq!(asset.path, second.path().join("beep.wav"));
    }

    #[test]
    fn test_missing_file_lists_tried_paths() {
        let dir = tempfile::tempdir().unwrap();
        let loader = AssetLoader::new(vec![dir.path().to_path_buf()]);

        match loader.read("missing.ogg") {
            Err(AssetError::NotFound { name, tried }) => {
                assert_eq!(name, "missing.ogg");
                assert_eq!(tried.len(), 2);
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}
