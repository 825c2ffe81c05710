use std::path::PathBuf;
use thiserror::Error;

/// Failures loading or writing the mod list. Fatal to the refresh that hit them.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read mod list {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse mod list {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write mod list {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize mod list: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// A mod whose path does not have the shape its category promises.
#[derive(Debug, Clone, Error)]
#[error("could not read model data for \"{name}\" ({path}): {reason}")]
pub struct ClassificationError {
    pub name: String,
    pub path: String,
    pub reason: String,
}

/// Raised by archive read services.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("{path} was not found")]
    NotFound { path: String },

    #[error("i/o error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not in a readable format: {reason}")]
    Format { path: String, reason: String },
}

/// A single preview entry that could not be turned into a thumbnail.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("material data read error for {path}: {source}")]
    Material {
        path: String,
        #[source]
        source: ArchiveError,
    },

    #[error("texture data read error for {path}: {source}")]
    Texture {
        path: String,
        #[source]
        source: ArchiveError,
    },

    #[error("malformed pixel data in {path}: {reason}")]
    Pixels { path: String, reason: String },

    #[error("could not prefetch the index of data file {data_file}: {source}")]
    Index {
        data_file: String,
        #[source]
        source: ArchiveError,
    },
}

impl DecodeError {
    pub fn path(&self) -> &str {
        match self {
            DecodeError::Material { path, .. }
            | DecodeError::Texture { path, .. }
            | DecodeError::Pixels { path, .. } => path,
            DecodeError::Index { data_file, .. } => data_file,
        }
    }
}

/// Errors from the toggle/delete service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("no mod with path {0}")]
    ModNotFound(String),

    #[error("no mod pack named {0}")]
    ModPackNotFound(String),
}
