// SPDX-License-Identifier: MIT OR Apache-2.0

use std::path::PathBuf;

use crate::types::ErrorTag;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("invalid archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("failed to parse package manifest: {0}")]
    ManifestParse(String),

    #[error("failed to parse json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("invalid component: {0}")]
    InvalidComponent(String),

    #[error("mapping file error: {0}")]
    Mapping(String),

    #[error("{0}")]
    Other(String),
}

macro_rules! error_ctor {
    ($($name:ident => $variant:ident),* $(,)?) => {
        $(
            pub fn $name(msg: impl Into<String>) -> Self {
                Self::$variant(msg.into())
            }
        )*
    };
}

impl Error {
    error_ctor!(
        download => DownloadFailed,
        extraction => ExtractionFailed,
        manifest => ManifestParse,
        invalid_component => InvalidComponent,
        mapping => Mapping,
        other => Other,
    );

    /// classifies the error for the install-completion notification.
    pub fn tag(&self) -> ErrorTag {
        match self {
            Self::ExtractionFailed(_) | Self::Zip(_) => ErrorTag::Extracting,
            Self::ManifestParse(_) | Self::Json(_) => ErrorTag::ParsingManifest,
            _ => ErrorTag::Downloading,
        }
    }

    /// returns true for failures that may succeed when attempted again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network(_)
                | Self::DownloadFailed(_)
                | Self::Io(_)
                | Self::ExtractionFailed(_)
                | Self::Zip(_)
        )
    }
}
