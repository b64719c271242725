use std::fmt;

use thiserror::Error;

use crate::camera::CameraId;

/// Asset fetched once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Model,
    PopupText,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Model => f.write_str("house model"),
            AssetKind::PopupText => f.write_str("popup text"),
        }
    }
}

/// Failures the walkthrough reports; none of them are fatal.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WalkthroughError {
    #[error("failed to load {asset}: {reason}")]
    AssetLoadFailure { asset: AssetKind, reason: String },
    #[error("camera {0} is not available")]
    InvalidCameraTarget(CameraId),
    #[error("popup `{title}` has no content")]
    EmptyPopup { title: String },
}

impl WalkthroughError {
    pub fn asset(asset: AssetKind, err: &anyhow::Error) -> Self {
        Self::AssetLoadFailure {
            asset,
            reason: format!("{err:#}"),
        }
    }
}
