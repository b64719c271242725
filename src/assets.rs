//! One-shot asset delivery.
//!
//! The house model and the popup text are each fetched exactly once. The
//! fetch completes into an [`AssetSlot`] and the event loop drains the slot
//! on its next turn, so loading never blocks a click or a frame.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{error, info, warn};
use parking_lot::RwLock;

use crate::error::{AssetKind, WalkthroughError};
use crate::popup::PopupCatalog;
use crate::scene::Scene;

#[derive(Debug)]
enum SlotState<T> {
    Pending,
    Ready(T),
    Failed(WalkthroughError),
    Taken,
}

/// Holds the outcome of a single asset fetch until it is consumed.
#[derive(Debug)]
pub struct AssetSlot<T> {
    kind: AssetKind,
    state: RwLock<SlotState<T>>,
}

impl<T> AssetSlot<T> {
    pub fn new(kind: AssetKind) -> Self {
        Self {
            kind,
            state: RwLock::new(SlotState::Pending),
        }
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    /// Settles the slot. Returns `false` if it had already been settled.
    pub fn fulfil(&self, result: Result<T>) -> bool {
        let mut state = self.state.write();
        if !matches!(*state, SlotState::Pending) {
            warn!("{} delivered more than once; ignoring", self.kind);
            return false;
        }
        *state = match result {
            Ok(value) => {
                info!("{} loaded", self.kind);
                SlotState::Ready(value)
            }
            Err(err) => {
                let err = WalkthroughError::asset(self.kind, &err);
                error!("{err}");
                SlotState::Failed(err)
            }
        };
        true
    }

    pub fn is_pending(&self) -> bool {
        matches!(*self.state.read(), SlotState::Pending)
    }

    /// Hands out the settled outcome once; later calls return `None`.
    pub fn take(&self) -> Option<Result<T, WalkthroughError>> {
        let mut state = self.state.write();
        match std::mem::replace(&mut *state, SlotState::Taken) {
            SlotState::Ready(value) => Some(Ok(value)),
            SlotState::Failed(err) => Some(Err(err)),
            pending @ SlotState::Pending => {
                *state = pending;
                None
            }
            SlotState::Taken => None,
        }
    }
}

pub fn load_scene(path: impl AsRef<Path>) -> Result<Scene> {
    let path = path.as_ref();
    let xml = fs::read_to_string(path)
        .with_context(|| format!("unable to read scene {}", path.display()))?;
    Scene::from_xml(&xml).with_context(|| format!("failed to parse scene {}", path.display()))
}

pub fn load_popup_text(path: impl AsRef<Path>) -> Result<PopupCatalog> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)
        .with_context(|| format!("unable to read popup text {}", path.display()))?;
    PopupCatalog::from_json_str(&json).with_context(|| format!("in {}", path.display()))
}
