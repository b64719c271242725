//! Interactive walkthrough of a net-zero house model.
//!
//! The crate turns pointer events over a loaded scene into room changes,
//! visibility changes and informational popups. Everything up to the draw
//! list is platform independent and testable headless; the `render` module
//! and the browser front end are thin shells around [`Walkthrough`].

pub mod app;
pub mod assets;
pub mod camera;
pub mod config;
pub mod error;
pub mod hotspots;
pub mod input;
pub mod interaction;
pub mod picking;
pub mod popup;
pub mod render;
pub mod render_order;
pub mod scene;
pub mod scene_index;
pub mod visibility;
pub mod walkthrough;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use assets::AssetSlot;
pub use camera::{CameraId, CameraSet, CameraView};
pub use config::WalkthroughConfig;
pub use error::{AssetKind, WalkthroughError};
pub use hotspots::{HotObjectSet, Trigger};
pub use input::{CursorStyle, MouseButton, PointerState, ScriptedEvent};
pub use interaction::{ClickRule, InteractionState, PowerMode, Room};
pub use picking::{hit_test, HitSet};
pub use popup::{PopupCatalog, PopupKey, PopupSequencer, PopupView};
pub use render::{CameraParams, DrawItem, LightParams, Renderer};
pub use scene::{Scene, SceneNode};
pub use scene_index::{NamePattern, NodeId, SceneIndex};
pub use walkthrough::{ActionOutcome, ClickOutcome, Outcome, Walkthrough};
