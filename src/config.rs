use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::hotspots::HotObjectSet;
use crate::scene_index::NamePattern;

/// Everything the walkthrough needs to know about the house model.
///
/// The defaults describe the shipped model; a JSON file may override any
/// subset of fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WalkthroughConfig {
    pub cameras: CameraNames,
    pub hot_objects: HotObjectSet,
    pub rooms: RoomLayout,
    pub menu: MenuConfig,
    pub render_order: RenderOrderConfig,
    pub viewport: ViewportSize,
}

impl WalkthroughConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid walkthrough config")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("unable to read config {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("in {}", path.display()))
    }
}

/// Names of the camera nodes exported with the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraNames {
    pub exterior: String,
    pub kitchen: String,
    pub garage: String,
}

impl Default for CameraNames {
    fn default() -> Self {
        Self {
            exterior: "EX_camera".to_string(),
            kitchen: "KLV_camera".to_string(),
            garage: "G_camera".to_string(),
        }
    }
}

/// Which object groups are hidden when entering each room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomLayout {
    pub kitchen_hidden_prefixes: Vec<String>,
    pub garage_hidden_prefixes: Vec<String>,
    /// Wall shown again after the garage hides the exterior, so the room stays closed.
    pub garage_revealed_object: String,
}

impl Default for RoomLayout {
    fn default() -> Self {
        Self {
            kitchen_hidden_prefixes: vec!["G".to_string(), "EX".to_string()],
            garage_hidden_prefixes: vec!["K".to_string(), "LR".to_string(), "EX".to_string()],
            garage_revealed_object: "EXG_stoneWall1".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuConfig {
    /// Object hidden once the intro menu is dismissed.
    pub hidden_object: String,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            hidden_object: "EX_menuSign".to_string(),
        }
    }
}

/// Manual draw-order layers for meshes that sort badly by depth alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOrderConfig {
    pub front: Vec<NamePattern>,
    pub front_priority: f32,
    pub middle: Vec<NamePattern>,
    pub middle_priority: f32,
}

impl Default for RenderOrderConfig {
    fn default() -> Self {
        Self {
            front: vec![
                NamePattern::name("K_wallKitchen"),
                NamePattern::name("k_cabinetFullBack"),
                NamePattern::name("K_counterTop"),
                NamePattern::name("EX_roof"),
                NamePattern::name("EX_brickWalls"),
                NamePattern::name("G_waterHeater"),
                NamePattern::prefix("G_car"),
            ],
            front_priority: -20.0,
            middle: vec![
                NamePattern::name("EXG_stoneWall1"),
                NamePattern::name("EXG_stoneWall2"),
                NamePattern::name("EXG_stoneWall3"),
                NamePattern::name("EX_brickWallBack"),
                NamePattern::name("EX_heatPump"),
                NamePattern::name("EX_backRoof"),
            ],
            middle_priority: -10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}
