use std::collections::HashMap;
use std::fmt;

use glam::{Mat4, Vec3};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::config::CameraNames;
use crate::error::WalkthroughError;
use crate::render::CameraParams;
use crate::scene::NodeKind;
use crate::scene_index::SceneIndex;

const NEAR: f32 = 0.1;
const FAR: f32 = 1000.0;

/// The fixed set of viewpoints exported with the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraId {
    Exterior,
    Kitchen,
    Garage,
}

impl CameraId {
    pub const ALL: [CameraId; 3] = [CameraId::Exterior, CameraId::Kitchen, CameraId::Garage];

    fn node_name(self, names: &CameraNames) -> &str {
        match self {
            CameraId::Exterior => &names.exterior,
            CameraId::Kitchen => &names.kitchen,
            CameraId::Garage => &names.garage,
        }
    }
}

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraId::Exterior => f.write_str("exterior"),
            CameraId::Kitchen => f.write_str("kitchen"),
            CameraId::Garage => f.write_str("garage"),
        }
    }
}

/// Perspective camera placed by a node of the scene graph.
///
/// The camera looks down its local -Z axis, like the exporter's cameras.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraView {
    pub name: String,
    pub world: Mat4,
    pub fov: f32,
}

impl CameraView {
    /// Free camera used until the model's cameras are available.
    pub fn fallback() -> Self {
        let position = Vec3::new(0.0, 2.0, 6.0);
        Self {
            name: "default".to_string(),
            world: Mat4::look_at_rh(position, Vec3::ZERO, Vec3::Y).inverse(),
            fov: 75.0,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.world.transform_point3(Vec3::ZERO)
    }

    pub fn view(&self) -> Mat4 {
        self.world.inverse()
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov.to_radians(), aspect.max(0.01), NEAR, FAR)
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view()
    }

    pub fn params(&self, aspect: f32) -> CameraParams {
        CameraParams {
            view_proj: self.view_proj(aspect),
            position: self.position(),
        }
    }
}

/// Cameras resolved from the loaded model.
#[derive(Debug, Clone, Default)]
pub struct CameraSet {
    cameras: HashMap<CameraId, CameraView>,
}

impl CameraSet {
    /// No cameras; every lookup fails until a model is loaded.
    pub fn unresolved() -> Self {
        Self::default()
    }

    pub fn resolve(index: &SceneIndex, names: &CameraNames) -> Self {
        let mut cameras = HashMap::new();
        for id in CameraId::ALL {
            let name = id.node_name(names);
            match index.find_kind(name, NodeKind::Camera) {
                Some(node_id) => {
                    let node = index.node(node_id);
                    cameras.insert(
                        id,
                        CameraView {
                            name: node.name.clone(),
                            world: node.world,
                            fov: node.fov,
                        },
                    );
                }
                None => warn!("camera `{name}` ({id}) not found in scene"),
            }
        }
        Self { cameras }
    }

    pub fn get(&self, id: CameraId) -> Result<&CameraView, WalkthroughError> {
        self.cameras
            .get(&id)
            .ok_or(WalkthroughError::InvalidCameraTarget(id))
    }

    pub fn contains(&self, id: CameraId) -> bool {
        self.cameras.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }
}
