use glam::{Mat4, Quat, Vec3, Vec4};

use crate::scene_index::{NodeId, SceneIndex};

/// Camera parameters consumed by the renderer's uniform buffer.
#[derive(Clone, Debug)]
pub struct CameraParams {
    pub view_proj: Mat4,
    pub position: Vec3,
}

/// Lighting state consumed by the renderer's uniform buffer.
#[derive(Clone, Debug)]
pub struct LightParams {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

impl Default for LightParams {
    fn default() -> Self {
        Self {
            position: Vec3::new(3.0, 5.0, -3.0),
            color: Vec3::splat(1.0),
            intensity: 1.0,
        }
    }
}

/// One mesh ready to draw: a unit cube stretched over its world bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawItem {
    pub node: NodeId,
    pub model: Mat4,
    pub color: Vec4,
    pub transparent: bool,
    pub depth_write: bool,
    pub depth_test: bool,
    pub priority: f32,
}

/// Visible meshes in draw order: opaque first, then transparent, each group
/// ordered by render priority (stable for equal priorities).
pub fn build_draw_list(index: &SceneIndex) -> Vec<DrawItem> {
    let (mut opaque, mut transparent): (Vec<_>, Vec<_>) = index
        .iter()
        .filter(|(_, node)| node.is_mesh() && node.visible)
        .filter_map(|(id, node)| {
            let bounds = node.world_bounds()?;
            let material = node.material;
            let alpha = if material.transparent {
                material.opacity
            } else {
                1.0
            };
            Some(DrawItem {
                node: id,
                model: Mat4::from_scale_rotation_translation(
                    bounds.size(),
                    Quat::IDENTITY,
                    bounds.center(),
                ),
                color: node.color.extend(alpha),
                transparent: material.transparent,
                depth_write: material.depth_write,
                depth_test: material.depth_test,
                priority: node.render_order,
            })
        })
        .partition(|item| !item.transparent);
    opaque.sort_by(|a, b| a.priority.total_cmp(&b.priority));
    transparent.sort_by(|a, b| a.priority.total_cmp(&b.priority));
    opaque.extend(transparent);
    opaque
}
