//! Pointer hit-testing against the hot objects of the loaded scene.
//!
//! A pointer position is converted to normalized device coordinates, cast
//! through the active camera, and intersected with the world-space bounds of
//! every visible mesh under each hot object (children included).

use std::collections::{BTreeMap, BTreeSet};

use glam::{Mat4, Vec2, Vec3};
use log::debug;

use crate::camera::CameraView;
use crate::hotspots::{ResolvedHotObjects, Trigger};
use crate::scene::Aabb;
use crate::scene_index::{NodeId, SceneIndex};

/// Triggers hit by one pointer event.
pub type HitSet = BTreeSet<Trigger>;

/// Converts pixel coordinates to normalized device coordinates.
///
/// `x' = 2x/width - 1`, `y' = 1 - 2y/height`, so the top-left pixel maps to
/// `(-1, 1)`.
pub fn screen_to_ndc(position: Vec2, width: u32, height: u32) -> Vec2 {
    let width = width.max(1) as f32;
    let height = height.max(1) as f32;
    Vec2::new(
        2.0 * position.x / width - 1.0,
        1.0 - 2.0 * position.y / height,
    )
}

/// Half-line used for picking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction.
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Ray from the near plane through `ndc` towards the far plane.
    pub fn from_ndc(ndc: Vec2, view_proj: Mat4) -> Self {
        let inverse = view_proj.inverse();
        let near = inverse.project_point3(ndc.extend(-1.0));
        let far = inverse.project_point3(ndc.extend(1.0));
        Self::new(near, far - near)
    }

    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Slab test. Returns the entry distance, or 0 when the origin is inside.
    pub fn intersect_aabb(&self, aabb: &Aabb) -> Option<f32> {
        let inv = Vec3::new(
            inverse_or_infinity(self.direction.x),
            inverse_or_infinity(self.direction.y),
            inverse_or_infinity(self.direction.z),
        );
        let t1 = (aabb.min - self.origin) * inv;
        let t2 = (aabb.max - self.origin) * inv;
        let tmin = t1.min(t2).max_element();
        let tmax = t1.max(t2).min_element();
        (tmax >= tmin && tmax >= 0.0).then(|| tmin.max(0.0))
    }
}

fn inverse_or_infinity(value: f32) -> f32 {
    if value != 0.0 {
        1.0 / value
    } else {
        f32::INFINITY
    }
}

/// Per-trigger intersection counts from one hit-test pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HitReport {
    counts: BTreeMap<Trigger, usize>,
}

impl HitReport {
    pub fn count(&self, trigger: Trigger) -> usize {
        self.counts.get(&trigger).copied().unwrap_or(0)
    }

    pub fn contains(&self, trigger: Trigger) -> bool {
        self.count(trigger) > 0
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Triggers with at least one intersection.
    pub fn triggers(&self) -> HitSet {
        self.counts.keys().copied().collect()
    }
}

/// Viewport-space pointer query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerQuery {
    pub position: Vec2,
    pub width: u32,
    pub height: u32,
}

impl PointerQuery {
    pub fn new(position: Vec2, width: u32, height: u32) -> Self {
        Self {
            position,
            width,
            height,
        }
    }

    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    pub fn ray(&self, camera: &CameraView) -> Ray {
        let ndc = screen_to_ndc(self.position, self.width, self.height);
        Ray::from_ndc(ndc, camera.view_proj(self.aspect()))
    }
}

/// Casts the pointer through `camera` and reports which triggers it hits.
///
/// Each trigger starts from a zero count; every visible mesh under any of
/// its resolved nodes that the ray crosses adds one. Hidden meshes are not
/// pickable. An empty scene yields an empty report.
pub fn hit_test(
    index: &SceneIndex,
    hot: &ResolvedHotObjects,
    camera: &CameraView,
    query: PointerQuery,
) -> HitReport {
    let mut report = HitReport::default();
    if index.is_empty() || query.width == 0 || query.height == 0 {
        return report;
    }
    let ray = query.ray(camera);

    for (trigger, roots) in hot.iter() {
        let mut count = 0usize;
        let mut visited = BTreeSet::<NodeId>::new();
        for root in roots {
            for id in index.subtree(*root) {
                if !visited.insert(id) {
                    continue;
                }
                let node = index.node(id);
                if !node.is_mesh() || !node.visible {
                    continue;
                }
                if let Some(distance) = node
                    .world_bounds()
                    .and_then(|bounds| ray.intersect_aabb(&bounds))
                {
                    debug!("ray hit {} ({trigger}) at {distance:.2}", node.name);
                    count += 1;
                }
            }
        }
        if count > 0 {
            report.counts.insert(trigger, count);
        }
    }
    report
}
