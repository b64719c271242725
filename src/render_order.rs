use glam::Vec3;
use log::debug;

use crate::config::RenderOrderConfig;
use crate::scene_index::SceneIndex;

/// Assigns render priorities and depth flags to every mesh.
///
/// Runs once after the model loads. Manual layers win; transparent meshes
/// otherwise sort by squared distance from `eye` and stop writing depth.
pub fn apply(index: &mut SceneIndex, config: &RenderOrderConfig, eye: Vec3) {
    let mut layered = 0usize;
    for (_, node) in index.iter_mut() {
        if !node.is_mesh() {
            continue;
        }
        let material = &mut node.material;
        if config.front.iter().any(|pattern| pattern.matches(&node.name)) {
            node.render_order = config.front_priority;
            material.depth_write = true;
            material.depth_test = true;
            layered += 1;
        } else if config.middle.iter().any(|pattern| pattern.matches(&node.name)) {
            node.render_order = config.middle_priority;
            layered += 1;
        } else if material.transparent {
            node.render_order = eye.distance_squared(node.world.transform_point3(Vec3::ZERO));
            material.depth_write = false;
            material.depth_test = true;
        } else {
            node.render_order = 0.0;
            material.depth_write = true;
            material.depth_test = true;
        }
    }
    debug!("render order: {layered} mesh(es) placed in manual layers");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Material, NodeKind, Scene, SceneNode};
    use crate::scene_index::NamePattern;

    fn mesh(name: &str, transparent: bool, position: Vec3) -> SceneNode {
        SceneNode {
            name: name.to_string(),
            kind: NodeKind::Mesh,
            position,
            material: Material {
                transparent,
                ..Material::default()
            },
            ..SceneNode::default()
        }
    }

    fn order_of(index: &SceneIndex, name: &str) -> f32 {
        index.node(index.find_by_name(name)[0]).render_order
    }

    #[test]
    fn assigns_layers_and_transparent_distance() {
        let mut index = SceneIndex::build(&Scene {
            nodes: vec![
                mesh("EX_roof", false, Vec3::ZERO),
                mesh("G_car_body", true, Vec3::ZERO),
                mesh("EX_heatPump", false, Vec3::ZERO),
                mesh("EXLV_mainWinStainedGlass", true, Vec3::new(0.0, 0.0, 3.0)),
                mesh("LR_sofa", false, Vec3::ZERO),
            ],
        });
        apply(&mut index, &RenderOrderConfig::default(), Vec3::ZERO);

        assert_eq!(order_of(&index, "EX_roof"), -20.0);
        assert_eq!(order_of(&index, "G_car_body"), -20.0);
        assert_eq!(order_of(&index, "EX_heatPump"), -10.0);
        assert_eq!(order_of(&index, "EXLV_mainWinStainedGlass"), 9.0);
        assert_eq!(order_of(&index, "LR_sofa"), 0.0);

        let glass = index.node(index.find_by_name("EXLV_mainWinStainedGlass")[0]);
        assert!(!glass.material.depth_write);
        assert!(glass.material.depth_test);
        let car = index.node(index.find_by_name("G_car_body")[0]);
        assert!(car.material.depth_write);
    }

    #[test]
    fn custom_layers_are_honoured() {
        let mut index = SceneIndex::build(&Scene {
            nodes: vec![mesh("Sky", false, Vec3::ZERO)],
        });
        let config = RenderOrderConfig {
            front: vec![NamePattern::name("Sky")],
            front_priority: -100.0,
            ..RenderOrderConfig::default()
        };
        apply(&mut index, &config, Vec3::ZERO);
        assert_eq!(order_of(&index, "Sky"), -100.0);
    }
}
