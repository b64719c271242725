use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::scene::{Aabb, Material, NodeKind, Scene, SceneNode};

/// Handle of a node stored in a [`SceneIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Selects scene nodes either by exact name or by name prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamePattern {
    Name(String),
    Prefix(String),
}

impl NamePattern {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self::Prefix(prefix.into())
    }

    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            Self::Name(name) => candidate == name,
            Self::Prefix(prefix) => candidate.starts_with(prefix.as_str()),
        }
    }
}

/// Flattened scene node with its world transform resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedNode {
    pub name: String,
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub world: Mat4,
    pub local_bounds: Option<Aabb>,
    pub color: Vec3,
    pub material: Material,
    pub visible: bool,
    pub render_order: f32,
    pub fov: f32,
    pub intensity: f32,
}

impl IndexedNode {
    pub fn is_mesh(&self) -> bool {
        self.kind == NodeKind::Mesh
    }

    pub fn world_position(&self) -> Vec3 {
        self.world.transform_point3(Vec3::ZERO)
    }

    pub fn world_bounds(&self) -> Option<Aabb> {
        self.local_bounds
            .map(|bounds| bounds.transformed(&self.world))
    }
}

/// Lookup table over the loaded scene graph, built once at load time.
///
/// Nodes live in an arena in depth-first order; names map to every node
/// carrying that name, since exporters do not guarantee uniqueness.
#[derive(Debug, Clone, Default)]
pub struct SceneIndex {
    nodes: Vec<IndexedNode>,
    by_name: BTreeMap<String, Vec<NodeId>>,
}

impl SceneIndex {
    /// Creates an index with no nodes, standing in for a scene that has not loaded.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn build(scene: &Scene) -> Self {
        let mut index = Self::default();
        for node in &scene.nodes {
            index.insert(node, None, Mat4::IDENTITY);
        }
        index
    }

    fn insert(&mut self, node: &SceneNode, parent: Option<NodeId>, parent_world: Mat4) -> NodeId {
        let id = NodeId(self.nodes.len());
        let world = parent_world * node.local_transform();
        self.nodes.push(IndexedNode {
            name: node.name.clone(),
            kind: node.kind,
            parent,
            children: Vec::with_capacity(node.children.len()),
            world,
            local_bounds: node.bounds,
            color: node.color,
            material: node.material,
            visible: true,
            render_order: 0.0,
            fov: node.fov,
            intensity: node.intensity,
        });
        self.by_name.entry(node.name.clone()).or_default().push(id);

        for child in &node.children {
            let child_id = self.insert(child, Some(id), world);
            self.nodes[id.0].children.push(child_id);
        }
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &IndexedNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut IndexedNode {
        &mut self.nodes[id.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &IndexedNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index), node))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (NodeId, &mut IndexedNode)> {
        self.nodes
            .iter_mut()
            .enumerate()
            .map(|(index, node)| (NodeId(index), node))
    }

    /// Every node whose name equals `name`.
    ///
    /// Non-mesh nodes (groups, cameras) match as well, so hit-testing a
    /// group name covers the meshes underneath it.
    pub fn find_by_name(&self, name: &str) -> Vec<NodeId> {
        self.by_name.get(name).cloned().unwrap_or_default()
    }

    /// First node of the given kind carrying `name`.
    pub fn find_kind(&self, name: &str, kind: NodeKind) -> Option<NodeId> {
        self.by_name
            .get(name)?
            .iter()
            .copied()
            .find(|id| self.nodes[id.0].kind == kind)
    }

    /// Names of all meshes starting with `prefix`. The empty prefix matches every mesh.
    pub fn find_by_prefix(&self, prefix: &str) -> BTreeSet<String> {
        self.by_name
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(name, _)| name.starts_with(prefix))
            .filter(|(_, ids)| ids.iter().any(|id| self.nodes[id.0].is_mesh()))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Mesh nodes whose name starts with `prefix`.
    pub fn meshes_with_prefix(&self, prefix: &str) -> Vec<NodeId> {
        self.by_name
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(name, _)| name.starts_with(prefix))
            .flat_map(|(_, ids)| ids.iter().copied())
            .filter(|id| self.nodes[id.0].is_mesh())
            .collect()
    }

    /// Nodes selected by `pattern`: every node with that exact name, or
    /// every mesh carrying the prefix.
    pub fn resolve(&self, pattern: &NamePattern) -> Vec<NodeId> {
        match pattern {
            NamePattern::Name(name) => self.find_by_name(name),
            NamePattern::Prefix(prefix) => self.meshes_with_prefix(prefix),
        }
    }

    /// `id` followed by all of its descendants, depth first.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next.0].children.iter().rev().copied());
        }
        out
    }
}
