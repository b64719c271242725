use anyhow::{anyhow, bail, Context, Result};
use glam::{Mat4, Vec3};
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

/// Scene graph loaded from the house model description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Scene {
    pub nodes: Vec<SceneNode>,
}

impl Scene {
    /// Parses the XML scene description exported for the walkthrough.
    ///
    /// Top-level `<node>` elements become roots; nested nodes live under a
    /// `<children>` element of their parent.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid scene XML")?;
        let root = document.root_element();
        if !root.has_tag_name("scene") {
            bail!("expected <scene> root element, found <{}>", root.tag_name().name());
        }
        let nodes = root
            .children()
            .filter(|child| child.has_tag_name("node"))
            .map(|child| parse_node(&child))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { nodes })
    }

    /// Total number of nodes, descendants included.
    pub fn node_count(&self) -> usize {
        fn count(nodes: &[SceneNode]) -> usize {
            nodes.iter().map(|node| 1 + count(&node.children)).sum()
        }
        count(&self.nodes)
    }
}

/// What a scene node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Mesh,
    #[default]
    Group,
    Camera,
    Light,
}

impl NodeKind {
    fn parse(value: &str) -> Result<Self> {
        match value {
            "mesh" => Ok(Self::Mesh),
            "group" => Ok(Self::Group),
            "camera" => Ok(Self::Camera),
            "light" => Ok(Self::Light),
            other => Err(anyhow!("unknown node type `{other}`")),
        }
    }
}

/// Material flags consulted by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub transparent: bool,
    pub opacity: f32,
    pub depth_test: bool,
    pub depth_write: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            transparent: false,
            opacity: 1.0,
            depth_test: true,
            depth_write: true,
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Unit cube centred on the origin.
    pub fn unit() -> Self {
        Self::new(Vec3::splat(-0.5), Vec3::splat(0.5))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Box enclosing the eight transformed corners.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            let point = matrix.transform_point3(corner);
            min = min.min(point);
            max = max.max(point);
        }
        Self { min, max }
    }
}

/// Node of the house model as described by the exporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Aabb>,
    #[serde(default = "default_color")]
    pub color: Vec3,
    #[serde(default)]
    pub material: Material,
    #[serde(default = "default_fov")]
    pub fov: f32,
    #[serde(default = "default_intensity")]
    pub intensity: f32,
    #[serde(default)]
    pub children: Vec<SceneNode>,
}

impl Default for SceneNode {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: NodeKind::default(),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: default_scale(),
            bounds: None,
            color: default_color(),
            material: Material::default(),
            fov: default_fov(),
            intensity: default_intensity(),
            children: Vec::new(),
        }
    }
}

impl SceneNode {
    /// Translation * rotation (Z, Y, X in degrees) * scale.
    pub fn local_transform(&self) -> Mat4 {
        let rotation = Mat4::from_rotation_z(self.rotation.z.to_radians())
            * Mat4::from_rotation_y(self.rotation.y.to_radians())
            * Mat4::from_rotation_x(self.rotation.x.to_radians());
        Mat4::from_translation(self.position) * rotation * Mat4::from_scale(self.scale)
    }
}

fn default_color() -> Vec3 {
    Vec3::ONE
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

fn default_fov() -> f32 {
    45.0
}

fn default_intensity() -> f32 {
    1.0
}

fn parse_node(node: &Node<'_, '_>) -> Result<SceneNode> {
    let name = required_text(node, "name")?;
    let mut parsed = SceneNode {
        name: name.clone(),
        ..SceneNode::default()
    };
    parsed.kind = match optional_text(node, "type") {
        Some(kind) => NodeKind::parse(&kind).with_context(|| format!("node `{name}`"))?,
        None => NodeKind::Mesh,
    };
    parsed.position = parse_vec3(optional_text(node, "position"), parsed.position)
        .with_context(|| format!("position of `{name}`"))?;
    parsed.rotation = parse_vec3(optional_text(node, "rotation"), parsed.rotation)
        .with_context(|| format!("rotation of `{name}`"))?;
    parsed.scale = parse_vec3(optional_text(node, "scale"), parsed.scale)
        .with_context(|| format!("scale of `{name}`"))?;
    parsed.color = parse_color(optional_text(node, "color"), parsed.color)
        .with_context(|| format!("color of `{name}`"))?;
    parsed.fov = parse_f32(optional_text(node, "fov"), parsed.fov)?;
    parsed.intensity = parse_f32(optional_text(node, "intensity"), parsed.intensity)?;
    parsed.material.transparent =
        parse_bool(optional_text(node, "transparent"), parsed.material.transparent)?;
    parsed.material.opacity = parse_f32(optional_text(node, "opacity"), parsed.material.opacity)?;
    parsed.bounds = match optional_text(node, "bounds") {
        Some(bounds) => Some(parse_bounds(&bounds).with_context(|| format!("bounds of `{name}`"))?),
        None if parsed.kind == NodeKind::Mesh => Some(Aabb::unit()),
        None => None,
    };

    if let Some(children) = node.children().find(|child| child.has_tag_name("children")) {
        parsed.children = children
            .children()
            .filter(|child| child.has_tag_name("node"))
            .map(|child| parse_node(&child))
            .collect::<Result<Vec<_>>>()?;
    }

    Ok(parsed)
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_numbers(value: &str) -> Result<Vec<f32>> {
    value
        .split_whitespace()
        .map(|component| {
            component
                .parse::<f32>()
                .map_err(|err| anyhow!("invalid number `{component}`: {err}"))
        })
        .collect()
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    match parse_numbers(&value)?.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(anyhow!("vector needs exactly 3 components")),
    }
}

fn parse_color(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let color = parse_vec3(value, default * 255.0).context("color is missing components")?;
    Ok(color / 255.0)
}

fn parse_bounds(value: &str) -> Result<Aabb> {
    match parse_numbers(value)?.as_slice() {
        [x0, y0, z0, x1, y1, z1] => Ok(Aabb::new(
            Vec3::new(*x0, *y0, *z0),
            Vec3::new(*x1, *y1, *z1),
        )),
        _ => Err(anyhow!("bounds need 6 components (min xyz, max xyz)")),
    }
}

fn parse_f32(value: Option<String>, default: f32) -> Result<f32> {
    match value {
        Some(value) => value
            .parse::<f32>()
            .map_err(|err| anyhow!("failed to parse float: {err}")),
        None => Ok(default),
    }
}

fn parse_bool(value: Option<String>, default: bool) -> Result<bool> {
    match value.as_deref() {
        Some("true") | Some("1") => Ok(true),
        Some("false") | Some("0") => Ok(false),
        Some(other) => Err(anyhow!("failed to parse boolean `{other}`")),
        None => Ok(default),
    }
}
