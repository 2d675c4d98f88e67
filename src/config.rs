use anyhow::{anyhow, Context, Result};
use glam::{Mat4, Vec3};
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::light::SpotLight;
use crate::rig::{
    default_mono_projection, default_stereo_projections, EyeShift, Rig, ViewSet,
};

/// Host inputs for one frame, as read from a frame description file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameDescription {
    #[serde(default = "default_extent")]
    pub width: u32,
    #[serde(default = "default_extent")]
    pub height: u32,
    pub rig: Rig,
    #[serde(default)]
    pub device: Pose,
    #[serde(default)]
    pub model: Pose,
    #[serde(default)]
    pub lights: Vec<SpotLight>,
}

impl FrameDescription {
    /// Parses the frame XML.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid frame XML")?;
        let root = document.root_element();
        if !root.has_tag_name("frame") {
            return Err(anyhow!("expected <frame> root, found <{}>", root.tag_name().name()));
        }

        let (width, height) = match child(&root, "target") {
            Some(target) => (
                parse_u32(optional_text(&target, "width"), default_extent())?,
                parse_u32(optional_text(&target, "height"), default_extent())?,
            ),
            None => (default_extent(), default_extent()),
        };
        let rig = parse_rig(&root, width as f32 / height.max(1) as f32)?;
        let device = match child(&root, "device") {
            Some(node) => Pose::from_node(&node)?,
            None => Pose::default(),
        };
        let model = match child(&root, "model") {
            Some(node) => Pose::from_node(&node)?,
            None => Pose::default(),
        };

        let mut lights = Vec::new();
        for node in root.children().filter(|n| n.has_tag_name("light")) {
            let angle = parse_f32(optional_text(&node, "angle"), 45.0)?;
            lights.push(SpotLight {
                position: parse_vec3(optional_text(&node, "position"), Vec3::ZERO)?,
                direction: parse_vec3(optional_text(&node, "direction"), Vec3::NEG_Y)?,
                angle_cos: angle.to_radians().cos(),
                color: parse_color(optional_text(&node, "color"), Vec3::ONE)?,
                intensity: parse_f32(optional_text(&node, "intensity"), 1.0)?,
            });
        }

        Ok(Self {
            width,
            height,
            rig,
            device,
            model,
            lights,
        })
    }

    pub fn views(&self) -> ViewSet {
        self.rig.views(self.device.matrix())
    }
}

/// Placement with Euler rotation in degrees, applied Z, then Y, then X.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: default_scale(),
        }
    }
}

impl Pose {
    fn from_node(node: &Node<'_, '_>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            position: parse_vec3(optional_text(node, "position"), defaults.position)?,
            rotation: parse_vec3(optional_text(node, "rotation"), defaults.rotation)?,
            scale: parse_vec3(optional_text(node, "scale"), defaults.scale)?,
        })
    }

    pub fn matrix(&self) -> Mat4 {
        let translation = Mat4::from_translation(self.position);
        let rotation = Mat4::from_rotation_z(self.rotation.z.to_radians())
            * Mat4::from_rotation_y(self.rotation.y.to_radians())
            * Mat4::from_rotation_x(self.rotation.x.to_radians());
        translation * rotation * Mat4::from_scale(self.scale)
    }
}

fn default_extent() -> u32 {
    1024
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

fn parse_rig(root: &Node<'_, '_>, aspect: f32) -> Result<Rig> {
    let custom_projection = match child(root, "projection") {
        Some(node) => {
            let fov = parse_f32(optional_text(&node, "fov"), 60.0)?;
            let near = parse_f32(optional_text(&node, "near"), 0.1)?;
            if near <= 0.0 {
                return Err(anyhow!("projection near plane must be positive"));
            }
            Some(Mat4::perspective_infinite_reverse_rh(
                fov.to_radians(),
                aspect.max(0.01),
                near,
            ))
        }
        None => None,
    };

    match optional_text(root, "rig").as_deref().unwrap_or("stereo") {
        "mono" => Ok(Rig::mono(
            custom_projection.unwrap_or_else(default_mono_projection),
        )),
        "stereo" => {
            let default = EyeShift::STEREO;
            let ipd = parse_f32(optional_text(root, "ipd"), default.right.x * 2.0)?;
            let (shift_y, shift_z) = match optional_text(root, "shift") {
                Some(text) => {
                    let values = parse_floats(&text, 2, "shift")?;
                    (values[0], values[1])
                }
                None => (default.right.y, default.right.z),
            };
            let projections = custom_projection
                .map(|projection| [projection; 2])
                .unwrap_or_else(default_stereo_projections);
            Ok(Rig::stereo(EyeShift::new(ipd, shift_y, shift_z), projections))
        }
        other => Err(anyhow!("unknown rig `{other}`, expected mono or stereo")),
    }
}

fn child<'a, 'input>(node: &Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|c| c.has_tag_name(tag))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    child(node, tag)
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_floats(text: &str, count: usize, what: &str) -> Result<Vec<f32>> {
    let values = text
        .split_whitespace()
        .map(|component| {
            component
                .parse::<f32>()
                .map_err(|err| anyhow!("invalid {what} component `{component}`: {err}"))
        })
        .collect::<Result<Vec<_>>>()?;
    if values.len() != count {
        return Err(anyhow!(
            "{what} expects {count} components, found {}",
            values.len()
        ));
    }
    Ok(values)
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    let values = parse_floats(&value, 3, "vector")?;
    Ok(Vec3::new(values[0], values[1], values[2]))
}

fn parse_color(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    let values = parse_floats(&value, 3, "color")?;
    Ok(Vec3::new(values[0], values[1], values[2]) / 255.0)
}

fn parse_f32(value: Option<String>, default: f32) -> Result<f32> {
    match value {
        Some(value) => value
            .parse::<f32>()
            .map_err(|err| anyhow!("failed to parse float: {err}")),
        None => Ok(default),
    }
}

fn parse_u32(value: Option<String>, default: u32) -> Result<u32> {
    match value {
        Some(value) => value
            .parse::<u32>()
            .map_err(|err| anyhow!("failed to parse integer: {err}")),
        None => Ok(default),
    }
}
