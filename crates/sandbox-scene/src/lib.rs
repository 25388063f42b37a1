#![warn(missing_docs)]

//! Scene description for the rigid-body sandbox.
//!
//! A scene is a plain declarative tree: camera, gravity, textures, materials,
//! a goal and a list of bodies. It carries no engine or GPU state; the
//! simulation instantiates it into a physics world and render handles.
//!
//! # Example
//!
//! ```ignore
//! use sandbox_scene::SceneDescription;
//!
//! let scene = SceneDescription::load("scenes/drop.json")?;
//! println!("{} bodies", scene.bodies.len());
//! ```

mod error;

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use error::{ConfigurationError, Result};

/// 3D vector with f32 components (meters).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
}

impl Vec3 {
    /// Create a new Vec3.
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// True when every component is finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// X axis.
    X,
    /// Y axis (up).
    Y,
    /// Z axis.
    Z,
}

/// Initial camera placement and projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraParams {
    /// Eye position.
    pub position: Vec3,
    /// Heading in degrees (0 looks down -Z).
    #[serde(default)]
    pub yaw: f32,
    /// Elevation in degrees.
    #[serde(default)]
    pub pitch: f32,
    /// Vertical field of view in degrees.
    #[serde(default = "default_fov")]
    pub fov: f32,
    /// Near clipping plane.
    #[serde(default = "default_near")]
    pub near: f32,
    /// Far clipping plane.
    #[serde(default = "default_far")]
    pub far: f32,
}

fn default_fov() -> f32 {
    70.0
}

fn default_near() -> f32 {
    0.1
}

fn default_far() -> f32 {
    1000.0
}

impl CameraParams {
    /// Check that the parameters describe a usable perspective projection.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(ConfigurationError::InvalidCamera { reason });

        if !self.position.is_finite()
            || ![self.yaw, self.pitch, self.fov, self.near, self.far]
                .iter()
                .all(|v| v.is_finite())
        {
            return invalid("all camera values must be finite".into());
        }
        if self.near <= 0.0 {
            return invalid(format!("near plane must be positive, got {}", self.near));
        }
        if self.far <= self.near {
            return invalid(format!(
                "far plane ({}) must lie beyond near plane ({})",
                self.far, self.near
            ));
        }
        if self.fov <= 0.0 || self.fov >= 180.0 {
            return invalid(format!("fov must be between 0 and 180 degrees, got {}", self.fov));
        }
        Ok(())
    }
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 2.0, 10.0),
            yaw: 0.0,
            pitch: 0.0,
            fov: default_fov(),
            near: default_near(),
            far: default_far(),
        }
    }
}

/// Named texture image reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureRef {
    /// Texture name used by materials and bodies.
    pub name: String,
    /// Asset name passed to the texture loader.
    pub file: String,
}

/// Surface and contact properties shared by bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Material name used by bodies.
    pub name: String,
    /// Base color as `[r, g, b]` in 0.0..1.0.
    #[serde(default = "default_color")]
    pub color: [f32; 3],
    /// Coulomb friction coefficient.
    #[serde(default = "default_friction")]
    pub friction: f32,
    /// Restitution (bounciness) coefficient.
    #[serde(default = "default_restitution")]
    pub restitution: f32,
    /// Default texture for bodies using this material.
    #[serde(default)]
    pub texture: Option<String>,
}

fn default_color() -> [f32; 3] {
    [0.8, 0.8, 0.8]
}

fn default_friction() -> f32 {
    0.5
}

fn default_restitution() -> f32 {
    0.1
}

/// Predicate evaluated against the goal body's center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GoalCondition {
    /// Coordinate along `axis` drops strictly below `value`.
    Below {
        /// Tested axis.
        axis: Axis,
        /// Threshold.
        value: f32,
    },
    /// Coordinate along `axis` rises strictly above `value`.
    Above {
        /// Tested axis.
        axis: Axis,
        /// Threshold.
        value: f32,
    },
    /// Center lies inside the axis-aligned box `[min, max]`.
    Region {
        /// Lower corner.
        min: Vec3,
        /// Upper corner.
        max: Vec3,
    },
}

/// Scene goal: a condition on one named body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    /// Name of the tracked body.
    pub body: String,
    /// Condition signalling success.
    pub condition: GoalCondition,
}

/// Collision and render shape of a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    /// Sphere centered at the body origin.
    Sphere {
        /// Sphere radius.
        radius: f32,
    },
    /// Box centered at the body origin.
    Box {
        /// Half size along each local axis.
        half_extents: Vec3,
    },
    /// Infinite static plane through the body origin.
    Plane {
        /// Outward normal in local space.
        normal: Vec3,
    },
    /// Triangle mesh loaded from a model asset.
    ObjModel {
        /// Asset name passed to the model loader.
        model: String,
        /// Uniform scale applied to the model.
        #[serde(default = "default_scale")]
        scale: f32,
    },
}

fn default_scale() -> f32 {
    1.0
}

impl Shape {
    /// Short name of the shape kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Sphere { .. } => "sphere",
            Shape::Box { .. } => "box",
            Shape::Plane { .. } => "plane",
            Shape::ObjModel { .. } => "objmodel",
        }
    }
}

/// Initial placement of a body.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    /// Translation.
    #[serde(default)]
    pub position: Vec3,
    /// Rotation as Euler angles in degrees (roll, pitch, yaw about X, Y, Z).
    #[serde(default)]
    pub rotation: Vec3,
}

/// One body entry of the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyDescriptor {
    /// Unique body name.
    pub name: String,
    /// Shape parameters.
    pub shape: Shape,
    /// Initial transform.
    #[serde(default)]
    pub transform: Transform,
    /// Mass in kg; 0 makes the body static.
    #[serde(default)]
    pub mass: f32,
    /// Material name.
    pub material: String,
    /// Texture name overriding the material texture.
    #[serde(default)]
    pub texture: Option<String>,
}

/// A scene document, the root "simulation" element of a scene file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    /// Initial camera.
    #[serde(default)]
    pub camera: CameraParams,
    /// World gravity.
    pub gravity: Vec3,
    /// Texture definitions.
    #[serde(default)]
    pub textures: Vec<TextureRef>,
    /// Material definitions.
    pub materials: Vec<Material>,
    /// Goal condition.
    pub goal: Goal,
    /// Bodies in creation order.
    pub bodies: Vec<BodyDescriptor>,
}

/// Wrapper matching the `{ "simulation": { ... } }` file layout.
#[derive(Deserialize)]
struct SceneFile {
    simulation: SceneDescription,
}

impl SceneDescription {
    /// Parse and validate a JSON scene document.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: SceneFile =
            serde_json::from_str(json).map_err(|e| ConfigurationError::Parse(e.to_string()))?;
        file.simulation.validate()?;
        Ok(file.simulation)
    }

    /// Parse and validate a TOML scene document.
    pub fn from_toml(text: &str) -> Result<Self> {
        let file: SceneFile =
            toml::from_str(text).map_err(|e| ConfigurationError::Parse(e.to_string()))?;
        file.simulation.validate()?;
        Ok(file.simulation)
    }

    /// Load a scene file, choosing the format by extension (`.json` or `.toml`).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let scene = match ext.to_lowercase().as_str() {
            "json" => Self::from_json(&text)?,
            "toml" => Self::from_toml(&text)?,
            other => return Err(ConfigurationError::UnsupportedFormat(other.to_string())),
        };

        tracing::info!(
            path = %path.display(),
            bodies = scene.bodies.len(),
            materials = scene.materials.len(),
            "loaded scene"
        );
        Ok(scene)
    }

    /// Serialize to a JSON string in the file layout.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&serde_json::json!({ "simulation": self }))
    }

    /// Check referential integrity.
    ///
    /// Every name a body, material or the goal refers to must be defined, and
    /// names must be unique within their list.
    pub fn validate(&self) -> Result<()> {
        self.camera.validate()?;

        let mut textures = HashSet::new();
        for texture in &self.textures {
            if !textures.insert(texture.name.as_str()) {
                return Err(ConfigurationError::DuplicateName {
                    kind: "texture",
                    name: texture.name.clone(),
                });
            }
        }

        let mut materials = HashSet::new();
        for material in &self.materials {
            if !materials.insert(material.name.as_str()) {
                return Err(ConfigurationError::DuplicateName {
                    kind: "material",
                    name: material.name.clone(),
                });
            }
            if let Some(texture) = &material.texture {
                if !textures.contains(texture.as_str()) {
                    return Err(ConfigurationError::UnknownTexture {
                        owner: format!("material '{}'", material.name),
                        texture: texture.clone(),
                    });
                }
            }
        }

        let mut bodies = HashSet::new();
        for body in &self.bodies {
            if !bodies.insert(body.name.as_str()) {
                return Err(ConfigurationError::DuplicateBody(body.name.clone()));
            }
            if !materials.contains(body.material.as_str()) {
                return Err(ConfigurationError::UnknownMaterial {
                    body: body.name.clone(),
                    material: body.material.clone(),
                });
            }
            if let Some(texture) = &body.texture {
                if !textures.contains(texture.as_str()) {
                    return Err(ConfigurationError::UnknownTexture {
                        owner: format!("body '{}'", body.name),
                        texture: texture.clone(),
                    });
                }
            }
        }

        if !bodies.contains(self.goal.body.as_str()) {
            return Err(ConfigurationError::UnknownGoalBody(self.goal.body.clone()));
        }

        Ok(())
    }

    /// Look up a material by name.
    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.iter().find(|m| m.name == name)
    }

    /// Look up a texture by name.
    pub fn texture(&self, name: &str) -> Option<&TextureRef> {
        self.textures.iter().find(|t| t.name == name)
    }

    /// Texture name in effect for a body: its own, else its material's.
    pub fn body_texture<'a>(&'a self, body: &'a BodyDescriptor) -> Option<&'a TextureRef> {
        body.texture
            .as_deref()
            .or_else(|| self.material(&body.material)?.texture.as_deref())
            .and_then(|name| self.texture(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DROP_SCENE: &str = r#"{
        "simulation": {
            "camera": { "position": { "x": 0.0, "y": 2.0, "z": 12.0 }, "fov": 60.0 },
            "gravity": { "x": 0.0, "y": -9.8, "z": 0.0 },
            "textures": [ { "name": "checker", "file": "checker" } ],
            "materials": [
                { "name": "rubber", "color": [0.9, 0.1, 0.1], "restitution": 0.8 },
                { "name": "stone", "texture": "checker" }
            ],
            "goal": { "body": "ball", "condition": { "kind": "below", "axis": "y", "value": -10.0 } },
            "bodies": [
                {
                    "name": "ball",
                    "shape": { "type": "sphere", "radius": 0.5 },
                    "transform": { "position": { "x": 0.0, "y": 0.0, "z": 0.0 } },
                    "mass": 1.0,
                    "material": "rubber"
                },
                {
                    "name": "crate",
                    "shape": { "type": "box", "half_extents": { "x": 1.0, "y": 1.0, "z": 1.0 } },
                    "mass": 2.0,
                    "material": "stone"
                }
            ]
        }
    }"#;

    #[test]
    fn parse_json_scene() {
        let scene = SceneDescription::from_json(DROP_SCENE).unwrap();
        assert_eq!(scene.bodies.len(), 2);
        assert_eq!(scene.camera.fov, 60.0);
        assert_eq!(scene.camera.near, 0.1);
        assert_eq!(scene.gravity, Vec3::new(0.0, -9.8, 0.0));
        assert_eq!(scene.bodies[0].shape, Shape::Sphere { radius: 0.5 });
        assert_eq!(scene.material("stone").unwrap().friction, 0.5);
        assert_eq!(
            scene.goal.condition,
            GoalCondition::Below {
                axis: Axis::Y,
                value: -10.0
            }
        );
    }

    #[test]
    fn body_texture_falls_back_to_material() {
        let scene = SceneDescription::from_json(DROP_SCENE).unwrap();
        assert!(scene.body_texture(&scene.bodies[0]).is_none());
        assert_eq!(
            scene.body_texture(&scene.bodies[1]).map(|t| t.file.as_str()),
            Some("checker")
        );
    }

    #[test]
    fn undefined_material_is_rejected() {
        let json = DROP_SCENE.replace(r#""material": "rubber""#, r#""material": "glass""#);
        match SceneDescription::from_json(&json) {
            Err(ConfigurationError::UnknownMaterial { body, material }) => {
                assert_eq!(body, "ball");
                assert_eq!(material, "glass");
            }
            other => panic!("expected UnknownMaterial, got {other:?}"),
        }
    }

    #[test]
    fn undefined_texture_is_rejected() {
        let json = DROP_SCENE.replace(r#""texture": "checker""#, r#""texture": "marble""#);
        let err = SceneDescription::from_json(&json).unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownTexture { .. }));
        assert!(err.to_string().contains("material 'stone'"));
    }

    #[test]
    fn goal_body_must_exist() {
        let json = DROP_SCENE.replace(r#""body": "ball""#, r#""body": "ghost""#);
        assert!(matches!(
            SceneDescription::from_json(&json),
            Err(ConfigurationError::UnknownGoalBody(name)) if name == "ghost"
        ));
    }

    #[test]
    fn camera_must_form_a_frustum() {
        let superimposed = DROP_SCENE.replace(r#""fov": 60.0"#, r#""fov": 60.0, "near": 1.0, "far": 1.0"#);
        assert!(matches!(
            SceneDescription::from_json(&superimposed),
            Err(ConfigurationError::InvalidCamera { .. })
        ));

        let mut camera = CameraParams::default();
        camera.near = 0.0;
        assert!(camera.validate().is_err());

        camera = CameraParams { fov: 180.0, ..CameraParams::default() };
        assert!(camera.validate().is_err());

        camera = CameraParams { far: f32::INFINITY, ..CameraParams::default() };
        assert!(camera.validate().is_err());

        assert!(CameraParams::default().validate().is_ok());
    }

    #[test]
    fn duplicate_body_names_are_rejected() {
        let json = DROP_SCENE.replace(r#""name": "crate""#, r#""name": "ball""#);
        assert!(matches!(
            SceneDescription::from_json(&json),
            Err(ConfigurationError::DuplicateBody(_))
        ));
    }

    #[test]
    fn toml_scene() {
        let text = r#"
            [simulation]
            gravity = { x = 0.0, y = -9.8, z = 0.0 }

            [[simulation.materials]]
            name = "steel"

            [simulation.goal]
            body = "floor"
            condition = { kind = "region", min = { x = -1.0, y = -1.0, z = -1.0 }, max = { x = 1.0, y = 1.0, z = 1.0 } }

            [[simulation.bodies]]
            name = "floor"
            shape = { type = "plane", normal = { x = 0.0, y = 1.0, z = 0.0 } }
            material = "steel"

            [[simulation.bodies]]
            name = "teapot"
            shape = { type = "objmodel", model = "teapot" }
            mass = 3.0
            material = "steel"
        "#;
        let scene = SceneDescription::from_toml(text).unwrap();
        assert_eq!(scene.bodies[0].mass, 0.0);
        assert_eq!(
            scene.bodies[1].shape,
            Shape::ObjModel {
                model: "teapot".to_string(),
                scale: 1.0
            }
        );
        assert_eq!(scene.bodies[1].shape.kind(), "objmodel");
    }

    #[test]
    fn malformed_document_is_parse_error() {
        assert!(matches!(
            SceneDescription::from_json(r#"{ "simulation": { "gravity": 3 } }"#),
            Err(ConfigurationError::Parse(_))
        ));
    }

    #[test]
    fn json_roundtrip_keeps_layout() {
        let scene = SceneDescription::from_json(DROP_SCENE).unwrap();
        let json = scene.to_json().unwrap();
        assert!(json.contains(r#""simulation""#));
        assert!(json.contains(r#""type": "sphere""#));
        assert_eq!(SceneDescription::from_json(&json).unwrap(), scene);
    }
}
