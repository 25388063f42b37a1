//! The simulation model: a physics world built from a scene, plus its goal.

use std::collections::HashMap;

use nalgebra::Vector3;
use sandbox_render::{AssetLoader, RenderDevice, TextureHandle};
use sandbox_scene::{ConfigurationError, SceneDescription};
use tracing::{debug, info};

use crate::body::Body;
use crate::colliders::render_geometry;
use crate::error::ModelError;
use crate::goal::GoalPredicate;
use crate::world::{PhysicsWorld, StepConfig};

/// Physics world, body set and goal for one loaded scene.
pub struct Model {
    config: StepConfig,
    world: PhysicsWorld,
    goal: Option<GoalPredicate>,
    goal_achieved: bool,
    textures: Vec<TextureHandle>,
}

impl Model {
    /// Create a model with no scene loaded.
    pub fn new(config: StepConfig) -> Self {
        Self {
            config,
            world: PhysicsWorld::new(Vector3::zeros(), config),
            goal: None,
            goal_achieved: false,
            textures: Vec::new(),
        }
    }

    /// Tear down the current world and rebuild it from `scene`.
    ///
    /// The scene is validated before anything is released or allocated. If a
    /// body fails to build, the whole load is abandoned: everything created so
    /// far is released and the model is left empty.
    pub fn reset<A>(
        &mut self,
        scene: &SceneDescription,
        device: &mut dyn RenderDevice,
        assets: &mut A,
    ) -> Result<(), ModelError>
    where
        A: AssetLoader + ?Sized,
    {
        scene.validate()?;
        self.teardown(device);

        let g = scene.gravity;
        self.world = PhysicsWorld::new(Vector3::new(g.x, g.y, g.z), self.config);

        if let Err(e) = self.populate(scene, device, assets) {
            self.teardown(device);
            return Err(e);
        }

        info!(
            bodies = self.world.bodies().len(),
            textures = self.textures.len(),
            "scene instantiated"
        );
        Ok(())
    }

    fn populate<A>(
        &mut self,
        scene: &SceneDescription,
        device: &mut dyn RenderDevice,
        assets: &mut A,
    ) -> Result<(), ModelError>
    where
        A: AssetLoader + ?Sized,
    {
        let mut textures = HashMap::new();
        for texture in &scene.textures {
            let handle = assets.load(&texture.file, device);
            if !handle.is_none() {
                self.textures.push(handle);
            }
            textures.insert(texture.name.as_str(), handle);
        }

        for desc in &scene.bodies {
            let material =
                scene
                    .material(&desc.material)
                    .ok_or_else(|| ConfigurationError::UnknownMaterial {
                        body: desc.name.clone(),
                        material: desc.material.clone(),
                    })?;
            let texture = scene
                .body_texture(desc)
                .and_then(|t| textures.get(t.name.as_str()).copied())
                .unwrap_or(TextureHandle::NONE);
            let geometry = render_geometry(&desc.shape, assets);

            self.world
                .add_body(desc, material, texture, &geometry, device)?;
        }

        let index = self
            .world
            .body_index(&scene.goal.body)
            .ok_or_else(|| ConfigurationError::UnknownGoalBody(scene.goal.body.clone()))?;
        self.goal = Some(GoalPredicate::new(&scene.goal, index));
        self.goal_achieved = false;
        Ok(())
    }

    /// Advance physics by `dt` and evaluate the goal.
    ///
    /// Returns true only on the step where the goal is first achieved. Later
    /// steps return false even while the condition still holds, until the
    /// next reset.
    pub fn step(&mut self, dt: f32) -> bool {
        let substeps = self.world.step(dt);
        if substeps > 1 {
            debug!(substeps, "multiple substeps this frame");
        }

        if self.goal_achieved {
            return false;
        }
        let satisfied = self
            .goal
            .as_ref()
            .is_some_and(|goal| goal.is_satisfied(self.world.bodies()));
        if satisfied {
            self.goal_achieved = true;
            info!(elapsed = self.world.elapsed(), "goal achieved");
        }
        satisfied
    }

    /// Release every body, mesh and texture owned by the current scene.
    ///
    /// Idempotent.
    pub fn teardown(&mut self, device: &mut dyn RenderDevice) {
        self.world.clear(device);
        for texture in self.textures.drain(..) {
            device.release_texture(texture);
        }
        self.goal = None;
        self.goal_achieved = false;
    }

    /// Live bodies in scene order.
    pub fn bodies(&self) -> &[Body] {
        self.world.bodies()
    }

    /// The physics world.
    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    /// Whether the goal has been achieved since the last reset.
    pub fn goal_achieved(&self) -> bool {
        self.goal_achieved
    }

    /// Simulated time since the last reset, in seconds.
    pub fn elapsed(&self) -> f64 {
        self.world.elapsed()
    }

    /// Current gravity.
    pub fn gravity(&self) -> Vector3<f32> {
        self.world.gravity()
    }

    /// Change gravity for the running scene.
    pub fn set_gravity(&mut self, gravity: Vector3<f32>) {
        self.world.set_gravity(gravity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PhysicsError;
    use sandbox_render::{HeadlessDevice, MemoryAssets, TextureImage};

    fn drop_scene(goal_y: f32) -> SceneDescription {
        let json = format!(
            r#"{{
            "simulation": {{
                "gravity": {{ "x": 0.0, "y": -9.8, "z": 0.0 }},
                "textures": [ {{ "name": "checker", "file": "checker" }} ],
                "materials": [ {{ "name": "rubber", "texture": "checker" }} ],
                "goal": {{ "body": "sphere", "condition": {{ "kind": "below", "axis": "y", "value": {goal_y} }} }},
                "bodies": [
                    {{ "name": "sphere", "shape": {{ "type": "sphere", "radius": 0.5 }}, "mass": 1.0, "material": "rubber" }},
                    {{ "name": "crate", "shape": {{ "type": "box", "half_extents": {{ "x": 1.0, "y": 1.0, "z": 1.0 }} }},
                       "transform": {{ "position": {{ "x": 10.0, "y": 0.0, "z": 0.0 }} }}, "material": "rubber" }}
                ]
            }}
        }}"#
        );
        SceneDescription::from_json(&json).unwrap()
    }

    fn assets() -> MemoryAssets {
        let mut assets = MemoryAssets::new();
        assets.textures.insert(
            "checker".to_string(),
            TextureImage {
                width: 1,
                height: 1,
                pixels: vec![0, 0, 0, 255],
            },
        );
        assets
    }

    #[test]
    fn teardown_leaves_no_handles() {
        let mut device = HeadlessDevice::new(320, 240);
        let mut model = Model::new(StepConfig::default());
        model.reset(&drop_scene(-10.0), &mut device, &mut assets()).unwrap();

        assert_eq!(model.bodies().len(), 2);
        assert_eq!(device.live_meshes(), 2);
        assert_eq!(device.live_textures(), 1);
        assert!(!model.bodies()[0].texture().is_none());

        for _ in 0..20 {
            model.step(1.0 / 60.0);
        }
        model.teardown(&mut device);
        model.teardown(&mut device);

        assert_eq!(model.world().body_count(), 0);
        assert_eq!(model.world().collider_count(), 0);
        assert_eq!(device.live_meshes(), 0);
        assert_eq!(device.live_textures(), 0);
    }

    #[test]
    fn repeated_reset_does_not_leak() {
        let mut device = HeadlessDevice::new(320, 240);
        let mut model = Model::new(StepConfig::default());
        let scene = drop_scene(-10.0);
        let mut assets = assets();

        for _ in 0..3 {
            model.reset(&scene, &mut device, &mut assets).unwrap();
            model.step(1.0 / 60.0);
        }

        assert_eq!(model.world().body_count(), 2);
        assert_eq!(device.live_meshes(), 2);
        assert_eq!(device.live_textures(), 1);
        assert_eq!(model.elapsed(), model.world().config().fixed_dt as f64);
    }

    #[test]
    fn goal_is_edge_triggered() {
        let mut device = HeadlessDevice::new(320, 240);
        let mut model = Model::new(StepConfig::default());
        model.reset(&drop_scene(-1.0), &mut device, &mut assets()).unwrap();

        let reports: Vec<bool> = (0..120).map(|_| model.step(1.0 / 60.0)).collect();
        assert_eq!(reports.iter().filter(|&&r| r).count(), 1);
        assert!(model.goal_achieved());
        assert!(model.bodies()[0].position().y < -1.0);
    }

    #[test]
    fn falling_sphere_reaches_goal_at_expected_time() {
        let mut device = HeadlessDevice::new(320, 240);
        let mut model = Model::new(StepConfig::default());
        model.reset(&drop_scene(-10.0), &mut device, &mut assets()).unwrap();

        let fixed_dt = model.world().config().fixed_dt as f64;
        let expected = (2.0 * 10.0 / 9.8_f64).sqrt();
        let mut previous_y = model.bodies()[0].position().y;
        let mut achieved_at = None;

        for _ in 0..180 {
            let achieved = model.step(1.0 / 60.0);
            let y = model.bodies()[0].position().y;
            if achieved {
                assert!(achieved_at.is_none(), "goal reported twice");
                assert!(previous_y >= -10.0 && y < -10.0, "not the crossing step");
                achieved_at = Some(model.elapsed());
            }
            previous_y = y;
        }

        let t = achieved_at.expect("goal never achieved");
        assert!((t - expected).abs() <= fixed_dt, "achieved at {t}, expected ~{expected}");
    }

    #[test]
    fn undefined_material_fails_before_allocation() {
        let mut device = HeadlessDevice::new(320, 240);
        let mut model = Model::new(StepConfig::default());
        let mut scene = drop_scene(-10.0);
        scene.bodies[1].material = "glass".to_string();

        let err = model.reset(&scene, &mut device, &mut assets()).unwrap_err();
        assert!(matches!(
            err,
            ModelError::Configuration(ConfigurationError::UnknownMaterial { .. })
        ));
        assert_eq!(device.live_meshes(), 0);
        assert_eq!(device.live_textures(), 0);
        assert!(model.bodies().is_empty());
    }

    #[test]
    fn invalid_body_aborts_whole_load() {
        let mut device = HeadlessDevice::new(320, 240);
        let mut model = Model::new(StepConfig::default());
        let mut scene = drop_scene(-10.0);
        scene.bodies[1].mass = -3.0;

        let err = model.reset(&scene, &mut device, &mut assets()).unwrap_err();
        assert!(matches!(err, ModelError::Physics(PhysicsError::InvalidBody { .. })));
        assert!(model.bodies().is_empty());
        assert_eq!(model.world().body_count(), 0);
        assert_eq!(device.live_meshes(), 0);
        assert_eq!(device.live_textures(), 0);
    }

    #[test]
    fn missing_texture_uses_placeholder() {
        let mut device = HeadlessDevice::new(320, 240);
        let mut model = Model::new(StepConfig::default());
        model
            .reset(&drop_scene(-10.0), &mut device, &mut MemoryAssets::new())
            .unwrap();

        assert!(model.bodies().iter().all(|b| b.texture().is_none()));
        assert_eq!(device.live_textures(), 0);
    }
}
