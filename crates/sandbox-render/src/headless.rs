//! A [`RenderDevice`] that draws nothing and records everything.
//!
//! Used by tests and by the command-line runner, which has no window.

use std::collections::HashSet;

use nalgebra::{Isometry3, Matrix4};
use slotmap::SlotMap;

use crate::device::{
    Light, Line, MeshHandle, ProgramHandle, Quad, RenderDevice, Surface, TextureHandle,
    TextureImage,
};
use crate::error::{RenderSurfaceError, ResourceError};
use crate::mesh::TriangleMesh;

/// Recorded mesh draw.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    /// Mesh drawn.
    pub mesh: MeshHandle,
    /// World transform at draw time.
    pub transform: Isometry3<f32>,
    /// Surface used.
    pub surface: Surface,
    /// Program bound at draw time.
    pub program: ProgramHandle,
}

/// Everything issued between two presents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameRecord {
    /// Number of full clears.
    pub clears: u32,
    /// Projection in effect at the first mesh draw.
    pub projection: Option<Matrix4<f32>>,
    /// View in effect at the first mesh draw.
    pub view: Option<Matrix4<f32>>,
    /// Mesh draws in issue order.
    pub draws: Vec<DrawCall>,
    /// World-space lines.
    pub lines: Vec<Line>,
    /// Screen-space quads.
    pub overlay: Vec<Quad>,
}

#[derive(Debug)]
struct MeshEntry {
    triangles: usize,
}

/// Headless device with a real mesh table and resource accounting.
#[derive(Debug)]
pub struct HeadlessDevice {
    viewport: (u32, u32),
    meshes: SlotMap<MeshHandle, MeshEntry>,
    programs: HashSet<u32>,
    textures: HashSet<u32>,
    next_id: u32,
    bound_program: ProgramHandle,
    projection: Matrix4<f32>,
    view: Matrix4<f32>,
    light: Option<Light>,
    surface_lost: bool,
    fail_shaders: bool,
    current: FrameRecord,
    last: Option<FrameRecord>,
    presented: u64,
}

impl HeadlessDevice {
    /// Create a device with the given viewport size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            viewport: (width, height),
            meshes: SlotMap::with_key(),
            programs: HashSet::new(),
            textures: HashSet::new(),
            next_id: 1,
            bound_program: ProgramHandle::FALLBACK,
            projection: Matrix4::identity(),
            view: Matrix4::identity(),
            light: None,
            surface_lost: false,
            fail_shaders: false,
            current: FrameRecord::default(),
            last: None,
            presented: 0,
        }
    }

    /// Simulate the window or context going away.
    pub fn lose_surface(&mut self) {
        self.surface_lost = true;
    }

    /// Make every subsequent program compilation fail.
    pub fn fail_shader_compilation(&mut self, fail: bool) {
        self.fail_shaders = fail;
    }

    /// Number of meshes currently in the table.
    pub fn live_meshes(&self) -> usize {
        self.meshes.len()
    }

    /// Number of programs not yet deleted.
    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    /// Number of textures not yet released.
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    /// Triangle count of an uploaded mesh.
    pub fn mesh_triangles(&self, mesh: MeshHandle) -> Option<usize> {
        self.meshes.get(mesh).map(|m| m.triangles)
    }

    /// Frames presented so far.
    pub fn frames_presented(&self) -> u64 {
        self.presented
    }

    /// Record of the most recently presented frame.
    pub fn last_frame(&self) -> Option<&FrameRecord> {
        self.last.as_ref()
    }

    /// Light last configured.
    pub fn light(&self) -> Option<&Light> {
        self.light.as_ref()
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl RenderDevice for HeadlessDevice {
    fn surface_valid(&self) -> bool {
        !self.surface_lost
    }

    fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    fn compile_program(
        &mut self,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<ProgramHandle, ResourceError> {
        if self.fail_shaders {
            return Err(ResourceError::Shader("compilation disabled".to_string()));
        }
        if vertex_src.trim().is_empty() || fragment_src.trim().is_empty() {
            return Err(ResourceError::Shader("empty shader source".to_string()));
        }
        let id = self.allocate_id();
        self.programs.insert(id);
        Ok(ProgramHandle(id))
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.bound_program = program;
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        if program != ProgramHandle::FALLBACK {
            self.programs.remove(&program.0);
        }
    }

    fn upload_mesh(&mut self, mesh: &TriangleMesh) -> MeshHandle {
        self.meshes.insert(MeshEntry {
            triangles: mesh.num_triangles(),
        })
    }

    fn release_mesh(&mut self, mesh: MeshHandle) -> bool {
        self.meshes.remove(mesh).is_some()
    }

    fn upload_texture(&mut self, _image: &TextureImage) -> TextureHandle {
        let id = self.allocate_id();
        self.textures.insert(id);
        TextureHandle(id)
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        if !texture.is_none() {
            self.textures.remove(&texture.0);
        }
    }

    fn set_light(&mut self, light: &Light) {
        self.light = Some(*light);
    }

    fn set_projection(&mut self, projection: &Matrix4<f32>) {
        self.projection = *projection;
    }

    fn set_view(&mut self, view: &Matrix4<f32>) {
        self.view = *view;
    }

    fn clear(&mut self) {
        self.current.clears += 1;
    }

    fn clear_depth(&mut self) {}

    fn draw_mesh(&mut self, mesh: MeshHandle, transform: &Isometry3<f32>, surface: &Surface) {
        if self.current.draws.is_empty() {
            self.current.projection = Some(self.projection);
            self.current.view = Some(self.view);
        }
        self.current.draws.push(DrawCall {
            mesh,
            transform: *transform,
            surface: *surface,
            program: self.bound_program,
        });
    }

    fn draw_lines(&mut self, lines: &[Line]) {
        self.current.lines.extend_from_slice(lines);
    }

    fn draw_overlay_quads(&mut self, quads: &[Quad]) {
        self.current.overlay.extend_from_slice(quads);
    }

    fn present(&mut self) -> Result<(), RenderSurfaceError> {
        if self.surface_lost {
            return Err(RenderSurfaceError("headless surface lost".to_string()));
        }
        self.presented += 1;
        self.last = Some(std::mem::take(&mut self.current));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_table_release_is_idempotent() {
        let mut device = HeadlessDevice::new(640, 480);
        let handle = device.upload_mesh(&TriangleMesh::unit_cube());
        assert_eq!(device.live_meshes(), 1);
        assert_eq!(device.mesh_triangles(handle), Some(12));

        assert!(device.release_mesh(handle));
        assert!(!device.release_mesh(handle));
        assert_eq!(device.live_meshes(), 0);
    }

    #[test]
    fn present_moves_frame_record() {
        let mut device = HeadlessDevice::new(640, 480);
        let handle = device.upload_mesh(&TriangleMesh::unit_cube());
        device.clear();
        device.draw_mesh(
            handle,
            &Isometry3::identity(),
            &Surface {
                color: [1.0, 0.0, 0.0],
                texture: TextureHandle::NONE,
            },
        );
        device.present().unwrap();

        let frame = device.last_frame().unwrap();
        assert_eq!(frame.clears, 1);
        assert_eq!(frame.draws.len(), 1);
        assert_eq!(device.frames_presented(), 1);
    }

    #[test]
    fn lost_surface_fails_present() {
        let mut device = HeadlessDevice::new(640, 480);
        device.lose_surface();
        assert!(!device.surface_valid());
        assert!(device.present().is_err());
    }

    #[test]
    fn program_bookkeeping() {
        let mut device = HeadlessDevice::new(640, 480);
        let program = device.compile_program("void main() {}", "void main() {}").unwrap();
        assert_eq!(device.live_programs(), 1);
        device.delete_program(ProgramHandle::FALLBACK);
        assert_eq!(device.live_programs(), 1);
        device.delete_program(program);
        assert_eq!(device.live_programs(), 0);

        device.fail_shader_compilation(true);
        assert!(device.compile_program("a", "b").is_err());
    }
}
