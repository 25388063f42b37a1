//! The render collaborator interface.
//!
//! The frame loop only talks to graphics through [`RenderDevice`]. Geometry
//! lives in a device-owned table and is referenced by [`MeshHandle`], so a
//! body never holds a native graphics object.

use nalgebra::{Isometry3, Matrix4, Point2, Point3};
use serde::{Deserialize, Serialize};

use crate::error::{RenderSurfaceError, ResourceError};
use crate::mesh::TriangleMesh;

slotmap::new_key_type! {
    /// Index of an uploaded mesh in the device's mesh table.
    pub struct MeshHandle;
}

/// Compiled shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

impl ProgramHandle {
    /// Fixed-function fallback; always valid, never deleted.
    pub const FALLBACK: ProgramHandle = ProgramHandle(0);
}

/// Uploaded texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

impl TextureHandle {
    /// The "no texture" placeholder, substituted when a texture fails to load.
    pub const NONE: TextureHandle = TextureHandle(0);

    /// True for the placeholder.
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

/// Decoded RGBA8 image.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGBA8 pixels.
    pub pixels: Vec<u8>,
}

/// Single point light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    /// Ambient RGBA.
    pub ambient: [f32; 4],
    /// Diffuse RGBA.
    pub diffuse: [f32; 4],
    /// Specular RGBA.
    pub specular: [f32; 4],
    /// Homogeneous position.
    pub position: [f32; 4],
}

impl Default for Light {
    fn default() -> Self {
        Self {
            ambient: [0.5, 0.5, 0.5, 1.0],
            diffuse: [1.0, 1.0, 1.0, 1.0],
            specular: [10.0, 10.0, 10.0, 1.0],
            position: [0.0, 0.0, -60.0, 1.0],
        }
    }
}

/// Colored world-space line segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    /// Start point.
    pub from: Point3<f32>,
    /// End point.
    pub to: Point3<f32>,
    /// RGB color.
    pub color: [f32; 3],
}

impl Line {
    /// Create a line segment.
    pub fn new(from: Point3<f32>, to: Point3<f32>, color: [f32; 3]) -> Self {
        Self { from, to, color }
    }
}

/// Screen-space rectangle in pixels, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    /// Top-left corner.
    pub min: Point2<f32>,
    /// Bottom-right corner.
    pub max: Point2<f32>,
    /// RGB color.
    pub color: [f32; 3],
}

/// Surface appearance passed with each mesh draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    /// Base RGB color.
    pub color: [f32; 3],
    /// Texture, or [`TextureHandle::NONE`].
    pub texture: TextureHandle,
}

/// Graphics device the frame loop renders through.
///
/// Implementations own every GPU-side resource. Handles returned here stay
/// valid until explicitly released.
pub trait RenderDevice {
    /// Whether the surface can still be drawn to.
    fn surface_valid(&self) -> bool;

    /// Viewport size in pixels.
    fn viewport(&self) -> (u32, u32);

    /// Compile and link a shader program.
    fn compile_program(
        &mut self,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<ProgramHandle, ResourceError>;

    /// Bind a program for subsequent draws.
    fn use_program(&mut self, program: ProgramHandle);

    /// Delete a program. Deleting [`ProgramHandle::FALLBACK`] is a no-op.
    fn delete_program(&mut self, program: ProgramHandle);

    /// Upload geometry and return its table index.
    fn upload_mesh(&mut self, mesh: &TriangleMesh) -> MeshHandle;

    /// Free geometry. Returns false if the handle was already released.
    fn release_mesh(&mut self, mesh: MeshHandle) -> bool;

    /// Upload texture pixels.
    fn upload_texture(&mut self, image: &TextureImage) -> TextureHandle;

    /// Free a texture. Releasing [`TextureHandle::NONE`] is a no-op.
    fn release_texture(&mut self, texture: TextureHandle);

    /// Configure the scene light.
    fn set_light(&mut self, light: &Light);

    /// Set the projection matrix for world-space draws.
    fn set_projection(&mut self, projection: &Matrix4<f32>);

    /// Set the view matrix for world-space draws.
    fn set_view(&mut self, view: &Matrix4<f32>);

    /// Clear color and depth.
    fn clear(&mut self);

    /// Clear depth only, so later draws sit on top.
    fn clear_depth(&mut self);

    /// Draw a mesh at a world transform.
    fn draw_mesh(&mut self, mesh: MeshHandle, transform: &Isometry3<f32>, surface: &Surface);

    /// Draw world-space line segments.
    fn draw_lines(&mut self, lines: &[Line]);

    /// Draw screen-space quads (orthographic, pixel coordinates).
    fn draw_overlay_quads(&mut self, quads: &[Quad]);

    /// Present the frame. May block for vertical sync.
    fn present(&mut self) -> Result<(), RenderSurfaceError>;
}
