#![warn(missing_docs)]

//! Render collaborators for the rigid-body sandbox.
//!
//! The simulation core never touches a graphics API directly. It draws
//! through the [`RenderDevice`] trait, holds geometry as [`MeshHandle`]
//! indices into the device's own table, and loads assets through
//! [`TextureLoader`] / [`ModelLoader`], both of which degrade to placeholders
//! instead of failing.
//!
//! [`HeadlessDevice`] implements the device without a window; it keeps real
//! resource accounting so leaks show up in tests.

pub mod assets;
pub mod device;
pub mod error;
pub mod headless;
pub mod mesh;
pub mod obj;

pub use assets::{AssetLoader, FsAssets, MemoryAssets, ModelLoader, TextureLoader};
pub use device::{
    Light, Line, MeshHandle, ProgramHandle, Quad, RenderDevice, Surface, TextureHandle,
    TextureImage,
};
pub use error::{RenderSurfaceError, ResourceError};
pub use headless::{DrawCall, FrameRecord, HeadlessDevice};
pub use mesh::TriangleMesh;
pub use obj::parse_obj;
