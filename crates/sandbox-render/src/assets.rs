//! Texture and model asset loading.
//!
//! Asset failures are never fatal: textures fall back to
//! [`TextureHandle::NONE`], models to [`TriangleMesh::unit_cube`].

use std::collections::HashMap;
use std::path::PathBuf;

use crate::device::{RenderDevice, TextureHandle, TextureImage};
use crate::error::ResourceError;
use crate::mesh::TriangleMesh;
use crate::obj::parse_obj;

/// Source of texture images.
pub trait TextureLoader {
    /// Read and decode the named texture.
    fn read_texture(&mut self, name: &str) -> Result<TextureImage, ResourceError>;

    /// Load and upload a texture, substituting the placeholder on failure.
    fn load(&mut self, name: &str, device: &mut dyn RenderDevice) -> TextureHandle {
        match self.read_texture(name) {
            Ok(image) => device.upload_texture(&image),
            Err(e) => {
                tracing::warn!(texture = name, error = %e, "using placeholder texture");
                TextureHandle::NONE
            }
        }
    }
}

/// Source of model geometry.
pub trait ModelLoader {
    /// Read and parse the named model.
    fn read_model(&mut self, name: &str) -> Result<TriangleMesh, ResourceError>;

    /// Load a model, substituting a unit cube on failure.
    fn load_model(&mut self, name: &str) -> TriangleMesh {
        match self.read_model(name) {
            Ok(mesh) => mesh,
            Err(e) => {
                tracing::warn!(model = name, error = %e, "using placeholder model");
                TriangleMesh::unit_cube()
            }
        }
    }
}

/// Loads `<textures>/<name>.png` and `<models>/<name>.obj` from disk.
#[derive(Debug, Clone)]
pub struct FsAssets {
    textures: PathBuf,
    models: PathBuf,
}

impl FsAssets {
    /// Create a loader rooted at the given directories.
    pub fn new(textures: impl Into<PathBuf>, models: impl Into<PathBuf>) -> Self {
        Self {
            textures: textures.into(),
            models: models.into(),
        }
    }
}

impl TextureLoader for FsAssets {
    fn read_texture(&mut self, name: &str) -> Result<TextureImage, ResourceError> {
        let path = self.textures.join(format!("{name}.png"));
        let bytes = std::fs::read(&path).map_err(|source| ResourceError::Io {
            name: name.to_string(),
            source,
        })?;
        let image = image::load_from_memory_with_format(&bytes, image::ImageFormat::Png)
            .map_err(|e| ResourceError::Decode {
                name: name.to_string(),
                reason: e.to_string(),
            })?
            .to_rgba8();

        Ok(TextureImage {
            width: image.width(),
            height: image.height(),
            pixels: image.into_raw(),
        })
    }
}

impl ModelLoader for FsAssets {
    fn read_model(&mut self, name: &str) -> Result<TriangleMesh, ResourceError> {
        let path = self.models.join(format!("{name}.obj"));
        let text = std::fs::read_to_string(&path).map_err(|source| ResourceError::Io {
            name: name.to_string(),
            source,
        })?;
        parse_obj(name, &text)
    }
}

/// In-memory asset store.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    /// Textures by name.
    pub textures: HashMap<String, TextureImage>,
    /// Models by name.
    pub models: HashMap<String, TriangleMesh>,
}

impl MemoryAssets {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TextureLoader for MemoryAssets {
    fn read_texture(&mut self, name: &str) -> Result<TextureImage, ResourceError> {
        self.textures
            .get(name)
            .cloned()
            .ok_or_else(|| ResourceError::Io {
                name: name.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not in store"),
            })
    }
}

impl ModelLoader for MemoryAssets {
    fn read_model(&mut self, name: &str) -> Result<TriangleMesh, ResourceError> {
        self.models
            .get(name)
            .cloned()
            .ok_or_else(|| ResourceError::Io {
                name: name.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not in store"),
            })
    }
}

/// Combined loader handed to the model.
pub trait AssetLoader: TextureLoader + ModelLoader {}

impl<T: TextureLoader + ModelLoader + ?Sized> AssetLoader for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessDevice;

    #[test]
    fn missing_texture_file_yields_placeholder() {
        let mut assets = FsAssets::new("/nonexistent/textures", "/nonexistent/models");
        let mut device = HeadlessDevice::new(64, 64);
        let handle = assets.load("brick", &mut device);
        assert!(handle.is_none());
        assert_eq!(device.live_textures(), 0);
    }

    #[test]
    fn missing_model_yields_unit_cube() {
        let mut assets = MemoryAssets::new();
        let mesh = assets.load_model("teapot");
        assert_eq!(mesh, TriangleMesh::unit_cube());
    }

    #[test]
    fn non_finite_model_file_yields_unit_cube() {
        let dir = std::env::temp_dir().join(format!("sandbox-nan-obj-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("spike.obj"), "v nan 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

        let mut assets = FsAssets::new(&dir, &dir);
        assert_eq!(assets.load_model("spike"), TriangleMesh::unit_cube());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn stored_texture_is_uploaded() {
        let mut assets = MemoryAssets::new();
        assets.textures.insert(
            "white".to_string(),
            TextureImage {
                width: 1,
                height: 1,
                pixels: vec![255; 4],
            },
        );
        let mut device = HeadlessDevice::new(64, 64);
        let handle = assets.load("white", &mut device);
        assert!(!handle.is_none());
        assert_eq!(device.live_textures(), 1);
    }

    #[test]
    fn png_on_disk_is_decoded() {
        let dir = std::env::temp_dir().join(format!("sandbox-assets-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        image::RgbaImage::from_pixel(2, 3, image::Rgba([10, 20, 30, 255]))
            .save(dir.join("tile.png"))
            .unwrap();

        let mut assets = FsAssets::new(&dir, &dir);
        let texture = assets.read_texture("tile").unwrap();
        assert_eq!((texture.width, texture.height), (2, 3));
        assert_eq!(&texture.pixels[..4], &[10, 20, 30, 255]);

        std::fs::remove_dir_all(&dir).ok();
    }
}
