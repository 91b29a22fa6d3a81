//! Models and the texture cache.
//!
//! A [`Model`] owns its meshes and a [`TextureCache`] that makes sure each
//! texture file is decoded at most once, however many meshes name it. The
//! decoding itself goes through the [`TextureSource`] seam so that loading can
//! be exercised without a GPU.

use std::path::{Path, PathBuf};

use glam::Vec4;

use crate::error::AssetError;
use crate::geometry::{self, RawMesh};
use crate::mesh::{Bounds2, Mesh};

/// Colour for meshes whose material has no usable diffuse colour.
pub const DEFAULT_COLOR: Vec4 = Vec4::new(0.0, 0.0, 1.0, 1.0);

/// Handle to an uploaded texture.
///
/// Ids handed out by a [`TextureSource`] start at 1; [`TextureId::NULL`]
/// records a texture that failed to load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

impl TextureId {
    pub const NULL: Self = Self(0);

    pub fn is_null(self) -> bool {
        self == Self::NULL
    }
}

/// A texture known to the cache. Identity is the path it was loaded from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Texture {
    pub id: TextureId,
    pub path: String,
}

/// Decodes and uploads a texture file.
pub trait TextureSource {
    fn upload(&mut self, path: &Path) -> Result<TextureId, AssetError>;
}

/// Stand-in source for loading a model with texturing turned off.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoTextures;

impl TextureSource for NoTextures {
    fn upload(&mut self, _path: &Path) -> Result<TextureId, AssetError> {
        Ok(TextureId::NULL)
    }
}

/// Textures loaded for one model, looked up by file name.
#[derive(Clone, Debug, Default)]
pub struct TextureCache {
    directory: PathBuf,
    loaded: Vec<Texture>,
}

impl TextureCache {
    /// An empty cache resolving names against `directory`.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            loaded: Vec::new(),
        }
    }

    /// Return the texture for `name`, uploading it through `source` on first use.
    ///
    /// A texture that fails to decode is logged and cached with a null id, so
    /// it is never retried.
    pub fn load(&mut self, name: &str, source: &mut impl TextureSource) -> Texture {
        let path = self.directory.join(name).to_string_lossy().into_owned();

        if let Some(texture) = self.loaded.iter().find(|t| t.path == path) {
            return texture.clone();
        }

        let id = match source.upload(Path::new(&path)) {
            Ok(id) => id,
            Err(e) => {
                log::warn!("texture failed to load at path: {path} ({e})");
                TextureId::NULL
            }
        };

        let texture = Texture { id, path };
        self.loaded.push(texture.clone());
        texture
    }

    /// Every texture loaded so far, in load order.
    pub fn textures(&self) -> &[Texture] {
        &self.loaded
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }
}

/// A model: its meshes, the textures they use and their combined bounds.
#[derive(Clone, Debug)]
pub struct Model {
    pub meshes: Vec<Mesh>,
    pub textures: TextureCache,
    pub directory: PathBuf,
    pub bounds: Bounds2,
}

impl Model {
    /// Load a model file, uploading any textures its materials name.
    pub fn load(path: impl AsRef<Path>, source: &mut impl TextureSource) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let raw = geometry::load_meshes(path)?;
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();

        let model = Self::from_raw_meshes(raw, directory, Some(source));
        log::info!(
            "loaded {} with {} meshes and {} textures",
            path.display(),
            model.meshes.len(),
            model.textures.len()
        );
        Ok(model)
    }

    /// Load a model file ignoring the textures its materials name.
    pub fn load_untextured(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let raw = geometry::load_meshes(path)?;
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();

        let model = Self::from_raw_meshes(raw, directory, None::<&mut NoTextures>);
        log::info!("loaded {} with {} meshes", path.display(), model.meshes.len());
        Ok(model)
    }

    /// Build a model from meshes already in memory.
    pub fn from_raw_meshes<S: TextureSource>(
        raw: Vec<RawMesh>,
        directory: PathBuf,
        mut source: Option<&mut S>,
    ) -> Self {
        let mut textures = TextureCache::new(&directory);
        let mut bounds = Bounds2::EMPTY;

        let meshes: Vec<Mesh> = raw
            .into_iter()
            .map(|raw| {
                let color = material_color(raw.diffuse);
                let texture = match (raw.diffuse_texture.as_deref(), source.as_deref_mut()) {
                    (Some(name), Some(source)) => Some(textures.load(name, source)),
                    _ => None,
                };

                log::info!(
                    "mesh '{}': {} vertices, colour {:?}, texture {:?}",
                    raw.name,
                    raw.vertices.len(),
                    color,
                    texture.as_ref().map(|t| &t.path)
                );

                let mesh = Mesh::new(raw.name, raw.vertices, raw.indices, color, texture);
                bounds = bounds.union(mesh.bounds);
                mesh
            })
            .collect();

        Self {
            meshes,
            textures,
            directory,
            bounds,
        }
    }

    /// The built-in pinwheel as a single-mesh model.
    pub fn pinwheel() -> Self {
        Self::from_raw_meshes(vec![RawMesh::pinwheel()], PathBuf::new(), None::<&mut NoTextures>)
    }
}

// An all-zero Kd is indistinguishable from a missing one here; both fall back.
fn material_color(diffuse: Option<[f32; 3]>) -> Vec4 {
    match diffuse {
        Some([r, g, b]) if [r, g, b] != [0.0, 0.0, 0.0] => Vec4::new(r, g, b, 1.0),
        _ => DEFAULT_COLOR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Vertex;
    use std::io::Write;

    /// Hands out sequential ids and records every upload request.
    #[derive(Default)]
    struct CountingSource {
        uploads: Vec<PathBuf>,
        fail: bool,
    }

    impl TextureSource for CountingSource {
        fn upload(&mut self, path: &Path) -> Result<TextureId, AssetError> {
            self.uploads.push(path.to_path_buf());
            if self.fail {
                return Err(AssetError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no such texture",
                )));
            }
            Ok(TextureId(self.uploads.len() as u32))
        }
    }

    fn square(name: &str, min: f32, max: f32) -> RawMesh {
        let v = |x, y| Vertex::new([x, y, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]);
        RawMesh::new(
            name,
            vec![v(min, min), v(max, min), v(max, max), v(min, max)],
            vec![0, 1, 2, 2, 3, 0],
        )
    }

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn cache_uploads_each_path_once() {
        let mut source = CountingSource::default();
        let mut cache = TextureCache::new("assets");

        let first = cache.load("brick.png", &mut source);
        let second = cache.load("brick.png", &mut source);

        assert_eq!(first, second);
        assert_eq!(first.id, TextureId(1));
        assert_eq!(source.uploads, vec![PathBuf::from("assets").join("brick.png")]);
        assert_eq!(cache.len(), 1);

        let other = cache.load("wood.png", &mut source);
        assert_eq!(other.id, TextureId(2));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failed_texture_is_cached_as_null() {
        let mut source = CountingSource {
            fail: true,
            ..Default::default()
        };
        let mut cache = TextureCache::new("assets");

        let texture = cache.load("missing.png", &mut source);
        assert!(texture.id.is_null());

        cache.load("missing.png", &mut source);
        assert_eq!(source.uploads.len(), 1);
    }

    #[test]
    fn shared_texture_is_loaded_once_across_meshes() {
        let mut a = square("a", 0.0, 1.0);
        let mut b = square("b", 0.0, 1.0);
        a.diffuse_texture = Some("shared.png".into());
        b.diffuse_texture = Some("shared.png".into());

        let mut source = CountingSource::default();
        let model = Model::from_raw_meshes(vec![a, b], PathBuf::from("m"), Some(&mut source));

        assert_eq!(source.uploads.len(), 1);
        assert_eq!(model.textures.len(), 1);
        assert_eq!(model.meshes[0].texture, model.meshes[1].texture);
        assert!(model.meshes.iter().all(Mesh::has_texture));
    }

    #[test]
    fn null_texture_falls_back_to_colour() {
        let mut raw = square("a", 0.0, 1.0);
        raw.diffuse_texture = Some("broken.png".into());
        let mut source = CountingSource {
            fail: true,
            ..Default::default()
        };
        let model = Model::from_raw_meshes(vec![raw], PathBuf::new(), Some(&mut source));
        assert!(model.meshes[0].texture.is_some());
        assert!(!model.meshes[0].has_texture());
    }

    #[test]
    fn aggregate_bounds_cover_all_meshes() {
        let model = Model::from_raw_meshes(
            vec![square("a", -1.0, 1.0), square("b", 0.0, 2.0)],
            PathBuf::new(),
            None::<&mut NoTextures>,
        );
        assert_eq!(
            model.bounds,
            Bounds2 {
                min_x: -1.0,
                max_x: 2.0,
                min_y: -1.0,
                max_y: 2.0
            }
        );
        assert_eq!(model.meshes[0].bounds.max_x, 1.0);
    }

    #[test]
    fn colour_fallback_for_missing_or_black_diffuse() {
        assert_eq!(material_color(None), DEFAULT_COLOR);
        assert_eq!(material_color(Some([0.0, 0.0, 0.0])), DEFAULT_COLOR);
        assert_eq!(
            material_color(Some([0.2, 0.4, 0.6])),
            Vec4::new(0.2, 0.4, 0.6, 1.0)
        );
    }

    #[test]
    fn obj_with_black_kd_renders_blue() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "tri.mtl", "newmtl dark\nKd 0 0 0\n");
        let path = write_file(
            dir.path(),
            "tri.obj",
            "mtllib tri.mtl\no tri\nv 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl dark\nf 1 2 3\n",
        );

        let mut source = CountingSource::default();
        let model = Model::load(&path, &mut source).unwrap();

        assert_eq!(model.meshes.len(), 1);
        assert_eq!(model.meshes[0].color, DEFAULT_COLOR);
        assert!(!model.meshes[0].has_texture());
        assert!(source.uploads.is_empty());
    }

    #[test]
    fn obj_material_colour_and_texture_resolve_against_model_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "tri.mtl", "newmtl wood\nKd 0.5 0.25 0.125\nmap_Kd wood.png\n");
        let path = write_file(
            dir.path(),
            "tri.obj",
            "mtllib tri.mtl\no tri\nv 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl wood\nf 1 2 3\n",
        );

        let mut source = CountingSource::default();
        let model = Model::load(&path, &mut source).unwrap();

        assert_eq!(model.meshes[0].color, Vec4::new(0.5, 0.25, 0.125, 1.0));
        assert_eq!(source.uploads, vec![dir.path().join("wood.png")]);
        assert!(model.meshes[0].has_texture());
    }

    #[test]
    fn untextured_load_skips_texture_files() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "tri.mtl", "newmtl wood\nKd 1 1 1\nmap_Kd wood.png\n");
        let path = write_file(
            dir.path(),
            "tri.obj",
            "mtllib tri.mtl\no tri\nv 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl wood\nf 1 2 3\n",
        );

        let model = Model::load_untextured(&path).unwrap();
        assert!(model.meshes[0].texture.is_none());
        assert!(model.textures.is_empty());
    }

    #[test]
    fn unknown_format_is_a_load_error() {
        let mut source = CountingSource::default();
        assert!(matches!(
            Model::load("scene.fbx", &mut source),
            Err(AssetError::UnknownFormat(_))
        ));
    }
}
