//! Geometry loading from model files.
//!
//! | Format | Extensions | Notes |
//! |--------|------------|-------|
//! | OBJ    | `.obj`     | Triangulated, single index; materials from `.mtl` |
//! | STL    | `.stl`     | Binary and ASCII, no UV coordinates or materials |
//!
//! Loading produces [`RawMesh`]es: vertices plus the material data named by
//! the file. Turning them into coloured, textured meshes is the job of
//! [`Model`](crate::Model).

use std::path::Path;

use glam::Vec3;

use crate::error::AssetError;
use crate::mesh::Vertex;

/// Geometry and material references for one mesh, straight from the file.
#[derive(Clone, Debug, Default)]
pub struct RawMesh {
    pub name: String,
    pub vertices: Vec<Vertex>,
    /// Triangle indices.
    pub indices: Vec<u32>,
    /// Material diffuse colour (`Kd`), if the material has one.
    pub diffuse: Option<[f32; 3]>,
    /// Diffuse texture file name (`map_Kd`), relative to the model directory.
    pub diffuse_texture: Option<String>,
}

impl RawMesh {
    pub fn new(name: impl Into<String>, vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            vertices,
            indices,
            ..Default::default()
        }
    }

    /// The built-in four-blade pinwheel, drawn in clip space.
    pub fn pinwheel() -> Self {
        const NORMAL: [f32; 3] = [0.0, 0.0, 1.0];
        #[rustfmt::skip]
        let positions: [[f32; 3]; 12] = [
            // bottom blade
            [ 0.0, -0.5, 0.0], [ 0.3, -0.5, 0.0], [0.0, 0.0, 0.0],
            // right blade
            [ 0.0,  0.0, 0.0], [ 0.5,  0.0, 0.0], [0.5, 0.3, 0.0],
            // top blade
            [-0.3,  0.5, 0.0], [ 0.0,  0.5, 0.0], [0.0, 0.0, 0.0],
            // left blade
            [-0.5,  0.0, 0.0], [-0.5, -0.3, 0.0], [0.0, 0.0, 0.0],
        ];

        let vertices = positions
            .iter()
            .map(|&p| Vertex::new(p, NORMAL, [0.0, 0.0]))
            .collect();
        let indices = (0..positions.len() as u32).collect();

        Self {
            diffuse: Some([1.0, 0.0, 0.0]),
            ..Self::new("pinwheel", vertices, indices)
        }
    }

    /// Recalculates vertex normals from face geometry.
    ///
    /// Smooth normals: each vertex gets the area-weighted average of the faces
    /// that share it.
    pub fn recalculate_normals(&mut self) {
        for v in &mut self.vertices {
            v.normal = [0.0, 0.0, 0.0];
        }

        for tri in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            if [i0, i1, i2].iter().any(|&i| i >= self.vertices.len()) {
                continue;
            }

            let p0 = Vec3::from(self.vertices[i0].position);
            let p1 = Vec3::from(self.vertices[i1].position);
            let p2 = Vec3::from(self.vertices[i2].position);
            let face_normal = (p1 - p0).cross(p2 - p0);

            for i in [i0, i1, i2] {
                let n = Vec3::from(self.vertices[i].normal) + face_normal;
                self.vertices[i].normal = n.into();
            }
        }

        for v in &mut self.vertices {
            v.normal = Vec3::from(v.normal).normalize_or_zero().into();
        }
    }
}

/// Load every mesh in a model file, picking the parser by extension.
pub fn load_meshes(path: &Path) -> Result<Vec<RawMesh>, AssetError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "obj" => load_obj(path),
        "stl" => load_stl(path),
        _ => Err(AssetError::UnknownFormat(ext)),
    }
}

/// Load a Wavefront OBJ file and its material library.
///
/// A material library that is missing or fails to parse is not an error: the
/// meshes load without materials and a warning is logged.
pub fn load_obj(path: &Path) -> Result<Vec<RawMesh>, AssetError> {
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )?;

    let materials = materials.unwrap_or_else(|e| {
        log::warn!("{}: no usable material library ({e})", path.display());
        Vec::new()
    });

    let meshes = models
        .into_iter()
        .map(|model| {
            let mesh = model.mesh;
            let material = mesh.material_id.and_then(|id| materials.get(id));

            let mut raw = RawMesh::new(model.name, obj_vertices(&mesh), mesh.indices);
            raw.diffuse = material.and_then(|m| m.diffuse);
            raw.diffuse_texture = material
                .and_then(|m| m.diffuse_texture.clone())
                .filter(|name| !name.is_empty());

            if mesh.normals.is_empty() {
                raw.recalculate_normals();
            }
            raw
        })
        .collect();

    Ok(meshes)
}

// Positions, normals and texture coordinates share one index in single-index
// mode, so the attribute arrays are read in lockstep.
fn obj_vertices(mesh: &tobj::Mesh) -> Vec<Vertex> {
    let count = mesh.positions.len() / 3;
    (0..count)
        .map(|i| {
            let position = [
                mesh.positions[3 * i],
                mesh.positions[3 * i + 1],
                mesh.positions[3 * i + 2],
            ];
            let normal = mesh
                .normals
                .get(3 * i..3 * i + 3)
                .map_or([0.0; 3], |n| [n[0], n[1], n[2]]);
            let tex_coord = mesh
                .texcoords
                .get(2 * i..2 * i + 2)
                .map_or([0.0; 2], |t| [t[0], t[1]]);
            Vertex::new(position, normal, tex_coord)
        })
        .collect()
}

/// Load an STL file as a single mesh with flat face normals.
pub fn load_stl(path: &Path) -> Result<Vec<RawMesh>, AssetError> {
    let file = std::fs::File::open(path)?;
    let mut reader = std::io::BufReader::new(file);
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("stl")
        .to_string();
    Ok(vec![parse_stl(&mut reader, name)?])
}

fn parse_stl<R: std::io::Read + std::io::Seek>(
    reader: &mut R,
    name: String,
) -> Result<RawMesh, AssetError> {
    let stl = stl_io::read_stl(reader).map_err(|e| AssetError::Stl(e.to_string()))?;

    let mut vertices = Vec::with_capacity(stl.faces.len() * 3);
    let mut indices = Vec::with_capacity(stl.faces.len() * 3);

    // Faces are expanded so each keeps its own normal.
    for (i, face) in stl.faces.iter().enumerate() {
        let normal: [f32; 3] = face.normal.into();
        for &vertex_idx in &face.vertices {
            let position: [f32; 3] = stl.vertices[vertex_idx].into();
            vertices.push(Vertex::new(position, normal, [0.0, 0.0]));
        }
        let base = (i * 3) as u32;
        indices.extend_from_slice(&[base, base + 1, base + 2]);
    }

    Ok(RawMesh::new(name, vertices, indices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn pinwheel_has_four_blades() {
        let pinwheel = RawMesh::pinwheel();
        assert_eq!(pinwheel.vertices.len(), 12);
        assert_eq!(pinwheel.indices.len(), 12);
        assert_eq!(pinwheel.diffuse, Some([1.0, 0.0, 0.0]));
    }

    #[test]
    fn recalculated_normals_face_out_of_ccw_triangle() {
        let mut raw = RawMesh::new(
            "tri",
            vec![
                Vertex::new([0.0, 0.0, 0.0], [0.0; 3], [0.0; 2]),
                Vertex::new([1.0, 0.0, 0.0], [0.0; 3], [0.0; 2]),
                Vertex::new([0.0, 1.0, 0.0], [0.0; 3], [0.0; 2]),
            ],
            vec![0, 1, 2],
        );
        raw.recalculate_normals();
        for v in &raw.vertices {
            assert!((Vec3::from(v.normal) - Vec3::Z).length() < 0.001);
        }
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_meshes(Path::new("model.fbx")).unwrap_err();
        assert!(matches!(err, AssetError::UnknownFormat(ext) if ext == "fbx"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_meshes(&dir.path().join("absent.obj")).is_err());
    }

    #[test]
    fn obj_without_mtl_loads_without_material() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "quad.obj",
            "mtllib missing.mtl\n\
             o quad\n\
             v -1 -1 0\nv 1 -1 0\nv 1 1 0\nv -1 1 0\n\
             vt 0 0\nvt 1 0\nvt 1 1\nvt 0 1\n\
             f 1/1 2/2 3/3 4/4\n",
        );

        let meshes = load_obj(&path).unwrap();
        assert_eq!(meshes.len(), 1);
        let quad = &meshes[0];
        assert_eq!(quad.name, "quad");
        // Triangulated quad.
        assert_eq!(quad.indices.len(), 6);
        assert_eq!(quad.diffuse, None);
        assert_eq!(quad.diffuse_texture, None);
        // No normals in the file, so they were computed.
        assert!((Vec3::from(quad.vertices[0].normal) - Vec3::Z).length() < 0.001);
        assert_eq!(quad.vertices[2].tex_coord, [1.0, 1.0]);
    }

    #[test]
    fn obj_material_supplies_colour_and_texture_name() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "box.mtl",
            "newmtl red\nKd 0.8 0.1 0.1\nmap_Kd wood.png\n",
        );
        let path = write_file(
            dir.path(),
            "box.obj",
            "mtllib box.mtl\n\
             o box\n\
             v 0 0 0\nv 1 0 0\nv 0 1 0\n\
             vn 0 0 1\n\
             usemtl red\n\
             f 1//1 2//1 3//1\n",
        );

        let meshes = load_obj(&path).unwrap();
        assert_eq!(meshes[0].diffuse, Some([0.8, 0.1, 0.1]));
        assert_eq!(meshes[0].diffuse_texture.as_deref(), Some("wood.png"));
    }

    #[test]
    fn ascii_stl_expands_faces() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "wedge.stl",
            "solid wedge\n\
             facet normal 0 0 1\n\
             outer loop\n\
             vertex 0 0 0\n\
             vertex 1 0 0\n\
             vertex 0 1 0\n\
             endloop\n\
             endfacet\n\
             endsolid wedge\n",
        );

        let meshes = load_meshes(&path).unwrap();
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].name, "wedge");
        assert_eq!(meshes[0].vertices.len(), 3);
        assert_eq!(meshes[0].indices, vec![0, 1, 2]);
        assert_eq!(meshes[0].vertices[1].normal, [0.0, 0.0, 1.0]);
    }
}
