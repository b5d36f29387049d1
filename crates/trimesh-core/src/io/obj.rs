//! OBJ file loading

use std::io::BufRead;
use std::path::Path;

use glam::{Vec2, Vec3, Vec4};

use crate::error::MeshError;
use crate::mesh_data::MeshData;

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    }
}

/// Load an OBJ file into mesh data, merging all models
pub fn load_obj(path: impl AsRef<Path>) -> Result<MeshData, MeshError> {
    let path = path.as_ref();
    let (models, _materials) =
        tobj::load_obj(path, &load_options()).map_err(|e| MeshError::Parse(e.to_string()))?;

    let mesh = merge_models(&models)?;
    tracing::info!(
        "Loaded OBJ {:?}: {} models, {} vertices, {} faces",
        path,
        models.len(),
        mesh.vertices.len(),
        mesh.face_count()
    );
    Ok(mesh)
}

/// Load OBJ data from a reader. Material libraries are ignored.
pub fn load_obj_from_reader<R: BufRead>(reader: &mut R) -> Result<MeshData, MeshError> {
    let (models, _materials) = tobj::load_obj_buf(reader, &load_options(), |_| {
        Err(tobj::LoadError::OpenFileFailed)
    })
    .map_err(|e| MeshError::Parse(e.to_string()))?;

    merge_models(&models)
}

fn merge_models(models: &[tobj::Model]) -> Result<MeshData, MeshError> {
    let mut data = MeshData::new();

    for model in models {
        let mesh = &model.mesh;
        let base = data.vertices.len() as u32;
        let count = mesh.positions.len() / 3;

        data.vertices.extend(
            mesh.positions
                .chunks_exact(3)
                .map(|p| Vec3::new(p[0], p[1], p[2])),
        );

        // Attributes are only kept when every model provides them
        if mesh.normals.len() == count * 3 {
            data.normals.extend(
                mesh.normals
                    .chunks_exact(3)
                    .map(|n| Vec3::new(n[0], n[1], n[2])),
            );
        }
        if mesh.texcoords.len() == count * 2 {
            data.texture_coords.extend(
                mesh.texcoords
                    .chunks_exact(2)
                    .map(|t| Vec2::new(t[0], t[1])),
            );
        }
        if mesh.vertex_color.len() == count * 3 {
            data.colors.extend(
                mesh.vertex_color
                    .chunks_exact(3)
                    .map(|c| Vec4::new(c[0], c[1], c[2], 1.0)),
            );
        }

        data.face_indices.extend(
            mesh.indices
                .chunks_exact(3)
                .map(|f| vec![f[0] + base, f[1] + base, f[2] + base]),
        );
    }

    if data.face_indices.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    let vertex_count = data.vertices.len();
    if data.normals.len() != vertex_count {
        data.normals.clear();
    }
    if data.texture_coords.len() != vertex_count {
        data.texture_coords.clear();
    }
    if data.colors.len() != vertex_count {
        data.colors.clear();
    }

    Ok(data)
}
