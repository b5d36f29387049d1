//! STL file loading and saving

use std::fs::File;
use std::io::{BufReader, Read, Seek, Write};
use std::path::Path;

use glam::Vec3;

use crate::error::MeshError;
use crate::mesh_data::MeshData;

/// Load an STL file into mesh data
pub fn load_stl(path: impl AsRef<Path>) -> Result<MeshData, MeshError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| MeshError::Io(e.to_string()))?;
    let mut reader = BufReader::new(file);

    let mesh = load_stl_from_reader(&mut reader)?;
    tracing::info!(
        "Loaded STL {:?}: {} vertices, {} faces",
        path,
        mesh.vertices.len(),
        mesh.face_count()
    );
    Ok(mesh)
}

/// Load STL data (ASCII or binary) from a reader
pub fn load_stl_from_reader<R: Read + Seek>(reader: &mut R) -> Result<MeshData, MeshError> {
    let indexed = stl_io::read_stl(reader).map_err(|e| MeshError::Parse(e.to_string()))?;
    if indexed.faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    let vertices: Vec<Vec3> = indexed
        .vertices
        .iter()
        .map(|v| Vec3::new(v[0], v[1], v[2]))
        .collect();

    // Per-vertex normals are the normalized sum of adjacent face normals
    let mut normals = vec![Vec3::ZERO; vertices.len()];
    let mut face_indices = Vec::with_capacity(indexed.faces.len());
    for face in &indexed.faces {
        let [i0, i1, i2] = face.vertices;
        let stored = Vec3::new(face.normal[0], face.normal[1], face.normal[2]);
        let normal = stored.try_normalize().unwrap_or_else(|| {
            // Many exporters write zero facet normals
            let (v0, v1, v2) = (vertices[i0], vertices[i1], vertices[i2]);
            (v1 - v0).cross(v2 - v0).normalize_or_zero()
        });
        for &vertex_idx in &face.vertices {
            normals[vertex_idx] += normal;
        }
        face_indices.push(face.vertices.iter().map(|&i| i as u32).collect());
    }
    for normal in &mut normals {
        *normal = normal.normalize_or_zero();
    }

    Ok(MeshData {
        vertices,
        normals,
        face_indices,
        ..Default::default()
    })
}

/// Save the triangle faces of mesh data as a binary STL file
pub fn save_stl(mesh: &MeshData, path: impl AsRef<Path>) -> Result<(), MeshError> {
    let path = path.as_ref();
    let mut file = File::create(path).map_err(|e| MeshError::Io(e.to_string()))?;
    save_stl_to_writer(mesh, &mut file)?;
    tracing::info!("Saved STL to {:?}", path);
    Ok(())
}

/// Write the triangle faces of mesh data as binary STL
pub fn save_stl_to_writer<W: Write>(mesh: &MeshData, writer: &mut W) -> Result<(), MeshError> {
    mesh.validate()?;

    let triangles: Vec<stl_io::Triangle> = mesh
        .face_indices
        .iter()
        .filter(|face| face.len() == 3)
        .map(|face| {
            let v0 = mesh.vertices[face[0] as usize];
            let v1 = mesh.vertices[face[1] as usize];
            let v2 = mesh.vertices[face[2] as usize];
            let normal = (v1 - v0).cross(v2 - v0).try_normalize().unwrap_or(Vec3::Z);

            stl_io::Triangle {
                normal: stl_io::Normal::new(normal.to_array()),
                vertices: [
                    stl_io::Vertex::new(v0.to_array()),
                    stl_io::Vertex::new(v1.to_array()),
                    stl_io::Vertex::new(v2.to_array()),
                ],
            }
        })
        .collect();

    if triangles.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    stl_io::write_stl(writer, triangles.iter()).map_err(|e| MeshError::Write(e.to_string()))
}
