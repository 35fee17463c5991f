//! Read-only mesh data consumed by the mesh and octree selectors.
//!
//! A mesh is a list of buffers, each with its own vertex positions, a triangle
//! index list and the material it is drawn with. The collision core only reads
//! positions and indices, once, when a selector is built.

use crate::error::SelectorError;
use crate::geometry::{Triangle3, Vec3};

/// Opaque material identity, used to exclude e.g. foliage from collision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u32);

/// One chunk of a mesh.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshBuffer {
    pub positions: Vec<Vec3>,
    /// Index triples into `positions`.
    pub indices: Vec<u32>,
    pub material: Option<MaterialId>,
}

impl MeshBuffer {
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            indices,
            material: None,
        }
    }

    pub fn with_material(mut self, material: MaterialId) -> Self {
        self.material = Some(material);
        self
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub buffers: Vec<MeshBuffer>,
}

impl Mesh {
    pub fn new(buffers: Vec<MeshBuffer>) -> Self {
        Self { buffers }
    }

    /// Single-buffer mesh from a plain triangle list.
    pub fn from_triangles(triangles: &[Triangle3]) -> Self {
        let mut positions = Vec::with_capacity(triangles.len() * 3);
        for t in triangles {
            positions.extend_from_slice(&t.points());
        }
        let indices = (0..positions.len() as u32).collect();
        Self::new(vec![MeshBuffer::new(positions, indices)])
    }

    /// Triangle count before material filtering.
    pub fn triangle_count(&self) -> usize {
        self.buffers.iter().map(MeshBuffer::triangle_count).sum()
    }

    /// Flatten every buffer into a local-space triangle list.
    ///
    /// Buffers whose material appears in `ignored_materials` are skipped. Index
    /// lists are validated even for skipped buffers.
    pub fn collect_triangles(
        &self,
        ignored_materials: &[MaterialId],
    ) -> Result<Vec<Triangle3>, SelectorError> {
        let mut out = Vec::with_capacity(self.triangle_count());
        let mut skipped = 0usize;

        for (buffer_index, buffer) in self.buffers.iter().enumerate() {
            if buffer.indices.len() % 3 != 0 {
                return Err(SelectorError::IndexCountNotTriangles {
                    buffer: buffer_index,
                    count: buffer.indices.len(),
                });
            }
            if let Some(&index) = buffer
                .indices
                .iter()
                .find(|&&i| i as usize >= buffer.positions.len())
            {
                return Err(SelectorError::IndexOutOfRange {
                    buffer: buffer_index,
                    index,
                    vertex_count: buffer.positions.len(),
                });
            }

            let ignored = buffer
                .material
                .is_some_and(|m| ignored_materials.contains(&m));
            if ignored {
                skipped += buffer.triangle_count();
                continue;
            }

            let p = &buffer.positions;
            out.extend(buffer.indices.chunks_exact(3).map(|tri| {
                Triangle3::new(p[tri[0] as usize], p[tri[1] as usize], p[tri[2] as usize])
            }));
        }

        if skipped > 0 {
            log::debug!("skipped {skipped} triangles with ignored materials");
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(material: Option<MaterialId>) -> MeshBuffer {
        MeshBuffer {
            positions: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(0.0, 0.0, 1.0),
            ],
            indices: vec![0, 2, 1, 0, 3, 2],
            material,
        }
    }

    #[test]
    fn flattens_all_buffers() {
        let mesh = Mesh::new(vec![quad(None), quad(Some(MaterialId(3)))]);
        let tris = mesh.collect_triangles(&[]).unwrap();
        assert_eq!(tris.len(), 4);
        assert_eq!(tris[0].b, Vec3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn ignored_materials_are_dropped() {
        let mesh = Mesh::new(vec![quad(None), quad(Some(MaterialId(3)))]);
        let tris = mesh.collect_triangles(&[MaterialId(3)]).unwrap();
        assert_eq!(tris.len(), 2);
    }

    #[test]
    fn malformed_indices_are_errors() {
        let mut partial = quad(None);
        partial.indices.pop();
        assert_eq!(
            Mesh::new(vec![partial]).collect_triangles(&[]),
            Err(SelectorError::IndexCountNotTriangles { buffer: 0, count: 5 })
        );

        let mut wild = quad(None);
        wild.indices[4] = 9;
        assert_eq!(
            Mesh::new(vec![quad(None), wild]).collect_triangles(&[]),
            Err(SelectorError::IndexOutOfRange {
                buffer: 1,
                index: 9,
                vertex_count: 4
            })
        );
    }

    #[test]
    fn from_triangles_round_trips() {
        let t = Triangle3::new(Vec3::zeros(), Vec3::x(), Vec3::z());
        let mesh = Mesh::from_triangles(&[t, t.translated(&Vec3::y())]);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.collect_triangles(&[]).unwrap()[1], t.translated(&Vec3::y()));
    }
}
