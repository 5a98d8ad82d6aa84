//! Polygon grouping and texture-info table construction.
//!
//! The on-disk format stores one flat polygon array per mesh plus a compact
//! per-texture count table, so the writer must emit polygons grouped first by
//! texture index (document texture order) and within a texture by
//! [`MaterialKind`] in the fixed kind order. Original relative order inside a
//! bucket is preserved; readers depend on this layout to reattach materials.

use itertools::Itertools;
use tracing::warn;

use super::{MaterialKind, Polygon, TextureInfo, material};
use crate::scene::{SceneMesh, SceneTriangle};

/// A mesh's polygons in final bucket order plus the matching count table.
#[derive(Debug, Clone, Default)]
pub struct OrganizedMesh {
    pub polys: Vec<Polygon>,
    /// One entry per document texture, in document texture order.
    pub texture_infos: Vec<TextureInfo>,
}

/// Collect the document texture table across all meshes.
///
/// Insertion order is first-seen order, which fixes each texture's index for
/// all offset-table math. This pass is inherently sequential and must run
/// before any per-mesh work.
pub fn collect_textures<'a>(meshes: impl IntoIterator<Item = &'a SceneMesh>) -> Vec<String> {
    meshes
        .into_iter()
        .flat_map(|mesh| mesh.triangles.iter())
        .map(|tri| material::classify(&tri.material).1)
        .unique()
        .collect()
}

/// Classify, tally, and reorder one mesh's triangles into bucket layout.
///
/// A triangle whose texture is missing from the document table is dropped
/// with a warning; this only happens when the caller failed to collect
/// textures over every mesh first.
pub fn organize_mesh(triangles: &[SceneTriangle], textures: &[String]) -> OrganizedMesh {
    let mut polys: Vec<Polygon> = Vec::with_capacity(triangles.len());
    let mut texture_infos = vec![TextureInfo::default(); textures.len()];

    for tri in triangles {
        let (kind, texture) = material::classify(&tri.material);
        let Some(index) = textures.iter().position(|t| *t == texture) else {
            warn!(
                texture = texture.as_str(),
                "triangle references texture missing from document table"
            );
            continue;
        };

        texture_infos[index].counts[kind.index()] += 1;
        polys.push(Polygon {
            vertices: tri.vertices,
            uvs: tri.uvs,
            kind,
            texture: index as u32,
        });
    }

    // Stable sort = grouped by (texture, kind) with original order kept
    // inside each bucket.
    polys.sort_by_key(|p| (p.texture, p.kind));

    for t in 1..texture_infos.len() {
        texture_infos[t].texture_start =
            texture_infos[t - 1].texture_start + texture_infos[t - 1].total();
    }

    OrganizedMesh {
        polys,
        texture_infos,
    }
}

/// Offset of the (texture, kind) bucket inside the mesh polygon array.
pub fn bucket_start(texture_infos: &[TextureInfo], texture: usize, kind: MaterialKind) -> u32 {
    let info = &texture_infos[texture];
    info.texture_start + info.counts[..kind.index()].iter().sum::<u32>()
}
