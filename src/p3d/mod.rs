//! The P3D model format (document model, codecs, geometry preparation).
//!
//! A P3D document stores a deduplicated texture name table, point lights, and
//! meshes. Each mesh holds one flat polygon array plus a compact per-texture
//! count table ([`TextureInfo`]) instead of per-polygon material tags: polygons
//! are grouped by texture index, and within a texture by [`MaterialKind`], so
//! a reader reconstructs material data purely from array position.

/// Axis-aligned extents and per-mesh role flags.
pub mod bounds;
/// Material name classification (`fm_metal.plate` → FlatMetal + `metal_plate.tga`).
pub mod material;
/// Polygon grouping and texture-info table construction.
pub mod organize;
/// Binary reader.
pub mod read;
/// Binary writer.
pub mod write;

/// Shading category encoded in a material name prefix.
///
/// The declaration order is the on-disk bucket order inside each texture group
/// and is load-bearing for both codec directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum MaterialKind {
    Flat,
    FlatMetal,
    Gouraud,
    GouraudMetal,
    GouraudMetalEnv,
    Shining,
}

impl MaterialKind {
    /// All kinds, in the fixed bucket order.
    pub const ALL: [MaterialKind; 6] = [
        MaterialKind::Flat,
        MaterialKind::FlatMetal,
        MaterialKind::Gouraud,
        MaterialKind::GouraudMetal,
        MaterialKind::GouraudMetalEnv,
        MaterialKind::Shining,
    ];

    /// The material name prefix for this kind (`f_...`, `fm_...`, ...).
    pub fn prefix(self) -> &'static str {
        match self {
            MaterialKind::Flat => "f",
            MaterialKind::FlatMetal => "fm",
            MaterialKind::Gouraud => "g",
            MaterialKind::GouraudMetal => "gm",
            MaterialKind::GouraudMetalEnv => "gme",
            MaterialKind::Shining => "s",
        }
    }

    /// Index of this kind within [`MaterialKind::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

/// A triangle: vertex indices into the owning mesh plus face-corner UVs.
///
/// `kind` and `texture` are never written to disk per-polygon; they exist in
/// memory only and are reconstructed on decode from the grouping contract.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Polygon {
    pub vertices: [u32; 3],
    /// One UV pair per triangle corner (face-corner attribute, not per-vertex).
    pub uvs: [[f32; 2]; 3],
    pub kind: MaterialKind,
    /// Index into the document texture table.
    pub texture: u32,
}

/// Per-(mesh, texture) triangle bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TextureInfo {
    /// Triangle count per material kind, indexed in [`MaterialKind::ALL`] order.
    pub counts: [u32; 6],
    /// Index into the mesh polygon array where this texture's triangles begin.
    pub texture_start: u32,
}

impl TextureInfo {
    /// Total triangle count across all six kinds.
    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }
}

/// A single mesh record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct P3dMesh {
    pub name: String,
    /// Position relative to the main mesh (the main mesh itself sits at 0,0,0).
    pub pos: [f32; 3],
    /// Vertex positions, already scaled by the source object's scale factors.
    pub vertices: Vec<[f32; 3]>,
    pub length: f32,
    pub height: f32,
    pub depth: f32,
    /// Role bitmask, see [`bounds::mesh_flags`].
    pub flags: u32,
    /// One entry per document texture, in document texture order.
    pub texture_infos: Vec<TextureInfo>,
    /// Polygons in (texture, kind) bucket order, see [`organize`].
    pub polys: Vec<Polygon>,
}

/// A point light record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct P3dLight {
    pub name: String,
    pub pos: [f32; 3],
    pub range: f32,
    /// Packed `0x00RRGGBB`, see [`pack_color`].
    pub color: u32,
    pub show_corona: bool,
    pub show_lens_flares: bool,
    pub lightup_environment: bool,
}

/// A complete P3D document.
///
/// Counts are always derived from the sequences; they are never stored or
/// mutated independently.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct P3dDocument {
    /// Deduplicated texture names, first-seen order across all meshes.
    pub textures: Vec<String>,
    pub meshes: Vec<P3dMesh>,
    pub lights: Vec<P3dLight>,
    /// Document-level size, derived from the main mesh with the symmetric
    /// extents and snapping quirks described in [`bounds::document_dimensions`].
    pub length: f32,
    pub height: f32,
    pub depth: f32,
}

impl P3dDocument {
    pub fn num_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn num_meshes(&self) -> usize {
        self.meshes.len()
    }

    pub fn num_lights(&self) -> usize {
        self.lights.len()
    }
}

/// Pack an RGB color with components in `[0, 1]` into `0x00RRGGBB`.
pub fn pack_color(rgb: [f32; 3]) -> u32 {
    let quantize = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u32;
    (quantize(rgb[0]) << 16) | (quantize(rgb[1]) << 8) | quantize(rgb[2])
}

/// Unpack a `0x00RRGGBB` color into RGB components in `[0, 1]`.
pub fn unpack_color(color: u32) -> [f32; 3] {
    [
        ((color >> 16) & 0xFF) as f32 / 255.0,
        ((color >> 8) & 0xFF) as f32 / 255.0,
        (color & 0xFF) as f32 / 255.0,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_order_is_bucket_order() {
        for (i, kind) in MaterialKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
        assert!(MaterialKind::Flat < MaterialKind::Shining);
        assert!(MaterialKind::Gouraud < MaterialKind::GouraudMetal);
    }

    #[test]
    fn test_color_round_trip() {
        let packed = pack_color([1.0, 0.5, 0.0]);
        assert_eq!(packed, 0x00FF8000);
        let rgb = unpack_color(packed);
        assert!((rgb[0] - 1.0).abs() < 1e-6);
        assert!((rgb[1] - 0.50196).abs() < 1e-3);
        assert!(rgb[2].abs() < 1e-6);
    }
}
