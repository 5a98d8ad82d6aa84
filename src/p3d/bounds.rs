//! Mesh extents, document sizing, and role flag assignment.
//!
//! Axis naming follows the export convention: X = width ("length"),
//! Y = depth, Z = height.

/// Axis-aligned bounding box of a vertex set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshBounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl MeshBounds {
    /// X span.
    pub fn length(&self) -> f32 {
        self.max[0] - self.min[0]
    }

    /// Y span.
    pub fn depth(&self) -> f32 {
        self.max[1] - self.min[1]
    }

    /// Z span.
    pub fn height(&self) -> f32 {
        self.max[2] - self.min[2]
    }
}

/// Compute bounds over scaled vertex positions.
///
/// An empty vertex set yields degenerate (0,0,0)–(0,0,0) bounds rather than
/// failing; the mesh is rejected later by polygon organization.
pub fn compute_bounds(vertices: &[[f32; 3]]) -> MeshBounds {
    let mut bounds = MeshBounds {
        min: [0.0; 3],
        max: [0.0; 3],
    };

    if let Some(first) = vertices.first() {
        bounds.min = *first;
        bounds.max = *first;
    }

    for v in vertices {
        for axis in 0..3 {
            if v[axis] < bounds.min[axis] {
                bounds.min[axis] = v[axis];
            }
            if v[axis] > bounds.max[axis] {
                bounds.max[axis] = v[axis];
            }
        }
    }

    bounds
}

/// Snap a document length/depth to the 20 or 40 tile grid.
///
/// The original makep3d forces values within ±0.05 of 20 or 40 to the exact
/// tile size. No other values are touched.
pub fn snap_tile_size(value: f32) -> f32 {
    if (19.95..=20.05).contains(&value) {
        20.0
    } else if (39.95..=40.05).contains(&value) {
        40.0
    } else {
        value
    }
}

/// Document-level length and depth from the main mesh bounds.
///
/// These are symmetric extents about the main mesh's local origin
/// (`max(hi, -lo) * 2`), not the raw min/max span. For non-symmetrical
/// geometry this overstates one side; the game's own tools compute it this
/// way and collision data depends on it, so it is reproduced bit for bit.
pub fn document_size(main: &MeshBounds) -> (f32, f32) {
    let length = snap_tile_size(main.max[0].max(-main.min[0]) * 2.0);
    let depth = snap_tile_size(main.max[1].max(-main.min[1]) * 2.0);
    (length, depth)
}

/// Document height override from a floor-level reference point.
pub fn floor_height(floor_z: f32, main_origin_z: f32) -> f32 {
    -(floor_z - main_origin_z) * 2.0
}

/// Main mesh: bits 0+1, plus shadow/collision fallback bits when the document
/// has no dedicated mesh for those roles.
pub const FLAG_MAIN: u32 = 3;
/// Any mesh that holds no distinguished role.
pub const FLAG_ORDINARY: u32 = 2;
pub const FLAG_SHADOW: u32 = 4;
pub const FLAG_COLLISION: u32 = 8;

/// The distinguished role a mesh holds within a document.
///
/// Roles are assigned by exact object name (`main`, `mainshad`, `maincoll`),
/// so a mesh holds at most one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshRole {
    Main,
    Shadow,
    Collision,
    Ordinary,
}

/// Derive the role bitmask for one mesh.
///
/// The main mesh absorbs the shadow and collision roles when the document has
/// no dedicated mesh for them (the game falls back to main geometry).
pub fn mesh_flags(role: MeshRole, doc_has_shadow: bool, doc_has_collision: bool) -> u32 {
    match role {
        MeshRole::Main => {
            let mut flags = FLAG_MAIN;
            if !doc_has_shadow {
                flags |= FLAG_SHADOW;
            }
            if !doc_has_collision {
                flags |= FLAG_COLLISION;
            }
            flags
        }
        MeshRole::Shadow => FLAG_SHADOW,
        MeshRole::Collision => FLAG_COLLISION,
        MeshRole::Ordinary => FLAG_ORDINARY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_fold() {
        let bounds = compute_bounds(&[
            [-1.0, 2.0, 0.5],
            [3.0, -4.0, 0.0],
            [0.0, 0.0, -2.5],
        ]);
        assert_eq!(bounds.min, [-1.0, -4.0, -2.5]);
        assert_eq!(bounds.max, [3.0, 2.0, 0.5]);
        assert_eq!(bounds.length(), 4.0);
        assert_eq!(bounds.depth(), 6.0);
        assert_eq!(bounds.height(), 3.0);
    }

    #[test]
    fn test_empty_bounds_are_degenerate() {
        let bounds = compute_bounds(&[]);
        assert_eq!(bounds.min, [0.0; 3]);
        assert_eq!(bounds.max, [0.0; 3]);
        assert_eq!(bounds.length(), 0.0);
    }

    #[test]
    fn test_tile_snapping_windows() {
        assert_eq!(snap_tile_size(19.96), 20.0);
        assert_eq!(snap_tile_size(20.05), 20.0);
        assert_eq!(snap_tile_size(20.10), 20.10);
        assert_eq!(snap_tile_size(39.97), 40.0);
        assert_eq!(snap_tile_size(40.10), 40.10);
        assert_eq!(snap_tile_size(12.5), 12.5);
    }

    #[test]
    fn test_document_size_is_symmetric_about_origin() {
        // Asymmetric box: x in [-1, 3] → length = 6, not 4.
        let bounds = compute_bounds(&[[-1.0, -2.0, 0.0], [3.0, 1.0, 1.0]]);
        let (length, depth) = document_size(&bounds);
        assert_eq!(length, 6.0);
        assert_eq!(depth, 4.0);
    }

    #[test]
    fn test_document_size_snaps() {
        let bounds = compute_bounds(&[[-9.98, 0.0, 0.0], [9.98, 0.0, 0.0]]);
        let (length, _) = document_size(&bounds);
        assert_eq!(length, 20.0);
    }

    #[test]
    fn test_floor_height() {
        assert_eq!(floor_height(-1.5, 0.0), 3.0);
        assert_eq!(floor_height(-2.0, -0.5), 3.0);
    }

    #[test]
    fn test_main_only_takes_all_roles() {
        assert_eq!(mesh_flags(MeshRole::Main, false, false), 15);
    }

    #[test]
    fn test_main_with_shadow() {
        assert_eq!(mesh_flags(MeshRole::Main, true, false), 11);
        assert_eq!(mesh_flags(MeshRole::Shadow, true, false), 4);
    }

    #[test]
    fn test_main_with_collision() {
        assert_eq!(mesh_flags(MeshRole::Main, false, true), 7);
        assert_eq!(mesh_flags(MeshRole::Collision, false, true), 8);
    }

    #[test]
    fn test_ordinary_mesh() {
        assert_eq!(mesh_flags(MeshRole::Ordinary, true, true), 2);
    }
}
