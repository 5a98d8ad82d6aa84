//! Material name classification.
//!
//! Material names follow the `<prefix>_<texture>` convention where the prefix
//! selects the [`MaterialKind`] (`f_colwhite.tga`, `gme_chrome`, ...). A name
//! with no underscore, or with an unrecognized prefix, falls back to
//! [`MaterialKind::Gouraud`] — prefix dispatch is a pure lookup with a
//! default, never a failure path.

use super::MaterialKind;

/// Material assigned to meshes that come in with none.
///
/// The scene collaborator must apply this to empty-material meshes before the
/// pipeline runs; the core itself never synthesizes materials.
pub const DEFAULT_MATERIAL: &str = "f_colwhite.tga";

/// Look up a material kind by its name prefix.
fn kind_for_prefix(prefix: &str) -> Option<MaterialKind> {
    MaterialKind::ALL
        .into_iter()
        .find(|kind| kind.prefix() == prefix)
}

/// Normalize a texture name: `.` and space become `_`, and exactly one `.tga`
/// suffix is guaranteed.
///
/// A pre-existing `.tga` suffix is stripped before the replacement pass so it
/// is not mangled into `_tga`.
pub fn sanitise_texture(name: &str) -> String {
    let stem = name.strip_suffix(".tga").unwrap_or(name);
    let mut out = stem.replace(['.', ' '], "_");
    out.push_str(".tga");
    out
}

/// Object names written to P3D have spaces replaced with `_`.
pub fn sanitise_mesh_name(name: &str) -> String {
    name.replace(' ', "_")
}

/// Classify a material name into its kind and normalized texture name.
pub fn classify(material_name: &str) -> (MaterialKind, String) {
    match material_name.split_once('_') {
        None => (MaterialKind::Gouraud, sanitise_texture(material_name)),
        Some((prefix, rest)) => {
            let kind = kind_for_prefix(prefix).unwrap_or(MaterialKind::Gouraud);
            (kind, sanitise_texture(rest))
        }
    }
}

/// Rebuild the material name for a decoded polygon (`FlatMetal`,
/// `metal_plate.tga` → `fm_metal_plate.tga`). Inverse of [`classify`] up to
/// name normalization.
pub fn material_name(kind: MaterialKind, texture: &str) -> String {
    format!("{}_{}", kind.prefix(), texture)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_prefix_defaults_to_gouraud() {
        assert_eq!(
            classify("walls"),
            (MaterialKind::Gouraud, "walls.tga".to_string())
        );
    }

    #[test]
    fn test_prefix_table() {
        assert_eq!(classify("f_colwhite.tga").0, MaterialKind::Flat);
        assert_eq!(classify("fm_plate").0, MaterialKind::FlatMetal);
        assert_eq!(classify("g_road").0, MaterialKind::Gouraud);
        assert_eq!(classify("gm_hood").0, MaterialKind::GouraudMetal);
        assert_eq!(classify("gme_chrome").0, MaterialKind::GouraudMetalEnv);
        assert_eq!(classify("s_glass").0, MaterialKind::Shining);
    }

    #[test]
    fn test_dots_become_underscores() {
        assert_eq!(
            classify("fm_metal.plate"),
            (MaterialKind::FlatMetal, "metal_plate.tga".to_string())
        );
    }

    #[test]
    fn test_unknown_prefix_is_not_an_error() {
        assert_eq!(
            classify("xx_thing"),
            (MaterialKind::Gouraud, "thing.tga".to_string())
        );
    }

    #[test]
    fn test_existing_suffix_not_corrupted() {
        // Stripping first keeps `f_stone.tga` from becoming `stone_tga.tga`.
        assert_eq!(sanitise_texture("stone.tga"), "stone.tga");
        assert_eq!(sanitise_texture("my stone.v2.tga"), "my_stone_v2.tga");
    }

    #[test]
    fn test_material_name_round_trip() {
        let (kind, texture) = classify("gme_chrome");
        assert_eq!(material_name(kind, &texture), "gme_chrome.tga");
    }

    #[test]
    fn test_mesh_name_sanitised() {
        assert_eq!(sanitise_mesh_name("rear wing"), "rear_wing");
    }
}
