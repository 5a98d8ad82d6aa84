//! High-level P3D import: decode a byte stream back into a scene description.
//!
//! Decoded meshes come back with per-triangle material names rebuilt from the
//! grouping tables (`fm_` prefix + texture name), lights with unpacked
//! colors, and a synthesized `floor_level` reference point. Texture names
//! are resolved against caller-supplied search directories; a missing image
//! is a warning and an unbound slot, never a failure.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::IResult;
use crate::p3d::read::read_document;
use crate::p3d::{P3dDocument, material, unpack_color};
use crate::scene::{FLOOR_LEVEL_NAME, Scene, SceneAnchor, SceneLight, SceneMesh, SceneTriangle};

/// A texture slot resolved against the search paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureBinding {
    /// Texture name as stored in the document.
    pub name: String,
    /// Resolved image file; `None` when no search path has it.
    pub path: Option<PathBuf>,
}

/// Everything reconstructed from a P3D stream.
#[derive(Debug, Clone)]
pub struct ImportedModel {
    pub document: P3dDocument,
    pub scene: Scene,
    pub textures: Vec<TextureBinding>,
}

/// Probe the search paths for a texture image.
///
/// The stored name keeps its `.tga` suffix; each directory is probed for the
/// same stem as `.tga` then `.dds`, and the first directory containing
/// either wins.
pub fn resolve_texture(search_paths: &[PathBuf], name: &str) -> Option<PathBuf> {
    let stem = Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());

    for dir in search_paths {
        for ext in ["tga", "dds"] {
            let candidate = dir.join(format!("{stem}.{ext}"));
            if candidate.is_file() {
                debug!(path = %candidate.display(), "resolved texture");
                return Some(candidate);
            }
        }
    }

    None
}

/// Rebuild a scene description from a decoded document.
pub fn scene_from_document(doc: &P3dDocument) -> Scene {
    let mut scene = Scene::default();

    for mesh in &doc.meshes {
        let triangles = mesh
            .polys
            .iter()
            .map(|poly| {
                let texture = doc
                    .textures
                    .get(poly.texture as usize)
                    .map(String::as_str)
                    .unwrap_or(material::DEFAULT_MATERIAL);
                SceneTriangle {
                    vertices: poly.vertices,
                    uvs: poly.uvs,
                    material: material::material_name(poly.kind, texture),
                }
            })
            .collect();

        scene.meshes.push(SceneMesh {
            name: mesh.name.clone(),
            position: mesh.pos,
            vertices: mesh.vertices.clone(),
            triangles,
        });
    }

    for light in &doc.lights {
        scene.lights.push(SceneLight {
            name: light.name.clone(),
            position: light.pos,
            energy: light.range,
            color: unpack_color(light.color),
        });
    }

    scene.anchors.push(SceneAnchor {
        name: FLOOR_LEVEL_NAME.to_string(),
        position: [0.0, 0.0, -doc.height / 2.0],
    });

    scene
}

/// Decode a P3D stream and resolve its textures.
pub fn import_p3d(data: &[u8], search_paths: &[PathBuf]) -> IResult<ImportedModel> {
    let document = read_document(data)?;
    info!(
        meshes = document.num_meshes(),
        lights = document.num_lights(),
        textures = document.num_textures(),
        "decoded p3d model"
    );

    let textures = document
        .textures
        .iter()
        .map(|name| {
            let path = resolve_texture(search_paths, name);
            if path.is_none() {
                warn!(texture = name.as_str(), "could not load texture");
            }
            TextureBinding {
                name: name.clone(),
                path,
            }
        })
        .collect();

    let scene = scene_from_document(&document);

    Ok(ImportedModel {
        document,
        scene,
        textures,
    })
}
