//! High-level P3D export: assemble a document from a scene and write it.
//!
//! One export is one transaction: collect the texture table, locate the role
//! meshes, convert lights and meshes, then write the byte stream in one
//! piece. A scene without a main mesh cancels the whole export and nothing
//! is written.

use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use bon::Builder;
use thiserror::Error;
use tracing::{info, warn};

use crate::cca::{self, AnchorSet};
use crate::error::IResult;
use crate::p3d::bounds::{self, MeshRole};
use crate::p3d::material::sanitise_mesh_name;
use crate::p3d::organize;
use crate::p3d::write::write_document;
use crate::p3d::{P3dDocument, P3dLight, P3dMesh, pack_color};
use crate::scene::{
    COLLISION_MESH_NAME, FLOOR_LEVEL_NAME, FileLog, LogSink, MAIN_MESH_NAME, NullLog,
    SHADOW_MESH_NAME, Scene,
};

/// Options controlling P3D export.
#[derive(Builder, Debug, Clone)]
pub struct ExportOptions {
    /// Show a corona sprite on exported lights.
    #[builder(default = false)]
    pub enable_corona: bool,
    /// Show lens flares on exported lights.
    #[builder(default = true)]
    pub enable_flares: bool,
    /// Let exported lights illuminate the environment.
    #[builder(default = true)]
    pub enable_environment: bool,
    /// Honor a `floor_level` reference point when sizing the document.
    #[builder(default = true)]
    pub use_floor_level: bool,
    /// Collect modifier-evaluated meshes. Consumed by the host while
    /// building the [`Scene`]; the pipeline sees final geometry either way.
    #[builder(default = true)]
    pub use_mesh_modifiers: bool,
    /// Append a log entry next to the exported file.
    #[builder(default = true)]
    pub export_log: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Caller-side scene problems that abort an export before assembly.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("scene has {count} meshes named \"{name}\"; role names must be unique")]
    DuplicateRoleMesh { name: String, count: usize },
}

/// Reject scenes where a role name (`main`, `mainshad`, `maincoll`) appears
/// on more than one mesh.
///
/// Role lookup takes the first name match, so duplicates would silently pick
/// one; that ambiguity is surfaced to the caller instead.
pub fn validate_roles(scene: &Scene) -> Result<(), ExportError> {
    for name in [MAIN_MESH_NAME, SHADOW_MESH_NAME, COLLISION_MESH_NAME] {
        let count = scene.meshes.iter().filter(|m| m.name == name).count();
        if count > 1 {
            return Err(ExportError::DuplicateRoleMesh {
                name: name.to_string(),
                count,
            });
        }
    }
    Ok(())
}

/// Outcome of an export run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportStatus {
    /// The document was written; carries the exported mesh names.
    Finished { exported_meshes: Vec<String> },
    /// The scene has no main mesh; nothing was written.
    Cancelled,
}

/// Assemble a P3D document from a scene.
///
/// Returns the document plus the names of the meshes that survived polygon
/// organization, or `None` when the scene has no main mesh. Warnings
/// (missing shadow/collision mesh, skipped empty meshes) go to the log sink
/// and tracing; they never abort the run.
pub fn assemble_document(
    scene: &Scene,
    options: &ExportOptions,
    log: &mut dyn LogSink,
) -> Option<(P3dDocument, Vec<String>)> {
    let main = scene.find_mesh(MAIN_MESH_NAME)?;
    let shadow = scene.find_mesh(SHADOW_MESH_NAME);
    let collision = scene.find_mesh(COLLISION_MESH_NAME);

    if shadow.is_none() {
        warn!("shadow mesh not found, using main mesh for shadow");
        log.line("! Shadow mesh was not found, using main mesh for shadow.");
    }
    if collision.is_none() {
        warn!("collision mesh not found, using main mesh for collisions");
        log.line("! Collision mesh was not found, using main mesh for collisions.");
    }

    // Texture indices are fixed by first-seen order across every mesh, so
    // the table must be complete before any per-mesh work.
    let mut doc = P3dDocument {
        textures: organize::collect_textures(&scene.meshes),
        ..Default::default()
    };

    // The main mesh anchors the model at the origin; everything else moves
    // with it.
    let main_center = main.position;
    let rel = |p: [f32; 3]| {
        [
            p[0] - main_center[0],
            p[1] - main_center[1],
            p[2] - main_center[2],
        ]
    };

    let floor_z = if options.use_floor_level {
        scene.find_anchor(FLOOR_LEVEL_NAME).map(|a| a.position[2])
    } else {
        None
    };

    for light in &scene.lights {
        doc.lights.push(P3dLight {
            name: sanitise_mesh_name(&light.name),
            pos: rel(light.position),
            range: light.energy,
            color: pack_color(light.color),
            show_corona: options.enable_corona,
            show_lens_flares: options.enable_flares,
            lightup_environment: options.enable_environment,
        });
    }

    let mut exported = Vec::new();
    for mesh in &scene.meshes {
        let organized = organize::organize_mesh(&mesh.triangles, &doc.textures);
        if mesh.vertices.is_empty() || organized.polys.is_empty() {
            warn!(mesh = mesh.name.as_str(), "cannot export empty mesh, ignoring");
            log.line(&format!("Can't export empty mesh \"{}\". Ignoring", mesh.name));
            continue;
        }

        let role = if std::ptr::eq(mesh, main) {
            MeshRole::Main
        } else if shadow.is_some_and(|s| std::ptr::eq(mesh, s)) {
            MeshRole::Shadow
        } else if collision.is_some_and(|c| std::ptr::eq(mesh, c)) {
            MeshRole::Collision
        } else {
            MeshRole::Ordinary
        };

        let mesh_bounds = bounds::compute_bounds(&mesh.vertices);
        let mut height = mesh_bounds.height();

        if role == MeshRole::Main {
            if let Some(floor_z) = floor_z {
                height = bounds::floor_height(floor_z, main_center[2]);
            }
            doc.height = height;
            (doc.length, doc.depth) = bounds::document_size(&mesh_bounds);
        }

        doc.meshes.push(P3dMesh {
            name: sanitise_mesh_name(&mesh.name),
            pos: rel(mesh.position),
            vertices: mesh.vertices.clone(),
            length: mesh_bounds.length(),
            height,
            depth: mesh_bounds.depth(),
            flags: bounds::mesh_flags(role, shadow.is_some(), collision.is_some()),
            texture_infos: organized.texture_infos,
            polys: organized.polys,
        });
        exported.push(mesh.name.clone());
    }

    Some((doc, exported))
}

/// Export a scene to a P3D byte stream.
///
/// `display_path` labels the log entry only. When the scene has no main mesh
/// the export is cancelled and nothing is written to `dest`.
pub fn export_p3d(
    scene: &Scene,
    options: &ExportOptions,
    dest: &mut dyn Write,
    log: &mut dyn LogSink,
    display_path: &str,
) -> IResult<ExportStatus> {
    validate_roles(scene)?;

    let started = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    log.line(&format!("Started exporting at unix time {started}"));
    log.line(&format!("File path: {display_path}"));
    info!(path = display_path, "exporting p3d model");

    let Some((doc, exported)) = assemble_document(scene, options, log) else {
        warn!("failed to export p3d, no main mesh found");
        log.line("!!! Failed to export p3d. No main mesh found.");
        return Ok(ExportStatus::Cancelled);
    };

    dest.write_all(&write_document(&doc))?;

    log.line(&format!("Meshes: {}", exported.join(" ")));
    log.line("Finished p3d export.");
    log.line("");
    info!(
        meshes = exported.len(),
        lights = doc.num_lights(),
        "p3d export finished"
    );

    Ok(ExportStatus::Finished {
        exported_meshes: exported,
    })
}

/// Export straight to a file, appending to `export-log.txt` in the same
/// directory when logging is enabled.
///
/// The document is assembled in memory first; a cancelled export leaves no
/// file behind.
pub fn export_p3d_file(
    scene: &Scene,
    options: &ExportOptions,
    path: &Path,
) -> IResult<ExportStatus> {
    let mut log: Box<dyn LogSink> = if options.export_log {
        let log_path = path
            .parent()
            .unwrap_or(Path::new("."))
            .join("export-log.txt");
        Box::new(FileLog::append(&log_path)?)
    } else {
        Box::new(NullLog)
    };

    let mut bytes = Vec::new();
    let status = export_p3d(
        scene,
        options,
        &mut bytes,
        log.as_mut(),
        &path.display().to_string(),
    )?;
    if matches!(status, ExportStatus::Finished { .. }) {
        std::fs::write(path, &bytes)?;
    }
    Ok(status)
}

/// Export the CCA anchor sidecar for a scene.
///
/// Works without a main mesh (offsets are then absolute), matching the
/// original tool, but flags the situation in the file since anchor offsets
/// are meant to be relative to a centered main mesh.
pub fn export_cca(scene: &Scene, dest: &mut dyn Write) -> IResult<()> {
    let main = scene.find_mesh(MAIN_MESH_NAME);
    if main.is_none() {
        warn!("no main mesh found, cca values may be wrong if main is not centered");
        writeln!(
            dest,
            "!!! No main mesh found, .cca values might be wrong if main is not centered."
        )?;
    }

    let origin = main.map(|m| m.position).unwrap_or([0.0; 3]);
    let set = AnchorSet::from_scene(scene, origin);
    dest.write_all(cca::write_anchor_set(&set).as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{SceneAnchor, SceneLight, SceneMesh, SceneTriangle};

    fn quad_mesh(name: &str, position: [f32; 3], material: &str) -> SceneMesh {
        SceneMesh {
            name: name.to_string(),
            position,
            vertices: vec![
                [-1.0, -2.0, 0.0],
                [1.0, -2.0, 0.0],
                [1.0, 2.0, 1.5],
                [-1.0, 2.0, 1.5],
            ],
            triangles: vec![
                SceneTriangle {
                    vertices: [0, 1, 2],
                    uvs: [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]],
                    material: material.to_string(),
                },
                SceneTriangle {
                    vertices: [0, 2, 3],
                    uvs: [[0.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
                    material: material.to_string(),
                },
            ],
        }
    }

    fn main_only_scene() -> Scene {
        Scene {
            meshes: vec![quad_mesh("main", [0.0; 3], "g_walls")],
            ..Default::default()
        }
    }

    #[test]
    fn test_main_only_takes_all_roles() {
        let mut log = NullLog;
        let (doc, exported) =
            assemble_document(&main_only_scene(), &ExportOptions::default(), &mut log).unwrap();

        assert_eq!(exported, vec!["main"]);
        assert_eq!(doc.meshes[0].flags, 15);
        assert_eq!(doc.textures, vec!["walls.tga"]);
        // Symmetric document size about the origin.
        assert_eq!(doc.length, 2.0);
        assert_eq!(doc.depth, 4.0);
        assert_eq!(doc.height, 1.5);
    }

    #[test]
    fn test_shadow_mesh_splits_roles() {
        let mut scene = main_only_scene();
        scene
            .meshes
            .push(quad_mesh("mainshad", [0.0; 3], "f_colwhite"));

        let mut log = NullLog;
        let (doc, _) = assemble_document(&scene, &ExportOptions::default(), &mut log).unwrap();
        assert_eq!(doc.meshes[0].flags, 11);
        assert_eq!(doc.meshes[1].flags, 4);
    }

    #[test]
    fn test_no_main_mesh_cancels_export() {
        let scene = Scene {
            meshes: vec![quad_mesh("body", [0.0; 3], "g_walls")],
            ..Default::default()
        };

        let mut dest = Vec::new();
        let mut log = NullLog;
        let status = export_p3d(
            &scene,
            &ExportOptions::default(),
            &mut dest,
            &mut log,
            "test.p3d",
        )
        .unwrap();

        assert_eq!(status, ExportStatus::Cancelled);
        assert!(dest.is_empty());
    }

    #[test]
    fn test_empty_mesh_is_skipped_with_warning() {
        let mut scene = main_only_scene();
        scene.meshes.push(SceneMesh {
            name: "debris".to_string(),
            position: [0.0; 3],
            vertices: Vec::new(),
            triangles: Vec::new(),
        });

        let mut log = NullLog;
        let (doc, exported) =
            assemble_document(&scene, &ExportOptions::default(), &mut log).unwrap();
        assert_eq!(doc.num_meshes(), 1);
        assert_eq!(exported, vec!["main"]);
    }

    #[test]
    fn test_positions_are_relative_to_main() {
        let mut scene = Scene {
            meshes: vec![
                quad_mesh("main", [1.0, 2.0, 3.0], "g_walls"),
                quad_mesh("wing", [1.0, 2.0, 4.5], "g_walls"),
            ],
            ..Default::default()
        };
        scene.lights.push(SceneLight {
            name: "lamp".to_string(),
            position: [2.0, 2.0, 3.0],
            energy: 5.0,
            color: [1.0, 1.0, 1.0],
        });

        let mut log = NullLog;
        let (doc, _) = assemble_document(&scene, &ExportOptions::default(), &mut log).unwrap();
        assert_eq!(doc.meshes[0].pos, [0.0, 0.0, 0.0]);
        assert_eq!(doc.meshes[1].pos, [0.0, 0.0, 1.5]);
        assert_eq!(doc.lights[0].pos, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_floor_level_overrides_height() {
        let mut scene = main_only_scene();
        scene.anchors.push(SceneAnchor {
            name: FLOOR_LEVEL_NAME.to_string(),
            position: [0.0, 0.0, -1.25],
        });

        let mut log = NullLog;
        let (doc, _) = assemble_document(&scene, &ExportOptions::default(), &mut log).unwrap();
        assert_eq!(doc.height, 2.5);
        assert_eq!(doc.meshes[0].height, 2.5);

        // The override is opt-out.
        let options = ExportOptions::builder().use_floor_level(false).build();
        let (doc, _) = assemble_document(&scene, &options, &mut log).unwrap();
        assert_eq!(doc.height, 1.5);
    }

    #[test]
    fn test_light_flags_follow_options() {
        let mut scene = main_only_scene();
        scene.lights.push(SceneLight {
            name: "head lamp".to_string(),
            position: [0.0; 3],
            energy: 20.0,
            color: [1.0, 0.0, 0.0],
        });

        let options = ExportOptions::builder()
            .enable_corona(true)
            .enable_flares(false)
            .build();
        let mut log = NullLog;
        let (doc, _) = assemble_document(&scene, &options, &mut log).unwrap();

        let light = &doc.lights[0];
        assert_eq!(light.name, "head_lamp");
        assert!(light.show_corona);
        assert!(!light.show_lens_flares);
        assert!(light.lightup_environment);
        assert_eq!(light.color, 0x00FF0000);
        assert_eq!(light.range, 20.0);
    }

    #[test]
    fn test_duplicate_main_is_rejected() {
        let mut scene = main_only_scene();
        scene.meshes.push(quad_mesh("main", [0.0; 3], "g_walls"));
        assert!(matches!(
            validate_roles(&scene),
            Err(ExportError::DuplicateRoleMesh { count: 2, .. })
        ));

        let mut dest = Vec::new();
        let mut log = NullLog;
        let result = export_p3d(
            &scene,
            &ExportOptions::default(),
            &mut dest,
            &mut log,
            "dup.p3d",
        );
        assert!(result.is_err());
        assert!(dest.is_empty());
    }

    #[test]
    fn test_export_cca_without_main_flags_file() {
        let scene = Scene::default();
        let mut dest = Vec::new();
        export_cca(&scene, &mut dest).unwrap();
        let text = String::from_utf8(dest).unwrap();
        assert!(text.starts_with("!!! No main mesh found"));
        assert!(text.contains("center_of_gravity_pos"));
    }
}
