//! Scene descriptions exchanged with the host 3D application.
//!
//! The pipeline never walks a live scene graph. The host collects visible
//! objects into these plain structs for export and receives them back on
//! import; transforms are already applied (vertex positions carry the object
//! scale, positions are object locations in scene space).

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use tracing::warn;

/// Object name that designates the mandatory main mesh.
pub const MAIN_MESH_NAME: &str = "main";
/// Object name that designates the optional shadow mesh.
pub const SHADOW_MESH_NAME: &str = "mainshad";
/// Object name that designates the optional collision mesh.
pub const COLLISION_MESH_NAME: &str = "maincoll";
/// Reference point object used to override the document height.
pub const FLOOR_LEVEL_NAME: &str = "floor_level";

/// A triangle with face-corner UVs and its assigned material name.
///
/// Meshes with no materials must be given
/// [`crate::p3d::material::DEFAULT_MATERIAL`] by the host before export.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneTriangle {
    pub vertices: [u32; 3],
    pub uvs: [[f32; 2]; 3],
    pub material: String,
}

/// A mesh object as collected from the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneMesh {
    pub name: String,
    /// Object location in scene space.
    pub position: [f32; 3],
    /// Vertex positions with the object's scale factors applied.
    pub vertices: Vec<[f32; 3]>,
    pub triangles: Vec<SceneTriangle>,
}

/// A point light as collected from the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneLight {
    pub name: String,
    pub position: [f32; 3],
    /// Light energy; maps to the P3D range field.
    pub energy: f32,
    /// RGB components in `[0, 1]`.
    pub color: [f32; 3],
}

/// A named reference point (anchor positions, `floor_level`).
#[derive(Debug, Clone, PartialEq)]
pub struct SceneAnchor {
    pub name: String,
    pub position: [f32; 3],
}

/// Everything the pipeline needs from (or returns to) the host scene.
///
/// Object names are expected to be unique; role lookups take the first exact
/// name match, so a scene with duplicate `main` objects is a host-side error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub meshes: Vec<SceneMesh>,
    pub lights: Vec<SceneLight>,
    pub anchors: Vec<SceneAnchor>,
}

impl Scene {
    /// First mesh with the given name.
    pub fn find_mesh(&self, name: &str) -> Option<&SceneMesh> {
        self.meshes.iter().find(|m| m.name == name)
    }

    /// First anchor with the given name.
    pub fn find_anchor(&self, name: &str) -> Option<&SceneAnchor> {
        self.anchors.iter().find(|a| a.name == name)
    }
}

/// Append-only sink for the human-readable export log.
///
/// Sinks never fail the export; write problems are reported through tracing
/// and otherwise swallowed.
pub trait LogSink {
    fn line(&mut self, text: &str);
}

/// Discards every line.
#[derive(Debug, Default)]
pub struct NullLog;

impl LogSink for NullLog {
    fn line(&mut self, _text: &str) {}
}

/// Appends lines to a log file (`export-log.txt` next to the exported model).
#[derive(Debug)]
pub struct FileLog {
    file: std::fs::File,
}

impl FileLog {
    /// Open (or create) the log file in append mode.
    pub fn append(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file })
    }
}

impl LogSink for FileLog {
    fn line(&mut self, text: &str) {
        if let Err(err) = writeln!(self.file, "{text}") {
            warn!(%err, "failed to append to export log");
        }
    }
}
