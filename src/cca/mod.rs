//! The CCA anchor-position sidecar format.
//!
//! A CCA file is a hand-editable text companion to a car's P3D model: one
//! line per named anchor (weapon mounts, cameras, wheels), each holding an
//! offset from the main mesh origin. Lines store `X Z Y` of the scene-space
//! offset (the game's vertical axis is the middle token), with free-text
//! comments after `#`. The `engine_pos` anchor stores a single scalar, and a
//! fixed filler line carries the minigun angle.
//!
//! Decoding is best-effort by design: sidecars get hand-edited, so a
//! malformed anchor line means "anchor absent", never a parse failure.

use tracing::debug;

use crate::scene::{Scene, SceneAnchor};

/// Marker the game's own sidecars use to introduce the anchor block.
const POSITIONS_MARKER: &str = "--- Positions ---";

const NOT_FOUND_COMMENT: &str = "!!!NOT FOUND ON EXPORT  ";

const MINIGUN_ANGLE_LINE: &str = "0.0\t\t\t # Angle of minigun (negative values for downpointing)";

/// All vector anchors in file order. `center_of_gravity_pos` leads its own
/// block; the rest follow in one run with the minigun angle filler line
/// inserted after `minigun_pos`.
pub const VECTOR_ANCHORS: [&str; 23] = [
    "center_of_gravity_pos",
    "left_upper_wheel_pos",
    "right_lower_wheel_pos",
    "minigun_pos",
    "mines_pos",
    "missiles_pos",
    "driver_pos",
    "exhaust_pos",
    "exhaust2_pos",
    "flag_pos",
    "bomb_pos",
    "cockpit_cam_pos",
    "roof_cam_pos",
    "hood_cam_pos",
    "bumper_cam_pos",
    "rear_view_cam_pos",
    "left_side_cam_pos",
    "right_side_cam_pos",
    "driver1_cam_pos",
    "driver2_cam_pos",
    "driver3_cam_pos",
    "steering_wheel_pos",
    "car_cover_pos",
];

/// The scalar anchor: only the scene-space Y offset is stored.
pub const ENGINE_ANCHOR: &str = "engine_pos";

/// Parsed (or to-be-written) anchor sidecar contents.
///
/// Positions are scene-space offsets from the main mesh origin; the on-disk
/// axis swap is applied by the codec, not stored here. `None` means the
/// anchor was not found (in the source scene on export, or on its line on
/// decode).
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorSet {
    /// Index-aligned with [`VECTOR_ANCHORS`].
    pub positions: [Option<[f32; 3]>; VECTOR_ANCHORS.len()],
    /// Scene-space Y offset of the engine.
    pub engine_y: Option<f32>,
    /// Mesh names recorded in the sidecar header.
    pub mesh_names: Vec<String>,
}

impl Default for AnchorSet {
    fn default() -> Self {
        Self {
            positions: [None; VECTOR_ANCHORS.len()],
            engine_y: None,
            mesh_names: Vec::new(),
        }
    }
}

impl AnchorSet {
    /// Position of a vector anchor by name.
    pub fn get(&self, name: &str) -> Option<[f32; 3]> {
        let index = VECTOR_ANCHORS.iter().position(|a| *a == name)?;
        self.positions[index]
    }

    /// Collect anchors from a scene, relative to the main mesh origin.
    ///
    /// `main_origin` is the main mesh location, or zero when the scene has no
    /// main mesh (the caller decides whether that warrants a warning).
    pub fn from_scene(scene: &Scene, main_origin: [f32; 3]) -> Self {
        let offset = |anchor: &SceneAnchor| {
            [
                anchor.position[0] - main_origin[0],
                anchor.position[1] - main_origin[1],
                anchor.position[2] - main_origin[2],
            ]
        };

        let mut set = AnchorSet {
            mesh_names: scene.meshes.iter().map(|m| m.name.clone()).collect(),
            ..Default::default()
        };
        for (index, name) in VECTOR_ANCHORS.iter().enumerate() {
            set.positions[index] = scene.find_anchor(name).map(offset);
        }
        set.engine_y = scene.find_anchor(ENGINE_ANCHOR).map(|a| offset(a)[1]);
        set
    }

    /// Turn decoded anchors back into scene reference points.
    ///
    /// Absent anchors produce nothing; the engine anchor materializes at
    /// `(0, y, 0)`.
    pub fn to_anchors(&self) -> Vec<SceneAnchor> {
        let mut anchors: Vec<SceneAnchor> = VECTOR_ANCHORS
            .iter()
            .zip(self.positions.iter())
            .filter_map(|(name, pos)| {
                pos.map(|position| SceneAnchor {
                    name: name.to_string(),
                    position,
                })
            })
            .collect();

        if let Some(y) = self.engine_y {
            anchors.push(SceneAnchor {
                name: ENGINE_ANCHOR.to_string(),
                position: [0.0, y, 0.0],
            });
        }

        anchors
    }
}

/// Format a float with 4 significant digits, trailing zeros trimmed.
fn format_sig(v: f32) -> String {
    if v == 0.0 || !v.is_finite() {
        return "0".to_string();
    }
    let magnitude = v.abs().log10().floor() as i32;
    let decimals = (3 - magnitude).max(0) as usize;
    let formatted = format!("{v:.decimals$}");
    if formatted.contains('.') {
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        formatted
    }
}

fn anchor_line(name: &str, position: Option<[f32; 3]>) -> String {
    // Stored token order is (X, Z, Y) of the scene-space offset.
    let stored = position.map(|p| [p[0], p[2], p[1]]).unwrap_or([0.0; 3]);
    let marker = if position.is_none() {
        NOT_FOUND_COMMENT
    } else {
        ""
    };
    format!(
        "{} {} {} \t\t\t # {}{}",
        format_sig(stored[0]),
        format_sig(stored[1]),
        format_sig(stored[2]),
        marker,
        name
    )
}

fn engine_line(engine_y: Option<f32>) -> String {
    let marker = if engine_y.is_none() {
        NOT_FOUND_COMMENT
    } else {
        ""
    };
    format!(
        "{} \t\t\t # {}{}",
        format_sig(engine_y.unwrap_or(0.0)),
        marker,
        ENGINE_ANCHOR
    )
}

/// Serialize an anchor set to sidecar text.
///
/// The line count is fixed: anchors missing from the set are still written as
/// zeros with a not-found comment so hand-editors always see the full table.
pub fn write_anchor_set(set: &AnchorSet) -> String {
    let mut out = String::new();

    out.push_str("Meshes: ");
    for name in &set.mesh_names {
        out.push_str(name);
        out.push(' ');
    }
    out.push_str("\n\n");

    out.push_str(&anchor_line(VECTOR_ANCHORS[0], set.positions[0]));
    out.push_str("\n\n");

    for (index, name) in VECTOR_ANCHORS.iter().enumerate().skip(1) {
        out.push_str(&anchor_line(name, set.positions[index]));
        out.push('\n');
        if *name == "minigun_pos" {
            out.push_str(MINIGUN_ANGLE_LINE);
            out.push('\n');
        }
    }

    out.push_str(&engine_line(set.engine_y));
    out.push('\n');

    out
}

/// Parse one vector anchor line into a scene-space offset.
///
/// The comment (including the not-found marker) is stripped first; anything
/// other than exactly three numeric tokens yields an absent anchor.
pub fn parse_anchor_line(line: &str) -> Option<[f32; 3]> {
    let data = line.split('#').next().unwrap_or("");
    let tokens: Vec<f32> = data
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    let [x, z, y] = tokens.as_slice() else {
        return None;
    };
    Some([*x, *y, *z])
}

/// Parse the scalar engine line.
pub fn parse_engine_line(line: &str) -> Option<f32> {
    let data = line.split('#').next().unwrap_or("").trim();
    data.parse().ok()
}

/// Line index of the i-th post-cog anchor relative to the first one,
/// accounting for the minigun angle filler line.
fn anchor_line_offset(i: usize) -> usize {
    if i >= 3 { i + 1 } else { i }
}

/// Decode sidecar text.
///
/// Handles both layouts: files written by [`write_anchor_set`], and the
/// game's own sidecars where the anchor block follows a `--- Positions ---`
/// marker. Missing or malformed lines yield absent anchors; this never
/// fails.
pub fn read_anchor_set(text: &str) -> AnchorSet {
    let lines: Vec<&str> = text.lines().collect();
    let mut set = AnchorSet::default();

    for line in &lines {
        if let Some(rest) = line.strip_prefix("Meshes:") {
            set.mesh_names = rest.split_whitespace().map(str::to_string).collect();
            break;
        }
    }

    let marker = lines.iter().position(|l| l.trim() == POSITIONS_MARKER);

    // (cog line, first post-cog anchor line)
    let (cog_index, base) = match marker {
        Some(p) => (6, p + 2),
        None => (2, 4),
    };
    if marker.is_some() {
        debug!("reading game-layout sidecar (positions marker found)");
    }

    let line_at = |index: usize| lines.get(index).copied().unwrap_or("");

    set.positions[0] = parse_anchor_line(line_at(cog_index));
    for i in 1..VECTOR_ANCHORS.len() {
        set.positions[i] = parse_anchor_line(line_at(base + anchor_line_offset(i - 1)));
    }
    set.engine_y = parse_engine_line(line_at(base + anchor_line_offset(VECTOR_ANCHORS.len() - 1)));

    set
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_anchor_line_swaps_axes() {
        assert_eq!(
            parse_anchor_line("1.0 2.0 3.0 # foo"),
            Some([1.0, 3.0, 2.0])
        );
    }

    #[test]
    fn test_two_tokens_is_absent() {
        assert_eq!(parse_anchor_line("1.0 2.0 # foo"), None);
        assert_eq!(parse_anchor_line(""), None);
        assert_eq!(parse_anchor_line("a b c"), None);
    }

    #[test]
    fn test_not_found_marker_is_tolerated() {
        let line = "0 0 0 \t\t\t # !!!NOT FOUND ON EXPORT  flag_pos";
        assert_eq!(parse_anchor_line(line), Some([0.0, 0.0, 0.0]));
    }

    #[test]
    fn test_engine_line() {
        assert_eq!(parse_engine_line("-0.125 \t # engine_pos"), Some(-0.125));
        assert_eq!(parse_engine_line("x # engine_pos"), None);
        assert_eq!(parse_engine_line("1 2 # engine_pos"), None);
    }

    #[test]
    fn test_format_sig() {
        assert_eq!(format_sig(0.0), "0");
        assert_eq!(format_sig(1.0), "1");
        assert_eq!(format_sig(2.5), "2.5");
        assert_eq!(format_sig(-0.125), "-0.125");
        assert_eq!(format_sig(0.00012), "0.00012");
    }

    #[test]
    fn test_round_trip() {
        let mut set = AnchorSet {
            mesh_names: vec!["main".to_string(), "mainshad".to_string()],
            ..Default::default()
        };
        set.positions[0] = Some([0.5, -0.25, 0.125]);
        set.positions[3] = Some([1.5, 2.5, -1.0]);
        set.positions[22] = Some([0.0, 0.0, 3.0]);
        set.engine_y = Some(-0.75);

        let text = write_anchor_set(&set);
        let decoded = read_anchor_set(&text);

        assert_eq!(decoded.mesh_names, set.mesh_names);
        assert_eq!(decoded.engine_y, set.engine_y);
        assert_eq!(decoded.positions[0], set.positions[0]);
        assert_eq!(decoded.positions[3], set.positions[3]);
        assert_eq!(decoded.positions[22], set.positions[22]);
        // Anchors absent on write come back as (0,0,0), not None: the line
        // count is fixed and zeros are written in their place.
        assert_eq!(decoded.positions[5], Some([0.0, 0.0, 0.0]));
    }

    #[test]
    fn test_line_count_is_fixed() {
        let text = write_anchor_set(&AnchorSet::default());
        // Header + blank + cog + blank + 22 anchors + angle filler + engine.
        assert_eq!(text.lines().count(), 28);
        assert!(text.contains("Angle of minigun"));
        assert!(text.contains(NOT_FOUND_COMMENT));
    }

    #[test]
    fn test_game_layout_marker() {
        let mut text = String::new();
        for _ in 0..6 {
            text.push('\n');
        }
        text.push_str("0.1 0.3 0.2 # center_of_gravity_pos\n");
        text.push_str(POSITIONS_MARKER);
        text.push('\n');
        text.push('\n');
        text.push_str("1 3 2 # left_upper_wheel_pos\n");

        // cog comes from the fixed line 6 slot, wheel from marker + 2.
        let set = read_anchor_set(&text);
        assert_eq!(set.positions[0], Some([0.1, 0.2, 0.3]));
        assert_eq!(set.positions[1], Some([1.0, 2.0, 3.0]));
        assert_eq!(set.positions[2], None);
    }

    #[test]
    fn test_scene_round_trip_through_anchors() {
        let mut scene = Scene::default();
        scene.anchors.push(SceneAnchor {
            name: "driver_pos".to_string(),
            position: [1.0, 2.0, 3.0],
        });
        scene.anchors.push(SceneAnchor {
            name: ENGINE_ANCHOR.to_string(),
            position: [0.0, 1.5, 0.0],
        });

        let set = AnchorSet::from_scene(&scene, [1.0, 1.0, 1.0]);
        assert_eq!(set.get("driver_pos"), Some([0.0, 1.0, 2.0]));
        assert_eq!(set.engine_y, Some(0.5));

        let anchors = set.to_anchors();
        assert_eq!(anchors.len(), 2);
        assert_eq!(anchors[1].position, [0.0, 0.5, 0.0]);
    }
}
