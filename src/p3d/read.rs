//! P3D binary reader.
//!
//! Field-for-field inverse of [`super::write`]. The interesting part is
//! material reconstruction: the stream carries no per-polygon material data,
//! so after reading a mesh's flat polygon array the reader walks the
//! (texture, kind) buckets described by the texture-info table and stamps
//! kind and texture index onto each polygon by position. Zero-size buckets
//! are skipped; a table that does not account for exactly the polygon array
//! is a malformed stream, not an empty document.

use thiserror::Error;
use winnow::Parser;
use winnow::binary::{le_f32, le_u8, le_u32};
use winnow::error::ContextError;
use winnow::token::take;

use super::write::P3D_MAGIC;
use super::{MaterialKind, P3dDocument, P3dLight, P3dMesh, Polygon, TextureInfo};

type WResult<T> = Result<T, winnow::error::ErrMode<ContextError>>;

/// Errors surfaced while decoding a P3D stream.
#[derive(Debug, Error)]
pub enum P3dReadError {
    #[error("not a P3D stream (bad magic)")]
    BadMagic,
    #[error("truncated stream while reading {0}")]
    Truncated(&'static str),
    #[error("string is not valid UTF-8")]
    InvalidString,
    #[error(
        "texture info table of mesh \"{mesh}\" accounts for {accounted} polygons, array has {actual}"
    )]
    TextureTableOverrun {
        mesh: String,
        accounted: u32,
        actual: u32,
    },
    #[error(
        "texture {texture} of mesh \"{mesh}\" starts at {found}, prefix sum gives {expected}"
    )]
    TextureStartMismatch {
        mesh: String,
        texture: usize,
        expected: u32,
        found: u32,
    },
}

fn truncated(context: &'static str) -> impl Fn(winnow::error::ErrMode<ContextError>) -> P3dReadError {
    move |_| P3dReadError::Truncated(context)
}

fn parse_vec3(input: &mut &[u8]) -> WResult<[f32; 3]> {
    let x = le_f32.parse_next(input)?;
    let y = le_f32.parse_next(input)?;
    let z = le_f32.parse_next(input)?;
    Ok([x, y, z])
}

fn parse_bool(input: &mut &[u8]) -> WResult<bool> {
    Ok(le_u8.parse_next(input)? != 0)
}

fn parse_bytes_prefixed(input: &mut &[u8]) -> WResult<Vec<u8>> {
    let len = le_u32.parse_next(input)?;
    let bytes = take(len as usize).parse_next(input)?;
    Ok(bytes.to_vec())
}

fn read_string(input: &mut &[u8], context: &'static str) -> Result<String, P3dReadError> {
    let bytes = parse_bytes_prefixed(input).map_err(truncated(context))?;
    String::from_utf8(bytes).map_err(|_| P3dReadError::InvalidString)
}

fn parse_texture_info(input: &mut &[u8]) -> WResult<TextureInfo> {
    let mut counts = [0u32; 6];
    for count in &mut counts {
        *count = le_u32.parse_next(input)?;
    }
    let texture_start = le_u32.parse_next(input)?;
    Ok(TextureInfo {
        counts,
        texture_start,
    })
}

fn parse_polygon(input: &mut &[u8]) -> WResult<Polygon> {
    let mut vertices = [0u32; 3];
    for index in &mut vertices {
        *index = le_u32.parse_next(input)?;
    }
    let mut uvs = [[0.0f32; 2]; 3];
    for uv in &mut uvs {
        uv[0] = le_f32.parse_next(input)?;
        uv[1] = le_f32.parse_next(input)?;
    }
    // Kind and texture are stamped on afterwards from the texture-info table.
    Ok(Polygon {
        vertices,
        uvs,
        kind: MaterialKind::Gouraud,
        texture: 0,
    })
}

fn read_light(input: &mut &[u8]) -> Result<P3dLight, P3dReadError> {
    let name = read_string(input, "light name")?;
    let pos = parse_vec3(input).map_err(truncated("light position"))?;
    let range = le_f32.parse_next(input).map_err(truncated("light range"))?;
    let color = le_u32.parse_next(input).map_err(truncated("light color"))?;
    let show_corona = parse_bool(input).map_err(truncated("light flags"))?;
    let show_lens_flares = parse_bool(input).map_err(truncated("light flags"))?;
    let lightup_environment = parse_bool(input).map_err(truncated("light flags"))?;
    Ok(P3dLight {
        name,
        pos,
        range,
        color,
        show_corona,
        show_lens_flares,
        lightup_environment,
    })
}

/// Stamp material kind and texture index onto polygons by bucket position.
///
/// The exact inverse of the organizer's grouping: walk textures in document
/// order and kinds in the fixed kind order, consuming `counts` polygons per
/// bucket. Each `texture_start` must equal the running prefix sum, and the
/// buckets must account for the whole polygon array.
fn assign_materials(
    name: &str,
    texture_infos: &[TextureInfo],
    polys: &mut [Polygon],
) -> Result<(), P3dReadError> {
    let mut cursor: usize = 0;

    for (texture, info) in texture_infos.iter().enumerate() {
        if info.texture_start as usize != cursor {
            return Err(P3dReadError::TextureStartMismatch {
                mesh: name.to_string(),
                texture,
                expected: cursor as u32,
                found: info.texture_start,
            });
        }

        for kind in MaterialKind::ALL {
            let count = info.counts[kind.index()] as usize;
            let end = cursor.saturating_add(count);
            if end > polys.len() {
                return Err(P3dReadError::TextureTableOverrun {
                    mesh: name.to_string(),
                    accounted: end as u32,
                    actual: polys.len() as u32,
                });
            }
            for poly in &mut polys[cursor..end] {
                poly.kind = kind;
                poly.texture = texture as u32;
            }
            cursor = end;
        }
    }

    if cursor != polys.len() {
        return Err(P3dReadError::TextureTableOverrun {
            mesh: name.to_string(),
            accounted: cursor as u32,
            actual: polys.len() as u32,
        });
    }

    Ok(())
}

fn read_mesh(input: &mut &[u8], num_textures: usize) -> Result<P3dMesh, P3dReadError> {
    let name = read_string(input, "mesh name")?;
    let pos = parse_vec3(input).map_err(truncated("mesh position"))?;

    let num_vertices = le_u32
        .parse_next(input)
        .map_err(truncated("vertex count"))?;
    let mut vertices = Vec::with_capacity(num_vertices as usize);
    for _ in 0..num_vertices {
        vertices.push(parse_vec3(input).map_err(truncated("vertices"))?);
    }

    let length = le_f32.parse_next(input).map_err(truncated("mesh length"))?;
    let height = le_f32.parse_next(input).map_err(truncated("mesh height"))?;
    let depth = le_f32.parse_next(input).map_err(truncated("mesh depth"))?;
    let flags = le_u32.parse_next(input).map_err(truncated("mesh flags"))?;

    let mut texture_infos = Vec::with_capacity(num_textures);
    for _ in 0..num_textures {
        texture_infos.push(parse_texture_info(input).map_err(truncated("texture info table"))?);
    }

    let num_polys = le_u32
        .parse_next(input)
        .map_err(truncated("polygon count"))?;
    let mut polys = Vec::with_capacity(num_polys as usize);
    for _ in 0..num_polys {
        polys.push(parse_polygon(input).map_err(truncated("polygons"))?);
    }

    assign_materials(&name, &texture_infos, &mut polys)?;

    Ok(P3dMesh {
        name,
        pos,
        vertices,
        length,
        height,
        depth,
        flags,
        texture_infos,
        polys,
    })
}

/// Decode a complete document from bytes.
pub fn read_document(data: &[u8]) -> Result<P3dDocument, P3dReadError> {
    let input = &mut &data[..];

    let magic: &[u8] = take(4usize)
        .parse_next(input)
        .map_err(truncated("magic"))?;
    if magic != P3D_MAGIC {
        return Err(P3dReadError::BadMagic);
    }

    let num_textures = le_u32
        .parse_next(input)
        .map_err(truncated("texture count"))?;
    let num_meshes = le_u32.parse_next(input).map_err(truncated("mesh count"))?;
    let num_lights = le_u32.parse_next(input).map_err(truncated("light count"))?;
    let length = le_f32.parse_next(input).map_err(truncated("length"))?;
    let height = le_f32.parse_next(input).map_err(truncated("height"))?;
    let depth = le_f32.parse_next(input).map_err(truncated("depth"))?;

    let mut textures = Vec::with_capacity(num_textures as usize);
    for _ in 0..num_textures {
        textures.push(read_string(input, "texture name")?);
    }

    let mut lights = Vec::with_capacity(num_lights as usize);
    for _ in 0..num_lights {
        lights.push(read_light(input)?);
    }

    let mut meshes = Vec::with_capacity(num_meshes as usize);
    for _ in 0..num_meshes {
        meshes.push(read_mesh(input, num_textures as usize)?);
    }

    Ok(P3dDocument {
        textures,
        meshes,
        lights,
        length,
        height,
        depth,
    })
}
