//! P3D binary writer.
//!
//! Layout, all little-endian: `P3D\x02` magic; u32 texture/mesh/light counts;
//! f32 document length/height/depth; texture names; lights; meshes. Strings
//! are u32-length-prefixed UTF-8 with no terminator. [`super::read`] mirrors
//! this field for field.
//!
//! Polygons are written in the order produced by [`super::organize`]; material
//! kind and texture index are never written per-polygon. Readers reconstruct
//! them from the texture-info tables alone.

use super::{P3dDocument, P3dLight, P3dMesh};

/// Stream magic: `P3D` plus the format version byte.
pub const P3D_MAGIC: [u8; 4] = *b"P3D\x02";

fn write_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn write_f32(buf: &mut Vec<u8>, v: f32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn write_vec3(buf: &mut Vec<u8>, v: [f32; 3]) {
    for c in v {
        write_f32(buf, c);
    }
}

fn write_bool(buf: &mut Vec<u8>, v: bool) {
    buf.push(v as u8);
}

fn write_string(buf: &mut Vec<u8>, s: &str) {
    write_u32(buf, s.len() as u32);
    buf.extend_from_slice(s.as_bytes());
}

fn write_light(buf: &mut Vec<u8>, light: &P3dLight) {
    write_string(buf, &light.name);
    write_vec3(buf, light.pos);
    write_f32(buf, light.range);
    write_u32(buf, light.color);
    write_bool(buf, light.show_corona);
    write_bool(buf, light.show_lens_flares);
    write_bool(buf, light.lightup_environment);
}

fn write_mesh(buf: &mut Vec<u8>, mesh: &P3dMesh) {
    write_string(buf, &mesh.name);
    write_vec3(buf, mesh.pos);

    write_u32(buf, mesh.vertices.len() as u32);
    for v in &mesh.vertices {
        write_vec3(buf, *v);
    }

    write_f32(buf, mesh.length);
    write_f32(buf, mesh.height);
    write_f32(buf, mesh.depth);
    write_u32(buf, mesh.flags);

    for info in &mesh.texture_infos {
        for count in info.counts {
            write_u32(buf, count);
        }
        write_u32(buf, info.texture_start);
    }

    write_u32(buf, mesh.polys.len() as u32);
    for poly in &mesh.polys {
        for index in poly.vertices {
            write_u32(buf, index);
        }
        for uv in poly.uvs {
            write_f32(buf, uv[0]);
            write_f32(buf, uv[1]);
        }
    }
}

/// Serialize a complete document to bytes.
pub fn write_document(doc: &P3dDocument) -> Vec<u8> {
    let mut buf = Vec::new();

    buf.extend_from_slice(&P3D_MAGIC);
    write_u32(&mut buf, doc.num_textures() as u32);
    write_u32(&mut buf, doc.num_meshes() as u32);
    write_u32(&mut buf, doc.num_lights() as u32);
    write_f32(&mut buf, doc.length);
    write_f32(&mut buf, doc.height);
    write_f32(&mut buf, doc.depth);

    for texture in &doc.textures {
        write_string(&mut buf, texture);
    }
    for light in &doc.lights {
        write_light(&mut buf, light);
    }
    for mesh in &doc.meshes {
        write_mesh(&mut buf, mesh);
    }

    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let doc = P3dDocument {
            textures: vec!["walls.tga".to_string()],
            length: 20.0,
            height: 4.0,
            depth: 40.0,
            ..Default::default()
        };
        let bytes = write_document(&doc);

        assert_eq!(&bytes[0..4], b"P3D\x02");
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 1);
        assert_eq!(u32::from_le_bytes(bytes[8..12].try_into().unwrap()), 0);
        assert_eq!(u32::from_le_bytes(bytes[12..16].try_into().unwrap()), 0);
        assert_eq!(f32::from_le_bytes(bytes[16..20].try_into().unwrap()), 20.0);
        // First texture name directly after the three dimension floats.
        assert_eq!(u32::from_le_bytes(bytes[28..32].try_into().unwrap()), 9);
        assert_eq!(&bytes[32..41], b"walls.tga");
    }

    #[test]
    fn test_strings_have_no_terminator() {
        let doc = P3dDocument {
            textures: vec!["a.tga".to_string()],
            ..Default::default()
        };
        let bytes = write_document(&doc);
        assert_eq!(bytes.len(), 4 + 12 + 12 + 4 + 5);
    }
}
