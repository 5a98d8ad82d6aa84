/// The CCA anchor-position sidecar format (named attachment points)
pub mod cca;
/// Error definitions
pub mod error;
/// High-level scene → P3D export pipeline (document assembly, logging)
pub mod export;
/// High-level P3D → scene import pipeline (texture resolution)
pub mod import;
/// The P3D model format: document model, geometry preparation, codecs
pub mod p3d;
/// Scene descriptions exchanged with the host 3D application
pub mod scene;
