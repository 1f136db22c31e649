//! Test asset generation
//!
//! Writes a small glTF scene with an external .bin buffer: a 3-vertex
//! "triangle" mesh followed by a 5-vertex "pentagon" mesh.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::path::{Path, PathBuf};

pub const TRIANGLE_VERTICES: usize = 3;
pub const PENTAGON_VERTICES: usize = 5;

fn triangle() -> Vec<[f32; 3]> {
    vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 1.0, 0.0]]
}

/// House outline in the z = 1 plane
fn pentagon() -> Vec<[f32; 3]> {
    vec![
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [1.0, 1.0, 1.0],
        [0.5, 1.5, 1.0],
        [0.0, 1.0, 1.0],
    ]
}

/// Vertex data for both meshes, tightly packed
pub fn scene_binary() -> Vec<u8> {
    triangle()
        .iter()
        .chain(pentagon().iter())
        .flat_map(|pos| pos.iter().flat_map(|f| f.to_le_bytes()))
        .collect()
}

/// glTF JSON for the scene, with buffer 0 optionally pointing at `uri`
pub fn scene_json(uri: Option<&str>) -> Value {
    let triangle_bytes = TRIANGLE_VERTICES * 12;
    let pentagon_bytes = PENTAGON_VERTICES * 12;

    let mut buffer = json!({"byteLength": triangle_bytes + pentagon_bytes});
    if let Some(uri) = uri {
        buffer["uri"] = uri.into();
    }

    json!({
        "asset": {"version": "2.0", "generator": "tile-export tests"},
        "scene": 0,
        "scenes": [{"nodes": [0, 1]}],
        "nodes": [{"mesh": 0}, {"mesh": 1}],
        "meshes": [
            {"name": "triangle", "primitives": [{"attributes": {"POSITION": 0}}]},
            {"name": "pentagon", "primitives": [{"attributes": {"POSITION": 1}}]}
        ],
        "accessors": [
            {
                "bufferView": 0,
                "componentType": 5126,
                "count": TRIANGLE_VERTICES,
                "type": "VEC3",
                "min": [0.0, 0.0, 0.0],
                "max": [1.0, 1.0, 0.0]
            },
            {
                "bufferView": 1,
                "componentType": 5126,
                "count": PENTAGON_VERTICES,
                "type": "VEC3",
                "min": [0.0, 0.0, 1.0],
                "max": [1.0, 1.5, 1.0]
            }
        ],
        "bufferViews": [
            {"buffer": 0, "byteOffset": 0, "byteLength": triangle_bytes, "target": 34962},
            {"buffer": 0, "byteOffset": triangle_bytes, "byteLength": pentagon_bytes, "target": 34962}
        ],
        "buffers": [buffer]
    })
}

/// Write `scene.gltf` + `scene.bin` into `dir`
pub fn write_gltf_scene(dir: &Path) -> PathBuf {
    std::fs::write(dir.join("scene.bin"), scene_binary()).expect("Failed to write scene.bin");
    let path = dir.join("scene.gltf");
    let text = serde_json::to_vec_pretty(&scene_json(Some("scene.bin"))).unwrap();
    std::fs::write(&path, text).expect("Failed to write scene.gltf");
    path
}

/// Write `scene.glb` into `dir`, geometry in the BIN chunk
pub fn write_glb_scene(dir: &Path) -> PathBuf {
    let glb = tile_builder::pack_glb(&scene_json(None), &scene_binary()).unwrap();
    let path = dir.join("scene.glb");
    std::fs::write(&path, glb).expect("Failed to write scene.glb");
    path
}
