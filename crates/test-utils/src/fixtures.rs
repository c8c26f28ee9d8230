use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

pub const CHAIR_DESCRIPTION: &str = "A small wooden chair.";

fn encode(width: u32, height: u32, rgb: [u8; 3], format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(rgb)))
        .write_to(&mut Cursor::new(&mut buf), format)
        .expect("encoding an in-memory fixture image cannot fail");
    buf
}

/// Solid-colour JPEG.
pub fn jpeg_bytes(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    encode(width, height, rgb, ImageFormat::Jpeg)
}

/// Solid-colour PNG; lossless, so channel means are exact.
pub fn png_bytes(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    encode(width, height, rgb, ImageFormat::Png)
}

pub fn garbage_bytes() -> Vec<u8> {
    b"this is a plain text file, not an image".to_vec()
}

/// A PNG cut off right after its signature and part of the header.
pub fn truncated_png() -> Vec<u8> {
    png_bytes(32, 32, [10, 20, 30])[..20].to_vec()
}

/// LightGBM dump of a single tree that always predicts `value`.
pub fn constant_regressor_json(n_features: usize, value: f64) -> String {
    serde_json::json!({
        "name": "tree",
        "version": "v4",
        "num_class": 1,
        "num_tree_per_iteration": 1,
        "max_feature_idx": n_features - 1,
        "objective": "regression",
        "average_output": false,
        "tree_info": [
            { "tree_index": 0, "num_leaves": 1, "shrinkage": 1, "tree_structure": { "leaf_value": value } }
        ]
    })
    .to_string()
}

/// LightGBM dump of one stump: `x[feature] <= threshold ? left : right`.
pub fn stump_regressor_json(
    n_features: usize,
    feature: usize,
    threshold: f64,
    left: f64,
    right: f64,
) -> String {
    serde_json::json!({
        "name": "tree",
        "version": "v4",
        "num_class": 1,
        "num_tree_per_iteration": 1,
        "max_feature_idx": n_features - 1,
        "objective": "regression",
        "average_output": false,
        "tree_info": [{
            "tree_index": 0,
            "num_leaves": 2,
            "shrinkage": 1,
            "tree_structure": {
                "split_index": 0,
                "split_feature": feature,
                "threshold": threshold,
                "decision_type": "<=",
                "default_left": true,
                "missing_type": "None",
                "left_child": { "leaf_index": 0, "leaf_value": left },
                "right_child": { "leaf_index": 1, "leaf_value": right }
            }
        }]
    })
    .to_string()
}

pub fn write_fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write fixture");
    path
}
