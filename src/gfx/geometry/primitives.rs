//! # Primitive Shape Generation
//!
//! All shapes are generated with unit normals and texture coordinates in
//! [0, 1].

use super::GeometryData;
use std::f32::consts::PI;

/// Generate a UV sphere with specified resolution
///
/// # Arguments
/// * `longitude_segments` - Number of vertical segments (longitude lines)
/// * `latitude_segments` - Number of horizontal segments (latitude lines)
///
/// Returns a sphere of radius 1.0 centered at the origin with its poles on
/// the Y axis. `v` runs from 1 at the north pole to 0 at the south pole.
pub fn generate_sphere(longitude_segments: u32, latitude_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let long_segs = longitude_segments.max(3);
    let lat_segs = latitude_segments.max(2);

    for lat in 0..=lat_segs {
        let theta = lat as f32 * PI / lat_segs as f32; // 0 to PI
        let sin_theta = theta.sin();
        let cos_theta = theta.cos();

        for long in 0..=long_segs {
            let phi = long as f32 * 2.0 * PI / long_segs as f32; // 0 to 2*PI

            let x = -sin_theta * phi.cos();
            let y = cos_theta;
            let z = sin_theta * phi.sin();

            data.vertices.push([x, y, z]);
            data.normals.push([x, y, z]);
            data.tex_coords.push([
                long as f32 / long_segs as f32,
                1.0 - lat as f32 / lat_segs as f32,
            ]);
        }
    }

    for lat in 0..lat_segs {
        for long in 0..long_segs {
            let first = lat * (long_segs + 1) + long;
            let second = first + long_segs + 1;

            // The pole rows collapse to a point; skip their degenerate halves
            if lat != 0 {
                data.indices.extend_from_slice(&[first, second, first + 1]);
            }
            if lat != lat_segs - 1 {
                data.indices.extend_from_slice(&[second, second + 1, first + 1]);
            }
        }
    }

    data
}

/// Generate a plane in the XY plane facing +Z
///
/// # Arguments
/// * `width` - Width of the plane (X direction)
/// * `height` - Height of the plane (Y direction)
/// * `width_segments` - Number of subdivisions along width
/// * `height_segments` - Number of subdivisions along height
///
/// UV (0, 0) is the bottom-left corner, (1, 1) the top-right one.
pub fn generate_plane(width: f32, height: f32, width_segments: u32, height_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let w_segs = width_segments.max(1);
    let h_segs = height_segments.max(1);

    for y in 0..=h_segs {
        let v = y as f32 / h_segs as f32;
        let pos_y = (v - 0.5) * height;

        for x in 0..=w_segs {
            let u = x as f32 / w_segs as f32;
            let pos_x = (u - 0.5) * width;

            data.vertices.push([pos_x, pos_y, 0.0]);
            data.normals.push([0.0, 0.0, 1.0]);
            data.tex_coords.push([u, v]);
        }
    }

    // Counter-clockwise when viewed from +Z
    for y in 0..h_segs {
        for x in 0..w_segs {
            let i = y * (w_segs + 1) + x;
            let next_row = i + w_segs + 1;

            data.indices.extend_from_slice(&[i, i + 1, next_row]);
            data.indices.extend_from_slice(&[next_row, i + 1, next_row + 1]);
        }
    }

    data
}
