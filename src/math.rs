use std::f64::consts::PI;

use cgmath::{InnerSpace, Matrix3, Vector2};

pub const OSU_COORDS_WIDTH: f64 = 512.0;
pub const OSU_COORDS_HEIGHT: f64 = 384.0;

/// Playfield pixels per unit of the remapped coordinate space
pub const OSU_PIXELS_PER_UNIT: f64 = OSU_COORDS_WIDTH / 2.0;

/// Maps a 0..10 difficulty value onto `min..mid..max`, 5 being `mid`
pub fn diff_rate(diff: f32, min: f32, mid: f32, max: f32) -> f32 {
    if diff > 5.0 {
        mid + (max - mid) * (diff - 5.0) / 5.0
    } else if diff < 5.0 {
        mid - (mid - min) * (5.0 - diff) / 5.0
    } else {
        mid
    }
}

/// Approach time in **seconds** for a given AR
pub fn approach_time(ar: f32) -> f64 {
    let ar = ar as f64;
    1.8 - ar.min(5.0) * 0.12 - (ar - 5.0).max(0.0) * 0.15
}

/// Note radius in playfield units for a given CS
pub fn circle_radius(cs: f32) -> f64 {
    -0.0179411764705882 * cs as f64 + 0.220392156862745
}

/// Remaps raw playfield pixels (origin top-left, 512x384)
/// into the centered unit space used by the judging core.
///
/// Horizontal axis spans `[-1, 1]`, vertical `[-0.75, 0.75]`
/// and points up.
#[inline]
pub fn remap_position(x: f64, y: f64) -> Vector2<f64> {
    Vector2::new(
        (x - OSU_COORDS_WIDTH / 2.0) / OSU_PIXELS_PER_UNIT,
        (OSU_COORDS_HEIGHT / 2.0 - y) / OSU_PIXELS_PER_UNIT,
    )
}

#[inline]
pub fn remap_length(pixels: f64) -> f64 {
    pixels / OSU_PIXELS_PER_UNIT
}

#[inline]
pub fn distance(a: Vector2<f64>, b: Vector2<f64>) -> f64 {
    (b - a).magnitude()
}

/// Angle of a direction vector in radians
#[inline]
pub fn direction_angle(dir: Vector2<f64>) -> f64 {
    dir.y.atan2(dir.x)
}

/// Same as [`direction_angle`] but pointing the other way,
/// normalized into `[-PI, PI]`
#[inline]
pub fn opposite_direction_angle(dir: Vector2<f64>) -> f64 {
    let angle = direction_angle(dir) + PI;

    if angle > PI {
        angle - 2.0 * PI
    } else {
        angle
    }
}

/// Smallest signed difference between two angles, in `(-PI, PI]`
pub fn angle_delta(from: f64, to: f64) -> f64 {
    let mut delta = (to - from) % (2.0 * PI);

    if delta > PI {
        delta -= 2.0 * PI;
    } else if delta <= -PI {
        delta += 2.0 * PI;
    }

    delta
}

#[inline]
pub fn calc_progress(current: f64, start: f64, end: f64) -> f64 {
    (current - start) / (end - start)
}

/// 2D affine transform: rotate by `angle`, scale, then translate
pub fn transform_2d(pos: Vector2<f64>, scale: Vector2<f64>, angle: f64) -> Matrix3<f32> {
    let (sin, cos) = angle.sin_cos();

    Matrix3::new(
        (cos * scale.x) as f32, (sin * scale.x) as f32, 0.0,
        (-sin * scale.y) as f32, (cos * scale.y) as f32, 0.0,
        pos.x as f32, pos.y as f32, 1.0,
    )
}

#[test]
pub fn test_progress() {
    assert_eq!(calc_progress(50.0, 0.0, 100.0), 0.50);
}

#[test]
pub fn test_approach_time_boundaries() {
    assert!((approach_time(0.0) - 1.8).abs() < 1e-9);
    assert!((approach_time(5.0) - 1.2).abs() < 1e-9);
    assert!((approach_time(10.0) - 0.45).abs() < 1e-9);
}

#[test]
pub fn test_remap_corners() {
    let top_left = remap_position(0.0, 0.0);
    assert_eq!(top_left, Vector2::new(-1.0, 0.75));

    let center = remap_position(256.0, 192.0);
    assert_eq!(center, Vector2::new(0.0, 0.0));
}

#[test]
pub fn test_opposite_direction() {
    let up = Vector2::new(0.0, 1.0);
    assert!((opposite_direction_angle(up) + PI / 2.0).abs() < 1e-9);
}

#[test]
pub fn test_angle_delta_wraps() {
    let delta = angle_delta(PI - 0.1, -PI + 0.1);
    assert!((delta - 0.2).abs() < 1e-9);
}
