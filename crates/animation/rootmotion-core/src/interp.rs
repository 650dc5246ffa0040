//! Interpolation helpers shared by the curve types:
//! - lerp_f32 (linear)
//! - hermite (cubic segment from values + tangents)
//! - unwind_degrees (nearest equivalent angle)

/// Linear interpolation of scalars.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Cubic Hermite segment. `m0`/`m1` are tangents already scaled by the segment length.
#[inline]
pub fn hermite(p0: f32, m0: f32, p1: f32, m1: f32, t: f32) -> f32 {
    let t2 = t * t;
    let t3 = t2 * t;
    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;
    h00 * p0 + h10 * m0 + h01 * p1 + h11 * m1
}

/// Wrap an angle in degrees into (-180, 180].
#[inline]
pub fn normalize_degrees(deg: f32) -> f32 {
    let wrapped = (deg + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped <= -180.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}

/// Equivalent of `angle` (degrees) closest to `reference`.
#[inline]
pub fn unwind_degrees(reference: f32, angle: f32) -> f32 {
    reference + normalize_degrees(angle - reference)
}
