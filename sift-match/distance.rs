use std::f32::consts::PI;

use sift_core::Descriptor;

/// Angle between two unit descriptors, in `[0, π]`.
///
/// Equal to `arccos(a · b)` for unit vectors but evaluated through the chord
/// length `2·asin(‖a − b‖ / 2)`, which is exactly zero for identical inputs
/// and cannot leave the domain when `a · b` rounds past ±1.
#[inline]
pub fn angular_distance(a: &Descriptor, b: &Descriptor) -> f32 {
    let squared: f32 = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = x - y;
            d * d
        })
        .sum();
    2.0 * (squared.sqrt() * 0.5).min(1.0).asin()
}

/// Map an angle difference into `(-π, π]`
#[inline]
pub fn wrap_angle(theta: f32) -> f32 {
    let t = theta.rem_euclid(2.0 * PI);
    if t > PI {
        t - 2.0 * PI
    } else {
        t
    }
}
