//! Physics type re-exports from glam
//!
//! This module provides the core mathematical types used throughout
//! the ring gravity engine, plus the small vector helpers every
//! component shares.

pub use glam::{Quat, Vec2, Vec3};

/// Squared length below which a vector is treated as zero.
pub const DEGENERATE_LENGTH_SQ: f32 = 1.0e-10;

/// Returns the normalized vector, or `None` when `v` is zero-length or
/// contains NaN/infinite components.
pub fn checked_direction(v: Vec3) -> Option<Vec3> {
    if !v.is_finite() || v.length_squared() < DEGENERATE_LENGTH_SQ {
        return None;
    }
    Some(v.normalize())
}

/// Angle in radians between two directions, robust against rounding.
///
/// Inputs do not need to be normalized; zero vectors yield 0.
pub fn angle_between(a: Vec3, b: Vec3) -> f32 {
    match (checked_direction(a), checked_direction(b)) {
        (Some(a), Some(b)) => a.dot(b).clamp(-1.0, 1.0).acos(),
        _ => 0.0,
    }
}

/// Spherical interpolation between two unit directions around a fixed axis.
///
/// `axis` must be perpendicular to `from` when the directions are
/// antiparallel; otherwise the rotation plane is derived from the
/// directions themselves. The result is always unit length.
pub fn slerp_direction(from: Vec3, to: Vec3, t: f32, axis: Vec3) -> Vec3 {
    let cos = from.dot(to).clamp(-1.0, 1.0);
    if cos > 1.0 - 1.0e-6 {
        return from.lerp(to, t).normalize_or(to);
    }
    let angle = cos.acos();
    let rotation = Quat::from_axis_angle(axis, angle * t);
    (rotation * from).normalize_or(to)
}

/// Rotation axis for turning `from` into `to`, with `hint` used when the
/// two are (anti)parallel and the cross product vanishes.
pub fn rotation_axis(from: Vec3, to: Vec3, hint: Vec3) -> Vec3 {
    let cross = from.cross(to);
    if cross.length_squared() > DEGENERATE_LENGTH_SQ {
        return cross.normalize();
    }
    // Project the hint onto the plane perpendicular to `from`
    let projected = hint - from * hint.dot(from);
    if projected.length_squared() > DEGENERATE_LENGTH_SQ {
        projected.normalize()
    } else {
        from.any_orthonormal_vector()
    }
}
