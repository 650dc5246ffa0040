//! Translation / rotation / scale transform used for poses, root motion deltas and curve samples.
//!
//! Composition follows the child-in-parent convention: `a * b` applies `a` first and
//! then `b`, so `a * b` is `a` expressed in the frame of `b`.

use std::ops::Mul;

use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

const SMALL_NUMBER: f32 = 1e-8;

/// Build a unit quaternion from `[x, y, z, w]`. Degenerate input yields identity.
pub fn quat_from_xyzw(q: [f32; 4]) -> UnitQuaternion<f32> {
    let raw = Quaternion::new(q[3], q[0], q[1], q[2]);
    if raw.norm_squared() <= SMALL_NUMBER {
        UnitQuaternion::identity()
    } else {
        UnitQuaternion::from_quaternion(raw)
    }
}

/// Components of a unit quaternion as `[x, y, z, w]`.
#[inline]
pub fn quat_to_xyzw(q: &UnitQuaternion<f32>) -> [f32; 4] {
    [q.i, q.j, q.k, q.w]
}

#[inline]
fn safe_recip(v: f32) -> f32 {
    if v.abs() <= SMALL_NUMBER {
        0.0
    } else {
        v.recip()
    }
}

#[inline]
fn safe_recip3(v: &Vector3<f32>) -> Vector3<f32> {
    Vector3::new(safe_recip(v.x), safe_recip(v.y), safe_recip(v.z))
}

/// Rigid transform with non-uniform scale.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "TransformRepr", into = "TransformRepr")]
pub struct Transform {
    pub translation: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub scale: Vector3<f32>,
}

/// Wire form: plain arrays, quaternion as (x, y, z, w).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct TransformRepr {
    #[serde(default)]
    translation: [f32; 3],
    #[serde(default = "identity_xyzw")]
    rotation: [f32; 4],
    #[serde(default = "unit_scale")]
    scale: [f32; 3],
}

fn identity_xyzw() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

fn unit_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

impl From<TransformRepr> for Transform {
    fn from(r: TransformRepr) -> Self {
        Self {
            translation: Vector3::from(r.translation),
            rotation: quat_from_xyzw(r.rotation),
            scale: Vector3::from(r.scale),
        }
    }
}

impl From<Transform> for TransformRepr {
    fn from(t: Transform) -> Self {
        Self {
            translation: t.translation.into(),
            rotation: quat_to_xyzw(&t.rotation),
            scale: t.scale.into(),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn new(
        translation: Vector3<f32>,
        rotation: UnitQuaternion<f32>,
        scale: Vector3<f32>,
    ) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Zero translation, identity rotation, unit scale.
    #[inline]
    pub fn identity() -> Self {
        Self {
            translation: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: Vector3::repeat(1.0),
        }
    }

    pub fn from_translation(translation: Vector3<f32>) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    pub fn from_rotation(rotation: UnitQuaternion<f32>) -> Self {
        Self {
            rotation,
            ..Self::identity()
        }
    }

    pub fn from_scale(scale: Vector3<f32>) -> Self {
        Self {
            scale,
            ..Self::identity()
        }
    }

    /// Build from plain arrays; quaternion is (x, y, z, w).
    pub fn from_arrays(translation: [f32; 3], rotation: [f32; 4], scale: [f32; 3]) -> Self {
        TransformRepr {
            translation,
            rotation,
            scale,
        }
        .into()
    }

    /// Rotation as Euler angles in degrees: x = roll, y = pitch, z = yaw.
    pub fn euler_degrees(&self) -> Vector3<f32> {
        let (roll, pitch, yaw) = self.rotation.euler_angles();
        Vector3::new(roll.to_degrees(), pitch.to_degrees(), yaw.to_degrees())
    }

    /// Inverse of [`Transform::euler_degrees`].
    pub fn rotation_from_euler_degrees(euler: &Vector3<f32>) -> UnitQuaternion<f32> {
        UnitQuaternion::from_euler_angles(
            euler.x.to_radians(),
            euler.y.to_radians(),
            euler.z.to_radians(),
        )
    }

    /// Transform that undoes `self`: `self * self.inverse()` is identity.
    pub fn inverse(&self) -> Self {
        let rotation = self.rotation.inverse();
        let scale = safe_recip3(&self.scale);
        let translation = -(rotation * self.translation.component_mul(&scale));
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// `self` expressed in the frame of `other`: the result `r` satisfies `r * other == self`.
    pub fn relative_to(&self, other: &Transform) -> Self {
        let inv_rotation = other.rotation.inverse();
        let inv_scale = safe_recip3(&other.scale);
        Self {
            translation: (inv_rotation * (self.translation - other.translation))
                .component_mul(&inv_scale),
            rotation: inv_rotation * self.rotation,
            scale: self.scale.component_mul(&inv_scale),
        }
    }

    /// Apply this transform to a point.
    pub fn transform_point(&self, point: &Vector3<f32>) -> Vector3<f32> {
        self.rotation * point.component_mul(&self.scale) + self.translation
    }

    /// Blend from identity (`weight = 0`) to `self` (`weight = 1`).
    pub fn blend_from_identity(&self, weight: f32) -> Self {
        if weight >= 1.0 {
            return *self;
        }
        if weight <= 0.0 {
            return Self::identity();
        }
        // Short arc: q and -q are the same rotation.
        let target = if self.rotation.w < 0.0 {
            UnitQuaternion::new_unchecked(-self.rotation.into_inner())
        } else {
            self.rotation
        };
        let rotation = UnitQuaternion::identity()
            .try_slerp(&target, weight, 1e-6)
            .unwrap_or(target);
        Self {
            translation: self.translation * weight,
            rotation,
            scale: Vector3::repeat(1.0) + (self.scale - Vector3::repeat(1.0)) * weight,
        }
    }

    /// Component-wise comparison with a shared tolerance (rotation compared by angle).
    pub fn approx_eq(&self, other: &Transform, tolerance: f32) -> bool {
        (self.translation - other.translation).amax() <= tolerance
            && (self.scale - other.scale).amax() <= tolerance
            && self.rotation.angle_to(&other.rotation) <= tolerance
    }

    pub fn is_identity(&self, tolerance: f32) -> bool {
        self.approx_eq(&Self::identity(), tolerance)
    }
}

impl Mul for Transform {
    type Output = Transform;

    /// `self` applied first, then `parent`.
    fn mul(self, parent: Transform) -> Transform {
        Transform {
            translation: parent.rotation * self.translation.component_mul(&parent.scale)
                + parent.translation,
            rotation: parent.rotation * self.rotation,
            scale: self.scale.component_mul(&parent.scale),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    fn yaw(deg: f32) -> UnitQuaternion<f32> {
        UnitQuaternion::from_euler_angles(0.0, 0.0, deg.to_radians())
    }

    #[test]
    fn child_is_applied_in_parent_frame() {
        let child = Transform::from_translation(Vector3::new(1.0, 0.0, 0.0));
        let parent = Transform::new(
            Vector3::new(10.0, 0.0, 0.0),
            UnitQuaternion::from_euler_angles(0.0, 0.0, FRAC_PI_2),
            Vector3::repeat(2.0),
        );
        let world = child * parent;
        assert_relative_eq!(world.translation, Vector3::new(10.0, 2.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(world.scale, Vector3::repeat(2.0));
    }

    #[test]
    fn relative_to_undoes_composition() {
        let a = Transform::new(
            Vector3::new(3.0, -1.0, 2.0),
            yaw(30.0),
            Vector3::new(1.0, 2.0, 1.0),
        );
        let b = Transform::new(Vector3::new(-5.0, 4.0, 0.5), yaw(-75.0), Vector3::repeat(1.5));
        let r = a.relative_to(&b);
        assert!((r * b).approx_eq(&a, 1e-4));
        assert!(a.relative_to(&a).is_identity(1e-5));
    }

    #[test]
    fn inverse_cancels() {
        let t = Transform::new(Vector3::new(1.0, 2.0, 3.0), yaw(45.0), Vector3::repeat(2.0));
        assert!((t * t.inverse()).is_identity(1e-5));
    }

    #[test]
    fn composition_is_not_commutative() {
        let a = Transform::new(Vector3::new(1.0, 0.0, 0.0), yaw(90.0), Vector3::repeat(1.0));
        let b = Transform::new(Vector3::new(0.0, 2.0, 0.0), yaw(10.0), Vector3::repeat(1.0));
        assert!(!(a * b).approx_eq(&(b * a), 1e-3));
    }

    #[test]
    fn euler_roundtrip() {
        let euler = Vector3::new(10.0, -20.0, 135.0);
        let t = Transform::from_rotation(Transform::rotation_from_euler_degrees(&euler));
        assert_relative_eq!(t.euler_degrees(), euler, epsilon = 1e-3);
    }

    #[test]
    fn blend_from_identity_endpoints() {
        let t = Transform::new(Vector3::new(4.0, 0.0, 0.0), yaw(90.0), Vector3::repeat(3.0));
        assert!(t.blend_from_identity(0.0).is_identity(1e-6));
        assert_eq!(t.blend_from_identity(1.0), t);
        let half = t.blend_from_identity(0.5);
        assert_relative_eq!(half.translation.x, 2.0);
        assert_relative_eq!(half.scale.x, 2.0);
        assert!((half.rotation.angle() - 45f32.to_radians()).abs() < 1e-4);
    }

    #[test]
    fn serde_uses_xyzw_arrays() {
        let t = Transform::from_arrays([1.0, 2.0, 3.0], [0.0, 0.0, 0.0, 1.0], [1.0, 1.0, 1.0]);
        let v = serde_json::to_value(t).unwrap();
        assert_eq!(v["rotation"], serde_json::json!([0.0, 0.0, 0.0, 1.0]));
        let back: Transform = serde_json::from_value(serde_json::json!({
            "translation": [1.0, 2.0, 3.0]
        }))
        .unwrap();
        assert!(back.approx_eq(&t, 1e-6));
    }
}
