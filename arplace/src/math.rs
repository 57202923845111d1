//! Math types for arplace

pub use glam::{Mat4, Quat, Vec3};

/// Translation, rotation and scale of a scene node.
///
/// Poses coming from the platform are raw column-major 4x4 matrices; the scene
/// graph stores them decomposed, which is what this type holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
            scale: Vec3::ONE,
        }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            rotation,
            ..Self::IDENTITY
        }
    }

    /// Decomposes an affine matrix into translation, rotation and scale.
    pub fn from_matrix(matrix: Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Decomposes a column-major pose matrix as delivered by the platform.
    pub fn from_cols_array(cols: &[f32; 16]) -> Self {
        Self::from_matrix(Mat4::from_cols_array(cols))
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Composes `self` (parent) with `child`, yielding the child's transform in
    /// the parent's parent space.
    pub fn mul_transform(&self, child: &Transform) -> Transform {
        Self::from_matrix(self.to_matrix() * child.to_matrix())
    }

    pub fn inverse(&self) -> Transform {
        Self::from_matrix(self.to_matrix().inverse())
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * (-Vec3::Z)
    }

    /// Approximate equality. `q` and `-q` describe the same rotation, so both
    /// are accepted.
    pub fn abs_diff_eq(&self, other: &Self, max_abs_diff: f32) -> bool {
        self.translation
            .abs_diff_eq(other.translation, max_abs_diff)
            && self.scale.abs_diff_eq(other.scale, max_abs_diff)
            && (self.rotation.abs_diff_eq(other.rotation, max_abs_diff)
                || self.rotation.abs_diff_eq(-other.rotation, max_abs_diff))
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A half-line used for controller selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction (zero if constructed from a degenerate vector)
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Ray starting at the transform's origin and pointing down its local -Z axis,
    /// which is the pointing direction of a tracked controller.
    pub fn from_transform(transform: &Transform) -> Self {
        Self::new(transform.translation, transform.forward())
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }

    /// Distance along the ray to the first intersection with a sphere.
    ///
    /// Returns `Some(0.0)` when the origin is inside the sphere and `None` when
    /// the sphere is missed or lies entirely behind the origin.
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        if self.direction == Vec3::ZERO || radius <= 0.0 {
            return None;
        }

        let oc = self.origin - center;
        let b = oc.dot(self.direction);
        let c = oc.length_squared() - radius * radius;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }

        let root = discriminant.sqrt();
        let far = -b + root;
        if far < 0.0 {
            return None;
        }
        Some((-b - root).max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_round_trip_keeps_pose() {
        let transform = Transform {
            translation: Vec3::new(1.0, 2.0, -3.0),
            rotation: Quat::from_rotation_y(0.7),
            scale: Vec3::splat(2.0),
        };
        let cols = transform.to_matrix().to_cols_array();
        let decoded = Transform::from_cols_array(&cols);
        assert!(decoded.abs_diff_eq(&transform, 1e-5));
    }

    #[test]
    fn test_inverse_composes_to_identity() {
        let transform = Transform::new(Vec3::new(0.5, 0.0, 1.0), Quat::from_rotation_x(0.3));
        let composed = transform.mul_transform(&transform.inverse());
        assert!(composed.abs_diff_eq(&Transform::IDENTITY, 1e-5));
    }

    #[test]
    fn test_forward_is_negative_z() {
        assert_eq!(Transform::IDENTITY.forward(), Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_ray_hits_sphere_in_front() {
        let ray = Ray::from_transform(&Transform::IDENTITY);
        let distance = ray.intersect_sphere(Vec3::new(0.0, 0.0, -5.0), 1.0);
        assert_eq!(distance, Some(4.0));
    }

    #[test]
    fn test_ray_misses_sphere_behind_and_beside() {
        let ray = Ray::from_transform(&Transform::IDENTITY);
        assert_eq!(ray.intersect_sphere(Vec3::new(0.0, 0.0, 5.0), 1.0), None);
        assert_eq!(ray.intersect_sphere(Vec3::new(3.0, 0.0, -5.0), 1.0), None);
    }

    #[test]
    fn test_ray_origin_inside_sphere() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert_eq!(ray.intersect_sphere(Vec3::ZERO, 1.0), Some(0.0));
    }
}
