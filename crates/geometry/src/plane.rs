use bevy_math::Vec3;

/// An oriented plane in velocity space.
///
/// `normal` is expected to be unit length. Velocities `v` with
/// `normal.dot(v - point) >= 0.0` lie on the permitted side.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub point: Vec3,
    pub normal: Vec3,
}

impl Plane {
    #[must_use]
    pub fn new(point: Vec3, normal: Vec3) -> Self {
        Self { point, normal }
    }

    /// Signed distance of `pt` from the plane, positive on the permitted side.
    #[must_use]
    pub fn signed_distance(&self, pt: Vec3) -> f32 {
        self.normal.dot(pt - self.point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_signed_distance() {
        let plane = Plane::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 1.0, 0.0));

        assert_eq!(plane.signed_distance(Vec3::new(3.0, 2.0, -1.0)), 1.0);
        assert_eq!(plane.signed_distance(Vec3::new(0.0, 0.0, 0.0)), -1.0);
        assert_eq!(plane.signed_distance(Vec3::new(5.0, 1.0, 5.0)), 0.0);
    }

    #[test]
    fn test_signed_distance_diagonal_normal() {
        let plane = Plane::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0).normalize());

        assert_relative_eq!(
            plane.signed_distance(Vec3::new(1.0, 1.0, 0.0)),
            2.0_f32.sqrt(),
            epsilon = 1e-6
        );
    }
}
