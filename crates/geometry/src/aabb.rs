use bevy_math::Vec3;

/// Axis-aligned bounding box stored as min/max corners.
#[derive(Clone, Copy, Debug, Default)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    #[must_use]
    pub fn from_point(pt: Vec3) -> Self {
        Self { min: pt, max: pt }
    }

    pub fn expand(&mut self, pt: Vec3) {
        self.min = self.min.min(pt);
        self.max = self.max.max(pt);
    }

    /// Extent of the box along each axis.
    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Squared distance from `pt` to the box, zero when inside.
    ///
    /// Accumulated per axis in x, y, z order; callers rely on the fixed
    /// summation order for reproducible results.
    #[must_use]
    pub fn distance_squared(&self, pt: Vec3) -> f32 {
        sqr((self.min.x - pt.x).max(0.0))
            + sqr((pt.x - self.max.x).max(0.0))
            + sqr((self.min.y - pt.y).max(0.0))
            + sqr((pt.y - self.max.y).max(0.0))
            + sqr((self.min.z - pt.z).max(0.0))
            + sqr((pt.z - self.max.z).max(0.0))
    }
}

fn sqr(value: f32) -> f32 {
    value * value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand() {
        let mut aabb = Aabb::from_point(Vec3::new(1.0, 2.0, 3.0));
        aabb.expand(Vec3::new(-1.0, 5.0, 3.0));

        assert_eq!(aabb.min, Vec3::new(-1.0, 2.0, 3.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 5.0, 3.0));
        assert_eq!(aabb.size(), Vec3::new(2.0, 3.0, 0.0));
    }

    #[test]
    fn test_distance_squared_inside_is_zero() {
        let mut aabb = Aabb::from_point(Vec3::ZERO);
        aabb.expand(Vec3::new(2.0, 2.0, 2.0));

        assert_eq!(aabb.distance_squared(Vec3::new(1.0, 1.0, 1.0)), 0.0);
        assert_eq!(aabb.distance_squared(Vec3::new(0.0, 2.0, 0.0)), 0.0);
    }

    #[test]
    fn test_distance_squared_outside() {
        let mut aabb = Aabb::from_point(Vec3::ZERO);
        aabb.expand(Vec3::new(2.0, 2.0, 2.0));

        // Separated along a single axis.
        assert_eq!(aabb.distance_squared(Vec3::new(4.0, 1.0, 1.0)), 4.0);

        // Separated along two axes.
        assert_eq!(aabb.distance_squared(Vec3::new(3.0, -2.0, 1.0)), 5.0);
    }
}
