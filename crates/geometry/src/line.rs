use bevy_math::Vec3;

/// A directed line with a unit `direction`.
#[derive(Clone, Copy, Debug)]
pub struct Line {
    pub point: Vec3,
    pub direction: Vec3,
}

impl Line {
    #[must_use]
    pub fn new(point: Vec3, direction: Vec3) -> Self {
        Self { point, direction }
    }
}
