use glam::Vec3;

/// Half-extent of every grabbable box: boxes are unit cubes.
pub const UNIT_HALF_EXTENT: f32 = 0.5;

/// A ray in world space with a normalized direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Build a ray, normalizing `direction`. A zero direction stays zero and
    /// the resulting ray is degenerate.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Ray from `origin` through `target`.
    pub fn towards(origin: Vec3, target: Vec3) -> Self {
        Self::new(origin, target - origin)
    }

    /// Point at parameter `t` along the ray.
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// True when the direction cannot describe a line (zero length or non-finite).
    pub fn is_degenerate(&self) -> bool {
        !self.direction.is_finite() || self.direction.length_squared() <= f32::MIN_POSITIVE
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        debug_assert!(min.cmple(max).all(), "aabb min must not exceed max");
        Self { min, max }
    }

    /// Box spanning `center ± half_extent` on every axis.
    pub fn around(center: Vec3, half_extent: f32) -> Self {
        let h = Vec3::splat(half_extent);
        Self {
            min: center - h,
            max: center + h,
        }
    }

    /// Bounds of a unit cube centered on `position`.
    pub fn unit_cube(position: Vec3) -> Self {
        Self::around(position, UNIT_HALF_EXTENT)
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Slab test. Returns the distance along the ray to the first surface hit,
    /// or the exit distance when the origin is inside the box. Boxes entirely
    /// behind the origin and degenerate rays miss.
    pub fn ray_intersection(&self, ray: &Ray) -> Option<f32> {
        if ray.is_degenerate() {
            return None;
        }

        let inv_dir = ray.direction.recip();
        let t1 = (self.min - ray.origin) * inv_dir;
        let t2 = (self.max - ray.origin) * inv_dir;

        let near = t1.min(t2);
        let far = t1.max(t2);
        let t_enter = near.max_element();
        let t_exit = far.min_element();

        if t_exit < 0.0 || t_enter > t_exit {
            return None;
        }

        Some(if t_enter < 0.0 { t_exit } else { t_enter })
    }

    pub fn intersects_ray(&self, ray: &Ray) -> bool {
        self.ray_intersection(ray).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_cube_bounds_are_exact() {
        let p = Vec3::new(3.0, 1.0, -4.0);
        let b = Aabb::unit_cube(p);
        assert_eq!(b.min, Vec3::new(2.5, 0.5, -4.5));
        assert_eq!(b.max, Vec3::new(3.5, 1.5, -3.5));
        assert_eq!(b.center(), p);
    }

    #[test]
    fn ray_hits_box_in_front() {
        let b = Aabb::unit_cube(Vec3::ZERO);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        assert_eq!(b.ray_intersection(&ray), Some(9.5));
    }

    #[test]
    fn ray_misses_box_to_the_side() {
        let b = Aabb::unit_cube(Vec3::new(3.0, 0.0, 0.0));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        assert!(!b.intersects_ray(&ray));
    }

    #[test]
    fn box_behind_origin_is_a_miss() {
        let b = Aabb::unit_cube(Vec3::ZERO);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::Z);
        assert!(b.ray_intersection(&ray).is_none());
    }

    #[test]
    fn origin_inside_reports_exit_distance() {
        let b = Aabb::unit_cube(Vec3::ZERO);
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert_eq!(b.ray_intersection(&ray), Some(0.5));
    }

    #[test]
    fn diagonal_ray_hits() {
        let b = Aabb::unit_cube(Vec3::ZERO);
        let ray = Ray::towards(Vec3::new(10.0, 2.0, 10.0), Vec3::ZERO);
        let t = b.ray_intersection(&ray).unwrap();
        assert!(b.contains(ray.at(t) + ray.direction * 1e-4));
    }

    #[test]
    fn degenerate_ray_never_hits() {
        let b = Aabb::unit_cube(Vec3::ZERO);
        let zero = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        assert!(zero.is_degenerate());
        assert!(!b.intersects_ray(&zero));

        let nan = Ray {
            origin: Vec3::ZERO,
            direction: Vec3::new(f32::NAN, 0.0, 0.0),
        };
        assert!(!b.intersects_ray(&nan));
    }

    #[test]
    fn ray_new_normalizes() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -5.0));
        assert_eq!(ray.direction, Vec3::NEG_Z);
        assert_eq!(ray.at(2.0), Vec3::new(0.0, 0.0, -2.0));
    }
}
