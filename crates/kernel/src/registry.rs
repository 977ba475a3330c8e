use glam::Vec3;
use pixelgrab_common::{Aabb, ObjectId};
use rand::Rng;

/// Errors from registry operations.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum KernelError {
    #[error("object {0} is not in this registry")]
    UnknownObject(ObjectId),
}

/// A floating box the viewer can sight and grab.
///
/// `position` is authoritative; `bounds` is derived from it and the two are
/// only ever written together.
#[derive(Debug, Clone, PartialEq)]
pub struct GrabbableObject {
    position: Vec3,
    bounds: Aabb,
    is_looked_at: bool,
    is_grabbed: bool,
}

impl GrabbableObject {
    /// A free, unsighted box at `position`.
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            bounds: Aabb::unit_cube(position),
            is_looked_at: false,
            is_grabbed: false,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Whether the facing ray hit this box on the most recent step.
    pub fn is_looked_at(&self) -> bool {
        self.is_looked_at
    }

    pub fn is_grabbed(&self) -> bool {
        self.is_grabbed
    }

    pub(crate) fn move_to(&mut self, position: Vec3) {
        self.position = position;
        self.bounds = Aabb::unit_cube(position);
    }

    pub(crate) fn set_looked_at(&mut self, looked_at: bool) {
        self.is_looked_at = looked_at;
    }

    pub(crate) fn set_grabbed(&mut self, grabbed: bool) {
        self.is_grabbed = grabbed;
    }
}

/// Fixed-size, ordered collection of grabbable boxes.
///
/// Registry order is the iteration order of the interaction step and decides
/// which box wins when several are sighted at once. Handles are stable for the
/// registry's lifetime because nothing is ever inserted or removed.
#[derive(Debug, Clone)]
pub struct ObjectRegistry {
    objects: Box<[GrabbableObject]>,
}

impl ObjectRegistry {
    /// Build a registry with one free box per position, in the given order.
    pub fn from_positions(positions: impl IntoIterator<Item = Vec3>) -> Self {
        let objects: Box<[GrabbableObject]> =
            positions.into_iter().map(GrabbableObject::new).collect();
        tracing::debug!(count = objects.len(), "object registry created");
        Self { objects }
    }

    /// Scatter `count` boxes on integer coordinates: x and z in `[-5, 5]`,
    /// y in `[1, 2]`.
    pub fn scatter<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Self {
        Self::from_positions((0..count).map(|_| {
            Vec3::new(
                rng.gen_range(-5..=5) as f32,
                rng.gen_range(1..=2) as f32,
                rng.gen_range(-5..=5) as f32,
            )
        }))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, id: ObjectId) -> Option<&GrabbableObject> {
        self.objects.get(id.index())
    }

    /// All handles in registry order.
    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        (0..self.objects.len()).map(ObjectId::from)
    }

    /// Objects with their handles, in registry order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &GrabbableObject)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(i, obj)| (ObjectId::from(i), obj))
    }

    /// Move an object, recomputing its bounds in the same write.
    pub fn reposition(&mut self, id: ObjectId, position: Vec3) -> Result<(), KernelError> {
        let object = self
            .objects
            .get_mut(id.index())
            .ok_or(KernelError::UnknownObject(id))?;
        object.move_to(position);
        Ok(())
    }

    /// Number of boxes currently flagged as grabbed.
    pub fn grabbed_count(&self) -> usize {
        self.objects.iter().filter(|o| o.is_grabbed).count()
    }

    /// The box flagged as grabbed, if any.
    pub fn grabbed(&self) -> Option<ObjectId> {
        self.objects
            .iter()
            .position(|o| o.is_grabbed)
            .map(ObjectId::from)
    }

    pub fn looked_at_count(&self) -> usize {
        self.objects.iter().filter(|o| o.is_looked_at).count()
    }

    pub(crate) fn objects_mut(&mut self) -> &mut [GrabbableObject] {
        &mut self.objects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn new_object_is_free() {
        let o = GrabbableObject::new(Vec3::new(1.0, 2.0, 3.0));
        assert!(!o.is_looked_at());
        assert!(!o.is_grabbed());
        assert_eq!(o.bounds(), Aabb::unit_cube(o.position()));
    }

    #[test]
    fn reposition_recomputes_bounds() {
        let mut reg = ObjectRegistry::from_positions([Vec3::ZERO, Vec3::X]);
        let p = Vec3::new(-2.25, 7.0, 0.125);
        reg.reposition(ObjectId(1), p).unwrap();

        let o = reg.get(ObjectId(1)).unwrap();
        assert_eq!(o.position(), p);
        assert_eq!(o.bounds().min, p - Vec3::splat(0.5));
        assert_eq!(o.bounds().max, p + Vec3::splat(0.5));
        // untouched neighbour
        assert_eq!(reg.get(ObjectId(0)).unwrap().position(), Vec3::ZERO);
    }

    #[test]
    fn reposition_unknown_id_fails() {
        let mut reg = ObjectRegistry::from_positions([Vec3::ZERO]);
        assert_eq!(
            reg.reposition(ObjectId(5), Vec3::ONE),
            Err(KernelError::UnknownObject(ObjectId(5)))
        );
    }

    #[test]
    fn iteration_follows_construction_order() {
        let positions = [Vec3::X, Vec3::Y, Vec3::Z];
        let reg = ObjectRegistry::from_positions(positions);
        let seen: Vec<(ObjectId, Vec3)> = reg.iter().map(|(id, o)| (id, o.position())).collect();
        assert_eq!(
            seen,
            vec![
                (ObjectId(0), Vec3::X),
                (ObjectId(1), Vec3::Y),
                (ObjectId(2), Vec3::Z)
            ]
        );
        assert_eq!(reg.ids().collect::<Vec<_>>().len(), 3);
    }

    #[test]
    fn scatter_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let reg = ObjectRegistry::scatter(64, &mut rng);
        assert_eq!(reg.len(), 64);
        for (_, o) in reg.iter() {
            let p = o.position();
            assert!((-5.0..=5.0).contains(&p.x));
            assert!((1.0..=2.0).contains(&p.y));
            assert!((-5.0..=5.0).contains(&p.z));
            assert_eq!(p, p.round());
            assert!(!o.is_grabbed());
        }
    }

    #[test]
    fn scatter_is_reproducible_from_seed() {
        let a = ObjectRegistry::scatter(5, &mut StdRng::seed_from_u64(7));
        let b = ObjectRegistry::scatter(5, &mut StdRng::seed_from_u64(7));
        let pa: Vec<Vec3> = a.iter().map(|(_, o)| o.position()).collect();
        let pb: Vec<Vec3> = b.iter().map(|(_, o)| o.position()).collect();
        assert_eq!(pa, pb);
    }
}
