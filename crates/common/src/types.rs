use std::fmt;

/// Stable handle to an object in a fixed-size registry.
///
/// Handles are dense indices in registry order, so comparing two ids also
/// compares their iteration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

impl ObjectId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<usize> for ObjectId {
    fn from(index: usize) -> Self {
        Self(index as u32)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "box#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_order_by_index() {
        let a = ObjectId(0);
        let b = ObjectId(3);
        assert!(a < b);
        assert_eq!(b.index(), 3);
    }

    #[test]
    fn display_names_the_box() {
        assert_eq!(ObjectId::from(2usize).to_string(), "box#2");
    }
}
