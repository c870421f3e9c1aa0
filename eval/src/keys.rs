use lasso::Spur;
use std::fmt::Display;
use std::num::NonZeroU32;

pub type Symbol = Spur;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(NonZeroU32);

        impl $name {
            pub fn new(inner: NonZeroU32) -> Self {
                Self(inner)
            }

            /// Ids are 1-based so that `Option<Id>` stays the size of the id.
            pub fn from_usize(value: usize) -> Self {
                let value = u32::try_from(value)
                    .ok()
                    .and_then(NonZeroU32::new)
                    .expect(concat!(stringify!($name), " must be non-zero and fit in u32"));
                Self(value)
            }

            pub fn to_index(self) -> usize {
                self.0.get() as usize - 1
            }

            pub fn into_inner(self) -> NonZeroU32 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

define_id!(TypeId, "type");
define_id!(ObjectId, "object");
define_id!(FieldId, "field");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_one_based() {
        let id = TypeId::from_usize(3);
        assert_eq!(id.to_index(), 2);
        assert_eq!(id.to_string(), "type#3");
    }

    #[test]
    #[should_panic(expected = "ObjectId must be non-zero")]
    fn zero_is_rejected() {
        ObjectId::from_usize(0);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    #[should_panic(expected = "FieldId must be non-zero and fit in u32")]
    fn overflowing_index_is_rejected() {
        FieldId::from_usize(u32::MAX as usize + 2);
    }
}
