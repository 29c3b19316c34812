//! Small integer id types indexing directly into `Vec`s, modeled on
//! `aries::collections::ref_store`'s `create_ref_type!` macro but starting at
//! zero rather than `NonZeroU32` (our ids double as plain vector indices).

/// Declares a newtype wrapping a `u32` index, with `From`/`Into` conversions
/// to `usize` and `Index`/`IndexMut` impls so `Vec<V>` can be indexed by it
/// directly.
#[macro_export]
macro_rules! create_id_type {
    ($type_name:ident) => {
        #[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Debug, Default)]
        pub struct $type_name(u32);

        impl $type_name {
            pub const fn new(index: u32) -> Self {
                $type_name(index)
            }

            pub const fn index(self) -> usize {
                self.0 as usize
            }

            pub const fn get(self) -> u32 {
                self.0
            }
        }

        impl From<usize> for $type_name {
            fn from(u: usize) -> Self {
                $type_name(u as u32)
            }
        }

        impl From<u32> for $type_name {
            fn from(u: u32) -> Self {
                $type_name(u)
            }
        }

        impl From<$type_name> for usize {
            fn from(v: $type_name) -> Self {
                v.0 as usize
            }
        }

        impl std::fmt::Display for $type_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl<V> std::ops::Index<$type_name> for Vec<V> {
            type Output = V;
            fn index(&self, index: $type_name) -> &Self::Output {
                &self[index.index()]
            }
        }

        impl<V> std::ops::IndexMut<$type_name> for Vec<V> {
            fn index_mut(&mut self, index: $type_name) -> &mut Self::Output {
                &mut self[index.index()]
            }
        }
    };
}

create_id_type!(ItemTypeId);
create_id_type!(BinTypeId);
create_id_type!(GroupId);
create_id_type!(DefectId);
create_id_type!(StackId);

/// Position of a bin within a solution's sequence of packed bins.
pub type BinPos = u32;
/// Position of an item among the copies of its item type.
pub type ItemPos = u32;
/// Number of discrepancies taken against the LP-preferred branch (see column generation).
pub type Discrepancy = u32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_index_vectors() {
        let v = vec!["a", "b", "c"];
        let id = ItemTypeId::new(1);
        assert_eq!(v[id], "b");
    }

    #[test]
    fn ids_roundtrip_usize() {
        let id = BinTypeId::from(3usize);
        assert_eq!(usize::from(id), 3);
        assert_eq!(id.index(), 3);
    }
}
