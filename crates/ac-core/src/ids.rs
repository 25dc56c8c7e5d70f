use core::fmt;
use core::num::NonZeroU32;

/// Dense, 0-based handle stored as `index + 1` so `Option<$name>` stays 4 bytes.
macro_rules! dense_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(NonZeroU32);

        impl $name {
            pub fn from_index(index: u32) -> Self {
                Self(NonZeroU32::MIN.saturating_add(index))
            }

            pub fn index(self) -> u32 {
                self.0.get() - 1
            }

            /// Index as `usize`, for slice access.
            pub fn slot(self) -> usize {
                self.index() as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.index())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.index())
            }
        }
    };
}

dense_id!(
    /// Leaf component, numbered in depth-first assembly order.
    CompId
);

dense_id!(
    /// Entry of the variable store; one per unique promoted name.
    VarId
);
