use std::fmt::{Debug, Display};

/**
 * Vertices, edges and faces of a cell are identified by their index.
 */
pub trait Handle {
    /**
     * The index of the element.
     */
    fn index(&self) -> u32;
}

macro_rules! handle_type {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name {
            idx: u32,
        }

        impl Handle for $name {
            fn index(&self) -> u32 {
                self.idx
            }
        }

        impl From<u32> for $name {
            fn from(idx: u32) -> Self {
                $name { idx }
            }
        }

        impl From<&u32> for $name {
            fn from(idx: &u32) -> Self {
                $name { idx: *idx }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.idx)
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.idx)
            }
        }
    };
}

handle_type!(VH, "Vertex handle. Indexes the local point array of a cell.");
handle_type!(EH, "Edge handle. Indexes the unique edges of a cell.");
handle_type!(FH, "Face handle. Indexes the faces of a cell, in stream order.");

impl VH {
    pub(crate) fn usize(self) -> usize {
        self.idx as usize
    }
}

/// An edge of a cell, with its end points sorted so `[a, b]` and `[b, a]`
/// name the same edge.
pub(crate) fn edge_key(a: VH, b: VH) -> (VH, VH) {
    if a < b { (a, b) } else { (b, a) }
}
