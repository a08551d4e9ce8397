use crate::element::{FH, VH};

/// Problems with the connectivity of a cell's faces.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    #[error("the cell has no faces")]
    NoFaces,
    #[error("{face} has {count} vertices, at least 3 are required")]
    DegenerateFace { face: FH, count: usize },
    #[error("{face} references {vertex}, but the cell has {num_points} points")]
    PointOutOfBounds {
        face: FH,
        vertex: VH,
        num_points: usize,
    },
    #[error("{face} visits {vertex} more than once")]
    RepeatedVertex { face: FH, vertex: VH },
    /// The edge is used by only one face, so the cell is not closed.
    #[error("edge ({0}, {1}) is incident on only one face")]
    OpenEdge(VH, VH),
    /// The edge is shared by more than two faces.
    #[error("edge ({0}, {1}) is incident on more than two faces")]
    ComplexEdge(VH, VH),
    /// Two faces traverse the shared edge in the same direction.
    #[error("faces {0} and {1} are not consistently oriented")]
    InconsistentOrientation(FH, FH),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid topology: {0}")]
    InvalidTopology(#[from] TopologyError),
    // Face streams.
    #[error("face stream truncated at offset {offset}: expected {expected} indices, found {available}")]
    TruncatedFaceStream {
        offset: usize,
        expected: usize,
        available: usize,
    },
    // Obj.
    #[error("cannot load obj: {0}")]
    ObjLoadFailed(String),
    #[error("{0} is not a valid number of coordinates for 3d points")]
    IncorrectNumberOfCoordinates(usize),
    // Other.
    #[error("mismatched array lengths: {0} and {1}")]
    MismatchedArrayLengths(usize, usize),
}
