/*!
Polyhedral cells, their face triangulation, and the arena allocator used for
scratch memory while triangulating.

# Overview

+ A [`PolyhedralCell`] is a solid bounded by polygonal faces. The faces are
  loops of indices into the points of the cell, stored in a [`FaceList`] as a
  flat stream of counts and indices. Faces can be non-convex and non-planar.
  The distinct undirected edges of the faces, and the faces using each edge,
  are kept in an [`EdgeTable`].

+ A [`Triangulator`] replaces every face with triangles made of the face's own
  vertices, by clipping ears off the projection of the face onto its best
  fitting plane. No points are added and edges shared by two faces stay
  shared, so a closed cell stays closed. A face with `n` vertices always
  becomes `n - 2` triangles with the orientation of the face.

+ A [`Heap`] is a bump allocator over a list of large blocks. Memory is
  released all at once, and resetting the heap rewinds it to reuse its
  blocks. The triangulator keeps one and resets it for every face.

Some simple cells can be created procedurally, see
[`PolyhedralCell::quad_box`], [`PolyhedralCell::dodecahedron`] and
[`PolyhedralCell::extrude`], and cells can be read from OBJ files with
[`PolyhedralCell::load_obj`].

```
use polycell::PolyhedralCell;

let cell = PolyhedralCell::dodecahedron(1.0)?;
assert_eq!(cell.num_edges(), 30);
let tris = cell.triangulated()?;
assert_eq!(tris.num_faces(), 36);
assert_eq!(tris.num_edges(), 54);
# Ok::<(), polycell::Error>(())
```
*/

mod cell;
mod element;
mod error;
mod face_list;
pub mod heap;
mod macros;
mod math;
mod obj;
mod primitive;
mod topol;
mod triangulate;

pub use cell::PolyhedralCell;
pub use element::{Handle, EH, FH, VH};
pub use error::{Error, TopologyError};
pub use face_list::{FaceIter, FaceList};
pub use heap::{Heap, DEFAULT_BLOCK_SIZE};
pub use topol::{EdgeTable, EdgeUse};
pub use triangulate::{triangulate_faces, Triangulator};

#[doc = include_str!("../README.md")]
#[cfg(doctest)]
pub struct ReadmeDoctests;
