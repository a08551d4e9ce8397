use glam::{DVec2, DVec3};

use crate::{
    cell::{validate_faces, PolyhedralCell},
    error::Error,
    face_list::FaceList,
    heap::Heap,
    math,
};

/// Block size of the scratch heap of a new [`Triangulator`]. Enough for the
/// projected points of faces with several hundred vertices.
const SCRATCH_BLOCK_SIZE: usize = 16 * 1024;

/// Relative tolerance for the orientation tests, scaled by the squared extent
/// of the projected face.
const ORIENT_TOLERANCE: f64 = 1e-12;

/// Splits the faces of polyhedral cells into triangles.
///
/// Faces are split using only their own vertices, so edges shared by two
/// faces are preserved and no points are added. The scratch memory needed
/// for each face is taken from a [`Heap`] that is reset between faces, so
/// reusing one triangulator for many cells does not allocate once its heap
/// has grown to fit the largest face.
pub struct Triangulator {
    heap: Heap,
}

impl Default for Triangulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Triangulator {
    pub fn new() -> Self {
        Self::with_heap(Heap::with_block_size(SCRATCH_BLOCK_SIZE))
    }

    /// Use the given heap for scratch memory. The heap is reset before every
    /// face, so it must not hold anything the caller still needs.
    pub fn with_heap(heap: Heap) -> Self {
        Triangulator { heap }
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Triangulate the faces of a cell with the given points.
    ///
    /// Triangles are passed through as they are. A face with `n > 3`
    /// vertices is replaced by `n - 2` triangles with the same orientation,
    /// in the position of the face in the list. All faces are validated
    /// before anything is triangulated.
    pub fn triangulate(&mut self, points: &[DVec3], faces: &FaceList) -> Result<FaceList, Error> {
        validate_faces(points.len(), faces)?;
        let ntris = faces.num_indices() - 2 * faces.num_faces();
        let mut out = FaceList::with_capacity(ntris, ntris * 3);
        for face in faces.faces() {
            self.heap.reset();
            triangulate_face(&self.heap, points, face, &mut out);
        }
        log::trace!(
            "Triangulated {} faces into {} triangles",
            faces.num_faces(),
            out.num_faces()
        );
        Ok(out)
    }
}

/// Triangulate the faces of the cell with a temporary [`Triangulator`].
pub fn triangulate_faces(cell: &PolyhedralCell) -> Result<FaceList, Error> {
    Triangulator::new().triangulate(cell.points(), cell.face_list())
}

impl PolyhedralCell {
    /// The faces of this cell split into triangles. See
    /// [`Triangulator::triangulate`].
    pub fn triangulate_faces(&self) -> Result<FaceList, Error> {
        triangulate_faces(self)
    }

    /// A cell with the same points and point ids as this one, and
    /// triangulated faces.
    pub fn triangulated(&self) -> Result<PolyhedralCell, Error> {
        let mut out = self.clone();
        out.triangulate()?;
        Ok(out)
    }

    /// Replace the faces of this cell with triangles.
    pub fn triangulate(&mut self) -> Result<(), Error> {
        let faces = self.triangulate_faces()?;
        self.initialize(faces)
    }
}

fn triangulate_face(heap: &Heap, points: &[DVec3], face: &[u32], out: &mut FaceList) {
    let n = face.len();
    if n == 3 {
        out.push_face(face);
        return;
    }
    let normal = math::newell_normal(points, face);
    if normal.length_squared() == 0.0 {
        log::warn!("Face {face:?} has no area, splitting it into a fan");
        for tri in math::fan_triangles(face) {
            out.push_triangle(tri);
        }
        return;
    }
    // Project onto the plane of the face. The projected loop is
    // counter-clockwise.
    let (u, v) = math::plane_basis(normal);
    let origin = points[face[0] as usize];
    let proj = heap.alloc_slice_fill_copy(n, DVec2::ZERO);
    let (mut lo, mut hi) = (DVec2::INFINITY, DVec2::NEG_INFINITY);
    for (dst, &i) in proj.iter_mut().zip(face.iter()) {
        let d = points[i as usize] - origin;
        *dst = DVec2::new(d.dot(u), d.dot(v));
        lo = lo.min(*dst);
        hi = hi.max(*dst);
    }
    let extent = (hi - lo).max_element();
    let tol = extent * extent * ORIENT_TOLERANCE;
    // Positions in the face of the vertices not yet clipped.
    let ring = heap.alloc_slice_fill_copy(n, 0usize);
    for (i, r) in ring.iter_mut().enumerate() {
        *r = i;
    }
    let mut remaining = n;
    while remaining > 3 {
        let i = match find_ear(proj, &ring[..remaining], tol) {
            Some(i) => i,
            None => {
                let i = most_convex_corner(proj, &ring[..remaining]);
                log::warn!("No ear found in face {face:?}, clipping its most convex corner");
                i
            }
        };
        let (prev, cur, next) = corner(&ring[..remaining], i);
        out.push_triangle([face[prev], face[cur], face[next]]);
        ring.copy_within((i + 1)..remaining, i);
        remaining -= 1;
    }
    out.push_triangle([face[ring[0]], face[ring[1]], face[ring[2]]]);
}

/// The previous, current and next vertex at position `i` of the ring.
fn corner(ring: &[usize], i: usize) -> (usize, usize, usize) {
    let m = ring.len();
    (ring[(i + m - 1) % m], ring[i], ring[(i + 1) % m])
}

/// Position in the ring of a strictly convex corner whose triangle does not
/// contain any other vertex of the ring, including on its boundary.
fn find_ear(proj: &[DVec2], ring: &[usize], tol: f64) -> Option<usize> {
    (0..ring.len()).find(|&i| {
        let (prev, cur, next) = corner(ring, i);
        let (a, b, c) = (proj[prev], proj[cur], proj[next]);
        if math::orient2d(a, b, c) <= tol {
            return false;
        }
        !ring
            .iter()
            .filter(|&&k| k != prev && k != cur && k != next)
            .any(|&k| {
                let p = proj[k];
                math::orient2d(a, b, p) >= -tol
                    && math::orient2d(b, c, p) >= -tol
                    && math::orient2d(c, a, p) >= -tol
            })
    })
}

fn most_convex_corner(proj: &[DVec2], ring: &[usize]) -> usize {
    (0..ring.len())
        .map(|i| {
            let (prev, cur, next) = corner(ring, i);
            (i, math::orient2d(proj[prev], proj[cur], proj[next]))
        })
        .fold((0, f64::NEG_INFINITY), |best, (i, area)| {
            if area > best.1 { (i, area) } else { best }
        })
        .0
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use arrayvec::ArrayVec;
    use glam::{dvec2, dvec3, DVec2, DVec3};
    use proptest::prelude::*;

    use super::{triangulate_faces, Triangulator};
    use crate::{
        cell::PolyhedralCell,
        element::{edge_key, Handle, FH, VH},
        error::{Error, TopologyError},
        face_list::FaceList,
        heap::Heap,
        macros::assert_f64_eq,
        math,
    };

    fn notched_square() -> [DVec2; 5] {
        [
            dvec2(0.0, 0.0),
            dvec2(2.0, 0.0),
            dvec2(2.0, 2.0),
            dvec2(1.0, 1.0),
            dvec2(0.0, 2.0),
        ]
    }

    /// Prism over the notched square with one side split into two
    /// triangles: 10 points, 2 pentagons, 4 quads and 2 triangles.
    fn concave_solid() -> PolyhedralCell {
        let prism =
            PolyhedralCell::extrude(&notched_square(), 1.0).expect("Cannot extrude polygon");
        let mut faces = FaceList::new();
        for f in prism.face_list().faces() {
            if f == [2, 3, 8, 7] {
                faces.push_triangle([2, 3, 8]);
                faces.push_triangle([2, 8, 7]);
            } else {
                faces.push_face(f);
            }
        }
        PolyhedralCell::new(prism.points().to_vec(), faces).expect("Cannot create cell")
    }

    /// Check that every triangle is made of vertices of the face it came
    /// from, and that each face produced `n - 2` triangles.
    fn assert_triangles_from_faces(faces: &FaceList, tris: &FaceList) {
        assert!(tris.is_triangulated());
        let mut tri_iter = tris.faces();
        for face in faces.faces() {
            for _ in 0..(face.len() - 2) {
                let tri = tri_iter.next().expect("Too few triangles");
                assert!(
                    tri.iter().all(|v| face.contains(v)),
                    "Triangle {tri:?} is not made of vertices of face {face:?}"
                );
            }
        }
        assert!(tri_iter.next().is_none(), "Too many triangles");
    }

    /// Check that each triangle walks its vertices in the same cyclic order
    /// as the face it came from.
    fn assert_orientation_kept(faces: &FaceList, tris: &FaceList) {
        let mut tri_iter = tris.faces();
        for face in faces.faces() {
            let pos = |v: &u32| face.iter().position(|f| f == v).expect("Vertex not in face");
            for _ in 0..(face.len() - 2) {
                let tri = tri_iter.next().expect("Too few triangles");
                let p: ArrayVec<usize, 3> = tri.iter().map(pos).collect();
                // Exactly one step of the cycle wraps around.
                let wraps = (0..3).filter(|&i| p[i] > p[(i + 1) % 3]).count();
                assert_eq!(wraps, 1, "Triangle {tri:?} is flipped in face {face:?}");
            }
        }
    }

    fn edge_set(faces: &FaceList) -> HashSet<(VH, VH)> {
        faces
            .faces()
            .flat_map(|f| {
                (0..f.len()).map(move |i| edge_key(f[i].into(), f[(i + 1) % f.len()].into()))
            })
            .collect()
    }

    #[test]
    fn t_triangles_pass_through() {
        let tet = PolyhedralCell::tetrahedron(1.0).expect("Cannot create tetrahedron");
        let tris = tet.triangulate_faces().expect("Cannot triangulate");
        assert_eq!(&tris, tet.face_list());
        // Idempotent.
        let again = triangulate_faces(&tet.triangulated().expect("Cannot triangulate"))
            .expect("Cannot triangulate");
        assert_eq!(again, tris);
    }

    #[test]
    fn t_box() {
        let qbox = PolyhedralCell::quad_box(DVec3::ZERO, DVec3::ONE).expect("Cannot create box");
        let tris = qbox.triangulated().expect("Cannot triangulate");
        assert_eq!(tris.num_faces(), 12);
        assert_eq!(tris.num_edges(), 18);
        assert_eq!(tris.point_ids(), qbox.point_ids());
        tris.check_topology().expect("Triangulated box must be closed");
        assert_f64_eq!(tris.calc_volume(), 1.0);
        assert_f64_eq!(tris.calc_area(), 6.0);
        assert_triangles_from_faces(qbox.face_list(), tris.face_list());
        assert_orientation_kept(qbox.face_list(), tris.face_list());
    }

    #[test]
    fn t_dodecahedron() {
        let dod = PolyhedralCell::dodecahedron(1.0).expect("Cannot create dodecahedron");
        let tris = dod.triangulated().expect("Cannot triangulate");
        assert_eq!(tris.num_faces(), 36);
        assert_eq!(tris.num_edges(), 30 + 12 * 2);
        tris.check_topology().expect("Triangulated dodecahedron must be closed");
        assert_f64_eq!(tris.calc_volume(), dod.calc_volume(), 1e-10);
        assert_f64_eq!(tris.calc_area(), dod.calc_area(), 1e-10);
        assert!(edge_set(dod.face_list()).is_subset(&edge_set(tris.face_list())));
        assert_orientation_kept(dod.face_list(), tris.face_list());
    }

    #[test]
    fn t_concave_solid() {
        let cell = concave_solid();
        assert_eq!(cell.num_points(), 10);
        assert_eq!(cell.num_faces(), 8);
        assert_eq!(cell.num_edges(), (2 * 5 + 4 * 4 + 2 * 3) / 2);
        cell.check_topology().expect("Concave solid must be closed");
        assert_f64_eq!(cell.calc_volume(), 3.0);
        let tris = cell.triangulated().expect("Cannot triangulate");
        assert_eq!(tris.num_faces(), 2 * 3 + 4 * 2 + 2);
        assert_eq!(tris.num_edges(), 16 + (2 * 2 + 4));
        tris.check_topology().expect("Triangulated solid must be closed");
        assert_triangles_from_faces(cell.face_list(), tris.face_list());
        assert_orientation_kept(cell.face_list(), tris.face_list());
        // The caps are concave, a fan from the first vertex would leave the
        // face and change the area and volume.
        assert_f64_eq!(tris.calc_volume(), 3.0);
        assert_f64_eq!(tris.calc_area(), cell.calc_area());
        let cap_area: f64 = tris
            .faces()
            .take(3)
            .map(|f| tris.calc_face_area(f))
            .sum();
        assert_f64_eq!(cap_area, 3.0);
        assert!(tris.faces().all(|f| tris.calc_face_area(f) > 0.0));
    }

    #[test]
    fn t_non_planar_concave_solid() {
        let cell = concave_solid();
        let mut points = cell.points().to_vec();
        points[7].z = 1.5;
        let cell = PolyhedralCell::new(points, cell.face_list().clone())
            .expect("Cannot create cell");
        let tris = cell.triangulated().expect("Cannot triangulate");
        assert_eq!(tris.num_faces(), 16);
        assert_eq!(tris.num_edges(), 24);
        tris.check_topology().expect("Triangulated solid must be closed");
        assert_triangles_from_faces(cell.face_list(), tris.face_list());
        assert_orientation_kept(cell.face_list(), tris.face_list());
        assert!(tris.calc_volume() > 3.0);
    }

    #[test]
    fn t_warped_hexagonal_prism() {
        let hexagon: Vec<DVec2> = (0..6)
            .map(|i| {
                let t = i as f64 * std::f64::consts::TAU / 6.0;
                dvec2(t.cos(), t.sin())
            })
            .collect();
        let prism = PolyhedralCell::extrude(&hexagon, 1.0).expect("Cannot extrude hexagon");
        let mut points = prism.points().to_vec();
        for (i, p) in points.iter_mut().enumerate().skip(6) {
            // Lift alternate top vertices to warp the top cap and the sides.
            if i % 2 == 0 {
                p.z += 0.4;
            }
        }
        let cell =
            PolyhedralCell::new(points, prism.face_list().clone()).expect("Cannot create cell");
        let tris = cell.triangulated().expect("Cannot triangulate");
        assert_eq!(tris.num_faces(), 2 * 4 + 6 * 2);
        assert_eq!(tris.num_edges(), 18 + 2 * 3 + 6);
        tris.check_topology().expect("Triangulated prism must be closed");
        assert_orientation_kept(cell.face_list(), tris.face_list());
    }

    #[test]
    fn t_triangle_orientation_follows_face() {
        let cell = concave_solid();
        let tris = cell.triangulated().expect("Cannot triangulate");
        // The triangles of the bottom cap face down like the cap.
        for f in tris.faces().take(3) {
            let n = tris.calc_face_normal(f);
            assert_f64_eq!(n.dot(DVec3::Z), -1.0);
        }
        for f in tris.faces().skip(3).take(3) {
            let n = tris.calc_face_normal(f);
            assert_f64_eq!(n.dot(DVec3::Z), 1.0);
        }
    }

    #[test]
    fn t_degenerate_face_is_fanned() {
        // Four collinear points.
        let points = vec![
            dvec3(0.0, 0.0, 0.0),
            dvec3(1.0, 0.0, 0.0),
            dvec3(2.0, 0.0, 0.0),
            dvec3(3.0, 0.0, 0.0),
        ];
        let faces = FaceList::from_faces([[0u32, 1, 2, 3]]);
        let tris = Triangulator::new()
            .triangulate(&points, &faces)
            .expect("Cannot triangulate");
        assert_eq!(tris, FaceList::from_faces([[0u32, 1, 2], [0, 2, 3]]));
    }

    #[test]
    fn t_collinear_run() {
        // Square with an extra vertex in the middle of its bottom side.
        let points = vec![
            dvec3(0.0, 0.0, 0.0),
            dvec3(1.0, 0.0, 0.0),
            dvec3(2.0, 0.0, 0.0),
            dvec3(2.0, 2.0, 0.0),
            dvec3(0.0, 2.0, 0.0),
        ];
        let faces = FaceList::from_faces([[0u32, 1, 2, 3, 4]]);
        let tris = Triangulator::new()
            .triangulate(&points, &faces)
            .expect("Cannot triangulate");
        assert_eq!(tris.num_faces(), 3);
        let area: f64 = tris
            .faces()
            .map(|t| math::triangle_area(&points, [t[0], t[1], t[2]]))
            .sum();
        assert_f64_eq!(area, 4.0);
        assert_orientation_kept(&faces, &tris);
    }

    #[test]
    fn t_invalid_input_emits_nothing() {
        let points = vec![DVec3::ZERO, DVec3::X, DVec3::Y, DVec3::Z];
        let mut tri = Triangulator::new();
        assert_eq!(
            tri.triangulate(&points, &FaceList::new()),
            Err(Error::InvalidTopology(TopologyError::NoFaces))
        );
        assert_eq!(
            tri.triangulate(
                &points,
                &FaceList::from_faces([&[0u32, 1, 2][..], &[0, 1][..]])
            ),
            Err(Error::InvalidTopology(TopologyError::DegenerateFace {
                face: FH::from(1),
                count: 2
            }))
        );
        assert_eq!(
            tri.triangulate(&points, &FaceList::from_faces([[0u32, 1, 2, 4]])),
            Err(Error::InvalidTopology(TopologyError::PointOutOfBounds {
                face: FH::from(0),
                vertex: VH::from(4),
                num_points: 4
            }))
        );
        assert_eq!(
            tri.triangulate(&points, &FaceList::from_faces([[0u32, 1, 0, 2]])),
            Err(Error::InvalidTopology(TopologyError::RepeatedVertex {
                face: FH::from(0),
                vertex: VH::from(0)
            }))
        );
        // Nothing was allocated for the rejected inputs.
        assert_eq!(tri.heap().num_allocations(), 0);
    }

    #[test]
    fn t_scratch_heap_is_reused() {
        let dod = PolyhedralCell::dodecahedron(2.0).expect("Cannot create dodecahedron");
        let mut tri = Triangulator::with_heap(Heap::with_block_size(4096));
        for _ in 0..10 {
            let tris = tri
                .triangulate(dod.points(), dod.face_list())
                .expect("Cannot triangulate");
            assert_eq!(tris.num_faces(), 36);
        }
        assert_eq!(tri.heap().num_blocks(), 1);
        // Two scratch arrays per pentagon.
        assert_eq!(tri.heap().num_allocations(), 10 * 12 * 2);
    }

    #[test]
    fn t_triangulate_on_threads() {
        let cells = [
            PolyhedralCell::dodecahedron(1.0).expect("Cannot create dodecahedron"),
            concave_solid(),
            PolyhedralCell::quad_box(DVec3::ZERO, DVec3::ONE).expect("Cannot create box"),
        ];
        let counts: Vec<usize> = std::thread::scope(|s| {
            let handles: Vec<_> = cells
                .iter()
                .map(|cell| {
                    s.spawn(move || {
                        let mut tri = Triangulator::new();
                        (0..20)
                            .map(|_| {
                                tri.triangulate(cell.points(), cell.face_list())
                                    .expect("Cannot triangulate")
                                    .num_faces()
                            })
                            .last()
                            .unwrap_or_default()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().expect("Thread panicked"))
                .collect()
        });
        assert_eq!(counts, [36, 16, 12]);
    }

    #[test]
    fn t_face_handles_index_triangles() {
        let cell = concave_solid();
        let tris = cell.triangulated().expect("Cannot triangulate");
        let first = tris.face(FH::from(0));
        assert_eq!(first.len(), 3);
        assert!(first.iter().all(|v| cell.face(FH::from(0)).contains(v)));
        assert_eq!(tris.face(FH::from(15)).len(), 3);
        assert_eq!(tris.faces().last().map(|f| f.index()), Some(15));
    }

    proptest! {
        #[test]
        fn p_star_polygon(
            radii in prop::collection::vec(0.2f64..2.0, 4..40),
            tilt in -1.0f64..1.0,
        ) {
            // A star shaped polygon around the origin, tilted out of the XY
            // plane.
            let n = radii.len();
            let points: Vec<DVec3> = radii
                .iter()
                .enumerate()
                .map(|(i, r)| {
                    let t = i as f64 * std::f64::consts::TAU / n as f64;
                    let (x, y) = (r * t.cos(), r * t.sin());
                    dvec3(x, y, tilt * x)
                })
                .collect();
            let face: Vec<u32> = (0..(n as u32)).collect();
            let faces = FaceList::from_faces([&face]);
            let tris = Triangulator::new()
                .triangulate(&points, &faces)
                .expect("Cannot triangulate");
            prop_assert_eq!(tris.num_faces(), n - 2);
            prop_assert!(tris.faces().all(|t| t.iter().all(|v| (*v as usize) < n)));
            let area = math::newell_normal(&points, &face).length() * 0.5;
            let total: f64 = tris
                .faces()
                .map(|t| math::triangle_area(&points, [t[0], t[1], t[2]]))
                .sum();
            prop_assert!((area - total).abs() <= 1e-9 * area.max(1.0));
            let normal = math::newell_normal(&points, &face);
            let flipped = tris.faces().position(|t| {
                let [a, b, c] = [t[0], t[1], t[2]].map(|i| points[i as usize]);
                (b - a).cross(c - a).dot(normal) < -1e-12
            });
            prop_assert_eq!(flipped, None, "Triangle is flipped against the face normal");
        }
    }
}
