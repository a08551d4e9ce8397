use glam::DVec3;

use crate::{
    element::{Handle, EH, FH, VH},
    error::{Error, TopologyError},
    face_list::FaceList,
    math,
    topol::EdgeTable,
};

/// Check that every face can be triangulated: there is at least one face,
/// every face has at least three distinct vertices, and every vertex is a
/// valid index into the `num_points` points.
pub(crate) fn validate_faces(num_points: usize, faces: &FaceList) -> Result<(), Error> {
    if faces.is_empty() {
        return Err(TopologyError::NoFaces.into());
    }
    for (fi, verts) in faces.faces().enumerate() {
        let face: FH = (fi as u32).into();
        if verts.len() < 3 {
            return Err(TopologyError::DegenerateFace {
                face,
                count: verts.len(),
            }
            .into());
        }
        for (i, &v) in verts.iter().enumerate() {
            if v as usize >= num_points {
                return Err(TopologyError::PointOutOfBounds {
                    face,
                    vertex: v.into(),
                    num_points,
                }
                .into());
            }
            if verts[..i].contains(&v) {
                return Err(TopologyError::RepeatedVertex {
                    face,
                    vertex: v.into(),
                }
                .into());
            }
        }
    }
    Ok(())
}

/// A 3d solid bounded by polygonal faces.
///
/// The faces are loops of indices into the cell's points. Each point also
/// carries an id, usually its index in the mesh the cell was taken from. The
/// edges of the cell are derived from the faces, and are recomputed whenever
/// the faces are replaced.
#[derive(Debug, Clone)]
pub struct PolyhedralCell {
    point_ids: Vec<u64>,
    points: Vec<DVec3>,
    faces: FaceList,
    edges: EdgeTable,
}

impl PolyhedralCell {
    /// Create a cell whose point ids are the indices of the points.
    pub fn new(points: Vec<DVec3>, faces: FaceList) -> Result<Self, Error> {
        let point_ids = (0..(points.len() as u64)).collect();
        Self::with_point_ids(point_ids, points, faces)
    }

    pub fn with_point_ids(
        point_ids: Vec<u64>,
        points: Vec<DVec3>,
        faces: FaceList,
    ) -> Result<Self, Error> {
        if point_ids.len() != points.len() {
            return Err(Error::MismatchedArrayLengths(point_ids.len(), points.len()));
        }
        validate_faces(points.len(), &faces)?;
        let edges = EdgeTable::build(&faces);
        Ok(PolyhedralCell {
            point_ids,
            points,
            faces,
            edges,
        })
    }

    /// Replace the faces of this cell and recompute its edges. If the faces
    /// are invalid, an error is returned and the cell is left unchanged.
    pub fn initialize(&mut self, faces: FaceList) -> Result<(), Error> {
        validate_faces(self.points.len(), &faces)?;
        self.edges = EdgeTable::build(&faces);
        self.faces = faces;
        Ok(())
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn num_faces(&self) -> usize {
        self.faces.num_faces()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.num_edges()
    }

    pub fn points(&self) -> &[DVec3] {
        &self.points
    }

    pub fn point(&self, v: VH) -> DVec3 {
        self.points[v.usize()]
    }

    pub fn point_ids(&self) -> &[u64] {
        &self.point_ids
    }

    pub fn point_id(&self, v: VH) -> u64 {
        self.point_ids[v.usize()]
    }

    pub fn face_list(&self) -> &FaceList {
        &self.faces
    }

    pub fn faces(&self) -> impl Iterator<Item = FH> + use<> {
        (0..(self.num_faces() as u32)).map(|i| i.into())
    }

    /// The point indices of the face, in loop order.
    pub fn face(&self, f: FH) -> &[u32] {
        self.faces.face(f.index() as usize)
    }

    pub fn face_vertices(&self, f: FH) -> impl Iterator<Item = VH> + use<'_> {
        self.face(f).iter().map(|v| v.into())
    }

    pub fn face_valence(&self, f: FH) -> usize {
        self.face(f).len()
    }

    pub fn edge_table(&self) -> &EdgeTable {
        &self.edges
    }

    pub fn edges(&self) -> impl Iterator<Item = EH> + use<> {
        self.edges.edges()
    }

    pub fn edge_vertices(&self, e: EH) -> [VH; 2] {
        self.edges.edge_vertices(e)
    }

    pub fn edge_faces(&self, e: EH) -> impl Iterator<Item = FH> + use<'_> {
        self.edges.edge_faces(e)
    }

    pub fn is_boundary_edge(&self, e: EH) -> bool {
        self.edges.is_boundary_edge(e)
    }

    /// Check that the faces enclose the cell: every edge is shared by exactly
    /// two faces, and the faces are consistently oriented.
    pub fn check_topology(&self) -> Result<(), Error> {
        self.edges.check()
    }

    /// Unit normal of the face, computed with Newell's method. Zero for a face
    /// with no area.
    pub fn calc_face_normal(&self, f: FH) -> DVec3 {
        math::newell_normal(&self.points, self.face(f)).normalize_or_zero()
    }

    /// Area of the face. This is exact for planar faces, including
    /// non-convex ones. For a non-planar face this is the area of its
    /// projection onto its best fitting plane.
    pub fn calc_face_area(&self, f: FH) -> f64 {
        math::newell_normal(&self.points, self.face(f)).length() * 0.5
    }

    /// Total area of the faces.
    pub fn calc_area(&self) -> f64 {
        self.faces().map(|f| self.calc_face_area(f)).sum()
    }

    /// Compute the volume enclosed by the faces.
    ///
    /// The faces must be oriented outward for the volume to be positive. If
    /// the cell has boundary edges, i.e. it is not closed, the volume is 0.
    /// Non-planar faces are split along the fan around their first vertex.
    pub fn calc_volume(&self) -> f64 {
        if self.edges().any(|e| self.is_boundary_edge(e)) {
            // Not closed.
            return 0.0;
        }
        self.faces
            .faces()
            .flat_map(math::fan_triangles)
            .map(|tri| math::signed_volume(&self.points, tri))
            .sum()
    }

    /// Average position of the points.
    pub fn calc_centroid(&self) -> DVec3 {
        if self.points.is_empty() {
            return DVec3::ZERO;
        }
        self.points.iter().sum::<DVec3>() / self.points.len() as f64
    }
}
