use glam::{dvec3, DVec2, DVec3};

use crate::{cell::PolyhedralCell, error::Error, face_list::FaceList};

impl PolyhedralCell {
    /// Makes a box with the following topology, spanning from the min point to
    /// the max point.
    ///
    ///  ```text
    ///       7-----------6
    ///      /|          /|
    ///     / |         / |
    ///    4-----------5  |
    ///    |  |        |  |
    ///    |  3--------|--2
    ///    | /         | /
    ///    |/          |/
    ///    0-----------1
    ///  ```
    pub fn quad_box(min: DVec3, max: DVec3) -> Result<Self, Error> {
        const BOX_POS: [(bool, bool, bool); 8] = [
            (false, false, false),
            (true, false, false),
            (true, true, false),
            (false, true, false),
            (false, false, true),
            (true, false, true),
            (true, true, true),
            (false, true, true),
        ];
        const BOX_IDX: [[u32; 4]; 6] = [
            [0, 3, 2, 1],
            [0, 1, 5, 4],
            [1, 2, 6, 5],
            [2, 3, 7, 6],
            [3, 0, 4, 7],
            [4, 5, 6, 7],
        ];
        let points = BOX_POS
            .iter()
            .map(|&(xf, yf, zf)| {
                dvec3(
                    if xf { max.x } else { min.x },
                    if yf { max.y } else { min.y },
                    if zf { max.z } else { min.z },
                )
            })
            .collect();
        Self::new(points, FaceList::from_faces(BOX_IDX))
    }

    /// Create a tetrahedron centered at the origin, with the given
    /// circumradius.
    pub fn tetrahedron(radius: f64) -> Result<Self, Error> {
        let a = radius * (1.0f64 / 3.0);
        let b = radius * (8.0 / 9.0f64).sqrt();
        let c = radius * (2.0 / 9.0f64).sqrt();
        let d = radius * (2.0 / 3.0f64).sqrt();
        Self::new(
            vec![
                dvec3(0.0, 0.0, radius),
                dvec3(-c, d, -a),
                dvec3(-c, -d, -a),
                dvec3(b, 0.0, -a),
            ],
            FaceList::from_faces([[0u32, 1, 2], [0, 2, 3], [0, 3, 1], [3, 2, 1]]),
        )
    }

    /// Create a dodecahedron centered at the origin, with the given
    /// circumradius. The faces are regular pentagons.
    pub fn dodecahedron(radius: f64) -> Result<Self, Error> {
        let phi = (1.0 + 5.0f64.sqrt()) * 0.5;
        let a = radius / 3.0f64.sqrt();
        let b = a * phi;
        let c = a / phi;
        Self::new(
            vec![
                dvec3(0.0, b, -c),
                dvec3(0.0, b, c),
                dvec3(-c, 0.0, b),
                dvec3(c, 0.0, b),
                dvec3(c, 0.0, -b),
                dvec3(-c, 0.0, -b),
                dvec3(0.0, -b, c),
                dvec3(0.0, -b, -c),
                dvec3(-b, c, 0.0),
                dvec3(-b, -c, 0.0),
                dvec3(b, c, 0.0),
                dvec3(b, -c, 0.0),
                dvec3(-a, a, a),
                dvec3(a, a, a),
                dvec3(-a, a, -a),
                dvec3(a, a, -a),
                dvec3(-a, -a, -a),
                dvec3(a, -a, -a),
                dvec3(-a, -a, a),
                dvec3(a, -a, a),
            ],
            FaceList::from_faces([
                [15u32, 4, 5, 14, 0],
                [15, 0, 1, 13, 10],
                [14, 8, 12, 1, 0],
                [13, 1, 12, 2, 3],
                [19, 3, 2, 18, 6],
                [18, 2, 12, 8, 9],
                [17, 7, 16, 5, 4],
                [17, 4, 15, 10, 11],
                [19, 11, 10, 13, 3],
                [16, 9, 8, 14, 5],
                [19, 6, 7, 17, 11],
                [18, 9, 16, 7, 6],
            ]),
        )
    }

    /// Extrude a polygon in the XY plane along the Z axis.
    ///
    /// The polygon must be simple and counter-clockwise, and may be
    /// non-convex. Point `i` of the polygon becomes point `i` of the bottom
    /// cap and point `n + i` of the top cap. The result has the two caps and
    /// one quad for every side of the polygon, all facing outward when
    /// `height` is positive.
    pub fn extrude(polygon: &[DVec2], height: f64) -> Result<Self, Error> {
        let n = polygon.len() as u32;
        let points = polygon
            .iter()
            .map(|p| p.extend(0.0))
            .chain(polygon.iter().map(|p| p.extend(height)))
            .collect();
        let mut faces = FaceList::with_capacity(n as usize + 2, n as usize * 6);
        let bottom: Vec<u32> = std::iter::once(0).chain((1..n).rev()).collect();
        faces.push_face(&bottom);
        let top: Vec<u32> = (n..(2 * n)).collect();
        faces.push_face(&top);
        for i in 0..n {
            let j = (i + 1) % n;
            faces.push_face(&[i, j, n + j, n + i]);
        }
        Self::new(points, faces)
    }
}
