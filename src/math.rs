use glam::{DVec2, DVec3};

/// Compute the normal of a face loop using Newell's method.
///
/// The result is not normalized. Its length is twice the area of the face
/// when the face is planar, and it points to the side from which the loop
/// appears counter-clockwise. Newell's method is well defined for non-planar
/// and non-convex loops.
pub(crate) fn newell_normal(points: &[DVec3], face: &[u32]) -> DVec3 {
    face.iter()
        .zip(face.iter().cycle().skip(1))
        .fold(DVec3::ZERO, |total, (&i, &j)| {
            let (a, b) = {
                let pc = points[i as usize];
                let pn = points[j as usize];
                (pc - pn, pc + pn)
            };
            total + DVec3::new(a.y * b.z, a.z * b.x, a.x * b.y)
        })
}

/// Triangles of the fan around the first vertex of the face.
pub(crate) fn fan_triangles(face: &[u32]) -> impl Iterator<Item = [u32; 3]> + use<'_> {
    (1..face.len().saturating_sub(1)).map(move |i| [face[0], face[i], face[i + 1]])
}

/// Signed volume of the tetrahedron spanned by the origin and the triangle.
pub(crate) fn signed_volume(points: &[DVec3], tri: [u32; 3]) -> f64 {
    let (p0, p1, p2) = (
        points[tri[0] as usize],
        points[tri[1] as usize],
        points[tri[2] as usize],
    );
    p0.dot((p1 - p0).cross(p2 - p0)) / 6.0
}

#[cfg(test)]
pub(crate) fn triangle_area(points: &[DVec3], tri: [u32; 3]) -> f64 {
    let p0 = points[tri[0] as usize];
    (points[tri[1] as usize] - p0)
        .cross(points[tri[2] as usize] - p0)
        .length()
        * 0.5
}

/// Orthonormal vectors `(u, v)` spanning the plane perpendicular to
/// `normal`, with `u × v` pointing along `normal`. `normal` must not be zero.
pub(crate) fn plane_basis(normal: DVec3) -> (DVec3, DVec3) {
    let n = normal.normalize();
    let u = n.any_orthonormal_vector();
    (u, n.cross(u))
}

/// Twice the signed area of the triangle. Positive when `a`, `b`, `c` are
/// counter-clockwise.
pub(crate) fn orient2d(a: DVec2, b: DVec2, c: DVec2) -> f64 {
    (b - a).perp_dot(c - a)
}
