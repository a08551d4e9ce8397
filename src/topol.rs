use std::collections::HashMap;

use crate::{
    element::{edge_key, Handle, EH, FH, VH},
    error::{Error, TopologyError},
    face_list::FaceList,
};

/// A face using an edge. `forward` is true when the face walks the edge from
/// its first vertex to its second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeUse {
    pub face: FH,
    pub forward: bool,
}

#[derive(Debug, Clone)]
struct Edge {
    verts: [VH; 2],
    uses: Vec<EdgeUse>,
}

/// The distinct undirected edges of a set of faces, and the faces incident
/// on each edge.
///
/// Edges are numbered in the order they are first encountered while walking
/// the faces.
#[derive(Debug, Clone, Default)]
pub struct EdgeTable {
    edges: Vec<Edge>,
    lookup: HashMap<(VH, VH), EH>,
}

impl EdgeTable {
    pub fn build(faces: &FaceList) -> Self {
        let mut table = EdgeTable {
            edges: Vec::with_capacity(faces.num_indices() / 2),
            lookup: HashMap::with_capacity(faces.num_indices() / 2),
        };
        for (fi, verts) in faces.faces().enumerate() {
            let f: FH = (fi as u32).into();
            for (i, j) in (0..verts.len()).map(|i| (i, (i + 1) % verts.len())) {
                table.add_use(verts[i].into(), verts[j].into(), f);
            }
        }
        table
    }

    fn add_use(&mut self, from: VH, to: VH, face: FH) {
        let key = edge_key(from, to);
        let e = match self.lookup.get(&key) {
            Some(e) => *e,
            None => {
                let e: EH = (self.edges.len() as u32).into();
                self.edges.push(Edge {
                    verts: [key.0, key.1],
                    uses: Vec::with_capacity(2),
                });
                self.lookup.insert(key, e);
                e
            }
        };
        self.edges[e.index() as usize].uses.push(EdgeUse {
            face,
            forward: from == key.0,
        });
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> impl Iterator<Item = EH> + use<> {
        (0..(self.num_edges() as u32)).map(|i| i.into())
    }

    /// The end points of the edge, smaller index first.
    pub fn edge_vertices(&self, e: EH) -> [VH; 2] {
        self.edges[e.index() as usize].verts
    }

    pub fn edge_uses(&self, e: EH) -> &[EdgeUse] {
        &self.edges[e.index() as usize].uses
    }

    pub fn edge_faces(&self, e: EH) -> impl Iterator<Item = FH> + use<'_> {
        self.edge_uses(e).iter().map(|u| u.face)
    }

    pub fn find_edge(&self, a: VH, b: VH) -> Option<EH> {
        self.lookup.get(&edge_key(a, b)).copied()
    }

    /// Check if the edge has only one incident face.
    pub fn is_boundary_edge(&self, e: EH) -> bool {
        self.edge_uses(e).len() == 1
    }

    /// Check that the faces bound a closed, consistently oriented 2-manifold:
    /// every edge is shared by exactly two faces that walk it in opposite
    /// directions.
    pub fn check(&self) -> Result<(), Error> {
        for edge in &self.edges {
            let [a, b] = edge.verts;
            match edge.uses.as_slice() {
                [_] => return Err(TopologyError::OpenEdge(a, b).into()),
                [u0, u1] => {
                    if u0.forward == u1.forward {
                        return Err(TopologyError::InconsistentOrientation(u0.face, u1.face).into());
                    }
                }
                _ => return Err(TopologyError::ComplexEdge(a, b).into()),
            }
        }
        Ok(())
    }
}
