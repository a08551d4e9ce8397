use crate::error::Error;

/// Faces of a cell encoded as a flat stream of indices.
///
/// Each face is written as its number of vertices, followed by that many
/// point indices:
///
/// ```text
/// [5, 0, 1, 2, 3, 4,   3, 5, 6, 7]
///  ^ pentagon           ^ triangle
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaceList {
    stream: Vec<u32>,
    /// Position of each face's vertex count in `stream`.
    offsets: Vec<usize>,
}

impl FaceList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve space for `nfaces` faces with `nindices` point indices in
    /// total.
    pub fn with_capacity(nfaces: usize, nindices: usize) -> Self {
        FaceList {
            stream: Vec::with_capacity(nfaces + nindices),
            offsets: Vec::with_capacity(nfaces),
        }
    }

    /// Take ownership of an encoded stream. The stream must consist of whole
    /// faces.
    pub fn from_stream(stream: Vec<u32>) -> Result<Self, Error> {
        let mut offset = 0usize;
        let mut offsets = Vec::new();
        while offset < stream.len() {
            let expected = stream[offset] as usize;
            let available = stream.len() - offset - 1;
            if expected > available {
                return Err(Error::TruncatedFaceStream {
                    offset,
                    expected,
                    available,
                });
            }
            offsets.push(offset);
            offset += expected + 1;
        }
        Ok(FaceList { stream, offsets })
    }

    /// Encode the given faces.
    pub fn from_faces<F, I>(faces: I) -> Self
    where
        F: AsRef<[u32]>,
        I: IntoIterator<Item = F>,
    {
        let mut out = Self::new();
        for f in faces {
            out.push_face(f.as_ref());
        }
        out
    }

    pub fn push_face(&mut self, verts: &[u32]) {
        self.offsets.push(self.stream.len());
        self.stream.push(verts.len() as u32);
        self.stream.extend_from_slice(verts);
    }

    pub fn push_triangle(&mut self, tri: [u32; 3]) {
        self.push_face(&tri);
    }

    pub fn num_faces(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// The point indices of the `i`th face.
    pub fn face(&self, i: usize) -> &[u32] {
        let start = self.offsets[i];
        let count = self.stream[start] as usize;
        &self.stream[(start + 1)..(start + 1 + count)]
    }

    /// Iterate over the point indices of each face.
    pub fn faces(&self) -> FaceIter<'_> {
        FaceIter {
            stream: &self.stream,
        }
    }

    /// Check if every face is a triangle.
    pub fn is_triangulated(&self) -> bool {
        self.faces().all(|f| f.len() == 3)
    }

    /// Total number of point indices over all faces, not counting the
    /// per-face counts.
    pub fn num_indices(&self) -> usize {
        self.stream.len() - self.offsets.len()
    }

    pub fn as_stream(&self) -> &[u32] {
        &self.stream
    }

    pub fn into_stream(self) -> Vec<u32> {
        self.stream
    }
}

/// Iterator over the faces of a [`FaceList`].
pub struct FaceIter<'a> {
    stream: &'a [u32],
}

impl<'a> Iterator for FaceIter<'a> {
    type Item = &'a [u32];

    fn next(&mut self) -> Option<Self::Item> {
        let (count, rest) = self.stream.split_first()?;
        let (face, rest) = rest.split_at(*count as usize);
        self.stream = rest;
        Some(face)
    }
}
