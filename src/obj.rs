use std::{io::BufRead, path::Path};

use glam::DVec3;

use crate::{cell::PolyhedralCell, error::Error, face_list::FaceList};

impl PolyhedralCell {
    /// Load a cell from an OBJ file. Faces are read as they are, without
    /// triangulating them. All objects in the file are merged into one cell.
    pub fn load_obj(path: &Path) -> Result<Self, Error> {
        let options = tobj::LoadOptions::default();
        let (models, _) =
            tobj::load_obj(path, &options).map_err(|e| Error::ObjLoadFailed(format!("{}", e)))?;
        Self::from_models(models)
    }

    /// Read a cell from OBJ data. Material libraries are not loaded.
    pub fn read_obj<R: BufRead>(mut reader: R) -> Result<Self, Error> {
        let options = tobj::LoadOptions::default();
        let (models, _) = tobj::load_obj_buf(&mut reader, &options, |_| {
            Err(tobj::LoadError::OpenFileFailed)
        })
        .map_err(|e| Error::ObjLoadFailed(format!("{}", e)))?;
        Self::from_models(models)
    }

    fn from_models(models: Vec<tobj::Model>) -> Result<Self, Error> {
        let (npoints, nindices) = models.iter().fold((0usize, 0usize), |(np, ni), model| {
            (np + model.mesh.positions.len() / 3, ni + model.mesh.indices.len())
        });
        let mut points = Vec::with_capacity(npoints);
        let mut faces = FaceList::with_capacity(nindices / 3, nindices);
        let mut fvs = Vec::new();
        for model in models {
            let mesh = model.mesh;
            if mesh.positions.len() % 3 != 0 {
                return Err(Error::IncorrectNumberOfCoordinates(mesh.positions.len()));
            }
            let offset = u32::try_from(points.len()).map_err(|_| {
                Error::ObjLoadFailed(format!("{} points exceed u32 indices", points.len()))
            })?;
            points.extend(
                mesh.positions
                    .chunks(3)
                    .map(|triplet| DVec3::new(triplet[0], triplet[1], triplet[2])),
            );
            if mesh.face_arities.is_empty() {
                // Every face is a triangle.
                for tri in mesh.indices.chunks(3) {
                    offset_indices(tri, offset, &mut fvs)?;
                    faces.push_face(&fvs);
                }
                continue;
            }
            let mut start = 0usize;
            for size in mesh.face_arities {
                let size = size as usize;
                offset_indices(&mesh.indices[start..(start + size)], offset, &mut fvs)?;
                start += size;
                faces.push_face(&fvs);
            }
        }
        log::debug!(
            "Read {} points and {} faces from OBJ data",
            points.len(),
            faces.num_faces()
        );
        Self::new(points, faces)
    }
}

/// Shift the indices of a face by the number of points read before its model.
fn offset_indices(indices: &[u32], offset: u32, out: &mut Vec<u32>) -> Result<(), Error> {
    out.clear();
    for &i in indices {
        let shifted = i.checked_add(offset).ok_or_else(|| {
            Error::ObjLoadFailed(format!("index {i} offset by {offset} exceeds u32 indices"))
        })?;
        out.push(shifted);
    }
    Ok(())
}
