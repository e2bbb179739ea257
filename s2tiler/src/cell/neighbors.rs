//! Edge and vertex adjacency between cells.
//!
//! Offsets that stay on the face are plain IJ arithmetic. Offsets leaving the
//! face go through XYZ and are projected onto the face that actually holds
//! the neighbor, since adjacent faces meet at an angle.

use super::id::{size_ij, CellId};
use crate::coord::{self, Face, LIMIT_IJ, MAX_LEVEL};

impl CellId {
    /// Leaf cell at `(i, j)`, where the coordinates may lie just off `face`.
    fn from_face_ij_same(face: Face, i: i64, j: i64, same_face: bool) -> Self {
        if same_face {
            CellId::from_face_ij(face, i as u32, j as u32)
        } else {
            CellId::from_face_ij_wrap(face, i, j)
        }
    }

    /// Leaf cell for IJ coordinates outside `face`, found on the neighboring face.
    pub(crate) fn from_face_ij_wrap(face: Face, i: i64, j: i64) -> Self {
        let limit = LIMIT_IJ as i64;
        // A leaf just beyond the edge is enough to land in the right cell
        let i = i.clamp(-1, limit);
        let j = j.clamp(-1, limit);

        // Linear IJ -> UV is sufficient near the edge. Clamp barely outside
        // the face so the reprojection cannot drift into the wrong leaf.
        let scale = 1.0 / limit as f64;
        let max_uv = 1.0 + f64::EPSILON;
        let u = (scale * (2 * (i - limit / 2) + 1) as f64).clamp(-max_uv, max_uv);
        let v = (scale * (2 * (j - limit / 2) + 1) as f64).clamp(-max_uv, max_uv);

        let (face, u, v) = coord::xyz_to_face_uv(&coord::face_uv_to_xyz(face, u, v));
        CellId::from_face_ij(
            face,
            coord::st_to_ij(0.5 * (u + 1.0)),
            coord::st_to_ij(0.5 * (v + 1.0)),
        )
    }

    /// The four cells sharing an edge with this one, at the same level.
    ///
    /// Order: down (-j), right (+i), up (+j), left (-i).
    pub fn neighbors(self) -> [CellId; 4] {
        let level = self.level();
        let size = size_ij(level) as i64;
        let limit = LIMIT_IJ as i64;
        let (face, i, j) = self.to_face_ij();
        let (i, j) = (i as i64, j as i64);

        [
            Self::from_face_ij_same(face, i, j - size, j - size >= 0).parent_at(level),
            Self::from_face_ij_same(face, i + size, j, i + size < limit).parent_at(level),
            Self::from_face_ij_same(face, i, j + size, j + size < limit).parent_at(level),
            Self::from_face_ij_same(face, i - size, j, i - size >= 0).parent_at(level),
        ]
    }

    /// Cells at `level` that touch the vertex of `self.parent_at(level)`
    /// closest to this cell.
    ///
    /// Usually four cells; three at the eight cube corners. The containing
    /// cell comes first.
    ///
    /// # Panics
    ///
    /// Panics unless `level` is shallower than this cell's level.
    pub fn vertex_neighbors(self, level: u8) -> Vec<CellId> {
        assert!(
            level < self.level() && level < MAX_LEVEL,
            "vertex neighbors need a level above the cell's own ({} >= {})",
            level,
            self.level()
        );
        let limit = LIMIT_IJ as i64;
        let (face, i, j) = self.to_face_ij();
        let half = size_ij(level + 1) as i64;
        let size = half << 1;
        let (i, j) = (i as i64, j as i64);

        let (i_offset, i_same) = if i & half != 0 {
            (size, i + size < limit)
        } else {
            (-size, i - size >= 0)
        };
        let (j_offset, j_same) = if j & half != 0 {
            (size, j + size < limit)
        } else {
            (-size, j - size >= 0)
        };

        let mut out = Vec::with_capacity(4);
        out.push(self.parent_at(level));
        out.push(Self::from_face_ij_same(face, i + i_offset, j, i_same).parent_at(level));
        out.push(Self::from_face_ij_same(face, i, j + j_offset, j_same).parent_at(level));
        // Both edge neighbors on other faces means a cube corner: only three cells meet
        if i_same || j_same {
            out.push(
                Self::from_face_ij_same(face, i + i_offset, j + j_offset, i_same && j_same)
                    .parent_at(level),
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(f: u8) -> Face {
        Face::new(f).unwrap()
    }

    #[test]
    fn test_interior_neighbors() {
        let id = CellId::from_face_zoom_ij(face(0), 3, 4, 4);
        let n = id.neighbors();
        assert_eq!(n[0], CellId::from_face_zoom_ij(face(0), 3, 4, 3));
        assert_eq!(n[1], CellId::from_face_zoom_ij(face(0), 3, 5, 4));
        assert_eq!(n[2], CellId::from_face_zoom_ij(face(0), 3, 4, 5));
        assert_eq!(n[3], CellId::from_face_zoom_ij(face(0), 3, 3, 4));
    }

    #[test]
    fn test_face_cell_neighbors_are_adjacent_faces() {
        // Face 0 touches every face except its opposite (3)
        let mut faces: Vec<u8> = CellId::from_face(face(0))
            .neighbors()
            .iter()
            .map(|n| n.face().value())
            .collect();
        faces.sort();
        assert_eq!(faces, vec![1, 2, 4, 5]);
        for n in CellId::from_face(face(0)).neighbors() {
            assert!(n.is_face());
        }
    }

    #[test]
    fn test_neighbors_across_seam() {
        // Right edge of face 0 continues onto face 1
        let last = (1u32 << 5) - 1;
        let id = CellId::from_face_zoom_ij(face(0), 5, last, 10);
        let right = id.neighbors()[1];
        assert_eq!(right.face(), face(1));
        assert_eq!(right.level(), 5);
        // Adjacency is symmetric
        assert!(right.neighbors().contains(&id));
    }

    #[test]
    fn test_vertex_neighbors_interior() {
        let id = CellId::from_face_zoom_ij(face(2), 6, 20, 41);
        let n = id.vertex_neighbors(5);
        assert_eq!(n.len(), 4);
        assert_eq!(n[0], id.parent_at(5));
        for cell in &n {
            assert_eq!(cell.level(), 5);
        }
        let mut unique = n.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn test_vertex_neighbors_cube_corner() {
        // Corner cell of face 0 at level 1 touches a cube vertex
        let id = CellId::from_face_zoom_ij(face(0), 2, 0, 0);
        let n = id.vertex_neighbors(1);
        assert_eq!(n.len(), 3);
        let mut faces: Vec<u8> = n.iter().map(|c| c.face().value()).collect();
        faces.sort();
        faces.dedup();
        assert_eq!(faces.len(), 3);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_neighbor_relation_is_symmetric(
                f in 0u8..6,
                level in 1u8..=20,
                i_frac in 0.0..1.0_f64,
                j_frac in 0.0..1.0_f64,
            ) {
                let n = 1u32 << level;
                let i = ((i_frac * n as f64) as u32).min(n - 1);
                let j = ((j_frac * n as f64) as u32).min(n - 1);
                let id = CellId::from_face_zoom_ij(Face::new(f).unwrap(), level, i, j);
                for neighbor in id.neighbors() {
                    prop_assert_eq!(neighbor.level(), level);
                    prop_assert_ne!(neighbor, id);
                    prop_assert!(neighbor.neighbors().contains(&id));
                }
            }
        }
    }
}
